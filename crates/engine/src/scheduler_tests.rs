// SPDX-License-Identifier: MIT
// Copyright (c) 2026 the sv contributors

use super::*;
use chrono::TimeZone;
use sv_core::domain::{ManagementMode, SessionStatus};
use sv_core::id::{AgentId, ThreadId, UuidIdGen};
use sv_storage::InMemoryStore;

fn candidate(thread_id: &str, agent_id: &str, latest_seq: i64) -> Candidate {
    Candidate {
        thread_id: ThreadId::from(thread_id),
        workspace_id: WorkspaceId::from("wsp_1"),
        participant_agent_id: AgentId::from(agent_id),
        unread_count: latest_seq,
        latest_seq,
        last_read_seq: 0,
        session_status: Some(SessionStatus::Idle),
        session_id: Some("sess_1".to_string()),
        management_mode: Some(ManagementMode::Managed),
        resumable: Some(true),
        stale_session: false,
        reason: crate::unread::REASON_NEW_UNREAD_DORMANT_PARTICIPANT,
    }
}

fn scheduler() -> TriggerScheduler<InMemoryStore> {
    TriggerScheduler::new(InMemoryStore::new(), Arc::new(UuidIdGen))
}

#[tokio::test]
async fn enqueues_a_job_per_candidate() {
    let scheduler = scheduler();
    let config = EngineConfig::default();
    let now = Utc.with_ymd_and_hms(2026, 2, 18, 10, 0, 0).unwrap();

    let stats = scheduler
        .schedule(
            ScheduleInput {
                workspace_id: WorkspaceId::from("wsp_1"),
                candidates: vec![candidate("th_01", "agent_a", 5)],
                trigger_max_retries: 2,
                pending_jobs: 0,
                scheduled_at: now,
            },
            &config,
        )
        .await
        .unwrap();

    assert_eq!(stats.enqueued, 1);
}

#[tokio::test]
async fn breaker_opens_above_backlog_threshold() {
    let scheduler = scheduler();
    let mut config = EngineConfig::default();
    config.auto_unread_breaker_backlog_threshold = 2;
    let now = Utc.with_ymd_and_hms(2026, 2, 18, 10, 0, 0).unwrap();

    let stats = scheduler
        .schedule(
            ScheduleInput {
                workspace_id: WorkspaceId::from("wsp_1"),
                candidates: vec![candidate("th_01", "agent_a", 5)],
                trigger_max_retries: 2,
                pending_jobs: 2,
                scheduled_at: now,
            },
            &config,
        )
        .await
        .unwrap();

    assert!(stats.breaker_open);
    assert_eq!(stats.enqueued, 0);
    assert_eq!(stats.suppressed_by_breaker, 1);
}

#[tokio::test]
async fn second_candidate_for_same_pair_reuses_existing_job() {
    let scheduler = scheduler();
    let config = EngineConfig::default();
    let now = Utc.with_ymd_and_hms(2026, 2, 18, 10, 0, 0).unwrap();

    scheduler
        .schedule(
            ScheduleInput {
                workspace_id: WorkspaceId::from("wsp_1"),
                candidates: vec![candidate("th_01", "agent_a", 5)],
                trigger_max_retries: 2,
                pending_jobs: 0,
                scheduled_at: now,
            },
            &config,
        )
        .await
        .unwrap();

    let stats = scheduler
        .schedule(
            ScheduleInput {
                workspace_id: WorkspaceId::from("wsp_1"),
                candidates: vec![candidate("th_01", "agent_a", 6)],
                trigger_max_retries: 2,
                pending_jobs: 1,
                scheduled_at: now + chrono::Duration::seconds(1),
            },
            &config,
        )
        .await
        .unwrap();

    assert_eq!(stats.reused_existing, 1);
    assert_eq!(stats.enqueued, 0);
}

#[tokio::test]
async fn rate_limit_suppresses_excess_triggers_in_window() {
    let scheduler = scheduler();
    let mut config = EngineConfig::default();
    config.auto_unread_max_triggers_per_window = 1;
    let now = Utc.with_ymd_and_hms(2026, 2, 18, 10, 0, 0).unwrap();

    scheduler
        .schedule(
            ScheduleInput {
                workspace_id: WorkspaceId::from("wsp_1"),
                candidates: vec![candidate("th_01", "agent_a", 5)],
                trigger_max_retries: 2,
                pending_jobs: 0,
                scheduled_at: now,
            },
            &config,
        )
        .await
        .unwrap();

    // Different thread, same agent -> no active-job reuse, but rate limit bites.
    let stats = scheduler
        .schedule(
            ScheduleInput {
                workspace_id: WorkspaceId::from("wsp_1"),
                candidates: vec![candidate("th_02", "agent_a", 5)],
                trigger_max_retries: 2,
                pending_jobs: 1,
                scheduled_at: now + chrono::Duration::seconds(1),
            },
            &config,
        )
        .await
        .unwrap();

    assert_eq!(stats.suppressed_by_budget, 1);
    assert_eq!(stats.enqueued, 0);
}
