// SPDX-License-Identifier: MIT
// Copyright (c) 2026 the sv contributors

use super::*;
use chrono::TimeZone;
use sv_adapters::{FakeLauncher, LaunchResult};
use sv_core::domain::{Heartbeat, ManagementMode, SessionStatus, TriggerFallbackRun, TriggerJob, TriggerStatus};
use sv_core::id::{AgentId, RunId, ThreadId, TriggerId};
use sv_storage::{InMemoryStore, TriggerStore};

fn agent() -> AgentId {
    AgentId::from("agt_01")
}

fn workspace() -> WorkspaceId {
    WorkspaceId::from("wsp_1")
}

fn executor(launcher: FakeLauncher) -> FallbackExecutor<FakeLauncher, InMemoryStore> {
    executor_with_store(launcher, InMemoryStore::new())
}

fn executor_with_store(launcher: FakeLauncher, store: InMemoryStore) -> FallbackExecutor<FakeLauncher, InMemoryStore> {
    FallbackExecutor::new(launcher, store, 3, 12, 3, Duration::from_secs(15 * 60), false, 100, 100)
}

async fn seed_resumable_session(store: &InMemoryStore, now: DateTime<Utc>) {
    store
        .upsert_from_heartbeat(
            Heartbeat {
                agent_id: agent(),
                workspace_id: workspace(),
                session_id: "sess_01".to_string(),
                runtime: "tmux:win.0".to_string(),
                management_mode: ManagementMode::Managed,
                resumable: true,
                status: SessionStatus::Idle,
                heartbeat_at: now,
            },
            now,
        )
        .await
        .unwrap();
}

#[tokio::test]
async fn resume_on_healthy_runtime_succeeds() {
    let now = Utc.with_ymd_and_hms(2026, 2, 18, 10, 0, 0).unwrap();
    let launcher = FakeLauncher::new();
    launcher.push_resume_result(LaunchResult::started(1234));

    let executor = executor(launcher.clone());
    seed_resumable_session(&executor.store, now).await;

    let decision = executor
        .execute(FallbackRequest {
            agent_id: &agent(),
            workspace_id: &workspace(),
            prompt: "please respond",
            initial_error_code: Some("ACK_TIMEOUT"),
            now,
        })
        .await
        .unwrap();

    assert_eq!(decision.attempt_result, AttemptResult::FallbackResumeSucceeded);
    assert_eq!(decision.next_status, FallbackNextStatus::FallbackResume);
    assert_eq!(decision.launch_mode, Some(LaunchMode::Resume));
    assert_eq!(decision.pid, Some(1234));
    assert!(decision.resume_skipped_reason.is_none());

    let calls = launcher.calls();
    assert_eq!(calls.len(), 1);
}

#[tokio::test]
async fn resume_retries_before_giving_up_then_spawns() {
    let now = Utc.with_ymd_and_hms(2026, 2, 18, 10, 0, 0).unwrap();
    let launcher = FakeLauncher::new();
    launcher.push_resume_result(LaunchResult::failed("pane gone"));
    launcher.push_resume_result(LaunchResult::failed("pane gone"));
    launcher.push_resume_result(LaunchResult::failed("pane gone"));
    launcher.push_spawn_result(LaunchResult::started(5678));

    let executor = executor(launcher.clone());
    seed_resumable_session(&executor.store, now).await;

    let decision = executor
        .execute(FallbackRequest {
            agent_id: &agent(),
            workspace_id: &workspace(),
            prompt: "please respond",
            initial_error_code: None,
            now,
        })
        .await
        .unwrap();

    assert_eq!(decision.attempt_result, AttemptResult::FallbackSpawned);
    assert_eq!(decision.next_status, FallbackNextStatus::FallbackSpawn);
    assert_eq!(decision.launch_mode, Some(LaunchMode::Spawn));
    assert_eq!(decision.pid, Some(5678));

    let calls = launcher.calls();
    assert_eq!(calls.len(), 4);
}

#[tokio::test]
async fn no_session_skips_resume_and_spawns_directly() {
    let now = Utc.with_ymd_and_hms(2026, 2, 18, 10, 0, 0).unwrap();
    let launcher = FakeLauncher::new();
    launcher.push_spawn_result(LaunchResult::started(42));

    let executor = executor(launcher.clone());

    let decision = executor
        .execute(FallbackRequest {
            agent_id: &agent(),
            workspace_id: &workspace(),
            prompt: "please respond",
            initial_error_code: None,
            now,
        })
        .await
        .unwrap();

    assert_eq!(decision.resume_skipped_reason, Some(ResumeSkippedReason::NoSession));
    assert_eq!(decision.attempt_result, AttemptResult::FallbackSpawned);
    assert!(launcher.calls().iter().all(|c| matches!(c, sv_adapters::LauncherCall::Spawn { .. })));
}

#[tokio::test]
async fn stale_session_is_not_resumed() {
    let t0 = Utc.with_ymd_and_hms(2026, 2, 18, 0, 0, 0).unwrap();
    let launcher = FakeLauncher::new();
    launcher.push_spawn_result(LaunchResult::started(7));

    let executor = executor(launcher.clone());
    seed_resumable_session(&executor.store, t0).await;

    let later = t0 + chrono::Duration::hours(13);
    let decision = executor
        .execute(FallbackRequest {
            agent_id: &agent(),
            workspace_id: &workspace(),
            prompt: "please respond",
            initial_error_code: None,
            now: later,
        })
        .await
        .unwrap();

    assert_eq!(decision.resume_skipped_reason, Some(ResumeSkippedReason::SessionStale));
    assert_eq!(decision.attempt_result, AttemptResult::FallbackSpawned);
}

#[tokio::test]
async fn crash_loop_guard_trips_after_repeated_spawn_cycles() {
    let now = Utc.with_ymd_and_hms(2026, 2, 18, 10, 0, 0).unwrap();
    let launcher = FakeLauncher::new();
    for _ in 0..3 {
        launcher.push_spawn_result(LaunchResult::started(1));
    }

    let executor = executor(launcher.clone());

    for _ in 0..2 {
        let decision = executor
            .execute(FallbackRequest {
                agent_id: &agent(),
                workspace_id: &workspace(),
                prompt: "please respond",
                initial_error_code: None,
                now,
            })
            .await
            .unwrap();
        assert_eq!(decision.attempt_result, AttemptResult::FallbackSpawned);
    }

    let tripped = executor
        .execute(FallbackRequest {
            agent_id: &agent(),
            workspace_id: &workspace(),
            prompt: "please respond",
            initial_error_code: None,
            now,
        })
        .await
        .unwrap();

    assert_eq!(tripped.attempt_result, AttemptResult::FallbackResumeFailed);
    assert_eq!(tripped.next_status, FallbackNextStatus::Failed);
    assert_eq!(tripped.error_code.as_deref(), Some("FALLBACK_CRASH_LOOP"));
}

#[tokio::test]
async fn spawn_failure_without_crash_loop_reports_failed() {
    let now = Utc.with_ymd_and_hms(2026, 2, 18, 10, 0, 0).unwrap();
    let launcher = FakeLauncher::new();
    launcher.push_spawn_result(LaunchResult::failed("codex binary not found"));

    let executor = executor(launcher.clone());

    let decision = executor
        .execute(FallbackRequest {
            agent_id: &agent(),
            workspace_id: &workspace(),
            prompt: "please respond",
            initial_error_code: None,
            now,
        })
        .await
        .unwrap();

    assert_eq!(decision.attempt_result, AttemptResult::FallbackResumeFailed);
    assert_eq!(decision.next_status, FallbackNextStatus::Failed);
    assert_eq!(decision.error_code.as_deref(), Some("FALLBACK_SPAWN_FAILED"));
}

#[tokio::test]
async fn per_agent_concurrency_cap_defers_before_touching_the_launcher() {
    let now = Utc.with_ymd_and_hms(2026, 2, 18, 10, 0, 0).unwrap();
    let store = InMemoryStore::new();
    seed_resumable_session(&store, now).await;

    let running_job = TriggerJob {
        trigger_id: TriggerId::from("trg_running"),
        thread_id: ThreadId::from("thr_1"),
        workspace_id: workspace(),
        target_agent_id: agent(),
        target_session_id: None,
        reason: "unread".to_string(),
        prompt: "please respond".to_string(),
        status: TriggerStatus::FallbackSpawn,
        attempts: 1,
        callback_attempts: 0,
        max_retries: 2,
        next_retry_at: None,
        observed_latest_seq: 1,
        triggering_lease_expires_at: None,
        created_at: now,
        updated_at: now,
    };
    store.insert_job(running_job).await.unwrap();
    store
        .insert_fallback_run(TriggerFallbackRun {
            run_id: RunId::from("run_running"),
            trigger_id: TriggerId::from("trg_running"),
            launch_mode: LaunchMode::Spawn,
            pid: Some(999),
            started_at: now,
            finished_at: None,
            outcome: None,
        })
        .await
        .unwrap();

    let launcher = FakeLauncher::new();
    let executor = FallbackExecutor::new(launcher.clone(), store, 3, 12, 3, Duration::from_secs(15 * 60), false, 100, 1);

    let decision = executor
        .execute(FallbackRequest {
            agent_id: &agent(),
            workspace_id: &workspace(),
            prompt: "please respond",
            initial_error_code: None,
            now,
        })
        .await
        .unwrap();

    assert_eq!(decision.next_status, FallbackNextStatus::Deferred);
    assert_eq!(decision.attempt_result, AttemptResult::FallbackDeferred);
    assert_eq!(decision.error_code.as_deref(), Some("FALLBACK_CONCURRENCY_CAP"));
    assert!(launcher.calls().is_empty());
}
