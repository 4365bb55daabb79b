// SPDX-License-Identifier: MIT
// Copyright (c) 2026 the sv contributors

use super::*;
use sv_core::domain::{Heartbeat, ManagementMode, MessageKind, SessionStatus};
use sv_core::id::{MessageId, ThreadId, TriggerId, WorkspaceId};

fn now() -> DateTime<Utc> {
    Utc::now()
}

fn heartbeat(at: DateTime<Utc>) -> Heartbeat {
    Heartbeat {
        agent_id: AgentId::from("agt_1"),
        workspace_id: WorkspaceId::from("wsp_1"),
        session_id: "sess_1".into(),
        runtime: "tmux:main".into(),
        management_mode: ManagementMode::Managed,
        resumable: true,
        status: SessionStatus::Active,
        heartbeat_at: at,
    }
}

#[tokio::test]
async fn upsert_from_heartbeat_is_last_writer_wins() {
    let store = InMemoryStore::new();
    let t0 = now();
    let t1 = t0 + chrono::Duration::seconds(5);
    store.upsert_from_heartbeat(heartbeat(t0), t0).await.unwrap();
    let updated = store.upsert_from_heartbeat(heartbeat(t1), t1).await.unwrap();
    assert_eq!(updated.last_heartbeat_at, t1);

    let stale = store.upsert_from_heartbeat(heartbeat(t0), t1).await.unwrap();
    assert_eq!(stale.last_heartbeat_at, t1, "earlier heartbeat must not regress");
}

#[tokio::test]
async fn reconcile_workspace_runtimes_transitions_stale_sessions_offline() {
    let store = InMemoryStore::new();
    let t0 = now();
    store.upsert_from_heartbeat(heartbeat(t0), t0).await.unwrap();

    let t_later = t0 + chrono::Duration::hours(13);
    let stats = store
        .reconcile_workspace_runtimes(&WorkspaceId::from("wsp_1"), 12, t_later)
        .await
        .unwrap();
    assert_eq!(stats.transitioned_offline, 1);

    let session = store
        .get_session(&AgentId::from("agt_1"), &WorkspaceId::from("wsp_1"))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(session.status, SessionStatus::Offline);
}

#[tokio::test]
async fn append_message_enforces_gap_free_monotonic_seq() {
    let store = InMemoryStore::new();
    let thread_id = ThreadId::from("thr_1");
    let msg = |seq: i64| sv_core::domain::Message {
        message_id: MessageId::from(format!("msg_{seq}")),
        thread_id: thread_id.clone(),
        schema_version: 1,
        seq,
        sender_agent_id: AgentId::from("agt_1"),
        sender_session_id: None,
        kind: MessageKind::Chat,
        body: "hi".into(),
        metadata: None,
        in_reply_to: None,
        idempotency_key: None,
        created_at: now(),
    };

    store.append_message(msg(1)).await.unwrap();
    assert!(store.append_message(msg(3)).await.is_err());
    store.append_message(msg(2)).await.unwrap();
    assert_eq!(store.latest_seq(&thread_id).await.unwrap(), 2);
}

#[tokio::test]
async fn claim_due_jobs_moves_queued_jobs_into_triggering_and_bumps_attempts() {
    let store = InMemoryStore::new();
    let job = sample_job();
    store.insert_job(job.clone()).await.unwrap();

    let claimed = store
        .claim_due_jobs(&job.workspace_id, 10, now(), chrono::Duration::seconds(45), None)
        .await
        .unwrap();

    assert_eq!(claimed.len(), 1);
    assert_eq!(claimed[0].status, TriggerStatus::Triggering);
    assert_eq!(claimed[0].attempts, 1);

    let reclaimed = store
        .claim_due_jobs(&job.workspace_id, 10, now(), chrono::Duration::seconds(45), None)
        .await
        .unwrap();
    assert!(reclaimed.is_empty(), "a freshly leased job must not be claimable again");
}

#[tokio::test]
async fn expired_lease_is_reclaimable() {
    let store = InMemoryStore::new();
    let job = sample_job();
    store.insert_job(job.clone()).await.unwrap();
    let t0 = now();
    store.claim_due_jobs(&job.workspace_id, 10, t0, chrono::Duration::seconds(1), None).await.unwrap();

    let t_expired = t0 + chrono::Duration::seconds(2);
    let reclaimed = store
        .claim_due_jobs(&job.workspace_id, 10, t_expired, chrono::Duration::seconds(45), None)
        .await
        .unwrap();
    assert_eq!(reclaimed.len(), 1);
    assert_eq!(reclaimed[0].attempts, 2);
}

fn sample_job() -> TriggerJob {
    TriggerJob {
        trigger_id: TriggerId::from("trg_1"),
        thread_id: ThreadId::from("thr_1"),
        workspace_id: WorkspaceId::from("wsp_1"),
        target_agent_id: AgentId::from("agt_1"),
        target_session_id: None,
        reason: "new_unread_dormant_participant".into(),
        prompt: "hello".into(),
        status: TriggerStatus::Queued,
        attempts: 0,
        callback_attempts: 0,
        max_retries: 2,
        next_retry_at: None,
        observed_latest_seq: 1,
        triggering_lease_expires_at: None,
        created_at: now(),
        updated_at: now(),
    }
}
