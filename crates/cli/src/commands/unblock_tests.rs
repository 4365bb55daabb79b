// SPDX-License-Identifier: MIT
// Copyright (c) 2026 the sv contributors

use chrono::Utc;
use sv_core::domain::ThreadStatus;
use sv_core::id::{AgentId, ThreadId};
use sv_core::test_support::sample_thread;
use sv_storage::{AuditStore, InMemoryStore, SnapshotStore};

use super::*;

fn args(thread_id: &str) -> UnblockThreadArgs {
    UnblockThreadArgs {
        thread_id: thread_id.to_string(),
        reason: "resolved offline".to_string(),
        actor_agent_id: "human_operator".to_string(),
        json: false,
    }
}

#[tokio::test]
async fn unblocks_a_blocked_thread_and_clears_escalation_owner() {
    let store = InMemoryStore::new();
    let now = Utc::now();
    let mut thread = sample_thread("thr_1", "wsp_1", now);
    thread.status = ThreadStatus::Blocked;
    thread.escalation_owner = Some(AgentId::from("agt_owner"));
    store.update_thread(thread).await.unwrap();

    handle(args("thr_1"), &store).await.unwrap();

    let thread = store.get_thread(&ThreadId::from("thr_1")).await.unwrap().unwrap();
    assert_eq!(thread.status, ThreadStatus::Active);
    assert!(thread.escalation_owner.is_none());

    let events = store.list_audit_events(&ThreadId::from("thr_1"), 10).await.unwrap();
    assert_eq!(events[0].action, "thread_unblocked");
}

#[tokio::test]
async fn unblocking_an_active_thread_is_an_error() {
    let store = InMemoryStore::new();
    let now = Utc::now();
    store.update_thread(sample_thread("thr_1", "wsp_1", now)).await.unwrap();

    let err = handle(args("thr_1"), &store).await.unwrap_err();
    assert!(err.to_string().contains("invalid thread transition"));
}
