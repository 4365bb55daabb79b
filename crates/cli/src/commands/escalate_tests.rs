// SPDX-License-Identifier: MIT
// Copyright (c) 2026 the sv contributors

use chrono::Utc;
use sv_core::domain::ThreadStatus;
use sv_core::id::ThreadId;
use sv_core::test_support::sample_thread;
use sv_storage::{AuditStore, InMemoryStore, SnapshotStore};

use super::*;

fn args(thread_id: &str) -> EscalateThreadArgs {
    EscalateThreadArgs {
        thread_id: thread_id.to_string(),
        reason: "needs a human".to_string(),
        actor_agent_id: "human_operator".to_string(),
        json: false,
    }
}

#[tokio::test]
async fn escalates_an_active_thread_and_records_audit_event() {
    let store = InMemoryStore::new();
    let now = Utc::now();
    store.update_thread(sample_thread("thr_1", "wsp_1", now)).await.unwrap();

    handle(args("thr_1"), &store).await.unwrap();

    let thread = store.get_thread(&ThreadId::from("thr_1")).await.unwrap().unwrap();
    assert_eq!(thread.status, ThreadStatus::Blocked);
    assert_eq!(thread.escalation_owner.unwrap().as_str(), "human_operator");

    let events = store.list_audit_events(&ThreadId::from("thr_1"), 10).await.unwrap();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].action, "thread_escalated");
    assert_eq!(events[0].reason, "needs a human");
}

#[tokio::test]
async fn escalating_a_closed_thread_is_an_error() {
    let store = InMemoryStore::new();
    let now = Utc::now();
    let mut thread = sample_thread("thr_1", "wsp_1", now);
    thread.status = ThreadStatus::Closed;
    store.update_thread(thread).await.unwrap();

    let err = handle(args("thr_1"), &store).await.unwrap_err();
    assert!(err.to_string().contains("invalid thread transition"));
}

#[tokio::test]
async fn escalating_an_unknown_thread_is_an_error() {
    let store = InMemoryStore::new();
    let err = handle(args("thr_missing"), &store).await.unwrap_err();
    assert!(err.to_string().contains("not found"));
}
