// SPDX-License-Identifier: MIT
// Copyright (c) 2026 the sv contributors

use chrono::Utc;
use sv_core::domain::ThreadStatus;
use sv_core::id::ThreadId;
use sv_core::test_support::sample_thread;
use sv_storage::{AuditStore, InMemoryStore, SnapshotStore};

use super::*;

fn args(thread_id: &str) -> OverrideCloseThreadArgs {
    OverrideCloseThreadArgs {
        thread_id: thread_id.to_string(),
        reason: "stuck with no owner left".to_string(),
        actor_agent_id: "human_operator".to_string(),
        json: false,
    }
}

#[tokio::test]
async fn closes_a_blocked_thread_bypassing_the_normal_graph() {
    let store = InMemoryStore::new();
    let now = Utc::now();
    let mut thread = sample_thread("thr_1", "wsp_1", now);
    thread.status = ThreadStatus::Blocked;
    store.update_thread(thread).await.unwrap();

    handle(args("thr_1"), &store).await.unwrap();

    let thread = store.get_thread(&ThreadId::from("thr_1")).await.unwrap().unwrap();
    assert_eq!(thread.status, ThreadStatus::Closed);

    let events = store.list_audit_events(&ThreadId::from("thr_1"), 10).await.unwrap();
    assert_eq!(events[0].action, "thread_override_closed");
}

#[tokio::test]
async fn closing_an_already_closed_thread_is_idempotent() {
    let store = InMemoryStore::new();
    let now = Utc::now();
    let mut thread = sample_thread("thr_1", "wsp_1", now);
    thread.status = ThreadStatus::Closed;
    store.update_thread(thread).await.unwrap();

    handle(args("thr_1"), &store).await.unwrap();

    let thread = store.get_thread(&ThreadId::from("thr_1")).await.unwrap().unwrap();
    assert_eq!(thread.status, ThreadStatus::Closed);
}
