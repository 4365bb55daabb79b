// SPDX-License-Identifier: MIT
// Copyright (c) 2026 the sv contributors

use super::*;
use chrono::TimeZone;
use sv_core::domain::{Heartbeat, ManagementMode, Message, MessageKind, ParticipantCursor, SessionStatus, Thread, ThreadParticipant, ThreadStatus, ThreadType};
use sv_core::id::{AgentId, MessageId, ThreadId, WorkspaceId};
use sv_storage::InMemoryStore;
use uuid::Uuid;

fn workspace() -> WorkspaceId {
    WorkspaceId::from("wsp_1")
}

fn seed_thread(store: &InMemoryStore, thread_id: &ThreadId) {
    let now = Utc.with_ymd_and_hms(2026, 2, 18, 9, 0, 0).unwrap();
    store.seed_thread(Thread {
        thread_id: thread_id.clone(),
        workspace_id: workspace(),
        title: "t".to_string(),
        kind: ThreadType::Conversation,
        status: ThreadStatus::Active,
        escalation_owner: None,
        created_at: now,
        updated_at: now,
    });
    store.seed_participant(ThreadParticipant {
        thread_id: thread_id.clone(),
        agent_id: AgentId::from("agent_b"),
    });
}

async fn append_messages_from(store: &InMemoryStore, thread_id: &ThreadId, start_seq: i64, count: i64, created_at: chrono::DateTime<Utc>) {
    for seq in start_seq..start_seq + count {
        store
            .append_message(Message {
                message_id: MessageId::new(Uuid::from_u128(seq as u128)),
                thread_id: thread_id.clone(),
                schema_version: 1,
                seq,
                sender_agent_id: AgentId::from("agent_a"),
                sender_session_id: None,
                kind: MessageKind::Chat,
                body: format!("msg {seq}"),
                metadata: None,
                in_reply_to: None,
                idempotency_key: None,
                created_at,
            })
            .await
            .unwrap();
    }
}

async fn append_messages(store: &InMemoryStore, thread_id: &ThreadId, count: i64, created_at: chrono::DateTime<Utc>) {
    append_messages_from(store, thread_id, 1, count, created_at).await;
}

/// S1 — unread dormant participant is triggered.
#[tokio::test]
async fn s1_unread_dormant_participant_is_triggered() {
    let store = InMemoryStore::new();
    let thread_id = ThreadId::from("th_02");
    seed_thread(&store, &thread_id);
    let created_at = Utc.with_ymd_and_hms(2026, 2, 18, 9, 0, 0).unwrap();
    append_messages(&store, &thread_id, 6, created_at).await;

    store
        .upsert_cursor(ParticipantCursor {
            thread_id: thread_id.clone(),
            agent_id: AgentId::from("agent_b"),
            last_read_seq: 2,
            last_acked_message_id: None,
            updated_at: created_at,
        })
        .await
        .unwrap();

    let hb_at = Utc.with_ymd_and_hms(2026, 2, 18, 10, 0, 0).unwrap();
    store
        .upsert_from_heartbeat(
            Heartbeat {
                agent_id: AgentId::from("agent_b"),
                workspace_id: workspace(),
                session_id: "sess_b".to_string(),
                runtime: "tmux:win.0".to_string(),
                management_mode: ManagementMode::Managed,
                resumable: true,
                status: SessionStatus::Idle,
                heartbeat_at: hb_at,
            },
            hb_at,
        )
        .await
        .unwrap();

    let reconciler = UnreadReconciler::new(store);
    let polled_at = Utc.with_ymd_and_hms(2026, 2, 18, 10, 10, 0).unwrap();
    let outcome = reconciler
        .reconcile(ReconcileInput {
            workspace_id: workspace(),
            stale_after_hours: 12,
            include_closed_threads: false,
            polled_at,
        })
        .await
        .unwrap();

    assert_eq!(outcome.candidates.len(), 1);
    let candidate = &outcome.candidates[0];
    assert_eq!(candidate.thread_id, thread_id);
    assert_eq!(candidate.participant_agent_id, AgentId::from("agent_b"));
    assert_eq!(candidate.unread_count, 4);
    assert_eq!(candidate.reason, REASON_NEW_UNREAD_DORMANT_PARTICIPANT);
}

/// S2 — active, fresh participant is skipped.
#[tokio::test]
async fn s2_active_participant_is_skipped() {
    let store = InMemoryStore::new();
    let thread_id = ThreadId::from("th_02");
    seed_thread(&store, &thread_id);
    let created_at = Utc.with_ymd_and_hms(2026, 2, 18, 9, 0, 0).unwrap();
    append_messages(&store, &thread_id, 6, created_at).await;

    store
        .upsert_cursor(ParticipantCursor {
            thread_id: thread_id.clone(),
            agent_id: AgentId::from("agent_b"),
            last_read_seq: 2,
            last_acked_message_id: None,
            updated_at: created_at,
        })
        .await
        .unwrap();

    let polled_at = Utc.with_ymd_and_hms(2026, 2, 18, 10, 10, 0).unwrap();
    let hb_at = polled_at - chrono::Duration::minutes(1);
    store
        .upsert_from_heartbeat(
            Heartbeat {
                agent_id: AgentId::from("agent_b"),
                workspace_id: workspace(),
                session_id: "sess_b".to_string(),
                runtime: "tmux:win.0".to_string(),
                management_mode: ManagementMode::Managed,
                resumable: true,
                status: SessionStatus::Active,
                heartbeat_at: hb_at,
            },
            hb_at,
        )
        .await
        .unwrap();

    let reconciler = UnreadReconciler::new(store);
    let outcome = reconciler
        .reconcile(ReconcileInput {
            workspace_id: workspace(),
            stale_after_hours: 12,
            include_closed_threads: false,
            polled_at,
        })
        .await
        .unwrap();

    assert!(outcome.candidates.is_empty());
    assert_eq!(outcome.stats.unread_participants, 1);
    assert_eq!(outcome.stats.dormant_unread_participants, 0);
}

/// S3 — dedup across ticks, then a new candidate once latest_seq advances.
#[tokio::test]
async fn s3_dedup_across_ticks_then_new_frontier() {
    let store = InMemoryStore::new();
    let thread_id = ThreadId::from("th_02");
    seed_thread(&store, &thread_id);
    let created_at = Utc.with_ymd_and_hms(2026, 2, 18, 9, 0, 0).unwrap();
    append_messages(&store, &thread_id, 6, created_at).await;

    store
        .upsert_cursor(ParticipantCursor {
            thread_id: thread_id.clone(),
            agent_id: AgentId::from("agent_b"),
            last_read_seq: 2,
            last_acked_message_id: None,
            updated_at: created_at,
        })
        .await
        .unwrap();

    let hb_at = Utc.with_ymd_and_hms(2026, 2, 18, 10, 0, 0).unwrap();
    store
        .upsert_from_heartbeat(
            Heartbeat {
                agent_id: AgentId::from("agent_b"),
                workspace_id: workspace(),
                session_id: "sess_b".to_string(),
                runtime: "tmux:win.0".to_string(),
                management_mode: ManagementMode::Managed,
                resumable: true,
                status: SessionStatus::Idle,
                heartbeat_at: hb_at,
            },
            hb_at,
        )
        .await
        .unwrap();

    let reconciler = UnreadReconciler::new(store);

    let first = reconciler
        .reconcile(ReconcileInput {
            workspace_id: workspace(),
            stale_after_hours: 12,
            include_closed_threads: false,
            polled_at: Utc.with_ymd_and_hms(2026, 2, 18, 10, 10, 0).unwrap(),
        })
        .await
        .unwrap();
    assert_eq!(first.candidates.len(), 1);

    let second = reconciler
        .reconcile(ReconcileInput {
            workspace_id: workspace(),
            stale_after_hours: 12,
            include_closed_threads: false,
            polled_at: Utc.with_ymd_and_hms(2026, 2, 18, 10, 11, 0).unwrap(),
        })
        .await
        .unwrap();
    assert!(second.candidates.is_empty());
    assert_eq!(second.stats.deduplicated_participants, 1);

    append_messages_from(&reconciler.store, &thread_id, 7, 1, Utc.with_ymd_and_hms(2026, 2, 18, 10, 11, 30).unwrap()).await;

    let third = reconciler
        .reconcile(ReconcileInput {
            workspace_id: workspace(),
            stale_after_hours: 12,
            include_closed_threads: false,
            polled_at: Utc.with_ymd_and_hms(2026, 2, 18, 10, 12, 0).unwrap(),
        })
        .await
        .unwrap();
    assert_eq!(third.candidates.len(), 1);
    assert_eq!(third.candidates[0].latest_seq, 7);
}
