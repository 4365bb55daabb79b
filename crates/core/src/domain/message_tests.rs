// SPDX-License-Identifier: MIT
// Copyright (c) 2026 the sv contributors

use super::*;
use crate::id::ThreadId;

fn tid() -> ThreadId {
    ThreadId::from("thr_abc")
}

#[test]
fn first_message_must_be_seq_one() {
    assert!(validate_next_seq(&tid(), 0, 1).is_ok());
    assert!(validate_next_seq(&tid(), 0, 2).is_err());
}

#[test]
fn gap_free_monotonic_progression() {
    assert!(validate_next_seq(&tid(), 5, 6).is_ok());
    assert!(validate_next_seq(&tid(), 5, 7).is_err());
    assert!(validate_next_seq(&tid(), 5, 5).is_err());
}

#[test]
fn overflow_is_rejected_before_arithmetic() {
    let err = validate_next_seq(&tid(), i64::MAX - 1, i64::MAX).unwrap_err();
    assert_eq!(err.code(), "SEQUENCE_OVERFLOW");
}

#[test]
fn event_version_defaults_to_one_when_metadata_absent() {
    let msg = Message {
        message_id: crate::id::MessageId::from("msg_1"),
        thread_id: tid(),
        schema_version: CURRENT_SCHEMA_VERSION,
        seq: 1,
        sender_agent_id: crate::id::AgentId::from("agt_1"),
        sender_session_id: None,
        kind: MessageKind::Event,
        body: "hello".into(),
        metadata: None,
        in_reply_to: None,
        idempotency_key: None,
        created_at: chrono::Utc::now(),
    };
    assert_eq!(msg.event_version(), 1);
}

#[test]
fn event_version_reads_from_metadata_when_present() {
    let mut msg = Message {
        message_id: crate::id::MessageId::from("msg_1"),
        thread_id: tid(),
        schema_version: CURRENT_SCHEMA_VERSION,
        seq: 1,
        sender_agent_id: crate::id::AgentId::from("agt_1"),
        sender_session_id: None,
        kind: MessageKind::Event,
        body: "hello".into(),
        metadata: None,
        in_reply_to: None,
        idempotency_key: None,
        created_at: chrono::Utc::now(),
    };
    msg.metadata = Some(serde_json::json!({"event_version": 3}));
    assert_eq!(msg.event_version(), 3);
}
