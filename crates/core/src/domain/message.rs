// SPDX-License-Identifier: MIT
// Copyright (c) 2026 the sv contributors

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::DomainError;
use crate::id::{AgentId, MessageId, ThreadId};

pub const CURRENT_SCHEMA_VERSION: u32 = 1;
pub const DEFAULT_EVENT_VERSION: u32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageKind {
    Chat,
    Event,
    System,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub message_id: MessageId,
    pub thread_id: ThreadId,
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    pub seq: i64,
    pub sender_agent_id: AgentId,
    pub sender_session_id: Option<String>,
    pub kind: MessageKind,
    pub body: String,
    pub metadata: Option<Value>,
    pub in_reply_to: Option<MessageId>,
    pub idempotency_key: Option<String>,
    pub created_at: DateTime<Utc>,
}

fn default_schema_version() -> u32 {
    CURRENT_SCHEMA_VERSION
}

impl Message {
    /// `metadata.event_version`, defaulting to 1 when absent, per SPEC_FULL.md §3.
    pub fn event_version(&self) -> u32 {
        self.metadata
            .as_ref()
            .and_then(|m| m.get("event_version"))
            .and_then(Value::as_u64)
            .map(|v| v as u32)
            .unwrap_or(DEFAULT_EVENT_VERSION)
    }

    pub fn trigger_id_field(&self) -> Option<&str> {
        self.metadata
            .as_ref()
            .and_then(|m| m.get("trigger_id"))
            .and_then(Value::as_str)
    }
}

/// Validates that `candidate_seq` is the correct next sequence number for a
/// thread currently at `latest_seq` (0 if the thread has no messages yet).
/// Sequences are strictly monotonic and gap-free, starting at 1.
pub fn validate_next_seq(thread_id: &ThreadId, latest_seq: i64, candidate_seq: i64) -> Result<(), DomainError> {
    let expected = latest_seq + 1;
    if candidate_seq == i64::MAX {
        return Err(DomainError::SequenceOverflow {
            thread_id: thread_id.to_string(),
        });
    }
    if candidate_seq != expected {
        return Err(DomainError::SequenceViolation {
            thread_id: thread_id.to_string(),
            expected,
            actual: candidate_seq,
        });
    }
    Ok(())
}

#[cfg(test)]
#[path = "message_tests.rs"]
mod tests;
