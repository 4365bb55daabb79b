// SPDX-License-Identifier: MIT
// Copyright (c) 2026 the sv contributors

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::DomainError;
use crate::id::{AgentId, MessageId, ThreadId};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParticipantCursor {
    pub thread_id: ThreadId,
    pub agent_id: AgentId,
    pub last_read_seq: i64,
    pub last_acked_message_id: Option<MessageId>,
    pub updated_at: DateTime<Utc>,
}

impl ParticipantCursor {
    pub fn new(thread_id: ThreadId, agent_id: AgentId, now: DateTime<Utc>) -> Self {
        Self {
            thread_id,
            agent_id,
            last_read_seq: 0,
            last_acked_message_id: None,
            updated_at: now,
        }
    }

    /// Advances `last_read_seq` to `seq`, rejecting regressions. Non-mutating
    /// on error, matching the "cursor monotonicity" invariant in
    /// SPEC_FULL.md §8.
    pub fn acknowledge_read(&mut self, seq: i64, acked_message_id: Option<MessageId>, now: DateTime<Utc>) -> Result<(), DomainError> {
        if seq < self.last_read_seq {
            return Err(DomainError::CursorRegression {
                thread_id: self.thread_id.to_string(),
                agent_id: self.agent_id.to_string(),
                current: seq,
                existing: self.last_read_seq,
            });
        }
        self.last_read_seq = seq;
        if acked_message_id.is_some() {
            self.last_acked_message_id = acked_message_id;
        }
        self.updated_at = now;
        Ok(())
    }

    /// Messages with `seq > last_read_seq` are unread.
    pub fn is_unread(&self, latest_seq: i64) -> bool {
        latest_seq > self.last_read_seq
    }
}

#[cfg(test)]
#[path = "cursor_tests.rs"]
mod tests;
