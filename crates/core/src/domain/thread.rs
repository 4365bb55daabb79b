// SPDX-License-Identifier: MIT
// Copyright (c) 2026 the sv contributors

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::DomainError;
use crate::id::{AgentId, ThreadId, WorkspaceId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThreadType {
    Conversation,
    Workflow,
    Incident,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThreadStatus {
    Active,
    Blocked,
    Resolved,
    Closed,
}

impl fmt::Display for ThreadStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ThreadStatus::Active => write!(f, "active"),
            ThreadStatus::Blocked => write!(f, "blocked"),
            ThreadStatus::Resolved => write!(f, "resolved"),
            ThreadStatus::Closed => write!(f, "closed"),
        }
    }
}

impl ThreadStatus {
    /// Whether `self -> next` is a legal transition per the state diagram:
    /// `active -> {blocked, resolved, closed}`, `blocked -> {active, closed}`,
    /// `resolved -> {closed}`, `closed -> {}`.
    pub fn can_transition_to(self, next: ThreadStatus) -> bool {
        use ThreadStatus::*;
        matches!(
            (self, next),
            (Active, Blocked) | (Active, Resolved) | (Active, Closed)
                | (Blocked, Active) | (Blocked, Closed)
                | (Resolved, Closed)
        )
    }

    pub fn validate_transition(self, next: ThreadStatus) -> Result<(), DomainError> {
        if self.can_transition_to(next) {
            Ok(())
        } else {
            Err(DomainError::InvalidThreadTransition {
                from: self.to_string(),
                to: next.to_string(),
            })
        }
    }

    /// Closed threads are excluded from reconciliation (SPEC_FULL.md §3).
    pub fn is_reconcilable(self) -> bool {
        !matches!(self, ThreadStatus::Closed)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Thread {
    pub thread_id: ThreadId,
    pub workspace_id: WorkspaceId,
    pub title: String,
    pub kind: ThreadType,
    pub status: ThreadStatus,
    pub escalation_owner: Option<AgentId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Thread {
    pub fn transition(&mut self, next: ThreadStatus, now: DateTime<Utc>) -> Result<(), DomainError> {
        self.status.validate_transition(next)?;
        self.status = next;
        self.updated_at = now;
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThreadParticipant {
    pub thread_id: ThreadId,
    pub agent_id: AgentId,
}

#[cfg(test)]
#[path = "thread_tests.rs"]
mod tests;
