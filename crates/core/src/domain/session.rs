// SPDX-License-Identifier: MIT
// Copyright (c) 2026 the sv contributors

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::id::{AgentId, WorkspaceId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ManagementMode {
    Managed,
    Unmanaged,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Active,
    Idle,
    Offline,
}

impl SessionStatus {
    pub fn is_dormant(self) -> bool {
        !matches!(self, SessionStatus::Active)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionRecord {
    pub agent_id: AgentId,
    pub workspace_id: WorkspaceId,
    pub session_id: String,
    pub runtime: String,
    pub management_mode: ManagementMode,
    pub resumable: bool,
    pub status: SessionStatus,
    pub last_heartbeat_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct Heartbeat {
    pub agent_id: AgentId,
    pub workspace_id: WorkspaceId,
    pub session_id: String,
    pub runtime: String,
    pub management_mode: ManagementMode,
    pub resumable: bool,
    pub status: SessionStatus,
    pub heartbeat_at: DateTime<Utc>,
}

impl SessionRecord {
    pub fn from_heartbeat(hb: Heartbeat, now: DateTime<Utc>) -> Self {
        Self {
            agent_id: hb.agent_id,
            workspace_id: hb.workspace_id,
            session_id: hb.session_id,
            runtime: hb.runtime,
            management_mode: hb.management_mode,
            resumable: hb.resumable,
            status: hb.status,
            last_heartbeat_at: hb.heartbeat_at,
            updated_at: now,
        }
    }

    /// Applies `hb` on top of `existing`, following the last-writer-wins rule
    /// in SPEC_FULL.md §3: a heartbeat strictly newer than the stored
    /// `last_heartbeat_at` overwrites; an equal or older one is a no-op.
    /// Returns `None` when the heartbeat should be dropped.
    pub fn apply_heartbeat(existing: Option<&SessionRecord>, hb: Heartbeat, now: DateTime<Utc>) -> Option<SessionRecord> {
        match existing {
            Some(current) if hb.heartbeat_at <= current.last_heartbeat_at => None,
            _ => Some(SessionRecord::from_heartbeat(hb, now)),
        }
    }

    /// A session is stale once its last heartbeat is older than
    /// `stale_after_hours`, relative to `now`.
    pub fn is_stale(&self, now: DateTime<Utc>, stale_after_hours: i64) -> bool {
        let cutoff = now - chrono::Duration::hours(stale_after_hours);
        self.last_heartbeat_at < cutoff
    }
}

#[cfg(test)]
#[path = "session_tests.rs"]
mod tests;
