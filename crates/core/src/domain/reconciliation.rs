// SPDX-License-Identifier: MIT
// Copyright (c) 2026 the sv contributors

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::id::{AgentId, ThreadId};

/// Write-only latch preventing re-triggering the same unread frontier twice
/// (SPEC_FULL.md §3, `ReconciliationState`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReconciliationState {
    pub thread_id: ThreadId,
    pub agent_id: AgentId,
    pub last_notified_seq: i64,
    pub notified_at: DateTime<Utc>,
}

impl ReconciliationState {
    /// A candidate is a duplicate if the unread frontier (`latest_seq`) has
    /// already been notified for this `(thread, agent)` pair.
    pub fn already_notified(existing: Option<&ReconciliationState>, latest_seq: i64) -> bool {
        existing.is_some_and(|s| s.last_notified_seq >= latest_seq)
    }
}
