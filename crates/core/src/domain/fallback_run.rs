// SPDX-License-Identifier: MIT
// Copyright (c) 2026 the sv contributors

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::trigger::LaunchMode;
use crate::id::{RunId, TriggerId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FallbackOutcome {
    Started,
    Failed,
    CrashLoop,
    TimedOut,
    Killed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TriggerFallbackRun {
    pub run_id: RunId,
    pub trigger_id: TriggerId,
    pub launch_mode: LaunchMode,
    pub pid: Option<u32>,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub outcome: Option<FallbackOutcome>,
}

impl TriggerFallbackRun {
    /// A run started but never finished, and is older than `exec_timeout`, is
    /// orphaned and must be reconciled by the worker on its next pass.
    pub fn is_orphaned(&self, now: DateTime<Utc>, exec_timeout: chrono::Duration) -> bool {
        self.finished_at.is_none() && now - self.started_at > exec_timeout
    }
}
