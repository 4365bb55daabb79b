// SPDX-License-Identifier: MIT
// Copyright (c) 2026 the sv contributors

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::id::{AgentId, AttemptId, ThreadId, TriggerId, WorkspaceId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerStatus {
    Queued,
    Triggering,
    Deferred,
    Delivered,
    Timeout,
    Failed,
    FallbackResume,
    FallbackSpawn,
    CallbackPending,
    CallbackRetry,
    CallbackDelivered,
    CallbackFailed,
}

impl fmt::Display for TriggerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TriggerStatus::Queued => "queued",
            TriggerStatus::Triggering => "triggering",
            TriggerStatus::Deferred => "deferred",
            TriggerStatus::Delivered => "delivered",
            TriggerStatus::Timeout => "timeout",
            TriggerStatus::Failed => "failed",
            TriggerStatus::FallbackResume => "fallback_resume",
            TriggerStatus::FallbackSpawn => "fallback_spawn",
            TriggerStatus::CallbackPending => "callback_pending",
            TriggerStatus::CallbackRetry => "callback_retry",
            TriggerStatus::CallbackDelivered => "callback_delivered",
            TriggerStatus::CallbackFailed => "callback_failed",
        };
        f.write_str(s)
    }
}

impl TriggerStatus {
    /// Terminal statuses are never claimed or mutated again by the worker.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            TriggerStatus::CallbackDelivered | TriggerStatus::CallbackFailed | TriggerStatus::Failed
        )
    }

    /// Statuses the worker's claim query considers due for processing.
    pub fn is_claimable(self) -> bool {
        matches!(self, TriggerStatus::Queued | TriggerStatus::Deferred | TriggerStatus::CallbackRetry)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TriggerJob {
    pub trigger_id: TriggerId,
    pub thread_id: ThreadId,
    pub workspace_id: WorkspaceId,
    pub target_agent_id: AgentId,
    pub target_session_id: Option<String>,
    pub reason: String,
    pub prompt: String,
    pub status: TriggerStatus,
    pub attempts: u32,
    pub max_retries: u32,
    /// Number of callback POSTs made for this job, distinct from `attempts`
    /// (which counts PTY/fallback delivery claims). Incremented once per
    /// `CallbackPoster::post_one` call (SPEC_FULL.md §4.7).
    pub callback_attempts: u32,
    pub next_retry_at: Option<DateTime<Utc>>,
    /// `latestSeq` of the candidate that produced this job, carried so the
    /// scheduler's terminal-job dedup check (SPEC_FULL.md §4.5) can compare
    /// frontiers without re-reading the message table.
    pub observed_latest_seq: i64,
    pub triggering_lease_expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TriggerJob {
    pub fn transition(&mut self, next: TriggerStatus, now: DateTime<Utc>) {
        self.status = next;
        self.updated_at = now;
    }

    /// True once `attempts` has reached `max_retries` on a retryable outcome,
    /// meaning the worker must route to fallback instead of retrying again
    /// (SPEC_FULL.md §8 boundary behaviors).
    pub fn retries_exhausted(&self) -> bool {
        self.attempts >= self.max_retries
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttemptResult {
    Delivered,
    AckTimeout,
    PaneDead,
    SendKeysError,
    TargetNotFound,
    UnsupportedRuntime,
    Rejected,
    FallbackResumeSucceeded,
    FallbackSpawned,
    FallbackResumeFailed,
    FallbackDeferred,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TriggerAttempt {
    pub attempt_id: AttemptId,
    pub trigger_id: TriggerId,
    pub attempt_no: u32,
    pub result: AttemptResult,
    pub error_code: Option<String>,
    pub details: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl AttemptResult {
    /// Retryable results consume an attempt and backoff; non-retryable ones
    /// go straight to fallback or terminal failure (SPEC_FULL.md §7).
    pub fn is_retryable(self) -> bool {
        matches!(
            self,
            AttemptResult::AckTimeout | AttemptResult::PaneDead | AttemptResult::SendKeysError
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LaunchMode {
    Resume,
    Spawn,
}

#[cfg(test)]
#[path = "trigger_tests.rs"]
mod tests;
