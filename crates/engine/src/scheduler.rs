// SPDX-License-Identifier: MIT
// Copyright (c) 2026 the sv contributors

//! Trigger Scheduler (C6): converts unread candidates into durable
//! `trigger_jobs`, enforcing rate limits, a backlog breaker, and dedup
//! against already-pending jobs (SPEC_FULL.md §4.5).

use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;

use sv_core::domain::{TriggerJob, TriggerStatus};
use sv_core::id::{AgentId, IdGen, WorkspaceId};
use sv_storage::TriggerStore;

use crate::config::EngineConfig;
use crate::error::EngineError;
use crate::unread::Candidate;

const ACTIVE_STATUSES: &[TriggerStatus] = &[
    TriggerStatus::Queued,
    TriggerStatus::Triggering,
    TriggerStatus::Deferred,
    TriggerStatus::FallbackResume,
    TriggerStatus::FallbackSpawn,
    TriggerStatus::CallbackPending,
    TriggerStatus::CallbackRetry,
];

#[derive(Debug, Clone)]
pub struct ScheduleInput {
    pub workspace_id: WorkspaceId,
    pub candidates: Vec<Candidate>,
    pub trigger_max_retries: u32,
    pub pending_jobs: u64,
    pub scheduled_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScheduleStats {
    pub enqueued: u32,
    pub skipped_pending: u32,
    pub reused_existing: u32,
    pub suppressed_by_budget: u32,
    pub suppressed_by_breaker: u32,
    pub breaker_open: bool,
    pub pending_jobs: u64,
}

/// Per-workspace backlog breaker state. Advisory and restart-tolerant, per
/// SPEC_FULL.md §9 — kept in-process on the scheduler instance.
#[derive(Debug, Default)]
struct BreakerState {
    opened_at: Option<DateTime<Utc>>,
}

pub struct TriggerScheduler<St> {
    store: St,
    ids: Arc<dyn IdGen>,
    breaker: Mutex<BreakerState>,
}

impl<St: TriggerStore> TriggerScheduler<St> {
    pub fn new(store: St, ids: Arc<dyn IdGen>) -> Self {
        Self { store, ids, breaker: Mutex::new(BreakerState::default()) }
    }

    pub async fn schedule(&self, input: ScheduleInput, config: &EngineConfig) -> Result<ScheduleStats, EngineError> {
        let mut stats = ScheduleStats { pending_jobs: input.pending_jobs, ..Default::default() };

        if self.breaker_open(input.pending_jobs, input.scheduled_at, config) {
            stats.breaker_open = true;
            stats.suppressed_by_breaker = input.candidates.len() as u32;
            tracing::warn!(
                workspace_id = %input.workspace_id,
                pending_jobs = input.pending_jobs,
                suppressed = stats.suppressed_by_breaker,
                "trigger scheduler breaker open, dropping all candidates"
            );
            return Ok(stats);
        }

        for candidate in input.candidates {
            if let Some(existing) = self.store.find_active_job(&candidate.thread_id, &candidate.participant_agent_id).await? {
                let _ = existing;
                stats.reused_existing += 1;
                continue;
            }

            if let Some(terminal_seq) = self
                .store
                .max_terminal_observed_seq(&candidate.thread_id, &candidate.participant_agent_id)
                .await?
            {
                if candidate.latest_seq <= terminal_seq {
                    stats.skipped_pending += 1;
                    continue;
                }
            }

            if !self.within_rate_limit(&input.workspace_id, &candidate.participant_agent_id, input.scheduled_at, config).await? {
                stats.suppressed_by_budget += 1;
                continue;
            }

            let job = TriggerJob {
                trigger_id: self.ids.trigger_id(),
                thread_id: candidate.thread_id.clone(),
                workspace_id: input.workspace_id.clone(),
                target_agent_id: candidate.participant_agent_id.clone(),
                target_session_id: candidate.session_id.clone(),
                reason: candidate.reason.to_string(),
                prompt: render_prompt(&candidate),
                status: TriggerStatus::Queued,
                attempts: 0,
                callback_attempts: 0,
                max_retries: input.trigger_max_retries,
                next_retry_at: None,
                observed_latest_seq: candidate.latest_seq,
                triggering_lease_expires_at: None,
                created_at: input.scheduled_at,
                updated_at: input.scheduled_at,
            };
            self.store.insert_job(job).await?;
            stats.enqueued += 1;
        }

        tracing::info!(
            workspace_id = %input.workspace_id,
            enqueued = stats.enqueued,
            reused = stats.reused_existing,
            suppressed_by_budget = stats.suppressed_by_budget,
            "trigger scheduler pass complete"
        );

        Ok(stats)
    }

    fn breaker_open(&self, pending_jobs: u64, now: DateTime<Utc>, config: &EngineConfig) -> bool {
        let mut breaker = self.breaker.lock();
        if pending_jobs >= config.auto_unread_breaker_backlog_threshold {
            breaker.opened_at = Some(now);
            return true;
        }
        match breaker.opened_at {
            Some(opened_at) if now - opened_at < chrono::Duration::from_std(config.auto_unread_breaker_cooldown).unwrap_or_default() => true,
            Some(_) => {
                breaker.opened_at = None;
                false
            }
            None => false,
        }
    }

    async fn within_rate_limit(&self, workspace_id: &WorkspaceId, agent_id: &AgentId, now: DateTime<Utc>, config: &EngineConfig) -> Result<bool, EngineError> {
        let window_start = now - chrono::Duration::from_std(config.auto_unread_window).unwrap_or_default();
        let recent = self.store.count_recent_triggers(workspace_id, agent_id, window_start).await?;
        if recent >= config.auto_unread_max_triggers_per_window {
            return Ok(false);
        }
        if let Some(last_at) = self.store.last_trigger_at(workspace_id, agent_id).await? {
            let min_interval = chrono::Duration::from_std(config.auto_unread_min_interval).unwrap_or_default();
            if now - last_at < min_interval {
                return Ok(false);
            }
        }
        Ok(true)
    }
}

fn render_prompt(candidate: &Candidate) -> String {
    format!(
        "You have {} unread message(s) in thread {} (latest seq {}). Please read and respond.",
        candidate.unread_count, candidate.thread_id, candidate.latest_seq
    )
}

#[cfg(test)]
#[path = "scheduler_tests.rs"]
mod tests;
