// SPDX-License-Identifier: MIT
// Copyright (c) 2026 the sv contributors

//! Callback Poster (C8): reports a trigger job's terminal outcome back to the
//! bridge collaborator and advances `callback_pending|callback_retry` jobs to
//! a terminal callback state (SPEC_FULL.md §4.7).

use chrono::{DateTime, Utc};

use sv_adapters::{CallbackClient, CallbackOutcome, CallbackRequest};
use sv_core::domain::{AttemptResult, AuditEvent, TriggerJob, TriggerStatus};
use sv_core::id::{IdGen, WorkspaceId};
use sv_storage::{AuditStore, TriggerStore};
use std::sync::Arc;

use crate::config::EngineConfig;
use crate::error::EngineError;

const AUTH_TOKEN_MISSING: &str = "CALLBACK_AUTH_TOKEN_MISSING";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CallbackStats {
    pub posted: u32,
    pub delivered: u32,
    pub retried: u32,
    pub dead_lettered: u32,
}

enum PostOutcome {
    Delivered,
    Retried,
    DeadLettered,
}

pub struct CallbackPoster<C, St> {
    client: C,
    store: St,
    ids: Arc<dyn IdGen>,
}

impl<C: CallbackClient, St: TriggerStore + AuditStore> CallbackPoster<C, St> {
    pub fn new(client: C, store: St, ids: Arc<dyn IdGen>) -> Self {
        Self { client, store, ids }
    }

    /// Posts every `callback_pending`/`callback_retry` job in `workspace_id`
    /// whose `next_retry_at` is due, advancing it to `callback_delivered`,
    /// `callback_retry`, or `callback_failed`.
    pub async fn post_due_callbacks(&self, workspace_id: &WorkspaceId, limit: usize, now: DateTime<Utc>, config: &EngineConfig) -> Result<CallbackStats, EngineError> {
        let due = self.store.list_due_callback_jobs(workspace_id, limit, now).await?;

        let mut stats = CallbackStats::default();
        for job in due {
            stats.posted += 1;
            match self.post_one(job, now, config).await? {
                PostOutcome::Delivered => stats.delivered += 1,
                PostOutcome::Retried => stats.retried += 1,
                PostOutcome::DeadLettered => stats.dead_lettered += 1,
            }
        }
        Ok(stats)
    }

    async fn post_one(&self, mut job: TriggerJob, now: DateTime<Utc>, config: &EngineConfig) -> Result<PostOutcome, EngineError> {
        if config.bridge_access_token.trim().is_empty() {
            tracing::error!(trigger_id = %job.trigger_id, "callback auth token missing, dead-lettering");
            self.dead_letter(job, AUTH_TOKEN_MISSING, now).await?;
            return Ok(PostOutcome::DeadLettered);
        }

        let attempts = self.store.list_attempts(&job.trigger_id).await?;
        let (trigger_outcome, trigger_error_code) = summarize_outcome(&attempts);
        job.callback_attempts += 1;
        let callback_attempt_no = job.callback_attempts;

        let request = CallbackRequest {
            base_url: config.bridge_base_url.clone(),
            token: config.bridge_access_token.clone(),
            thread_id: job.thread_id.clone(),
            trigger_id: job.trigger_id.clone(),
            job_id: job.trigger_id.to_string(),
            target_agent_id: job.target_agent_id.clone(),
            trigger_reason: job.reason.clone(),
            trigger_outcome,
            trigger_attempt_no: job.attempts,
            trigger_error_code,
            started_at: job.created_at,
            finished_at: now,
            callback_attempt_no,
            timeout: config.callback_request_timeout,
        };

        match self.client.post(request).await {
            CallbackOutcome::Delivered => {
                job.transition(TriggerStatus::CallbackDelivered, now);
                self.store.update_job(job).await?;
                Ok(PostOutcome::Delivered)
            }
            CallbackOutcome::Retry { error_code, retry_after_ms } => {
                if callback_attempt_no >= config.callback_max_retries {
                    self.dead_letter(job, &error_code, now).await?;
                    return Ok(PostOutcome::DeadLettered);
                }
                let delay = retry_after_ms
                    .map(|ms| chrono::Duration::milliseconds(ms as i64))
                    .unwrap_or_else(|| chrono::Duration::from_std(config.callback_request_timeout).unwrap_or_default());
                job.next_retry_at = Some(now + delay);
                job.transition(TriggerStatus::CallbackRetry, now);
                self.store.update_job(job).await?;
                Ok(PostOutcome::Retried)
            }
            CallbackOutcome::Failed { error_code } => {
                self.dead_letter(job, &error_code, now).await?;
                Ok(PostOutcome::DeadLettered)
            }
        }
    }

    /// Exhausted or fatally failed callback: terminal `callback_failed` plus
    /// an audit trail entry, per the dead-letter handling in SPEC_FULL.md §9.
    async fn dead_letter(&self, mut job: TriggerJob, error_code: &str, now: DateTime<Utc>) -> Result<(), EngineError> {
        job.transition(TriggerStatus::CallbackFailed, now);
        let trigger_id = job.trigger_id.clone();
        let workspace_id = job.workspace_id.clone();
        let target_agent_id = job.target_agent_id.clone();
        self.store.update_job(job).await?;

        self.store
            .append_audit_event(AuditEvent {
                audit_id: self.ids.audit_id(),
                workspace_id,
                actor_agent_id: target_agent_id,
                action: "callback_dead_lettered".to_string(),
                subject_thread_id: None,
                reason: error_code.to_string(),
                metadata: Some(serde_json::json!({ "trigger_id": trigger_id.to_string(), "error_code": error_code })),
                created_at: now,
            })
            .await?;
        Ok(())
    }
}

fn summarize_outcome(attempts: &[sv_core::domain::TriggerAttempt]) -> (String, Option<String>) {
    match attempts.last() {
        None => ("unknown".to_string(), None),
        Some(last) => (attempt_result_label(last.result).to_string(), last.error_code.clone()),
    }
}

fn attempt_result_label(result: AttemptResult) -> &'static str {
    match result {
        AttemptResult::Delivered => "delivered",
        AttemptResult::AckTimeout => "ack_timeout",
        AttemptResult::PaneDead => "pane_dead",
        AttemptResult::SendKeysError => "send_keys_error",
        AttemptResult::TargetNotFound => "target_not_found",
        AttemptResult::UnsupportedRuntime => "unsupported_runtime",
        AttemptResult::Rejected => "rejected",
        AttemptResult::FallbackResumeSucceeded => "fallback_resume_succeeded",
        AttemptResult::FallbackSpawned => "fallback_spawned",
        AttemptResult::FallbackResumeFailed => "fallback_resume_failed",
        AttemptResult::FallbackDeferred => "fallback_deferred",
    }
}

#[cfg(test)]
#[path = "callback_tests.rs"]
mod tests;
