// SPDX-License-Identifier: MIT
// Copyright (c) 2026 the sv contributors

//! Trigger Queue Worker (C7): claims due jobs, drives delivery through the
//! PTY adapter with ack polling, falls back to C4 on failure or exhausted
//! retries, and reconciles in-flight fallback runs (SPEC_FULL.md §4.6).

use chrono::{DateTime, Utc};

use sv_adapters::{ack_poll_interval, deliver, DeliverError, DeliverRequest, PtyAdapter, PtyError, ProcessLauncher};
use sv_core::domain::payload::DEFAULT_MAX_PAYLOAD_BYTES;
use sv_core::domain::{AttemptResult, FallbackOutcome, LaunchMode, TriggerAttempt, TriggerFallbackRun, TriggerJob, TriggerStatus};
use sv_core::id::{IdGen, WorkspaceId};
use sv_storage::{RegistryStore, SnapshotStore, TriggerStore};
use std::sync::Arc;

use crate::backoff::retry_delay_with_hint;
use crate::config::EngineConfig;
use crate::error::EngineError;
use crate::fallback::{FallbackExecutor, FallbackNextStatus, FallbackRequest};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProcessStats {
    pub claimed: u32,
    pub delivered: u32,
    pub deferred: u32,
    pub fallback_resumed: u32,
    pub fallback_spawned: u32,
    pub dead_lettered: u32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FallbackReconcileStats {
    pub scanned: u32,
    pub timed_out: u32,
    pub killed: u32,
}

pub struct TriggerQueueWorker<St, P, L> {
    store: St,
    pty: P,
    ids: Arc<dyn IdGen>,
    fallback: FallbackExecutor<L, St>,
    launcher: L,
}

impl<St, P, L> TriggerQueueWorker<St, P, L>
where
    St: TriggerStore + SnapshotStore + RegistryStore + Clone,
    P: PtyAdapter,
    L: ProcessLauncher,
{
    pub fn new(store: St, pty: P, launcher: L, ids: Arc<dyn IdGen>, config: &EngineConfig) -> Self {
        let fallback = FallbackExecutor::new(
            launcher.clone(),
            store.clone(),
            config.trigger_resume_max_attempts,
            config.stale_after_hours,
            config.crash_loop_threshold,
            config.crash_loop_window,
            config.fallback_allow_dangerous_bypass,
            config.fallback_max_active_global,
            config.fallback_max_active_per_agent,
        );
        Self { store, pty, ids, fallback, launcher }
    }

    /// `processDueJobs`: claim a batch of due jobs and drive each through the
    /// attempt pipeline. Jobs are processed independently; one job's error
    /// never aborts the batch.
    pub async fn process_due_jobs(&self, workspace_id: &WorkspaceId, limit: u32, now: DateTime<Utc>, config: &EngineConfig) -> Result<ProcessStats, EngineError> {
        let lease_timeout = chrono::Duration::from_std(config.triggering_lease_timeout).unwrap_or_default();
        let claimed = self
            .store
            .claim_due_jobs(workspace_id, limit, now, lease_timeout, config.worker_min_job_created_at)
            .await?;

        let mut stats = ProcessStats { claimed: claimed.len() as u32, ..Default::default() };

        for job in claimed {
            match self.process_one(job, now, config).await {
                Ok(outcome) => match outcome {
                    JobOutcome::Delivered => stats.delivered += 1,
                    JobOutcome::Deferred => stats.deferred += 1,
                    JobOutcome::FallbackResumed => stats.fallback_resumed += 1,
                    JobOutcome::FallbackSpawned => stats.fallback_spawned += 1,
                    JobOutcome::DeadLettered => stats.dead_lettered += 1,
                },
                Err(err) => {
                    tracing::error!(error = %err, code = err.code(), "trigger job processing failed unexpectedly");
                }
            }
        }

        Ok(stats)
    }

    async fn process_one(&self, mut job: TriggerJob, now: DateTime<Utc>, config: &EngineConfig) -> Result<JobOutcome, EngineError> {
        let attempt_no = job.attempts;

        let session = self.store.get_session(&job.target_agent_id, &job.workspace_id).await?;
        let deliver_result = match &session {
            None => Err(DeliverError::Pty(PtyError::TargetNotFound(job.target_agent_id.to_string()))),
            Some(s) => {
                deliver(
                    &self.pty,
                    DeliverRequest {
                        runtime: &s.runtime,
                        trigger_id: &job.trigger_id,
                        thread_id: &job.thread_id,
                        reason: &job.reason,
                        prompt: &job.prompt,
                        max_payload_bytes: DEFAULT_MAX_PAYLOAD_BYTES,
                    },
                )
                .await
            }
        };

        match deliver_result {
            Ok(_) => {
                if self.poll_for_ack(&job, now, config).await? {
                    self.record_attempt(&job, attempt_no, AttemptResult::Delivered, None, None, now).await?;
                    job.transition(TriggerStatus::Delivered, now);
                    self.store.update_job(job.clone()).await?;
                    job.transition(TriggerStatus::CallbackPending, now);
                    job.next_retry_at = Some(now);
                    self.store.update_job(job).await?;
                    return Ok(JobOutcome::Delivered);
                }
                self.handle_non_delivery(job, attempt_no, AttemptResult::AckTimeout, None, now, config).await
            }
            Err(DeliverError::Pty(PtyError::PaneDead { pid, command })) => {
                self.handle_non_delivery(
                    job,
                    attempt_no,
                    AttemptResult::PaneDead,
                    Some(format!("pid={pid:?},command={command:?}")),
                    now,
                    config,
                )
                .await
            }
            Err(DeliverError::Pty(PtyError::SendKeysError(msg))) => {
                self.handle_non_delivery(job, attempt_no, AttemptResult::SendKeysError, Some(msg), now, config).await
            }
            Err(DeliverError::Pty(PtyError::TargetNotFound(target))) => {
                self.handle_non_delivery(job, attempt_no, AttemptResult::TargetNotFound, Some(target), now, config).await
            }
            Err(DeliverError::Pty(PtyError::UnsupportedRuntime(runtime))) => {
                self.handle_non_delivery(job, attempt_no, AttemptResult::UnsupportedRuntime, Some(runtime), now, config).await
            }
            Err(DeliverError::Payload(err)) => {
                self.record_attempt(&job, attempt_no, AttemptResult::Rejected, Some(err.code().to_string()), Some(err.to_string()), now).await?;
                job.transition(TriggerStatus::Failed, now);
                self.store.update_job(job).await?;
                Ok(JobOutcome::DeadLettered)
            }
        }
    }

    /// Polls `has_ack_since` at `ack_poll_interval()` cadence until
    /// `TRIGGER_ACK_TIMEOUT_MS` elapses.
    async fn poll_for_ack(&self, job: &TriggerJob, attempt_started_at: DateTime<Utc>, config: &EngineConfig) -> Result<bool, EngineError> {
        let deadline = tokio::time::Instant::now() + config.trigger_ack_timeout;
        let poll_interval = ack_poll_interval();
        loop {
            if self.store.has_ack_since(&job.thread_id, &job.target_agent_id, attempt_started_at).await? {
                return Ok(true);
            }
            if tokio::time::Instant::now() >= deadline {
                return Ok(false);
            }
            tokio::time::sleep(poll_interval.min(deadline.saturating_duration_since(tokio::time::Instant::now()))).await;
        }
    }

    async fn handle_non_delivery(
        &self,
        mut job: TriggerJob,
        attempt_no: u32,
        result: AttemptResult,
        details: Option<String>,
        now: DateTime<Utc>,
        config: &EngineConfig,
    ) -> Result<JobOutcome, EngineError> {
        let retryable = result.is_retryable() && job.attempts < job.max_retries;
        if retryable {
            self.record_attempt(&job, attempt_no, result, None, details, now).await?;
            let delay = retry_delay_with_hint(&mut rand::thread_rng(), job.attempts, config.trigger_recheck, config.trigger_max_defer, None);
            job.next_retry_at = Some(now + chrono::Duration::from_std(delay).unwrap_or_default());
            job.transition(TriggerStatus::Deferred, now);
            self.store.update_job(job).await?;
            return Ok(JobOutcome::Deferred);
        }

        self.record_attempt(&job, attempt_no, result, None, details, now).await?;

        let decision = self
            .fallback
            .execute(FallbackRequest {
                agent_id: &job.target_agent_id,
                workspace_id: &job.workspace_id,
                prompt: &job.prompt,
                initial_error_code: Some(result_code(result)),
                now,
            })
            .await?;

        self.record_attempt(
            &job,
            job.attempts,
            decision.attempt_result,
            decision.error_code.clone(),
            decision.details.clone(),
            now,
        )
        .await?;

        match decision.next_status {
            FallbackNextStatus::FallbackResume => {
                job.transition(TriggerStatus::FallbackResume, now);
                self.store.update_job(job.clone()).await?;
                self.store
                    .insert_fallback_run(TriggerFallbackRun {
                        run_id: self.ids.run_id(),
                        trigger_id: job.trigger_id.clone(),
                        launch_mode: LaunchMode::Resume,
                        pid: decision.pid,
                        started_at: now,
                        finished_at: None,
                        outcome: None,
                    })
                    .await?;
                Ok(JobOutcome::FallbackResumed)
            }
            FallbackNextStatus::FallbackSpawn => {
                job.transition(TriggerStatus::FallbackSpawn, now);
                self.store.update_job(job.clone()).await?;
                self.store
                    .insert_fallback_run(TriggerFallbackRun {
                        run_id: self.ids.run_id(),
                        trigger_id: job.trigger_id.clone(),
                        launch_mode: LaunchMode::Spawn,
                        pid: decision.pid,
                        started_at: now,
                        finished_at: None,
                        outcome: None,
                    })
                    .await?;
                Ok(JobOutcome::FallbackSpawned)
            }
            FallbackNextStatus::Failed => {
                job.transition(TriggerStatus::Failed, now);
                self.store.update_job(job).await?;
                Ok(JobOutcome::DeadLettered)
            }
            FallbackNextStatus::Deferred => {
                let delay = retry_delay_with_hint(&mut rand::thread_rng(), job.attempts, config.trigger_recheck, config.trigger_max_defer, None);
                job.next_retry_at = Some(now + chrono::Duration::from_std(delay).unwrap_or_default());
                job.transition(TriggerStatus::Deferred, now);
                self.store.update_job(job).await?;
                Ok(JobOutcome::Deferred)
            }
        }
    }

    async fn record_attempt(
        &self,
        job: &TriggerJob,
        attempt_no: u32,
        result: AttemptResult,
        error_code: Option<String>,
        details: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<(), EngineError> {
        self.store
            .append_attempt(TriggerAttempt {
                attempt_id: self.ids.attempt_id(),
                trigger_id: job.trigger_id.clone(),
                attempt_no,
                result,
                error_code,
                details,
                created_at: now,
            })
            .await?;
        Ok(())
    }

    /// `reconcileFallbackRuns`: finds fallback runs older than
    /// `WORKER_FALLBACK_EXEC_TIMEOUT_MS` with no recorded outcome. A run with
    /// a known pid is sent a graceful termination signal, given
    /// `WORKER_FALLBACK_KILL_GRACE_MS` to exit, then SIGKILLed if it's still
    /// alive and marked `killed`; a run with no pid can't be acted on and is
    /// marked `timed_out`. Either way the owning job is queued for callback
    /// (SPEC_FULL.md §4.6).
    pub async fn reconcile_fallback_runs(&self, workspace_id: &WorkspaceId, limit: u32, now: DateTime<Utc>, config: &EngineConfig) -> Result<FallbackReconcileStats, EngineError> {
        let exec_timeout = chrono::Duration::from_std(config.fallback_exec_timeout).unwrap_or_default();
        let open_runs = self.store.list_open_fallback_runs(workspace_id, limit).await?;
        let mut stats = FallbackReconcileStats { scanned: open_runs.len() as u32, ..Default::default() };

        for mut run in open_runs {
            if !run.is_orphaned(now, exec_timeout) {
                continue;
            }

            let outcome = match run.pid {
                Some(pid) => {
                    self.launcher.terminate(pid).await;
                    tokio::time::sleep(config.fallback_kill_grace).await;
                    if self.launcher.is_alive(pid).await {
                        self.launcher.force_kill(pid).await;
                    }
                    stats.killed += 1;
                    FallbackOutcome::Killed
                }
                None => {
                    stats.timed_out += 1;
                    FallbackOutcome::TimedOut
                }
            };

            run.finished_at = Some(now);
            run.outcome = Some(outcome);
            self.store.update_fallback_run(run.clone()).await?;

            if let Some(job) = self.store.get_job(&run.trigger_id).await? {
                self.queue_callback_after_fallback(job, now).await?;
            }
        }

        Ok(stats)
    }

    async fn queue_callback_after_fallback(&self, mut job: TriggerJob, now: DateTime<Utc>) -> Result<(), EngineError> {
        if matches!(job.status, TriggerStatus::FallbackResume | TriggerStatus::FallbackSpawn) {
            job.transition(TriggerStatus::CallbackPending, now);
            job.next_retry_at = Some(now);
            self.store.update_job(job).await?;
        }
        Ok(())
    }
}

enum JobOutcome {
    Delivered,
    Deferred,
    FallbackResumed,
    FallbackSpawned,
    DeadLettered,
}

fn result_code(result: AttemptResult) -> &'static str {
    match result {
        AttemptResult::Delivered => "DELIVERED",
        AttemptResult::AckTimeout => "ACK_TIMEOUT",
        AttemptResult::PaneDead => "PANE_DEAD",
        AttemptResult::SendKeysError => "SEND_KEYS_ERROR",
        AttemptResult::TargetNotFound => "TARGET_NOT_FOUND",
        AttemptResult::UnsupportedRuntime => "UNSUPPORTED_RUNTIME",
        AttemptResult::Rejected => "REJECTED",
        AttemptResult::FallbackResumeSucceeded => "FALLBACK_RESUME_SUCCEEDED",
        AttemptResult::FallbackSpawned => "FALLBACK_SPAWNED",
        AttemptResult::FallbackResumeFailed => "FALLBACK_RESUME_FAILED",
        AttemptResult::FallbackDeferred => "FALLBACK_DEFERRED",
    }
}

#[cfg(test)]
#[path = "worker_tests.rs"]
mod tests;
