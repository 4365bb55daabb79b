// SPDX-License-Identifier: MIT
// Copyright (c) 2026 the sv contributors

//! Supervisor Loop (C9): orchestrates C2, C5→C6, and C7→C8 under one shared
//! `tick_at` observation window and returns aggregate per-tick stats
//! (SPEC_FULL.md §4.9). `sv-daemon` drives [`SupervisorLoop::run_tick`] once
//! per `WORKER_POLL_INTERVAL_MS`.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use sv_adapters::{CallbackClient, ProcessLauncher, PtyAdapter};
use sv_core::id::{IdGen, WorkspaceId};
use sv_storage::{RegistryReconciliation, Store};

use crate::callback::{CallbackPoster, CallbackStats};
use crate::config::EngineConfig;
use crate::error::EngineError;
use crate::registry::RuntimeRegistry;
use crate::scheduler::{ScheduleInput, ScheduleStats, TriggerScheduler};
use crate::unread::{ReconcileInput, ReconcileStats, UnreadReconciler};
use crate::worker::{FallbackReconcileStats, ProcessStats, TriggerQueueWorker};

#[derive(Debug, Clone)]
pub struct TickInput {
    pub workspace_id: WorkspaceId,
    pub tick_at: DateTime<Utc>,
    pub include_closed_threads: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickStats {
    pub registry: RegistryReconciliation,
    pub unread: ReconcileStats,
    pub schedule: ScheduleStats,
    pub queue: ProcessStats,
    pub fallback_reconcile: FallbackReconcileStats,
    pub callback: CallbackStats,
}

/// One per `(workspace, process)`; holds the in-process advisory state
/// (backlog breaker, crash-loop window) that must survive across ticks.
pub struct SupervisorLoop<St, P, L, C> {
    store: St,
    registry: RuntimeRegistry<St>,
    unread: UnreadReconciler<St>,
    scheduler: TriggerScheduler<St>,
    worker: TriggerQueueWorker<St, P, L>,
    callback: CallbackPoster<C, St>,
}

impl<St, P, L, C> SupervisorLoop<St, P, L, C>
where
    St: Store + Clone,
    P: PtyAdapter,
    L: ProcessLauncher,
    C: CallbackClient,
{
    pub fn new(store: St, pty: P, launcher: L, callback_client: C, ids: Arc<dyn IdGen>, config: &EngineConfig) -> Self {
        let registry = RuntimeRegistry::new(store.clone());
        let unread = UnreadReconciler::new(store.clone());
        let scheduler = TriggerScheduler::new(store.clone(), ids.clone());
        let worker = TriggerQueueWorker::new(store.clone(), pty, launcher, ids.clone(), config);
        let callback = CallbackPoster::new(callback_client, store.clone(), ids);
        Self { store, registry, unread, scheduler, worker, callback }
    }

    pub async fn run_tick(&self, input: TickInput, config: &EngineConfig) -> Result<TickStats, EngineError> {
        let mut stats = TickStats::default();

        stats.registry = self.registry.reconcile(&input.workspace_id, config.stale_after_hours, input.tick_at).await?;

        if config.auto_unread_enabled {
            let outcome = self
                .unread
                .reconcile(ReconcileInput {
                    workspace_id: input.workspace_id.clone(),
                    stale_after_hours: config.stale_after_hours,
                    include_closed_threads: input.include_closed_threads,
                    polled_at: input.tick_at,
                })
                .await?;
            stats.unread = outcome.stats;

            let pending_jobs = self.store.count_pending_jobs(&input.workspace_id).await?;
            stats.schedule = self
                .scheduler
                .schedule(
                    ScheduleInput {
                        workspace_id: input.workspace_id.clone(),
                        candidates: outcome.candidates,
                        trigger_max_retries: config.trigger_max_retries,
                        pending_jobs,
                        scheduled_at: input.tick_at,
                    },
                    config,
                )
                .await?;
        }

        let limit = config.worker_max_parallel_jobs.max(1) as u32;
        stats.queue = self.worker.process_due_jobs(&input.workspace_id, limit, input.tick_at, config).await?;
        stats.fallback_reconcile = self.worker.reconcile_fallback_runs(&input.workspace_id, limit, input.tick_at, config).await?;
        stats.callback = self.callback.post_due_callbacks(&input.workspace_id, limit as usize, input.tick_at, config).await?;

        tracing::info!(
            workspace_id = %input.workspace_id,
            enqueued = stats.schedule.enqueued,
            claimed = stats.queue.claimed,
            delivered = stats.queue.delivered,
            callback_posted = stats.callback.posted,
            "supervisor tick complete"
        );

        Ok(stats)
    }
}

#[cfg(test)]
#[path = "supervisor_tests.rs"]
mod tests;
