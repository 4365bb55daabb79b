// SPDX-License-Identifier: MIT
// Copyright (c) 2026 the sv contributors

//! Fallback Executor (C4): resumes or spawns a `codex` agent process when
//! PTY delivery cannot be acknowledged (SPEC_FULL.md §4.3).

use std::collections::HashMap;
use std::time::Duration;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;

use sv_adapters::ProcessLauncher;
use sv_core::domain::{AttemptResult, LaunchMode};
use sv_core::id::{AgentId, WorkspaceId};
use sv_storage::{RegistryStore, TriggerStore};

use crate::error::EngineError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResumeSkippedReason {
    NoSession,
    SessionStale,
    NotResumable,
}

impl ResumeSkippedReason {
    pub fn as_str(self) -> &'static str {
        match self {
            ResumeSkippedReason::NoSession => "NO_SESSION",
            ResumeSkippedReason::SessionStale => "SESSION_STALE",
            ResumeSkippedReason::NotResumable => "NOT_RESUMABLE",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FallbackNextStatus {
    FallbackResume,
    FallbackSpawn,
    Failed,
    Deferred,
}

#[derive(Debug, Clone)]
pub struct FallbackDecision {
    pub attempt_result: AttemptResult,
    pub next_status: FallbackNextStatus,
    pub launch_mode: Option<LaunchMode>,
    pub pid: Option<u32>,
    pub error_code: Option<String>,
    pub resume_skipped_reason: Option<ResumeSkippedReason>,
    pub details: Option<String>,
}

#[derive(Debug, Clone)]
pub struct FallbackRequest<'a> {
    pub agent_id: &'a AgentId,
    pub workspace_id: &'a WorkspaceId,
    pub prompt: &'a str,
    pub initial_error_code: Option<&'a str>,
    pub now: DateTime<Utc>,
}

struct CrashLoopWindow {
    starts: HashMap<(String, String), Vec<DateTime<Utc>>>,
}

impl CrashLoopWindow {
    fn record_and_check(&mut self, agent_id: &AgentId, workspace_id: &WorkspaceId, now: DateTime<Utc>, threshold: u32, window: Duration) -> bool {
        let key = (agent_id.as_str().to_string(), workspace_id.as_str().to_string());
        let window = chrono::Duration::from_std(window).unwrap_or_default();
        let entry = self.starts.entry(key).or_default();
        entry.retain(|t| now - *t <= window);
        entry.push(now);
        entry.len() as u32 >= threshold
    }
}

pub struct FallbackExecutor<L, St> {
    launcher: L,
    store: St,
    resume_max_attempts: u32,
    stale_after_hours: i64,
    crash_loop_threshold: u32,
    crash_loop_window: Duration,
    allow_dangerous_bypass: bool,
    fallback_max_active_global: u32,
    fallback_max_active_per_agent: u32,
    crash_loop: Mutex<CrashLoopWindow>,
}

impl<L: ProcessLauncher, St: RegistryStore + TriggerStore> FallbackExecutor<L, St> {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        launcher: L,
        store: St,
        resume_max_attempts: u32,
        stale_after_hours: i64,
        crash_loop_threshold: u32,
        crash_loop_window: Duration,
        allow_dangerous_bypass: bool,
        fallback_max_active_global: u32,
        fallback_max_active_per_agent: u32,
    ) -> Self {
        Self {
            launcher,
            store,
            resume_max_attempts,
            stale_after_hours,
            crash_loop_threshold,
            crash_loop_window,
            allow_dangerous_bypass,
            fallback_max_active_global,
            fallback_max_active_per_agent,
            crash_loop: Mutex::new(CrashLoopWindow { starts: HashMap::new() }),
        }
    }

    /// Counts fallback runs with no recorded outcome, globally in `workspace_id`
    /// and scoped to `agent_id`, so `execute` can defer instead of piling on
    /// more concurrent `codex` processes than the operator has budgeted for
    /// (SPEC_FULL.md §4.6).
    async fn count_active_runs(&self, workspace_id: &WorkspaceId, agent_id: &AgentId) -> Result<(u32, u32), EngineError> {
        let open_runs = self.store.list_open_fallback_runs(workspace_id, u32::MAX).await?;
        let mut global = 0u32;
        let mut per_agent = 0u32;
        for run in &open_runs {
            global += 1;
            if let Some(job) = self.store.get_job(&run.trigger_id).await? {
                if job.target_agent_id.as_str() == agent_id.as_str() {
                    per_agent += 1;
                }
            }
        }
        Ok((global, per_agent))
    }

    pub async fn execute(&self, req: FallbackRequest<'_>) -> Result<FallbackDecision, EngineError> {
        let (active_global, active_per_agent) = self.count_active_runs(req.workspace_id, req.agent_id).await?;
        if active_global >= self.fallback_max_active_global || active_per_agent >= self.fallback_max_active_per_agent {
            tracing::warn!(
                agent_id = %req.agent_id,
                active_global,
                active_per_agent,
                "fallback concurrency cap reached, deferring job"
            );
            return Ok(FallbackDecision {
                attempt_result: AttemptResult::FallbackDeferred,
                next_status: FallbackNextStatus::Deferred,
                launch_mode: None,
                pid: None,
                error_code: Some("FALLBACK_CONCURRENCY_CAP".to_string()),
                resume_skipped_reason: None,
                details: Some(format!("activeGlobal={active_global},activePerAgent={active_per_agent}")),
            });
        }

        let session = self.store.get_session(req.agent_id, req.workspace_id).await?;
        let resume_skipped_reason = match &session {
            None => Some(ResumeSkippedReason::NoSession),
            Some(s) if s.is_stale(req.now, self.stale_after_hours) => Some(ResumeSkippedReason::SessionStale),
            Some(s) if !s.resumable => Some(ResumeSkippedReason::NotResumable),
            Some(_) => None,
        };

        if let (true, Some(session)) = (resume_skipped_reason.is_none(), &session) {
            for attempt in 1..=self.resume_max_attempts {
                let result = self
                    .launcher
                    .resume(&session.session_id, req.prompt, self.allow_dangerous_bypass)
                    .await;
                if result.started {
                    tracing::info!(agent_id = %req.agent_id, session_id = %session.session_id, attempt, "fallback resume succeeded");
                    return Ok(FallbackDecision {
                        attempt_result: AttemptResult::FallbackResumeSucceeded,
                        next_status: FallbackNextStatus::FallbackResume,
                        launch_mode: Some(LaunchMode::Resume),
                        pid: result.pid,
                        error_code: None,
                        resume_skipped_reason: None,
                        details: Some(format!("resumeAttempt={attempt},resumeMaxAttempts={}", self.resume_max_attempts)),
                    });
                }
                tracing::warn!(agent_id = %req.agent_id, attempt, error = ?result.error_message, "fallback resume attempt failed");
            }
        }

        if self.crash_loop.lock().record_and_check(req.agent_id, req.workspace_id, req.now, self.crash_loop_threshold, self.crash_loop_window) {
            tracing::error!(agent_id = %req.agent_id, workspace_id = %req.workspace_id, "fallback crash-loop guard tripped");
            return Ok(FallbackDecision {
                attempt_result: AttemptResult::FallbackResumeFailed,
                next_status: FallbackNextStatus::Failed,
                launch_mode: None,
                pid: None,
                error_code: Some("FALLBACK_CRASH_LOOP".to_string()),
                resume_skipped_reason,
                details: None,
            });
        }

        let spawn_result = self.launcher.spawn(req.prompt, self.allow_dangerous_bypass).await;
        if spawn_result.started {
            tracing::info!(agent_id = %req.agent_id, pid = ?spawn_result.pid, "fallback spawn succeeded");
            return Ok(FallbackDecision {
                attempt_result: AttemptResult::FallbackSpawned,
                next_status: FallbackNextStatus::FallbackSpawn,
                launch_mode: Some(LaunchMode::Spawn),
                pid: spawn_result.pid,
                error_code: None,
                resume_skipped_reason,
                details: None,
            });
        }

        tracing::error!(agent_id = %req.agent_id, error = ?spawn_result.error_message, "fallback spawn failed");
        Ok(FallbackDecision {
            attempt_result: AttemptResult::FallbackResumeFailed,
            next_status: FallbackNextStatus::Failed,
            launch_mode: None,
            pid: None,
            error_code: Some("FALLBACK_SPAWN_FAILED".to_string()),
            resume_skipped_reason,
            details: spawn_result.error_message.map(|msg| format!("errorMessage={msg},initialErrorCode={:?}", req.initial_error_code)),
        })
    }
}

#[cfg(test)]
#[path = "fallback_tests.rs"]
mod tests;
