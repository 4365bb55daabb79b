// SPDX-License-Identifier: MIT
// Copyright (c) 2026 the sv contributors

//! Tracing-instrumented wrappers for the adapter traits, for consistent
//! observability across the PTY, launcher and callback collaborators.

use async_trait::async_trait;
use tracing::Instrument;

use crate::callback::{CallbackClient, CallbackOutcome, CallbackRequest};
use crate::launcher::{LaunchResult, ProcessLauncher};
use crate::pty::{PaneProbe, PtyAdapter, PtyError};

#[derive(Clone)]
pub struct TracedPty<P> {
    inner: P,
}

impl<P> TracedPty<P> {
    pub fn new(inner: P) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl<P: PtyAdapter> PtyAdapter for TracedPty<P> {
    async fn probe_pane(&self, target: &str) -> Result<PaneProbe, PtyError> {
        let result = self.inner.probe_pane(target).await;
        match &result {
            Ok(probe) => tracing::debug!(target, dead = probe.dead, "pane probed"),
            Err(e) => tracing::warn!(target, error = %e, "pane probe failed"),
        }
        result
    }

    async fn send_literal_line(&self, target: &str, line: &str) -> Result<(), PtyError> {
        async {
            let result = self.inner.send_literal_line(target, line).await;
            if let Err(ref e) = result {
                tracing::error!(error = %e, "send_literal_line failed");
            }
            result
        }
        .instrument(tracing::debug_span!("pty.send_line", target, len = line.len()))
        .await
    }

    async fn send_enter(&self, target: &str) -> Result<(), PtyError> {
        let result = self.inner.send_enter(target).await;
        if let Err(ref e) = result {
            tracing::error!(target, error = %e, "send_enter failed");
        }
        result
    }
}

#[derive(Clone)]
pub struct TracedLauncher<L> {
    inner: L,
}

impl<L> TracedLauncher<L> {
    pub fn new(inner: L) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl<L: ProcessLauncher> ProcessLauncher for TracedLauncher<L> {
    async fn resume(&self, session_id: &str, prompt: &str, allow_dangerous_bypass: bool) -> LaunchResult {
        let span = tracing::info_span!("launcher.resume", session_id, allow_dangerous_bypass);
        async {
            tracing::info!(prompt_len = prompt.len(), "resuming session");
            let start = std::time::Instant::now();
            let result = self.inner.resume(session_id, prompt, allow_dangerous_bypass).await;
            let elapsed_ms = start.elapsed().as_millis() as u64;
            match &result.error_message {
                None => tracing::info!(pid = ?result.pid, elapsed_ms, "resume started"),
                Some(e) => tracing::warn!(elapsed_ms, error = %e, "resume failed"),
            }
            result
        }
        .instrument(span)
        .await
    }

    async fn spawn(&self, prompt: &str, allow_dangerous_bypass: bool) -> LaunchResult {
        let span = tracing::info_span!("launcher.spawn", allow_dangerous_bypass);
        async {
            tracing::info!(prompt_len = prompt.len(), "spawning fresh agent");
            let start = std::time::Instant::now();
            let result = self.inner.spawn(prompt, allow_dangerous_bypass).await;
            let elapsed_ms = start.elapsed().as_millis() as u64;
            match &result.error_message {
                None => tracing::info!(pid = ?result.pid, elapsed_ms, "spawn started"),
                Some(e) => tracing::warn!(elapsed_ms, error = %e, "spawn failed"),
            }
            result
        }
        .instrument(span)
        .await
    }

    async fn terminate(&self, pid: u32) {
        tracing::info!(pid, "sending graceful termination signal");
        self.inner.terminate(pid).await;
    }

    async fn force_kill(&self, pid: u32) {
        tracing::warn!(pid, "force-killing fallback process");
        self.inner.force_kill(pid).await;
    }

    async fn is_alive(&self, pid: u32) -> bool {
        self.inner.is_alive(pid).await
    }
}

#[derive(Clone)]
pub struct TracedCallback<C> {
    inner: C,
}

impl<C> TracedCallback<C> {
    pub fn new(inner: C) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl<C: CallbackClient> CallbackClient for TracedCallback<C> {
    async fn post(&self, request: CallbackRequest) -> CallbackOutcome {
        let span = tracing::info_span!(
            "callback.post",
            trigger_id = %request.trigger_id,
            attempt = request.callback_attempt_no,
        );
        async {
            let result = self.inner.post(request).await;
            match &result {
                CallbackOutcome::Delivered => tracing::info!("callback delivered"),
                CallbackOutcome::Retry { error_code, retry_after_ms } => {
                    tracing::warn!(error_code, retry_after_ms, "callback retryable failure")
                }
                CallbackOutcome::Failed { error_code } => {
                    tracing::error!(error_code, "callback failed")
                }
            }
            result
        }
        .instrument(span)
        .await
    }
}
