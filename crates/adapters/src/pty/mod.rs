// SPDX-License-Identifier: MIT
// Copyright (c) 2026 the sv contributors

//! PTY Adapter (C3): delivers a sanitized trigger payload to a live terminal
//! runtime (tmux pane today; the trait leaves room for other multiplexers).

mod tmux;

pub use tmux::TmuxPtyAdapter;

#[cfg(any(test, feature = "test-support"))]
mod fake;
#[cfg(any(test, feature = "test-support"))]
pub use fake::{FakePtyAdapter, PtyCall};

use async_trait::async_trait;
use thiserror::Error;

use sv_core::domain::payload::prepare_trigger_payload;
use sv_core::error::DomainError;
use sv_core::id::{ThreadId, TriggerId};

/// Health snapshot of a terminal pane, from a `display-message` probe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaneProbe {
    pub dead: bool,
    pub pid: Option<i64>,
    pub command: Option<String>,
}

#[derive(Debug, Error)]
pub enum PtyError {
    #[error("runtime target not found: {0}")]
    TargetNotFound(String),
    #[error("pane is dead (pid={pid:?}, command={command:?})")]
    PaneDead { pid: Option<i64>, command: Option<String> },
    #[error("send-keys failed: {0}")]
    SendKeysError(String),
    #[error("unsupported runtime: {0}")]
    UnsupportedRuntime(String),
}

/// Adapter for delivering literal keystrokes to a live terminal pane.
/// `target` is the multiplexer-specific address already resolved by
/// [`resolve_runtime`] (e.g. a tmux `session:window.pane` string).
#[async_trait]
pub trait PtyAdapter: Clone + Send + Sync + 'static {
    async fn probe_pane(&self, target: &str) -> Result<PaneProbe, PtyError>;

    async fn send_literal_line(&self, target: &str, line: &str) -> Result<(), PtyError>;

    async fn send_enter(&self, target: &str) -> Result<(), PtyError>;
}

/// Resolves a `runtime` string (`tmux:<target>`, `tmux://<target>`, or a bare
/// `session:window.pane`) into the multiplexer-specific target address.
pub fn resolve_runtime(runtime: &str) -> Result<String, PtyError> {
    if let Some(target) = runtime.strip_prefix("tmux://") {
        return Ok(target.to_string());
    }
    if let Some(target) = runtime.strip_prefix("tmux:") {
        return Ok(target.to_string());
    }
    if runtime.contains(':') && runtime.contains('.') {
        return Ok(runtime.to_string());
    }
    Err(PtyError::UnsupportedRuntime(runtime.to_string()))
}

#[derive(Debug, Clone)]
pub struct DeliverRequest<'a> {
    pub runtime: &'a str,
    pub trigger_id: &'a TriggerId,
    pub thread_id: &'a ThreadId,
    pub reason: &'a str,
    pub prompt: &'a str,
    pub max_payload_bytes: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeliverOutcome {
    pub delivered: bool,
}

#[derive(Debug, Error)]
pub enum DeliverError {
    #[error(transparent)]
    Payload(#[from] DomainError),
    #[error(transparent)]
    Pty(#[from] PtyError),
}

/// Implements the delivery algorithm in SPEC_FULL.md §4.2: resolve the
/// runtime, sanitize and frame the prompt, probe pane health, then send the
/// framed envelope line by line followed by Enter.
pub async fn deliver<A: PtyAdapter>(adapter: &A, req: DeliverRequest<'_>) -> Result<DeliverOutcome, DeliverError> {
    let target = resolve_runtime(req.runtime)?;
    let payload = prepare_trigger_payload(req.trigger_id, req.thread_id, req.reason, req.prompt, req.max_payload_bytes)?;

    let probe = adapter.probe_pane(&target).await?;
    if probe.dead {
        return Err(DeliverError::Pty(PtyError::PaneDead {
            pid: probe.pid,
            command: probe.command,
        }));
    }

    for line in &payload.lines {
        adapter.send_literal_line(&target, line).await?;
    }
    adapter.send_enter(&target).await?;

    Ok(DeliverOutcome { delivered: true })
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
