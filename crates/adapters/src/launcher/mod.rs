// SPDX-License-Identifier: MIT
// Copyright (c) 2026 the sv contributors

//! Agent launcher: the process-spawning collaborator the Fallback Executor
//! (C4) uses to resume or spawn a `codex` agent process (SPEC_FULL.md §4.3).

mod codex;

pub use codex::CodexLauncher;

#[cfg(any(test, feature = "test-support"))]
mod fake;
#[cfg(any(test, feature = "test-support"))]
pub use fake::{FakeLauncher, LauncherCall};

use async_trait::async_trait;

/// Outcome of a single launch attempt. Mirrors the `{started, pid?,
/// errorMessage?}` contract in SPEC_FULL.md §6 — never an `Err`, since a
/// failed launch is a normal branch of the Fallback Executor's algorithm,
/// not an adapter-layer fault.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchResult {
    pub started: bool,
    pub pid: Option<u32>,
    pub error_message: Option<String>,
}

impl LaunchResult {
    pub fn started(pid: u32) -> Self {
        Self {
            started: true,
            pid: Some(pid),
            error_message: None,
        }
    }

    pub fn failed(error_message: impl Into<String>) -> Self {
        Self {
            started: false,
            pid: None,
            error_message: Some(error_message.into()),
        }
    }
}

/// Launches detached `codex` processes, attached (`resume`) or fresh (`spawn`),
/// and reconciles runs the worker has given up waiting on.
#[async_trait]
pub trait ProcessLauncher: Clone + Send + Sync + 'static {
    async fn resume(&self, session_id: &str, prompt: &str, allow_dangerous_bypass: bool) -> LaunchResult;

    async fn spawn(&self, prompt: &str, allow_dangerous_bypass: bool) -> LaunchResult;

    /// Sends a graceful termination signal (SIGTERM) to `pid`.
    async fn terminate(&self, pid: u32);

    /// Forcefully terminates `pid` (SIGKILL), used once the kill grace period elapses.
    async fn force_kill(&self, pid: u32);

    /// True if `pid` is still running.
    async fn is_alive(&self, pid: u32) -> bool;
}
