// SPDX-License-Identifier: MIT
// Copyright (c) 2026 the sv contributors

//! `codex` process launcher: spawns a detached child and reports its pid
//! without waiting for it to exit (the Fallback Executor tracks the run and
//! reconciles it on a later tick — SPEC_FULL.md §4.3/§4.6).

use async_trait::async_trait;
use std::process::Stdio;
use tokio::process::Command;

use super::{LaunchResult, ProcessLauncher};

const BYPASS_FLAG: &str = "--dangerously-bypass-approvals-and-sandbox";

#[derive(Debug, Clone, Default)]
pub struct CodexLauncher {
    binary: Option<String>,
}

impl CodexLauncher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Override the `codex` binary path (tests, or a non-$PATH install).
    pub fn with_binary(binary: impl Into<String>) -> Self {
        Self { binary: Some(binary.into()) }
    }

    fn binary(&self) -> &str {
        self.binary.as_deref().unwrap_or("codex")
    }

    fn spawn_detached(&self, args: &[&str]) -> LaunchResult {
        let mut cmd = Command::new(self.binary());
        cmd.args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(false);

        match cmd.spawn() {
            Ok(child) => match child.id() {
                Some(pid) => LaunchResult::started(pid),
                None => LaunchResult::failed("process exited before its pid could be read"),
            },
            Err(e) => LaunchResult::failed(e.to_string()),
        }
    }

    async fn kill_signal(&self, signal: &str, pid: u32) -> bool {
        Command::new("kill")
            .args([signal, &pid.to_string()])
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await
            .map(|s| s.success())
            .unwrap_or(false)
    }
}

#[async_trait]
impl ProcessLauncher for CodexLauncher {
    async fn resume(&self, session_id: &str, prompt: &str, allow_dangerous_bypass: bool) -> LaunchResult {
        let mut args = Vec::with_capacity(5);
        if allow_dangerous_bypass {
            args.push(BYPASS_FLAG);
        }
        args.extend(["exec", "resume", session_id, prompt]);
        self.spawn_detached(&args)
    }

    async fn spawn(&self, prompt: &str, allow_dangerous_bypass: bool) -> LaunchResult {
        let mut args = Vec::with_capacity(3);
        if allow_dangerous_bypass {
            args.push(BYPASS_FLAG);
        }
        args.extend(["exec", prompt]);
        self.spawn_detached(&args)
    }

    async fn terminate(&self, pid: u32) {
        self.kill_signal("-15", pid).await;
    }

    async fn force_kill(&self, pid: u32) {
        self.kill_signal("-9", pid).await;
    }

    async fn is_alive(&self, pid: u32) -> bool {
        self.kill_signal("-0", pid).await
    }
}

#[cfg(test)]
#[path = "codex_tests.rs"]
mod tests;
