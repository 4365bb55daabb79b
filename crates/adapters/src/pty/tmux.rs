// SPDX-License-Identifier: MIT
// Copyright (c) 2026 the sv contributors

//! tmux-backed implementation of [`super::PtyAdapter`].

use async_trait::async_trait;
use tokio::process::Command;

use super::{PaneProbe, PtyAdapter, PtyError};
use crate::env::tmux_command_timeout;
use crate::subprocess::run_with_timeout;

#[derive(Debug, Clone, Default)]
pub struct TmuxPtyAdapter;

impl TmuxPtyAdapter {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl PtyAdapter for TmuxPtyAdapter {
    async fn probe_pane(&self, target: &str) -> Result<PaneProbe, PtyError> {
        let mut cmd = Command::new("tmux");
        cmd.args(["display-message", "-t", target, "-p", "#{pane_dead}|#{pane_pid}|#{pane_current_command}"]);

        let output = run_with_timeout(cmd, tmux_command_timeout(), "tmux display-message")
            .await
            .map_err(|_| PtyError::TargetNotFound(target.to_string()))?;

        if !output.status.success() {
            return Err(PtyError::TargetNotFound(target.to_string()));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let mut fields = stdout.trim().splitn(3, '|');
        let dead = fields.next().unwrap_or("0").trim() == "1";
        let pid = fields.next().and_then(|p| p.trim().parse::<i64>().ok());
        let command = fields.next().map(|c| c.trim().to_string()).filter(|c| !c.is_empty());

        Ok(PaneProbe { dead, pid, command })
    }

    async fn send_literal_line(&self, target: &str, line: &str) -> Result<(), PtyError> {
        let mut cmd = Command::new("tmux");
        cmd.args(["send-keys", "-t", target, "-l", "--", line]);

        let output = run_with_timeout(cmd, tmux_command_timeout(), "tmux send-keys")
            .await
            .map_err(PtyError::SendKeysError)?;

        if !output.status.success() {
            return Err(PtyError::SendKeysError(String::from_utf8_lossy(&output.stderr).to_string()));
        }
        Ok(())
    }

    async fn send_enter(&self, target: &str) -> Result<(), PtyError> {
        let mut cmd = Command::new("tmux");
        cmd.args(["send-keys", "-t", target, "Enter"]);

        let output = run_with_timeout(cmd, tmux_command_timeout(), "tmux send-keys Enter")
            .await
            .map_err(PtyError::SendKeysError)?;

        if !output.status.success() {
            return Err(PtyError::SendKeysError(String::from_utf8_lossy(&output.stderr).to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "tmux_tests.rs"]
mod tests;
