// SPDX-License-Identifier: MIT
// Copyright (c) 2026 the sv contributors

use super::*;

#[tokio::test]
async fn spawn_reports_pid_on_success() {
    let launcher = CodexLauncher::with_binary("true");
    let result = launcher.spawn("hello", false).await;
    assert!(result.started);
    assert!(result.pid.is_some());
}

#[tokio::test]
async fn resume_reports_failure_for_missing_binary() {
    let launcher = CodexLauncher::with_binary("sv-codex-definitely-not-installed");
    let result = launcher.resume("sess_01", "hello", false).await;
    assert!(!result.started);
    assert!(result.error_message.is_some());
}
