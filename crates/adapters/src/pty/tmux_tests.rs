// SPDX-License-Identifier: MIT
// Copyright (c) 2026 the sv contributors

use super::*;

fn tmux_available() -> bool {
    std::process::Command::new("tmux").arg("-V").output().map(|o| o.status.success()).unwrap_or(false)
}

#[tokio::test]
async fn probe_pane_reports_target_not_found_for_missing_session() {
    if !tmux_available() {
        return;
    }
    let adapter = TmuxPtyAdapter::new();
    let err = adapter.probe_pane("sv-nonexistent-session:0.0").await.unwrap_err();
    assert!(matches!(err, PtyError::TargetNotFound(_)));
}
