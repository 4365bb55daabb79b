// SPDX-License-Identifier: MIT
// Copyright (c) 2026 the sv contributors

//! Centralized environment variable access for the adapters crate.

use std::time::Duration;

fn parse_duration_ms(var: &str) -> Option<Duration> {
    std::env::var(var).ok().and_then(|s| s.parse::<u64>().ok()).map(Duration::from_millis)
}

/// Polling interval the PTY adapter uses while waiting for an ack
/// (`TRIGGER_ACK_TIMEOUT_MS` governs the overall budget; this is the probe
/// cadence within it). Default: 500ms.
pub fn ack_poll_interval() -> Duration {
    parse_duration_ms("SV_ACK_POLL_MS").unwrap_or(Duration::from_millis(500))
}

/// Timeout for individual `tmux` subprocess invocations. Default: 10s.
pub fn tmux_command_timeout() -> Duration {
    parse_duration_ms("SV_TMUX_TIMEOUT_MS").unwrap_or(Duration::from_secs(10))
}

/// Timeout for the HTTP callback POST. Overridden at the engine layer by
/// `WORKER_CALLBACK_REQUEST_TIMEOUT_MS`; this is the adapter-level default
/// used when no explicit timeout is passed in.
pub fn callback_request_timeout() -> Duration {
    parse_duration_ms("SV_CALLBACK_TIMEOUT_MS").unwrap_or(Duration::from_secs(10))
}
