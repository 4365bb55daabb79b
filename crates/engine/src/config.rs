// SPDX-License-Identifier: MIT
// Copyright (c) 2026 the sv contributors

use std::time::Duration;

/// Tunables for the supervisor tick (C2, C4–C9), matching the `TRIGGER_*`,
/// `AUTO_UNREAD_*` and `WORKER_*` keys in SPEC_FULL.md §6. `sv-daemon::config`
/// parses the environment and builds one of these; tests construct it
/// directly via [`EngineConfig::default`] plus field overrides.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub stale_after_hours: i64,

    pub trigger_ack_timeout: Duration,
    pub trigger_max_retries: u32,
    pub trigger_resume_max_attempts: u32,
    pub trigger_recheck: Duration,
    pub trigger_max_defer: Duration,
    pub trigger_rate_limit_per_minute: u32,
    pub triggering_lease_timeout: Duration,

    pub auto_unread_enabled: bool,
    pub auto_unread_max_triggers_per_window: u32,
    pub auto_unread_window: Duration,
    pub auto_unread_min_interval: Duration,
    pub auto_unread_breaker_backlog_threshold: u64,
    pub auto_unread_breaker_cooldown: Duration,

    pub worker_poll_interval: Duration,
    pub worker_max_parallel_jobs: usize,
    pub worker_min_job_created_at: Option<chrono::DateTime<chrono::Utc>>,

    pub bridge_base_url: String,
    pub bridge_access_token: String,
    pub callback_max_retries: u32,
    pub callback_request_timeout: Duration,

    pub fallback_allow_dangerous_bypass: bool,
    pub fallback_exec_timeout: Duration,
    pub fallback_kill_grace: Duration,
    pub fallback_max_active_global: u32,
    pub fallback_max_active_per_agent: u32,
    pub crash_loop_threshold: u32,
    pub crash_loop_window: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            stale_after_hours: 12,

            trigger_ack_timeout: Duration::from_millis(8000),
            trigger_max_retries: 2,
            trigger_resume_max_attempts: 2,
            trigger_recheck: Duration::from_millis(5000),
            trigger_max_defer: Duration::from_millis(60_000),
            trigger_rate_limit_per_minute: 10,
            triggering_lease_timeout: Duration::from_millis(45_000),

            auto_unread_enabled: true,
            auto_unread_max_triggers_per_window: 3,
            auto_unread_window: Duration::from_millis(300_000),
            auto_unread_min_interval: Duration::from_millis(30_000),
            auto_unread_breaker_backlog_threshold: 50,
            auto_unread_breaker_cooldown: Duration::from_millis(60_000),

            worker_poll_interval: Duration::from_millis(5000),
            worker_max_parallel_jobs: 10,
            worker_min_job_created_at: None,

            bridge_base_url: "http://127.0.0.1:3000".to_string(),
            bridge_access_token: String::new(),
            callback_max_retries: 3,
            callback_request_timeout: Duration::from_millis(8000),

            fallback_allow_dangerous_bypass: false,
            fallback_exec_timeout: Duration::from_millis(900_000),
            fallback_kill_grace: Duration::from_millis(5000),
            fallback_max_active_global: 8,
            fallback_max_active_per_agent: 2,
            crash_loop_threshold: 3,
            crash_loop_window: Duration::from_millis(15 * 60_000),
        }
    }
}
