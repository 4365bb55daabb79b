// SPDX-License-Identifier: MIT
// Copyright (c) 2026 the sv contributors

//! Daemon configuration: reads the environment keys in SPEC_FULL.md §6 into
//! a typed [`Config`], with defaults matching the spec and fail-fast
//! validation. Invalid or missing required values abort startup with a
//! formatted per-field diagnostic rather than a panic.

use std::time::Duration;

use chrono::{DateTime, Utc};
use sv_core::id::WorkspaceId;
use sv_engine::EngineConfig;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    MissingRequired(&'static str),
    #[error("invalid value for {field}: {value:?}")]
    InvalidValue { field: &'static str, value: String },
    #[error("no auth source configured: set AUTH_JWKS_URL or AUTH_JWKS_JSON")]
    MissingAuthSource,
    #[error("ENABLE_AUTOMATED_REDACTION must be false (got {0:?}); automated redaction is not a supported feature")]
    AutomatedRedactionEnabled(String),
}

/// Auth verification parameters, carried opaque: the daemon never verifies
/// tokens itself — JWKS validation is a bridge-side concern out of scope
/// here (SPEC_FULL.md §6).
#[derive(Debug, Clone)]
pub struct AuthConfig {
    pub jwks_url: Option<String>,
    pub jwks_json: Option<String>,
    pub issuer: Option<String>,
    pub audience: String,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub workspace_id: WorkspaceId,
    pub database_url: String,
    pub auth: AuthConfig,
    pub engine: EngineConfig,
}

impl Config {
    /// Reads the process environment and validates it. Never panics; every
    /// failure mode is a [`ConfigError`] the caller formats and exits on.
    pub fn load() -> Result<Self, ConfigError> {
        let workspace_id = WorkspaceId::from(required("WORKSPACE_ID")?.as_str());
        let database_url = required("DATABASE_URL")?;

        let jwks_url = optional("AUTH_JWKS_URL");
        let jwks_json = optional("AUTH_JWKS_JSON");
        if jwks_url.is_none() && jwks_json.is_none() {
            return Err(ConfigError::MissingAuthSource);
        }
        let auth = AuthConfig {
            jwks_url,
            jwks_json,
            issuer: optional("AUTH_ISSUER"),
            audience: optional("AUTH_AUDIENCE").unwrap_or_else(|| "orkiva".to_string()),
        };

        if let Some(value) = optional("ENABLE_AUTOMATED_REDACTION") {
            if value != "false" {
                return Err(ConfigError::AutomatedRedactionEnabled(value));
            }
        }

        let mut engine = EngineConfig::default();
        engine.stale_after_hours = parse_i64("SESSION_STALE_AFTER_HOURS", engine.stale_after_hours)?;

        engine.trigger_ack_timeout = parse_duration_ms("TRIGGER_ACK_TIMEOUT_MS", engine.trigger_ack_timeout)?;
        engine.trigger_max_retries = parse_u32("TRIGGER_MAX_RETRIES", engine.trigger_max_retries)?;
        engine.trigger_resume_max_attempts = parse_u32("TRIGGER_RESUME_MAX_ATTEMPTS", engine.trigger_resume_max_attempts)?;
        engine.trigger_recheck = parse_duration_ms("TRIGGER_RECHECK_MS", engine.trigger_recheck)?;
        engine.trigger_max_defer = parse_duration_ms("TRIGGER_MAX_DEFER_MS", engine.trigger_max_defer)?;
        engine.trigger_rate_limit_per_minute = parse_u32("TRIGGER_RATE_LIMIT_PER_MINUTE", engine.trigger_rate_limit_per_minute)?;
        engine.triggering_lease_timeout = parse_duration_ms("TRIGGERING_LEASE_TIMEOUT_MS", engine.triggering_lease_timeout)?;

        engine.auto_unread_enabled = parse_bool("AUTO_UNREAD_ENABLED", engine.auto_unread_enabled)?;
        engine.auto_unread_max_triggers_per_window = parse_u32("AUTO_UNREAD_MAX_TRIGGERS_PER_WINDOW", engine.auto_unread_max_triggers_per_window)?;
        engine.auto_unread_window = parse_duration_ms("AUTO_UNREAD_WINDOW_MS", engine.auto_unread_window)?;
        engine.auto_unread_min_interval = parse_duration_ms("AUTO_UNREAD_MIN_INTERVAL_MS", engine.auto_unread_min_interval)?;
        engine.auto_unread_breaker_backlog_threshold = parse_u64("AUTO_UNREAD_BREAKER_BACKLOG_THRESHOLD", engine.auto_unread_breaker_backlog_threshold)?;
        engine.auto_unread_breaker_cooldown = parse_duration_ms("AUTO_UNREAD_BREAKER_COOLDOWN_MS", engine.auto_unread_breaker_cooldown)?;

        engine.worker_poll_interval = parse_duration_ms("WORKER_POLL_INTERVAL_MS", engine.worker_poll_interval)?;
        engine.worker_max_parallel_jobs = parse_usize("WORKER_MAX_PARALLEL_JOBS", engine.worker_max_parallel_jobs)?;
        engine.worker_min_job_created_at = parse_timestamp("WORKER_MIN_JOB_CREATED_AT")?;

        engine.bridge_base_url = optional("WORKER_BRIDGE_API_BASE_URL").unwrap_or(engine.bridge_base_url);
        engine.bridge_access_token = optional("WORKER_BRIDGE_ACCESS_TOKEN").unwrap_or_default();
        engine.callback_max_retries = parse_u32("WORKER_CALLBACK_MAX_RETRIES", engine.callback_max_retries)?;
        engine.callback_request_timeout = parse_duration_ms("WORKER_CALLBACK_REQUEST_TIMEOUT_MS", engine.callback_request_timeout)?;

        engine.fallback_allow_dangerous_bypass = parse_bool("WORKER_FALLBACK_ALLOW_DANGEROUS_BYPASS", engine.fallback_allow_dangerous_bypass)?;
        engine.fallback_exec_timeout = parse_duration_ms("WORKER_FALLBACK_EXEC_TIMEOUT_MS", engine.fallback_exec_timeout)?;
        engine.fallback_kill_grace = parse_duration_ms("WORKER_FALLBACK_KILL_GRACE_MS", engine.fallback_kill_grace)?;
        engine.fallback_max_active_global = parse_u32("WORKER_FALLBACK_MAX_ACTIVE_GLOBAL", engine.fallback_max_active_global)?;
        engine.fallback_max_active_per_agent = parse_u32("WORKER_FALLBACK_MAX_ACTIVE_PER_AGENT", engine.fallback_max_active_per_agent)?;

        Ok(Self { workspace_id, database_url, auth, engine })
    }
}

fn required(key: &'static str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingRequired(key))
}

fn optional(key: &'static str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.is_empty())
}

fn parse_bool(key: &'static str, default: bool) -> Result<bool, ConfigError> {
    match optional(key) {
        None => Ok(default),
        Some(v) => match v.as_str() {
            "true" => Ok(true),
            "false" => Ok(false),
            other => Err(ConfigError::InvalidValue { field: key, value: other.to_string() }),
        },
    }
}

fn parse_u32(key: &'static str, default: u32) -> Result<u32, ConfigError> {
    match optional(key) {
        None => Ok(default),
        Some(v) => v.parse().map_err(|_| ConfigError::InvalidValue { field: key, value: v }),
    }
}

fn parse_u64(key: &'static str, default: u64) -> Result<u64, ConfigError> {
    match optional(key) {
        None => Ok(default),
        Some(v) => v.parse().map_err(|_| ConfigError::InvalidValue { field: key, value: v }),
    }
}

fn parse_usize(key: &'static str, default: usize) -> Result<usize, ConfigError> {
    match optional(key) {
        None => Ok(default),
        Some(v) => v.parse().map_err(|_| ConfigError::InvalidValue { field: key, value: v }),
    }
}

fn parse_i64(key: &'static str, default: i64) -> Result<i64, ConfigError> {
    match optional(key) {
        None => Ok(default),
        Some(v) => v.parse().map_err(|_| ConfigError::InvalidValue { field: key, value: v }),
    }
}

fn parse_duration_ms(key: &'static str, default: Duration) -> Result<Duration, ConfigError> {
    match optional(key) {
        None => Ok(default),
        Some(v) => v
            .parse::<u64>()
            .map(Duration::from_millis)
            .map_err(|_| ConfigError::InvalidValue { field: key, value: v }),
    }
}

fn parse_timestamp(key: &'static str) -> Result<Option<DateTime<Utc>>, ConfigError> {
    match optional(key) {
        None => Ok(None),
        Some(v) => DateTime::parse_from_rfc3339(&v)
            .map(|dt| Some(dt.with_timezone(&Utc)))
            .map_err(|_| ConfigError::InvalidValue { field: key, value: v }),
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
