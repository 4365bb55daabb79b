// SPDX-License-Identifier: MIT
// Copyright (c) 2026 the sv contributors

use std::sync::Mutex;

use super::*;

/// Serialise tests that mutate the process environment to avoid races.
static ENV_LOCK: Mutex<()> = Mutex::new(());

const ALL_KEYS: &[&str] = &[
    "WORKSPACE_ID",
    "DATABASE_URL",
    "AUTH_JWKS_URL",
    "AUTH_JWKS_JSON",
    "AUTH_ISSUER",
    "AUTH_AUDIENCE",
    "ENABLE_AUTOMATED_REDACTION",
    "SESSION_STALE_AFTER_HOURS",
    "TRIGGER_ACK_TIMEOUT_MS",
    "AUTO_UNREAD_ENABLED",
    "WORKER_MAX_PARALLEL_JOBS",
    "WORKER_BRIDGE_ACCESS_TOKEN",
    "WORKER_MIN_JOB_CREATED_AT",
    "WORKER_FALLBACK_ALLOW_DANGEROUS_BYPASS",
];

fn clear_env() {
    for key in ALL_KEYS {
        std::env::remove_var(key);
    }
}

fn set_minimal_required() {
    std::env::set_var("WORKSPACE_ID", "wsp_1");
    std::env::set_var("DATABASE_URL", "postgres://localhost/sv");
    std::env::set_var("AUTH_JWKS_URL", "https://auth.example.com/.well-known/jwks.json");
}

#[test]
fn load_with_only_required_vars_uses_defaults() {
    let _lock = ENV_LOCK.lock().unwrap();
    clear_env();
    set_minimal_required();

    let config = Config::load().unwrap();

    assert_eq!(config.workspace_id.as_str(), "wsp_1");
    assert_eq!(config.database_url, "postgres://localhost/sv");
    assert_eq!(config.auth.audience, "orkiva");
    assert_eq!(config.engine.stale_after_hours, 12);
    assert!(config.engine.auto_unread_enabled);
    clear_env();
}

#[test]
fn load_missing_workspace_id_is_an_error() {
    let _lock = ENV_LOCK.lock().unwrap();
    clear_env();
    std::env::set_var("DATABASE_URL", "postgres://localhost/sv");
    std::env::set_var("AUTH_JWKS_URL", "https://auth.example.com/.well-known/jwks.json");

    let err = Config::load().unwrap_err();
    assert!(matches!(err, ConfigError::MissingRequired("WORKSPACE_ID")));
    clear_env();
}

#[test]
fn load_with_neither_auth_source_is_an_error() {
    let _lock = ENV_LOCK.lock().unwrap();
    clear_env();
    std::env::set_var("WORKSPACE_ID", "wsp_1");
    std::env::set_var("DATABASE_URL", "postgres://localhost/sv");

    let err = Config::load().unwrap_err();
    assert!(matches!(err, ConfigError::MissingAuthSource));
    clear_env();
}

#[test]
fn load_rejects_enabled_automated_redaction() {
    let _lock = ENV_LOCK.lock().unwrap();
    clear_env();
    set_minimal_required();
    std::env::set_var("ENABLE_AUTOMATED_REDACTION", "true");

    let err = Config::load().unwrap_err();
    assert!(matches!(err, ConfigError::AutomatedRedactionEnabled(_)));
    clear_env();
}

#[test]
fn load_applies_env_overrides() {
    let _lock = ENV_LOCK.lock().unwrap();
    clear_env();
    set_minimal_required();
    std::env::set_var("SESSION_STALE_AFTER_HOURS", "6");
    std::env::set_var("TRIGGER_ACK_TIMEOUT_MS", "1500");
    std::env::set_var("AUTO_UNREAD_ENABLED", "false");
    std::env::set_var("WORKER_MAX_PARALLEL_JOBS", "25");

    let config = Config::load().unwrap();

    assert_eq!(config.engine.stale_after_hours, 6);
    assert_eq!(config.engine.trigger_ack_timeout, std::time::Duration::from_millis(1500));
    assert!(!config.engine.auto_unread_enabled);
    assert_eq!(config.engine.worker_max_parallel_jobs, 25);
    clear_env();
}

#[test]
fn load_rejects_invalid_numeric_override() {
    let _lock = ENV_LOCK.lock().unwrap();
    clear_env();
    set_minimal_required();
    std::env::set_var("TRIGGER_MAX_RETRIES", "not-a-number");

    let err = Config::load().unwrap_err();
    assert!(matches!(err, ConfigError::InvalidValue { field: "TRIGGER_MAX_RETRIES", .. }));
    std::env::remove_var("TRIGGER_MAX_RETRIES");
    clear_env();
}

#[test]
fn load_parses_worker_min_job_created_at() {
    let _lock = ENV_LOCK.lock().unwrap();
    clear_env();
    set_minimal_required();
    std::env::set_var("WORKER_MIN_JOB_CREATED_AT", "2026-01-01T00:00:00Z");

    let config = Config::load().unwrap();
    assert!(config.engine.worker_min_job_created_at.is_some());
    clear_env();
}
