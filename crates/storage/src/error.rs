// SPDX-License-Identifier: MIT
// Copyright (c) 2026 the sv contributors

use thiserror::Error;

use sv_core::DomainError;

/// Errors from store operations, spanning the Scope/Concurrency and Internal
/// rows of the error taxonomy in SPEC_FULL.md §7.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("domain invariant violated: {0}")]
    Domain(#[from] DomainError),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("session scope mismatch for ({agent_id}, {workspace_id})")]
    SessionScopeMismatch { agent_id: String, workspace_id: String },
    #[error("idempotency conflict: {0}")]
    IdempotencyConflict(String),
    #[error("conflict: {0}")]
    Conflict(String),
    #[cfg(feature = "postgres")]
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("internal storage error: {0}")]
    Internal(String),
}
