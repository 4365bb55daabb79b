// SPDX-License-Identifier: MIT
// Copyright (c) 2026 the sv contributors

use thiserror::Error;

/// Validation-class errors raised by pure domain functions in [`crate::domain`].
/// These are never retried by the engine; they indicate either a caller bug
/// or an invariant violation caught before it reaches a store.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error("sequence violation: thread {thread_id} expected seq {expected}, got {actual}")]
    SequenceViolation {
        thread_id: String,
        expected: i64,
        actual: i64,
    },
    #[error("sequence overflow for thread {thread_id}")]
    SequenceOverflow { thread_id: String },
    #[error("cursor regression: thread {thread_id} agent {agent_id} current {current} < existing {existing}")]
    CursorRegression {
        thread_id: String,
        agent_id: String,
        current: i64,
        existing: i64,
    },
    #[error("invalid thread transition: {from} -> {to}")]
    InvalidThreadTransition { from: String, to: String },
    #[error("trigger payload empty")]
    TriggerPayloadEmpty,
    #[error("trigger payload too large: {len} bytes exceeds {max} byte limit")]
    TriggerPayloadTooLarge { len: usize, max: usize },
}

impl DomainError {
    /// Stable machine-readable code matching the taxonomy in SPEC_FULL.md §7.
    pub fn code(&self) -> &'static str {
        match self {
            DomainError::InvalidArgument(_) => "INVALID_ARGUMENT",
            DomainError::SequenceViolation { .. } => "SEQUENCE_VIOLATION",
            DomainError::SequenceOverflow { .. } => "SEQUENCE_OVERFLOW",
            DomainError::CursorRegression { .. } => "CURSOR_REGRESSION",
            DomainError::InvalidThreadTransition { .. } => "INVALID_THREAD_TRANSITION",
            DomainError::TriggerPayloadEmpty => "TRIGGER_PAYLOAD_EMPTY",
            DomainError::TriggerPayloadTooLarge { .. } => "TRIGGER_PAYLOAD_TOO_LARGE",
        }
    }
}
