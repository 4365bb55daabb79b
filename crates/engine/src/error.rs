// SPDX-License-Identifier: MIT
// Copyright (c) 2026 the sv contributors

use thiserror::Error;

use sv_core::error::DomainError;
use sv_storage::StoreError;

/// Umbrella error the supervisor loop matches on to decide retry vs.
/// terminal vs. log-and-continue (SPEC_FULL.md §7 "Rust realization").
#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl EngineError {
    /// Stable machine-readable code, matching the taxonomy in SPEC_FULL.md §7
    /// where one exists; `INTERNAL` otherwise.
    pub fn code(&self) -> &'static str {
        match self {
            EngineError::Store(_) => "INTERNAL",
            EngineError::Domain(e) => e.code(),
            EngineError::InvalidConfig(_) => "INVALID_ARGUMENT",
        }
    }
}
