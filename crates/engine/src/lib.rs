// SPDX-License-Identifier: MIT
// Copyright (c) 2026 the sv contributors

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! Domain orchestration for the thread-bridge supervisor: the pure-ish
//! coordination layer between `sv-storage`'s persistence traits and
//! `sv-adapters`'s I/O collaborators (terminal delivery, process launching,
//! callback posting). `sv-daemon` drives [`supervisor::SupervisorLoop`] once
//! per tick; `sv-cli` talks to the stores directly.

pub mod backoff;
pub mod callback;
pub mod config;
pub mod error;
pub mod fallback;
pub mod registry;
pub mod scheduler;
pub mod supervisor;
pub mod unread;
pub mod worker;

pub use callback::{CallbackPoster, CallbackStats};
pub use config::EngineConfig;
pub use error::EngineError;
pub use fallback::{FallbackDecision, FallbackExecutor, FallbackNextStatus, FallbackRequest, ResumeSkippedReason};
pub use registry::RuntimeRegistry;
pub use scheduler::{ScheduleInput, ScheduleStats, TriggerScheduler};
pub use supervisor::{SupervisorLoop, TickInput, TickStats};
pub use unread::{Candidate, ReconcileInput, ReconcileOutcome, ReconcileStats, UnreadReconciler};
pub use worker::{FallbackReconcileStats, ProcessStats, TriggerQueueWorker};
