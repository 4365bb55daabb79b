// SPDX-License-Identifier: MIT
// Copyright (c) 2026 the sv contributors

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! Adapters for external I/O: terminal delivery, agent process launching and
//! callback posting.

pub mod callback;
mod env;
pub mod launcher;
pub mod pty;
pub mod subprocess;
pub mod traced;

pub use callback::{CallbackClient, CallbackOutcome, CallbackRequest, ReqwestCallbackClient};
pub use env::ack_poll_interval;
pub use launcher::{CodexLauncher, LaunchResult, ProcessLauncher};
pub use pty::{deliver, resolve_runtime, DeliverError, DeliverOutcome, DeliverRequest, PaneProbe, PtyAdapter, PtyError, TmuxPtyAdapter};
pub use traced::{TracedCallback, TracedLauncher, TracedPty};

#[cfg(any(test, feature = "test-support"))]
pub use callback::{CallbackCall, FakeCallbackClient};
#[cfg(any(test, feature = "test-support"))]
pub use launcher::{FakeLauncher, LauncherCall};
#[cfg(any(test, feature = "test-support"))]
pub use pty::{FakePtyAdapter, PtyCall};
