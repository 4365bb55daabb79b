// SPDX-License-Identifier: MIT
// Copyright (c) 2026 the sv contributors

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! `sv-daemon`: the `supervisord` binary's library half — configuration
//! loading and logging setup, kept separate from `main.rs` so the tick loop
//! itself stays a thin `#[tokio::main]` shell.

pub mod config;

pub use config::{AuthConfig, Config, ConfigError};
