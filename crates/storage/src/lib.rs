// SPDX-License-Identifier: MIT
// Copyright (c) 2026 the sv contributors

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod error;
pub mod memory;
pub mod store;

#[cfg(feature = "postgres")]
pub mod postgres;

pub use error::StoreError;
pub use memory::InMemoryStore;
pub use store::{AuditStore, RegistryReconciliation, RegistryStore, ReconciliationStateStore, SnapshotStore, Store, TriggerStore};
