// SPDX-License-Identifier: MIT
// Copyright (c) 2026 the sv contributors

use anyhow::Result;
use chrono::Utc;
use clap::Args;
use sv_core::domain::ThreadStatus;
use sv_core::id::ThreadId;
use sv_storage::{AuditStore, SnapshotStore};

use super::support::{load_thread, print_transition_result, record_audit};

/// Forces a thread closed from any status, bypassing the normal transition
/// graph — the operator escape hatch for threads stuck in `blocked` with no
/// legal path forward. Idempotent: closing an already-closed thread succeeds.
#[derive(Args, Debug)]
pub struct OverrideCloseThreadArgs {
    #[arg(long = "thread-id")]
    pub thread_id: String,
    #[arg(long)]
    pub reason: String,
    #[arg(long = "actor-agent-id", default_value = "human_operator")]
    pub actor_agent_id: String,
    #[arg(long)]
    pub json: bool,
}

pub async fn handle<S: SnapshotStore + AuditStore>(args: OverrideCloseThreadArgs, store: &S) -> Result<()> {
    let thread_id = ThreadId::from(args.thread_id.as_str());
    let mut thread = load_thread(store, &thread_id).await?;

    thread.status = ThreadStatus::Closed;
    thread.updated_at = Utc::now();
    store.update_thread(thread.clone()).await?;

    record_audit(store, &thread.workspace_id, &args.actor_agent_id, "thread_override_closed", &thread_id, &args.reason).await?;
    print_transition_result(args.json, &thread_id, "override-close-thread", thread.status)
}

#[cfg(test)]
#[path = "override_close_tests.rs"]
mod tests;
