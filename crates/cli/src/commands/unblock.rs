// SPDX-License-Identifier: MIT
// Copyright (c) 2026 the sv contributors

use anyhow::Result;
use chrono::Utc;
use clap::Args;
use sv_core::domain::ThreadStatus;
use sv_core::id::ThreadId;
use sv_storage::{AuditStore, SnapshotStore};

use super::support::{load_thread, print_transition_result, record_audit};

/// Returns an escalated thread to `active` and clears its escalation owner.
/// Only legal from `blocked` — attempting it on any other status is an
/// invalid-transition error, same as escalation.
#[derive(Args, Debug)]
pub struct UnblockThreadArgs {
    #[arg(long = "thread-id")]
    pub thread_id: String,
    #[arg(long)]
    pub reason: String,
    #[arg(long = "actor-agent-id", default_value = "human_operator")]
    pub actor_agent_id: String,
    #[arg(long)]
    pub json: bool,
}

pub async fn handle<S: SnapshotStore + AuditStore>(args: UnblockThreadArgs, store: &S) -> Result<()> {
    let thread_id = ThreadId::from(args.thread_id.as_str());
    let mut thread = load_thread(store, &thread_id).await?;

    thread.transition(ThreadStatus::Active, Utc::now())?;
    thread.escalation_owner = None;
    store.update_thread(thread.clone()).await?;

    record_audit(store, &thread.workspace_id, &args.actor_agent_id, "thread_unblocked", &thread_id, &args.reason).await?;
    print_transition_result(args.json, &thread_id, "unblock-thread", thread.status)
}

#[cfg(test)]
#[path = "unblock_tests.rs"]
mod tests;
