// SPDX-License-Identifier: MIT
// Copyright (c) 2026 the sv contributors

use anyhow::Result;
use chrono::Utc;
use clap::Args;
use sv_core::domain::ThreadStatus;
use sv_core::id::{AgentId, ThreadId};
use sv_storage::{AuditStore, SnapshotStore};

use super::support::{load_thread, print_transition_result, record_audit};

/// Forces a thread into `blocked` and records the operator as its escalation
/// owner. Honors the normal transition graph — `resolved`/`closed` threads
/// reject escalation the same way the tick's own transitions would.
#[derive(Args, Debug)]
pub struct EscalateThreadArgs {
    #[arg(long = "thread-id")]
    pub thread_id: String,
    #[arg(long)]
    pub reason: String,
    #[arg(long = "actor-agent-id", default_value = "human_operator")]
    pub actor_agent_id: String,
    #[arg(long)]
    pub json: bool,
}

pub async fn handle<S: SnapshotStore + AuditStore>(args: EscalateThreadArgs, store: &S) -> Result<()> {
    let thread_id = ThreadId::from(args.thread_id.as_str());
    let mut thread = load_thread(store, &thread_id).await?;

    thread.transition(ThreadStatus::Blocked, Utc::now())?;
    thread.escalation_owner = Some(AgentId::from(args.actor_agent_id.as_str()));
    store.update_thread(thread.clone()).await?;

    record_audit(store, &thread.workspace_id, &args.actor_agent_id, "thread_escalated", &thread_id, &args.reason).await?;
    print_transition_result(args.json, &thread_id, "escalate-thread", thread.status)
}

#[cfg(test)]
#[path = "escalate_tests.rs"]
mod tests;
