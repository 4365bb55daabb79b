// SPDX-License-Identifier: MIT
// Copyright (c) 2026 the sv contributors

//! Shared plumbing for the three thread-mutating commands: load-then-check,
//! append one audit row, print the outcome in the requested format.

use anyhow::{Context, Result};
use chrono::Utc;
use serde_json::json;
use sv_core::domain::{AuditEvent, Thread, ThreadStatus};
use sv_core::id::{AgentId, IdGen, ThreadId, UuidIdGen, WorkspaceId};
use sv_storage::{AuditStore, SnapshotStore};

pub async fn load_thread<S: SnapshotStore>(store: &S, thread_id: &ThreadId) -> Result<Thread> {
    store
        .get_thread(thread_id)
        .await?
        .with_context(|| format!("thread not found: {thread_id}"))
}

pub async fn record_audit<S: AuditStore>(
    store: &S,
    workspace_id: &WorkspaceId,
    actor_agent_id: &str,
    action: &str,
    thread_id: &ThreadId,
    reason: &str,
) -> Result<()> {
    let event = AuditEvent {
        audit_id: UuidIdGen.audit_id(),
        workspace_id: workspace_id.clone(),
        actor_agent_id: AgentId::from(actor_agent_id),
        action: action.to_string(),
        subject_thread_id: Some(thread_id.clone()),
        reason: reason.to_string(),
        metadata: None,
        created_at: Utc::now(),
    };
    store.append_audit_event(event).await?;
    Ok(())
}

pub fn print_transition_result(json_mode: bool, thread_id: &ThreadId, action: &str, status: ThreadStatus) -> Result<()> {
    if json_mode {
        println!(
            "{}",
            serde_json::to_string_pretty(&json!({
                "thread_id": thread_id.as_str(),
                "action": action,
                "status": status.to_string(),
            }))?
        );
    } else {
        println!("{action} {thread_id} -> status={status}");
    }
    Ok(())
}
