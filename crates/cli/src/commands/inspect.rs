// SPDX-License-Identifier: MIT
// Copyright (c) 2026 the sv contributors

//! `inspect-thread`: a read-only snapshot of a thread's participants, recent
//! messages, and recent trigger jobs, for an operator debugging a stuck
//! conversation without reaching for `psql`.

use anyhow::{Context, Result};
use clap::Args;
use serde_json::json;
use sv_core::domain::{Message, MessageKind, Thread, TriggerJob, TriggerStatus};
use sv_core::id::ThreadId;
use sv_storage::{SnapshotStore, TriggerStore};

const ALL_TRIGGER_STATUSES: &[TriggerStatus] = &[
    TriggerStatus::Queued,
    TriggerStatus::Triggering,
    TriggerStatus::Deferred,
    TriggerStatus::Delivered,
    TriggerStatus::Timeout,
    TriggerStatus::Failed,
    TriggerStatus::FallbackResume,
    TriggerStatus::FallbackSpawn,
    TriggerStatus::CallbackPending,
    TriggerStatus::CallbackRetry,
    TriggerStatus::CallbackDelivered,
    TriggerStatus::CallbackFailed,
];

#[derive(Args, Debug)]
pub struct InspectThreadArgs {
    #[arg(long = "thread-id")]
    pub thread_id: String,
    #[arg(long = "limit-messages", default_value_t = 20)]
    pub limit_messages: usize,
    #[arg(long = "limit-triggers", default_value_t = 20)]
    pub limit_triggers: usize,
    #[arg(long)]
    pub json: bool,
}

pub async fn handle<S: SnapshotStore + TriggerStore>(args: InspectThreadArgs, store: &S) -> Result<()> {
    let thread_id = ThreadId::from(args.thread_id.as_str());
    let thread = store
        .get_thread(&thread_id)
        .await?
        .with_context(|| format!("thread not found: {thread_id}"))?;
    let participants = store.list_participants(&thread_id).await?;
    let messages = store.list_messages(&thread_id, args.limit_messages).await?;
    let triggers = store
        .list_jobs_by_status(&thread_id, ALL_TRIGGER_STATUSES, args.limit_triggers)
        .await?;

    if args.json {
        print_json(&thread, &participants, &messages, &triggers)
    } else {
        print_text(&thread, &participants, &messages, &triggers);
        Ok(())
    }
}

fn print_json(thread: &Thread, participants: &[sv_core::domain::ThreadParticipant], messages: &[Message], triggers: &[TriggerJob]) -> Result<()> {
    let value = json!({
        "thread": {
            "thread_id": thread.thread_id.as_str(),
            "workspace_id": thread.workspace_id.as_str(),
            "title": thread.title,
            "kind": thread.kind,
            "status": thread.status.to_string(),
            "escalation_owner": thread.escalation_owner.as_ref().map(|a| a.as_str()),
            "created_at": thread.created_at,
            "updated_at": thread.updated_at,
        },
        "participants": participants.iter().map(|p| p.agent_id.as_str()).collect::<Vec<_>>(),
        "messages": messages.iter().map(|m| json!({
            "message_id": m.message_id.as_str(),
            "seq": m.seq,
            "sender_agent_id": m.sender_agent_id.as_str(),
            "kind": m.kind,
            "body": m.body,
            "created_at": m.created_at,
        })).collect::<Vec<_>>(),
        "triggers": triggers.iter().map(|t| json!({
            "trigger_id": t.trigger_id.as_str(),
            "target_agent_id": t.target_agent_id.as_str(),
            "status": t.status.to_string(),
            "attempts": t.attempts,
            "created_at": t.created_at,
        })).collect::<Vec<_>>(),
    });
    println!("{}", serde_json::to_string_pretty(&value)?);
    Ok(())
}

fn print_text(thread: &Thread, participants: &[sv_core::domain::ThreadParticipant], messages: &[Message], triggers: &[TriggerJob]) {
    println!("thread {} [{}] status={}", thread.thread_id, thread.title, thread.status);
    if let Some(owner) = &thread.escalation_owner {
        println!("  escalation_owner: {owner}");
    }
    println!("  participants: {}", participants.iter().map(|p| p.agent_id.as_str()).collect::<Vec<_>>().join(", "));

    println!("\nmessages ({}):", messages.len());
    for m in messages {
        println!("  [{:>4}] {:<9} {:<24} {}", m.seq, message_kind_label(m.kind), m.sender_agent_id.as_str(), truncate(&m.body, 60));
    }

    println!("\ntriggers ({}):", triggers.len());
    for t in triggers {
        println!("  {:<38} {:<24} {:<18} attempts={}", t.trigger_id.as_str(), t.target_agent_id.as_str(), t.status.to_string(), t.attempts);
    }
}

fn message_kind_label(kind: MessageKind) -> &'static str {
    match kind {
        MessageKind::Chat => "chat",
        MessageKind::Event => "event",
        MessageKind::System => "system",
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.len() > max {
        format!("{}...", &s[..max])
    } else {
        s.to_string()
    }
}

#[cfg(test)]
#[path = "inspect_tests.rs"]
mod tests;
