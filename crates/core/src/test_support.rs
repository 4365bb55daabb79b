// SPDX-License-Identifier: MIT
// Copyright (c) 2026 the sv contributors

//! Shared fixture builders for use across crates' test suites.
//!
//! Gated behind the `test-support` feature.

use chrono::{DateTime, Utc};

use crate::domain::{
    ManagementMode, ParticipantCursor, SessionRecord, SessionStatus, Thread, ThreadStatus, ThreadType,
};
use crate::id::{AgentId, ThreadId, WorkspaceId};

pub fn sample_thread(thread_id: &str, workspace_id: &str, now: DateTime<Utc>) -> Thread {
    Thread {
        thread_id: ThreadId::from(thread_id),
        workspace_id: WorkspaceId::from(workspace_id),
        title: "test thread".to_string(),
        kind: ThreadType::Conversation,
        status: ThreadStatus::Active,
        escalation_owner: None,
        created_at: now,
        updated_at: now,
    }
}

pub fn sample_cursor(thread_id: &str, agent_id: &str, last_read_seq: i64, now: DateTime<Utc>) -> ParticipantCursor {
    ParticipantCursor {
        thread_id: ThreadId::from(thread_id),
        agent_id: AgentId::from(agent_id),
        last_read_seq,
        last_acked_message_id: None,
        updated_at: now,
    }
}

pub fn active_session(agent_id: &str, workspace_id: &str, session_id: &str, now: DateTime<Utc>) -> SessionRecord {
    SessionRecord {
        agent_id: AgentId::from(agent_id),
        workspace_id: WorkspaceId::from(workspace_id),
        session_id: session_id.to_string(),
        runtime: format!("tmux:{session_id}"),
        management_mode: ManagementMode::Managed,
        resumable: true,
        status: SessionStatus::Active,
        last_heartbeat_at: now,
        updated_at: now,
    }
}
