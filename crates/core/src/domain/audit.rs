// SPDX-License-Identifier: MIT
// Copyright (c) 2026 the sv contributors

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::id::{AgentId, AuditId, ThreadId, WorkspaceId};

/// Operator-attributable event, appended by the CLI and by the worker's
/// dead-letter path (SPEC_FULL.md §3/§9). Not read by the tick itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEvent {
    pub audit_id: AuditId,
    pub workspace_id: WorkspaceId,
    pub actor_agent_id: AgentId,
    pub action: String,
    pub subject_thread_id: Option<ThreadId>,
    pub reason: String,
    pub metadata: Option<Value>,
    pub created_at: DateTime<Utc>,
}
