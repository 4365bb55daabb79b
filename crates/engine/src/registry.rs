// SPDX-License-Identifier: MIT
// Copyright (c) 2026 the sv contributors

//! Runtime Registry (C2): thin tracing wrapper over [`RegistryStore`], which
//! owns the actual heartbeat/staleness logic (SPEC_FULL.md §4.1).

use chrono::{DateTime, Utc};

use sv_core::domain::{Heartbeat, SessionRecord};
use sv_core::id::{AgentId, WorkspaceId};
use sv_storage::{RegistryReconciliation, RegistryStore};

use crate::error::EngineError;

pub struct RuntimeRegistry<St> {
    store: St,
}

impl<St: RegistryStore> RuntimeRegistry<St> {
    pub fn new(store: St) -> Self {
        Self { store }
    }

    pub async fn upsert_from_heartbeat(&self, heartbeat: Heartbeat, now: DateTime<Utc>) -> Result<SessionRecord, EngineError> {
        let agent_id = heartbeat.agent_id.clone();
        let workspace_id = heartbeat.workspace_id.clone();
        let record = self.store.upsert_from_heartbeat(heartbeat, now).await?;
        tracing::debug!(agent_id = %agent_id, workspace_id = %workspace_id, status = ?record.status, "heartbeat applied");
        Ok(record)
    }

    pub async fn get_session(&self, agent_id: &AgentId, workspace_id: &WorkspaceId) -> Result<Option<SessionRecord>, EngineError> {
        Ok(self.store.get_session(agent_id, workspace_id).await?)
    }

    pub async fn reconcile(&self, workspace_id: &WorkspaceId, stale_after_hours: i64, now: DateTime<Utc>) -> Result<RegistryReconciliation, EngineError> {
        let result = self.store.reconcile_workspace_runtimes(workspace_id, stale_after_hours, now).await?;
        tracing::info!(
            workspace_id = %workspace_id,
            checked = result.checked_runtimes,
            transitioned_offline = result.transitioned_offline,
            "runtime registry reconciled"
        );
        Ok(result)
    }

    pub async fn deregister(&self, agent_id: &AgentId, workspace_id: &WorkspaceId, now: DateTime<Utc>) -> Result<(), EngineError> {
        self.store.deregister_runtime(agent_id, workspace_id, now).await?;
        tracing::info!(agent_id = %agent_id, workspace_id = %workspace_id, "runtime deregistered");
        Ok(())
    }
}

#[cfg(test)]
#[path = "registry_tests.rs"]
mod tests;
