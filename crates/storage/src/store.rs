// SPDX-License-Identifier: MIT
// Copyright (c) 2026 the sv contributors

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use sv_core::domain::{
    AuditEvent, Heartbeat, Message, ParticipantCursor, ReconciliationState, SessionRecord, Thread,
    ThreadParticipant, TriggerAttempt, TriggerFallbackRun, TriggerJob, TriggerStatus,
};
use sv_core::id::{AgentId, ThreadId, TriggerId, WorkspaceId};

use crate::error::StoreError;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RegistryReconciliation {
    pub checked_runtimes: u32,
    pub transitioned_offline: u32,
}

/// Capability set backing the Runtime Registry (C2).
#[async_trait]
pub trait RegistryStore: Send + Sync {
    async fn upsert_from_heartbeat(&self, heartbeat: Heartbeat, now: DateTime<Utc>) -> Result<SessionRecord, StoreError>;

    async fn get_session(&self, agent_id: &AgentId, workspace_id: &WorkspaceId) -> Result<Option<SessionRecord>, StoreError>;

    async fn reconcile_workspace_runtimes(
        &self,
        workspace_id: &WorkspaceId,
        stale_after_hours: i64,
        now: DateTime<Utc>,
    ) -> Result<RegistryReconciliation, StoreError>;

    async fn deregister_runtime(&self, agent_id: &AgentId, workspace_id: &WorkspaceId, now: DateTime<Utc>) -> Result<(), StoreError>;
}

/// Read-consistent snapshot join used by Unread Reconciliation (C5), plus the
/// seams the CLI and test fixtures use to seed/read conversation state.
#[async_trait]
pub trait SnapshotStore: Send + Sync {
    async fn list_reconcilable_threads(&self, workspace_id: &WorkspaceId, include_closed: bool) -> Result<Vec<Thread>, StoreError>;

    async fn get_thread(&self, thread_id: &ThreadId) -> Result<Option<Thread>, StoreError>;

    async fn update_thread(&self, thread: Thread) -> Result<(), StoreError>;

    async fn list_participants(&self, thread_id: &ThreadId) -> Result<Vec<ThreadParticipant>, StoreError>;

    async fn latest_seq(&self, thread_id: &ThreadId) -> Result<i64, StoreError>;

    async fn get_cursor(&self, thread_id: &ThreadId, agent_id: &AgentId) -> Result<Option<ParticipantCursor>, StoreError>;

    async fn upsert_cursor(&self, cursor: ParticipantCursor) -> Result<(), StoreError>;

    async fn append_message(&self, message: Message) -> Result<(), StoreError>;

    async fn list_messages(&self, thread_id: &ThreadId, limit: usize) -> Result<Vec<Message>, StoreError>;

    /// True if `target_agent_id` has posted an `event`/`chat` message in the
    /// thread created at or after `since` — the ack-poll predicate in
    /// SPEC_FULL.md §4.6 step 3.
    async fn has_ack_since(&self, thread_id: &ThreadId, target_agent_id: &AgentId, since: DateTime<Utc>) -> Result<bool, StoreError>;
}

/// Write-only latch backing the dedup step of Unread Reconciliation (C5).
#[async_trait]
pub trait ReconciliationStateStore: Send + Sync {
    async fn get_reconciliation_state(&self, thread_id: &ThreadId, agent_id: &AgentId) -> Result<Option<ReconciliationState>, StoreError>;

    async fn mark_notified(&self, thread_id: &ThreadId, agent_id: &AgentId, last_notified_seq: i64, notified_at: DateTime<Utc>) -> Result<(), StoreError>;
}

/// Capability set backing the Trigger Scheduler (C6) and Trigger Queue Worker (C7).
#[async_trait]
pub trait TriggerStore: Send + Sync {
    async fn insert_job(&self, job: TriggerJob) -> Result<(), StoreError>;

    async fn get_job(&self, trigger_id: &TriggerId) -> Result<Option<TriggerJob>, StoreError>;

    async fn update_job(&self, job: TriggerJob) -> Result<(), StoreError>;

    /// An existing job for `(thread_id, target_agent_id)` in a non-terminal
    /// status, reused instead of inserting a duplicate (SPEC_FULL.md §4.5).
    async fn find_active_job(&self, thread_id: &ThreadId, target_agent_id: &AgentId) -> Result<Option<TriggerJob>, StoreError>;

    /// Highest `observed_latest_seq` among terminal (`delivered`/`callback_delivered`)
    /// jobs for `(thread_id, target_agent_id)`, used to suppress re-triggering
    /// a frontier already fully handled.
    async fn max_terminal_observed_seq(&self, thread_id: &ThreadId, target_agent_id: &AgentId) -> Result<Option<i64>, StoreError>;

    async fn count_pending_jobs(&self, workspace_id: &WorkspaceId) -> Result<u64, StoreError>;

    async fn count_recent_triggers(&self, workspace_id: &WorkspaceId, target_agent_id: &AgentId, since: DateTime<Utc>) -> Result<u32, StoreError>;

    async fn last_trigger_at(&self, workspace_id: &WorkspaceId, target_agent_id: &AgentId) -> Result<Option<DateTime<Utc>>, StoreError>;

    /// Leased claim per the `FOR UPDATE SKIP LOCKED` query in SPEC_FULL.md §4.6:
    /// atomically moves each claimed row into `triggering`, bumps `attempts`,
    /// and sets `triggering_lease_expires_at`.
    async fn claim_due_jobs(
        &self,
        workspace_id: &WorkspaceId,
        limit: u32,
        now: DateTime<Utc>,
        lease_timeout: chrono::Duration,
        min_created_at: Option<DateTime<Utc>>,
    ) -> Result<Vec<TriggerJob>, StoreError>;

    async fn append_attempt(&self, attempt: TriggerAttempt) -> Result<(), StoreError>;

    async fn list_attempts(&self, trigger_id: &TriggerId) -> Result<Vec<TriggerAttempt>, StoreError>;

    async fn insert_fallback_run(&self, run: TriggerFallbackRun) -> Result<(), StoreError>;

    async fn update_fallback_run(&self, run: TriggerFallbackRun) -> Result<(), StoreError>;

    async fn list_open_fallback_runs(&self, workspace_id: &WorkspaceId, limit: u32) -> Result<Vec<TriggerFallbackRun>, StoreError>;

    async fn list_jobs_by_status(&self, thread_id: &ThreadId, statuses: &[TriggerStatus], limit: usize) -> Result<Vec<TriggerJob>, StoreError>;

    /// Jobs in `callback_pending`/`callback_retry` for `workspace_id` whose
    /// `next_retry_at` is due, for the Callback Poster (C8) per SPEC_FULL.md §4.7.
    async fn list_due_callback_jobs(&self, workspace_id: &WorkspaceId, limit: usize, now: DateTime<Utc>) -> Result<Vec<TriggerJob>, StoreError>;
}

#[async_trait]
pub trait AuditStore: Send + Sync {
    async fn append_audit_event(&self, event: AuditEvent) -> Result<(), StoreError>;

    async fn list_audit_events(&self, thread_id: &ThreadId, limit: usize) -> Result<Vec<AuditEvent>, StoreError>;
}

/// The full persistence surface the supervisor loop and the CLI depend on.
/// Implemented by [`crate::memory::InMemoryStore`] and, behind the `postgres`
/// feature, by [`crate::postgres::PostgresStore`].
pub trait Store: RegistryStore + SnapshotStore + ReconciliationStateStore + TriggerStore + AuditStore {}

impl<T> Store for T where T: RegistryStore + SnapshotStore + ReconciliationStateStore + TriggerStore + AuditStore {}
