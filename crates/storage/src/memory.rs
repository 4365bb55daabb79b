// SPDX-License-Identifier: MIT
// Copyright (c) 2026 the sv contributors

//! Reference in-memory implementation of [`crate::store::Store`].
//!
//! Enforces the same ordering invariants a relational store would via
//! unique indexes — here, simple `HashMap`/`Vec` checks under a single
//! mutex — so unit tests can exercise the engine without a database.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;

use sv_core::domain::{
    AuditEvent, Heartbeat, Message, ParticipantCursor, ReconciliationState, SessionRecord, Thread,
    ThreadStatus, ThreadParticipant, TriggerAttempt, TriggerFallbackRun, TriggerJob, TriggerStatus,
};
use sv_core::id::{AgentId, ThreadId, TriggerId, WorkspaceId};

use crate::error::StoreError;
use crate::store::{AuditStore, RegistryReconciliation, RegistryStore, ReconciliationStateStore, SnapshotStore, TriggerStore};

#[derive(Default)]
struct State {
    threads: HashMap<String, Thread>,
    participants: HashMap<String, Vec<ThreadParticipant>>,
    messages: HashMap<String, Vec<Message>>,
    cursors: HashMap<(String, String), ParticipantCursor>,
    sessions: HashMap<(String, String), SessionRecord>,
    reconciliation: HashMap<(String, String), ReconciliationState>,
    jobs: HashMap<String, TriggerJob>,
    attempts: HashMap<String, Vec<TriggerAttempt>>,
    fallback_runs: HashMap<String, TriggerFallbackRun>,
    audit: HashMap<String, Vec<AuditEvent>>,
}

#[derive(Clone, Default)]
pub struct InMemoryStore {
    inner: Arc<Mutex<State>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Test/CLI seam: register a thread with no history.
    pub fn seed_thread(&self, thread: Thread) {
        self.inner.lock().threads.insert(thread.thread_id.as_str().to_string(), thread);
    }

    pub fn seed_participant(&self, participant: ThreadParticipant) {
        self.inner
            .lock()
            .participants
            .entry(participant.thread_id.as_str().to_string())
            .or_default()
            .push(participant);
    }

    fn pending_statuses() -> &'static [TriggerStatus] {
        &[
            TriggerStatus::Queued,
            TriggerStatus::Triggering,
            TriggerStatus::Deferred,
            TriggerStatus::CallbackPending,
            TriggerStatus::CallbackRetry,
            TriggerStatus::FallbackResume,
            TriggerStatus::FallbackSpawn,
        ]
    }

    fn active_statuses() -> &'static [TriggerStatus] {
        &[
            TriggerStatus::Queued,
            TriggerStatus::Triggering,
            TriggerStatus::Deferred,
            TriggerStatus::FallbackResume,
            TriggerStatus::FallbackSpawn,
            TriggerStatus::CallbackPending,
            TriggerStatus::CallbackRetry,
        ]
    }
}

#[async_trait]
impl RegistryStore for InMemoryStore {
    async fn upsert_from_heartbeat(&self, heartbeat: Heartbeat, now: DateTime<Utc>) -> Result<SessionRecord, StoreError> {
        let mut state = self.inner.lock();
        let key = (heartbeat.agent_id.as_str().to_string(), heartbeat.workspace_id.as_str().to_string());
        let existing = state.sessions.get(&key).cloned();
        match SessionRecord::apply_heartbeat(existing.as_ref(), heartbeat, now) {
            Some(updated) => {
                state.sessions.insert(key, updated.clone());
                Ok(updated)
            }
            None => existing.ok_or_else(|| StoreError::Internal("no-op heartbeat implies an existing row".to_string())),
        }
    }

    async fn get_session(&self, agent_id: &AgentId, workspace_id: &WorkspaceId) -> Result<Option<SessionRecord>, StoreError> {
        let key = (agent_id.as_str().to_string(), workspace_id.as_str().to_string());
        Ok(self.inner.lock().sessions.get(&key).cloned())
    }

    async fn reconcile_workspace_runtimes(
        &self,
        workspace_id: &WorkspaceId,
        stale_after_hours: i64,
        now: DateTime<Utc>,
    ) -> Result<RegistryReconciliation, StoreError> {
        let mut state = self.inner.lock();
        let mut stats = RegistryReconciliation::default();
        for session in state.sessions.values_mut() {
            if session.workspace_id.as_str() != workspace_id.as_str() {
                continue;
            }
            stats.checked_runtimes += 1;
            if session.status != sv_core::domain::SessionStatus::Offline && session.is_stale(now, stale_after_hours) {
                session.status = sv_core::domain::SessionStatus::Offline;
                session.updated_at = now;
                stats.transitioned_offline += 1;
            }
        }
        Ok(stats)
    }

    async fn deregister_runtime(&self, agent_id: &AgentId, workspace_id: &WorkspaceId, now: DateTime<Utc>) -> Result<(), StoreError> {
        let mut state = self.inner.lock();
        let key = (agent_id.as_str().to_string(), workspace_id.as_str().to_string());
        if let Some(session) = state.sessions.get_mut(&key) {
            session.status = sv_core::domain::SessionStatus::Offline;
            session.resumable = false;
            session.updated_at = now;
        }
        Ok(())
    }
}

#[async_trait]
impl SnapshotStore for InMemoryStore {
    async fn list_reconcilable_threads(&self, workspace_id: &WorkspaceId, include_closed: bool) -> Result<Vec<Thread>, StoreError> {
        let mut threads: Vec<Thread> = self
            .inner
            .lock()
            .threads
            .values()
            .filter(|t| t.workspace_id.as_str() == workspace_id.as_str())
            .filter(|t| include_closed || t.status != ThreadStatus::Closed)
            .cloned()
            .collect();
        threads.sort_by(|a, b| a.thread_id.as_str().cmp(b.thread_id.as_str()));
        Ok(threads)
    }

    async fn get_thread(&self, thread_id: &ThreadId) -> Result<Option<Thread>, StoreError> {
        Ok(self.inner.lock().threads.get(thread_id.as_str()).cloned())
    }

    async fn update_thread(&self, thread: Thread) -> Result<(), StoreError> {
        self.inner.lock().threads.insert(thread.thread_id.as_str().to_string(), thread);
        Ok(())
    }

    async fn list_participants(&self, thread_id: &ThreadId) -> Result<Vec<ThreadParticipant>, StoreError> {
        let mut participants = self.inner.lock().participants.get(thread_id.as_str()).cloned().unwrap_or_default();
        participants.sort_by(|a, b| a.agent_id.as_str().cmp(b.agent_id.as_str()));
        Ok(participants)
    }

    async fn latest_seq(&self, thread_id: &ThreadId) -> Result<i64, StoreError> {
        Ok(self
            .inner
            .lock()
            .messages
            .get(thread_id.as_str())
            .and_then(|msgs| msgs.iter().map(|m| m.seq).max())
            .unwrap_or(0))
    }

    async fn get_cursor(&self, thread_id: &ThreadId, agent_id: &AgentId) -> Result<Option<ParticipantCursor>, StoreError> {
        let key = (thread_id.as_str().to_string(), agent_id.as_str().to_string());
        Ok(self.inner.lock().cursors.get(&key).cloned())
    }

    async fn upsert_cursor(&self, cursor: ParticipantCursor) -> Result<(), StoreError> {
        let key = (cursor.thread_id.as_str().to_string(), cursor.agent_id.as_str().to_string());
        self.inner.lock().cursors.insert(key, cursor);
        Ok(())
    }

    async fn append_message(&self, message: Message) -> Result<(), StoreError> {
        let mut state = self.inner.lock();
        let bucket = state.messages.entry(message.thread_id.as_str().to_string()).or_default();
        let latest = bucket.iter().map(|m| m.seq).max().unwrap_or(0);
        sv_core::domain::message::validate_next_seq(&message.thread_id, latest, message.seq)?;
        bucket.push(message);
        Ok(())
    }

    async fn list_messages(&self, thread_id: &ThreadId, limit: usize) -> Result<Vec<Message>, StoreError> {
        let mut msgs = self.inner.lock().messages.get(thread_id.as_str()).cloned().unwrap_or_default();
        msgs.sort_by_key(|m| m.seq);
        if msgs.len() > limit {
            let start = msgs.len() - limit;
            msgs = msgs.split_off(start);
        }
        Ok(msgs)
    }

    async fn has_ack_since(&self, thread_id: &ThreadId, target_agent_id: &AgentId, since: DateTime<Utc>) -> Result<bool, StoreError> {
        let state = self.inner.lock();
        Ok(state
            .messages
            .get(thread_id.as_str())
            .map(|msgs| {
                msgs.iter().any(|m| {
                    m.sender_agent_id.as_str() == target_agent_id.as_str()
                        && m.kind == sv_core::domain::MessageKind::Event
                        && m.created_at >= since
                })
            })
            .unwrap_or(false))
    }
}

#[async_trait]
impl ReconciliationStateStore for InMemoryStore {
    async fn get_reconciliation_state(&self, thread_id: &ThreadId, agent_id: &AgentId) -> Result<Option<ReconciliationState>, StoreError> {
        let key = (thread_id.as_str().to_string(), agent_id.as_str().to_string());
        Ok(self.inner.lock().reconciliation.get(&key).cloned())
    }

    async fn mark_notified(&self, thread_id: &ThreadId, agent_id: &AgentId, last_notified_seq: i64, notified_at: DateTime<Utc>) -> Result<(), StoreError> {
        let key = (thread_id.as_str().to_string(), agent_id.as_str().to_string());
        self.inner.lock().reconciliation.insert(
            key,
            ReconciliationState {
                thread_id: thread_id.clone(),
                agent_id: agent_id.clone(),
                last_notified_seq,
                notified_at,
            },
        );
        Ok(())
    }
}

#[async_trait]
impl TriggerStore for InMemoryStore {
    async fn insert_job(&self, job: TriggerJob) -> Result<(), StoreError> {
        self.inner.lock().jobs.insert(job.trigger_id.as_str().to_string(), job);
        Ok(())
    }

    async fn get_job(&self, trigger_id: &TriggerId) -> Result<Option<TriggerJob>, StoreError> {
        Ok(self.inner.lock().jobs.get(trigger_id.as_str()).cloned())
    }

    async fn update_job(&self, job: TriggerJob) -> Result<(), StoreError> {
        self.inner.lock().jobs.insert(job.trigger_id.as_str().to_string(), job);
        Ok(())
    }

    async fn find_active_job(&self, thread_id: &ThreadId, target_agent_id: &AgentId) -> Result<Option<TriggerJob>, StoreError> {
        let state = self.inner.lock();
        Ok(state
            .jobs
            .values()
            .find(|j| {
                j.thread_id.as_str() == thread_id.as_str()
                    && j.target_agent_id.as_str() == target_agent_id.as_str()
                    && Self::active_statuses().contains(&j.status)
            })
            .cloned())
    }

    async fn max_terminal_observed_seq(&self, thread_id: &ThreadId, target_agent_id: &AgentId) -> Result<Option<i64>, StoreError> {
        let state = self.inner.lock();
        Ok(state
            .jobs
            .values()
            .filter(|j| {
                j.thread_id.as_str() == thread_id.as_str()
                    && j.target_agent_id.as_str() == target_agent_id.as_str()
                    && matches!(j.status, TriggerStatus::Delivered | TriggerStatus::CallbackDelivered)
            })
            .map(|j| j.observed_latest_seq)
            .max())
    }

    async fn count_pending_jobs(&self, workspace_id: &WorkspaceId) -> Result<u64, StoreError> {
        let state = self.inner.lock();
        Ok(state
            .jobs
            .values()
            .filter(|j| j.workspace_id.as_str() == workspace_id.as_str() && Self::pending_statuses().contains(&j.status))
            .count() as u64)
    }

    async fn count_recent_triggers(&self, workspace_id: &WorkspaceId, target_agent_id: &AgentId, since: DateTime<Utc>) -> Result<u32, StoreError> {
        let state = self.inner.lock();
        Ok(state
            .jobs
            .values()
            .filter(|j| {
                j.workspace_id.as_str() == workspace_id.as_str()
                    && j.target_agent_id.as_str() == target_agent_id.as_str()
                    && j.created_at >= since
            })
            .count() as u32)
    }

    async fn last_trigger_at(&self, workspace_id: &WorkspaceId, target_agent_id: &AgentId) -> Result<Option<DateTime<Utc>>, StoreError> {
        let state = self.inner.lock();
        Ok(state
            .jobs
            .values()
            .filter(|j| j.workspace_id.as_str() == workspace_id.as_str() && j.target_agent_id.as_str() == target_agent_id.as_str())
            .map(|j| j.created_at)
            .max())
    }

    async fn claim_due_jobs(
        &self,
        workspace_id: &WorkspaceId,
        limit: u32,
        now: DateTime<Utc>,
        lease_timeout: chrono::Duration,
        min_created_at: Option<DateTime<Utc>>,
    ) -> Result<Vec<TriggerJob>, StoreError> {
        let mut state = self.inner.lock();
        let mut due: Vec<String> = state
            .jobs
            .values()
            .filter(|j| j.workspace_id.as_str() == workspace_id.as_str())
            .filter(|j| min_created_at.map_or(true, |min| j.created_at >= min))
            .filter(|j| match j.status {
                TriggerStatus::Queued => j.next_retry_at.map_or(true, |t| t <= now),
                TriggerStatus::Deferred => j.next_retry_at.is_some_and(|t| t <= now),
                TriggerStatus::Triggering | TriggerStatus::CallbackPending | TriggerStatus::CallbackRetry => {
                    j.triggering_lease_expires_at.is_some_and(|t| t <= now)
                }
                _ => false,
            })
            .map(|j| (j.trigger_id.as_str().to_string(), j.next_retry_at.unwrap_or(j.created_at)))
            .collect::<Vec<_>>()
            .into_iter()
            .map(|(id, _)| id)
            .collect();

        due.sort_by_key(|id| {
            let job = &state.jobs[id];
            job.next_retry_at.unwrap_or(job.created_at)
        });
        due.truncate(limit as usize);

        let mut claimed = Vec::with_capacity(due.len());
        for id in due {
            if let Some(job) = state.jobs.get_mut(&id) {
                job.status = TriggerStatus::Triggering;
                job.attempts += 1;
                job.updated_at = now;
                job.triggering_lease_expires_at = Some(now + lease_timeout);
                claimed.push(job.clone());
            }
        }
        Ok(claimed)
    }

    async fn append_attempt(&self, attempt: TriggerAttempt) -> Result<(), StoreError> {
        self.inner
            .lock()
            .attempts
            .entry(attempt.trigger_id.as_str().to_string())
            .or_default()
            .push(attempt);
        Ok(())
    }

    async fn list_attempts(&self, trigger_id: &TriggerId) -> Result<Vec<TriggerAttempt>, StoreError> {
        Ok(self.inner.lock().attempts.get(trigger_id.as_str()).cloned().unwrap_or_default())
    }

    async fn insert_fallback_run(&self, run: TriggerFallbackRun) -> Result<(), StoreError> {
        self.inner.lock().fallback_runs.insert(run.run_id.as_str().to_string(), run);
        Ok(())
    }

    async fn update_fallback_run(&self, run: TriggerFallbackRun) -> Result<(), StoreError> {
        self.inner.lock().fallback_runs.insert(run.run_id.as_str().to_string(), run);
        Ok(())
    }

    async fn list_open_fallback_runs(&self, workspace_id: &WorkspaceId, limit: u32) -> Result<Vec<TriggerFallbackRun>, StoreError> {
        let state = self.inner.lock();
        let mut runs: Vec<TriggerFallbackRun> = state
            .fallback_runs
            .values()
            .filter(|r| r.finished_at.is_none())
            .filter(|r| {
                state
                    .jobs
                    .get(r.trigger_id.as_str())
                    .is_some_and(|j| j.workspace_id.as_str() == workspace_id.as_str())
            })
            .cloned()
            .collect();
        runs.sort_by_key(|r| r.started_at);
        runs.truncate(limit as usize);
        Ok(runs)
    }

    async fn list_jobs_by_status(&self, thread_id: &ThreadId, statuses: &[TriggerStatus], limit: usize) -> Result<Vec<TriggerJob>, StoreError> {
        let state = self.inner.lock();
        let mut jobs: Vec<TriggerJob> = state
            .jobs
            .values()
            .filter(|j| j.thread_id.as_str() == thread_id.as_str() && statuses.contains(&j.status))
            .cloned()
            .collect();
        jobs.sort_by_key(|j| std::cmp::Reverse(j.created_at));
        jobs.truncate(limit);
        Ok(jobs)
    }

    async fn list_due_callback_jobs(&self, workspace_id: &WorkspaceId, limit: usize, now: DateTime<Utc>) -> Result<Vec<TriggerJob>, StoreError> {
        let state = self.inner.lock();
        let mut jobs: Vec<TriggerJob> = state
            .jobs
            .values()
            .filter(|j| j.workspace_id.as_str() == workspace_id.as_str())
            .filter(|j| matches!(j.status, TriggerStatus::CallbackPending | TriggerStatus::CallbackRetry))
            .filter(|j| j.next_retry_at.map_or(true, |t| t <= now))
            .cloned()
            .collect();
        jobs.sort_by_key(|j| j.next_retry_at.unwrap_or(j.created_at));
        jobs.truncate(limit);
        Ok(jobs)
    }
}

#[async_trait]
impl AuditStore for InMemoryStore {
    async fn append_audit_event(&self, event: AuditEvent) -> Result<(), StoreError> {
        let key = event
            .subject_thread_id
            .as_ref()
            .map(|t| t.as_str().to_string())
            .unwrap_or_else(|| "__workspace__".to_string());
        self.inner.lock().audit.entry(key).or_default().push(event);
        Ok(())
    }

    async fn list_audit_events(&self, thread_id: &ThreadId, limit: usize) -> Result<Vec<AuditEvent>, StoreError> {
        let mut events = self.inner.lock().audit.get(thread_id.as_str()).cloned().unwrap_or_default();
        events.sort_by_key(|e| std::cmp::Reverse(e.created_at));
        events.truncate(limit);
        Ok(events)
    }
}

#[cfg(test)]
#[path = "memory_tests.rs"]
mod tests;
