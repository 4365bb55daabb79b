// SPDX-License-Identifier: MIT
// Copyright (c) 2026 the sv contributors

//! Unread Reconciliation (C5): scans participant cursors against the latest
//! message sequence per thread, filters to dormant participants, deduplicates
//! against the last-notified frontier, and emits trigger candidates
//! (SPEC_FULL.md §4.4).

use chrono::{DateTime, Utc};

use sv_core::domain::{ManagementMode, ReconciliationState, SessionStatus};
use sv_core::id::{AgentId, ThreadId, WorkspaceId};
use sv_storage::{ReconciliationStateStore, RegistryStore, SnapshotStore};

use crate::error::EngineError;

pub const REASON_NEW_UNREAD_DORMANT_PARTICIPANT: &str = "new_unread_dormant_participant";

#[derive(Debug, Clone)]
pub struct ReconcileInput {
    pub workspace_id: WorkspaceId,
    pub stale_after_hours: i64,
    pub include_closed_threads: bool,
    pub polled_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct Candidate {
    pub thread_id: ThreadId,
    pub workspace_id: WorkspaceId,
    pub participant_agent_id: AgentId,
    pub unread_count: i64,
    pub latest_seq: i64,
    pub last_read_seq: i64,
    pub session_status: Option<SessionStatus>,
    pub session_id: Option<String>,
    pub management_mode: Option<ManagementMode>,
    pub resumable: Option<bool>,
    pub stale_session: bool,
    pub reason: &'static str,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcileStats {
    pub participants_scanned: u32,
    pub unread_participants: u32,
    pub dormant_unread_participants: u32,
    pub deduplicated_participants: u32,
}

#[derive(Debug, Clone, Default)]
pub struct ReconcileOutcome {
    pub candidates: Vec<Candidate>,
    pub stats: ReconcileStats,
}

pub struct UnreadReconciler<St> {
    store: St,
}

impl<St> UnreadReconciler<St>
where
    St: SnapshotStore + ReconciliationStateStore + RegistryStore,
{
    pub fn new(store: St) -> Self {
        Self { store }
    }

    pub async fn reconcile(&self, input: ReconcileInput) -> Result<ReconcileOutcome, EngineError> {
        let threads = self
            .store
            .list_reconcilable_threads(&input.workspace_id, input.include_closed_threads)
            .await?;

        let mut candidates = Vec::new();
        let mut stats = ReconcileStats::default();

        for thread in threads {
            let latest_seq = self.store.latest_seq(&thread.thread_id).await?;
            let mut participants = self.store.list_participants(&thread.thread_id).await?;
            participants.sort_by(|a, b| a.agent_id.as_str().cmp(b.agent_id.as_str()));

            for participant in participants {
                stats.participants_scanned += 1;

                let last_read_seq = self
                    .store
                    .get_cursor(&thread.thread_id, &participant.agent_id)
                    .await?
                    .map(|c| c.last_read_seq)
                    .unwrap_or(0);

                if latest_seq <= last_read_seq {
                    continue;
                }
                stats.unread_participants += 1;

                let session = self.store.get_session(&participant.agent_id, &input.workspace_id).await?;
                let stale_session = session
                    .as_ref()
                    .is_some_and(|s| s.is_stale(input.polled_at, input.stale_after_hours));
                let dormant = match &session {
                    None => true,
                    Some(s) => s.status.is_dormant() || stale_session,
                };
                if !dormant {
                    continue;
                }
                stats.dormant_unread_participants += 1;

                let existing = self
                    .store
                    .get_reconciliation_state(&thread.thread_id, &participant.agent_id)
                    .await?;
                if ReconciliationState::already_notified(existing.as_ref(), latest_seq) {
                    stats.deduplicated_participants += 1;
                    continue;
                }

                self.store
                    .mark_notified(&thread.thread_id, &participant.agent_id, latest_seq, input.polled_at)
                    .await?;

                candidates.push(Candidate {
                    thread_id: thread.thread_id.clone(),
                    workspace_id: input.workspace_id.clone(),
                    participant_agent_id: participant.agent_id.clone(),
                    unread_count: latest_seq - last_read_seq,
                    latest_seq,
                    last_read_seq,
                    session_status: session.as_ref().map(|s| s.status),
                    session_id: session.as_ref().map(|s| s.session_id.clone()),
                    management_mode: session.as_ref().map(|s| s.management_mode),
                    resumable: session.as_ref().map(|s| s.resumable),
                    stale_session,
                    reason: REASON_NEW_UNREAD_DORMANT_PARTICIPANT,
                });
            }
        }

        tracing::info!(
            workspace_id = %input.workspace_id,
            candidates = candidates.len(),
            participants_scanned = stats.participants_scanned,
            dormant_unread = stats.dormant_unread_participants,
            deduplicated = stats.deduplicated_participants,
            "unread reconciliation complete"
        );

        Ok(ReconcileOutcome { candidates, stats })
    }
}

#[cfg(test)]
#[path = "unread_tests.rs"]
mod tests;
