// SPDX-License-Identifier: MIT
// Copyright (c) 2026 the sv contributors

//! Postgres-backed implementation of [`crate::store::Store`], gated behind
//! the `postgres` feature. Cross-worker invariants (unique indexes,
//! `FOR UPDATE SKIP LOCKED`, conditional updates guarded by monotonic
//! columns) are enforced by the schema in [`SCHEMA_SQL`] rather than by
//! application code, per SPEC_FULL.md §5.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Row};

use sv_core::domain::{
    AuditEvent, Heartbeat, ManagementMode, Message, MessageKind, ParticipantCursor, ReconciliationState, SessionRecord,
    SessionStatus, Thread, ThreadParticipant, ThreadStatus, ThreadType, TriggerAttempt, TriggerFallbackRun, TriggerJob,
    TriggerStatus,
};
use sv_core::id::{AgentId, ThreadId, TriggerId, WorkspaceId};

use crate::error::StoreError;
use crate::store::{AuditStore, RegistryReconciliation, RegistryStore, ReconciliationStateStore, SnapshotStore, TriggerStore};

/// Applied by the daemon at startup when `DATABASE_URL` is set and the
/// schema is absent (SPEC_FULL.md §6).
pub const SCHEMA_SQL: &str = include_str!("schema.sql");

#[derive(Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;
        Ok(Self { pool })
    }

    pub async fn apply_schema(&self) -> Result<(), StoreError> {
        sqlx::query(SCHEMA_SQL).execute(&self.pool).await?;
        Ok(())
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

fn thread_type_str(t: ThreadType) -> &'static str {
    match t {
        ThreadType::Conversation => "conversation",
        ThreadType::Workflow => "workflow",
        ThreadType::Incident => "incident",
    }
}

fn parse_thread_type(s: &str) -> ThreadType {
    match s {
        "workflow" => ThreadType::Workflow,
        "incident" => ThreadType::Incident,
        _ => ThreadType::Conversation,
    }
}

fn thread_status_str(s: ThreadStatus) -> &'static str {
    match s {
        ThreadStatus::Active => "active",
        ThreadStatus::Blocked => "blocked",
        ThreadStatus::Resolved => "resolved",
        ThreadStatus::Closed => "closed",
    }
}

fn parse_thread_status(s: &str) -> ThreadStatus {
    match s {
        "blocked" => ThreadStatus::Blocked,
        "resolved" => ThreadStatus::Resolved,
        "closed" => ThreadStatus::Closed,
        _ => ThreadStatus::Active,
    }
}

fn session_status_str(s: SessionStatus) -> &'static str {
    match s {
        SessionStatus::Active => "active",
        SessionStatus::Idle => "idle",
        SessionStatus::Offline => "offline",
    }
}

fn parse_session_status(s: &str) -> SessionStatus {
    match s {
        "idle" => SessionStatus::Idle,
        "offline" => SessionStatus::Offline,
        _ => SessionStatus::Active,
    }
}

fn management_mode_str(m: ManagementMode) -> &'static str {
    match m {
        ManagementMode::Managed => "managed",
        ManagementMode::Unmanaged => "unmanaged",
    }
}

fn parse_management_mode(s: &str) -> ManagementMode {
    match s {
        "unmanaged" => ManagementMode::Unmanaged,
        _ => ManagementMode::Managed,
    }
}

fn trigger_status_str(s: TriggerStatus) -> &'static str {
    match s {
        TriggerStatus::Queued => "queued",
        TriggerStatus::Triggering => "triggering",
        TriggerStatus::Deferred => "deferred",
        TriggerStatus::Delivered => "delivered",
        TriggerStatus::Timeout => "timeout",
        TriggerStatus::Failed => "failed",
        TriggerStatus::FallbackResume => "fallback_resume",
        TriggerStatus::FallbackSpawn => "fallback_spawn",
        TriggerStatus::CallbackPending => "callback_pending",
        TriggerStatus::CallbackRetry => "callback_retry",
        TriggerStatus::CallbackDelivered => "callback_delivered",
        TriggerStatus::CallbackFailed => "callback_failed",
    }
}

fn attempt_result_str(r: sv_core::domain::AttemptResult) -> &'static str {
    use sv_core::domain::AttemptResult::*;
    match r {
        Delivered => "delivered",
        AckTimeout => "ack_timeout",
        PaneDead => "pane_dead",
        SendKeysError => "send_keys_error",
        TargetNotFound => "target_not_found",
        UnsupportedRuntime => "unsupported_runtime",
        Rejected => "rejected",
        FallbackResumeSucceeded => "fallback_resume_succeeded",
        FallbackSpawned => "fallback_spawned",
        FallbackResumeFailed => "fallback_resume_failed",
        FallbackDeferred => "fallback_deferred",
    }
}

fn fallback_outcome_str(o: sv_core::domain::FallbackOutcome) -> &'static str {
    use sv_core::domain::FallbackOutcome::*;
    match o {
        Started => "started",
        Failed => "failed",
        CrashLoop => "crash_loop",
        TimedOut => "timed_out",
        Killed => "killed",
    }
}

fn parse_attempt_result(s: &str) -> sv_core::domain::AttemptResult {
    use sv_core::domain::AttemptResult::*;
    match s {
        "ack_timeout" => AckTimeout,
        "pane_dead" => PaneDead,
        "send_keys_error" => SendKeysError,
        "target_not_found" => TargetNotFound,
        "unsupported_runtime" => UnsupportedRuntime,
        "rejected" => Rejected,
        "fallback_resume_succeeded" => FallbackResumeSucceeded,
        "fallback_spawned" => FallbackSpawned,
        "fallback_resume_failed" => FallbackResumeFailed,
        _ => Delivered,
    }
}

fn parse_trigger_status(s: &str) -> TriggerStatus {
    match s {
        "triggering" => TriggerStatus::Triggering,
        "deferred" => TriggerStatus::Deferred,
        "delivered" => TriggerStatus::Delivered,
        "timeout" => TriggerStatus::Timeout,
        "failed" => TriggerStatus::Failed,
        "fallback_resume" => TriggerStatus::FallbackResume,
        "fallback_spawn" => TriggerStatus::FallbackSpawn,
        "callback_pending" => TriggerStatus::CallbackPending,
        "callback_retry" => TriggerStatus::CallbackRetry,
        "callback_delivered" => TriggerStatus::CallbackDelivered,
        "callback_failed" => TriggerStatus::CallbackFailed,
        _ => TriggerStatus::Queued,
    }
}

fn row_to_job(row: &sqlx::postgres::PgRow) -> Result<TriggerJob, StoreError> {
    Ok(TriggerJob {
        trigger_id: row.try_get::<String, _>("trigger_id")?.into(),
        thread_id: row.try_get::<String, _>("thread_id")?.into(),
        workspace_id: row.try_get::<String, _>("workspace_id")?.into(),
        target_agent_id: row.try_get::<String, _>("target_agent_id")?.into(),
        target_session_id: row.try_get("target_session_id")?,
        reason: row.try_get("reason")?,
        prompt: row.try_get("prompt")?,
        status: parse_trigger_status(&row.try_get::<String, _>("status")?),
        attempts: row.try_get::<i32, _>("attempts")? as u32,
        callback_attempts: row.try_get::<i32, _>("callback_attempts")? as u32,
        max_retries: row.try_get::<i32, _>("max_retries")? as u32,
        next_retry_at: row.try_get("next_retry_at")?,
        observed_latest_seq: row.try_get("observed_latest_seq")?,
        triggering_lease_expires_at: row.try_get("triggering_lease_expires_at")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

#[async_trait]
impl RegistryStore for PostgresStore {
    async fn upsert_from_heartbeat(&self, heartbeat: Heartbeat, now: DateTime<Utc>) -> Result<SessionRecord, StoreError> {
        let row = sqlx::query(
            r#"
            INSERT INTO session_registry (agent_id, workspace_id, session_id, runtime, management_mode, resumable, status, last_heartbeat_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            ON CONFLICT (agent_id, workspace_id) DO UPDATE SET
                session_id = EXCLUDED.session_id,
                runtime = EXCLUDED.runtime,
                management_mode = EXCLUDED.management_mode,
                resumable = EXCLUDED.resumable,
                status = EXCLUDED.status,
                last_heartbeat_at = EXCLUDED.last_heartbeat_at,
                updated_at = EXCLUDED.updated_at
            WHERE session_registry.last_heartbeat_at < EXCLUDED.last_heartbeat_at
            RETURNING agent_id, workspace_id, session_id, runtime, management_mode, resumable, status, last_heartbeat_at, updated_at
            "#,
        )
        .bind(heartbeat.agent_id.as_str())
        .bind(heartbeat.workspace_id.as_str())
        .bind(&heartbeat.session_id)
        .bind(&heartbeat.runtime)
        .bind(management_mode_str(heartbeat.management_mode))
        .bind(heartbeat.resumable)
        .bind(session_status_str(heartbeat.status))
        .bind(heartbeat.heartbeat_at)
        .bind(now)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Ok(SessionRecord {
                agent_id: row.try_get::<String, _>("agent_id")?.into(),
                workspace_id: row.try_get::<String, _>("workspace_id")?.into(),
                session_id: row.try_get("session_id")?,
                runtime: row.try_get("runtime")?,
                management_mode: parse_management_mode(&row.try_get::<String, _>("management_mode")?),
                resumable: row.try_get("resumable")?,
                status: parse_session_status(&row.try_get::<String, _>("status")?),
                last_heartbeat_at: row.try_get("last_heartbeat_at")?,
                updated_at: row.try_get("updated_at")?,
            }),
            None => self
                .get_session(&heartbeat.agent_id, &heartbeat.workspace_id)
                .await?
                .ok_or_else(|| StoreError::Internal("heartbeat no-op but no existing row found".to_string())),
        }
    }

    async fn get_session(&self, agent_id: &AgentId, workspace_id: &WorkspaceId) -> Result<Option<SessionRecord>, StoreError> {
        let row = sqlx::query(
            "SELECT agent_id, workspace_id, session_id, runtime, management_mode, resumable, status, last_heartbeat_at, updated_at
             FROM session_registry WHERE agent_id = $1 AND workspace_id = $2",
        )
        .bind(agent_id.as_str())
        .bind(workspace_id.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.map(|row| -> Result<SessionRecord, StoreError> {
            Ok(SessionRecord {
                agent_id: row.try_get::<String, _>("agent_id")?.into(),
                workspace_id: row.try_get::<String, _>("workspace_id")?.into(),
                session_id: row.try_get("session_id")?,
                runtime: row.try_get("runtime")?,
                management_mode: parse_management_mode(&row.try_get::<String, _>("management_mode")?),
                resumable: row.try_get("resumable")?,
                status: parse_session_status(&row.try_get::<String, _>("status")?),
                last_heartbeat_at: row.try_get("last_heartbeat_at")?,
                updated_at: row.try_get("updated_at")?,
            })
        })
        .transpose()
    }

    async fn reconcile_workspace_runtimes(
        &self,
        workspace_id: &WorkspaceId,
        stale_after_hours: i64,
        now: DateTime<Utc>,
    ) -> Result<RegistryReconciliation, StoreError> {
        let checked: i64 = sqlx::query_scalar("SELECT count(*) FROM session_registry WHERE workspace_id = $1")
            .bind(workspace_id.as_str())
            .fetch_one(&self.pool)
            .await?;

        let transitioned = sqlx::query(
            "UPDATE session_registry SET status = 'offline', updated_at = $1
             WHERE workspace_id = $2 AND status <> 'offline' AND last_heartbeat_at < $1 - ($3 || ' hours')::interval",
        )
        .bind(now)
        .bind(workspace_id.as_str())
        .bind(stale_after_hours.to_string())
        .execute(&self.pool)
        .await?
        .rows_affected();

        Ok(RegistryReconciliation {
            checked_runtimes: checked as u32,
            transitioned_offline: transitioned as u32,
        })
    }

    async fn deregister_runtime(&self, agent_id: &AgentId, workspace_id: &WorkspaceId, now: DateTime<Utc>) -> Result<(), StoreError> {
        sqlx::query("UPDATE session_registry SET status = 'offline', resumable = false, updated_at = $1 WHERE agent_id = $2 AND workspace_id = $3")
            .bind(now)
            .bind(agent_id.as_str())
            .bind(workspace_id.as_str())
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

#[async_trait]
impl SnapshotStore for PostgresStore {
    async fn list_reconcilable_threads(&self, workspace_id: &WorkspaceId, include_closed: bool) -> Result<Vec<Thread>, StoreError> {
        let rows = sqlx::query(
            "SELECT thread_id, workspace_id, title, type, status, escalation_owner, created_at, updated_at
             FROM threads WHERE workspace_id = $1 AND ($2 OR status <> 'closed') ORDER BY thread_id",
        )
        .bind(workspace_id.as_str())
        .bind(include_closed)
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| -> Result<Thread, StoreError> {
                Ok(Thread {
                    thread_id: row.try_get::<String, _>("thread_id")?.into(),
                    workspace_id: row.try_get::<String, _>("workspace_id")?.into(),
                    title: row.try_get("title")?,
                    kind: parse_thread_type(&row.try_get::<String, _>("type")?),
                    status: parse_thread_status(&row.try_get::<String, _>("status")?),
                    escalation_owner: row.try_get::<Option<String>, _>("escalation_owner")?.map(Into::into),
                    created_at: row.try_get("created_at")?,
                    updated_at: row.try_get("updated_at")?,
                })
            })
            .collect()
    }

    async fn get_thread(&self, thread_id: &ThreadId) -> Result<Option<Thread>, StoreError> {
        let row = sqlx::query(
            "SELECT thread_id, workspace_id, title, type, status, escalation_owner, created_at, updated_at FROM threads WHERE thread_id = $1",
        )
        .bind(thread_id.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.map(|row| -> Result<Thread, StoreError> {
            Ok(Thread {
                thread_id: row.try_get::<String, _>("thread_id")?.into(),
                workspace_id: row.try_get::<String, _>("workspace_id")?.into(),
                title: row.try_get("title")?,
                kind: parse_thread_type(&row.try_get::<String, _>("type")?),
                status: parse_thread_status(&row.try_get::<String, _>("status")?),
                escalation_owner: row.try_get::<Option<String>, _>("escalation_owner")?.map(Into::into),
                created_at: row.try_get("created_at")?,
                updated_at: row.try_get("updated_at")?,
            })
        })
        .transpose()
    }

    async fn update_thread(&self, thread: Thread) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO threads (thread_id, workspace_id, title, type, status, escalation_owner, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
             ON CONFLICT (thread_id) DO UPDATE SET status = EXCLUDED.status, escalation_owner = EXCLUDED.escalation_owner, updated_at = EXCLUDED.updated_at",
        )
        .bind(thread.thread_id.as_str())
        .bind(thread.workspace_id.as_str())
        .bind(&thread.title)
        .bind(thread_type_str(thread.kind))
        .bind(thread_status_str(thread.status))
        .bind(thread.escalation_owner.as_ref().map(|a| a.as_str()))
        .bind(thread.created_at)
        .bind(thread.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn list_participants(&self, thread_id: &ThreadId) -> Result<Vec<ThreadParticipant>, StoreError> {
        let rows = sqlx::query("SELECT thread_id, agent_id FROM thread_participants WHERE thread_id = $1 ORDER BY agent_id")
            .bind(thread_id.as_str())
            .fetch_all(&self.pool)
            .await?;
        rows.iter()
            .map(|row| -> Result<ThreadParticipant, StoreError> {
                Ok(ThreadParticipant {
                    thread_id: row.try_get::<String, _>("thread_id")?.into(),
                    agent_id: row.try_get::<String, _>("agent_id")?.into(),
                })
            })
            .collect()
    }

    async fn latest_seq(&self, thread_id: &ThreadId) -> Result<i64, StoreError> {
        let seq: Option<i64> = sqlx::query_scalar("SELECT max(seq) FROM messages WHERE thread_id = $1")
            .bind(thread_id.as_str())
            .fetch_one(&self.pool)
            .await?;
        Ok(seq.unwrap_or(0))
    }

    async fn get_cursor(&self, thread_id: &ThreadId, agent_id: &AgentId) -> Result<Option<ParticipantCursor>, StoreError> {
        let row = sqlx::query(
            "SELECT thread_id, agent_id, last_read_seq, last_acked_message_id, updated_at FROM participant_cursors WHERE thread_id = $1 AND agent_id = $2",
        )
        .bind(thread_id.as_str())
        .bind(agent_id.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.map(|row| -> Result<ParticipantCursor, StoreError> {
            Ok(ParticipantCursor {
                thread_id: row.try_get::<String, _>("thread_id")?.into(),
                agent_id: row.try_get::<String, _>("agent_id")?.into(),
                last_read_seq: row.try_get("last_read_seq")?,
                last_acked_message_id: row.try_get::<Option<String>, _>("last_acked_message_id")?.map(Into::into),
                updated_at: row.try_get("updated_at")?,
            })
        })
        .transpose()
    }

    async fn upsert_cursor(&self, cursor: ParticipantCursor) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO participant_cursors (thread_id, agent_id, last_read_seq, last_acked_message_id, updated_at)
             VALUES ($1, $2, $3, $4, $5)
             ON CONFLICT (thread_id, agent_id) DO UPDATE SET
                last_read_seq = EXCLUDED.last_read_seq, last_acked_message_id = EXCLUDED.last_acked_message_id, updated_at = EXCLUDED.updated_at
             WHERE participant_cursors.last_read_seq <= EXCLUDED.last_read_seq",
        )
        .bind(cursor.thread_id.as_str())
        .bind(cursor.agent_id.as_str())
        .bind(cursor.last_read_seq)
        .bind(cursor.last_acked_message_id.as_ref().map(|m| m.as_str()))
        .bind(cursor.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn append_message(&self, message: Message) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO messages (message_id, thread_id, schema_version, seq, sender_agent_id, sender_session_id, kind, body, metadata, in_reply_to, idempotency_key, created_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)",
        )
        .bind(message.message_id.as_str())
        .bind(message.thread_id.as_str())
        .bind(message.schema_version as i32)
        .bind(message.seq)
        .bind(message.sender_agent_id.as_str())
        .bind(&message.sender_session_id)
        .bind(match message.kind {
            MessageKind::Chat => "chat",
            MessageKind::Event => "event",
            MessageKind::System => "system",
        })
        .bind(&message.body)
        .bind(&message.metadata)
        .bind(message.in_reply_to.as_ref().map(|m| m.as_str()))
        .bind(&message.idempotency_key)
        .bind(message.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn list_messages(&self, thread_id: &ThreadId, limit: usize) -> Result<Vec<Message>, StoreError> {
        let rows = sqlx::query(
            "SELECT message_id, thread_id, schema_version, seq, sender_agent_id, sender_session_id, kind, body, metadata, in_reply_to, idempotency_key, created_at
             FROM messages WHERE thread_id = $1 ORDER BY seq DESC LIMIT $2",
        )
        .bind(thread_id.as_str())
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await?;

        let mut out = rows
            .iter()
            .map(|row| -> Result<Message, StoreError> {
                let kind_str: String = row.try_get("kind")?;
                Ok(Message {
                    message_id: row.try_get::<String, _>("message_id")?.into(),
                    thread_id: row.try_get::<String, _>("thread_id")?.into(),
                    schema_version: row.try_get::<i32, _>("schema_version")? as u32,
                    seq: row.try_get("seq")?,
                    sender_agent_id: row.try_get::<String, _>("sender_agent_id")?.into(),
                    sender_session_id: row.try_get("sender_session_id")?,
                    kind: match kind_str.as_str() {
                        "event" => MessageKind::Event,
                        "system" => MessageKind::System,
                        _ => MessageKind::Chat,
                    },
                    body: row.try_get("body")?,
                    metadata: row.try_get("metadata")?,
                    in_reply_to: row.try_get::<Option<String>, _>("in_reply_to")?.map(Into::into),
                    idempotency_key: row.try_get("idempotency_key")?,
                    created_at: row.try_get("created_at")?,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        out.reverse();
        Ok(out)
    }

    async fn has_ack_since(&self, thread_id: &ThreadId, target_agent_id: &AgentId, since: DateTime<Utc>) -> Result<bool, StoreError> {
        let count: i64 = sqlx::query_scalar(
            "SELECT count(*) FROM messages WHERE thread_id = $1 AND sender_agent_id = $2 AND created_at >= $3",
        )
        .bind(thread_id.as_str())
        .bind(target_agent_id.as_str())
        .bind(since)
        .fetch_one(&self.pool)
        .await?;
        Ok(count > 0)
    }
}

#[async_trait]
impl ReconciliationStateStore for PostgresStore {
    async fn get_reconciliation_state(&self, thread_id: &ThreadId, agent_id: &AgentId) -> Result<Option<ReconciliationState>, StoreError> {
        let row = sqlx::query("SELECT thread_id, agent_id, last_notified_seq, notified_at FROM reconciliation_state WHERE thread_id = $1 AND agent_id = $2")
            .bind(thread_id.as_str())
            .bind(agent_id.as_str())
            .fetch_optional(&self.pool)
            .await?;
        row.map(|row| -> Result<ReconciliationState, StoreError> {
            Ok(ReconciliationState {
                thread_id: row.try_get::<String, _>("thread_id")?.into(),
                agent_id: row.try_get::<String, _>("agent_id")?.into(),
                last_notified_seq: row.try_get("last_notified_seq")?,
                notified_at: row.try_get("notified_at")?,
            })
        })
        .transpose()
    }

    async fn mark_notified(&self, thread_id: &ThreadId, agent_id: &AgentId, last_notified_seq: i64, notified_at: DateTime<Utc>) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO reconciliation_state (thread_id, agent_id, last_notified_seq, notified_at) VALUES ($1, $2, $3, $4)
             ON CONFLICT (thread_id, agent_id) DO UPDATE SET last_notified_seq = EXCLUDED.last_notified_seq, notified_at = EXCLUDED.notified_at",
        )
        .bind(thread_id.as_str())
        .bind(agent_id.as_str())
        .bind(last_notified_seq)
        .bind(notified_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

#[async_trait]
impl TriggerStore for PostgresStore {
    async fn insert_job(&self, job: TriggerJob) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO trigger_jobs (trigger_id, thread_id, workspace_id, target_agent_id, target_session_id, reason, prompt, status, attempts, callback_attempts, max_retries, next_retry_at, observed_latest_seq, triggering_lease_expires_at, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16)",
        )
        .bind(job.trigger_id.as_str())
        .bind(job.thread_id.as_str())
        .bind(job.workspace_id.as_str())
        .bind(job.target_agent_id.as_str())
        .bind(&job.target_session_id)
        .bind(&job.reason)
        .bind(&job.prompt)
        .bind(trigger_status_str(job.status))
        .bind(job.attempts as i32)
        .bind(job.callback_attempts as i32)
        .bind(job.max_retries as i32)
        .bind(job.next_retry_at)
        .bind(job.observed_latest_seq)
        .bind(job.triggering_lease_expires_at)
        .bind(job.created_at)
        .bind(job.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get_job(&self, trigger_id: &TriggerId) -> Result<Option<TriggerJob>, StoreError> {
        let row = sqlx::query("SELECT * FROM trigger_jobs WHERE trigger_id = $1")
            .bind(trigger_id.as_str())
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(row_to_job).transpose()
    }

    async fn update_job(&self, job: TriggerJob) -> Result<(), StoreError> {
        sqlx::query(
            "UPDATE trigger_jobs SET status = $2, attempts = $3, callback_attempts = $4, next_retry_at = $5, triggering_lease_expires_at = $6, target_session_id = $7, updated_at = $8
             WHERE trigger_id = $1",
        )
        .bind(job.trigger_id.as_str())
        .bind(trigger_status_str(job.status))
        .bind(job.attempts as i32)
        .bind(job.callback_attempts as i32)
        .bind(job.next_retry_at)
        .bind(job.triggering_lease_expires_at)
        .bind(&job.target_session_id)
        .bind(job.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn find_active_job(&self, thread_id: &ThreadId, target_agent_id: &AgentId) -> Result<Option<TriggerJob>, StoreError> {
        let row = sqlx::query(
            "SELECT * FROM trigger_jobs WHERE thread_id = $1 AND target_agent_id = $2
             AND status IN ('queued','triggering','deferred','fallback_resume','fallback_spawn','callback_pending','callback_retry')
             ORDER BY created_at DESC LIMIT 1",
        )
        .bind(thread_id.as_str())
        .bind(target_agent_id.as_str())
        .fetch_optional(&self.pool)
        .await?;
        row.as_ref().map(row_to_job).transpose()
    }

    async fn max_terminal_observed_seq(&self, thread_id: &ThreadId, target_agent_id: &AgentId) -> Result<Option<i64>, StoreError> {
        let seq: Option<i64> = sqlx::query_scalar(
            "SELECT max(observed_latest_seq) FROM trigger_jobs WHERE thread_id = $1 AND target_agent_id = $2 AND status IN ('delivered', 'callback_delivered')",
        )
        .bind(thread_id.as_str())
        .bind(target_agent_id.as_str())
        .fetch_one(&self.pool)
        .await?;
        Ok(seq)
    }

    async fn count_pending_jobs(&self, workspace_id: &WorkspaceId) -> Result<u64, StoreError> {
        let count: i64 = sqlx::query_scalar(
            "SELECT count(*) FROM trigger_jobs WHERE workspace_id = $1
             AND status IN ('queued','triggering','deferred','callback_pending','callback_retry','fallback_resume','fallback_spawn')",
        )
        .bind(workspace_id.as_str())
        .fetch_one(&self.pool)
        .await?;
        Ok(count as u64)
    }

    async fn count_recent_triggers(&self, workspace_id: &WorkspaceId, target_agent_id: &AgentId, since: DateTime<Utc>) -> Result<u32, StoreError> {
        let count: i64 = sqlx::query_scalar("SELECT count(*) FROM trigger_jobs WHERE workspace_id = $1 AND target_agent_id = $2 AND created_at >= $3")
            .bind(workspace_id.as_str())
            .bind(target_agent_id.as_str())
            .bind(since)
            .fetch_one(&self.pool)
            .await?;
        Ok(count as u32)
    }

    async fn last_trigger_at(&self, workspace_id: &WorkspaceId, target_agent_id: &AgentId) -> Result<Option<DateTime<Utc>>, StoreError> {
        let at: Option<DateTime<Utc>> = sqlx::query_scalar("SELECT max(created_at) FROM trigger_jobs WHERE workspace_id = $1 AND target_agent_id = $2")
            .bind(workspace_id.as_str())
            .bind(target_agent_id.as_str())
            .fetch_one(&self.pool)
            .await?;
        Ok(at)
    }

    async fn claim_due_jobs(
        &self,
        workspace_id: &WorkspaceId,
        limit: u32,
        now: DateTime<Utc>,
        lease_timeout: chrono::Duration,
        min_created_at: Option<DateTime<Utc>>,
    ) -> Result<Vec<TriggerJob>, StoreError> {
        let lease_expires_at = now + lease_timeout;
        let rows = sqlx::query(
            r#"
            UPDATE trigger_jobs
               SET status = 'triggering', attempts = attempts + 1, updated_at = $1,
                   triggering_lease_expires_at = $2
             WHERE workspace_id = $3 AND trigger_id IN (
                SELECT trigger_id FROM trigger_jobs
                 WHERE workspace_id = $3 AND (
                    (status = 'queued' AND (next_retry_at IS NULL OR next_retry_at <= $1))
                 OR (status = 'deferred' AND next_retry_at <= $1)
                 OR (status IN ('triggering', 'callback_pending', 'callback_retry') AND triggering_lease_expires_at <= $1)
                 )
                 AND ($4::timestamptz IS NULL OR created_at >= $4)
                 ORDER BY COALESCE(next_retry_at, created_at) ASC
                 LIMIT $5
                 FOR UPDATE SKIP LOCKED)
            RETURNING *
            "#,
        )
        .bind(now)
        .bind(lease_expires_at)
        .bind(workspace_id.as_str())
        .bind(min_created_at)
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_job).collect()
    }

    async fn append_attempt(&self, attempt: TriggerAttempt) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO trigger_attempts (attempt_id, trigger_id, attempt_no, result, error_code, details, created_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7)",
        )
        .bind(attempt.attempt_id.as_str())
        .bind(attempt.trigger_id.as_str())
        .bind(attempt.attempt_no as i32)
        .bind(attempt_result_str(attempt.result))
        .bind(&attempt.error_code)
        .bind(&attempt.details)
        .bind(attempt.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn list_attempts(&self, trigger_id: &TriggerId) -> Result<Vec<TriggerAttempt>, StoreError> {
        let rows = sqlx::query("SELECT * FROM trigger_attempts WHERE trigger_id = $1 ORDER BY attempt_no ASC")
            .bind(trigger_id.as_str())
            .fetch_all(&self.pool)
            .await?;
        rows.iter()
            .map(|row| -> Result<TriggerAttempt, StoreError> {
                Ok(TriggerAttempt {
                    attempt_id: row.try_get::<String, _>("attempt_id")?.into(),
                    trigger_id: row.try_get::<String, _>("trigger_id")?.into(),
                    attempt_no: row.try_get::<i32, _>("attempt_no")? as u32,
                    result: parse_attempt_result(&row.try_get::<String, _>("result")?),
                    error_code: row.try_get("error_code")?,
                    details: row.try_get("details")?,
                    created_at: row.try_get("created_at")?,
                })
            })
            .collect()
    }

    async fn insert_fallback_run(&self, run: TriggerFallbackRun) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO trigger_fallback_runs (run_id, trigger_id, launch_mode, pid, started_at, finished_at, outcome)
             VALUES ($1, $2, $3, $4, $5, $6, $7)",
        )
        .bind(run.run_id.as_str())
        .bind(run.trigger_id.as_str())
        .bind(match run.launch_mode {
            sv_core::domain::LaunchMode::Resume => "resume",
            sv_core::domain::LaunchMode::Spawn => "spawn",
        })
        .bind(run.pid.map(|p| p as i64))
        .bind(run.started_at)
        .bind(run.finished_at)
        .bind(run.outcome.map(fallback_outcome_str))
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn update_fallback_run(&self, run: TriggerFallbackRun) -> Result<(), StoreError> {
        sqlx::query("UPDATE trigger_fallback_runs SET finished_at = $2, outcome = $3 WHERE run_id = $1")
            .bind(run.run_id.as_str())
            .bind(run.finished_at)
            .bind(run.outcome.map(fallback_outcome_str))
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn list_open_fallback_runs(&self, workspace_id: &WorkspaceId, limit: u32) -> Result<Vec<TriggerFallbackRun>, StoreError> {
        let rows = sqlx::query(
            "SELECT r.* FROM trigger_fallback_runs r JOIN trigger_jobs j ON j.trigger_id = r.trigger_id
             WHERE j.workspace_id = $1 AND r.finished_at IS NULL ORDER BY r.started_at ASC LIMIT $2",
        )
        .bind(workspace_id.as_str())
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await?;
        rows.iter()
            .map(|row| -> Result<TriggerFallbackRun, StoreError> {
                let mode: String = row.try_get("launch_mode")?;
                Ok(TriggerFallbackRun {
                    run_id: row.try_get::<String, _>("run_id")?.into(),
                    trigger_id: row.try_get::<String, _>("trigger_id")?.into(),
                    launch_mode: if mode == "spawn" {
                        sv_core::domain::LaunchMode::Spawn
                    } else {
                        sv_core::domain::LaunchMode::Resume
                    },
                    pid: row.try_get::<Option<i64>, _>("pid")?.map(|p| p as u32),
                    started_at: row.try_get("started_at")?,
                    finished_at: row.try_get("finished_at")?,
                    outcome: None,
                })
            })
            .collect()
    }

    async fn list_jobs_by_status(&self, thread_id: &ThreadId, statuses: &[TriggerStatus], limit: usize) -> Result<Vec<TriggerJob>, StoreError> {
        let status_strs: Vec<&'static str> = statuses.iter().map(|s| trigger_status_str(*s)).collect();
        let rows = sqlx::query("SELECT * FROM trigger_jobs WHERE thread_id = $1 AND status = ANY($2) ORDER BY created_at DESC LIMIT $3")
            .bind(thread_id.as_str())
            .bind(&status_strs[..])
            .bind(limit as i64)
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(row_to_job).collect()
    }

    async fn list_due_callback_jobs(&self, workspace_id: &WorkspaceId, limit: usize, now: DateTime<Utc>) -> Result<Vec<TriggerJob>, StoreError> {
        let rows = sqlx::query(
            "SELECT * FROM trigger_jobs
              WHERE workspace_id = $1 AND status IN ('callback_pending', 'callback_retry')
                AND (next_retry_at IS NULL OR next_retry_at <= $2)
              ORDER BY COALESCE(next_retry_at, created_at) ASC
              LIMIT $3",
        )
        .bind(workspace_id.as_str())
        .bind(now)
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(row_to_job).collect()
    }
}

#[async_trait]
impl AuditStore for PostgresStore {
    async fn append_audit_event(&self, event: AuditEvent) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO audit_events (audit_id, workspace_id, actor_agent_id, action, subject_thread_id, reason, metadata, created_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
        )
        .bind(event.audit_id.as_str())
        .bind(event.workspace_id.as_str())
        .bind(event.actor_agent_id.as_str())
        .bind(&event.action)
        .bind(event.subject_thread_id.as_ref().map(|t| t.as_str()))
        .bind(&event.reason)
        .bind(&event.metadata)
        .bind(event.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn list_audit_events(&self, thread_id: &ThreadId, limit: usize) -> Result<Vec<AuditEvent>, StoreError> {
        let rows = sqlx::query("SELECT * FROM audit_events WHERE subject_thread_id = $1 ORDER BY created_at DESC LIMIT $2")
            .bind(thread_id.as_str())
            .bind(limit as i64)
            .fetch_all(&self.pool)
            .await?;
        rows.iter()
            .map(|row| -> Result<AuditEvent, StoreError> {
                Ok(AuditEvent {
                    audit_id: row.try_get::<String, _>("audit_id")?.into(),
                    workspace_id: row.try_get::<String, _>("workspace_id")?.into(),
                    actor_agent_id: row.try_get::<String, _>("actor_agent_id")?.into(),
                    action: row.try_get("action")?,
                    subject_thread_id: row.try_get::<Option<String>, _>("subject_thread_id")?.map(Into::into),
                    reason: row.try_get("reason")?,
                    metadata: row.try_get("metadata")?,
                    created_at: row.try_get("created_at")?,
                })
            })
            .collect()
    }
}
