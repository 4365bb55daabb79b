// SPDX-License-Identifier: MIT
// Copyright (c) 2026 the sv contributors

use super::*;

#[test]
fn terminal_statuses_match_spec() {
    assert!(TriggerStatus::CallbackDelivered.is_terminal());
    assert!(TriggerStatus::CallbackFailed.is_terminal());
    assert!(TriggerStatus::Failed.is_terminal());
    assert!(!TriggerStatus::Delivered.is_terminal());
    assert!(!TriggerStatus::Queued.is_terminal());
}

#[test]
fn claimable_statuses_are_queued_deferred_or_callback_retry() {
    assert!(TriggerStatus::Queued.is_claimable());
    assert!(TriggerStatus::Deferred.is_claimable());
    assert!(TriggerStatus::CallbackRetry.is_claimable());
    assert!(!TriggerStatus::Triggering.is_claimable());
    assert!(!TriggerStatus::CallbackDelivered.is_claimable());
}

#[test]
fn retryable_attempt_results_are_ack_timeout_pane_dead_send_keys() {
    assert!(AttemptResult::AckTimeout.is_retryable());
    assert!(AttemptResult::PaneDead.is_retryable());
    assert!(AttemptResult::SendKeysError.is_retryable());
    assert!(!AttemptResult::TargetNotFound.is_retryable());
    assert!(!AttemptResult::UnsupportedRuntime.is_retryable());
}

#[test]
fn retries_exhausted_at_max() {
    let mut job = sample_job();
    job.max_retries = 2;
    job.attempts = 1;
    assert!(!job.retries_exhausted());
    job.attempts = 2;
    assert!(job.retries_exhausted());
}

fn sample_job() -> TriggerJob {
    TriggerJob {
        trigger_id: crate::id::TriggerId::from("trg_1"),
        thread_id: crate::id::ThreadId::from("thr_1"),
        workspace_id: crate::id::WorkspaceId::from("wsp_1"),
        target_agent_id: crate::id::AgentId::from("agt_1"),
        target_session_id: None,
        reason: "unread".into(),
        prompt: "hello".into(),
        status: TriggerStatus::Queued,
        attempts: 0,
        callback_attempts: 0,
        max_retries: 2,
        next_retry_at: None,
        observed_latest_seq: 1,
        triggering_lease_expires_at: None,
        created_at: chrono::Utc::now(),
        updated_at: chrono::Utc::now(),
    }
}
