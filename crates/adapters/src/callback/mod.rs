// SPDX-License-Identifier: MIT
// Copyright (c) 2026 the sv contributors

//! Callback Poster (C8): reports a trigger job's terminal outcome back to the
//! bridge collaborator over HTTP (SPEC_FULL.md §4.7).

mod http;

pub use http::ReqwestCallbackClient;

#[cfg(any(test, feature = "test-support"))]
mod fake;
#[cfg(any(test, feature = "test-support"))]
pub use fake::{CallbackCall, FakeCallbackClient};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::{json, Value};
use std::time::Duration;

use sv_core::id::{AgentId, ThreadId, TriggerId};

#[derive(Debug, Clone)]
pub struct CallbackRequest {
    pub base_url: String,
    pub token: String,
    pub thread_id: ThreadId,
    pub trigger_id: TriggerId,
    pub job_id: String,
    pub target_agent_id: AgentId,
    pub trigger_reason: String,
    pub trigger_outcome: String,
    pub trigger_attempt_no: u32,
    pub trigger_error_code: Option<String>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub callback_attempt_no: u32,
    pub timeout: Duration,
}

impl CallbackRequest {
    pub fn body(&self) -> Value {
        json!({
            "thread_id": self.thread_id.as_str(),
            "schema_version": 1,
            "kind": "event",
            "body": format!("Worker callback for trigger {}: {}.", self.trigger_id, self.trigger_outcome),
            "metadata": {
                "event_version": 1,
                "event_type": "trigger.completed",
                "suppress_auto_trigger": true,
                "trigger_id": self.trigger_id.as_str(),
                "job_id": self.job_id,
                "target_agent_id": self.target_agent_id.as_str(),
                "trigger_reason": self.trigger_reason,
                "trigger_outcome": self.trigger_outcome,
                "trigger_attempt_no": self.trigger_attempt_no,
                "trigger_error_code": self.trigger_error_code,
                "started_at": self.started_at.to_rfc3339(),
                "finished_at": self.finished_at.to_rfc3339(),
                "callback_attempt_no": self.callback_attempt_no,
            },
            "idempotency_key": format!("trigger-callback:{}:v1", self.trigger_id),
        })
    }

    pub fn url(&self) -> String {
        format!("{}/v1/mcp/post_message", self.base_url.trim_end_matches('/'))
    }
}

/// Classified result of a callback POST, per the HTTP-status table in
/// SPEC_FULL.md §4.7. Never an `Err` — classification is the contract.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallbackOutcome {
    Delivered,
    Retry { error_code: String, retry_after_ms: Option<u64> },
    Failed { error_code: String },
}

#[async_trait]
pub trait CallbackClient: Clone + Send + Sync + 'static {
    async fn post(&self, request: CallbackRequest) -> CallbackOutcome;
}

/// Parses a `Retry-After` header value: either a delay in whole seconds or
/// an HTTP-date. Returns `None` if neither form parses.
pub(crate) fn parse_retry_after(value: &str) -> Option<u64> {
    if let Ok(secs) = value.trim().parse::<u64>() {
        return Some(secs * 1000);
    }
    DateTime::parse_from_rfc2822(value.trim())
        .ok()
        .map(|at| (at.with_timezone(&Utc) - Utc::now()).num_milliseconds().max(0) as u64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_retry_after_accepts_seconds() {
        assert_eq!(parse_retry_after("5"), Some(5000));
    }

    #[test]
    fn parse_retry_after_rejects_garbage() {
        assert_eq!(parse_retry_after("not-a-date"), None);
    }
}
