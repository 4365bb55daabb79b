// SPDX-License-Identifier: MIT
// Copyright (c) 2026 the sv contributors

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;

use super::{CallbackClient, CallbackOutcome, CallbackRequest};

#[derive(Debug, Clone)]
pub struct CallbackCall {
    pub trigger_id: String,
    pub callback_attempt_no: u32,
    pub body: serde_json::Value,
}

struct FakeState {
    calls: Vec<CallbackCall>,
    results: VecDeque<CallbackOutcome>,
}

#[derive(Clone)]
pub struct FakeCallbackClient {
    inner: Arc<Mutex<FakeState>>,
}

impl Default for FakeCallbackClient {
    fn default() -> Self {
        Self {
            inner: Arc::new(Mutex::new(FakeState { calls: Vec::new(), results: VecDeque::new() })),
        }
    }
}

impl FakeCallbackClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_result(&self, outcome: CallbackOutcome) {
        self.inner.lock().results.push_back(outcome);
    }

    pub fn calls(&self) -> Vec<CallbackCall> {
        self.inner.lock().calls.clone()
    }
}

#[async_trait]
impl CallbackClient for FakeCallbackClient {
    async fn post(&self, request: CallbackRequest) -> CallbackOutcome {
        let mut inner = self.inner.lock();
        inner.calls.push(CallbackCall {
            trigger_id: request.trigger_id.as_str().to_string(),
            callback_attempt_no: request.callback_attempt_no,
            body: request.body(),
        });
        inner.results.pop_front().unwrap_or(CallbackOutcome::Delivered)
    }
}
