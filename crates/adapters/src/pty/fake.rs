// SPDX-License-Identifier: MIT
// Copyright (c) 2026 the sv contributors

//! Fake PTY adapter for testing the delivery algorithm without tmux.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;

use super::{PaneProbe, PtyAdapter, PtyError};

#[derive(Debug, Clone)]
pub enum PtyCall {
    Probe { target: String },
    SendLine { target: String, line: String },
    SendEnter { target: String },
}

struct FakeState {
    probes: HashMap<String, PaneProbe>,
    calls: Vec<PtyCall>,
    fail_send_for: Option<String>,
}

#[derive(Clone)]
pub struct FakePtyAdapter {
    inner: Arc<Mutex<FakeState>>,
}

impl Default for FakePtyAdapter {
    fn default() -> Self {
        Self {
            inner: Arc::new(Mutex::new(FakeState {
                probes: HashMap::new(),
                calls: Vec::new(),
                fail_send_for: None,
            })),
        }
    }
}

impl FakePtyAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_probe(&self, target: &str, probe: PaneProbe) {
        self.inner.lock().probes.insert(target.to_string(), probe);
    }

    pub fn fail_sends_for(&self, target: &str) {
        self.inner.lock().fail_send_for = Some(target.to_string());
    }

    pub fn calls(&self) -> Vec<PtyCall> {
        self.inner.lock().calls.clone()
    }
}

#[async_trait]
impl PtyAdapter for FakePtyAdapter {
    async fn probe_pane(&self, target: &str) -> Result<PaneProbe, PtyError> {
        let mut inner = self.inner.lock();
        inner.calls.push(PtyCall::Probe { target: target.to_string() });
        inner
            .probes
            .get(target)
            .cloned()
            .ok_or_else(|| PtyError::TargetNotFound(target.to_string()))
    }

    async fn send_literal_line(&self, target: &str, line: &str) -> Result<(), PtyError> {
        let mut inner = self.inner.lock();
        inner.calls.push(PtyCall::SendLine {
            target: target.to_string(),
            line: line.to_string(),
        });
        if inner.fail_send_for.as_deref() == Some(target) {
            return Err(PtyError::SendKeysError("fake send failure".to_string()));
        }
        Ok(())
    }

    async fn send_enter(&self, target: &str) -> Result<(), PtyError> {
        let mut inner = self.inner.lock();
        inner.calls.push(PtyCall::SendEnter { target: target.to_string() });
        if inner.fail_send_for.as_deref() == Some(target) {
            return Err(PtyError::SendKeysError("fake send failure".to_string()));
        }
        Ok(())
    }
}
