// SPDX-License-Identifier: MIT
// Copyright (c) 2026 the sv contributors

//! Fake launcher for testing the Fallback Executor without spawning real processes.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::{HashSet, VecDeque};
use std::sync::Arc;

use super::{LaunchResult, ProcessLauncher};

#[derive(Debug, Clone)]
pub enum LauncherCall {
    Resume { session_id: String, prompt: String, allow_dangerous_bypass: bool },
    Spawn { prompt: String, allow_dangerous_bypass: bool },
    Terminate { pid: u32 },
    ForceKill { pid: u32 },
}

struct FakeState {
    calls: Vec<LauncherCall>,
    resume_results: VecDeque<LaunchResult>,
    spawn_results: VecDeque<LaunchResult>,
    alive: HashSet<u32>,
}

#[derive(Clone)]
pub struct FakeLauncher {
    inner: Arc<Mutex<FakeState>>,
}

impl Default for FakeLauncher {
    fn default() -> Self {
        Self {
            inner: Arc::new(Mutex::new(FakeState {
                calls: Vec::new(),
                resume_results: VecDeque::new(),
                spawn_results: VecDeque::new(),
                alive: HashSet::new(),
            })),
        }
    }
}

impl FakeLauncher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_resume_result(&self, result: LaunchResult) {
        self.inner.lock().resume_results.push_back(result);
    }

    pub fn push_spawn_result(&self, result: LaunchResult) {
        self.inner.lock().spawn_results.push_back(result);
    }

    pub fn calls(&self) -> Vec<LauncherCall> {
        self.inner.lock().calls.clone()
    }

    /// Marks `pid` as still running, so `is_alive` returns true until it is
    /// force-killed or explicitly marked dead.
    pub fn mark_alive(&self, pid: u32) {
        self.inner.lock().alive.insert(pid);
    }
}

#[async_trait]
impl ProcessLauncher for FakeLauncher {
    async fn resume(&self, session_id: &str, prompt: &str, allow_dangerous_bypass: bool) -> LaunchResult {
        let mut inner = self.inner.lock();
        inner.calls.push(LauncherCall::Resume {
            session_id: session_id.to_string(),
            prompt: prompt.to_string(),
            allow_dangerous_bypass,
        });
        inner.resume_results.pop_front().unwrap_or_else(|| LaunchResult::failed("no fake result queued"))
    }

    async fn spawn(&self, prompt: &str, allow_dangerous_bypass: bool) -> LaunchResult {
        let mut inner = self.inner.lock();
        inner.calls.push(LauncherCall::Spawn {
            prompt: prompt.to_string(),
            allow_dangerous_bypass,
        });
        inner.spawn_results.pop_front().unwrap_or_else(|| LaunchResult::failed("no fake result queued"))
    }

    async fn terminate(&self, pid: u32) {
        self.inner.lock().calls.push(LauncherCall::Terminate { pid });
    }

    async fn force_kill(&self, pid: u32) {
        let mut inner = self.inner.lock();
        inner.calls.push(LauncherCall::ForceKill { pid });
        inner.alive.remove(&pid);
    }

    async fn is_alive(&self, pid: u32) -> bool {
        self.inner.lock().alive.contains(&pid)
    }
}
