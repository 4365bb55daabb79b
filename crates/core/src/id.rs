// SPDX-License-Identifier: MIT
// Copyright (c) 2026 the sv contributors

use std::borrow::Borrow;
use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Declares a newtype wrapper around an opaque string id with a fixed prefix,
/// e.g. `trg_9c2f...`. Mirrors the prefixed-id convention used throughout the
/// store schema in `SPEC_FULL.md` §3.
macro_rules! define_id {
    ($name:ident, $prefix:expr) => {
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub const PREFIX: &'static str = $prefix;

            pub fn new(uuid: Uuid) -> Self {
                Self(format!("{}_{}", $prefix, uuid.simple()))
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// First 8 hex characters after the prefix, for log lines.
            pub fn short(&self) -> &str {
                let body = self.0.strip_prefix(concat!($prefix, "_")).unwrap_or(&self.0);
                &body[..body.len().min(8)]
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_string())
            }
        }

        impl PartialEq<str> for $name {
            fn eq(&self, other: &str) -> bool {
                self.0 == other
            }
        }

        impl Borrow<str> for $name {
            fn borrow(&self) -> &str {
                &self.0
            }
        }
    };
}

define_id!(ThreadId, "thr");
define_id!(MessageId, "msg");
define_id!(AgentId, "agt");
define_id!(WorkspaceId, "wsp");
define_id!(TriggerId, "trg");
define_id!(AttemptId, "att");
define_id!(RunId, "run");
define_id!(AuditId, "aud");

/// Mints opaque ids. Production code uses [`UuidIdGen`]; tests that need
/// predictable, ordered ids use [`SequentialIdGen`].
pub trait IdGen: Send + Sync {
    fn thread_id(&self) -> ThreadId;
    fn message_id(&self) -> MessageId;
    fn trigger_id(&self) -> TriggerId;
    fn attempt_id(&self) -> AttemptId;
    fn run_id(&self) -> RunId;
    fn audit_id(&self) -> AuditId;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct UuidIdGen;

impl IdGen for UuidIdGen {
    fn thread_id(&self) -> ThreadId {
        ThreadId::new(Uuid::new_v4())
    }

    fn message_id(&self) -> MessageId {
        MessageId::new(Uuid::new_v4())
    }

    fn trigger_id(&self) -> TriggerId {
        TriggerId::new(Uuid::new_v4())
    }

    fn attempt_id(&self) -> AttemptId {
        AttemptId::new(Uuid::new_v4())
    }

    fn run_id(&self) -> RunId {
        RunId::new(Uuid::new_v4())
    }

    fn audit_id(&self) -> AuditId {
        AuditId::new(Uuid::new_v4())
    }
}

/// Deterministic id generator for tests: each call bumps a shared counter and
/// formats it into a fixed-width suffix instead of a random UUID.
pub struct SequentialIdGen {
    counter: std::sync::atomic::AtomicU64,
}

impl Default for SequentialIdGen {
    fn default() -> Self {
        Self {
            counter: std::sync::atomic::AtomicU64::new(1),
        }
    }
}

impl SequentialIdGen {
    fn next(&self) -> Uuid {
        let n = self.counter.fetch_add(1, std::sync::atomic::Ordering::Relaxed);
        Uuid::from_u128(n as u128)
    }
}

impl IdGen for SequentialIdGen {
    fn thread_id(&self) -> ThreadId {
        ThreadId::new(self.next())
    }

    fn message_id(&self) -> MessageId {
        MessageId::new(self.next())
    }

    fn trigger_id(&self) -> TriggerId {
        TriggerId::new(self.next())
    }

    fn attempt_id(&self) -> AttemptId {
        AttemptId::new(self.next())
    }

    fn run_id(&self) -> RunId {
        RunId::new(self.next())
    }

    fn audit_id(&self) -> AuditId {
        AuditId::new(self.next())
    }
}

#[cfg(test)]
#[path = "id_tests.rs"]
mod tests;
