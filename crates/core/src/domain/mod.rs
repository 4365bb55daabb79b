// SPDX-License-Identifier: MIT
// Copyright (c) 2026 the sv contributors

pub mod audit;
pub mod cursor;
pub mod fallback_run;
pub mod message;
pub mod payload;
pub mod reconciliation;
pub mod session;
pub mod thread;
pub mod trigger;

pub use audit::AuditEvent;
pub use cursor::ParticipantCursor;
pub use fallback_run::{FallbackOutcome, TriggerFallbackRun};
pub use message::{Message, MessageKind};
pub use payload::{prepare_trigger_payload, TriggerPayload, DEFAULT_MAX_PAYLOAD_BYTES};
pub use reconciliation::ReconciliationState;
pub use session::{Heartbeat, ManagementMode, SessionRecord, SessionStatus};
pub use thread::{Thread, ThreadParticipant, ThreadStatus, ThreadType};
pub use trigger::{AttemptResult, LaunchMode, TriggerAttempt, TriggerJob, TriggerStatus};
