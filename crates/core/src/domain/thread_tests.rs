// SPDX-License-Identifier: MIT
// Copyright (c) 2026 the sv contributors

use super::*;

#[test]
fn active_can_move_to_blocked_resolved_or_closed() {
    assert!(ThreadStatus::Active.can_transition_to(ThreadStatus::Blocked));
    assert!(ThreadStatus::Active.can_transition_to(ThreadStatus::Resolved));
    assert!(ThreadStatus::Active.can_transition_to(ThreadStatus::Closed));
}

#[test]
fn blocked_can_return_to_active_or_close() {
    assert!(ThreadStatus::Blocked.can_transition_to(ThreadStatus::Active));
    assert!(ThreadStatus::Blocked.can_transition_to(ThreadStatus::Closed));
    assert!(!ThreadStatus::Blocked.can_transition_to(ThreadStatus::Resolved));
}

#[test]
fn closed_is_terminal() {
    assert!(!ThreadStatus::Closed.can_transition_to(ThreadStatus::Active));
    assert!(!ThreadStatus::Closed.can_transition_to(ThreadStatus::Blocked));
    assert!(!ThreadStatus::Closed.can_transition_to(ThreadStatus::Resolved));
}

#[test]
fn invalid_transition_is_rejected_with_domain_error() {
    let err = ThreadStatus::Resolved
        .validate_transition(ThreadStatus::Active)
        .unwrap_err();
    assert_eq!(err.code(), "INVALID_THREAD_TRANSITION");
}

#[test]
fn only_closed_is_excluded_from_reconciliation() {
    assert!(ThreadStatus::Active.is_reconcilable());
    assert!(ThreadStatus::Blocked.is_reconcilable());
    assert!(ThreadStatus::Resolved.is_reconcilable());
    assert!(!ThreadStatus::Closed.is_reconcilable());
}
