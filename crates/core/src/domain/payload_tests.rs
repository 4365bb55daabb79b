// SPDX-License-Identifier: MIT
// Copyright (c) 2026 the sv contributors

use super::*;

fn tid() -> TriggerId {
    TriggerId::from("trg_1")
}

fn thid() -> ThreadId {
    ThreadId::from("thr_1")
}

#[test]
fn round_trips_sanitized_prompt_through_body_lines() {
    let payload = prepare_trigger_payload(&tid(), &thid(), "unread", "hello\nworld", DEFAULT_MAX_PAYLOAD_BYTES).unwrap();
    assert_eq!(payload.body_lines().join("\n"), "hello\nworld");
}

#[test]
fn normalizes_crlf_and_cr_line_endings() {
    let payload = prepare_trigger_payload(&tid(), &thid(), "r", "a\r\nb\rc", DEFAULT_MAX_PAYLOAD_BYTES).unwrap();
    assert_eq!(payload.body_lines().join("\n"), "a\nb\nc");
}

#[test]
fn drops_disallowed_c0_controls_but_keeps_tab() {
    let prompt = "a\x01b\tc\x7f";
    let payload = prepare_trigger_payload(&tid(), &thid(), "r", prompt, DEFAULT_MAX_PAYLOAD_BYTES).unwrap();
    assert_eq!(payload.body_lines().join("\n"), "ab\tc");
}

#[test]
fn trims_trailing_whitespace_and_drops_trailing_blank_lines() {
    let payload = prepare_trigger_payload(&tid(), &thid(), "r", "hello   \n\n\n", DEFAULT_MAX_PAYLOAD_BYTES).unwrap();
    assert_eq!(payload.body_lines(), &["hello"]);
}

#[test]
fn empty_or_whitespace_only_prompt_is_rejected() {
    let err = prepare_trigger_payload(&tid(), &thid(), "r", "   \n\t\n", DEFAULT_MAX_PAYLOAD_BYTES).unwrap_err();
    assert_eq!(err.code(), "TRIGGER_PAYLOAD_EMPTY");
}

#[test]
fn oversized_prompt_is_rejected() {
    let prompt = "x".repeat(100);
    let err = prepare_trigger_payload(&tid(), &thid(), "r", &prompt, 10).unwrap_err();
    assert_eq!(err.code(), "TRIGGER_PAYLOAD_TOO_LARGE");
}

#[test]
fn frames_with_header_and_footer_markers() {
    let payload = prepare_trigger_payload(&tid(), &thid(), "unread", "hi", DEFAULT_MAX_PAYLOAD_BYTES).unwrap();
    assert_eq!(
        payload.header(),
        "[BRIDGE_TRIGGER id=trg_1 thread=thr_1 reason=unread]"
    );
    assert_eq!(payload.lines.last().unwrap(), "[/BRIDGE_TRIGGER]");
}
