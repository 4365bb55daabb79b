// SPDX-License-Identifier: MIT
// Copyright (c) 2026 the sv contributors

use super::*;

#[test]
fn prefixed_ids_render_with_prefix() {
    let gen = UuidIdGen;
    let id = gen.trigger_id();
    assert!(id.as_str().starts_with("trg_"));
    assert_eq!(id.to_string(), id.as_str());
}

#[test]
fn short_strips_prefix() {
    let id = ThreadId::from("thr_0123456789abcdef");
    assert_eq!(id.short(), "01234567");
}

#[test]
fn sequential_ids_are_distinct_and_ordered() {
    let gen = SequentialIdGen::default();
    let a = gen.trigger_id();
    let b = gen.trigger_id();
    assert_ne!(a, b);
}

#[test]
fn eq_str_compares_inner_value() {
    let id = AgentId::from("agt_abc");
    assert_eq!(id.as_str(), "agt_abc");
}
