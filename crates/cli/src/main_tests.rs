// SPDX-License-Identifier: MIT
// Copyright (c) 2026 the sv contributors

use clap::Parser;

use super::*;

#[test]
fn parses_escalate_thread_with_defaults() {
    let cli = Cli::parse_from(["svctl", "escalate-thread", "--thread-id", "thr_1", "--reason", "stuck"]);
    match cli.command {
        Commands::EscalateThread(args) => {
            assert_eq!(args.thread_id, "thr_1");
            assert_eq!(args.reason, "stuck");
            assert_eq!(args.actor_agent_id, "human_operator");
            assert!(!args.json);
        }
        _ => panic!("expected EscalateThread"),
    }
}

#[test]
fn parses_override_close_thread_with_actor_override_and_json() {
    let cli = Cli::parse_from([
        "svctl",
        "override-close-thread",
        "--thread-id",
        "thr_1",
        "--reason",
        "operator override",
        "--actor-agent-id",
        "agt_ops",
        "--json",
    ]);
    match cli.command {
        Commands::OverrideCloseThread(args) => {
            assert_eq!(args.actor_agent_id, "agt_ops");
            assert!(args.json);
        }
        _ => panic!("expected OverrideCloseThread"),
    }
}

#[test]
fn inspect_thread_missing_required_flag_is_a_usage_error() {
    let err = Cli::try_parse_from(["svctl", "inspect-thread"]).unwrap_err();
    assert_eq!(err.kind(), clap::error::ErrorKind::MissingRequiredArgument);
}

#[test]
fn inspect_thread_defaults_limits_to_twenty() {
    let cli = Cli::parse_from(["svctl", "inspect-thread", "--thread-id", "thr_1"]);
    match cli.command {
        Commands::InspectThread(args) => {
            assert_eq!(args.limit_messages, 20);
            assert_eq!(args.limit_triggers, 20);
        }
        _ => panic!("expected InspectThread"),
    }
}
