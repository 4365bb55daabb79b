// SPDX-License-Identifier: MIT
// Copyright (c) 2026 the sv contributors

//! `svctl`: operator CLI for inspecting and force-transitioning threads
//! directly against the persisted store, with no bridge round-trip
//! (SPEC_FULL.md §6).

mod commands;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use sv_storage::postgres::PostgresStore;

use commands::{escalate, inspect, override_close, unblock};

#[derive(Parser, Debug)]
#[command(name = "svctl", version, about = "Operator tool for the thread-bridge supervisor store")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Show a thread's participants, recent messages, and recent trigger jobs
    InspectThread(inspect::InspectThreadArgs),
    /// Force a thread to `blocked` and record the caller as escalation owner
    EscalateThread(escalate::EscalateThreadArgs),
    /// Return an escalated thread to `active`
    UnblockThread(unblock::UnblockThreadArgs),
    /// Force a thread to `closed` regardless of its current status
    OverrideCloseThread(override_close::OverrideCloseThreadArgs),
}

#[tokio::main]
async fn main() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();

    // Parse errors and --help/--version are handled by clap itself before we
    // get here: usage errors exit 2, help/version exit 0 (SPEC_FULL.md §6).
    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let database_url = std::env::var("DATABASE_URL").context("missing required environment variable DATABASE_URL")?;
    let store = PostgresStore::connect(&database_url, 5).await.context("failed to connect to database")?;

    match cli.command {
        Commands::InspectThread(args) => inspect::handle(args, &store).await,
        Commands::EscalateThread(args) => escalate::handle(args, &store).await,
        Commands::UnblockThread(args) => unblock::handle(args, &store).await,
        Commands::OverrideCloseThread(args) => override_close::handle(args, &store).await,
    }
}

#[cfg(test)]
#[path = "main_tests.rs"]
mod tests;
