// SPDX-License-Identifier: MIT
// Copyright (c) 2026 the sv contributors

//! `supervisord`: drives one [`sv_engine::SupervisorLoop`] tick per
//! `WORKER_POLL_INTERVAL_MS`, for a single workspace, until asked to stop
//! (SPEC_FULL.md §4.9).

use std::sync::Arc;

use sv_adapters::{CodexLauncher, ReqwestCallbackClient, TmuxPtyAdapter};
use sv_core::id::UuidIdGen;
use sv_daemon::Config;
use sv_engine::{SupervisorLoop, TickInput};
use sv_storage::postgres::PostgresStore;
use tokio::signal::unix::{signal, SignalKind};
use tracing::{error, info, warn};

#[tokio::main]
async fn main() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config = match Config::load() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("error: invalid configuration: {e}");
            std::process::exit(1);
        }
    };

    info!(workspace_id = %config.workspace_id, "supervisord starting");

    let store = match PostgresStore::connect(&config.database_url, 10).await {
        Ok(store) => store,
        Err(e) => {
            error!(error = %e, "failed to connect to database");
            std::process::exit(1);
        }
    };
    if let Err(e) = store.apply_schema().await {
        error!(error = %e, "failed to apply database schema");
        std::process::exit(1);
    }

    let supervisor = SupervisorLoop::new(
        store,
        TmuxPtyAdapter::new(),
        CodexLauncher::new(),
        ReqwestCallbackClient::new(),
        Arc::new(UuidIdGen),
        &config.engine,
    );

    #[allow(clippy::expect_used)]
    let mut sigterm = signal(SignalKind::terminate()).expect("failed to install SIGTERM handler");
    #[allow(clippy::expect_used)]
    let mut sigint = signal(SignalKind::interrupt()).expect("failed to install SIGINT handler");

    info!(poll_interval_ms = config.engine.worker_poll_interval.as_millis(), "entering tick loop");

    // `interval` is created once outside the loop: `tokio::select!` re-evaluates
    // every branch on each iteration, so a fresh `sleep()` inside the loop body
    // would reset the cadence on every event instead of ticking on schedule.
    let mut interval = tokio::time::interval(config.engine.worker_poll_interval);

    loop {
        tokio::select! {
            _ = interval.tick() => {}
            _ = sigterm.recv() => {
                info!("received SIGTERM, shutting down");
                break;
            }
            _ = sigint.recv() => {
                info!("received SIGINT, shutting down");
                break;
            }
        }

        let tick_at = chrono::Utc::now();
        let tick_input = TickInput { workspace_id: config.workspace_id.clone(), tick_at, include_closed_threads: false };
        match supervisor.run_tick(tick_input, &config.engine).await {
            Ok(stats) => info!(
                enqueued = stats.schedule.enqueued,
                claimed = stats.queue.claimed,
                delivered = stats.queue.delivered,
                callback_posted = stats.callback.posted,
                "tick complete"
            ),
            Err(e) => warn!(error = %e, code = e.code(), "tick failed, continuing to next tick"),
        }
    }

    info!("supervisord stopped");
}
