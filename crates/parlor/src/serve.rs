// SPDX-FileCopyrightText: 2026 Parlor Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `parlor serve` command implementation.
//!
//! Wires the SQLite session store, the chat service, the live fanout, and
//! the two background sweeps together, then runs the gateway until a
//! shutdown signal arrives. The fanout is constructed here and passed by
//! reference to everything that publishes; nothing looks it up from
//! ambient state.

use std::sync::Arc;

use parlor_chat::{ChatFanout, ChatService, InactivityReaper, RetentionPurger, shutdown};
use parlor_config::ParlorConfig;
use parlor_core::{ChatError, ChatStorage};
use parlor_gateway::{GatewayState, server};
use parlor_storage::SqliteStorage;
use tracing::{info, warn};

/// Runs the `parlor serve` command.
///
/// Initializes storage (running migrations), spawns the inactivity reaper
/// and retention purger on the shutdown token, and serves the gateway.
/// Returns once a shutdown signal has drained the server.
pub async fn run_serve(config: ParlorConfig) -> Result<(), ChatError> {
    init_tracing(&config.service.log_level);

    info!(service = config.service.name.as_str(), "starting parlor serve");

    if config.server.customer_token.is_none() || config.server.admin_token.is_none() {
        warn!(
            "no bearer token configured for one or both scopes -- those routes reject all requests"
        );
    }

    // Initialize storage.
    let storage = SqliteStorage::new(config.storage.clone());
    storage.initialize().await?;
    let storage: Arc<dyn ChatStorage> = Arc::new(storage);
    info!(path = config.storage.database_path.as_str(), "storage initialized");

    // The fanout is shared by the service (publisher) and the gateway
    // (connection registry).
    let fanout = Arc::new(ChatFanout::new());
    let service = Arc::new(ChatService::new(
        storage.clone(),
        fanout.clone(),
        &config.chat,
    ));

    // Install signal handler.
    let cancel = shutdown::install_signal_handler();

    // Spawn the inactivity reaper.
    {
        let reaper = InactivityReaper::new(storage.clone(), &config.chat);
        let reaper_cancel = cancel.clone();
        tokio::spawn(async move {
            reaper.run(reaper_cancel).await;
        });
        info!(
            interval_secs = config.chat.reap_interval_secs,
            reap_after_secs = config.chat.reap_after_secs,
            "inactivity reaper started"
        );
    }

    // Spawn the retention purger.
    {
        let purger = RetentionPurger::new(storage.clone(), &config.chat);
        let purger_cancel = cancel.clone();
        tokio::spawn(async move {
            purger.run(purger_cancel).await;
        });
        info!(
            interval_secs = config.chat.purge_interval_secs,
            retention_days = config.chat.retention_days,
            "retention purger started"
        );
    }

    // Serve the gateway until shutdown.
    let state = GatewayState::new(service, fanout, &config.server);
    server::start_server(&config.server, state, cancel.clone()).await?;

    // Flush storage after the server drains.
    storage.close().await?;
    info!("parlor serve shutdown complete");
    Ok(())
}

/// Initializes the tracing subscriber with the given log level.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("parlor={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .init();
}
