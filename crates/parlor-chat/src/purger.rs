// SPDX-FileCopyrightText: 2026 Parlor Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Retention purger: permanently removes long-deleted messages.
//!
//! Messages soft-deleted more than the retention window ago are erased from
//! their session's ledger for good. Sessions themselves are never closed or
//! deleted here, even when their last message is purged.

use std::sync::Arc;
use std::time::Duration;

use parlor_config::model::ChatConfig;
use parlor_core::{ChatError, ChatStorage};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::clock;

/// Periodic sweep that makes soft deletion permanent after the retention window.
pub struct RetentionPurger {
    storage: Arc<dyn ChatStorage>,
    interval_secs: u64,
    retention_days: u32,
}

impl RetentionPurger {
    pub fn new(storage: Arc<dyn ChatStorage>, config: &ChatConfig) -> Self {
        Self {
            storage,
            interval_secs: config.purge_interval_secs,
            retention_days: config.retention_days,
        }
    }

    /// Runs the purger until the cancellation token fires.
    pub async fn run(&self, cancel: CancellationToken) {
        let mut interval = tokio::time::interval(Duration::from_secs(self.interval_secs));
        // Skip the first immediate tick.
        interval.tick().await;

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    match self.sweep().await {
                        Ok(0) => debug!("purge sweep: nothing past retention"),
                        Ok(n) => info!(purged = n, "purged messages past retention"),
                        Err(e) => warn!(error = %e, "purge sweep failed (non-fatal)"),
                    }
                }
                _ = cancel.cancelled() => {
                    info!("retention purger shutting down");
                    break;
                }
            }
        }
    }

    /// One purge pass. Returns the number of permanently removed messages.
    pub async fn sweep(&self) -> Result<u64, ChatError> {
        let cutoff = clock::days_ago(self.retention_days);
        self.storage.purge_deleted_before(&cutoff).await
    }
}
