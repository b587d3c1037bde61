// SPDX-FileCopyrightText: 2026 Parlor Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Inactivity reaper: force-closes abandoned pending sessions.
//!
//! A pending session that never got an admin reply and whose last customer
//! activity is older than the configured timeout is closed through the
//! state machine's close transition. The reaper changes status only; it
//! never deletes data.

use std::sync::Arc;
use std::time::Duration;

use parlor_config::model::ChatConfig;
use parlor_core::types::SessionStatus;
use parlor_core::{ChatError, ChatStorage};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::clock;
use crate::transition::{SessionEvent, transition};

/// Periodic sweep over pending sessions abandoned by admins.
pub struct InactivityReaper {
    storage: Arc<dyn ChatStorage>,
    interval_secs: u64,
    reap_after_secs: u64,
}

impl InactivityReaper {
    pub fn new(storage: Arc<dyn ChatStorage>, config: &ChatConfig) -> Self {
        Self {
            storage,
            interval_secs: config.reap_interval_secs,
            reap_after_secs: config.reap_after_secs,
        }
    }

    /// Runs the reaper until the cancellation token fires.
    ///
    /// Sweep failures are logged and retried on the next scheduled run;
    /// they never terminate the loop.
    pub async fn run(&self, cancel: CancellationToken) {
        let mut interval = tokio::time::interval(Duration::from_secs(self.interval_secs));
        // Skip the first immediate tick.
        interval.tick().await;

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    match self.sweep().await {
                        Ok(0) => debug!("reaper sweep: nothing to close"),
                        Ok(n) => info!(closed = n, "reaper closed abandoned sessions"),
                        Err(e) => warn!(error = %e, "reaper sweep failed (non-fatal)"),
                    }
                }
                _ = cancel.cancelled() => {
                    info!("inactivity reaper shutting down");
                    break;
                }
            }
        }
    }

    /// One sweep pass. Returns the number of sessions closed.
    ///
    /// A failure on one session does not block closing the others; the
    /// stragglers are picked up again on the next run.
    pub async fn sweep(&self) -> Result<usize, ChatError> {
        let cutoff = clock::secs_ago(self.reap_after_secs);
        let ids = self.storage.list_stale_pending(&cutoff).await?;
        if ids.is_empty() {
            return Ok(0);
        }

        let update = transition(SessionStatus::Pending, &SessionEvent::Close)?;
        let mut closed = 0;
        for id in &ids {
            match self.storage.apply_session_update(id, &update).await {
                Ok(()) => closed += 1,
                Err(e) => {
                    warn!(session_id = id.as_str(), error = %e, "failed to reap session, will retry next run");
                }
            }
        }
        Ok(closed)
    }
}
