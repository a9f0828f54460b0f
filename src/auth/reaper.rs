// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Session Reaper
//!
//! Background task that periodically removes expired sessions from the
//! [`SessionStore`]. Reads already refuse expired sessions; the reaper only
//! reclaims their memory.
//!
//! ## Shutdown
//!
//! Uses `tokio_util::sync::CancellationToken`. Cancelling the token wakes the
//! loop immediately rather than at the end of the current interval.

use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::session::SessionStore;

/// Default interval between sweeps.
pub const DEFAULT_REAPER_INTERVAL: Duration = Duration::from_secs(60 * 60);

/// Periodic sweeper over a session store.
pub struct SessionReaper {
    store: SessionStore,
    interval: Duration,
}

impl SessionReaper {
    pub fn new(store: SessionStore) -> Self {
        Self {
            store,
            interval: DEFAULT_REAPER_INTERVAL,
        }
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Run until the cancellation token is triggered.
    ///
    /// Should be spawned as a background task:
    /// ```rust,ignore
    /// tokio::spawn(reaper.run(shutdown.clone()));
    /// ```
    pub async fn run(self, shutdown: CancellationToken) {
        info!(
            interval_secs = self.interval.as_secs(),
            "Session reaper starting"
        );

        loop {
            tokio::select! {
                _ = tokio::time::sleep(self.interval) => {},
                _ = shutdown.cancelled() => {
                    info!("Session reaper shutting down");
                    return;
                }
            }

            self.sweep().await;
        }
    }

    /// Execute one sweep and return the number of sessions removed.
    pub async fn sweep(&self) -> usize {
        let removed = self.store.purge_expired().await;
        if removed > 0 {
            let remaining = self.store.len().await;
            info!(removed, remaining, "Session reaper: removed expired sessions");
        } else {
            debug!("Session reaper: nothing to remove");
        }
        removed
    }
}

/// Owns a running reaper task and its stop signal.
pub struct ReaperHandle {
    shutdown: CancellationToken,
    task: JoinHandle<()>,
}

impl ReaperHandle {
    /// Spawn `reaper` on the current runtime.
    pub fn spawn(reaper: SessionReaper) -> Self {
        let shutdown = CancellationToken::new();
        let task = tokio::spawn(reaper.run(shutdown.clone()));
        Self { shutdown, task }
    }

    /// Signal the reaper to stop and wait for it to exit.
    pub async fn shutdown(self) {
        self.shutdown.cancel();
        if let Err(e) = self.task.await {
            warn!(error = %e, "Session reaper task ended abnormally");
        }
    }
}
