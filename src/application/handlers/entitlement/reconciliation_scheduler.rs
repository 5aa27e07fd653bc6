//! ReconciliationScheduler - Background service running the sweep on a timer.
//!
//! ## Configuration
//!
//! | Setting | Default | Description |
//! |---------|---------|-------------|
//! | `interval` | 1h | Time between sweeps |
//!
//! ## Graceful Shutdown
//!
//! The same `watch` channel that stops the loop is handed to the sweep, so a
//! sweep in progress stops at the next user boundary.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::{self, Instant, MissedTickBehavior};

use super::reconcile_entitlements::{ReconcileEntitlementsHandler, SweepReport};

/// Default time between sweeps.
pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(3600);

/// Background service that periodically reconciles entitlements.
pub struct ReconciliationScheduler {
    handler: Arc<ReconcileEntitlementsHandler>,
    interval: Duration,
}

impl ReconciliationScheduler {
    pub fn new(handler: Arc<ReconcileEntitlementsHandler>) -> Self {
        Self {
            handler,
            interval: DEFAULT_SWEEP_INTERVAL,
        }
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Runs sweeps until the shutdown signal flips to `true` or its sender
    /// is dropped. The first sweep starts one interval after launch.
    ///
    /// Returns the number of sweeps that ran to completion or cancellation.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) -> usize {
        let mut ticker = time::interval_at(Instant::now() + self.interval, self.interval);
        // A long sweep should push the next one back, not trigger a burst.
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        tracing::info!(interval_secs = self.interval.as_secs(), "reconciliation scheduler started");
        let mut sweeps = 0;

        loop {
            tokio::select! {
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }

                _ = ticker.tick() => {
                    if self.sweep_once(&shutdown).await.is_some() {
                        sweeps += 1;
                    }
                }
            }
        }

        tracing::info!(sweeps, "reconciliation scheduler stopped");
        sweeps
    }

    /// Runs one sweep, logging instead of propagating a failure to start.
    pub async fn sweep_once(&self, shutdown: &watch::Receiver<bool>) -> Option<SweepReport> {
        match self.handler.run(shutdown).await {
            Ok(report) => Some(report),
            Err(e) => {
                tracing::error!(error = %e, "scheduled reconciliation sweep could not start");
                None
            }
        }
    }
}
