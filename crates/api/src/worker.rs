//! Background worker for periodic full syncs.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Notify;
use tokio::time::MissedTickBehavior;
use tracing::{info, warn};

use storefront_stock::{FullSyncOptions, StockCache};

/// Periodically runs a full stock sync.
///
/// A run that finds the sync lock held is normal in a multi-instance
/// deployment (a peer got there first) and does not count as a failure
/// streak on its own; persistent failures are logged louder.
pub struct SyncWorker {
    stock: Arc<StockCache>,
    interval: Duration,
    shutdown: Arc<Notify>,
}

impl SyncWorker {
    pub fn new(stock: Arc<StockCache>, interval: Duration) -> Self {
        Self {
            stock,
            interval,
            shutdown: Arc::new(Notify::new()),
        }
    }

    /// Handle for requesting graceful shutdown.
    pub fn shutdown_handle(&self) -> Arc<Notify> {
        self.shutdown.clone()
    }

    /// Start the worker. Returns `None` when the interval is zero
    /// (scheduling disabled; syncs are triggered externally).
    pub fn start(self) -> Option<tokio::task::JoinHandle<()>> {
        if self.interval.is_zero() {
            info!("sync worker disabled (interval is zero)");
            return None;
        }

        let stock = self.stock;
        let shutdown = self.shutdown;
        let interval = self.interval;

        Some(tokio::spawn(async move {
            info!(interval_secs = interval.as_secs(), "sync worker started");

            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

            let mut consecutive_failures = 0u32;
            loop {
                tokio::select! {
                    _ = shutdown.notified() => {
                        info!("sync worker received shutdown signal");
                        break;
                    }
                    _ = ticker.tick() => {
                        let report = stock.full_sync(FullSyncOptions::default()).await;
                        if report.success {
                            consecutive_failures = 0;
                            info!(
                                processed = report.processed,
                                errors = report.errors,
                                "scheduled stock sync completed"
                            );
                        } else {
                            consecutive_failures += 1;
                            warn!(
                                consecutive_failures,
                                "scheduled stock sync did not complete (lock held or upstream down)"
                            );
                        }
                    }
                }
            }
        }))
    }
}
