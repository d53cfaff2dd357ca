//! # Sync Coordinator
//!
//! Drains the durable order queue into the remote system of record.
//!
//! ## Drain
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  offline?  ──► report { interrupted }                                   │
//! │                                                                         │
//! │  for sale in order_queue (oldest first):                                │
//! │     select (biased)                                                     │
//! │       connectivity lost ──► stop, report { interrupted }                │
//! │       endpoint.push_sale(sale)                                          │
//! │          Ok  ──► one batch:  delete order_queue/id                      │
//! │                              upsert sales/id  (synced = true)           │
//! │          Err ──► record_queue_failure(id, error), keep going            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! A sale is either still queued or in `sales`, never both and never
//! neither. Replaying a sale that already reached `sales` overwrites the
//! same id, so the primary collection never holds duplicates.
//!
//! A push abandoned on connectivity loss may still have reached the remote.
//! The sale stays queued and is pushed again later; the remote treats a
//! repeated push as an upsert.

use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, error, info, warn};

use duka_core::Sale;
use duka_db::{Collection, Store, StoreExt, WriteBatch};

use crate::config::SyncConfig;
use crate::endpoint::RemoteEndpoint;
use crate::error::SyncResult;

/// Outcome of one drain.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SyncReport {
    pub success_count: usize,
    pub failed_count: usize,
    /// Ids moved from the queue into `sales`, in push order.
    pub synced: Vec<String>,
    /// The drain stopped early because connectivity was lost.
    pub interrupted: bool,
}

impl SyncReport {
    pub fn is_idle(&self) -> bool {
        self.success_count == 0 && self.failed_count == 0 && !self.interrupted
    }
}

pub struct SyncCoordinator {
    store: Arc<dyn Store>,
    endpoint: Arc<dyn RemoteEndpoint>,
    poll_interval: Duration,
}

impl SyncCoordinator {
    pub fn new(
        store: Arc<dyn Store>,
        endpoint: Arc<dyn RemoteEndpoint>,
        config: &SyncConfig,
    ) -> Self {
        SyncCoordinator {
            store,
            endpoint,
            poll_interval: config.poll_interval(),
        }
    }

    /// Pushes every queued sale, oldest first.
    ///
    /// `online` is the connectivity signal. A monitor that went away counts
    /// as offline.
    ///
    /// ## Errors
    /// Only store failures. Push failures are counted in the report and
    /// recorded on the queue entry.
    pub async fn drain(&self, online: &mut watch::Receiver<bool>) -> SyncResult<SyncReport> {
        let mut report = SyncReport::default();

        if !*online.borrow_and_update() {
            debug!("Offline, order queue drain skipped");
            report.interrupted = true;
            return Ok(report);
        }

        let queued: Vec<Sale> = self.store.get_all_in(Collection::OrderQueue).await?;
        if queued.is_empty() {
            return Ok(report);
        }
        info!(queued = queued.len(), "Draining order queue");

        for sale in queued {
            let pushed = tokio::select! {
                biased;
                _ = connectivity_lost(online) => None,
                result = self.endpoint.push_sale(&sale) => Some(result),
            };

            match pushed {
                None => {
                    warn!(sale_id = %sale.id, "Connectivity lost, order queue drain interrupted");
                    report.interrupted = true;
                    break;
                }
                Some(Ok(())) => {
                    self.settle(&sale).await?;
                    report.success_count += 1;
                    report.synced.push(sale.id);
                }
                Some(Err(e)) => {
                    warn!(sale_id = %sale.id, error = %e, "Sale push failed, keeping it queued");
                    self.store.record_queue_failure(&sale.id, &e.to_string()).await?;
                    report.failed_count += 1;
                }
            }
        }

        info!(
            synced = report.success_count,
            failed = report.failed_count,
            interrupted = report.interrupted,
            "Order queue drain finished"
        );
        Ok(report)
    }

    /// Moves an acknowledged sale from the queue into `sales`.
    async fn settle(&self, sale: &Sale) -> SyncResult<()> {
        let synced = Sale {
            synced: true,
            ..sale.clone()
        };
        let mut batch = WriteBatch::new();
        batch.delete_in(Collection::OrderQueue, &sale.id);
        batch.put(&synced)?;
        self.store.commit(batch).await?;
        debug!(sale_id = %sale.id, "Sale synced");
        Ok(())
    }

    /// Runs the coordinator in the background: a drain on every offline to
    /// online transition, and on every poll tick while online.
    pub fn spawn(self, online: watch::Receiver<bool>) -> SyncHandle {
        let (shutdown_tx, shutdown_rx) = mpsc::channel(1);
        let task = tokio::spawn(self.run(online, shutdown_rx));
        SyncHandle { shutdown_tx, task }
    }

    async fn run(self, mut online: watch::Receiver<bool>, mut shutdown_rx: mpsc::Receiver<()>) {
        let mut ticker = interval(self.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        info!(poll_interval = ?self.poll_interval, "Sync coordinator started");

        loop {
            tokio::select! {
                _ = shutdown_rx.recv() => {
                    info!("Sync coordinator stopping");
                    break;
                }
                changed = online.changed() => {
                    if changed.is_err() {
                        warn!("Connectivity monitor gone, sync coordinator stopping");
                        break;
                    }
                    if !*online.borrow() {
                        continue;
                    }
                    info!("Back online");
                }
                _ = ticker.tick() => {
                    if !*online.borrow() {
                        continue;
                    }
                }
            }

            match self.drain(&mut online).await {
                Ok(report) if report.is_idle() => {}
                Ok(report) => debug!(?report, "Drain report"),
                Err(e) => error!(error = %e, "Order queue drain aborted"),
            }
        }
    }
}

/// Resolves once connectivity is (or already was) lost.
async fn connectivity_lost(online: &mut watch::Receiver<bool>) {
    let _ = online.wait_for(|up| !*up).await;
}

/// Handle to a running [`SyncCoordinator`].
pub struct SyncHandle {
    shutdown_tx: mpsc::Sender<()>,
    task: JoinHandle<()>,
}

impl SyncHandle {
    /// Stops the coordinator and waits for an in-flight drain to finish.
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(()).await;
        if let Err(e) = self.task.await {
            error!(error = %e, "Sync coordinator task failed");
        }
    }
}
