//! # Connectivity Monitor
//!
//! Probes the sync endpoint with a plain TCP connect and publishes
//! reachability on a `watch` channel.
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────────┐
//! │  every probe_interval:                                        │
//! │     TcpStream::connect(host:port) within probe timeout        │
//! │        changed? ──► watch::Sender<bool>  (online / offline)   │
//! │                                                               │
//! │  subscribers:                                                 │
//! │     SyncCoordinator  ── drains on offline → online            │
//! │     the till         ── Connectivity::from_online(..)         │
//! └───────────────────────────────────────────────────────────────┘
//! ```
//!
//! Only transitions are published; a steady state wakes nobody.

use std::time::Duration;
use tokio::net::TcpStream;
use tokio::sync::{mpsc, watch};
use tokio::time::{interval, timeout, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::config::SyncConfig;
use crate::error::SyncResult;

/// True when a TCP connection to `target` opens within `limit`.
pub async fn probe(target: &str, limit: Duration) -> bool {
    matches!(timeout(limit, TcpStream::connect(target)).await, Ok(Ok(_)))
}

pub struct ConnectivityMonitor {
    target: String,
    interval: Duration,
    probe_timeout: Duration,
}

impl ConnectivityMonitor {
    /// Monitor for the configured endpoint. Fails when sync is disabled.
    pub fn new(config: &SyncConfig) -> SyncResult<Self> {
        Ok(ConnectivityMonitor {
            target: config.probe_target()?,
            interval: config.probe_interval(),
            probe_timeout: config.connect_timeout(),
        })
    }

    pub fn with_target(
        target: impl Into<String>,
        interval: Duration,
        probe_timeout: Duration,
    ) -> Self {
        ConnectivityMonitor {
            target: target.into(),
            interval,
            probe_timeout,
        }
    }

    /// Starts probing in the background. The channel starts offline.
    pub fn spawn(self) -> ConnectivityHandle {
        let (online_tx, online_rx) = watch::channel(false);
        let (shutdown_tx, shutdown_rx) = mpsc::channel(1);

        info!(endpoint = %self.target, interval = ?self.interval, "Starting connectivity monitor");
        tokio::spawn(self.run(online_tx, shutdown_rx));

        ConnectivityHandle {
            online: online_rx,
            shutdown_tx,
        }
    }

    async fn run(self, online_tx: watch::Sender<bool>, mut shutdown_rx: mpsc::Receiver<()>) {
        let mut ticker = interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let online = probe(&self.target, self.probe_timeout).await;
                    let changed = online_tx.send_if_modified(|current| {
                        if *current == online {
                            return false;
                        }
                        *current = online;
                        true
                    });
                    if changed && online {
                        info!(endpoint = %self.target, "Sync endpoint reachable");
                    } else if changed {
                        warn!(endpoint = %self.target, "Sync endpoint unreachable, going offline");
                    }
                }
                _ = shutdown_rx.recv() => {
                    debug!("Connectivity monitor stopping");
                    break;
                }
            }
        }
    }
}

/// Handle to a running [`ConnectivityMonitor`]. The monitor stops when
/// [`shutdown`](Self::shutdown) is called or every handle is dropped.
#[derive(Clone)]
pub struct ConnectivityHandle {
    online: watch::Receiver<bool>,
    shutdown_tx: mpsc::Sender<()>,
}

impl ConnectivityHandle {
    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.online.clone()
    }

    pub fn is_online(&self) -> bool {
        *self.online.borrow()
    }

    pub async fn shutdown(&self) {
        let _ = self.shutdown_tx.send(()).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::net::TcpListener;

    #[tokio::test]
    async fn test_probe() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();
        assert!(probe(&addr, Duration::from_secs(1)).await);

        drop(listener);
        assert!(!probe(&addr, Duration::from_secs(1)).await);
    }

    #[tokio::test]
    async fn test_monitor_publishes_transitions() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();

        let handle = ConnectivityMonitor::with_target(
            addr,
            Duration::from_millis(20),
            Duration::from_millis(500),
        )
        .spawn();
        let mut online = handle.subscribe();
        assert!(!*online.borrow());

        timeout(Duration::from_secs(5), online.wait_for(|up| *up))
            .await
            .unwrap()
            .unwrap();
        assert!(handle.is_online());

        drop(listener);
        timeout(Duration::from_secs(5), online.wait_for(|up| !*up))
            .await
            .unwrap()
            .unwrap();

        handle.shutdown().await;
    }
}
