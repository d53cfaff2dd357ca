//! # duka-sync: Offline Queue Sync for Duka POS
//!
//! Sales completed while the till is offline land in the durable
//! `order_queue`. This crate watches connectivity and, once the remote
//! system of record is reachable, moves them into `sales`.
//!
//! ## Architecture Overview
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  ┌────────────────────┐   watch<bool>   ┌────────────────────────────┐  │
//! │  │ ConnectivityMonitor│ ──────────────► │ SyncCoordinator            │  │
//! │  │ TCP probe of the   │                 │ drain on offline → online  │  │
//! │  │ endpoint host:port │                 │ and every poll_interval    │  │
//! │  └────────────────────┘                 └──────┬──────────────┬──────┘  │
//! │                                                │              │         │
//! │                                   push_sale    │              │ batch   │
//! │                                                ▼              ▼         │
//! │                              ┌────────────────────┐  ┌───────────────┐  │
//! │                              │ RemoteEndpoint     │  │ duka_db::Store│  │
//! │                              │ WsEndpoint:        │  │ order_queue → │  │
//! │                              │ SalePush / SaleAck │  │ sales         │  │
//! │                              └────────────────────┘  └───────────────┘  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//! - [`config`] - `[sync]` table of `duka.toml`
//! - [`connectivity`] - Reachability probe and monitor
//! - [`coordinator`] - Queue drain and background loop
//! - [`endpoint`] - `RemoteEndpoint` contract and the WebSocket client
//! - [`error`] - Sync error types
//! - [`protocol`] - Wire messages
//!
//! ## Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use duka_sync::{ConnectivityMonitor, SyncConfig, SyncCoordinator, WsEndpoint};
//!
//! let config = SyncConfig::load(None)?;
//! let monitor = ConnectivityMonitor::new(&config)?.spawn();
//! let endpoint = Arc::new(WsEndpoint::new(&config)?);
//!
//! let sync = SyncCoordinator::new(Arc::new(db.clone()), endpoint, &config)
//!     .spawn(monitor.subscribe());
//!
//! // on exit
//! sync.shutdown().await;
//! monitor.shutdown().await;
//! ```

pub mod config;
pub mod connectivity;
pub mod coordinator;
pub mod endpoint;
pub mod error;
pub mod protocol;

pub use config::SyncConfig;
pub use connectivity::{probe, ConnectivityHandle, ConnectivityMonitor};
pub use coordinator::{SyncCoordinator, SyncHandle, SyncReport};
pub use endpoint::{RemoteEndpoint, WsEndpoint};
pub use error::{SyncError, SyncResult};
pub use protocol::{SalePush, SyncMessage, PROTOCOL_VERSION};
