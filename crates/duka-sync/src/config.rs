//! # Sync Configuration
//!
//! The `[sync]` table of `duka.toml`.
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  1. Environment Variables (highest priority)                            │
//! │     DUKA_SYNC_URL=wss://hq.example.co.ke/sync                           │
//! │     DUKA_DEVICE_ID=till-02                                              │
//! │                                                                         │
//! │  2. TOML Config File                                                    │
//! │     [sync] table of duka.toml in the platform config directory          │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                    │
//! │     no endpoint (sync disabled), device id "till-01"                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! [sync]
//! endpoint_url = "ws://192.168.1.10:8080/sync"
//! device_id = "till-01"
//! poll_interval_secs = 30
//! push_timeout_secs = 10
//! connect_timeout_secs = 10
//! probe_interval_secs = 5
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info, warn};
use url::Url;

use crate::error::{SyncError, SyncResult};

const CONFIG_FILE_NAME: &str = "duka.toml";

// =============================================================================
// Sync Configuration
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// WebSocket URL of the remote system of record. `None` disables sync;
    /// sales keep queueing locally.
    pub endpoint_url: Option<String>,

    /// Identifies this till in every push.
    pub device_id: String,

    /// How often the queue is drained while online.
    pub poll_interval_secs: u64,

    /// Upper bound on one push, from send to acknowledgement.
    pub push_timeout_secs: u64,

    pub connect_timeout_secs: u64,

    /// How often the connectivity monitor probes the endpoint.
    pub probe_interval_secs: u64,

    /// First reconnect delay after a failed connect.
    pub initial_backoff_ms: u64,

    pub max_backoff_secs: u64,
}

impl Default for SyncConfig {
    fn default() -> Self {
        SyncConfig {
            endpoint_url: None,
            device_id: "till-01".to_string(),
            poll_interval_secs: 30,
            push_timeout_secs: 10,
            connect_timeout_secs: 10,
            probe_interval_secs: 5,
            initial_backoff_ms: 500,
            max_backoff_secs: 60,
        }
    }
}

/// `duka.toml` as seen by this crate: only the `[sync]` table.
#[derive(Debug, Default, Deserialize)]
struct ConfigFile {
    #[serde(default)]
    sync: SyncConfig,
}

impl SyncConfig {
    /// Loads the `[sync]` table, then environment overrides, then validates.
    pub fn load(config_path: Option<PathBuf>) -> SyncResult<Self> {
        let mut config = match config_path.or_else(Self::default_config_path) {
            Some(path) if path.exists() => {
                info!(?path, "Loading sync config from file");
                Self::from_file(&path)?
            }
            Some(path) => {
                debug!(?path, "Config file not found, sync uses defaults");
                Self::default()
            }
            None => Self::default(),
        };

        config.apply_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> SyncResult<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml(&contents)
    }

    /// Parses a whole `duka.toml`, ignoring every table but `[sync]`.
    pub fn from_toml(contents: &str) -> SyncResult<Self> {
        let file: ConfigFile = toml::from_str(contents)?;
        Ok(file.sync)
    }

    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(url) = lookup("DUKA_SYNC_URL") {
            debug!(url = %url, "Overriding sync endpoint from environment");
            self.endpoint_url = if url.trim().is_empty() { None } else { Some(url) };
        }
        if let Some(id) = lookup("DUKA_DEVICE_ID") {
            self.device_id = id;
        }
    }

    pub fn validate(&self) -> SyncResult<()> {
        if self.device_id.trim().is_empty() {
            return Err(SyncError::InvalidConfig("device_id must not be empty".into()));
        }
        for (name, value) in [
            ("poll_interval_secs", self.poll_interval_secs),
            ("push_timeout_secs", self.push_timeout_secs),
            ("connect_timeout_secs", self.connect_timeout_secs),
            ("probe_interval_secs", self.probe_interval_secs),
        ] {
            if value == 0 {
                return Err(SyncError::InvalidConfig(format!(
                    "{} must be greater than 0",
                    name
                )));
            }
        }
        if self.endpoint_url.is_some() {
            self.endpoint()?;
        } else {
            warn!("No sync endpoint configured, offline sales will stay queued");
        }
        Ok(())
    }

    /// True when an endpoint is configured.
    pub fn is_enabled(&self) -> bool {
        self.endpoint_url.is_some()
    }

    /// The parsed endpoint URL. Only `ws` and `wss` are accepted.
    pub fn endpoint(&self) -> SyncResult<Url> {
        let raw = self
            .endpoint_url
            .as_deref()
            .ok_or_else(|| SyncError::InvalidConfig("sync endpoint_url is not set".into()))?;
        let url = Url::parse(raw)?;
        match url.scheme() {
            "ws" | "wss" => Ok(url),
            other => Err(SyncError::InvalidUrl(format!(
                "unsupported scheme '{}', expected ws or wss",
                other
            ))),
        }
    }

    /// `host:port` the connectivity monitor probes. IPv6 hosts keep their
    /// brackets.
    pub fn probe_target(&self) -> SyncResult<String> {
        let url = self.endpoint()?;
        let host = url
            .host_str()
            .ok_or_else(|| SyncError::InvalidUrl("endpoint has no host".into()))?;
        let port = url
            .port_or_known_default()
            .ok_or_else(|| SyncError::InvalidUrl("endpoint has no port".into()))?;
        Ok(format!("{}:{}", host, port))
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    pub fn push_timeout(&self) -> Duration {
        Duration::from_secs(self.push_timeout_secs)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn probe_interval(&self) -> Duration {
        Duration::from_secs(self.probe_interval_secs)
    }

    pub fn initial_backoff(&self) -> Duration {
        Duration::from_millis(self.initial_backoff_ms)
    }

    pub fn max_backoff(&self) -> Duration {
        Duration::from_secs(self.max_backoff_secs)
    }

    pub fn default_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("com", "duka", "pos")
            .map(|dirs| dirs.config_dir().join(CONFIG_FILE_NAME))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reads_only_sync_table() {
        let config = SyncConfig::from_toml(
            r#"
            [database]
            path = "/tmp/shop.db"

            [sync]
            endpoint_url = "ws://192.168.1.10:8080/sync"
            device_id = "till-07"
            "#,
        )
        .unwrap();

        assert_eq!(config.device_id, "till-07");
        assert_eq!(config.poll_interval_secs, 30);
        assert!(config.is_enabled());
        assert_eq!(config.probe_target().unwrap(), "192.168.1.10:8080");
    }

    #[test]
    fn test_missing_table_uses_defaults() {
        let config = SyncConfig::from_toml("[database]\npath = \"x.db\"\n").unwrap();
        assert_eq!(config, SyncConfig::default());
        assert!(!config.is_enabled());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_env_overrides() {
        let mut config = SyncConfig::default();
        config.apply_overrides(|key| match key {
            "DUKA_SYNC_URL" => Some("wss://hq.example.co.ke/sync".to_string()),
            "DUKA_DEVICE_ID" => Some("till-02".to_string()),
            _ => None,
        });
        assert_eq!(config.device_id, "till-02");
        // wss defaults to 443
        assert_eq!(config.probe_target().unwrap(), "hq.example.co.ke:443");
    }

    #[test]
    fn test_validation() {
        let mut config = SyncConfig {
            endpoint_url: Some("http://hq.example.co.ke/sync".to_string()),
            ..SyncConfig::default()
        };
        assert!(matches!(config.validate(), Err(SyncError::InvalidUrl(_))));

        config.endpoint_url = Some("ws://hq.example.co.ke/sync".to_string());
        config.push_timeout_secs = 0;
        assert!(matches!(config.validate(), Err(SyncError::InvalidConfig(_))));
    }
}
