//! # Terminal Configuration
//!
//! Loads `duka.toml`: where the database lives and the business settings
//! the engines run with.
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  1. defaults            Settings::default(), data dir from directories  │
//! │  2. duka.toml           ~/.config/duka/pos/duka.toml (per platform)     │
//! │  3. environment         DUKA_DB_PATH, DUKA_VAT_RATE_BPS,                │
//! │                         DUKA_PRICING_TYPE                               │
//! │  4. validate()          rejects out-of-range rates and limits           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! [database]
//! path = "/var/lib/duka/duka.db"
//!
//! [settings.tax]
//! vat_enabled = true
//! vat_rate_bps = 1600
//! pricing_type = "inclusive"
//!
//! [settings.discount]
//! max_percentage_bps = 1000
//!
//! [settings.loyalty]
//! points_per_unit_cents = 10000
//! redemption_rate_cents = 50
//!
//! [settings.receipt]
//! invoice_prefix = "INV-"
//! ```
//!
//! The `[sync]` table of the same file is read by duka-sync.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use duka_core::{PricingType, Settings};
use duka_db::DbConfig;

use crate::error::{EngineError, EngineResult};

/// File name looked up in the platform config directory.
pub const CONFIG_FILE_NAME: &str = "duka.toml";

const DEFAULT_DB_FILE: &str = "duka.db";

// =============================================================================
// Database Section
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatabaseSection {
    #[serde(default = "default_db_path")]
    pub path: PathBuf,

    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_db_path() -> PathBuf {
    directories::ProjectDirs::from("com", "duka", "pos")
        .map(|dirs| dirs.data_dir().join(DEFAULT_DB_FILE))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_DB_FILE))
}

fn default_max_connections() -> u32 {
    5
}

impl Default for DatabaseSection {
    fn default() -> Self {
        DatabaseSection {
            path: default_db_path(),
            max_connections: default_max_connections(),
        }
    }
}

// =============================================================================
// Engine Configuration
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub database: DatabaseSection,

    #[serde(default)]
    pub settings: Settings,
}

impl EngineConfig {
    /// Loads configuration from file, environment, and defaults.
    ///
    /// ## Load Order (later overrides earlier)
    /// 1. Default values
    /// 2. Config file (a missing file is not an error)
    /// 3. Environment variables
    pub fn load(config_path: Option<PathBuf>) -> EngineResult<Self> {
        let mut config = match config_path.or_else(Self::default_config_path) {
            Some(path) if path.exists() => {
                info!(?path, "Loading terminal config from file");
                Self::from_file(&path)?
            }
            Some(path) => {
                debug!(?path, "Config file not found, using defaults");
                Self::default()
            }
            None => Self::default(),
        };

        config.apply_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> EngineResult<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml(&contents)
    }

    pub fn from_toml(contents: &str) -> EngineResult<Self> {
        Ok(toml::from_str(contents)?)
    }

    pub fn validate(&self) -> EngineResult<()> {
        if self.database.path.as_os_str().is_empty() {
            return Err(EngineError::InvalidConfig(
                "database.path must not be empty".into(),
            ));
        }
        if self.database.max_connections == 0 {
            return Err(EngineError::InvalidConfig(
                "database.max_connections must be greater than 0".into(),
            ));
        }
        self.settings
            .validate()
            .map_err(|e| EngineError::InvalidConfig(e.to_string()))
    }

    /// Applies `DUKA_*` overrides read through `lookup`.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(path) = lookup("DUKA_DB_PATH") {
            debug!(path = %path, "Overriding database path from environment");
            self.database.path = PathBuf::from(path);
        }

        if let Some(rate) = lookup("DUKA_VAT_RATE_BPS") {
            match rate.parse::<u32>() {
                Ok(bps) => self.settings.tax.vat_rate_bps = bps,
                Err(_) => warn!(value = %rate, "Ignoring non-numeric DUKA_VAT_RATE_BPS"),
            }
        }

        if let Some(kind) = lookup("DUKA_PRICING_TYPE") {
            match kind.to_lowercase().as_str() {
                "inclusive" => self.settings.tax.pricing_type = PricingType::Inclusive,
                "exclusive" => self.settings.tax.pricing_type = PricingType::Exclusive,
                _ => warn!(value = %kind, "Unknown pricing type in environment"),
            }
        }
    }

    pub fn db_config(&self) -> DbConfig {
        DbConfig::new(&self.database.path).max_connections(self.database.max_connections)
    }

    /// Platform config file, e.g. `~/.config/pos/duka.toml` on Linux.
    pub fn default_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("com", "duka", "pos")
            .map(|dirs| dirs.config_dir().join(CONFIG_FILE_NAME))
    }
}
