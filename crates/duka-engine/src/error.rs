//! # Engine Error Types
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  CoreError  (precondition, nothing written)  ──┐                        │
//! │  DbError    (commit failed, nothing written) ──┼──► EngineError ──► UI  │
//! │  config load / parse / validation          ────┘                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

use duka_core::{CoreError, ValidationError};
use duka_db::DbError;

#[derive(Debug, Error)]
pub enum EngineError {
    /// A business rule rejected the operation before any write.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// The store failed. Batches are atomic, so nothing was persisted.
    #[error("Storage error: {0}")]
    Db(#[from] DbError),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Failed to read config: {0}")]
    ConfigIo(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    ConfigParse(#[from] toml::de::Error),
}

impl From<ValidationError> for EngineError {
    fn from(err: ValidationError) -> Self {
        EngineError::Core(CoreError::Validation(err))
    }
}

impl EngineError {
    /// True when the operation was refused by a rule rather than by I/O.
    ///
    /// Callers show these to the cashier; everything else is logged.
    pub fn is_rejection(&self) -> bool {
        matches!(self, EngineError::Core(_))
    }

    /// The wrapped business error, if any.
    pub fn as_core(&self) -> Option<&CoreError> {
        match self {
            EngineError::Core(err) => Some(err),
            _ => None,
        }
    }
}

pub type EngineResult<T> = Result<T, EngineError>;
