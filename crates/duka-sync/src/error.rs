//! # Sync Error Types
//!
//! ## Error Categories
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Configuration        Transport            Protocol                     │
//! │  ─────────────        ─────────            ────────                     │
//! │  InvalidConfig        ConnectionFailed     InvalidMessage               │
//! │  InvalidUrl           Disconnected         SerializationFailed          │
//! │  ConfigLoadFailed     Timeout              UnexpectedMessageType        │
//! │                       TlsError             Rejected                     │
//! │                       WebSocketError                                    │
//! │                                                                         │
//! │  Store                                                                  │
//! │  ─────                                                                  │
//! │  Database  (fatal for the drain; batches are atomic so nothing half-    │
//! │             synced is left behind)                                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! A push failure is never fatal for the queue: the record stays queued
//! with its attempt counter bumped and the next drain tries again.

use thiserror::Error;

use duka_db::DbError;

pub type SyncResult<T> = Result<T, SyncError>;

#[derive(Debug, Error)]
pub enum SyncError {
    // =========================================================================
    // Configuration Errors
    // =========================================================================
    #[error("Invalid sync configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid endpoint URL: {0}")]
    InvalidUrl(String),

    #[error("Failed to load config: {0}")]
    ConfigLoadFailed(String),

    // =========================================================================
    // Transport Errors
    // =========================================================================
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// The socket closed, or a reconnect is still backing off.
    #[error("Disconnected from sync endpoint")]
    Disconnected,

    #[error("Timed out after {0} ms")]
    Timeout(u64),

    #[error("TLS error: {0}")]
    TlsError(String),

    #[error("WebSocket error: {0}")]
    WebSocketError(String),

    // =========================================================================
    // Protocol Errors
    // =========================================================================
    #[error("Invalid message: {0}")]
    InvalidMessage(String),

    #[error("Serialization failed: {0}")]
    SerializationFailed(String),

    #[error("Unexpected message type: expected {expected}, got {actual}")]
    UnexpectedMessageType { expected: String, actual: String },

    /// The remote refused the sale.
    #[error("Remote rejected sale ({code}): {message}")]
    Rejected { code: String, message: String },

    // =========================================================================
    // Store Errors
    // =========================================================================
    #[error("Store error: {0}")]
    Database(#[from] DbError),
}

// =============================================================================
// Error Conversions
// =============================================================================

impl From<serde_json::Error> for SyncError {
    fn from(err: serde_json::Error) -> Self {
        SyncError::SerializationFailed(err.to_string())
    }
}

impl From<url::ParseError> for SyncError {
    fn from(err: url::ParseError) -> Self {
        SyncError::InvalidUrl(err.to_string())
    }
}

impl From<std::io::Error> for SyncError {
    fn from(err: std::io::Error) -> Self {
        SyncError::ConfigLoadFailed(err.to_string())
    }
}

impl From<toml::de::Error> for SyncError {
    fn from(err: toml::de::Error) -> Self {
        SyncError::ConfigLoadFailed(err.to_string())
    }
}

impl From<tokio_tungstenite::tungstenite::Error> for SyncError {
    fn from(err: tokio_tungstenite::tungstenite::Error) -> Self {
        use tokio_tungstenite::tungstenite::Error as WsError;
        match err {
            WsError::ConnectionClosed | WsError::AlreadyClosed => SyncError::Disconnected,
            WsError::Protocol(p) => SyncError::WebSocketError(p.to_string()),
            WsError::Io(io) => SyncError::ConnectionFailed(io.to_string()),
            WsError::Tls(tls) => SyncError::TlsError(tls.to_string()),
            other => SyncError::WebSocketError(other.to_string()),
        }
    }
}

// =============================================================================
// Error Categorization
// =============================================================================

impl SyncError {
    /// True when a later attempt may succeed without anyone changing
    /// configuration or data.
    ///
    /// ## Retryable
    /// - Connection failures, disconnects, timeouts
    /// - WebSocket protocol hiccups
    ///
    /// ## Not retryable
    /// - Configuration and protocol mismatches
    /// - Remote rejections (the payload itself was refused)
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            SyncError::ConnectionFailed(_)
                | SyncError::Disconnected
                | SyncError::Timeout(_)
                | SyncError::WebSocketError(_)
                | SyncError::TlsError(_)
        )
    }

    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            SyncError::InvalidConfig(_) | SyncError::InvalidUrl(_) | SyncError::ConfigLoadFailed(_)
        )
    }
}
