//! # Sync Protocol Messages
//!
//! ## Protocol Overview
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  TILL      ───► SalePush { device_id, protocol_version, sale }          │
//! │  REMOTE    ◄─── SaleAck  { sale_id }                                    │
//! │                                                                         │
//! │  or                                                                     │
//! │  REMOTE    ◄─── Error    { code, message }   (sale stays queued)        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Wire Format
//! Adjacently tagged JSON, one message per WebSocket text frame:
//! ```json
//! { "type": "SalePush", "payload": { "device_id": "till-01", "sale": { ... } } }
//! ```
//!
//! The remote must treat a repeated `SalePush` for the same sale id as an
//! upsert; a till may push a sale again if it never saw the ack.

use serde::{Deserialize, Serialize};

use duka_core::Sale;

use crate::error::{SyncError, SyncResult};

pub const PROTOCOL_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload")]
pub enum SyncMessage {
    /// One completed sale from this till.
    SalePush(SalePush),

    /// The remote durably stored the sale.
    SaleAck { sale_id: String },

    Error { code: String, message: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SalePush {
    pub device_id: String,
    pub protocol_version: u32,
    pub sale: Sale,
}

impl SyncMessage {
    pub fn sale_push(device_id: impl Into<String>, sale: Sale) -> Self {
        SyncMessage::SalePush(SalePush {
            device_id: device_id.into(),
            protocol_version: PROTOCOL_VERSION,
            sale,
        })
    }

    pub fn to_json(&self) -> SyncResult<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(json: &str) -> SyncResult<Self> {
        serde_json::from_str(json).map_err(|e| SyncError::InvalidMessage(e.to_string()))
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            SyncMessage::SalePush(_) => "SalePush",
            SyncMessage::SaleAck { .. } => "SaleAck",
            SyncMessage::Error { .. } => "Error",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ack_wire_format() {
        let json = r#"{"type":"SaleAck","payload":{"sale_id":"INV-1700000000000"}}"#;
        let msg = SyncMessage::from_json(json).unwrap();
        assert_eq!(
            msg,
            SyncMessage::SaleAck {
                sale_id: "INV-1700000000000".to_string()
            }
        );
        assert_eq!(msg.to_json().unwrap(), json);
    }

    #[test]
    fn test_error_message() {
        let json = r#"{"type":"Error","payload":{"code":"BAD_TOTAL","message":"total mismatch"}}"#;
        let msg = SyncMessage::from_json(json).unwrap();
        assert_eq!(msg.type_name(), "Error");
    }

    #[test]
    fn test_unknown_type_is_invalid() {
        let err = SyncMessage::from_json(r#"{"type":"Hello","payload":{}}"#).unwrap_err();
        assert!(matches!(err, SyncError::InvalidMessage(_)));
    }
}
