//! Explicit caller identity and connectivity, passed into every operation.

use serde::{Deserialize, Serialize};

/// The user performing an operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub user_id: String,
    pub user_name: String,
}

impl Session {
    pub fn new(user_id: impl Into<String>, user_name: impl Into<String>) -> Self {
        Session {
            user_id: user_id.into(),
            user_name: user_name.into(),
        }
    }
}

/// Whether the remote system of record is reachable right now.
///
/// Decides where a completed sale lands: `sales` when online, the order
/// queue when offline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Connectivity {
    Online,
    Offline,
}

impl Connectivity {
    pub fn from_online(online: bool) -> Self {
        if online {
            Connectivity::Online
        } else {
            Connectivity::Offline
        }
    }

    #[inline]
    pub fn is_online(self) -> bool {
        self == Connectivity::Online
    }
}
