//! Core types for the trade ledger
//!
//! The [`Trade`] record is stored as a flat JSON object. Field names are part
//! of the stored format and must not change:
//!
//! ```text
//! {"tradeID":"T1","fromParty":"Alice","toParty":"Bob","amount":100,"status":"Pending","ctime":"2024-03-01 09:15:00"}
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

/// Status every transition writes, whatever the caller asked for
pub const STATUS_IN_PROGRESS: &str = "InProgress";

/// A trade between two parties, keyed by a caller-chosen identifier
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Trade {
    /// Ledger key
    #[serde(rename = "tradeID")]
    pub trade_id: String,

    /// Sending party
    #[serde(rename = "fromParty")]
    pub from_party: String,

    /// Receiving party
    #[serde(rename = "toParty")]
    pub to_party: String,

    /// Amount (no sign or range constraint)
    pub amount: i64,

    /// Caller-supplied status
    pub status: String,

    /// Creation time, `YYYY-MM-DD HH:MM:SS` in the store's timezone
    #[serde(rename = "ctime")]
    pub created_at: String,
}

impl Trade {
    /// Encode to the stored JSON form
    pub fn to_bytes(&self) -> crate::Result<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }

    /// Decode from the stored JSON form
    pub fn from_bytes(bytes: &[u8]) -> crate::Result<Self> {
        Ok(serde_json::from_slice(bytes)?)
    }

    /// Force the fixed transition target, leaving every other field alone
    pub fn mark_in_progress(&mut self) {
        self.status = STATUS_IN_PROGRESS.to_string();
    }
}

impl fmt::Display for Trade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({} -> {}, {}, {})",
            self.trade_id, self.from_party, self.to_party, self.amount, self.status
        )
    }
}
