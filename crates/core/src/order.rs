//! Order sides and the order-record state machine

use serde::{Deserialize, Serialize};

/// Side of a quoting level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    Bid,
    Ask,
}

impl Side {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Bid => "bid",
            Self::Ask => "ask",
        }
    }

    /// Both sides, in the order the controller visits them
    pub fn both() -> [Side; 2] {
        [Side::Bid, Side::Ask]
    }
}

/// Lifecycle state of one order record
///
/// Non-terminal states mean the order may still be resting at the venue;
/// the ledger allows at most one non-terminal record per (level, side).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderState {
    /// Submitted, acceptance unknown (a place call timed out)
    Pending,
    /// Acknowledged and resting at the venue
    Resting,
    /// Marked for cancellation (TTL or price drift), cancel not yet issued
    Expiring,
    /// Cancel issued, completion unknown (cancel call timed out)
    Cancelling,
    /// Cancel confirmed
    Cancelled,
    /// Fully executed
    Filled,
    /// Place or cancel definitively refused by the venue
    Failed,
}

impl OrderState {
    /// Terminal states expect no further venue updates
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Cancelled | Self::Filled | Self::Failed)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Resting => "resting",
            Self::Expiring => "expiring",
            Self::Cancelling => "cancelling",
            Self::Cancelled => "cancelled",
            Self::Filled => "filled",
            Self::Failed => "failed",
        }
    }
}
