//! Wire-facing message types

use chrono::{DateTime, Utc};
use ladder_core::{Side, spread_frac};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

/// Best bid/ask for one ticker at one instant
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookSnapshot {
    pub ticker: String,
    pub bid: Decimal,
    pub ask: Decimal,
    pub timestamp: DateTime<Utc>,
}

impl BookSnapshot {
    pub fn new(ticker: impl Into<String>, bid: Decimal, ask: Decimal) -> Self {
        Self {
            ticker: ticker.into(),
            bid,
            ask,
            timestamp: Utc::now(),
        }
    }

    pub fn mid(&self) -> Decimal {
        (self.bid + self.ask) / dec!(2)
    }

    /// Fractional spread relative to the bid
    pub fn spread_frac(&self) -> Decimal {
        spread_frac(self.bid, self.ask)
    }
}

/// Order submission request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaceOrder {
    pub ticker: String,
    pub side: Side,
    pub price: Decimal,
    pub qty: Decimal,
    /// Client-assigned id, unique for the run
    pub client_order_id: String,
    /// Reject instead of executing as taker
    pub maker_only: bool,
}

/// Acknowledgement of an accepted order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderHandle {
    pub client_order_id: String,
    pub exchange_order_id: String,
}

/// Live vs. test venue endpoints
///
/// The core defines no wire protocol; the endpoint pair only routes a
/// concrete adapter. URLs follow the venue the agent was written against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VenueEndpoint {
    Live,
    Testnet,
}

impl VenueEndpoint {
    /// Resolve the routing from the per-run config flag
    pub fn select(testnet: bool) -> Self {
        if testnet { Self::Testnet } else { Self::Live }
    }

    pub fn api_url(&self) -> &'static str {
        match self {
            Self::Live => "https://api.hyperliquid.xyz",
            Self::Testnet => "https://api.hyperliquid-testnet.xyz",
        }
    }

    pub fn ws_url(&self) -> &'static str {
        match self {
            Self::Live => "wss://api.hyperliquid.xyz/ws",
            Self::Testnet => "wss://api.hyperliquid-testnet.xyz/ws",
        }
    }
}
