//! Order records

use chrono::{DateTime, Utc};
use ladder_core::{OrderState, Side};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// The ledger's unit: one intended order for one quoting slot
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderRecord {
    /// Slot index, 0 at the touch
    pub level_index: u32,
    pub side: Side,
    /// Locally generated, unique for the run
    pub client_order_id: String,
    /// Assigned by the venue on ack
    pub exchange_order_id: Option<String>,
    pub desired_price: Decimal,
    pub desired_qty: Decimal,
    pub state: OrderState,
    pub placed_at: DateTime<Utc>,
}

impl OrderRecord {
    /// Create a fresh Pending record for a slot
    pub fn pending(
        level_index: u32,
        side: Side,
        client_order_id: impl Into<String>,
        desired_price: Decimal,
        desired_qty: Decimal,
        placed_at: DateTime<Utc>,
    ) -> Self {
        Self {
            level_index,
            side,
            client_order_id: client_order_id.into(),
            exchange_order_id: None,
            desired_price,
            desired_qty,
            state: OrderState::Pending,
            placed_at,
        }
    }

    /// Wall-clock age of the record
    pub fn age(&self, now: DateTime<Utc>) -> Duration {
        (now - self.placed_at).to_std().unwrap_or(Duration::ZERO)
    }
}
