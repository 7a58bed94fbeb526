//! Venue-facing traits
//!
//! The controller only ever talks to a venue through these two seams, so a
//! live adapter and the simulated venue are interchangeable modulo routing.

use crate::error::GatewayError;
use crate::messages::{BookSnapshot, OrderHandle, PlaceOrder};
use async_trait::async_trait;

/// Supplies best bid/ask for a ticker on demand
#[async_trait]
pub trait MarketSnapshotSource: Send + Sync {
    /// Current best bid/ask, or `Unavailable` when the feed has no book
    async fn best_bid_ask(&self, ticker: &str) -> Result<BookSnapshot, GatewayError>;
}

/// Places and cancels orders, keyed by client order id
#[async_trait]
pub trait ExchangeGateway: Send + Sync {
    async fn place_order(&self, order: PlaceOrder) -> Result<OrderHandle, GatewayError>;

    async fn cancel_order(&self, client_order_id: &str) -> Result<(), GatewayError>;
}
