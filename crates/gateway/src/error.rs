//! Error types for the gateway crate

use thiserror::Error;

/// Venue-originated failures, consumed by the controller's state machine
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GatewayError {
    /// Order definitively refused by the venue
    #[error("Order rejected: {0}")]
    Rejected(String),

    /// Post-only order would have executed against the book
    #[error("Post-only order would cross the book")]
    PostOnlyWouldCross,

    /// Call exceeded its bounded timeout; true outcome unknown
    #[error("Timeout waiting for venue response")]
    Timeout,

    /// Cancel target not found (already gone, filled, or never accepted)
    #[error("Order not found")]
    NotFound,

    /// Market data missing for the requested ticker
    #[error("Market data unavailable: {0}")]
    Unavailable(String),

    /// Connection or protocol failure
    #[error("Transport error: {0}")]
    Transport(String),
}
