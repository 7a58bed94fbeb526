//! Ladder Gateway
//!
//! Everything the control loop needs from a venue, behind two narrow
//! traits:
//! - [`MarketSnapshotSource`] - best bid/ask on demand, polled, never pushes
//! - [`ExchangeGateway`] - place and cancel orders by client order id
//!
//! Failures are explicit result variants ([`GatewayError`]), never thrown
//! control flow, so the controller's state machine stays total. Routing to
//! the live or test venue is decided once per run from the config's
//! `testnet` flag ([`VenueEndpoint`]).
//!
//! [`SimVenue`] is the in-process venue used for paper trading and tests.

pub mod error;
pub mod messages;
pub mod sim;
pub mod traits;

// Re-export main types
pub use error::GatewayError;
pub use messages::{BookSnapshot, OrderHandle, PlaceOrder, VenueEndpoint};
pub use sim::SimVenue;
pub use traits::{ExchangeGateway, MarketSnapshotSource};
