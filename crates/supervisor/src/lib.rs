//! Strategy supervisor
//!
//! Owns the lifecycle of a single strategy run: starting the level
//! controller, reporting status, streaming operator logs and stopping with
//! a best-effort sweep of anything still resting at the venue. At most one
//! run is active at a time.

mod connector;
mod error;
mod status;
mod supervisor;

pub use connector::{SimConnector, VenueConnector};
pub use error::SupervisorError;
pub use status::{RunStatus, StatusSnapshot};
pub use supervisor::StrategySupervisor;
