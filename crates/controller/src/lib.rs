//! Ladder Controller
//!
//! The control loop of the quoting agent. Once per tick it:
//! 1. reads a market snapshot,
//! 2. stands the whole ladder down when the spread is below the
//!    configured minimum,
//! 3. otherwise visits every (level, side) slot exactly once, placing,
//!    keeping, or two-phase-replacing its order,
//! 4. publishes tick health for the supervisor's status snapshot.
//!
//! Per-level failures are contained within the tick: one bad slot never
//! aborts the loop or the other slots. The loop stops cooperatively,
//! between ticks, via a `watch` signal.

pub mod controller;
pub mod health;

pub use controller::{GATEWAY_CALL_TIMEOUT, LevelController};
pub use health::RunHealth;
