//! Ladder Core
//!
//! Domain kernel shared by every crate in the workspace:
//! - `StrategyConfig` and its validation rules
//! - Order sides and the order-record state machine
//! - Pure level-pricing functions (no hidden mutable level objects)
//! - The bounded operator log sink
//!
//! This crate performs no I/O and owns no tasks.

pub mod config;
pub mod level;
pub mod logsink;
pub mod order;

// Re-export main types
pub use config::{ConfigError, StrategyConfig};
pub use level::{level_price, level_step, spread_frac};
pub use logsink::{LogEntry, LogSink};
pub use order::{OrderState, Side};
