//! Strategy configuration
//!
//! One immutable `StrategyConfig` per run, validated once at start.
//! The level count, tick interval, and requote tolerance were never pinned
//! down by the operator interface, so they are explicit policy knobs here
//! with conservative defaults rather than hard-coded constants.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Validation failures, all rejected before any order is placed
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("ticker must not be empty")]
    EmptyTicker,

    #[error("amount_per_level must be positive, got {0}")]
    NonPositiveAmount(Decimal),

    #[error("min_spread must be non-negative, got {0}")]
    NegativeMinSpread(Decimal),

    #[error("ttl must be positive")]
    ZeroTtl,

    #[error("levels_per_side must be positive")]
    ZeroLevels,

    #[error("tick_interval must be positive")]
    ZeroTickInterval,

    #[error("requote_tolerance must be positive, got {0}")]
    NonPositiveTolerance(Decimal),
}

/// Immutable per-run configuration for the level controller
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StrategyConfig {
    /// Instrument to quote
    pub ticker: String,
    /// Quantity resting at each level
    pub amount_per_level: Decimal,
    /// Minimum bid-ask spread (fraction of bid, e.g. 0.0005) before quoting
    pub min_spread: Decimal,
    /// Maximum age an order may rest before forced replacement
    pub ttl: Duration,
    /// Submit post-only; never allow a taker fill
    pub maker_only: bool,
    /// Route to the test venue
    pub testnet: bool,
    /// Number of levels quoted on each side
    pub levels_per_side: u32,
    /// Cadence of the control loop
    pub tick_interval: Duration,
    /// Fractional price drift tolerated before a level is replaced
    pub requote_tolerance: Decimal,
}

impl Default for StrategyConfig {
    fn default() -> Self {
        Self {
            ticker: "BTC-USD".to_string(),
            amount_per_level: dec!(0.01),
            min_spread: dec!(0.0005),
            ttl: Duration::from_secs(30),
            maker_only: true,
            testnet: false,
            levels_per_side: 3,
            tick_interval: Duration::from_secs(1),
            requote_tolerance: dec!(0.00025),
        }
    }
}

impl StrategyConfig {
    /// Validate every constraint; called once by the supervisor at start
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.ticker.trim().is_empty() {
            return Err(ConfigError::EmptyTicker);
        }
        if self.amount_per_level <= Decimal::ZERO {
            return Err(ConfigError::NonPositiveAmount(self.amount_per_level));
        }
        if self.min_spread < Decimal::ZERO {
            return Err(ConfigError::NegativeMinSpread(self.min_spread));
        }
        if self.ttl.is_zero() {
            return Err(ConfigError::ZeroTtl);
        }
        if self.levels_per_side == 0 {
            return Err(ConfigError::ZeroLevels);
        }
        if self.tick_interval.is_zero() {
            return Err(ConfigError::ZeroTickInterval);
        }
        if self.requote_tolerance <= Decimal::ZERO {
            return Err(ConfigError::NonPositiveTolerance(self.requote_tolerance));
        }
        Ok(())
    }
}
