//! Level pricing
//!
//! Prices are pure functions of (config, reference prices, index, side) so
//! the ledger invariant stays checkable independent of pricing policy.
//! Bid levels step down from the best bid, ask levels step up from the best
//! ask; index 0 joins the touch and never crosses the book.

use crate::order::Side;
use rust_decimal::Decimal;

/// Fractional spread: (ask - bid) / bid
///
/// Returns zero when the book is empty or crossed at/through zero.
pub fn spread_frac(bid: Decimal, ask: Decimal) -> Decimal {
    if bid <= Decimal::ZERO {
        return Decimal::ZERO;
    }
    (ask - bid) / bid
}

/// Price step between adjacent levels: a `min_spread` fraction of mid
pub fn level_step(mid: Decimal, min_spread: Decimal) -> Decimal {
    mid * min_spread
}

/// Derived price for a level slot
pub fn level_price(
    side: Side,
    index: u32,
    touch_bid: Decimal,
    touch_ask: Decimal,
    step: Decimal,
) -> Decimal {
    let offset = Decimal::from(index) * step;
    match side {
        Side::Bid => touch_bid - offset,
        Side::Ask => touch_ask + offset,
    }
}
