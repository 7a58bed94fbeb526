//! The level controller
//!
//! State machine per tick, per (level, side) slot:
//! - empty slot -> place at the derived level price
//! - Resting, fresh, priced within tolerance -> untouched
//! - Resting, aged past TTL or drifted -> mark Expiring, cancel; the
//!   replacement goes out on a later tick (two-phase, so a failed cancel
//!   can never leave old and new order resting together)
//! - Pending/Expiring/Cancelling at tick start -> a previous call timed
//!   out or was never completed; issue a reconciling cancel
//!
//! Gateway failures are result variants handled slot-locally; a ledger
//! conflict skips the slot for the tick and the loop carries on.

use crate::health::RunHealth;
use chrono::{DateTime, TimeDelta, Utc};
use ladder_core::{LogSink, OrderState, Side, StrategyConfig, level_price, level_step};
use ladder_gateway::{
    BookSnapshot, ExchangeGateway, GatewayError, MarketSnapshotSource, OrderHandle, PlaceOrder,
};
use ladder_ledger::{LedgerError, LevelLedger, OrderRecord};
use log::{debug, info, warn};
use rust_decimal::Decimal;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::{MissedTickBehavior, timeout};
use uuid::Uuid;

/// Upper bound on any single gateway call
pub const GATEWAY_CALL_TIMEOUT: Duration = Duration::from_secs(5);

/// Cadence of the operator-visible book status line, in seconds
const BOOK_STATUS_EVERY_SECS: i64 = 10;

/// The quoting-ladder control loop
pub struct LevelController {
    config: StrategyConfig,
    ledger: Arc<LevelLedger>,
    snapshots: Arc<dyn MarketSnapshotSource>,
    gateway: Arc<dyn ExchangeGateway>,
    sink: Arc<LogSink>,
    health: Arc<RunHealth>,
    /// Client-order-id prefix, unique per run
    run_prefix: String,
    order_counter: u64,
    /// Flood guards: log an outage / tight spread once per occurrence
    outage_logged: bool,
    tight_logged: bool,
    last_book_status: Option<DateTime<Utc>>,
}

impl LevelController {
    pub fn new(
        config: StrategyConfig,
        ledger: Arc<LevelLedger>,
        snapshots: Arc<dyn MarketSnapshotSource>,
        gateway: Arc<dyn ExchangeGateway>,
        sink: Arc<LogSink>,
        health: Arc<RunHealth>,
    ) -> Self {
        let run_prefix = Uuid::new_v4().simple().to_string()[..8].to_string();
        Self {
            config,
            ledger,
            snapshots,
            gateway,
            sink,
            health,
            run_prefix,
            order_counter: 0,
            outage_logged: false,
            tight_logged: false,
            last_book_status: None,
        }
    }

    /// Run until the stop signal flips; the signal is checked between
    /// ticks only, so an in-flight tick always completes its actions.
    pub async fn run(mut self, mut stop_rx: watch::Receiver<bool>) {
        info!(
            "[{}] controller started ({} levels/side, tick {:?}, ttl {:?})",
            self.config.ticker, self.config.levels_per_side, self.config.tick_interval, self.config.ttl
        );
        let mut interval = tokio::time::interval(self.config.tick_interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                changed = stop_rx.changed() => {
                    if changed.is_err() || *stop_rx.borrow() {
                        break;
                    }
                }
                _ = interval.tick() => {
                    self.tick(Utc::now()).await;
                }
            }
        }

        info!("[{}] controller stopped", self.config.ticker);
    }

    /// One pass over the ladder
    pub async fn tick(&mut self, now: DateTime<Utc>) {
        let snapshot = match self.call_snapshot().await {
            Ok(snapshot) => {
                self.outage_logged = false;
                snapshot
            }
            Err(err) => {
                // Whole tick skipped, nothing cancelled; logged once per outage
                if !self.outage_logged {
                    self.note(format!("[{}] market data unavailable: {err}", self.config.ticker));
                    self.outage_logged = true;
                }
                self.health.record_error(err.to_string());
                self.health.record_tick(now);
                return;
            }
        };

        let spread = snapshot.spread_frac();

        // Periodic operator-visible book line, tight ticks included
        if self
            .last_book_status
            .is_none_or(|t| now - t >= TimeDelta::seconds(BOOK_STATUS_EVERY_SECS))
        {
            self.note(format!(
                "[{}] book bid={} ask={} spread={spread}",
                self.config.ticker, snapshot.bid, snapshot.ask
            ));
            self.last_book_status = Some(now);
        }

        if spread < self.config.min_spread {
            if !self.tight_logged {
                self.note(format!(
                    "[{}] spread too tight: {spread} < {}, standing ladder down",
                    self.config.ticker, self.config.min_spread
                ));
                self.tight_logged = true;
            }
            self.stand_down().await;
            self.health.record_tick(now);
            return;
        }
        self.tight_logged = false;

        let step = level_step(snapshot.mid(), self.config.min_spread);
        for side in Side::both() {
            for index in 0..self.config.levels_per_side {
                self.evaluate_slot(side, index, &snapshot, step, now).await;
            }
        }

        self.health.record_tick(now);
    }

    /// Cancel everything that may rest; the ladder stands down as a whole
    async fn stand_down(&mut self) {
        for record in self.ledger.all_non_terminal() {
            self.issue_cancel(&record, "spread below minimum").await;
        }
    }

    /// Visit one slot; at most one gateway action leaves here
    async fn evaluate_slot(
        &mut self,
        side: Side,
        index: u32,
        snapshot: &BookSnapshot,
        step: Decimal,
        now: DateTime<Utc>,
    ) {
        let desired_price = level_price(side, index, snapshot.bid, snapshot.ask, step);

        let existing = self.ledger.get(index, side);
        match existing {
            None => {
                self.place_level(side, index, desired_price, step, now).await;
            }
            Some(record) if record.state.is_terminal() => {
                // Failed last tick (or fully done): reset the slot and
                // re-evaluate it as empty
                self.ledger.remove(&record.client_order_id);
                self.place_level(side, index, desired_price, step, now).await;
            }
            Some(record) if record.state == OrderState::Resting => {
                let expired = record.age(now) >= self.config.ttl;
                let drifted = price_drift(record.desired_price, desired_price)
                    > self.config.requote_tolerance;
                if expired || drifted {
                    let reason = if expired { "ttl expired" } else { "price drifted" };
                    if let Err(err) = self
                        .ledger
                        .mark_state(&record.client_order_id, OrderState::Expiring)
                    {
                        warn!("[{}] {err}", self.config.ticker);
                        return;
                    }
                    self.issue_cancel(&record, reason).await;
                }
                // Fresh and on-price: leave untouched
            }
            Some(record) => {
                // Pending / Expiring / Cancelling: a previous call timed
                // out or never completed. Reconcile with a cancel; NotFound
                // resolves the order as already gone.
                self.issue_cancel(&record, "reconciling unknown outcome").await;
            }
        }
    }

    /// Place a fresh order for an empty slot
    async fn place_level(
        &mut self,
        side: Side,
        index: u32,
        price: Decimal,
        step: Decimal,
        now: DateTime<Utc>,
    ) {
        let coid = self.next_order_id(side, index);
        let record = OrderRecord::pending(
            index,
            side,
            &coid,
            price,
            self.config.amount_per_level,
            now,
        );
        if let Err(err @ LedgerError::Conflict { .. }) = self.ledger.upsert(record.clone()) {
            // Invariant guard fired: skip this slot for the tick
            self.note(format!("[{}] ledger conflict: {err}", self.config.ticker));
            self.health.record_error(err.to_string());
            return;
        }

        let order = PlaceOrder {
            ticker: self.config.ticker.clone(),
            side,
            price,
            qty: self.config.amount_per_level,
            client_order_id: coid.clone(),
            maker_only: self.config.maker_only,
        };

        match self.call_place(order.clone()).await {
            Ok(handle) => self.ack_resting(&coid, &handle, price),
            Err(GatewayError::PostOnlyWouldCross) => {
                // One retry, one step back from the touch; a second refusal
                // fails the slot rather than ever crossing the book
                let retreat = match side {
                    Side::Bid => price - step,
                    Side::Ask => price + step,
                };
                debug!(
                    "[{}] post-only {} level {index} would cross at {price}, retreating to {retreat}",
                    self.config.ticker,
                    side.as_str()
                );
                let retry = PlaceOrder {
                    price: retreat,
                    ..order
                };
                match self.call_place(retry).await {
                    Ok(handle) => {
                        let mut updated = record;
                        updated.desired_price = retreat;
                        if let Err(err) = self.ledger.upsert(updated) {
                            warn!("[{}] {err}", self.config.ticker);
                        }
                        self.ack_resting(&coid, &handle, retreat);
                    }
                    Err(err) => self.fail_place(&coid, side, index, &err),
                }
            }
            Err(GatewayError::Timeout) => {
                // Outcome unknown: the order may rest. Hold the slot and
                // reconcile with a cancel next tick instead of re-placing.
                let _ = self.ledger.mark_state(&coid, OrderState::Cancelling);
                self.note(format!(
                    "[{}] place timed out for {} level {index} ({coid}); reconciling next tick",
                    self.config.ticker,
                    side.as_str()
                ));
                self.health.record_error("place timeout".to_string());
            }
            Err(err) => self.fail_place(&coid, side, index, &err),
        }
    }

    fn ack_resting(&mut self, coid: &str, handle: &OrderHandle, price: Decimal) {
        if let Err(err) = self.ledger.mark_resting(coid, &handle.exchange_order_id) {
            warn!("[{}] {err}", self.config.ticker);
            return;
        }
        debug!(
            "[{}] resting {coid} @ {price} ({})",
            self.config.ticker, handle.exchange_order_id
        );
    }

    fn fail_place(&mut self, coid: &str, side: Side, index: u32, err: &GatewayError) {
        let _ = self.ledger.mark_state(coid, OrderState::Failed);
        self.note(format!(
            "[{}] place failed for {} level {index}: {err}",
            self.config.ticker,
            side.as_str()
        ));
        self.health.record_error(err.to_string());
    }

    /// Issue a cancel for a record and settle its state from the outcome
    async fn issue_cancel(&mut self, record: &OrderRecord, reason: &str) {
        match self.call_cancel(&record.client_order_id).await {
            Ok(()) => {
                let _ = self
                    .ledger
                    .mark_state(&record.client_order_id, OrderState::Cancelled);
                self.ledger.remove(&record.client_order_id);
                debug!(
                    "[{}] cancelled {} ({reason})",
                    self.config.ticker, record.client_order_id
                );
            }
            Err(GatewayError::NotFound) => {
                // Already gone at the venue (filled or never accepted)
                self.ledger.remove(&record.client_order_id);
                debug!(
                    "[{}] {} already gone at venue ({reason})",
                    self.config.ticker, record.client_order_id
                );
            }
            Err(err) => {
                // Keep the record non-terminal so the cancel is retried
                // next tick; never re-place over an unknown resting order
                let _ = self
                    .ledger
                    .mark_state(&record.client_order_id, OrderState::Cancelling);
                self.note(format!(
                    "[{}] cancel failed for {} ({reason}): {err}",
                    self.config.ticker, record.client_order_id
                ));
                self.health.record_error(err.to_string());
            }
        }
    }

    fn next_order_id(&mut self, side: Side, index: u32) -> String {
        self.order_counter += 1;
        let tag = match side {
            Side::Bid => 'b',
            Side::Ask => 'a',
        };
        format!("{}-{tag}{index}-{}", self.run_prefix, self.order_counter)
    }

    /// Log to both the process log and the operator sink
    fn note(&self, message: String) {
        info!("{message}");
        self.sink.push(message);
    }

    async fn call_snapshot(&self) -> Result<BookSnapshot, GatewayError> {
        match timeout(
            GATEWAY_CALL_TIMEOUT,
            self.snapshots.best_bid_ask(&self.config.ticker),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => Err(GatewayError::Timeout),
        }
    }

    async fn call_place(&self, order: PlaceOrder) -> Result<OrderHandle, GatewayError> {
        match timeout(GATEWAY_CALL_TIMEOUT, self.gateway.place_order(order)).await {
            Ok(result) => result,
            Err(_) => Err(GatewayError::Timeout),
        }
    }

    async fn call_cancel(&self, client_order_id: &str) -> Result<(), GatewayError> {
        match timeout(GATEWAY_CALL_TIMEOUT, self.gateway.cancel_order(client_order_id)).await {
            Ok(result) => result,
            Err(_) => Err(GatewayError::Timeout),
        }
    }
}

/// Fractional drift of the desired price relative to the resting price
fn price_drift(resting: Decimal, desired: Decimal) -> Decimal {
    if resting <= Decimal::ZERO {
        return Decimal::MAX;
    }
    ((desired - resting) / resting).abs()
}
