//! Simulated venue
//!
//! In-process implementation of both gateway traits, used for paper
//! trading and tests. The book is set by the test harness rather than by a
//! feed; placements rest until cancelled, and post-only orders that would
//! execute against the touch are refused the way the real venue refuses
//! them. Failures can be scripted per call to exercise the controller's
//! recovery paths.

use crate::error::GatewayError;
use crate::messages::{BookSnapshot, OrderHandle, PlaceOrder};
use crate::traits::{ExchangeGateway, MarketSnapshotSource};
use async_trait::async_trait;
use ladder_core::Side;
use log::{debug, info};
use rust_decimal::Decimal;
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

/// One order resting at the simulated venue
#[derive(Debug, Clone)]
pub struct SimOrder {
    pub order: PlaceOrder,
    pub exchange_order_id: String,
}

#[derive(Debug, Default)]
struct SimState {
    book: Option<(Decimal, Decimal)>,
    resting: HashMap<String, SimOrder>,
    next_exchange_id: u64,
    place_calls: u64,
    cancel_calls: u64,
    scripted_place_failures: VecDeque<GatewayError>,
    scripted_cancel_failures: VecDeque<GatewayError>,
}

/// In-memory venue implementing both gateway traits
#[derive(Debug, Default)]
pub struct SimVenue {
    ticker: String,
    state: Mutex<SimState>,
}

impl SimVenue {
    pub fn new(ticker: impl Into<String>) -> Self {
        Self {
            ticker: ticker.into(),
            state: Mutex::new(SimState::default()),
        }
    }

    /// Set the current best bid/ask
    pub fn set_book(&self, bid: Decimal, ask: Decimal) {
        self.state.lock().expect("sim poisoned").book = Some((bid, ask));
    }

    /// Drop the book entirely; snapshots become `Unavailable`
    pub fn clear_book(&self) {
        self.state.lock().expect("sim poisoned").book = None;
    }

    /// Queue a failure for the next place call
    pub fn fail_next_place(&self, err: GatewayError) {
        self.state
            .lock()
            .expect("sim poisoned")
            .scripted_place_failures
            .push_back(err);
    }

    /// Queue a failure for the next cancel call
    pub fn fail_next_cancel(&self, err: GatewayError) {
        self.state
            .lock()
            .expect("sim poisoned")
            .scripted_cancel_failures
            .push_back(err);
    }

    /// Orders currently resting
    pub fn open_orders(&self) -> Vec<SimOrder> {
        self.state
            .lock()
            .expect("sim poisoned")
            .resting
            .values()
            .cloned()
            .collect()
    }

    pub fn place_calls(&self) -> u64 {
        self.state.lock().expect("sim poisoned").place_calls
    }

    pub fn cancel_calls(&self) -> u64 {
        self.state.lock().expect("sim poisoned").cancel_calls
    }

    fn would_cross(book: (Decimal, Decimal), side: Side, price: Decimal) -> bool {
        let (bid, ask) = book;
        match side {
            Side::Bid => price >= ask,
            Side::Ask => price <= bid,
        }
    }
}

#[async_trait]
impl MarketSnapshotSource for SimVenue {
    async fn best_bid_ask(&self, ticker: &str) -> Result<BookSnapshot, GatewayError> {
        let state = self.state.lock().expect("sim poisoned");
        if ticker != self.ticker {
            return Err(GatewayError::Unavailable(format!("unknown ticker {ticker}")));
        }
        match state.book {
            Some((bid, ask)) => Ok(BookSnapshot::new(ticker, bid, ask)),
            None => Err(GatewayError::Unavailable(format!("no book for {ticker}"))),
        }
    }
}

#[async_trait]
impl ExchangeGateway for SimVenue {
    async fn place_order(&self, order: PlaceOrder) -> Result<OrderHandle, GatewayError> {
        let mut state = self.state.lock().expect("sim poisoned");
        state.place_calls += 1;

        if let Some(err) = state.scripted_place_failures.pop_front() {
            debug!("[SIM] scripted place failure for {}: {err}", order.client_order_id);
            return Err(err);
        }
        if order.ticker != self.ticker {
            return Err(GatewayError::Rejected(format!("unknown ticker {}", order.ticker)));
        }
        if order.qty <= Decimal::ZERO {
            return Err(GatewayError::Rejected("non-positive quantity".to_string()));
        }

        if let Some(book) = state.book {
            if Self::would_cross(book, order.side, order.price) {
                if order.maker_only {
                    debug!(
                        "[SIM] post-only {} {} @ {} would cross {:?}",
                        order.side.as_str(),
                        order.client_order_id,
                        order.price,
                        book
                    );
                    return Err(GatewayError::PostOnlyWouldCross);
                }
                // Non-post-only crossing orders execute immediately; nothing rests
                info!(
                    "[SIM] taker fill {} {} {} @ {}",
                    order.side.as_str(),
                    order.qty,
                    order.ticker,
                    order.price
                );
                state.next_exchange_id += 1;
                let exchange_order_id = format!("sim-{}", state.next_exchange_id);
                return Ok(OrderHandle {
                    client_order_id: order.client_order_id,
                    exchange_order_id,
                });
            }
        }

        state.next_exchange_id += 1;
        let exchange_order_id = format!("sim-{}", state.next_exchange_id);
        let handle = OrderHandle {
            client_order_id: order.client_order_id.clone(),
            exchange_order_id: exchange_order_id.clone(),
        };
        debug!(
            "[SIM] resting {} {} {} @ {} ({})",
            order.side.as_str(),
            order.qty,
            order.ticker,
            order.price,
            exchange_order_id
        );
        state.resting.insert(
            order.client_order_id.clone(),
            SimOrder {
                order,
                exchange_order_id,
            },
        );
        Ok(handle)
    }

    async fn cancel_order(&self, client_order_id: &str) -> Result<(), GatewayError> {
        let mut state = self.state.lock().expect("sim poisoned");
        state.cancel_calls += 1;

        if let Some(err) = state.scripted_cancel_failures.pop_front() {
            debug!("[SIM] scripted cancel failure for {client_order_id}: {err}");
            return Err(err);
        }
        match state.resting.remove(client_order_id) {
            Some(_) => {
                debug!("[SIM] cancelled {client_order_id}");
                Ok(())
            }
            None => Err(GatewayError::NotFound),
        }
    }
}
