//! Ladder Ledger
//!
//! In-memory authoritative record of intended vs. actually-resting orders
//! per quoting slot. Pure data plus reconciliation logic, no I/O.
//!
//! Core invariant: at most one non-terminal [`OrderRecord`] exists per
//! `(level index, side)` slot at any time. [`LevelLedger::upsert`] guards
//! it; a violation is a caller bug surfaced as [`LedgerError::Conflict`].
//!
//! All methods are synchronous and internally serialized behind a single
//! mutex - order volume is tens of levels, correctness dominates
//! throughput. The controller's tick loop and the supervisor's stop-time
//! cancel-all sweep may call in concurrently.

pub mod record;

pub use record::OrderRecord;

use ladder_core::{OrderState, Side};
use std::collections::HashMap;
use std::sync::Mutex;
use thiserror::Error;

/// Ledger errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    #[error("slot ({index}, {side:?}) already holds non-terminal order {occupant} ({state:?})")]
    Conflict {
        index: u32,
        side: Side,
        occupant: String,
        state: OrderState,
    },

    #[error("unknown order {0}")]
    UnknownOrder(String),
}

pub type Result<T> = std::result::Result<T, LedgerError>;

/// Authoritative per-slot order record store
#[derive(Debug, Default)]
pub struct LevelLedger {
    slots: Mutex<HashMap<(u32, Side), OrderRecord>>,
}

impl LevelLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or transition the record for its slot
    ///
    /// Fails with [`LedgerError::Conflict`] when a different non-terminal
    /// record occupies the slot; re-upserting the same `client_order_id`
    /// is the in-place transition path. A terminal occupant is displaced.
    pub fn upsert(&self, record: OrderRecord) -> Result<()> {
        let mut slots = self.slots.lock().expect("ledger poisoned");
        let key = (record.level_index, record.side);
        if let Some(occupant) = slots.get(&key) {
            if !occupant.state.is_terminal() && occupant.client_order_id != record.client_order_id {
                return Err(LedgerError::Conflict {
                    index: key.0,
                    side: key.1,
                    occupant: occupant.client_order_id.clone(),
                    state: occupant.state,
                });
            }
        }
        slots.insert(key, record);
        Ok(())
    }

    /// Record for a slot, if any (terminal records included)
    pub fn get(&self, index: u32, side: Side) -> Option<OrderRecord> {
        self.slots
            .lock()
            .expect("ledger poisoned")
            .get(&(index, side))
            .cloned()
    }

    /// Every record that may still rest at the venue
    pub fn all_non_terminal(&self) -> Vec<OrderRecord> {
        self.slots
            .lock()
            .expect("ledger poisoned")
            .values()
            .filter(|r| !r.state.is_terminal())
            .cloned()
            .collect()
    }

    /// Transition a record's state by client order id
    pub fn mark_state(&self, client_order_id: &str, state: OrderState) -> Result<()> {
        let mut slots = self.slots.lock().expect("ledger poisoned");
        match slots
            .values_mut()
            .find(|r| r.client_order_id == client_order_id)
        {
            Some(record) => {
                record.state = state;
                Ok(())
            }
            None => Err(LedgerError::UnknownOrder(client_order_id.to_string())),
        }
    }

    /// Record the venue ack: state becomes Resting with the exchange id
    pub fn mark_resting(&self, client_order_id: &str, exchange_order_id: &str) -> Result<()> {
        let mut slots = self.slots.lock().expect("ledger poisoned");
        match slots
            .values_mut()
            .find(|r| r.client_order_id == client_order_id)
        {
            Some(record) => {
                record.state = OrderState::Resting;
                record.exchange_order_id = Some(exchange_order_id.to_string());
                Ok(())
            }
            None => Err(LedgerError::UnknownOrder(client_order_id.to_string())),
        }
    }

    /// Remove a record entirely, freeing its slot
    pub fn remove(&self, client_order_id: &str) {
        let mut slots = self.slots.lock().expect("ledger poisoned");
        slots.retain(|_, r| r.client_order_id != client_order_id);
    }

    pub fn len(&self) -> usize {
        self.slots.lock().expect("ledger poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
