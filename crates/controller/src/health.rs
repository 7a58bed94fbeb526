//! Tick health shared with the supervisor
//!
//! The controller publishes last-tick time and last error here instead of
//! touching the supervisor's lifecycle state, keeping the lifecycle lock
//! out of the hot loop.

use chrono::{DateTime, Utc};
use std::sync::Mutex;

#[derive(Debug, Default, Clone)]
struct HealthInner {
    last_tick_at: Option<DateTime<Utc>>,
    last_error: Option<String>,
}

/// Shared cell: written by the controller, snapshotted by the supervisor
#[derive(Debug, Default)]
pub struct RunHealth {
    inner: Mutex<HealthInner>,
}

impl RunHealth {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_tick(&self, now: DateTime<Utc>) {
        self.inner.lock().expect("health poisoned").last_tick_at = Some(now);
    }

    pub fn record_error(&self, message: impl Into<String>) {
        self.inner.lock().expect("health poisoned").last_error = Some(message.into());
    }

    /// (last_tick_at, last_error)
    pub fn snapshot(&self) -> (Option<DateTime<Utc>>, Option<String>) {
        let inner = self.inner.lock().expect("health poisoned");
        (inner.last_tick_at, inner.last_error.clone())
    }
}
