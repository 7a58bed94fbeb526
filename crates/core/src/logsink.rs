//! Operator log sink
//!
//! Append-only bounded ring of human-readable events. The sequence number
//! keeps counting past evictions, so a client polling `since(seq)` never
//! sees a line twice and can detect gaps after falling behind.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::Mutex;

/// Default capacity of the ring
pub const DEFAULT_LOG_CAPACITY: usize = 4000;

/// One operator-visible log line
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEntry {
    /// Monotonic sequence number, unique for the process lifetime
    pub seq: u64,
    pub timestamp: DateTime<Utc>,
    pub message: String,
}

#[derive(Debug)]
struct Ring {
    entries: VecDeque<LogEntry>,
    next_seq: u64,
}

/// Bounded, internally-serialized log buffer
///
/// Written by the controller and supervisor, read by the status API.
#[derive(Debug)]
pub struct LogSink {
    capacity: usize,
    ring: Mutex<Ring>,
}

impl LogSink {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            ring: Mutex::new(Ring {
                entries: VecDeque::new(),
                next_seq: 1,
            }),
        }
    }

    /// Append one line, evicting the oldest once at capacity
    pub fn push(&self, message: impl Into<String>) -> u64 {
        let mut ring = self.ring.lock().expect("log sink poisoned");
        let seq = ring.next_seq;
        ring.next_seq += 1;
        ring.entries.push_back(LogEntry {
            seq,
            timestamp: Utc::now(),
            message: message.into(),
        });
        while ring.entries.len() > self.capacity {
            ring.entries.pop_front();
        }
        seq
    }

    /// Entries with `seq > since`, oldest first; never blocks, never mutates
    pub fn since(&self, since: u64) -> Vec<LogEntry> {
        let ring = self.ring.lock().expect("log sink poisoned");
        ring.entries
            .iter()
            .filter(|e| e.seq > since)
            .cloned()
            .collect()
    }

    /// Sequence number the next push will receive
    pub fn next_seq(&self) -> u64 {
        self.ring.lock().expect("log sink poisoned").next_seq
    }
}

impl Default for LogSink {
    fn default() -> Self {
        Self::new(DEFAULT_LOG_CAPACITY)
    }
}
