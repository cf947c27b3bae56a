//! Inflight transaction accounting
//!
//! Clients cap how many transactions they keep outstanding per server
//! node. The counters are plain atomics shared by reference between the
//! send and receive paths of a client.

use std::sync::atomic::{AtomicI64, Ordering};

/// Per-server inflight counters with a shared cap.
#[derive(Debug)]
pub struct FlightControl {
    max_inflight: i64,
    counts: Vec<AtomicI64>,
}

impl FlightControl {
    /// Counters for `server_count` servers, each capped at
    /// `max_inflight`.
    pub fn new(server_count: u32, max_inflight: u64) -> Self {
        let counts = (0..server_count).map(|_| AtomicI64::new(0)).collect();
        Self {
            max_inflight: max_inflight as i64,
            counts,
        }
    }

    fn cell(&self, server: u32) -> &AtomicI64 {
        &self.counts[server as usize]
    }

    /// Claim one inflight slot for `server`.
    ///
    /// Returns the new count, or a negative value when the cap is
    /// reached (and no slot was claimed).
    pub fn inc_inflight(&self, server: u32) -> i64 {
        let new = self.cell(server).fetch_add(1, Ordering::AcqRel) + 1;
        if new > self.max_inflight {
            self.cell(server).fetch_sub(1, Ordering::AcqRel);
            return -1;
        }
        new
    }

    /// Return one inflight slot for `server` and report the new count.
    pub fn dec_inflight(&self, server: u32) -> i64 {
        self.cell(server).fetch_sub(1, Ordering::AcqRel) - 1
    }

    /// Current inflight count for `server`.
    pub fn get_inflight(&self, server: u32) -> i64 {
        self.cell(server).load(Ordering::Acquire)
    }

    /// Number of servers being tracked.
    pub fn server_count(&self) -> u32 {
        self.counts.len() as u32
    }
}
