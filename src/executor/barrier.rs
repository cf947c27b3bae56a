//! Startup barrier
//!
//! A node may not start sending work until every peer has reported
//! INIT_DONE. The countdown is explicit shared state handed to whoever
//! processes control messages, not a global flag.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

/// Counts peer INIT_DONE messages down to release the send path.
#[derive(Debug)]
pub struct StartupBarrier {
    remaining: AtomicU64,
    ready: AtomicBool,
}

impl StartupBarrier {
    /// Barrier expecting `expected_peers` INIT_DONE observations.
    pub fn new(expected_peers: u64) -> Self {
        Self {
            remaining: AtomicU64::new(expected_peers),
            ready: AtomicBool::new(expected_peers == 0),
        }
    }

    /// Record one peer's INIT_DONE.
    ///
    /// Returns true for the observation that completed the barrier.
    /// Observations past zero are ignored (a peer resending INIT_DONE
    /// must not wedge the count).
    pub fn observe_init_done(&self) -> bool {
        let mut current = self.remaining.load(Ordering::Acquire);
        while current > 0 {
            match self.remaining.compare_exchange(
                current,
                current - 1,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => {
                    if current == 1 {
                        self.ready.store(true, Ordering::Release);
                        return true;
                    }
                    return false;
                }
                Err(observed) => current = observed,
            }
        }
        false
    }

    /// Whether every expected peer has reported in.
    pub fn is_ready(&self) -> bool {
        self.ready.load(Ordering::Acquire)
    }

    /// Peers still outstanding.
    pub fn remaining(&self) -> u64 {
        self.remaining.load(Ordering::Acquire)
    }
}
