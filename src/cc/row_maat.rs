//! Per-row MaaT-style concurrency control
//!
//! Admission is optimistic: `read` and `prewrite` record intent and
//! always succeed. All conflict detection happens at `commit`, which
//! orders the committing transaction against the row's committed
//! read/write timestamps and against every other transaction still
//! holding uncommitted intent on the row. Conflicts come back as an
//! abort outcome for the transaction layer to handle; they are never
//! escalated.
//!
//! The uncommitted sets carry each transaction's admission timestamp
//! next to its identifier so commit-time validation can order
//! concurrent transactions without reaching back into any foreign
//! transaction state while the latch is held.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use crate::txn::{ReturnCode, TxnHandle};

/// Total order over concurrent transactions: timestamp first, lower
/// transaction id breaking ties.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
struct OrderKey {
    timestamp: u64,
    txn_id: u64,
}

impl OrderKey {
    fn for_txn(txn: &TxnHandle) -> Self {
        Self {
            timestamp: txn.timestamp(),
            txn_id: txn.txn_id(),
        }
    }
}

#[derive(Debug, Default)]
struct MaatState {
    /// Transactions with a read admitted but not yet terminal,
    /// keyed by id, holding the admission timestamp.
    uncommitted_reads: HashMap<u64, u64>,
    /// Transactions with a prewrite admitted but not yet terminal.
    uncommitted_writes: HashMap<u64, u64>,
    /// Timestamp of the most recent committed read.
    timestamp_last_read: u64,
    /// Timestamp of the most recent committed write.
    timestamp_last_write: u64,
}

impl MaatState {
    /// Whether any other uncommitted entry precedes `key` in
    /// (timestamp, id) order.
    fn older_intent_exists(&self, key: OrderKey, include_reads: bool) -> bool {
        let older = |(id, ts): (&u64, &u64)| {
            let other = OrderKey {
                timestamp: *ts,
                txn_id: *id,
            };
            *id != key.txn_id && other < key
        };
        if self.uncommitted_writes.iter().any(older) {
            return true;
        }
        include_reads && self.uncommitted_reads.iter().any(older)
    }
}

/// Concurrency state of one row, owned by that row for its lifetime.
///
/// The latch is held for the full duration of each operation and on
/// every exit path; nothing blocking happens inside the critical
/// section.
#[derive(Debug, Default)]
pub struct RowMaat {
    state: Mutex<MaatState>,
}

impl RowMaat {
    /// Fresh state with no outstanding intent and zero committed
    /// timestamps.
    pub fn new() -> Self {
        Self::default()
    }

    fn latch(&self) -> MutexGuard<'_, MaatState> {
        // A poisoned latch means a panic inside a critical section;
        // the row state can no longer be trusted.
        self.state.lock().expect("row latch poisoned")
    }

    /// Admit `txn` as a reader of this row.
    ///
    /// Optimistic: always succeeds; the serializability check is
    /// deferred to commit.
    pub fn read(&self, txn: &TxnHandle) -> ReturnCode {
        let (id, ts) = (txn.txn_id(), txn.timestamp());
        let mut state = self.latch();
        state.uncommitted_reads.insert(id, ts);
        ReturnCode::Ok
    }

    /// Admit `txn` as a writer of this row.
    ///
    /// Records intent only; the value is applied at commit.
    pub fn prewrite(&self, txn: &TxnHandle) -> ReturnCode {
        let (id, ts) = (txn.txn_id(), txn.timestamp());
        let mut state = self.latch();
        state.uncommitted_writes.insert(id, ts);
        ReturnCode::Ok
    }

    /// Validate and commit `txn`'s outstanding intent on this row.
    ///
    /// On success the relevant committed timestamp advances to
    /// `max(current, txn.timestamp)` and `txn` leaves the uncommitted
    /// sets. On conflict the committed timestamps and the sets are left
    /// untouched and `Abort` is returned; the caller must `release`.
    pub fn commit(&self, txn: &TxnHandle) -> ReturnCode {
        let key = OrderKey::for_txn(txn);
        let mut state = self.latch();

        let is_reader = state.uncommitted_reads.contains_key(&key.txn_id);
        let is_writer = state.uncommitted_writes.contains_key(&key.txn_id);

        if is_writer {
            // A write must not be ordered behind anything already
            // committed, and every older still-pending transaction
            // must reach its terminal state first.
            if key.timestamp < state.timestamp_last_write
                || key.timestamp < state.timestamp_last_read
                || state.older_intent_exists(key, true)
            {
                return ReturnCode::Abort;
            }
        }
        if is_reader {
            // A read is invalidated by a newer committed write and by
            // any older still-pending write.
            if key.timestamp < state.timestamp_last_write
                || state.older_intent_exists(key, false)
            {
                return ReturnCode::Abort;
            }
        }

        if is_writer {
            state.timestamp_last_write = state.timestamp_last_write.max(key.timestamp);
            state.uncommitted_writes.remove(&key.txn_id);
        }
        if is_reader {
            state.timestamp_last_read = state.timestamp_last_read.max(key.timestamp);
            state.uncommitted_reads.remove(&key.txn_id);
        }
        ReturnCode::Commit
    }

    /// Drop `txn`'s intent from both sets.
    ///
    /// The abort cleanup path; idempotent when `txn` is already absent.
    pub fn release(&self, txn: &TxnHandle) -> ReturnCode {
        let id = txn.txn_id();
        let mut state = self.latch();
        state.uncommitted_reads.remove(&id);
        state.uncommitted_writes.remove(&id);
        ReturnCode::Ok
    }

    /// Whether no transaction holds uncommitted intent on this row.
    pub fn is_idle(&self) -> bool {
        let state = self.latch();
        state.uncommitted_reads.is_empty() && state.uncommitted_writes.is_empty()
    }

    /// Timestamp of the most recent committed read.
    pub fn timestamp_last_read(&self) -> u64 {
        self.latch().timestamp_last_read
    }

    /// Timestamp of the most recent committed write.
    pub fn timestamp_last_write(&self) -> u64 {
        self.latch().timestamp_last_write
    }
}
