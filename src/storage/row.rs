//! In-memory rows
//!
//! A row is the fixed-identity unit the concurrency controller attaches
//! to: it owns its MaaT state for its whole lifetime and a single
//! current value. Values move in and out as copies; nothing outside the
//! row aliases its interior.

use std::sync::Mutex;

use crate::cc::RowMaat;
use crate::txn::{ReturnCode, TxnHandle};

/// One partitioned in-memory row.
#[derive(Debug)]
pub struct Row {
    table_id: u32,
    primary_key: u64,
    value: Mutex<u64>,
    maat: RowMaat,
}

impl Row {
    /// Create a row with an initial value. Its concurrency state is
    /// created with it and destroyed with it.
    pub fn new(table_id: u32, primary_key: u64, value: u64) -> Self {
        Self {
            table_id,
            primary_key,
            value: Mutex::new(value),
            maat: RowMaat::new(),
        }
    }

    /// Table this row belongs to.
    pub fn table_id(&self) -> u32 {
        self.table_id
    }

    /// Primary key of this row.
    pub fn primary_key(&self) -> u64 {
        self.primary_key
    }

    /// The row's concurrency state.
    pub fn maat(&self) -> &RowMaat {
        &self.maat
    }

    /// Admit `txn` as a reader and return the current value.
    pub fn read(&self, txn: &TxnHandle) -> (ReturnCode, u64) {
        let rc = self.maat.read(txn);
        let value = *self.value.lock().expect("row value poisoned");
        (rc, value)
    }

    /// Admit `txn` as a writer; the value is applied at commit.
    pub fn prewrite(&self, txn: &TxnHandle) -> ReturnCode {
        self.maat.prewrite(txn)
    }

    /// Validate and commit `txn` on this row, applying `pending_value`
    /// when the transaction wrote it.
    pub fn commit(&self, txn: &TxnHandle, pending_value: Option<u64>) -> ReturnCode {
        let rc = self.maat.commit(txn);
        if rc == ReturnCode::Commit {
            if let Some(value) = pending_value {
                *self.value.lock().expect("row value poisoned") = value;
            }
        }
        rc
    }

    /// Drop `txn`'s intent without applying anything.
    pub fn release(&self, txn: &TxnHandle) -> ReturnCode {
        self.maat.release(txn)
    }

    /// Current committed value.
    pub fn value(&self) -> u64 {
        *self.value.lock().expect("row value poisoned")
    }
}
