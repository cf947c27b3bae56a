//! Transaction handle and return-code vocabulary
//!
//! The handle is the narrow boundary between this core and the
//! surrounding transaction manager: messages copy identity and
//! timestamps out of it on the send path and back onto it on the
//! receive path, and the row controller reads (never mutates) its
//! identifier and timestamp during validation.

use crate::txn::ClientQuery;

/// Sentinel for "no transaction assigned yet".
pub const UNSET_TXN_ID: u64 = u64::MAX;

/// Sentinel for "no batch assigned yet".
pub const UNSET_BATCH_ID: u64 = u64::MAX;

/// Terminal and intermediate outcomes a transaction operation reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ReturnCode {
    /// Operation admitted / in progress
    Ok = 0,
    /// Commit validation succeeded
    Commit = 1,
    /// Validation failed; caller owns rollback and retry policy
    Abort = 2,
    /// Operation must wait for another transaction
    Wait = 3,
    /// Unexpected failure surfaced to the manager
    Error = 4,
    /// Terminal acknowledgment of a finished transaction
    Finish = 5,
}

impl ReturnCode {
    /// Convert from the wire byte, `None` for invalid values.
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(ReturnCode::Ok),
            1 => Some(ReturnCode::Commit),
            2 => Some(ReturnCode::Abort),
            3 => Some(ReturnCode::Wait),
            4 => Some(ReturnCode::Error),
            5 => Some(ReturnCode::Finish),
            _ => None,
        }
    }

    /// Convert to the wire byte.
    pub fn as_u8(self) -> u8 {
        self as u8
    }
}

/// A transaction as seen by the protocol and the row controller.
///
/// The identifier and logical timestamp are assigned once by the manager
/// and immutable thereafter; the return code is decided at commit or
/// abort. Receive-path restoration (`Message::copy_to_txn`) is the one
/// place fields are written after creation.
#[derive(Debug, Clone)]
pub struct TxnHandle {
    txn_id: u64,
    timestamp: u64,
    start_timestamp: u64,
    batch_id: u64,
    client_start_ts: u64,
    client_node_id: u32,
    rc: ReturnCode,
    query: Option<ClientQuery>,
}

impl TxnHandle {
    /// Create a handle with an assigned identifier and timestamp.
    pub fn new(txn_id: u64, timestamp: u64) -> Self {
        Self {
            txn_id,
            timestamp,
            start_timestamp: timestamp,
            batch_id: UNSET_BATCH_ID,
            client_start_ts: 0,
            client_node_id: 0,
            rc: ReturnCode::Ok,
            query: None,
        }
    }

    /// Create an empty handle for receive-path restoration.
    pub fn unassigned() -> Self {
        Self::new(UNSET_TXN_ID, 0)
    }

    /// Globally unique transaction identifier.
    pub fn txn_id(&self) -> u64 {
        self.txn_id
    }

    /// Logical timestamp, assigned once.
    pub fn timestamp(&self) -> u64 {
        self.timestamp
    }

    /// Start timestamp for optimistic validation windows.
    pub fn start_timestamp(&self) -> u64 {
        self.start_timestamp
    }

    /// Batch identifier, `UNSET_BATCH_ID` until assigned.
    pub fn batch_id(&self) -> u64 {
        self.batch_id
    }

    /// Client-observed start time, echoed back on responses.
    pub fn client_start_ts(&self) -> u64 {
        self.client_start_ts
    }

    /// Node that originated this transaction's query.
    pub fn client_node_id(&self) -> u32 {
        self.client_node_id
    }

    /// Current return code.
    pub fn rc(&self) -> ReturnCode {
        self.rc
    }

    /// The query this transaction executes, if restored.
    pub fn query(&self) -> Option<&ClientQuery> {
        self.query.as_ref()
    }

    /// Record the terminal (or intermediate) outcome.
    pub fn set_rc(&mut self, rc: ReturnCode) {
        self.rc = rc;
    }

    /// Assign the batch this transaction belongs to.
    pub fn set_batch_id(&mut self, batch_id: u64) {
        self.batch_id = batch_id;
    }

    /// Restore identity from the wire (receive path only).
    pub fn restore_identity(&mut self, txn_id: u64, timestamp: u64) {
        self.txn_id = txn_id;
        self.timestamp = timestamp;
    }

    /// Restore the optimistic start timestamp (receive path only).
    pub fn restore_start_timestamp(&mut self, start_timestamp: u64) {
        self.start_timestamp = start_timestamp;
    }

    /// Restore the client-observed start time (receive path only).
    pub fn restore_client_start_ts(&mut self, client_start_ts: u64) {
        self.client_start_ts = client_start_ts;
    }

    /// Record which node to route the client response to.
    pub fn set_client_node_id(&mut self, node_id: u32) {
        self.client_node_id = node_id;
    }

    /// Attach the restored query (receive path only).
    pub fn set_query(&mut self, query: ClientQuery) {
        self.query = Some(query);
    }
}
