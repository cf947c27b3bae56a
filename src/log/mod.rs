//! Replicated log payloads
//!
//! The execution core does not persist a log itself; it defines the
//! checksummed record format that log-write messages carry between a
//! server node and its log replicas.

mod checksum;
mod record;

pub use checksum::{compute_checksum, verify_checksum};
pub use record::{LogRecord, LogRecordKind};
