//! Transaction boundary types
//!
//! The execution core does not own transactions; it reads their
//! identity, timestamps, and outcome through `TxnHandle` and carries
//! their work descriptions as `ClientQuery` payloads.

mod handle;
mod query;

pub use handle::{ReturnCode, TxnHandle, UNSET_BATCH_ID, UNSET_TXN_ID};
pub use query::{AccessType, ClientQuery, Request};
