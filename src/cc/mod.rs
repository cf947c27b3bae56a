//! Concurrency control
//!
//! One latch per row, no cross-row locking: transactions conflicting on
//! different rows never block each other. The MaaT-style controller is
//! the representative timestamp-ordering implementation; its decisions
//! (`Commit` / `Abort`) drive the reply messages the executor builds.

mod row_maat;

pub use row_maat::RowMaat;
