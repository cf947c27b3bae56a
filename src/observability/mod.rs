//! Observability subsystem for QuorumDB
//!
//! Structured logging and exact operational counters. No tracing
//! framework, no sampling: a benchmark run must be attributable line by
//! line and counter by counter.

mod logger;
mod metrics;

pub use logger::{NodeLogger, Severity};
pub use metrics::{Counter, MetricsRegistry};
