//! Execution-side plumbing
//!
//! The receive-loop body (`Dispatcher`) plus the collaborator surfaces
//! it consumes: message queues, inflight accounting, and the startup
//! barrier. Thread scheduling and the raw transport stay outside the
//! core.

mod barrier;
mod dispatch;
mod flight;
mod queue;
mod source;

pub use barrier::StartupBarrier;
pub use dispatch::Dispatcher;
pub use flight::FlightControl;
pub use queue::{InMemoryQueue, MessageQueue};
pub use source::{FixedQuerySource, QuerySource};
