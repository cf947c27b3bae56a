//! quorumdb - distributed transaction execution core
//!
//! The message protocol and per-row concurrency control at the heart of
//! a multi-node transaction testbed: clients frame query messages to
//! server nodes, servers run them under a MaaT-style row controller and
//! reply, and log records ship between replicas - all over one typed,
//! configuration-aware binary protocol.

pub mod cc;
pub mod cli;
pub mod config;
pub mod executor;
pub mod log;
pub mod observability;
pub mod storage;
pub mod transport;
pub mod txn;
