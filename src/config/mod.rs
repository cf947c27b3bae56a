//! Configuration subsystem for QuorumDB
//!
//! Two layers, both immutable after startup:
//! - `ClusterConfig`: topology and identity of this node, loaded from JSON
//! - `ProtocolConfig`: the CC algorithm / workload strategy that decides
//!   which conditional fields exist on the wire for this run

mod cluster;
mod protocol;

pub use cluster::{ClusterConfig, ConfigError, ConfigResult};
pub use protocol::{CcAlgorithm, ProtocolConfig, WorkloadKind};
