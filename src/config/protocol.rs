//! Protocol configuration: concurrency-control algorithm and workload
//!
//! The wire layout of several message variants depends on which
//! concurrency-control algorithm and which workload a run uses. That
//! choice is fixed per deployment, not per message, so it travels as an
//! explicit value threaded into codec construction: one binary can be
//! exercised under every configuration, and every codec built from the
//! same `ProtocolConfig` agrees on a structurally consistent layout.

use serde::{Deserialize, Serialize};

/// Concurrency-control algorithm selected for a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CcAlgorithm {
    /// MaaT-style timestamp validation (the default)
    Maat,
    /// Basic timestamp ordering
    Timestamp,
    /// Multi-version concurrency control
    Mvcc,
    /// Wait-die two-phase locking
    WaitDie,
    /// Optimistic concurrency control
    Occ,
    /// Calvin-style deterministic batching
    Calvin,
}

impl CcAlgorithm {
    /// Whether query messages under this algorithm carry the
    /// transaction's logical timestamp.
    pub fn carries_timestamp(self) -> bool {
        matches!(
            self,
            CcAlgorithm::Maat | CcAlgorithm::Timestamp | CcAlgorithm::Mvcc | CcAlgorithm::WaitDie
        )
    }

    /// Whether query messages under this algorithm carry the
    /// transaction's start timestamp (optimistic validation window).
    pub fn carries_start_timestamp(self) -> bool {
        matches!(self, CcAlgorithm::Occ)
    }

    /// Whether this algorithm pre-assigns deterministic batch and
    /// transaction identifiers that must survive the wire.
    pub fn is_coordinated(self) -> bool {
        matches!(self, CcAlgorithm::Calvin)
    }

    /// Stable name used in logs and the `layout` command.
    pub fn as_str(self) -> &'static str {
        match self {
            CcAlgorithm::Maat => "maat",
            CcAlgorithm::Timestamp => "timestamp",
            CcAlgorithm::Mvcc => "mvcc",
            CcAlgorithm::WaitDie => "wait-die",
            CcAlgorithm::Occ => "occ",
            CcAlgorithm::Calvin => "calvin",
        }
    }
}

/// Workload family whose query payloads the protocol carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WorkloadKind {
    /// Key-value requests with fixed-size access records
    Ycsb,
    /// Order-entry transactions (configuration-compatible only; this
    /// core does not construct TPC-C payloads)
    Tpcc,
}

impl WorkloadKind {
    /// Stable name used in logs and the `layout` command.
    pub fn as_str(self) -> &'static str {
        match self {
            WorkloadKind::Ycsb => "ycsb",
            WorkloadKind::Tpcc => "tpcc",
        }
    }
}

/// The protocol strategy for a run: fixed at deployment, consulted by
/// the codec and the message factory for every conditional field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProtocolConfig {
    /// Active concurrency-control algorithm
    #[serde(default = "default_cc")]
    pub cc: CcAlgorithm,
    /// Active workload family
    #[serde(default = "default_workload")]
    pub workload: WorkloadKind,
}

fn default_cc() -> CcAlgorithm {
    CcAlgorithm::Maat
}

fn default_workload() -> WorkloadKind {
    WorkloadKind::Ycsb
}

impl Default for ProtocolConfig {
    fn default() -> Self {
        Self {
            cc: default_cc(),
            workload: default_workload(),
        }
    }
}
