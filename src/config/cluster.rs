//! Cluster topology configuration
//!
//! Loaded once from a JSON file at startup, validated, then immutable.
//! Node identities follow the testbed convention: server nodes occupy
//! ids `[0, server_count)`, client nodes occupy
//! `[server_count, server_count + client_count)`.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use super::ProtocolConfig;

/// Result type for configuration loading and validation.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The config file could not be read
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    /// The config file is not valid JSON for this schema
    #[error("invalid config JSON: {0}")]
    Parse(#[from] serde_json::Error),

    /// The parsed config is internally inconsistent
    #[error("invalid cluster config: {0}")]
    Invalid(String),
}

/// Cluster configuration for one node of a run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClusterConfig {
    /// Identity of this run's cluster; generated if absent so two runs
    /// never share log provenance.
    #[serde(default)]
    pub cluster_id: Option<Uuid>,

    /// This node's identity within the cluster.
    pub node_id: u32,

    /// Number of server nodes, occupying ids `[0, server_count)`.
    #[serde(default = "default_server_count")]
    pub server_count: u32,

    /// Number of client nodes, occupying ids starting at `server_count`.
    #[serde(default = "default_client_count")]
    pub client_count: u32,

    /// Maximum transactions a client keeps in flight per server node.
    #[serde(default = "default_max_inflight")]
    pub max_inflight: u64,

    /// Protocol strategy for this run.
    #[serde(default)]
    pub protocol: ProtocolConfig,
}

fn default_server_count() -> u32 {
    2
}

fn default_client_count() -> u32 {
    1
}

fn default_max_inflight() -> u64 {
    100
}

impl ClusterConfig {
    /// Load configuration from a JSON file and validate it.
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let content = fs::read_to_string(path)?;
        let config: ClusterConfig = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate topology invariants.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.server_count == 0 {
            return Err(ConfigError::Invalid("server_count must be > 0".into()));
        }
        if self.node_id >= self.total_nodes() {
            return Err(ConfigError::Invalid(format!(
                "node_id {} out of range for {} nodes",
                self.node_id,
                self.total_nodes()
            )));
        }
        if self.max_inflight == 0 {
            return Err(ConfigError::Invalid("max_inflight must be > 0".into()));
        }
        Ok(())
    }

    /// Total number of nodes in the cluster.
    pub fn total_nodes(&self) -> u32 {
        self.server_count + self.client_count
    }

    /// Whether `node_id` names a server node.
    pub fn is_server_node(&self, node_id: u32) -> bool {
        node_id < self.server_count
    }

    /// Whether `node_id` names a client node.
    pub fn is_client_node(&self, node_id: u32) -> bool {
        node_id >= self.server_count && node_id < self.total_nodes()
    }

    /// The cluster identity, generating one for configs that omit it.
    pub fn cluster_id_or_new(&self) -> Uuid {
        self.cluster_id.unwrap_or_else(Uuid::new_v4)
    }
}
