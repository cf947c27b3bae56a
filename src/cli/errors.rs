//! # CLI Errors
//!
//! Error types for command-line entry points.

use thiserror::Error;

use crate::config::ConfigError;

/// Result type for CLI operations
pub type CliResult<T> = Result<T, CliError>;

/// CLI command errors
#[derive(Debug, Error)]
pub enum CliError {
    /// Configuration could not be loaded or validated
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// The selfcheck harness observed a wrong outcome
    #[error("selfcheck failed: {0}")]
    Selfcheck(String),
}
