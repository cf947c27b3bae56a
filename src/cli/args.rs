//! CLI argument definitions using clap
//!
//! Commands:
//! - quorumdb validate --config <path>
//! - quorumdb layout --config <path>
//! - quorumdb selfcheck --config <path>

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// QuorumDB - distributed transaction execution core
#[derive(Parser, Debug)]
#[command(name = "quorumdb")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Load a cluster config file and validate it
    Validate {
        /// Path to configuration file
        #[arg(long, default_value = "./quorumdb.json")]
        config: PathBuf,
    },

    /// Print the wire layout the configured protocol produces
    Layout {
        /// Path to configuration file
        #[arg(long, default_value = "./quorumdb.json")]
        config: PathBuf,
    },

    /// Run an in-process encode/dispatch/commit smoke pass
    Selfcheck {
        /// Path to configuration file
        #[arg(long, default_value = "./quorumdb.json")]
        config: PathBuf,
    },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}
