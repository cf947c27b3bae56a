//! CLI module for QuorumDB
//!
//! Provides the command-line interface:
//! - validate: load and validate a cluster config
//! - layout: print the configured protocol's wire layout
//! - selfcheck: one-node encode/dispatch/commit smoke pass

mod args;
mod commands;
mod errors;

pub use args::{Cli, Command};
pub use commands::{layout, run_command, selfcheck, validate};
pub use errors::{CliError, CliResult};

/// Parse arguments and run the selected command.
pub fn run() -> CliResult<()> {
    run_command(Cli::parse_args())
}
