//! CLI command definitions for the `leafline` binary.
//!
//! Uses clap derive macros for argument parsing.

use clap::{Parser, Subcommand};
use clap_complete::Shell;

/// Yard-waste pickup bot for the Messenger platform.
#[derive(Parser)]
#[command(name = "leafline", version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Suppress all output except errors.
    #[arg(long, global = true)]
    pub quiet: bool,

    /// Detailed output (-v for verbose, -vv for debug/trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the webhook server.
    Serve {
        /// Listen port (overrides $PORT; default 1337).
        #[arg(long)]
        port: Option<u16>,

        /// Bind address.
        #[arg(long, default_value = "0.0.0.0")]
        host: String,
    },

    /// Show the store location and record counts.
    Status,

    /// Generate shell completions.
    Completions {
        /// Shell to generate completions for.
        shell: Shell,
    },
}
