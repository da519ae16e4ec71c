//! CLI command definitions for the `simulon` binary.
//!
//! Uses clap derive macros for argument parsing.

pub mod shell;
pub mod think;

use clap::{Parser, Subcommand};
use clap_complete::Shell;

use simulon_types::think::ThinkMode;

/// Chains of follow-up questions and answers from a single seed query.
#[derive(Parser)]
#[command(name = "simulon", version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output machine-readable JSON instead of styled text.
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress all output except errors.
    #[arg(long, global = true)]
    pub quiet: bool,

    /// Detailed output (-v for verbose, -vv for debug/trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Export spans through OpenTelemetry (stdout exporter).
    #[arg(long, global = true)]
    pub otel: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the HTTP server.
    Serve {
        /// Port to listen on.
        #[arg(short, long, env = "PORT", default_value = "5000")]
        port: u16,

        /// Host to bind to.
        #[arg(long, env = "SIMULON_HOST", default_value = "0.0.0.0")]
        host: String,
    },

    /// Ask a running server to think about a query.
    Think(ThinkArgs),

    /// Generate shell completions.
    Completions {
        /// Shell to generate completions for.
        shell: Shell,
    },
}

#[derive(clap::Args, Debug)]
pub struct ThinkArgs {
    /// The seed query. Several words are joined with spaces.
    #[arg(required = true)]
    pub query: Vec<String>,

    /// Base URL of the server.
    #[arg(long, env = "SIMULON_SERVER", default_value = "http://localhost:5000")]
    pub server: String,

    /// Delivery mode: batch, progressive, stream or single.
    #[arg(short, long, default_value = "stream")]
    pub mode: ThinkMode,

    /// Session id to continue; a fresh one is generated when absent.
    #[arg(short, long)]
    pub session: Option<String>,
}
