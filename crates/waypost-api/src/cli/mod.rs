//! CLI command definitions and dispatch for the `wpost` binary.
//!
//! Uses clap derive macros for argument parsing. The CLI follows a
//! verb-noun pattern (e.g., `wpost sessions list`, `wpost serve`).

pub mod session;
pub mod status;

use clap::{Parser, Subcommand};
use clap_complete::Shell;

/// Relay WhatsApp messages to a conversational AI backend.
#[derive(Parser)]
#[command(name = "wpost", version, about, long_about = None)]
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

    /// Export spans to the OpenTelemetry stdout exporter.
    #[arg(long, global = true)]
    pub otel: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the relay server (webhook receiver + admin API).
    Serve {
        /// Address to bind.
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        /// Port to listen on.
        #[arg(long, default_value_t = 3000)]
        port: u16,
    },

    /// Inspect and manage relay sessions.
    Sessions {
        #[command(subcommand)]
        action: SessionCommand,
    },

    /// Show relay status (data dir, database, session count, client mode).
    Status,

    /// Generate shell completion scripts.
    Completions {
        /// Target shell.
        shell: Shell,
    },
}

#[derive(Subcommand)]
pub enum SessionCommand {
    /// List sessions, most recently active first.
    #[command(alias = "ls")]
    List {
        /// Maximum number of sessions to show.
        #[arg(long)]
        limit: Option<i64>,
    },

    /// Show one session by identity.
    Show {
        /// Identity (phone number) of the session.
        identity: String,
    },

    /// Delete a session by identity. The next message re-provisions it.
    #[command(alias = "rm")]
    Delete {
        /// Identity (phone number) of the session.
        identity: String,

        /// Skip the safety check.
        #[arg(long)]
        force: bool,
    },
}
