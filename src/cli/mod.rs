//! CLI module for Campus Helper.

pub mod commands;
mod output;
pub mod preflight;

pub use output::Output;

use clap::{Parser, Subcommand};

/// Campus Helper - retrieval-augmented campus assistant
///
/// Indexes a folder of campus documents, answers questions about them
/// together with the events list, and serves an HTTP API and a Telegram bot.
#[derive(Parser, Debug)]
#[command(name = "campus-helper")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the HTTP API server
    Serve {
        /// Host to bind to (defaults to server.host)
        #[arg(long)]
        host: Option<String>,

        /// Port to bind to (defaults to server.port)
        #[arg(short, long)]
        port: Option<u16>,

        /// Do not rebuild the index when new documents appear
        #[arg(long)]
        no_watch: bool,
    },

    /// Start the Telegram bot (talks to a running server)
    Bot,

    /// Rebuild the vector index from the knowledge base
    Reindex,

    /// Search the knowledge base
    Search {
        /// Search query
        query: String,

        /// Maximum number of results
        #[arg(short, long, default_value = "3")]
        limit: usize,
    },

    /// Ask a question and get an answer from the knowledge base and events
    Ask {
        /// The question to ask
        question: String,
    },

    /// Check configuration and data directories
    Doctor,

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Write the current configuration to the config file
    Init,

    /// Show configuration file path
    Path,
}
