//! CLI module for the course assistant.

pub mod commands;
mod output;
pub mod preflight;

pub use output::Output;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Course TA - retrieval-augmented answers for course questions
///
/// Answers questions from a precomputed snapshot of course pages and forum
/// posts, citing the sources it used.
#[derive(Parser, Debug)]
#[command(name = "course-ta")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v for info, -vv for debug, -vvv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    /// Path to the corpus snapshot (overrides corpus.snapshot_path)
    #[arg(long, global = true, env = "COURSE_TA_SNAPSHOT")]
    pub snapshot: Option<PathBuf>,

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
    },

    /// Ask a single question and print the answer with its links
    Ask {
        /// The question to ask
        question: String,

        /// Image file to caption and include with the question
        #[arg(short, long)]
        image: Option<PathBuf>,

        /// Number of ranked fragments before reply expansion
        #[arg(short = 'k', long)]
        top_k: Option<usize>,

        /// Token budget for the context window
        #[arg(short = 't', long)]
        max_tokens: Option<usize>,
    },

    /// Show which fragments a query retrieves, without generating an answer
    Search {
        /// Search query
        query: String,

        /// Number of ranked fragments before reply expansion
        #[arg(short, long, default_value = "5")]
        limit: usize,
    },

    /// Show corpus statistics
    Stats,

    /// Check configuration, credentials and the corpus snapshot
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

    /// Open configuration file in editor
    Edit,

    /// Show configuration file path
    Path,
}
