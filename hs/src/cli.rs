//! CLI argument parsing for historystore

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "hs")]
#[command(author, version, about = "Browse the prompt history written by the wizard", long_about = None)]
pub struct Cli {
    /// Path to config file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// History directory (overrides config)
    #[arg(short, long)]
    pub dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List all records, oldest first
    List,

    /// Display one record in full
    Show {
        /// Record ID (file name without .json)
        #[arg(required = true)]
        record_id: String,
    },

    /// Search requests and prompts
    Search {
        /// Search pattern (regex)
        #[arg(required = true)]
        pattern: String,

        /// Case insensitive match
        #[arg(short, long)]
        ignore_case: bool,

        /// Maximum results to return
        #[arg(short, long)]
        max_results: Option<usize>,
    },

    /// Show record counts per department
    Stats,

    /// Delete a record
    Delete {
        /// Record ID to delete
        #[arg(required = true)]
        record_id: String,
    },
}
