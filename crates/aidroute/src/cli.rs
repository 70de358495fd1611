use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "aidroute")]
#[command(version)]
#[command(about = "AID routing table planner for NFC card emulation")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Build and print the routing table for each pass of a scenario
    Plan {
        /// Scenario JSON file
        scenario: PathBuf,

        /// Emit one JSON document instead of text
        #[arg(long)]
        json: bool,
    },

    /// Run a scenario against the simulated controller
    Apply {
        /// Scenario JSON file
        scenario: PathBuf,

        /// Do not append pass records to the history
        #[arg(long)]
        no_record: bool,
    },

    /// View recorded passes
    History {
        /// Show statistics summary
        #[arg(long)]
        stats: bool,

        /// Only passes from this scenario file
        #[arg(long)]
        scenario: Option<String>,

        /// Only passes from the last N hours
        #[arg(long)]
        hours: Option<u64>,

        /// Number of recent passes to show
        #[arg(short, long, default_value_t = 20)]
        limit: usize,
    },

    /// Print version information
    Version,
}
