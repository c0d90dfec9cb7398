//! CLI module for CORAL
//!
//! Provides command-line interface parsing for the coral-research binary.
//! Uses clap for argument parsing and owo-colors for colored terminal output.

/// Colored terminal output helpers.
pub mod output;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// C.O.R.A.L - Concurrent Orchestrated Research Agent Library
#[derive(Parser, Debug)]
#[command(
    name = "coral-research",
    version,
    about = "C.O.R.A.L - Concurrent Orchestrated Research Agent Library",
    long_about = "A multi-phase deep-research pipeline with bounded parallelism,\n\
                  dynamic topic discovery, and deterministic citation numbering.",
    after_help = "EXAMPLES:\n    \
                  coral-research init                          # Scaffold a coral.toml\n    \
                  coral-research run \"solid-state batteries\"   # Research a topic\n    \
                  coral-research run --series \"rust async\"     # One topic at a time\n    \
                  coral-research run -o report.md \"fuel cells\" # Write the report to a file"
)]
pub struct Cli {
    /// Path to the configuration file
    #[arg(short, long, default_value = "coral.toml", global = true)]
    pub config: PathBuf,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the research pipeline on a topic
    Run {
        /// The topic to research
        topic: String,

        /// Override the number of concurrent research workers
        #[arg(short, long)]
        parallel: Option<usize>,

        /// Research topics strictly one at a time
        #[arg(long, conflicts_with = "parallel")]
        series: bool,

        /// Write the report markdown to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Write a JSON snapshot of the finished run
        #[arg(long)]
        snapshot: Option<PathBuf>,
    },

    /// Initialize a coral.toml configuration file
    Init {
        /// Directory to initialize (defaults to current directory)
        #[arg(default_value = ".")]
        path: PathBuf,

        /// Overwrite an existing coral.toml
        #[arg(long)]
        force: bool,
    },
}
