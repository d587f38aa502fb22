//! Command-line interface

pub mod commands;
pub mod plan;
pub mod render;

use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "dedup-cli",
    version,
    about = "Configure and run deduplication jobs against a dedup backend",
    long_about = "Browse entities, source systems and files of a deduplication backend, \
                  configure fuzzy and exact column mappings, and run independent or \
                  cross-system deduplication."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Config file (default: ~/.config/dedup-cli/config.toml)
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Backend base URL, overriding config and DEDUP_API_URL
    #[arg(long, global = true, value_name = "URL")]
    pub api_url: Option<String>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List entities known to the backend
    Entities,

    /// List source systems of an entity
    Systems { entity: String },

    /// List source files of a source system
    Files { entity: String, source_system: String },

    /// List processed outputs of an entity, grouped by source system
    Outputs { entity: String },

    /// Show the columns of a source file or processed output
    Columns {
        entity: String,
        source_system: String,
        filename: String,
        /// Treat FILENAME as a processed output
        #[arg(long)]
        output: bool,
    },

    /// Check backend health
    Health,

    /// Download a processed output
    Download {
        filename: String,
        /// Destination path (default: FILENAME in the current directory)
        #[arg(short, long, value_name = "PATH")]
        output: Option<PathBuf>,
    },

    /// Delete one processed output
    DeleteOutput {
        entity: String,
        source_system: String,
        filename: String,
    },

    /// Delete every processed output of an entity
    ClearOutputs {
        entity: String,
        /// Do not ask for confirmation
        #[arg(long)]
        yes: bool,
    },

    /// Configure a session from a plan file and run it
    Run {
        plan: PathBuf,
        /// Validate and print the request without processing
        #[arg(long)]
        dry_run: bool,
    },
}

impl Cli {
    /// Default log filter for the verbosity count
    pub fn log_filter(&self) -> &'static str {
        match self.verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    }
}
