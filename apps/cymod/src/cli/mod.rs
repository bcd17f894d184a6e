//! # cymod CLI Module
//!
//! This module implements the CLI interface for cymod.
//!
//! ## Available Commands
//!
//! - `plan` - Show the resolved load order of every job
//! - `render` - Print the query stream (text or JSON lines)
//! - `hash` - Checksum the query stream to detect model drift
//! - `load` - Write the query stream into a journal
//! - `journal` - List the entries of a journal

mod commands;

use clap::{Args, Parser, Subcommand};
use cymod_core::CymodError;
use std::path::PathBuf;

pub use commands::*;

// =============================================================================
// CLI STRUCTURE
// =============================================================================

/// cymod - Cypher model loader
///
/// Turns directories of Cypher files and CSV transition tables into one
/// load-ordered stream of parameterised queries.
#[derive(Parser, Debug)]
#[command(name = "cymod")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress banner and summary output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Output in JSON format (for programmatic access)
    #[arg(long, global = true)]
    pub json_mode: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Where the query stream comes from.
///
/// Jobs from `--config` are registered first, then `--dir`, then `--table`.
#[derive(Args, Debug, Clone, Default)]
pub struct SourceArgs {
    /// TOML load plan
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Directory of Cypher files to load
    #[arg(short, long)]
    pub dir: Option<PathBuf>,

    /// Only load files whose name (without extension) ends with this suffix
    #[arg(short, long, requires = "dir")]
    pub suffix: Option<String>,

    /// Parameter file (JSON, YAML or TOML) for the `--dir` job
    #[arg(short, long, requires = "dir")]
    pub params: Option<PathBuf>,

    /// Transition table to load (CSV, or `.json` records)
    #[arg(short, long)]
    pub table: Option<PathBuf>,

    /// Start-state column of `--table`
    #[arg(long, default_value = "start", requires = "table")]
    pub start_col: String,

    /// End-state column of `--table`
    #[arg(long, default_value = "end", requires = "table")]
    pub end_col: String,

    /// Label override for `--table`, e.g. `State=LandCover` (repeatable)
    #[arg(short, long = "label", requires = "table")]
    pub labels: Vec<String>,

    /// Loader-wide global parameter file, overriding the load plan's
    #[arg(short, long)]
    pub globals: Option<PathBuf>,

    /// Emit a statement deleting nodes that carry the global parameters first
    #[arg(long)]
    pub refresh: bool,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show the resolved load order
    Plan {
        #[command(flatten)]
        source: SourceArgs,
    },

    /// Print every query of the stream
    Render {
        #[command(flatten)]
        source: SourceArgs,

        /// Substitute parameter values into the statements
        #[arg(short, long)]
        inline: bool,
    },

    /// Compute checksums of the query stream
    Hash {
        #[command(flatten)]
        source: SourceArgs,
    },

    /// Write the query stream into a journal
    Load {
        #[command(flatten)]
        source: SourceArgs,

        /// Journal database path, overriding the load plan's
        #[arg(short, long)]
        journal: Option<PathBuf>,
    },

    /// List the entries of a journal
    Journal {
        /// Journal database path
        #[arg(short, long, default_value = "cymod.redb")]
        journal: PathBuf,
    },
}

// =============================================================================
// COMMAND EXECUTION
// =============================================================================

/// Execute the CLI with parsed arguments.
pub fn execute(cli: Cli) -> Result<(), CymodError> {
    let json_mode = cli.json_mode;
    let quiet = cli.quiet;

    match cli.command {
        Commands::Plan { source } => cmd_plan(&source, json_mode),
        Commands::Render { source, inline } => cmd_render(&source, json_mode, inline),
        Commands::Hash { source } => cmd_hash(&source, json_mode),
        Commands::Load { source, journal } => cmd_load(&source, json_mode, quiet, journal),
        Commands::Journal { journal } => cmd_journal(&journal, json_mode),
    }
}
