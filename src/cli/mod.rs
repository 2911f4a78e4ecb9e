//! CLI argument parsing for firstline
//!
//! Global flags: --vault, --format, --quiet, --verbose, --log-level,
//! --log-json.

pub mod output;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

pub use output::OutputFormat;

/// Firstline - keep note filenames in sync with their first content line
#[derive(Parser, Debug)]
#[command(name = "firstline")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Vault root directory
    #[arg(long, global = true, env = "FIRSTLINE_VAULT", default_value = ".")]
    pub vault: PathBuf,

    /// Output format
    #[arg(long, global = true, value_enum, default_value = "human")]
    pub format: OutputFormat,

    /// Suppress non-essential output
    #[arg(long, short, global = true)]
    pub quiet: bool,

    /// Verbose diagnostics for skipped insertions and codec ambiguities
    #[arg(long, short, global = true)]
    pub verbose: bool,

    /// Log level override (trace, debug, info, warn, error)
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    pub log_json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Write a default firstline.toml into the vault
    Init {
        /// Overwrite an existing config file
        #[arg(long)]
        force: bool,
    },

    /// Create a note and insert its filename-derived title
    Create {
        /// Vault-relative note path; `.md` is appended when missing
        name: String,

        /// Initial note content, e.g. a frontmatter template
        #[arg(long, allow_hyphen_values = true)]
        content: Option<String>,
    },

    /// Rename existing notes to match their first content line
    Sync {
        /// Vault-relative note paths
        paths: Vec<String>,

        /// Sync every markdown note in the vault
        #[arg(long)]
        all: bool,

        /// Show what would be renamed without touching anything
        #[arg(long)]
        dry_run: bool,
    },

    /// Convert between titles and filename-safe names
    Title {
        #[command(subcommand)]
        command: TitleCommands,
    },

    /// Show whether a note is in scope for processing
    Check {
        /// Vault-relative note path
        path: String,
    },

    /// Watch the vault and process newly created notes until interrupted
    Watch {
        /// Poll interval in milliseconds
        #[arg(long, default_value_t = 500)]
        interval_ms: u64,
    },
}

#[derive(Subcommand, Debug)]
pub enum TitleCommands {
    /// Replace forbidden characters, producing a filename-safe name
    Encode {
        /// Title text
        title: String,
    },

    /// Reverse the substitution, reconstructing the title
    Decode {
        /// Filename without extension
        filename: String,
    },
}
