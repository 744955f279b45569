//! Command-line interface definitions using clap
//!
//! This module defines the CLI structure for shortener using clap's derive macros.

use clap::{Parser, Subcommand};

/// Shortener - deterministic URL shortening with pluggable storage
#[derive(Parser)]
#[command(name = "shortener")]
#[command(version)]
#[command(about = "Deterministic URL shortener with pluggable storage", long_about = None)]
pub struct Cli {
    /// Path to the TOML configuration file (default: config.toml)
    #[arg(long, short = 'c', global = true)]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand)]
pub enum Commands {
    /// Shorten a URL on behalf of an owner
    Shorten {
        /// URL to shorten
        url: String,

        /// Owner id
        #[arg(long, short = 'u')]
        owner: i64,
    },

    /// Shorten several URLs atomically
    Batch {
        /// Owner id
        #[arg(long, short = 'u')]
        owner: i64,

        /// URLs to shorten
        #[arg(required = true)]
        urls: Vec<String>,
    },

    /// Resolve an alias to its original URL
    Resolve {
        alias: String,

        /// Report the deletion state seen by this owner
        #[arg(long, short = 'u')]
        owner: Option<i64>,
    },

    /// List the aliases owned by an owner
    List {
        /// Owner id
        #[arg(long, short = 'u')]
        owner: i64,
    },

    /// Queue aliases for soft deletion
    Delete {
        /// Owner id
        #[arg(long, short = 'u')]
        owner: i64,

        /// Aliases to delete
        #[arg(required = true)]
        aliases: Vec<String>,
    },

    /// Show record and user counts
    Stats,

    /// Check storage liveness
    Health,

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigCommands,
    },
}

/// Configuration management commands
#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Generate example configuration file
    Generate {
        /// Output path (default: config.example.toml)
        output_path: Option<String>,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}
