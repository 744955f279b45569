//! CLI interface module
//!
//! Maps parsed commands onto [`ShortenerService`] calls and prints the results.

pub mod commands;

use std::fmt;

use crate::cli::{Commands, ConfigCommands};
use crate::errors::ShortenerError;
use crate::services::ShortenerService;
use commands::{
    batch_shorten, config_generate, health, list_owned, request_delete, resolve_alias, shorten,
    stats,
};

#[derive(Debug)]
pub enum CliError {
    StorageError(ShortenerError),
    CommandError(String),
}

impl CliError {
    /// Format as simple output
    pub fn format_simple(&self) -> String {
        match self {
            CliError::StorageError(err) => err.format_simple(),
            CliError::CommandError(msg) => format!("Command error: {}", msg),
        }
    }

    /// Format as colored output
    pub fn format_colored(&self) -> String {
        use colored::Colorize;
        match self {
            CliError::StorageError(err) => err.format_colored(),
            CliError::CommandError(msg) => {
                format!("{} {}", "Command error:".red().bold(), msg.white())
            }
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format_simple())
    }
}

impl std::error::Error for CliError {}

impl From<ShortenerError> for CliError {
    fn from(err: ShortenerError) -> Self {
        CliError::StorageError(err)
    }
}

/// 不需要存储的命令，返回 None 表示需要继续走 [`run_cli_command`]
pub async fn run_offline_command(cmd: &Commands) -> Option<Result<(), CliError>> {
    match cmd {
        Commands::Config {
            action: ConfigCommands::Generate { output_path, force },
        } => Some(config_generate(output_path.clone(), *force).await),
        _ => None,
    }
}

/// Run a CLI command against the service
pub async fn run_cli_command(service: &ShortenerService, cmd: Commands) -> Result<(), CliError> {
    match cmd {
        Commands::Shorten { url, owner } => shorten(service, &url, owner).await,
        Commands::Batch { owner, urls } => batch_shorten(service, &urls, owner).await,
        Commands::Resolve { alias, owner } => resolve_alias(service, &alias, owner).await,
        Commands::List { owner } => list_owned(service, owner).await,
        Commands::Delete { owner, aliases } => request_delete(service, aliases, owner).await,
        Commands::Stats => stats(service).await,
        Commands::Health => health(service).await,
        Commands::Config {
            action: ConfigCommands::Generate { output_path, force },
        } => config_generate(output_path, force).await,
    }
}
