//! Stats and health commands

use colored::Colorize;

use crate::interfaces::cli::CliError;
use crate::services::ShortenerService;

pub async fn stats(service: &ShortenerService) -> Result<(), CliError> {
    let stats = service.stats().await?;
    println!("{}", "Storage statistics:".bold().green());
    println!("  Backend: {}", service.store().backend_name().cyan());
    println!("  URLs:    {}", stats.total_urls.to_string().green());
    println!("  Users:   {}", stats.total_users.to_string().green());
    Ok(())
}

pub async fn health(service: &ShortenerService) -> Result<(), CliError> {
    if service.health_check().await {
        println!("{} {}", "✓".bold().green(), "healthy".green());
        Ok(())
    } else {
        println!("{} {}", "✗".bold().red(), "unhealthy".red());
        Err(CliError::CommandError("health check failed".to_string()))
    }
}
