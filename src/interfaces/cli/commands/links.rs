//! Link commands

use colored::Colorize;

use crate::errors::ShortenerError;
use crate::interfaces::cli::CliError;
use crate::services::ShortenerService;

pub async fn shorten(service: &ShortenerService, url: &str, owner: i64) -> Result<(), CliError> {
    match service.create_url(url, owner).await {
        Ok(alias) => {
            println!(
                "{} {} -> {}",
                "✓".bold().green(),
                alias.cyan(),
                url.blue().underline()
            );
            Ok(())
        }
        Err(ShortenerError::AlreadyExists(alias)) => {
            println!(
                "{} {} -> {} {}",
                "ℹ".bold().blue(),
                alias.cyan(),
                url.blue().underline(),
                "(already shortened)".dimmed()
            );
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}

pub async fn batch_shorten(
    service: &ShortenerService,
    urls: &[String],
    owner: i64,
) -> Result<(), CliError> {
    let records = service.create_batch(urls, owner).await?;
    for record in &records {
        println!(
            "  {} -> {}",
            record.alias.cyan(),
            record.original_url.blue().underline()
        );
    }
    println!(
        "{} Shortened {} URLs",
        "✓".bold().green(),
        records.len().to_string().green()
    );
    Ok(())
}

pub async fn resolve_alias(
    service: &ShortenerService,
    alias: &str,
    owner: Option<i64>,
) -> Result<(), CliError> {
    let resolved = service.resolve(alias, owner).await?;
    if resolved.deleted {
        println!(
            "{} -> {} {}",
            alias.cyan(),
            resolved.original_url.blue().underline(),
            "(deleted)".red()
        );
    } else {
        println!(
            "{} -> {}",
            alias.cyan(),
            resolved.original_url.blue().underline()
        );
    }
    Ok(())
}

pub async fn list_owned(service: &ShortenerService, owner: i64) -> Result<(), CliError> {
    let records = service.list_owned(owner).await?;

    if records.is_empty() {
        println!("{} No short links found for owner {}", "ℹ".bold().blue(), owner);
        return Ok(());
    }

    println!("{}", format!("Short links of owner {}:", owner).bold().green());
    println!();
    for record in &records {
        let mut line = format!(
            "{} -> {}",
            record.alias.cyan(),
            record.original_url.blue().underline()
        );
        if record.deleted {
            line.push_str(&format!(" {}", "(deleted)".dimmed().red()));
        }
        println!("  {}", line);
    }
    println!();
    println!(
        "{} Total {} short links",
        "ℹ".bold().blue(),
        records.len().to_string().green()
    );
    Ok(())
}

pub async fn request_delete(
    service: &ShortenerService,
    aliases: Vec<String>,
    owner: i64,
) -> Result<(), CliError> {
    let count = aliases.len();
    service.request_delete(aliases, owner).await?;
    println!(
        "{} Queued {} aliases for deletion",
        "✓".bold().green(),
        count.to_string().green()
    );
    Ok(())
}
