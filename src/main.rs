use clap::Parser;
use tracing::debug;

use shortener::cli::Cli;
use shortener::config::{get_config, init_config};
use shortener::interfaces::cli::{run_cli_command, run_offline_command};
use shortener::services::ShortenerService;
use shortener::storage::StorageFactory;
use shortener::system::init_logging;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    if let Some(result) = run_offline_command(&cli.command).await {
        if let Err(e) = result {
            eprintln!("{}", e.format_colored());
            std::process::exit(1);
        }
        return Ok(());
    }

    init_config(cli.config.as_deref())?;
    let config = get_config();
    let guard = init_logging(&config.logging)?;
    debug!("Configuration loaded: backend={}", config.storage.backend);

    let store = StorageFactory::create(&config.storage).await?;
    let service = ShortenerService::with_store(store, &config);

    let result = run_cli_command(&service, cli.command).await;

    // 删除队列排空后再关闭存储
    service.shutdown().await?;

    if let Err(e) = result {
        eprintln!("{}", e.format_colored());
        drop(guard);
        std::process::exit(1);
    }
    Ok(())
}
