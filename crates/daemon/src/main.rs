//! Conveyor Daemon - Main Entry Point
//! Opens the configured store, loads routing and keeps it in sync

use anyhow::Result;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use conveyor_core::application::{shutdown_channel, ConfigWatcher};
use conveyor_core::VERSION;
use conveyor_repository::{env_config, new_repositories, watch_interval, RepositoryConfig};

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Initialize logging
    let log_format = std::env::var("CONVEYOR_LOG_FORMAT").unwrap_or_else(|_| "pretty".to_string());

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("conveyor=info"))?;

    match log_format.as_str() {
        "json" => {
            // Production: JSON structured logging
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().json())
                .init();
        }
        _ => {
            // Development: Pretty formatting with colors
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().pretty())
                .init();
        }
    }

    info!("Conveyor v{} starting...", VERSION);

    // 2. Load configuration (unknown driver or missing DSN stops startup)
    let settings = env_config().map_err(|e| anyhow::anyhow!("Invalid configuration: {}", e))?;
    let config = RepositoryConfig::from_config(&settings)
        .map_err(|e| anyhow::anyhow!("Invalid repository configuration: {}", e))?;
    let poll_interval =
        watch_interval(&settings).map_err(|e| anyhow::anyhow!("Invalid watch interval: {}", e))?;

    // 3. Open store and fill the routing cache
    let repos = new_repositories(&config)
        .await
        .map_err(|e| anyhow::anyhow!("Repository initialization failed: {}", e))?;

    // Routing was loaded by the factory; only the queue table is read here
    let queues = repos.queue.find_all().await?;
    info!(
        driver = %config.driver,
        queues = queues.len(),
        queue_revision = repos.queue.revision().await?,
        routing_revision = repos.routing.revision().await?,
        "Configuration loaded"
    );

    // 4. Start config watcher
    let (shutdown_tx, shutdown_rx) = shutdown_channel();
    let watcher = ConfigWatcher::new(repos.queue.clone(), repos.routing.clone(), poll_interval);
    let watcher_handle = tokio::spawn(watcher.run(shutdown_rx));

    info!("System ready. Press Ctrl+C to shutdown");

    // 5. Wait for shutdown signal
    tokio::signal::ctrl_c().await?;

    info!("Shutdown signal received. Exiting gracefully...");
    shutdown_tx.shutdown();
    let _ = tokio::time::timeout(Duration::from_secs(5), watcher_handle).await;

    info!("Shutdown complete.");
    Ok(())
}

