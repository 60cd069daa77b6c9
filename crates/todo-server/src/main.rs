//! Todo server binary

use todo_server::{Config, TodoServer};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration first (needed for logging settings)
    let config = match Config::load() {
        Ok(cfg) => Some(cfg),
        Err(e) => {
            // Can't use tracing yet - not initialized
            eprintln!("Configuration error: {}", e);
            eprintln!("Using default configuration");
            None
        }
    };

    let (log_level, json) = match config {
        Some(ref cfg) => (
            cfg.logging.level.as_deref().unwrap_or("info").to_string(),
            cfg.logging.is_json(),
        ),
        None => ("info".to_string(), false),
    };
    common::logging::init_with_level(&log_level, json);

    let app_version =
        std::env::var("APP_VERSION").unwrap_or_else(|_| env!("CARGO_PKG_VERSION").to_string());
    tracing::info!(version = %app_version, "Todo server starting");

    let config = config.unwrap_or_else(|| {
        tracing::warn!("Using default configuration");
        Config::default()
    });

    TodoServer::new(config, app_version).run().await?;

    Ok(())
}
