//! Tradebook Service entry point.

use service_core::observability::init_tracing;
use tradebook_service::config::TradebookConfig;
use tradebook_service::services::init_metrics;
use tradebook_service::startup::Application;

#[tokio::main]
async fn main() -> std::io::Result<()> {
    // Load configuration
    let config = TradebookConfig::from_env().map_err(|e| {
        eprintln!("Failed to load configuration: {}", e);
        std::io::Error::other(format!("Configuration error: {}", e))
    })?;

    // Initialize tracing
    init_tracing(&config.service_name, &config.common.log_level);

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        "Starting tradebook-service"
    );

    // Initialize metrics
    init_metrics();

    let application = Application::build(config).await.map_err(|e| {
        tracing::error!("Failed to build application: {}", e);
        std::io::Error::other(format!("Startup error: {}", e))
    })?;

    application.run_until_stopped().await
}
