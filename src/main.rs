//! # Messenger Server
//!
//! This is the application entry point that initializes:
//! - Configuration loading
//! - Tracing/logging subsystem
//! - Storage backend and optional Redis notifications
//! - HTTP/WebSocket server

use anyhow::Result;
use tracing::info;

use messenger_server::config::Settings;
use messenger_server::presentation::http::handlers::health;
use messenger_server::startup::Application;

#[tokio::main]
async fn main() -> Result<()> {
    // Configuration decides the log format, so it loads first
    let settings = Settings::load()?;
    messenger_server::telemetry::init_tracing(settings.logging.format);
    health::init_server_start();

    info!(
        host = %settings.server.host,
        port = %settings.server.port,
        environment = %settings.environment,
        backend = ?settings.storage.backend,
        "Configuration loaded"
    );

    // Build and run the application
    let application = Application::build(settings).await?;

    info!("Server ready to accept connections");
    application.run_until_stopped().await?;

    Ok(())
}
