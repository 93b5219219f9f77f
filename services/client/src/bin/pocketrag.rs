//! services/client/src/bin/pocketrag.rs

use client_lib::{adapters::HttpBackend, cli, config::Config, error::ClientError, session::SessionController};
use std::sync::Arc;
use tokio::io::BufReader;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), ClientError> {
    // --- 1. Load Configuration & Set Up Logging ---
    let config = Config::from_env()?;
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(config.log_level.to_string()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
    info!("Configuration loaded.");

    // --- 2. Initialize the Backend Adapter ---
    let backend = HttpBackend::new(&config.api_base, config.http_timeout)?;
    info!("Using the retrieval backend at {}", backend.base_url());
    let backend = Arc::new(backend);

    // --- 3. Build the Session Controller ---
    let controller = SessionController::new(backend);

    // --- 4. Run the Terminal Session ---
    cli::run(
        controller,
        &config,
        BufReader::new(tokio::io::stdin()),
        tokio::io::stdout(),
    )
    .await
}
