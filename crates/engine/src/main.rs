use std::time::Duration;

use anyhow::Result;
use tracing::info;

use collar_track_engine::{app, config, logging};
use persistence::memory::MemoryStore;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    // Load configuration
    let config = config::Config::load()?;

    // Initialize logging
    logging::init_logging(&config.logging);

    info!("Starting CollarTrack engine v{}", env!("CARGO_PKG_VERSION"));

    // The durable store is an external collaborator; the default wiring
    // runs on the in-memory repository set.
    let store = MemoryStore::new();

    let mut app = app::build(&config, &store)?;
    app.start_sweeps();

    info!("Monitoring sweeps running; waiting for shutdown signal");

    tokio::signal::ctrl_c().await?;
    info!("Shutdown signal received");

    app.shutdown(Duration::from_secs(10)).await;

    Ok(())
}
