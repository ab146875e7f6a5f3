/**
 * Palm Verify Server
 * HTTP front for palm enrollment and verification
 *
 * Configuration comes from PALM_* environment variables, logging from RUST_LOG.
 */

use palm_verify::api::{self, AppState};
use palm_verify::{BoxedSampleStore, Config, Engine, FileStore, MemoryStore};
use std::error::Error;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    info!("Starting Palm Verify Server");

    let config = Config::from_env()?;

    let store: BoxedSampleStore = match &config.store_dir {
        Some(dir) => {
            info!("Using file sample store at {}", dir.display());
            Box::new(FileStore::open(dir)?)
        }
        None => {
            info!("Using in-memory sample store");
            Box::new(MemoryStore::new())
        }
    };

    info!(
        "Matching: threshold={}, landmark_count={}",
        config.matching.threshold, config.matching.landmark_count
    );

    let state = AppState::new(Engine::new(store, config.matching));
    let app = api::router(state);

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    info!("Palm Verify Server listening on {}", config.bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Palm Verify Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
}
