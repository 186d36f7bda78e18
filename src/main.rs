use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use api_rest::{router, AppState};
use oss_core::CoreConfig;

/// Main entry point for the OSS file server
///
/// Starts the REST server on the configured address (default: 0.0.0.0:5000) and serves uploads
/// from the configured storage directory until interrupted.
///
/// # Environment Variables
/// - `UPLOAD_DIR`: Storage directory, created if missing (default: "./uploads")
/// - `OSS_REST_ADDR`: REST server address (default: "0.0.0.0:5000")
/// - `OSS_MAX_UPLOAD_BYTES`: Largest accepted request body (default: 16 MiB)
/// - `RUST_LOG`: Log filter
///
/// # Returns
/// * `Ok(())` - If the server starts and shuts down cleanly
/// * `Err(anyhow::Error)` - If configuration, the storage directory or the listener is unusable
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("oss=info".parse()?)
                .add_directive("api_rest=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cfg = Arc::new(CoreConfig::from_env()?);
    let state = AppState::from_config(cfg.clone())?;

    tracing::info!(
        "++ Starting OSS REST on {} (storage: {})",
        cfg.rest_addr(),
        state.store().root().display()
    );

    let listener = tokio::net::TcpListener::bind(cfg.rest_addr()).await?;
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("-- OSS REST stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
    }
}
