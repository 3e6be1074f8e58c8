use anyhow::Context;
use genius_server::core::router::create_router;
use genius_server::core::setup::setup_components;
use genius_server::core::state::AppState;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
    }
    info!("Shutting down");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let (config, sql_client, payment_client) = setup_components().await?;
    let addr = format!("0.0.0.0:{}", config.server_port);

    let app_state = Arc::new(AppState::new(config, sql_client, payment_client));
    let app = create_router(app_state)
        .await
        .context("Failed to create router")?;

    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    info!("Genius server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    Ok(())
}
