// Budget Tracker - Web Server

use anyhow::{Context, Result};
use budget_tracker::api::{router, AppState};
use budget_tracker::logging::init_tracing;
use budget_tracker::{open_store, BudgetService, Config};

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env().context("Failed to load configuration")?;
    init_tracing(config.log_format);

    let store = open_store(&config.store).context("Failed to open budget store")?;
    let state = AppState::new(BudgetService::new(store));
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(config.listen_addr)
        .await
        .with_context(|| format!("Failed to bind to {}", config.listen_addr))?;

    tracing::info!(
        version = budget_tracker::VERSION,
        "Server running on http://{}",
        config.listen_addr
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
    }
}
