use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use persistence::{ChangeFeedListener, PgEarningsStore};
use tracing::info;

use seller_portal_api::app::{create_app, AppState};
use seller_portal_api::config::Config;
use seller_portal_api::jobs::{JobScheduler, PoolMetricsJob, ReconciliationJob};
use seller_portal_api::middleware;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let config = Config::load()?;

    middleware::logging::init_logging(&config.logging)
        .map_err(|e| anyhow::anyhow!("failed to initialise logging: {}", e))?;
    middleware::init_metrics().context("failed to install metrics recorder")?;

    info!("Starting Seller Portal API v{}", env!("CARGO_PKG_VERSION"));

    let pool_config = config.database.pool_config();
    info!(database = %pool_config.redacted_url(), "Connecting to database");
    let pool = persistence::db::create_pool(&pool_config).await?;

    info!("Running database migrations...");
    sqlx::migrate!("../persistence/src/migrations")
        .run(&pool)
        .await?;
    info!("Migrations completed");

    let store = Arc::new(PgEarningsStore::new(pool.clone()));
    let state = AppState::new(config.clone(), store, Some(pool.clone()))
        .context("failed to build session verifier")?;

    if let Some(notifier) = state.notifier.clone() {
        tokio::spawn(ChangeFeedListener::new(pool.clone(), notifier).run());
    }

    let mut scheduler = JobScheduler::new();
    scheduler.register(PoolMetricsJob::new(
        pool.clone(),
        Duration::from_secs(config.jobs.pool_metrics_interval_secs),
    ));
    if config.jobs.reconciliation_enabled {
        scheduler.register(ReconciliationJob::new(
            state.earnings.clone(),
            Duration::from_secs(config.jobs.reconciliation_interval_secs),
        ));
    }
    scheduler.start();

    let app = create_app(state);

    let addr = config.socket_addr()?;
    info!("Server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    scheduler.shutdown();
    scheduler.wait_for_shutdown(Duration::from_secs(10)).await;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
