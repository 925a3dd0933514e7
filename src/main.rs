//! Revenue Forecaster — Entry Point
//!
//! Loads configuration, connects to the platform database, and runs the
//! metrics collector and HTTP API until SIGINT/SIGTERM.

use std::sync::Arc;

use tokio::signal;
use tracing::{error, info, warn};

use revenue_forecaster::clock::SystemClock;
use revenue_forecaster::config::Config;
use revenue_forecaster::db::pool;
use revenue_forecaster::ledger::postgres::PgLedger;
use revenue_forecaster::logging;
use revenue_forecaster::metrics::scheduler;
use revenue_forecaster::store::postgres::PgStore;
use revenue_forecaster::web::server::WebServer;
use revenue_forecaster::RevenueEngine;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file (ignore if missing)
    let _ = dotenvy::dotenv();

    let config = Config::load()?;

    logging::structured::init_logging(&config.logging);

    info!(
        version = env!("CARGO_PKG_VERSION"),
        collector_enabled = config.collector.enabled,
        web_enabled = config.web.enabled,
        "revenue-forecaster starting"
    );

    if config.database.url.is_empty() {
        anyhow::bail!("database url is not configured (set DATABASE_URL)");
    }
    let db_pool = pool::create_pool(&config.database).await?;
    pool::run_migrations(&db_pool).await?;
    pool::health_check(&db_pool).await?;
    info!("database connected and migrations applied");

    let engine = Arc::new(RevenueEngine::new(
        Arc::new(PgLedger::new(db_pool.clone())),
        Arc::new(PgStore::new(db_pool.clone())),
        Arc::new(SystemClock),
        &config,
    ));

    let _collector_handle = if config.collector.enabled {
        let aggregator = engine.metrics.clone();
        let collector_config = config.collector.clone();
        let clock = engine.clock.clone();
        Some(tokio::spawn(async move {
            scheduler::run_collection_loop(aggregator, clock, collector_config).await;
        }))
    } else {
        None
    };

    let _web_handle = if config.web.enabled {
        let web_server = WebServer::new(config.web.clone(), engine.clone());
        Some(tokio::spawn(async move {
            if let Err(e) = web_server.start().await {
                error!(error = %e, "web server error");
            }
        }))
    } else {
        None
    };

    info!("all subsystems started, waiting for shutdown signal");

    let shutdown = async {
        let ctrl_c = signal::ctrl_c();
        #[cfg(unix)]
        {
            let mut sigterm = signal::unix::signal(signal::unix::SignalKind::terminate())?;
            tokio::select! {
                _ = ctrl_c => { info!("received SIGINT"); }
                _ = sigterm.recv() => { info!("received SIGTERM"); }
            }
        }
        #[cfg(not(unix))]
        {
            ctrl_c.await?;
            info!("received SIGINT");
        }
        Ok::<(), std::io::Error>(())
    };

    shutdown.await?;

    warn!("shutting down");
    db_pool.close().await;
    info!("shutdown complete");
    Ok(())
}
