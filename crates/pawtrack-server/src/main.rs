//! pawtrack-server
//!
//! Usage:
//!   pawtrack-server --port 3000 --shards 8 --utc-offset-minutes 120
//!   pawtrack-server --config thresholds.json

use clap::Parser;
use pawtrack_server::{
    api::{self, AppState},
    config::ServerConfig,
    metrics,
    shard::ShardPool,
};
use tokio::net::TcpListener;
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    let cfg = ServerConfig::parse();
    info!("Initializing pawtrack anomaly server");

    metrics::init();

    let settings = cfg.shard_settings().inspect_err(|e| error!("{}", e))?;
    let shard_count = cfg.shard_count();
    info!(
        shards = shard_count,
        window_days = settings.detector.window_days,
        max_subjects_per_shard = settings.registry.max_subjects,
        utc_offset_minutes = settings.utc_offset_minutes,
        "Configuring shard workers."
    );

    let (pool, worker_handles) = ShardPool::spawn(shard_count, settings)?;
    let state = AppState { pool };
    let app = api::router(state.clone());

    let addr = cfg.addr();
    let listener = TcpListener::bind(&addr).await?;

    info!(addr = %addr, "Server listening.");
    for (method, path, desc) in api::routes() {
        info!("  {:6} {:40} - {}", method, path, desc);
    }

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            if tokio::signal::ctrl_c().await.is_err() {
                error!("Failed to install CTRL+C handler");
                std::future::pending::<()>().await;
            }
            info!("Shutting down... (waiting for shard queues to drain)");
        })
        .await?;

    drop(state);
    info!("Shard channels closed.");

    for handle in worker_handles {
        if handle.join().is_err() {
            error!("Shard worker panicked");
        }
    }
    info!("All shards stopped. Goodbye.");

    Ok(())
}
