//! Livefeed agent
//!
//! Runs one ingestion loop per built-in domain on a single-threaded runtime
//! and serves health, metrics and sink rows over HTTP.

use anyhow::Result;
use feed_lib::{health::HealthRegistry, observability::IngestMetrics};
use livefeed_agent::{api, config::AppConfig, pipeline};
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const AGENT_VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // Initialize tracing with JSON output and env filter
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(fmt::layer().json())
        .init();

    info!(version = AGENT_VERSION, "Starting livefeed-agent");

    let config = AppConfig::load()?;
    info!(
        data_dir = %config.data_dir.display(),
        interval_secs = config.interval_secs,
        max_rounds = ?config.max_rounds,
        failure_policy = ?config.failure_policy,
        "Agent configured"
    );

    let health_registry = HealthRegistry::new();
    let metrics = IngestMetrics::new();

    let supervisor = pipeline::build_supervisor(&config, &health_registry)?;
    let handle = supervisor.start();
    health_registry.set_ready(true).await;

    let app_state = Arc::new(api::AppState::new(
        health_registry.clone(),
        metrics,
        config.data_dir.clone(),
    ));
    let mut api_handle = tokio::spawn(api::serve(config.api_port, app_state));

    tokio::select! {
        signal = tokio::signal::ctrl_c() => {
            signal?;
            info!("SIGINT received");
        }
        result = &mut api_handle => {
            match result {
                Ok(Ok(())) => info!("API server exited"),
                Ok(Err(e)) => error!(error = %e, "API server failed"),
                Err(e) => error!(error = %e, "API server task failed"),
            }
        }
    }

    health_registry.set_ready(false).await;
    let summaries = handle.stop().await;
    for summary in &summaries {
        info!(
            domain = %summary.domain,
            rounds = summary.rounds_completed,
            degraded_rounds = summary.degraded_rounds,
            "Loop finished"
        );
    }
    api_handle.abort();
    info!("Shutting down");

    Ok(())
}
