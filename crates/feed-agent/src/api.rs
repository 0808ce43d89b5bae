//! HTTP API for health checks, Prometheus metrics and sink rows

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use feed_lib::{
    domain::DomainSpec,
    error::IngestError,
    health::{ComponentStatus, HealthRegistry},
    observability::IngestMetrics,
    sink::{SinkReader, SinkTable},
};
use prometheus::{Encoder, TextEncoder};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub health_registry: HealthRegistry,
    pub metrics: IngestMetrics,
    pub data_dir: PathBuf,
    pub domains: Vec<DomainSpec>,
}

impl AppState {
    pub fn new(health_registry: HealthRegistry, metrics: IngestMetrics, data_dir: PathBuf) -> Self {
        Self {
            health_registry,
            metrics,
            data_dir,
            domains: DomainSpec::builtins(),
        }
    }

    fn reader(&self, domain: &str) -> Option<(&DomainSpec, SinkReader)> {
        self.domains.iter().find(|d| d.name == domain).map(|d| {
            let reader = SinkReader::new(self.data_dir.join(&d.sink_file), d.schema.clone());
            (d, reader)
        })
    }
}

/// Query string for `/domains/:domain/rows`
#[derive(Debug, Default, Deserialize)]
pub struct RowsQuery {
    /// Comma-separated entity names
    pub select: Option<String>,
}

impl RowsQuery {
    fn names(&self) -> Vec<String> {
        self.select
            .as_deref()
            .unwrap_or_default()
            .split(',')
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(String::from)
            .collect()
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

type ApiError = (StatusCode, Json<ErrorBody>);

fn api_error(status: StatusCode, error: impl ToString) -> ApiError {
    (
        status,
        Json(ErrorBody {
            error: error.to_string(),
        }),
    )
}

/// Health check response - returns 200 if healthy, 503 if degraded/unhealthy
async fn healthz(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let health = state.health_registry.health().await;

    let status_code = match health.status {
        ComponentStatus::Healthy => StatusCode::OK,
        ComponentStatus::Degraded => StatusCode::OK, // Still ingesting
        ComponentStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
    };

    (status_code, Json(health))
}

/// Readiness check response - returns 200 if ready, 503 if not ready
async fn readyz(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let readiness = state.health_registry.readiness().await;

    let status_code = if readiness.ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (status_code, Json(readiness))
}

/// Prometheus metrics endpoint
async fn metrics() -> impl IntoResponse {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();

    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        warn!(error = %e, "Failed to encode metrics");
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            [("content-type", "text/plain; charset=utf-8")],
            e.to_string().into_bytes(),
        );
    }

    (
        StatusCode::OK,
        [("content-type", "text/plain; charset=utf-8")],
        buffer,
    )
}

/// Current sink rows for a domain, optionally filtered by entity name
async fn rows(
    State(state): State<Arc<AppState>>,
    Path(domain): Path<String>,
    Query(query): Query<RowsQuery>,
) -> Result<Json<SinkTable>, ApiError> {
    let (spec, reader) = state.reader(&domain).ok_or_else(|| {
        api_error(StatusCode::NOT_FOUND, IngestError::UnknownDomain(domain.clone()))
    })?;

    let selected = query.names();
    spec.catalog
        .validate(&selected)
        .map_err(|e| api_error(StatusCode::BAD_REQUEST, e))?;

    let table = reader
        .read()
        .map_err(|e| api_error(StatusCode::INTERNAL_SERVER_ERROR, e))?;

    if selected.is_empty() {
        Ok(Json(table))
    } else {
        Ok(Json(table.select(&selected)))
    }
}

/// Create the API router
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        .route("/metrics", get(metrics))
        .route("/domains/:domain/rows", get(rows))
        .with_state(state)
}

/// Start the API server
pub async fn serve(port: u16, state: Arc<AppState>) -> anyhow::Result<()> {
    let app = create_router(state);

    let addr = format!("0.0.0.0:{}", port);
    info!(addr = %addr, "Starting API server");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
