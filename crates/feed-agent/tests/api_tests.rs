//! Integration tests for the agent API endpoints

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use feed_lib::{
    domain::DomainSpec,
    health::{components, HealthRegistry},
    models::Reading,
    observability::IngestMetrics,
    sink::CsvSink,
};
use livefeed_agent::api::{create_router, AppState};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tower::ServiceExt;

async fn setup_test_app() -> (Router, Arc<AppState>, TempDir) {
    let dir = TempDir::new().unwrap();
    let health_registry = HealthRegistry::new();
    health_registry.register(&components::ingest("locations")).await;
    health_registry.register(&components::ingest("stocks")).await;

    let metrics = IngestMetrics::new();
    let state = Arc::new(AppState::new(
        health_registry,
        metrics,
        dir.path().to_path_buf(),
    ));
    let router = create_router(state.clone());

    (router, state, dir)
}

fn write_stocks(dir: &TempDir) {
    let domain = DomainSpec::stocks();
    let sink = CsvSink::new(dir.path().join(&domain.sink_file), domain.schema.clone());
    let ts = chrono::NaiveDate::from_ymd_opt(2024, 3, 1)
        .unwrap()
        .and_hms_opt(9, 30, 0)
        .unwrap();

    let entities = domain.catalog.entities();
    let rows = vec![
        Reading::at(&entities[3], 140.0, ts),
        Reading::at(&entities[4], 135.5, ts),
        Reading::at(&entities[3], 141.0, ts),
    ];
    sink.write(&rows).unwrap();
}

async fn get_json(app: Router, uri: &str) -> (StatusCode, serde_json::Value) {
    let response = app
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();

    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&body).unwrap())
}

#[tokio::test]
async fn test_healthz_returns_ok_when_healthy() {
    let (app, _state, _dir) = setup_test_app().await;

    let (status, health) = get_json(app, "/healthz").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(health["status"], "healthy");
    assert!(health["components"]["ingest.locations"].is_object());
    assert!(health["components"]["ingest.stocks"].is_object());
}

#[tokio::test]
async fn test_healthz_returns_ok_when_degraded() {
    let (app, state, _dir) = setup_test_app().await;

    state
        .health_registry
        .set_degraded(&components::ingest("stocks"), "round 3: sink write failed")
        .await;

    let (status, health) = get_json(app, "/healthz").await;

    // A degraded round does not stop ingestion
    assert_eq!(status, StatusCode::OK);
    assert_eq!(health["status"], "degraded");
    assert_eq!(
        health["components"]["ingest.stocks"]["message"],
        "round 3: sink write failed"
    );
}

#[tokio::test]
async fn test_healthz_returns_503_when_unhealthy() {
    let (app, state, _dir) = setup_test_app().await;

    state
        .health_registry
        .set_unhealthy(&components::ingest("locations"), "stopped")
        .await;

    let (status, health) = get_json(app, "/healthz").await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(health["status"], "unhealthy");
}

#[tokio::test]
async fn test_readyz_follows_registry() {
    let (app, state, _dir) = setup_test_app().await;

    let (status, readiness) = get_json(app.clone(), "/readyz").await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(readiness["ready"], false);

    state.health_registry.set_ready(true).await;
    let (status, readiness) = get_json(app, "/readyz").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(readiness["ready"], true);
}

#[tokio::test]
async fn test_metrics_endpoint_returns_prometheus_format() {
    let (app, state, _dir) = setup_test_app().await;

    state
        .metrics
        .observe_round("stocks", Duration::from_millis(15));
    state.metrics.set_window_size("stocks", 5);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/metrics")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let content_type = response.headers().get("content-type").unwrap();
    assert!(content_type.to_str().unwrap().contains("text/plain"));

    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let metrics_text = String::from_utf8(body.to_vec()).unwrap();

    assert!(metrics_text.contains("livefeed_round_latency_seconds_bucket"));
    assert!(metrics_text.contains("livefeed_rounds_total"));
    assert!(metrics_text.contains("livefeed_window_size"));
}

#[tokio::test]
async fn test_rows_before_first_round_is_header_only() {
    let (app, _state, _dir) = setup_test_app().await;

    let (status, table) = get_json(app, "/domains/locations/rows").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        table["headers"],
        serde_json::json!(["Location", "Latitude", "Longitude", "Time", "Temp_F"])
    );
    assert_eq!(table["rows"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn test_rows_filtered_by_selection() {
    let (app, _state, dir) = setup_test_app().await;
    write_stocks(&dir);

    let (status, table) = get_json(app.clone(), "/domains/stocks/rows").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(table["rows"].as_array().unwrap().len(), 3);

    let (status, table) = get_json(app, "/domains/stocks/rows?select=NIKE%20Inc").await;
    assert_eq!(status, StatusCode::OK);
    let rows = table["rows"].as_array().unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0][0], "NIKE Inc");
    assert_eq!(rows[0][3], "140");
    assert_eq!(rows[1][3], "141");
}

#[tokio::test]
async fn test_rows_rejects_unknown_entity() {
    let (app, _state, dir) = setup_test_app().await;
    write_stocks(&dir);

    let (status, body) = get_json(app, "/domains/stocks/rows?select=NIKE%20Inc,Tesla").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("Tesla"));
}

#[tokio::test]
async fn test_rows_unknown_domain_is_404() {
    let (app, _state, _dir) = setup_test_app().await;

    let (status, body) = get_json(app, "/domains/bonds/rows").await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].as_str().unwrap().contains("bonds"));
}
