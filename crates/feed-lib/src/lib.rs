//! Core library for the livefeed ingestion engine
//!
//! This crate provides the core functionality for:
//! - Static entity catalogs and data domains
//! - Upstream fetchers (OpenWeather, Yahoo quotes, synthetic)
//! - Sliding windows and the periodic ingestion loop
//! - Atomic CSV sinks, sink readers and sink watchers
//! - Render dispatch for sink consumers
//! - Health checks and observability

pub mod catalog;
pub mod domain;
pub mod error;
pub mod fetcher;
pub mod health;
pub mod ingest;
pub mod models;
pub mod observability;
pub mod sink;
pub mod view;
pub mod window;

pub use catalog::Catalog;
pub use domain::DomainSpec;
pub use error::{FetchError, IngestError, Result};
pub use health::{
    ComponentHealth, ComponentStatus, HealthRegistry, HealthResponse, ReadinessResponse,
};
pub use models::*;
pub use observability::{IngestMetrics, StructuredLogger};
pub use window::SlidingWindow;
