//! Upstream data sources
//!
//! Each fetcher turns one entity's lookup parameters into a numeric reading.
//! Calls are independent: a failure for one entity says nothing about the
//! others, and the caller decides what to do with it.

mod quote;
mod synthetic;
mod weather;

pub use quote::YahooQuoteFetcher;
pub use synthetic::{sample as synthetic_sample, SyntheticFetcher};
pub use weather::OpenWeatherFetcher;

use crate::error::FetchError;
use crate::models::Entity;
use std::time::Duration;

pub use async_trait::async_trait;

/// Default per-request timeout for HTTP fetchers
pub const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(10);

/// Trait for reading the current value of an entity
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Fetch the current value for one entity
    async fn fetch(&self, entity: &Entity) -> Result<f64, FetchError>;

    /// Short source name for logs
    fn source(&self) -> &'static str;
}

/// Build the HTTP client shared by the upstream fetchers
pub(crate) fn http_client(timeout: Duration) -> anyhow::Result<reqwest::Client> {
    use anyhow::Context;

    reqwest::Client::builder()
        .timeout(timeout)
        .user_agent(concat!("livefeed/", env!("CARGO_PKG_VERSION")))
        .build()
        .context("Failed to create HTTP client")
}

/// Read a successful response body, mapping non-2xx statuses to errors
pub(crate) async fn read_body(response: reqwest::Response) -> Result<String, FetchError> {
    let status = response.status();
    if !status.is_success() {
        return Err(FetchError::Status {
            status: status.as_u16(),
        });
    }
    Ok(response.text().await?)
}
