//! OpenWeatherMap current-conditions fetcher

use super::{async_trait, http_client, read_body, Fetcher, DEFAULT_HTTP_TIMEOUT};
use crate::error::FetchError;
use crate::models::{Entity, LookupParams};
use anyhow::{Context, Result};
use serde::Deserialize;
use std::time::Duration;
use url::Url;

const DEFAULT_BASE_URL: &str = "https://api.openweathermap.org/";

/// Current temperature (Fahrenheit) for a pair of coordinates
pub struct OpenWeatherFetcher {
    client: reqwest::Client,
    base_url: Url,
    api_key: String,
}

#[derive(Debug, Deserialize)]
struct WeatherResponse {
    main: WeatherMain,
}

#[derive(Debug, Deserialize)]
struct WeatherMain {
    temp: f64,
}

impl OpenWeatherFetcher {
    /// Create a fetcher against the public API
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        Self::with_base_url(api_key, DEFAULT_BASE_URL, DEFAULT_HTTP_TIMEOUT)
    }

    /// Create a fetcher against a custom endpoint
    pub fn with_base_url(
        api_key: impl Into<String>,
        base_url: &str,
        timeout: Duration,
    ) -> Result<Self> {
        let base_url = Url::parse(base_url).context("Invalid weather API URL")?;
        Ok(Self {
            client: http_client(timeout)?,
            base_url,
            api_key: api_key.into(),
        })
    }

    fn request_url(&self, latitude: f64, longitude: f64) -> Result<Url, FetchError> {
        let mut url = self
            .base_url
            .join("data/2.5/weather")
            .map_err(|e| FetchError::Malformed(format!("bad endpoint: {}", e)))?;
        url.query_pairs_mut()
            .append_pair("lat", &latitude.to_string())
            .append_pair("lon", &longitude.to_string())
            .append_pair("appid", &self.api_key)
            .append_pair("units", "imperial");
        Ok(url)
    }
}

#[async_trait]
impl Fetcher for OpenWeatherFetcher {
    async fn fetch(&self, entity: &Entity) -> Result<f64, FetchError> {
        let (latitude, longitude) = match &entity.lookup_params {
            LookupParams::Coordinates {
                latitude,
                longitude,
            } => (*latitude, *longitude),
            other => return Err(FetchError::Unsupported(other.to_string())),
        };

        let url = self.request_url(latitude, longitude)?;
        let response = self.client.get(url).send().await?;
        let body = read_body(response).await?;

        let parsed: WeatherResponse = serde_json::from_str(&body)
            .map_err(|e| FetchError::Malformed(format!("weather payload: {}", e)))?;
        Ok(parsed.main.temp)
    }

    fn source(&self) -> &'static str {
        "openweathermap"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;

    fn ely() -> Entity {
        Entity::location("ELY MN", 47.903237, -91.867087)
    }

    #[tokio::test]
    async fn test_fetch_temperature() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/data/2.5/weather")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("lat".into(), "47.903237".into()),
                Matcher::UrlEncoded("lon".into(), "-91.867087".into()),
                Matcher::UrlEncoded("appid".into(), "secret".into()),
                Matcher::UrlEncoded("units".into(), "imperial".into()),
            ]))
            .with_status(200)
            .with_body(r#"{"main":{"temp":71.6,"humidity":40},"name":"Ely"}"#)
            .create_async()
            .await;

        let fetcher =
            OpenWeatherFetcher::with_base_url("secret", &server.url(), Duration::from_secs(5))
                .unwrap();
        let temp = fetcher.fetch(&ely()).await.unwrap();

        assert_eq!(temp, 71.6);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_fetch_unauthorized() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", Matcher::Any)
            .with_status(401)
            .with_body(r#"{"cod":401,"message":"Invalid API key"}"#)
            .create_async()
            .await;

        let fetcher =
            OpenWeatherFetcher::with_base_url("bad", &server.url(), Duration::from_secs(5))
                .unwrap();
        let err = fetcher.fetch(&ely()).await.unwrap_err();

        assert!(matches!(err, FetchError::Status { status: 401 }));
    }

    #[tokio::test]
    async fn test_fetch_malformed_payload() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", Matcher::Any)
            .with_status(200)
            .with_body(r#"{"weather":[]}"#)
            .create_async()
            .await;

        let fetcher =
            OpenWeatherFetcher::with_base_url("key", &server.url(), Duration::from_secs(5))
                .unwrap();
        let err = fetcher.fetch(&ely()).await.unwrap_err();

        assert!(matches!(err, FetchError::Malformed(_)));
    }

    #[tokio::test]
    async fn test_fetch_rejects_ticker() {
        let fetcher = OpenWeatherFetcher::new("key").unwrap();
        let err = fetcher
            .fetch(&Entity::company("NIKE Inc", "NKE"))
            .await
            .unwrap_err();

        assert!(matches!(err, FetchError::Unsupported(_)));
    }
}
