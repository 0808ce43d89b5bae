//! Yahoo Finance quote fetcher

use super::{async_trait, http_client, read_body, Fetcher, DEFAULT_HTTP_TIMEOUT};
use crate::error::FetchError;
use crate::models::{Entity, LookupParams};
use anyhow::{Context, Result};
use serde::Deserialize;
use std::time::Duration;
use url::Url;

const DEFAULT_BASE_URL: &str = "https://query1.finance.yahoo.com/";

/// Latest regular-market price for a ticker
pub struct YahooQuoteFetcher {
    client: reqwest::Client,
    base_url: Url,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct OptionsResponse {
    option_chain: OptionChain,
}

#[derive(Debug, Deserialize)]
struct OptionChain {
    #[serde(default)]
    result: Vec<OptionChainResult>,
}

#[derive(Debug, Deserialize)]
struct OptionChainResult {
    quote: QuotePayload,
}

#[derive(Debug, Deserialize)]
struct QuotePayload {
    #[serde(rename = "regularMarketPrice")]
    regular_market_price: Option<f64>,
}

impl YahooQuoteFetcher {
    pub fn new() -> Result<Self> {
        Self::with_base_url(DEFAULT_BASE_URL, DEFAULT_HTTP_TIMEOUT)
    }

    pub fn with_base_url(base_url: &str, timeout: Duration) -> Result<Self> {
        let base_url = Url::parse(base_url).context("Invalid quote API URL")?;
        Ok(Self {
            client: http_client(timeout)?,
            base_url,
        })
    }

    fn request_url(&self, symbol: &str) -> Result<Url, FetchError> {
        self.base_url
            .join(&format!("v7/finance/options/{}", symbol))
            .map_err(|e| FetchError::Malformed(format!("bad endpoint: {}", e)))
    }
}

#[async_trait]
impl Fetcher for YahooQuoteFetcher {
    async fn fetch(&self, entity: &Entity) -> Result<f64, FetchError> {
        let symbol = match &entity.lookup_params {
            LookupParams::Ticker { symbol } => symbol,
            other => return Err(FetchError::Unsupported(other.to_string())),
        };

        let url = self.request_url(symbol)?;
        let response = self.client.get(url).send().await?;
        let body = read_body(response).await?;

        let parsed: OptionsResponse = serde_json::from_str(&body)
            .map_err(|e| FetchError::Malformed(format!("quote payload: {}", e)))?;

        parsed
            .option_chain
            .result
            .into_iter()
            .next()
            .and_then(|r| r.quote.regular_market_price)
            .ok_or_else(|| FetchError::Malformed(format!("no market price for {}", symbol)))
    }

    fn source(&self) -> &'static str {
        "yahoo"
    }
}
