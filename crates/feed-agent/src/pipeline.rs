//! Wires domains, fetchers and sinks into a supervisor

use crate::config::AppConfig;
use anyhow::Result;
use feed_lib::domain::{DomainSpec, LOCATIONS, STOCKS};
use feed_lib::fetcher::{Fetcher, OpenWeatherFetcher, SyntheticFetcher, YahooQuoteFetcher};
use feed_lib::health::HealthRegistry;
use feed_lib::ingest::{IngestionLoopBuilder, IngestionSupervisor};
use std::sync::Arc;
use tracing::{info, warn};

/// Pick the fetcher for a domain from the configured credentials
pub fn fetcher_for(domain: &DomainSpec, config: &AppConfig) -> Result<Arc<dyn Fetcher>> {
    let fetcher: Arc<dyn Fetcher> = match domain.name.as_str() {
        LOCATIONS => match &config.open_weather_api_key {
            Some(key) => Arc::new(OpenWeatherFetcher::new(key.clone())?),
            None => {
                warn!(
                    domain = %domain.name,
                    "OPEN_WEATHER_API_KEY not set, generating synthetic temperatures"
                );
                Arc::new(SyntheticFetcher::new(domain.synthetic_range.clone()))
            }
        },
        STOCKS if config.live_quotes => Arc::new(YahooQuoteFetcher::new()?),
        _ => Arc::new(SyntheticFetcher::new(domain.synthetic_range.clone())),
    };

    info!(domain = %domain.name, source = fetcher.source(), "Fetcher selected");
    Ok(fetcher)
}

/// One loop per built-in domain, all writing into `config.data_dir`
pub fn build_supervisor(
    config: &AppConfig,
    health: &HealthRegistry,
) -> Result<IngestionSupervisor> {
    let mut supervisor = IngestionSupervisor::new().restart_policy(config.restart_policy());

    for domain in DomainSpec::builtins() {
        let fetcher = fetcher_for(&domain, config)?;
        let ingestion = config.ingestion_config(&domain.name);
        supervisor = supervisor.add(
            IngestionLoopBuilder::new(domain)
                .fetcher(fetcher)
                .sink_dir(&config.data_dir)
                .health(health.clone())
                .config(ingestion),
        );
    }

    Ok(supervisor)
}
