//! Agent configuration

use anyhow::{Context, Result};
use feed_lib::domain::{LOCATIONS, STOCKS};
use feed_lib::ingest::{FailurePolicy, IngestionConfig, RestartPolicy};
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

/// Agent configuration, read once at start from `LIVEFEED_*` variables
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Directory holding the sink files
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// API server port for health/metrics/rows
    #[serde(default = "default_api_port")]
    pub api_port: u16,

    /// Delay between rounds in seconds
    #[serde(default = "default_interval")]
    pub interval_secs: u64,

    #[serde(default = "default_location_capacity")]
    pub location_capacity: usize,

    #[serde(default = "default_stock_capacity")]
    pub stock_capacity: usize,

    /// Rounds per loop run; unset runs until shutdown
    #[serde(default)]
    pub max_rounds: Option<u64>,

    #[serde(default = "default_fetch_timeout_ms")]
    pub fetch_timeout_ms: u64,

    #[serde(default)]
    pub failure_policy: FailurePolicy,

    /// Restart bounded loops after this many seconds; unset never restarts
    #[serde(default)]
    pub restart_delay_secs: Option<u64>,

    /// Query the quote service instead of generating prices
    #[serde(default)]
    pub live_quotes: bool,

    /// OpenWeather credential; without it temperatures are synthetic
    #[serde(default = "default_open_weather_api_key")]
    pub open_weather_api_key: Option<String>,
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("data")
}

fn default_api_port() -> u16 {
    8080
}

fn default_interval() -> u64 {
    60
}

fn default_location_capacity() -> usize {
    10
}

fn default_stock_capacity() -> usize {
    50
}

fn default_fetch_timeout_ms() -> u64 {
    10_000
}

fn default_open_weather_api_key() -> Option<String> {
    std::env::var("OPEN_WEATHER_API_KEY")
        .ok()
        .filter(|key| !key.trim().is_empty())
}

impl AppConfig {
    /// Load configuration from the environment
    pub fn load() -> Result<Self> {
        Self::from_env(config::Environment::with_prefix("LIVEFEED"))
    }

    fn from_env(env: config::Environment) -> Result<Self> {
        let config = config::Config::builder()
            .add_source(env.try_parsing(true))
            .build()
            .context("Failed to read LIVEFEED_* environment")?;

        let app: Self = config
            .try_deserialize()
            .context("Invalid LIVEFEED_* configuration")?;
        app.validate()?;
        Ok(app)
    }

    /// Reject settings that would spin the loop or time out every fetch
    fn validate(&self) -> Result<()> {
        if self.interval_secs == 0 {
            anyhow::bail!("LIVEFEED_INTERVAL_SECS must be at least 1");
        }
        if self.fetch_timeout_ms == 0 {
            anyhow::bail!("LIVEFEED_FETCH_TIMEOUT_MS must be at least 1");
        }
        Ok(())
    }

    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_millis(self.fetch_timeout_ms)
    }

    pub fn restart_policy(&self) -> RestartPolicy {
        match self.restart_delay_secs {
            Some(secs) => RestartPolicy::After(Duration::from_secs(secs)),
            None => RestartPolicy::Never,
        }
    }

    /// Loop settings for one domain
    pub fn ingestion_config(&self, domain: &str) -> IngestionConfig {
        let capacity = match domain {
            LOCATIONS => self.location_capacity,
            STOCKS => self.stock_capacity,
            _ => IngestionConfig::default().capacity,
        };

        IngestionConfig {
            interval: self.interval(),
            capacity,
            max_rounds: self.max_rounds,
            fetch_timeout: self.fetch_timeout(),
            failure_policy: self.failure_policy,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(vars: &[(&str, &str)]) -> config::Environment {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        config::Environment::with_prefix("LIVEFEED").source(Some(map))
    }

    #[test]
    fn test_defaults() {
        let config = AppConfig::from_env(env(&[])).unwrap();

        assert_eq!(config.data_dir, PathBuf::from("data"));
        assert_eq!(config.api_port, 8080);
        assert_eq!(config.interval(), Duration::from_secs(60));
        assert_eq!(config.max_rounds, None);
        assert_eq!(config.failure_policy, FailurePolicy::Synthetic);
        assert_eq!(config.restart_policy(), RestartPolicy::Never);
        assert!(!config.live_quotes);
    }

    #[test]
    fn test_overrides() {
        let config = AppConfig::from_env(env(&[
            ("LIVEFEED_DATA_DIR", "/var/lib/livefeed"),
            ("LIVEFEED_INTERVAL_SECS", "5"),
            ("LIVEFEED_MAX_ROUNDS", "50"),
            ("LIVEFEED_FAILURE_POLICY", "skip"),
            ("LIVEFEED_RESTART_DELAY_SECS", "60"),
            ("LIVEFEED_LIVE_QUOTES", "true"),
        ]))
        .unwrap();

        assert_eq!(config.data_dir, PathBuf::from("/var/lib/livefeed"));
        assert_eq!(config.interval_secs, 5);
        assert_eq!(config.max_rounds, Some(50));
        assert_eq!(config.failure_policy, FailurePolicy::Skip);
        assert_eq!(
            config.restart_policy(),
            RestartPolicy::After(Duration::from_secs(60))
        );
        assert!(config.live_quotes);
    }

    #[test]
    fn test_capacity_per_domain() {
        let config = AppConfig::from_env(env(&[("LIVEFEED_STOCK_CAPACITY", "25")])).unwrap();

        assert_eq!(config.ingestion_config(LOCATIONS).capacity, 10);
        assert_eq!(config.ingestion_config(STOCKS).capacity, 25);
    }

    #[test]
    fn test_rejects_unknown_policy() {
        assert!(AppConfig::from_env(env(&[("LIVEFEED_FAILURE_POLICY", "abort")])).is_err());
    }

    #[test]
    fn test_rejects_zero_interval_and_timeout() {
        let err = AppConfig::from_env(env(&[("LIVEFEED_INTERVAL_SECS", "0")])).unwrap_err();
        assert!(err.to_string().contains("LIVEFEED_INTERVAL_SECS"));

        let err = AppConfig::from_env(env(&[("LIVEFEED_FETCH_TIMEOUT_MS", "0")])).unwrap_err();
        assert!(err.to_string().contains("LIVEFEED_FETCH_TIMEOUT_MS"));

        assert!(AppConfig::from_env(env(&[
            ("LIVEFEED_INTERVAL_SECS", "1"),
            ("LIVEFEED_FETCH_TIMEOUT_MS", "1"),
        ]))
        .is_ok());
    }
}
