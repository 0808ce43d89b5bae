//! Data domains
//!
//! A domain bundles a catalog, the sink schema its readings are written
//! with, the sink file name and the range used for synthetic values.

use crate::catalog::Catalog;
use crate::error::{IngestError, Result};
use crate::sink::SinkSchema;
use std::ops::RangeInclusive;

pub const LOCATIONS: &str = "locations";
pub const STOCKS: &str = "stocks";

/// Everything an ingestion loop needs to know about one category of entities
#[derive(Debug, Clone)]
pub struct DomainSpec {
    pub name: String,
    pub catalog: Catalog,
    pub schema: SinkSchema,
    pub sink_file: String,
    /// Inclusive bounds for fallback values
    pub synthetic_range: RangeInclusive<i64>,
}

impl DomainSpec {
    /// Temperatures (Fahrenheit) for a handful of locations
    pub fn locations() -> Self {
        Self {
            name: LOCATIONS.to_string(),
            catalog: Catalog::locations(),
            schema: SinkSchema::coordinates("Location", "Temp_F"),
            sink_file: "locations.csv".to_string(),
            synthetic_range: 68..=77,
        }
    }

    /// Share prices (USD) for a handful of companies
    pub fn stocks() -> Self {
        Self {
            name: STOCKS.to_string(),
            catalog: Catalog::stocks(),
            schema: SinkSchema::ticker("Company", "Price"),
            sink_file: "stocks.csv".to_string(),
            synthetic_range: 132..=148,
        }
    }

    /// Resolve a built-in domain by name
    pub fn builtin(name: &str) -> Result<Self> {
        match name {
            LOCATIONS => Ok(Self::locations()),
            STOCKS => Ok(Self::stocks()),
            other => Err(IngestError::UnknownDomain(other.to_string())),
        }
    }

    pub fn builtins() -> Vec<Self> {
        vec![Self::locations(), Self::stocks()]
    }
}
