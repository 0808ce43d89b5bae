//! Core data models for the ingestion engine

use chrono::{NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Timestamp format used in sink files and logs
pub const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Domain-specific parameters used to query an upstream source
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LookupParams {
    Coordinates { latitude: f64, longitude: f64 },
    Ticker { symbol: String },
}

impl fmt::Display for LookupParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LookupParams::Coordinates {
                latitude,
                longitude,
            } => write!(f, "({}, {})", latitude, longitude),
            LookupParams::Ticker { symbol } => write!(f, "{}", symbol),
        }
    }
}

/// A monitored thing: a location or a company
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    pub name: String,
    pub lookup_params: LookupParams,
}

impl Entity {
    pub fn location(name: impl Into<String>, latitude: f64, longitude: f64) -> Self {
        Self {
            name: name.into(),
            lookup_params: LookupParams::Coordinates {
                latitude,
                longitude,
            },
        }
    }

    pub fn company(name: impl Into<String>, symbol: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            lookup_params: LookupParams::Ticker {
                symbol: symbol.into(),
            },
        }
    }
}

/// One observation for one entity in one round
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reading {
    pub entity_name: String,
    pub lookup_params: LookupParams,
    pub timestamp: NaiveDateTime,
    pub value: f64,
    /// True when the value is a fallback rather than an upstream reading
    #[serde(default)]
    pub synthetic: bool,
}

impl Reading {
    /// Build a reading stamped with the current local time
    pub fn now(entity: &Entity, value: f64) -> Self {
        Self::at(entity, value, chrono::Local::now().naive_local())
    }

    pub fn at(entity: &Entity, value: f64, timestamp: NaiveDateTime) -> Self {
        Self {
            entity_name: entity.name.clone(),
            lookup_params: entity.lookup_params.clone(),
            // Second resolution
            timestamp: timestamp.with_nanosecond(0).unwrap_or(timestamp),
            value,
            synthetic: false,
        }
    }

    pub fn mark_synthetic(mut self) -> Self {
        self.synthetic = true;
        self
    }

    pub fn formatted_time(&self) -> String {
        self.timestamp.format(TIME_FORMAT).to_string()
    }
}
