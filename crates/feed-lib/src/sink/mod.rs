//! Durable CSV sinks
//!
//! This module provides:
//! - The column schema each domain publishes
//! - A full-replace writer (temp file + rename)
//! - A reader that always returns a complete table
//! - A file watcher that republishes the table when it changes

mod reader;
mod watch;
mod writer;

pub use reader::SinkReader;
pub use watch::{SinkWatchHandle, SinkWatcher, WatchConfig};
pub use writer::CsvSink;

use crate::models::{LookupParams, Reading};
use serde::{Deserialize, Serialize};

/// How lookup parameters are laid out between the entity and time columns
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowLayout {
    /// `<entity>,Latitude,Longitude,Time,<value>`
    Coordinates,
    /// `<entity>,Ticker,Time,<value>`
    Ticker,
}

/// Exact column schema of a domain's sink
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SinkSchema {
    columns: Vec<String>,
    layout: RowLayout,
}

impl SinkSchema {
    pub fn coordinates(entity_column: &str, value_column: &str) -> Self {
        Self {
            columns: vec![
                entity_column.to_string(),
                "Latitude".to_string(),
                "Longitude".to_string(),
                "Time".to_string(),
                value_column.to_string(),
            ],
            layout: RowLayout::Coordinates,
        }
    }

    pub fn ticker(entity_column: &str, value_column: &str) -> Self {
        Self {
            columns: vec![
                entity_column.to_string(),
                "Ticker".to_string(),
                "Time".to_string(),
                value_column.to_string(),
            ],
            layout: RowLayout::Ticker,
        }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn layout(&self) -> RowLayout {
        self.layout
    }

    pub fn entity_column(&self) -> &str {
        &self.columns[0]
    }

    pub fn value_column(&self) -> &str {
        &self.columns[self.columns.len() - 1]
    }

    /// Render a reading as one CSV record
    pub fn row(&self, reading: &Reading) -> Vec<String> {
        let mut row = Vec::with_capacity(self.columns.len());
        row.push(reading.entity_name.clone());

        match (self.layout, &reading.lookup_params) {
            (
                RowLayout::Coordinates,
                LookupParams::Coordinates {
                    latitude,
                    longitude,
                },
            ) => {
                row.push(latitude.to_string());
                row.push(longitude.to_string());
            }
            (RowLayout::Ticker, LookupParams::Ticker { symbol }) => {
                row.push(symbol.clone());
            }
            // Params from a different domain leave the lookup columns blank
            (RowLayout::Coordinates, _) => {
                row.push(String::new());
                row.push(String::new());
            }
            (RowLayout::Ticker, _) => row.push(String::new()),
        }

        row.push(reading.formatted_time());
        row.push(reading.value.to_string());
        row
    }
}

/// A full snapshot of a sink file
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SinkTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl SinkTable {
    /// Header-only table for a schema
    pub fn empty(schema: &SinkSchema) -> Self {
        Self {
            headers: schema.columns().to_vec(),
            rows: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Rows whose entity (first) column is one of `names`, in sink order
    pub fn select<S: AsRef<str>>(&self, names: &[S]) -> SinkTable {
        let rows = self
            .rows
            .iter()
            .filter(|row| {
                row.first()
                    .map(|entity| names.iter().any(|n| n.as_ref() == entity))
                    .unwrap_or(false)
            })
            .cloned()
            .collect();

        SinkTable {
            headers: self.headers.clone(),
            rows,
        }
    }

    /// Distinct entity names in first-seen order
    pub fn entities(&self) -> Vec<String> {
        let mut names: Vec<String> = Vec::new();
        for row in &self.rows {
            if let Some(name) = row.first() {
                if !names.contains(name) {
                    names.push(name.clone());
                }
            }
        }
        names
    }

    /// `(time, value)` points for one entity, skipping unparsable values
    pub fn series(&self, entity: &str) -> Vec<(String, f64)> {
        let Some(time_idx) = self.headers.iter().position(|h| h == "Time") else {
            return Vec::new();
        };
        let value_idx = self.headers.len().saturating_sub(1);

        self.rows
            .iter()
            .filter(|row| row.first().map(String::as_str) == Some(entity))
            .filter_map(|row| {
                let time = row.get(time_idx)?.clone();
                let value = row.get(value_idx)?.parse::<f64>().ok()?;
                Some((time, value))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Entity;
    use chrono::NaiveDate;

    fn at(h: u32, m: u32, s: u32) -> chrono::NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, 15)
            .unwrap()
            .and_hms_opt(h, m, s)
            .unwrap()
    }

    fn table() -> SinkTable {
        SinkTable {
            headers: vec!["Company", "Ticker", "Time", "Price"]
                .into_iter()
                .map(String::from)
                .collect(),
            rows: vec![
                vec!["A", "AAA", "2024-01-15 10:00:00", "10"],
                vec!["B", "BBB", "2024-01-15 10:00:00", "20"],
                vec!["A", "AAA", "2024-01-15 10:01:00", "11.5"],
                vec!["C", "CCC", "2024-01-15 10:01:00", "30"],
            ]
            .into_iter()
            .map(|r| r.into_iter().map(String::from).collect())
            .collect(),
        }
    }

    #[test]
    fn test_coordinates_row() {
        let schema = SinkSchema::coordinates("Location", "Temp_F");
        let entity = Entity::location("ELY MN", 47.903237, -91.867087);
        let reading = Reading::at(&entity, 72.0, at(9, 30, 5));

        assert_eq!(
            schema.row(&reading),
            vec!["ELY MN", "47.903237", "-91.867087", "2024-01-15 09:30:05", "72"]
        );
    }

    #[test]
    fn test_ticker_row() {
        let schema = SinkSchema::ticker("Company", "Price");
        let entity = Entity::company("NIKE Inc", "NKE");
        let reading = Reading::at(&entity, 101.25, at(16, 0, 0));

        assert_eq!(
            schema.row(&reading),
            vec!["NIKE Inc", "NKE", "2024-01-15 16:00:00", "101.25"]
        );
    }

    #[test]
    fn test_row_width_matches_schema_on_mismatched_params() {
        let schema = SinkSchema::ticker("Company", "Price");
        let entity = Entity::location("ELY MN", 1.0, 2.0);
        let row = schema.row(&Reading::at(&entity, 1.0, at(0, 0, 0)));
        assert_eq!(row.len(), schema.columns().len());
    }

    #[test]
    fn test_select_keeps_sink_order() {
        let selected = table().select(&["C", "A"]);
        let entities: Vec<_> = selected.rows.iter().map(|r| r[0].as_str()).collect();
        assert_eq!(entities, vec!["A", "A", "C"]);
        assert_eq!(selected.headers, table().headers);
    }

    #[test]
    fn test_select_nothing() {
        let empty: [&str; 0] = [];
        assert!(table().select(&empty).is_empty());
    }

    #[test]
    fn test_entities_first_seen_order() {
        assert_eq!(table().entities(), vec!["A", "B", "C"]);
    }

    #[test]
    fn test_series() {
        assert_eq!(
            table().series("A"),
            vec![
                ("2024-01-15 10:00:00".to_string(), 10.0),
                ("2024-01-15 10:01:00".to_string(), 11.5)
            ]
        );
    }
}
