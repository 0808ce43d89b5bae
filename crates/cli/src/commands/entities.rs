//! Entity listing

use anyhow::Result;
use serde::Serialize;
use std::path::Path;
use tabled::Tabled;

use super::open_domain;
use crate::output::{format_value, print_table, OutputFormat};

/// Row for the entity table
#[derive(Tabled, Serialize)]
struct EntityRow {
    #[tabled(rename = "Entity")]
    name: String,
    #[tabled(rename = "Lookup")]
    lookup: String,
    #[tabled(rename = "Readings")]
    readings: usize,
    #[tabled(rename = "Latest")]
    latest: String,
}

/// List a domain's catalog with how much of it is in the sink right now
pub fn list_entities(data_dir: &Path, domain: &str, format: OutputFormat) -> Result<()> {
    let (spec, reader) = open_domain(data_dir, domain)?;
    let table = reader.read()?;

    let rows: Vec<EntityRow> = spec
        .catalog
        .entities()
        .iter()
        .map(|entity| {
            let series = table.series(&entity.name);
            EntityRow {
                name: entity.name.clone(),
                lookup: entity.lookup_params.to_string(),
                readings: series.len(),
                latest: series
                    .last()
                    .map(|(_, value)| format_value(*value))
                    .unwrap_or_else(|| "-".to_string()),
            }
        })
        .collect();

    print_table(&rows, format);
    Ok(())
}
