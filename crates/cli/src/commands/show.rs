//! One-shot views of a sink

use anyhow::{Context, Result};
use colored::Colorize;
use feed_lib::view::ViewState;
use serde::Serialize;
use std::path::Path;

use super::open_domain;
use crate::output::{
    bar, format_value, print_json, print_sink_table, print_warning, OutputFormat,
};

const BAR_WIDTH: usize = 30;

/// Print the current rows, filtered by the selected entities
pub fn show_rows(
    data_dir: &Path,
    domain: &str,
    select: &[String],
    format: OutputFormat,
) -> Result<()> {
    let (spec, reader) = open_domain(data_dir, domain)?;
    spec.catalog.validate(select).context("Invalid --select")?;

    let table = reader.read()?;
    let view = ViewState::new(spec.name, select.to_vec());
    print_sink_table(&view.rows(&table), format);
    Ok(())
}

#[derive(Serialize)]
struct SeriesPoint {
    time: String,
    value: f64,
}

/// Print one entity's readings over time
pub fn show_series(
    data_dir: &Path,
    domain: &str,
    entity: &str,
    format: OutputFormat,
) -> Result<()> {
    let (spec, reader) = open_domain(data_dir, domain)?;
    spec.catalog.lookup(entity)?;

    let series = reader.read()?.series(entity);

    match format {
        OutputFormat::Json => {
            let points: Vec<_> = series
                .into_iter()
                .map(|(time, value)| SeriesPoint { time, value })
                .collect();
            print_json(&points);
        }
        OutputFormat::Table => {
            if series.is_empty() {
                print_warning(&format!("No readings for {} yet", entity));
                return Ok(());
            }

            let min = series.iter().map(|(_, v)| *v).fold(f64::INFINITY, f64::min);
            let max = series.iter().map(|(_, v)| *v).fold(f64::NEG_INFINITY, f64::max);

            println!("{} ({})", entity.bold(), spec.schema.value_column());
            for (time, value) in &series {
                println!(
                    "{}  {:>8}  {}",
                    time.dimmed(),
                    format_value(*value),
                    bar(*value, min, max, BAR_WIDTH).cyan()
                );
            }
        }
    }

    Ok(())
}
