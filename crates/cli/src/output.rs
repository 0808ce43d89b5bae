//! Output formatting utilities

use clap::ValueEnum;
use colored::Colorize;
use feed_lib::sink::SinkTable;
use serde::Serialize;
use tabled::{builder::Builder, settings::Style, Table, Tabled};

/// Output format for CLI commands
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum OutputFormat {
    /// Table format (default)
    #[default]
    Table,
    /// JSON format
    Json,
}

/// Print a table from a list of items
pub fn print_table<T: Tabled + Serialize>(items: &[T], format: OutputFormat) {
    match format {
        OutputFormat::Table => {
            if items.is_empty() {
                println!("{}", "No items found".yellow());
                return;
            }
            let table = Table::new(items).with(Style::rounded()).to_string();
            println!("{}", table);
        }
        OutputFormat::Json => print_json(&items),
    }
}

/// Render a sink table with its own headers
pub fn render_sink_table(table: &SinkTable) -> String {
    if table.is_empty() {
        return format!("{}", "No rows yet".yellow());
    }

    let mut builder = Builder::default();
    builder.push_record(table.headers.iter().map(|h| h.bold().to_string()));
    for row in &table.rows {
        builder.push_record(row.iter().cloned());
    }

    let mut rendered = builder.build();
    rendered.with(Style::rounded());
    rendered.to_string()
}

/// Print a sink table in the requested format
pub fn print_sink_table(table: &SinkTable, format: OutputFormat) {
    match format {
        OutputFormat::Table => println!("{}", render_sink_table(table)),
        OutputFormat::Json => print_json(table),
    }
}

pub fn print_json<T: Serialize + ?Sized>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{}", json),
        Err(e) => print_error(&format!("Failed to encode JSON: {}", e)),
    }
}

/// Print an error message
pub fn print_error(message: &str) {
    eprintln!("{} {}", "✗".red().bold(), message);
}

/// Print a warning message
pub fn print_warning(message: &str) {
    println!("{} {}", "⚠".yellow().bold(), message);
}

/// Print an info message
pub fn print_info(message: &str) {
    println!("{} {}", "ℹ".blue().bold(), message);
}

/// Horizontal bar scaled between `min` and `max`
pub fn bar(value: f64, min: f64, max: f64, width: usize) -> String {
    let span = max - min;
    let filled = if span <= f64::EPSILON {
        width
    } else {
        (((value - min) / span) * width as f64).round() as usize
    };
    "█".repeat(filled.clamp(1, width.max(1)))
}

/// Format a reading value without trailing zeros
pub fn format_value(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{:.0}", value)
    } else {
        format!("{:.2}", value)
    }
}
