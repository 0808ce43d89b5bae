//! Live view of a sink
//!
//! The sink watcher publishes a new table whenever the agent rewrites the
//! file; stdin lines change the selection. Each change re-runs only the
//! renderers that depend on it.

use anyhow::{Context, Result};
use colored::Colorize;
use feed_lib::{
    sink::{SinkTable, SinkWatcher, WatchConfig},
    view::{Dependency, Dispatcher, Rendered, ViewState},
};
use std::path::Path;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};

use super::open_domain;
use crate::output::{format_value, print_info, print_warning, render_sink_table, OutputFormat};

/// Renderers used by `lfd watch`
pub fn dispatcher(format: OutputFormat) -> Dispatcher {
    let mut dispatcher = Dispatcher::new();

    dispatcher.register("selection", &[Dependency::Selection], |view, _| {
        if view.selected.is_empty() {
            format!("{} {}", view.domain.bold(), "(all entities)".dimmed())
        } else {
            format!("{} {}", view.domain.bold(), view.selected.join(", ").cyan())
        }
    });

    dispatcher.register(
        "rows",
        &[Dependency::Selection, Dependency::Sink],
        move |view, table| match format {
            OutputFormat::Table => render_sink_table(&view.rows(table)),
            OutputFormat::Json => {
                serde_json::to_string_pretty(&view.rows(table)).unwrap_or_default()
            }
        },
    );

    dispatcher.register("latest", &[Dependency::Sink], |_, table| latest_line(table));

    dispatcher
}

/// `entity=value` for the newest reading of every entity in the sink
fn latest_line(table: &SinkTable) -> String {
    table
        .entities()
        .iter()
        .filter_map(|entity| {
            table
                .series(entity)
                .last()
                .map(|(time, value)| format!("{}={} @ {}", entity, format_value(*value), time))
        })
        .collect::<Vec<_>>()
        .join("  ")
}

fn print_rendered(rendered: &[Rendered]) {
    for item in rendered {
        if !item.output.is_empty() {
            println!("{}", item.output);
        }
    }
}

fn parse_selection(line: &str) -> Vec<String> {
    line.split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(String::from)
        .collect()
}

/// Follow a sink until ctrl-c or end of input
pub async fn watch_sink(
    data_dir: &Path,
    domain: &str,
    select: Vec<String>,
    poll_secs: u64,
    format: OutputFormat,
) -> Result<()> {
    let (spec, reader) = open_domain(data_dir, domain)?;
    spec.catalog.validate(&select).context("Invalid --select")?;

    let handle = SinkWatcher::new(
        reader,
        WatchConfig {
            poll_interval: Duration::from_secs(poll_secs.max(1)),
        },
    )
    .start()?;
    let mut tables = handle.subscribe();

    let dispatcher = dispatcher(format);
    let mut view = ViewState::new(spec.name.clone(), select);
    let mut table = handle.current();
    print_rendered(&dispatcher.render_all(&view, &table));
    print_info("Enter entity names separated by commas to change the selection, ctrl-c to quit");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;

    loop {
        tokio::select! {
            changed = tables.changed() => {
                if changed.is_err() {
                    break;
                }
                table = tables.borrow_and_update().clone();
                println!("{}", "─".repeat(40).dimmed());
                print_rendered(&dispatcher.notify(Dependency::Sink, &view, &table));
            }
            line = lines.next_line(), if stdin_open => {
                match line? {
                    Some(line) => {
                        let selected = parse_selection(&line);
                        if let Err(e) = spec.catalog.validate(&selected) {
                            print_warning(&e.to_string());
                            continue;
                        }
                        view = view.with_selection(selected);
                        println!("{}", "─".repeat(40).dimmed());
                        print_rendered(&dispatcher.notify(Dependency::Selection, &view, &table));
                    }
                    None => stdin_open = false,
                }
            }
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    Ok(())
}
