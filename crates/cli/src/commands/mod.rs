//! CLI command implementations

pub mod entities;
pub mod show;
pub mod watch;

use anyhow::{Context, Result};
use feed_lib::{domain::DomainSpec, sink::SinkReader};
use std::path::Path;

/// Resolve a domain name and open a reader on its sink under `data_dir`
pub fn open_domain(data_dir: &Path, domain: &str) -> Result<(DomainSpec, SinkReader)> {
    let spec = DomainSpec::builtin(domain).with_context(|| {
        let known: Vec<_> = DomainSpec::builtins().into_iter().map(|d| d.name).collect();
        format!("Expected one of: {}", known.join(", "))
    })?;
    let reader = SinkReader::new(data_dir.join(&spec.sink_file), spec.schema.clone());
    Ok((spec, reader))
}
