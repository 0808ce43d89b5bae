//! Consumer-side access to a sink
//!
//! Each read is a fresh full snapshot. A sink that does not exist yet reads
//! as a header-only table so consumers never have to special-case startup.

use super::{SinkSchema, SinkTable};
use crate::error::{IngestError, Result};
use anyhow::Context;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Reader for one domain's sink file
#[derive(Debug, Clone)]
pub struct SinkReader {
    path: PathBuf,
    schema: SinkSchema,
}

impl SinkReader {
    pub fn new(path: impl Into<PathBuf>, schema: SinkSchema) -> Self {
        Self {
            path: path.into(),
            schema,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn schema(&self) -> &SinkSchema {
        &self.schema
    }

    /// Read the whole table
    pub fn read(&self) -> Result<SinkTable> {
        // One read call against one inode: a concurrent rename cannot split it
        let bytes = match std::fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "Sink missing, serving empty table");
                return Ok(SinkTable::empty(&self.schema));
            }
            Err(e) => {
                return Err(IngestError::SinkRead {
                    path: self.path.clone(),
                    source: anyhow::Error::new(e).context("Failed to read sink file"),
                })
            }
        };

        parse_table(&bytes, &self.schema).map_err(|source| IngestError::SinkRead {
            path: self.path.clone(),
            source,
        })
    }

    /// Read and keep only rows for the selected entities
    pub fn select<S: AsRef<str>>(&self, names: &[S]) -> Result<SinkTable> {
        Ok(self.read()?.select(names))
    }
}

fn parse_table(bytes: &[u8], schema: &SinkSchema) -> anyhow::Result<SinkTable> {
    if bytes.is_empty() {
        return Ok(SinkTable::empty(schema));
    }

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_reader(bytes);

    let headers: Vec<String> = reader
        .headers()
        .context("Failed to read csv headers")?
        .iter()
        .map(String::from)
        .collect();

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.context("Failed to read csv record")?;
        rows.push(record.iter().map(String::from).collect());
    }

    Ok(SinkTable { headers, rows })
}
