//! Full-replace CSV writer
//!
//! Every write serializes the complete window into a temp file next to the
//! sink, syncs it and renames it over the sink. Readers therefore see either
//! the previous table or the new one, never a partial file.

use super::SinkSchema;
use crate::error::{IngestError, Result};
use crate::models::Reading;
use anyhow::Context;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Writer for one domain's sink file
#[derive(Debug, Clone)]
pub struct CsvSink {
    path: PathBuf,
    schema: SinkSchema,
}

impl CsvSink {
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

    /// Create a header-only sink if none exists yet
    ///
    /// An existing file is left alone so readers keep serving the last
    /// snapshot from a previous run until the first round completes.
    pub fn ensure_initialized(&self) -> Result<()> {
        if self.path.exists() {
            debug!(path = %self.path.display(), "Sink already present");
            return Ok(());
        }

        self.write(&[])?;
        info!(path = %self.path.display(), "Initialized empty sink");
        Ok(())
    }

    /// Replace the sink contents with `rows`
    pub fn write(&self, rows: &[Reading]) -> Result<()> {
        self.write_inner(rows)
            .map_err(|source| IngestError::SinkWrite {
                path: self.path.clone(),
                source,
            })
    }

    /// Serialize rows to CSV bytes, header first
    pub fn render(&self, rows: &[Reading]) -> anyhow::Result<Vec<u8>> {
        let mut writer = csv::Writer::from_writer(Vec::new());
        writer
            .write_record(self.schema.columns())
            .context("Failed to write header row")?;
        for reading in rows {
            writer
                .write_record(self.schema.row(reading))
                .context("Failed to write data row")?;
        }
        writer
            .into_inner()
            .map_err(|e| anyhow::anyhow!("Failed to flush csv writer: {}", e.error()))
    }

    fn write_inner(&self, rows: &[Reading]) -> anyhow::Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create directory {:?}", parent))?;
            }
        }

        let bytes = self.render(rows)?;

        let temp_path = self.temp_path();
        let mut file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&temp_path)
            .with_context(|| format!("Failed to create temp file {:?}", temp_path))?;

        file.write_all(&bytes).context("Failed to write sink data")?;
        file.sync_all().context("Failed to sync sink file")?;

        std::fs::rename(&temp_path, &self.path)
            .with_context(|| format!("Failed to rename {:?} to {:?}", temp_path, self.path))?;

        debug!(path = %self.path.display(), rows = rows.len(), "Sink written");
        Ok(())
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}
