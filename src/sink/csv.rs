//! Append-only CSV file

use std::path::{Path, PathBuf};

use tokio::fs::{File, OpenOptions};
use tokio::io::AsyncWriteExt;
use tracing::warn;

use super::SinkError;
use crate::types::Record;

pub const CSV_FILE_NAME: &str = "data.csv";

/// Appends one row per record to `<dir>/data.csv`.
///
/// Column order: checksum, primaryURI, text, timestamp, annotation, secondaryURI.
pub struct CsvSink {
    path: PathBuf,
    file: File,
}

impl CsvSink {
    /// Open (creating if needed) the CSV file in append mode for the sink's lifetime
    pub async fn open(dir: &Path) -> Result<Self, SinkError> {
        let path = dir.join(CSV_FILE_NAME);
        let mut options = OpenOptions::new();
        options.append(true).create(true);
        #[cfg(unix)]
        options.mode(0o600);
        let file = options.open(&path).await?;
        Ok(Self { path, file })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append and flush a single row before returning
    pub async fn accept(&mut self, record: &Record) -> Result<(), SinkError> {
        let row = format_row(record)?;
        self.file.write_all(&row).await?;
        self.file.flush().await?;
        Ok(())
    }

    pub async fn close(self) {
        if let Err(e) = self.file.sync_all().await {
            warn!("Failed to sync {}: {}", self.path.display(), e);
        }
    }
}

/// Encode one record as a terminated CSV row
pub fn format_row(record: &Record) -> Result<Vec<u8>, SinkError> {
    let timestamp = record.timestamp.to_string();
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record([
        record.checksum.as_str(),
        record.payload.primary_uri.as_str(),
        record.payload.text.as_str(),
        timestamp.as_str(),
        record.payload.annotation.as_deref().unwrap_or(""),
        record.payload.secondary_uri.as_deref().unwrap_or(""),
    ])?;
    writer
        .into_inner()
        .map_err(|e| SinkError::Io(e.into_error()))
}
