//! Sink Adapters
//!
//! Per-format persistence. Each enabled format runs as one task that owns a
//! [`Sink`] and the receiving half of its delivery channel:
//!
//! ```text
//!                   ┌──────────────┐   mpsc   ┌───────────┐
//!  Dispatcher ────▶ │ json channel │ ───────▶ │ JsonSink  │ ─▶ <ts>.json
//!        │          └──────────────┘          └───────────┘
//!        │          ┌──────────────┐          ┌───────────┐
//!        ├────────▶ │ csv channel  │ ───────▶ │ CsvSink   │ ─▶ data.csv
//!        │          └──────────────┘          └───────────┘
//!        │          ┌──────────────┐          ┌───────────┐
//!        └────────▶ │ sqlite chan. │ ───────▶ │ TableSink │ ─▶ data.sqlite3
//!                   └──────────────┘          └───────────┘
//! ```
//!
//! Sinks never share state with each other. A sink exits once every sender
//! for its channel is gone and the buffer is drained.

mod csv;
mod json;
pub mod table;

pub use self::csv::CsvSink;
pub use self::json::JsonSink;
pub use self::table::TableSink;

use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::{debug, error, info};

use crate::types::Record;

/// Errors raised while opening a sink or persisting one record
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] ::csv::Error),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// The closed set of supported output formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SinkFormat {
    Json,
    Csv,
    #[serde(rename = "sqlite")]
    Table,
}

impl SinkFormat {
    /// Every supported format, enabled at startup
    pub const ALL: [SinkFormat; 3] = [SinkFormat::Json, SinkFormat::Csv, SinkFormat::Table];

    /// Name used by clients in the `formats` list
    pub fn name(&self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Csv => "csv",
            Self::Table => "sqlite",
        }
    }
}

impl fmt::Display for SinkFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Name that does not match any supported format
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown format '{0}'")]
pub struct UnknownFormat(pub String);

impl FromStr for SinkFormat {
    type Err = UnknownFormat;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|f| f.name() == s)
            .ok_or_else(|| UnknownFormat(s.to_string()))
    }
}

/// Counters reported by a sink task when it exits
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SinkStats {
    pub written: u64,
    pub failed: u64,
}

/// An open persistence adapter for one format
pub enum Sink {
    Json(JsonSink),
    Csv(CsvSink),
    Table(TableSink),
}

impl Sink {
    /// Open the adapter for `format` under `data_dir`.
    ///
    /// Failure here only affects this format; the caller decides whether
    /// to register anything.
    pub async fn open(format: SinkFormat, data_dir: &Path) -> Result<Self, SinkError> {
        match format {
            SinkFormat::Json => Ok(Self::Json(JsonSink::open(data_dir).await?)),
            SinkFormat::Csv => Ok(Self::Csv(CsvSink::open(data_dir).await?)),
            SinkFormat::Table => Ok(Self::Table(TableSink::open(data_dir).await?)),
        }
    }

    pub fn format(&self) -> SinkFormat {
        match self {
            Self::Json(_) => SinkFormat::Json,
            Self::Csv(_) => SinkFormat::Csv,
            Self::Table(_) => SinkFormat::Table,
        }
    }

    /// Persist one record
    pub async fn accept(&mut self, record: &Record) -> Result<(), SinkError> {
        match self {
            Self::Json(sink) => sink.accept(record).await,
            Self::Csv(sink) => sink.accept(record).await,
            Self::Table(sink) => sink.accept(record).await,
        }
    }

    /// Release any file or connection held by the adapter
    pub async fn close(self) {
        match self {
            Self::Json(_) => {}
            Self::Csv(sink) => sink.close().await,
            Self::Table(sink) => sink.close().await,
        }
    }

    /// Consume records until the channel is closed and drained.
    ///
    /// Per-record failures are logged and the record is dropped for this
    /// sink only; the loop keeps going.
    pub async fn run(mut self, mut rx: mpsc::Receiver<Arc<Record>>) -> SinkStats {
        let format = self.format();
        let mut stats = SinkStats::default();
        info!(format = %format, "Sink started");

        while let Some(record) = rx.recv().await {
            match self.accept(&record).await {
                Ok(()) => {
                    stats.written += 1;
                    debug!(format = %format, checksum = %record.checksum, "Record persisted");
                }
                Err(e) => {
                    stats.failed += 1;
                    error!(
                        format = %format,
                        checksum = %record.checksum,
                        "Failed to persist record: {}",
                        e
                    );
                }
            }
        }

        self.close().await;
        info!(
            format = %format,
            written = stats.written,
            failed = stats.failed,
            "Sink drained and stopped"
        );
        stats
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_format_names_round_trip() {
        for format in SinkFormat::ALL {
            assert_eq!(format.name().parse::<SinkFormat>().unwrap(), format);
        }
        assert_eq!("sqlite".parse::<SinkFormat>().unwrap(), SinkFormat::Table);
        assert_eq!(
            "xml".parse::<SinkFormat>().unwrap_err(),
            UnknownFormat("xml".to_string())
        );
        // Names are exact; clients send lowercase
        assert!("JSON".parse::<SinkFormat>().is_err());
    }

    #[test]
    fn test_format_serde_uses_client_names() {
        let json = serde_json::to_string(&SinkFormat::ALL).unwrap();
        assert_eq!(json, r#"["json","csv","sqlite"]"#);
    }

    #[tokio::test]
    async fn test_run_drains_buffer_after_senders_drop() {
        let dir = TempDir::new().unwrap();
        let sink = Sink::open(SinkFormat::Json, dir.path()).await.unwrap();
        let (tx, rx) = mpsc::channel(8);

        for ts in 1..=5 {
            tx.send(Arc::new(test_support::record("drain", ts))).await.unwrap();
        }
        drop(tx);

        let stats = sink.run(rx).await;
        assert_eq!(stats, SinkStats { written: 5, failed: 0 });
    }

    #[tokio::test]
    async fn test_run_counts_failures_and_continues() {
        let dir = TempDir::new().unwrap();
        let sink = Sink::open(SinkFormat::Json, dir.path()).await.unwrap();
        let (tx, rx) = mpsc::channel(8);

        // Same timestamp twice: the second file already exists
        tx.send(Arc::new(test_support::record("a", 7))).await.unwrap();
        tx.send(Arc::new(test_support::record("b", 7))).await.unwrap();
        tx.send(Arc::new(test_support::record("c", 8))).await.unwrap();
        drop(tx);

        let stats = sink.run(rx).await;
        assert_eq!(stats, SinkStats { written: 2, failed: 1 });
    }
}
