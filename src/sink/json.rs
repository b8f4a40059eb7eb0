//! One JSON file per record

use std::path::{Path, PathBuf};

use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;

use super::SinkError;
use crate::types::Record;

/// Writes each record to `<dir>/<timestamp_ns>.json`
pub struct JsonSink {
    dir: PathBuf,
}

impl JsonSink {
    pub async fn open(dir: &Path) -> Result<Self, SinkError> {
        fs::create_dir_all(dir).await?;
        Ok(Self {
            dir: dir.to_path_buf(),
        })
    }

    pub fn path_for(&self, record: &Record) -> PathBuf {
        self.dir.join(format!("{}.json", record.timestamp))
    }

    /// Files are created exclusively so an existing record is never overwritten
    pub async fn accept(&mut self, record: &Record) -> Result<(), SinkError> {
        let bytes = serde_json::to_vec(record)?;
        let path = self.path_for(record);

        let mut file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await?;
        file.write_all(&bytes).await?;
        file.flush().await?;
        Ok(())
    }
}
