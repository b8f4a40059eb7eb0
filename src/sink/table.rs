//! Embedded SQLite table

use std::path::{Path, PathBuf};
use std::time::Duration;

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use tracing::info;

use super::SinkError;
use crate::types::Record;

pub const DB_FILE_NAME: &str = "data.sqlite3";

const CREATE_TABLE: &str = r#"
    CREATE TABLE IF NOT EXISTS hlte (
        checksum TEXT NOT NULL,
        timestamp INTEGER NOT NULL,
        primaryURI TEXT NOT NULL,
        secondaryURI TEXT,
        hilite TEXT,
        annotation TEXT
    )
"#;

const CREATE_TIMESTAMP_INDEX: &str =
    "CREATE INDEX IF NOT EXISTS hlte_timestamp ON hlte (timestamp)";

const INSERT: &str = r#"
    INSERT INTO hlte (checksum, timestamp, primaryURI, secondaryURI, hilite, annotation)
    VALUES (?, ?, ?, ?, ?, ?)
"#;

/// Location of the table store inside a data directory
pub fn db_path(dir: &Path) -> PathBuf {
    dir.join(DB_FILE_NAME)
}

/// Open a pool on the store, creating the file and schema if absent.
///
/// WAL mode lets readers run alongside the single writer.
pub async fn open_pool(path: &Path, max_connections: u32) -> Result<SqlitePool, sqlx::Error> {
    let options = SqliteConnectOptions::new()
        .filename(path)
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(Duration::from_secs(5));

    let pool = SqlitePoolOptions::new()
        .max_connections(max_connections)
        .connect_with(options)
        .await?;

    sqlx::query(CREATE_TABLE).execute(&pool).await?;
    sqlx::query(CREATE_TIMESTAMP_INDEX).execute(&pool).await?;

    Ok(pool)
}

/// Inserts each record as one row of `hlte`
pub struct TableSink {
    pool: SqlitePool,
}

impl TableSink {
    pub async fn open(dir: &Path) -> Result<Self, SinkError> {
        let path = db_path(dir);
        let pool = open_pool(&path, 1).await?;
        info!("Table store ready at {}", path.display());
        Ok(Self { pool })
    }

    pub async fn accept(&mut self, record: &Record) -> Result<(), SinkError> {
        sqlx::query(INSERT)
            .bind(record.checksum.as_str())
            .bind(record.timestamp)
            .bind(&record.payload.primary_uri)
            .bind(record.payload.secondary_uri.as_deref())
            .bind(&record.payload.text)
            .bind(record.payload.annotation.as_deref())
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn close(self) {
        self.pool.close().await;
    }
}
