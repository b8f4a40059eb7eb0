//! SQLite-backed search

use std::path::Path;
use std::time::Instant;

use sqlx::sqlite::SqlitePool;
use sqlx::Row;
use tracing::debug;

use super::{QueryError, SearchHit, SearchQuery};
use crate::sink::table;
use crate::util::preview;

const READ_CONNECTIONS: u32 = 4;

// `instr` keeps the match case-sensitive and treats `%`/`_` in the query literally.
const SEARCH_NEWEST_FIRST: &str = r#"
    SELECT timestamp, primaryURI, COALESCE(secondaryURI, '') AS secondaryURI,
           COALESCE(hilite, '') AS hilite, COALESCE(annotation, '') AS annotation
    FROM hlte
    WHERE instr(hilite, ?1) > 0
       OR instr(annotation, ?1) > 0
       OR instr(primaryURI, ?1) > 0
       OR instr(secondaryURI, ?1) > 0
    ORDER BY timestamp DESC
    LIMIT ?2
"#;

const SEARCH_OLDEST_FIRST: &str = r#"
    SELECT timestamp, primaryURI, COALESCE(secondaryURI, '') AS secondaryURI,
           COALESCE(hilite, '') AS hilite, COALESCE(annotation, '') AS annotation
    FROM hlte
    WHERE instr(hilite, ?1) > 0
       OR instr(annotation, ?1) > 0
       OR instr(primaryURI, ?1) > 0
       OR instr(secondaryURI, ?1) > 0
    ORDER BY timestamp ASC
    LIMIT ?2
"#;

/// Read-only search over the `hlte` table.
///
/// Holds its own connection pool, separate from the table sink's writer.
#[derive(Clone)]
pub struct QueryEngine {
    pool: SqlitePool,
}

impl QueryEngine {
    /// Open the store under `data_dir`, creating an empty one if needed
    pub async fn open(data_dir: &Path) -> Result<Self, QueryError> {
        let pool = table::open_pool(&table::db_path(data_dir), READ_CONNECTIONS).await?;
        Ok(Self { pool })
    }

    pub async fn search(&self, query: &SearchQuery) -> Result<Vec<SearchHit>, QueryError> {
        let start = Instant::now();
        let sql = if query.newest_first {
            SEARCH_NEWEST_FIRST
        } else {
            SEARCH_OLDEST_FIRST
        };

        let rows = sqlx::query(sql)
            .bind(query.query.as_str())
            .bind(query.limit as i64)
            .fetch_all(&self.pool)
            .await?;

        let hits = rows
            .into_iter()
            .map(|row| {
                Ok(SearchHit {
                    timestamp: row.try_get("timestamp")?,
                    primary_uri: row.try_get("primaryURI")?,
                    secondary_uri: row.try_get("secondaryURI")?,
                    hilite: row.try_get("hilite")?,
                    annotation: row.try_get("annotation")?,
                })
            })
            .collect::<Result<Vec<_>, sqlx::Error>>()?;

        debug!(
            "Search '{}' returned {} rows in {}ms",
            preview(&query.query, 50),
            hits.len(),
            start.elapsed().as_millis()
        );
        Ok(hits)
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}
