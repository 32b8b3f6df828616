//! SQLite-backed catalog implementation.

use std::path::Path;
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};

use super::{CatalogError, CatalogListQuery, CatalogRecord, CatalogStats, CatalogStore};

/// SQLite-backed manga catalog.
pub struct SqliteCatalog {
    conn: Mutex<Connection>,
}

impl SqliteCatalog {
    /// Create a new SQLite catalog, creating the database file and tables if needed.
    pub fn new(path: &Path) -> Result<Self, CatalogError> {
        let conn = Connection::open(path).map_err(|e| CatalogError::Database(e.to_string()))?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create an in-memory SQLite catalog (useful for testing).
    pub fn in_memory() -> Result<Self, CatalogError> {
        let conn =
            Connection::open_in_memory().map_err(|e| CatalogError::Database(e.to_string()))?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn initialize_schema(conn: &Connection) -> Result<(), CatalogError> {
        conn.execute_batch(
            r#"
            -- One row per unique MangaDex UUID. Alt titles and genres are
            -- JSON arrays; they are only ever read back whole.
            CREATE TABLE IF NOT EXISTS manga (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                external_id TEXT NOT NULL UNIQUE,
                title TEXT NOT NULL,
                author TEXT NOT NULL,
                year INTEGER,
                status TEXT NOT NULL,
                description TEXT NOT NULL,
                cover_url TEXT,
                alt_titles TEXT NOT NULL DEFAULT '[]',
                genres TEXT NOT NULL DEFAULT '[]',
                first_imported_at TEXT NOT NULL,
                last_imported_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_manga_title ON manga(title);
            CREATE INDEX IF NOT EXISTS idx_manga_author ON manga(author);
            "#,
        )
        .map_err(|e| CatalogError::Database(e.to_string()))?;

        Ok(())
    }

    /// Convert a row to a CatalogRecord.
    ///
    /// Column order must match `SELECT_COLUMNS`.
    fn row_to_record(row: &rusqlite::Row) -> rusqlite::Result<CatalogRecord> {
        let alt_titles_json: String = row.get(8)?;
        let genres_json: String = row.get(9)?;

        Ok(CatalogRecord {
            id: Some(row.get(0)?),
            external_id: row.get(1)?,
            title: row.get(2)?,
            author: row.get(3)?,
            year: row.get(4)?,
            status: row.get(5)?,
            description: row.get(6)?,
            cover_url: row.get(7)?,
            alt_titles: serde_json::from_str(&alt_titles_json).unwrap_or_default(),
            genres: serde_json::from_str(&genres_json).unwrap_or_default(),
        })
    }
}

const SELECT_COLUMNS: &str = "id, external_id, title, author, year, status, description, \
     cover_url, alt_titles, genres";

impl CatalogStore for SqliteCatalog {
    fn find_by_external_id(
        &self,
        external_id: &str,
    ) -> Result<Option<CatalogRecord>, CatalogError> {
        let conn = self.conn.lock().unwrap();

        let mut stmt = conn
            .prepare(&format!(
                "SELECT {SELECT_COLUMNS} FROM manga WHERE external_id = ?"
            ))
            .map_err(|e| CatalogError::Database(e.to_string()))?;

        let mut rows = stmt
            .query_map(params![external_id], Self::row_to_record)
            .map_err(|e| CatalogError::Database(e.to_string()))?;

        match rows.next() {
            Some(row) => Ok(Some(
                row.map_err(|e| CatalogError::Database(e.to_string()))?,
            )),
            None => Ok(None),
        }
    }

    fn upsert_batch(&self, records: &[CatalogRecord]) -> Result<(), CatalogError> {
        if records.is_empty() {
            return Ok(());
        }

        let mut conn = self.conn.lock().unwrap();
        let now_str = Utc::now().to_rfc3339();

        // One transaction per page: either every record lands or none does.
        let tx = conn
            .transaction()
            .map_err(|e| CatalogError::Database(e.to_string()))?;

        for record in records {
            let alt_titles_json = serde_json::to_string(&record.alt_titles)
                .map_err(|e| CatalogError::Internal(e.to_string()))?;
            let genres_json = serde_json::to_string(&record.genres)
                .map_err(|e| CatalogError::Internal(e.to_string()))?;

            tx.execute(
                "INSERT INTO manga (external_id, title, author, year, status, description, \
                     cover_url, alt_titles, genres, first_imported_at, last_imported_at)
                 VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
                 ON CONFLICT(external_id) DO UPDATE SET
                    title = excluded.title,
                    author = excluded.author,
                    year = excluded.year,
                    status = excluded.status,
                    description = excluded.description,
                    cover_url = excluded.cover_url,
                    alt_titles = excluded.alt_titles,
                    genres = excluded.genres,
                    last_imported_at = excluded.last_imported_at",
                params![
                    &record.external_id,
                    &record.title,
                    &record.author,
                    record.year,
                    &record.status,
                    &record.description,
                    &record.cover_url,
                    &alt_titles_json,
                    &genres_json,
                    &now_str,
                    &now_str,
                ],
            )
            .map_err(|e| CatalogError::Database(e.to_string()))?;
        }

        tx.commit()
            .map_err(|e| CatalogError::Database(e.to_string()))?;

        Ok(())
    }

    fn get(&self, id: i64) -> Result<CatalogRecord, CatalogError> {
        let conn = self.conn.lock().unwrap();

        conn.query_row(
            &format!("SELECT {SELECT_COLUMNS} FROM manga WHERE id = ?"),
            params![id],
            Self::row_to_record,
        )
        .map_err(|e| match e {
            rusqlite::Error::QueryReturnedNoRows => CatalogError::NotFound(id.to_string()),
            _ => CatalogError::Database(e.to_string()),
        })
    }

    fn list(&self, query: &CatalogListQuery) -> Result<Vec<CatalogRecord>, CatalogError> {
        let conn = self.conn.lock().unwrap();

        let mut stmt = conn
            .prepare(&format!(
                "SELECT {SELECT_COLUMNS} FROM manga ORDER BY id LIMIT ? OFFSET ?"
            ))
            .map_err(|e| CatalogError::Database(e.to_string()))?;

        let rows = stmt
            .query_map(
                params![query.limit as i64, query.offset as i64],
                Self::row_to_record,
            )
            .map_err(|e| CatalogError::Database(e.to_string()))?;

        let mut records = Vec::new();
        for row in rows {
            records.push(row.map_err(|e| CatalogError::Database(e.to_string()))?);
        }
        Ok(records)
    }

    fn count(&self) -> Result<u64, CatalogError> {
        let conn = self.conn.lock().unwrap();

        conn.query_row("SELECT COUNT(*) FROM manga", [], |row| row.get(0))
            .map_err(|e| CatalogError::Database(e.to_string()))
    }

    fn stats(&self) -> Result<CatalogStats, CatalogError> {
        let conn = self.conn.lock().unwrap();

        let total_records: u64 = conn
            .query_row("SELECT COUNT(*) FROM manga", [], |row| row.get(0))
            .map_err(|e| CatalogError::Database(e.to_string()))?;

        let with_cover: u64 = conn
            .query_row(
                "SELECT COUNT(*) FROM manga WHERE cover_url IS NOT NULL",
                [],
                |row| row.get(0),
            )
            .map_err(|e| CatalogError::Database(e.to_string()))?;

        let unique_authors: u64 = conn
            .query_row("SELECT COUNT(DISTINCT author) FROM manga", [], |row| {
                row.get(0)
            })
            .map_err(|e| CatalogError::Database(e.to_string()))?;

        let last_imported_at: Option<DateTime<Utc>> = conn
            .query_row("SELECT MAX(last_imported_at) FROM manga", [], |row| {
                let s: Option<String> = row.get(0)?;
                Ok(s)
            })
            .map_err(|e| CatalogError::Database(e.to_string()))?
            .and_then(|s| DateTime::parse_from_rfc3339(&s).ok())
            .map(|dt| dt.with_timezone(&Utc));

        Ok(CatalogStats {
            total_records,
            with_cover,
            unique_authors,
            last_imported_at,
        })
    }
}
