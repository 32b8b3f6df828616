//! Types for the local manga catalog.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A manga record in the local catalog.
///
/// Identity is the MangaDex-assigned `external_id`; the numeric `id` is a
/// local surrogate key assigned by sqlite on first insert and never changes
/// afterwards. Everything else may be overwritten on re-import.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CatalogRecord {
    /// Local surrogate key. `None` until the record has been persisted.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    /// MangaDex UUID, unique across the catalog.
    pub external_id: String,
    /// Display title.
    pub title: String,
    /// Primary author display name ("Unknown" when unresolved).
    pub author: String,
    /// Release year, when the source provides one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub year: Option<i32>,
    /// Publication status, capitalized ("Ongoing", "Completed", "Hiatus",
    /// "Cancelled", or "Unknown").
    pub status: String,
    /// Synopsis, empty string when the source has none.
    pub description: String,
    /// Cover image URL, absent when the source page carried no cover art.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cover_url: Option<String>,
    /// Alternate titles across all languages, in encounter order.
    pub alt_titles: Vec<String>,
    /// Genre/theme/format tag names.
    pub genres: Vec<String>,
}

impl CatalogRecord {
    /// A record carrying only its external ID. Used when the remote item has
    /// no attributes block at all.
    pub fn minimal(external_id: impl Into<String>) -> Self {
        Self {
            id: None,
            external_id: external_id.into(),
            title: String::new(),
            author: String::new(),
            year: None,
            status: String::new(),
            description: String::new(),
            cover_url: None,
            alt_titles: Vec::new(),
            genres: Vec::new(),
        }
    }

    /// Copy the mutable fields of `fresh` onto `self`, keeping the surrogate
    /// key and external ID that were assigned at first insert.
    pub fn merge_from(&mut self, fresh: &CatalogRecord) {
        self.title = fresh.title.clone();
        self.author = fresh.author.clone();
        self.year = fresh.year;
        self.status = fresh.status.clone();
        self.description = fresh.description.clone();
        self.cover_url = fresh.cover_url.clone();
        self.alt_titles = fresh.alt_titles.clone();
        self.genres = fresh.genres.clone();
    }
}

/// Paged listing query for the catalog.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogListQuery {
    /// Maximum results.
    #[serde(default = "default_limit")]
    pub limit: u32,
    /// Offset into the listing (ordered by surrogate key).
    #[serde(default)]
    pub offset: u32,
}

fn default_limit() -> u32 {
    100
}

impl Default for CatalogListQuery {
    fn default() -> Self {
        Self {
            limit: default_limit(),
            offset: 0,
        }
    }
}

/// Catalog statistics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogStats {
    /// Total records in the catalog.
    pub total_records: u64,
    /// Records with a cover URL.
    pub with_cover: u64,
    /// Distinct author display names.
    pub unique_authors: u64,
    /// When the most recent import touched the catalog.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_imported_at: Option<DateTime<Utc>>,
}

/// Errors for catalog operations.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_record_only_carries_external_id() {
        let record = CatalogRecord::minimal("abc-123");
        assert_eq!(record.external_id, "abc-123");
        assert!(record.id.is_none());
        assert!(record.title.is_empty());
        assert!(record.alt_titles.is_empty());
    }

    #[test]
    fn test_merge_preserves_identity() {
        let mut existing = CatalogRecord {
            id: Some(42),
            external_id: "abc-123".to_string(),
            title: "Old Title".to_string(),
            author: "Old Author".to_string(),
            year: Some(1999),
            status: "Ongoing".to_string(),
            description: "old".to_string(),
            cover_url: None,
            alt_titles: vec![],
            genres: vec![],
        };

        let mut fresh = CatalogRecord::minimal("should-not-win");
        fresh.title = "New Title".to_string();
        fresh.author = "New Author".to_string();
        fresh.status = "Completed".to_string();
        fresh.genres = vec!["Action".to_string()];

        existing.merge_from(&fresh);

        assert_eq!(existing.id, Some(42));
        assert_eq!(existing.external_id, "abc-123");
        assert_eq!(existing.title, "New Title");
        assert_eq!(existing.status, "Completed");
        assert_eq!(existing.genres, vec!["Action".to_string()]);
    }

    #[test]
    fn test_record_serialization_skips_absent_fields() {
        let record = CatalogRecord::minimal("abc-123");
        let json = serde_json::to_string(&record).unwrap();
        assert!(!json.contains("\"id\""));
        assert!(!json.contains("cover_url"));
    }

    #[test]
    fn test_list_query_defaults() {
        let query: CatalogListQuery = serde_json::from_str("{}").unwrap();
        assert_eq!(query.limit, 100);
        assert_eq!(query.offset, 0);
    }
}
