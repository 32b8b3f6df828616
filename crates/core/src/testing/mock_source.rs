//! Mock catalog source for testing.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::source::{
    AuthorEntry, CatalogPage, CatalogSource, PageQuery, PassFilter, RawRecord, SourceError,
};

/// Mock implementation of the CatalogSource trait.
///
/// Holds an in-memory dataset ordered by creation time and serves pages
/// from it with the same createdAtSince/offset semantics as the real
/// remote. Supports failure injection and records every query for
/// assertions.
#[derive(Debug, Default)]
pub struct MockCatalogSource {
    /// Dataset, kept sorted by created_at.
    records: Arc<RwLock<Vec<RawRecord>>>,
    /// Known author names by id.
    authors: Arc<RwLock<HashMap<String, String>>>,
    /// Recorded page queries.
    queries: Arc<RwLock<Vec<PageQuery>>>,
    /// Recorded author lookup batches.
    author_calls: Arc<RwLock<Vec<Vec<String>>>>,
    /// Fail this many upcoming fetch_page calls.
    fail_pages: Arc<RwLock<u32>>,
    /// Fail every fetch_authors call while set.
    fail_authors: Arc<RwLock<bool>>,
}

impl MockCatalogSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add records to the dataset, keeping creation-time order.
    pub async fn add_records(&self, new_records: Vec<RawRecord>) {
        let mut records = self.records.write().await;
        records.extend(new_records);
        records.sort_by(|a, b| {
            a.created_at()
                .unwrap_or("")
                .cmp(b.created_at().unwrap_or(""))
        });
    }

    /// Register an author name for id resolution.
    pub async fn add_author(&self, id: &str, name: &str) {
        self.authors
            .write()
            .await
            .insert(id.to_string(), name.to_string());
    }

    /// Make the next `count` fetch_page calls fail.
    pub async fn fail_next_pages(&self, count: u32) {
        *self.fail_pages.write().await = count;
    }

    /// Toggle failure of all author lookups.
    pub async fn set_author_failure(&self, fail: bool) {
        *self.fail_authors.write().await = fail;
    }

    /// All recorded page queries.
    pub async fn recorded_queries(&self) -> Vec<PageQuery> {
        self.queries.read().await.clone()
    }

    /// All recorded author lookup batches.
    pub async fn recorded_author_calls(&self) -> Vec<Vec<String>> {
        self.author_calls.read().await.clone()
    }

    fn matches_filter(record: &RawRecord, filter: &PassFilter) -> bool {
        let Some(attrs) = &record.attributes else {
            return filter.content_ratings.is_empty() && filter.demographics.is_empty();
        };

        if !filter.content_ratings.is_empty() {
            let rating = attrs.content_rating.as_deref().unwrap_or("");
            if !filter.content_ratings.iter().any(|r| r == rating) {
                return false;
            }
        }
        if !filter.demographics.is_empty() {
            let demographic = attrs.publication_demographic.as_deref().unwrap_or("none");
            if !filter.demographics.iter().any(|d| d == demographic) {
                return false;
            }
        }
        true
    }
}

#[async_trait]
impl CatalogSource for MockCatalogSource {
    async fn fetch_page(&self, query: &PageQuery) -> Result<CatalogPage, SourceError> {
        self.queries.write().await.push(query.clone());

        {
            let mut fail_pages = self.fail_pages.write().await;
            if *fail_pages > 0 {
                *fail_pages -= 1;
                return Err(SourceError::ApiError {
                    status: 500,
                    message: "injected failure".to_string(),
                });
            }
        }

        let records = self.records.read().await;
        let since = query.created_at_since.as_deref().unwrap_or("");

        // RFC 3339 timestamps in a uniform offset compare lexicographically.
        let matching: Vec<&RawRecord> = records
            .iter()
            .filter(|r| r.created_at().unwrap_or("") >= since)
            .filter(|r| Self::matches_filter(r, &query.filter))
            .collect();

        let total = matching.len() as u64;
        let page: Vec<RawRecord> = matching
            .into_iter()
            .skip(query.offset as usize)
            .take(query.limit as usize)
            .cloned()
            .collect();

        Ok(CatalogPage {
            records: page,
            limit: query.limit,
            offset: query.offset,
            total,
        })
    }

    async fn fetch_authors(&self, ids: &[String]) -> Result<Vec<AuthorEntry>, SourceError> {
        self.author_calls.write().await.push(ids.to_vec());

        if *self.fail_authors.read().await {
            return Err(SourceError::ApiError {
                status: 503,
                message: "injected author failure".to_string(),
            });
        }

        let authors = self.authors.read().await;
        Ok(ids
            .iter()
            .filter_map(|id| {
                authors.get(id).map(|name| AuthorEntry {
                    id: id.clone(),
                    name: name.clone(),
                })
            })
            .collect())
    }

    async fn total_available(&self, filter: &PassFilter) -> Result<u64, SourceError> {
        let records = self.records.read().await;
        Ok(records
            .iter()
            .filter(|r| Self::matches_filter(r, filter))
            .count() as u64)
    }
}
