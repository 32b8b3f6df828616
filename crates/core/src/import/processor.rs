//! Per-page batch processing.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::catalog::{CatalogError, CatalogStore};
use crate::source::RawRecord;

use super::resolver::AuthorResolver;
use super::transform;

/// Counts from one successfully written page.
#[derive(Debug, Default, PartialEq)]
pub struct PageOutcome {
    /// Records seen for the first time.
    pub inserted: u64,
    /// Records that already existed and were refreshed.
    pub updated: u64,
    /// Records dropped from the page when their catalog lookup failed.
    pub errored: u64,
}

/// Turns a page of raw records into catalog records and writes them in a
/// single batch.
///
/// Each record is classified before the write: present in the catalog
/// means update, absent means insert. Updates merge onto the stored record
/// so the surrogate key survives. A record whose lookup fails is dropped
/// and counted; the rest of the page proceeds. The write itself is all or
/// nothing.
pub struct BatchProcessor {
    store: Arc<dyn CatalogStore>,
    resolver: AuthorResolver,
}

impl BatchProcessor {
    pub fn new(store: Arc<dyn CatalogStore>, resolver: AuthorResolver) -> Self {
        Self { store, resolver }
    }

    pub async fn process_page(&self, records: &[RawRecord]) -> Result<PageOutcome, CatalogError> {
        if records.is_empty() {
            return Ok(PageOutcome::default());
        }

        let authors = self.resolver.resolve(records).await;

        let mut outcome = PageOutcome::default();
        let mut to_write = Vec::with_capacity(records.len());

        for raw in records {
            let fresh = transform::transform(raw, &authors);
            match self.store.find_by_external_id(&fresh.external_id) {
                Ok(Some(mut existing)) => {
                    existing.merge_from(&fresh);
                    to_write.push(existing);
                    outcome.updated += 1;
                }
                Ok(None) => {
                    to_write.push(fresh);
                    outcome.inserted += 1;
                }
                Err(e) => {
                    warn!("Dropping record {} from the page: {}", fresh.external_id, e);
                    outcome.errored += 1;
                }
            }
        }

        self.store.upsert_batch(&to_write)?;

        debug!(
            "Page written: {} new, {} refreshed, {} dropped",
            outcome.inserted, outcome.updated, outcome.errored
        );
        Ok(outcome)
    }
}
