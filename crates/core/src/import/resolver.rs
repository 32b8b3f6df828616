//! Batched author name resolution.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use tracing::warn;

use crate::source::{CatalogSource, RawRecord};

/// Resolves author ids referenced by a page of raw records into display
/// names, one remote call per chunk of ids.
///
/// Resolution failures are not fatal: an unresolved author simply becomes
/// "Unknown" in the transformed record.
pub struct AuthorResolver {
    source: Arc<dyn CatalogSource>,
    batch_limit: usize,
}

impl AuthorResolver {
    pub fn new(source: Arc<dyn CatalogSource>, batch_limit: usize) -> Self {
        Self {
            source,
            batch_limit: batch_limit.max(1),
        }
    }

    /// Resolve the authors referenced by `records` into an id-to-name map.
    pub async fn resolve(&self, records: &[RawRecord]) -> HashMap<String, String> {
        // BTreeSet both dedups and keeps chunk contents deterministic.
        let ids: BTreeSet<&str> = records.iter().filter_map(|r| r.author_id()).collect();
        if ids.is_empty() {
            return HashMap::new();
        }

        let ids: Vec<String> = ids.into_iter().map(str::to_string).collect();
        let mut resolved = HashMap::with_capacity(ids.len());

        for chunk in ids.chunks(self.batch_limit) {
            match self.source.fetch_authors(chunk).await {
                Ok(entries) => {
                    for entry in entries {
                        resolved.insert(entry.id, entry.name);
                    }
                }
                Err(e) => {
                    warn!(
                        "Author lookup failed for {} ids, names degrade to Unknown: {}",
                        chunk.len(),
                        e
                    );
                }
            }
        }

        resolved
    }
}
