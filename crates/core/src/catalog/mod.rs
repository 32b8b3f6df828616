//! Local manga catalog - the relational store the importer syncs into.
//!
//! Records are keyed by the MangaDex UUID (`external_id`); re-imports
//! overwrite mutable fields through `upsert_batch` without ever touching
//! the surrogate key.

mod sqlite;
mod types;

pub use sqlite::SqliteCatalog;
pub use types::*;

/// Trait for catalog storage.
pub trait CatalogStore: Send + Sync {
    /// Look up a record by its MangaDex UUID.
    fn find_by_external_id(&self, external_id: &str)
        -> Result<Option<CatalogRecord>, CatalogError>;

    /// Persist a page of records as one transaction.
    ///
    /// Records with `id = None` are inserted; records carrying a surrogate
    /// key are updated in place. Either the whole batch lands or none of it.
    fn upsert_batch(&self, records: &[CatalogRecord]) -> Result<(), CatalogError>;

    /// Get a record by surrogate key.
    fn get(&self, id: i64) -> Result<CatalogRecord, CatalogError>;

    /// List records ordered by surrogate key.
    fn list(&self, query: &CatalogListQuery) -> Result<Vec<CatalogRecord>, CatalogError>;

    /// Total record count.
    fn count(&self) -> Result<u64, CatalogError>;

    /// Get catalog statistics.
    fn stats(&self) -> Result<CatalogStats, CatalogError>;
}
