//! Fault-injecting catalog wrapper for testing.

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

use crate::catalog::{
    CatalogError, CatalogListQuery, CatalogRecord, CatalogStats, CatalogStore, SqliteCatalog,
};

/// Catalog wrapper that can be told to reject batch writes or individual
/// lookups.
///
/// Untouched calls pass through to the in-memory SQLite catalog
/// underneath, so tests can assert what did or did not get persisted.
pub struct FlakyCatalog {
    inner: SqliteCatalog,
    fail_writes: AtomicBool,
    fail_reads: AtomicU32,
}

impl FlakyCatalog {
    pub fn new() -> Result<Self, CatalogError> {
        Ok(Self {
            inner: SqliteCatalog::in_memory()?,
            fail_writes: AtomicBool::new(false),
            fail_reads: AtomicU32::new(0),
        })
    }

    /// Toggle rejection of upsert_batch calls.
    pub fn set_write_failure(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Make the next `count` find_by_external_id calls fail.
    pub fn fail_next_reads(&self, count: u32) {
        self.fail_reads.store(count, Ordering::SeqCst);
    }

    fn take_read_failure(&self) -> bool {
        self.fail_reads
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }
}

impl CatalogStore for FlakyCatalog {
    fn find_by_external_id(
        &self,
        external_id: &str,
    ) -> Result<Option<CatalogRecord>, CatalogError> {
        if self.take_read_failure() {
            return Err(CatalogError::Database("injected read failure".to_string()));
        }
        self.inner.find_by_external_id(external_id)
    }

    fn upsert_batch(&self, records: &[CatalogRecord]) -> Result<(), CatalogError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(CatalogError::Database(
                "injected write failure".to_string(),
            ));
        }
        self.inner.upsert_batch(records)
    }

    fn get(&self, id: i64) -> Result<CatalogRecord, CatalogError> {
        self.inner.get(id)
    }

    fn list(&self, query: &CatalogListQuery) -> Result<Vec<CatalogRecord>, CatalogError> {
        self.inner.list(query)
    }

    fn count(&self) -> Result<u64, CatalogError> {
        self.inner.count()
    }

    fn stats(&self) -> Result<CatalogStats, CatalogError> {
        self.inner.stats()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_failure_toggle() {
        let catalog = FlakyCatalog::new().unwrap();
        let record = CatalogRecord::minimal("m1");

        catalog.set_write_failure(true);
        assert!(catalog.upsert_batch(std::slice::from_ref(&record)).is_err());
        assert_eq!(catalog.count().unwrap(), 0);

        catalog.set_write_failure(false);
        catalog.upsert_batch(&[record]).unwrap();
        assert_eq!(catalog.count().unwrap(), 1);
    }

    #[test]
    fn test_read_failures_are_consumed() {
        let catalog = FlakyCatalog::new().unwrap();
        catalog.fail_next_reads(2);

        assert!(catalog.find_by_external_id("m1").is_err());
        assert!(catalog.find_by_external_id("m1").is_err());
        assert!(catalog.find_by_external_id("m1").unwrap().is_none());
    }
}
