//! Cursor-driven import runs.
//!
//! The remote rejects any listing request whose offset plus limit exceeds
//! 10,000, so a run cannot simply page through the full catalog by offset.
//! Instead the driver walks a creation-time ordered window: when the offset
//! nears the ceiling, the window's floor moves forward to the creation
//! timestamp of the last record written and the offset resets to zero.

use std::sync::Arc;

use tokio::sync::broadcast;
use tracing::{info, warn};

use crate::catalog::CatalogStore;
use crate::source::{CatalogSource, PageQuery, PassFilter};

use super::config::ImportConfig;
use super::fetcher::{FetchOutcome, PageFetcher};
use super::processor::BatchProcessor;
use super::resolver::AuthorResolver;
use super::types::{ImportCursor, ImportProgress, ImportResult};

/// Record cap applied to each pass of a multipass import. Matches the
/// remote's offset ceiling: one pass can never page past it anyway.
pub const MULTIPASS_RECORD_CAP: u64 = 10_000;

/// Drives import runs: fetch, resolve, transform, write, advance cursor.
pub struct ImportDriver {
    fetcher: PageFetcher,
    processor: BatchProcessor,
    config: ImportConfig,
    progress: Arc<ImportProgress>,
}

impl ImportDriver {
    pub fn new(
        source: Arc<dyn CatalogSource>,
        store: Arc<dyn CatalogStore>,
        config: ImportConfig,
        progress: Arc<ImportProgress>,
    ) -> Self {
        let fetcher = PageFetcher::new(Arc::clone(&source), config.clone());
        let resolver = AuthorResolver::new(source, config.author_batch_limit);
        let processor = BatchProcessor::new(store, resolver);

        Self {
            fetcher,
            processor,
            config,
            progress,
        }
    }

    /// The passes of a multipass import: one per content rating, then one
    /// per publication demographic. Between them they cover segments that
    /// are each small enough to fit under the offset ceiling.
    pub fn multipass_filters() -> Vec<PassFilter> {
        let mut filters: Vec<PassFilter> = ["safe", "suggestive", "erotica"]
            .iter()
            .map(|r| PassFilter::for_rating(r))
            .collect();
        filters.extend(
            ["shounen", "shoujo", "josei", "seinen", "none"]
                .iter()
                .map(|d| PassFilter::for_demographic(d)),
        );
        filters
    }

    /// Run one import pass over the filtered listing, starting from the
    /// given cursor, until `max_records` records have been accounted for,
    /// the listing is exhausted, or a stop signal arrives.
    pub async fn run(
        &self,
        filter: &PassFilter,
        start: ImportCursor,
        max_records: u64,
        shutdown_rx: &mut broadcast::Receiver<()>,
    ) -> ImportResult {
        let mut result = ImportResult::begin();
        let mut cursor = start;
        let mut last_created_at = cursor.created_at_since.clone();

        info!(
            "Import pass starting: filter={}, since={:?}, offset={}, cap={}",
            filter.label(),
            cursor.created_at_since,
            cursor.offset,
            max_records
        );

        loop {
            if result.fetched >= max_records {
                info!("Record cap of {} reached", max_records);
                break;
            }
            match shutdown_rx.try_recv() {
                Err(broadcast::error::TryRecvError::Empty) => {}
                Err(broadcast::error::TryRecvError::Lagged(_)) | Ok(()) => {
                    result.stopped = true;
                    break;
                }
                Err(broadcast::error::TryRecvError::Closed) => {
                    result.stopped = true;
                    break;
                }
            }

            if cursor.offset + self.config.batch_size > self.config.rollover_threshold {
                // Move the window floor forward instead of paging into the
                // ceiling. Needs at least one written record since the last
                // rollover, otherwise we would spin on the same window.
                match &last_created_at {
                    Some(ts) if cursor.created_at_since.as_deref() != Some(ts) => {
                        info!("Cursor rollover at offset {}: since={}", cursor.offset, ts);
                        cursor = ImportCursor {
                            created_at_since: Some(ts.clone()),
                            offset: 0,
                        };
                    }
                    _ => {
                        warn!("Cannot roll the cursor forward, stopping pass");
                        result.add_error(format!(
                            "offset {} reached rollover threshold with no new cursor",
                            cursor.offset
                        ));
                        break;
                    }
                }
            }

            let remaining = max_records - result.fetched;
            let limit = remaining.min(self.config.batch_size as u64) as u32;
            let query = PageQuery {
                limit,
                offset: cursor.offset,
                created_at_since: cursor.created_at_since.clone(),
                filter: filter.clone(),
            };

            match self.fetcher.fetch(&query, shutdown_rx).await {
                FetchOutcome::Stopped => {
                    result.stopped = true;
                    break;
                }
                FetchOutcome::NoPage => {
                    // Exhausted retries read the same as a drained listing.
                    warn!(
                        "No page at offset {} after {} attempts, ending pass",
                        cursor.offset, self.config.max_retries
                    );
                    result.add_error(format!(
                        "no page at offset {} after {} attempts",
                        cursor.offset, self.config.max_retries
                    ));
                    break;
                }
                FetchOutcome::Page(page) => {
                    if page.records.is_empty() {
                        info!("Listing exhausted at offset {}", cursor.offset);
                        break;
                    }

                    let count = page.records.len() as u64;
                    match self.processor.process_page(&page.records).await {
                        Ok(outcome) => {
                            result.inserted += outcome.inserted;
                            result.updated += outcome.updated;
                            result.errored += outcome.errored;
                            result.fetched += count;
                            self.progress.record_page(
                                outcome.inserted,
                                outcome.updated,
                                0,
                                outcome.errored,
                            );
                            if let Some(ts) = page.records.last().and_then(|r| r.created_at()) {
                                last_created_at = Some(ts.to_string());
                            }
                        }
                        Err(e) => {
                            // The batch write is transactional, so none of
                            // the page landed. Move one batch past it; the
                            // cursor floor stays put.
                            result.skipped += count;
                            result.fetched += count;
                            result.add_error(format!(
                                "batch write at offset {} failed: {}",
                                cursor.offset, e
                            ));
                            self.progress.record_page(0, 0, count, 0);
                        }
                    }

                    cursor.offset += count as u32;
                    self.progress.set_cursor(last_created_at.clone());

                    if count < limit as u64 {
                        info!("Short page of {} records, listing exhausted", count);
                        break;
                    }

                    if self.config.rate_limit_ms > 0 {
                        tokio::select! {
                            _ = shutdown_rx.recv() => {
                                result.stopped = true;
                                break;
                            }
                            _ = tokio::time::sleep(std::time::Duration::from_millis(
                                self.config.rate_limit_ms,
                            )) => {}
                        }
                    }
                }
            }
        }

        result.last_cursor = last_created_at;
        result.finish();

        info!(
            "Import pass finished: filter={}, inserted={}, updated={}, skipped={}, errored={}, stopped={}",
            filter.label(),
            result.inserted,
            result.updated,
            result.skipped,
            result.errored,
            result.stopped
        );
        result
    }

    /// Run every multipass filter in sequence, merging the per-pass results.
    /// A stop signal ends the current pass and skips the rest.
    pub async fn run_multipass(
        &self,
        max_per_pass: u64,
        shutdown_rx: &mut broadcast::Receiver<()>,
    ) -> ImportResult {
        let mut combined = ImportResult::begin();

        for filter in Self::multipass_filters() {
            self.progress.set_pass(Some(filter.label()));
            let pass_result = self
                .run(&filter, ImportCursor::start(), max_per_pass, shutdown_rx)
                .await;
            let stopped = pass_result.stopped;
            combined.merge(&pass_result);
            if stopped {
                break;
            }
        }

        self.progress.set_pass(None);
        combined.finish();
        combined
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::SqliteCatalog;
    use crate::testing::{fixtures, MockCatalogSource};

    fn fast_config() -> ImportConfig {
        ImportConfig {
            batch_size: 2,
            rate_limit_ms: 0,
            retry_base_delay_ms: 1,
            ..Default::default()
        }
    }

    fn setup(config: ImportConfig) -> (ImportDriver, Arc<MockCatalogSource>, Arc<SqliteCatalog>) {
        let source = Arc::new(MockCatalogSource::new());
        let store = Arc::new(SqliteCatalog::in_memory().unwrap());
        let driver = ImportDriver::new(
            Arc::clone(&source) as Arc<dyn CatalogSource>,
            Arc::clone(&store) as Arc<dyn CatalogStore>,
            config,
            Arc::new(ImportProgress::default()),
        );
        (driver, source, store)
    }

    fn dataset(count: usize) -> Vec<crate::source::RawRecord> {
        (0..count)
            .map(|i| {
                fixtures::raw_record(
                    &format!("m{:02}", i),
                    &format!("Title {}", i),
                    &format!("2020-01-01T00:00:{:02}+00:00", i),
                )
            })
            .collect()
    }

    #[tokio::test]
    async fn test_run_imports_everything_and_terminates() {
        let (driver, source, store) = setup(fast_config());
        source.add_records(dataset(5)).await;
        let (_tx, mut rx) = broadcast::channel(1);

        let result = driver
            .run(&PassFilter::default(), ImportCursor::start(), 1_000, &mut rx)
            .await;

        assert_eq!(result.inserted, 5);
        assert_eq!(result.updated, 0);
        assert_eq!(result.errored, 0);
        assert!(!result.stopped);
        assert!(result.finished_at.is_some());
        assert_eq!(store.count().unwrap(), 5);
    }

    #[tokio::test]
    async fn test_rollover_keeps_offsets_under_ceiling() {
        let config = ImportConfig {
            rollover_threshold: 4,
            offset_ceiling: 6,
            ..fast_config()
        };
        let (driver, source, store) = setup(config);
        source.add_records(dataset(12)).await;
        let (_tx, mut rx) = broadcast::channel(1);

        let result = driver
            .run(&PassFilter::default(), ImportCursor::start(), 1_000, &mut rx)
            .await;

        // Overlap at each rollover turns into updates, never duplicates.
        assert_eq!(store.count().unwrap(), 12);
        assert_eq!(result.inserted, 12);
        assert!(result.updated > 0);

        for query in source.recorded_queries().await {
            assert!(query.offset + query.limit <= 6);
        }
    }

    #[tokio::test]
    async fn test_exhausted_retries_end_the_run() {
        let (driver, source, store) = setup(fast_config());
        source.add_records(dataset(4)).await;
        // Every attempt at the first page fails, so the run ends there.
        source.fail_next_pages(3).await;
        let (_tx, mut rx) = broadcast::channel(1);

        let result = driver
            .run(&PassFilter::default(), ImportCursor::start(), 1_000, &mut rx)
            .await;

        assert_eq!(result.inserted, 0);
        assert_eq!(result.fetched, 0);
        assert_eq!(result.errors.len(), 1);
        assert!(!result.stopped);
        assert_eq!(store.count().unwrap(), 0);
        // Three retry attempts, then not a single further request.
        assert_eq!(source.recorded_queries().await.len(), 3);
    }

    #[tokio::test]
    async fn test_failed_batch_write_skips_one_batch_and_continues() {
        let config = ImportConfig {
            rate_limit_ms: 1,
            ..fast_config()
        };
        let source = Arc::new(MockCatalogSource::new());
        let store = Arc::new(crate::testing::FlakyCatalog::new().unwrap());
        let driver = ImportDriver::new(
            Arc::clone(&source) as Arc<dyn CatalogSource>,
            Arc::clone(&store) as Arc<dyn CatalogStore>,
            config,
            Arc::new(ImportProgress::default()),
        );
        source.add_records(dataset(4)).await;
        store.set_write_failure(true);
        let (_tx, mut rx) = broadcast::channel(1);

        let result = driver
            .run(&PassFilter::default(), ImportCursor::start(), 1_000, &mut rx)
            .await;

        // Both pages were lost but the run walked the whole listing.
        assert_eq!(result.skipped, 4);
        assert_eq!(result.inserted, 0);
        assert_eq!(result.errors.len(), 2);
        assert_eq!(store.count().unwrap(), 0);
        assert_eq!(source.recorded_queries().await.len(), 3);
    }

    #[tokio::test]
    async fn test_short_page_ends_run_without_another_fetch() {
        let (driver, source, store) = setup(fast_config());
        source.add_records(dataset(3)).await;
        let (_tx, mut rx) = broadcast::channel(1);

        let result = driver
            .run(&PassFilter::default(), ImportCursor::start(), 1_000, &mut rx)
            .await;

        assert_eq!(result.inserted, 3);
        assert_eq!(store.count().unwrap(), 3);
        // A full page, then a short one of 1; the short page is final.
        assert_eq!(source.recorded_queries().await.len(), 2);
    }

    #[tokio::test]
    async fn test_stop_signal_ends_run() {
        let (driver, source, _store) = setup(fast_config());
        source.add_records(dataset(4)).await;
        let (tx, mut rx) = broadcast::channel(1);

        tx.send(()).unwrap();
        let result = driver
            .run(&PassFilter::default(), ImportCursor::start(), 1_000, &mut rx)
            .await;

        assert!(result.stopped);
        assert_eq!(result.fetched, 0);
    }

    #[tokio::test]
    async fn test_record_cap_stops_run() {
        let (driver, source, store) = setup(fast_config());
        source.add_records(dataset(10)).await;
        let (_tx, mut rx) = broadcast::channel(1);

        let result = driver
            .run(&PassFilter::default(), ImportCursor::start(), 4, &mut rx)
            .await;

        assert_eq!(result.fetched, 4);
        assert_eq!(store.count().unwrap(), 4);
    }

    #[tokio::test]
    async fn test_resume_from_cursor_skips_older_records() {
        let (driver, source, store) = setup(fast_config());
        source.add_records(dataset(6)).await;
        let (_tx, mut rx) = broadcast::channel(1);

        let cursor = ImportCursor::resume_from("2020-01-01T00:00:03+00:00");
        let result = driver
            .run(&PassFilter::default(), cursor, 1_000, &mut rx)
            .await;

        // Records m03..m05 sit at or after the cursor floor.
        assert_eq!(result.inserted, 3);
        assert_eq!(store.count().unwrap(), 3);
        assert!(store.find_by_external_id("m02").unwrap().is_none());
        assert!(store.find_by_external_id("m03").unwrap().is_some());
    }

    #[tokio::test]
    async fn test_multipass_covers_disjoint_segments() {
        let (driver, source, store) = setup(fast_config());

        let mut records = dataset(6);
        for (i, record) in records.iter_mut().enumerate() {
            let attrs = record.attributes.as_mut().unwrap();
            attrs.content_rating = Some(
                ["safe", "suggestive", "erotica"][i % 3].to_string(),
            );
            if i % 2 == 0 {
                attrs.publication_demographic = Some("seinen".to_string());
            }
        }
        source.add_records(records).await;
        let (_tx, mut rx) = broadcast::channel(1);

        let result = driver.run_multipass(MULTIPASS_RECORD_CAP, &mut rx).await;

        // Every record is reachable through at least one pass; demographic
        // passes revisit some as updates.
        assert_eq!(store.count().unwrap(), 6);
        assert_eq!(result.inserted + result.updated, result.fetched);
        assert!(result.fetched >= 6);
    }

    #[tokio::test]
    async fn test_multipass_filter_inventory() {
        let filters = ImportDriver::multipass_filters();
        assert_eq!(filters.len(), 8);
        assert_eq!(filters[0].label(), "rating:safe");
        assert_eq!(filters[7].label(), "demographic:none");
    }
}
