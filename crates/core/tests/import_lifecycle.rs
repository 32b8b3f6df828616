//! End-to-end import lifecycle tests against the public crate surface.

use std::sync::Arc;
use std::time::Duration;

use mangawatch_core::catalog::{CatalogStore, SqliteCatalog};
use mangawatch_core::import::{ImportConfig, ImportManager};
use mangawatch_core::source::CatalogSource;
use mangawatch_core::testing::{fixtures, MockCatalogSource};

fn test_config() -> ImportConfig {
    ImportConfig {
        batch_size: 10,
        rate_limit_ms: 0,
        retry_base_delay_ms: 1,
        ..Default::default()
    }
}

fn build_manager(
    config: ImportConfig,
) -> (ImportManager, Arc<MockCatalogSource>, Arc<SqliteCatalog>) {
    let source = Arc::new(MockCatalogSource::new());
    let store = Arc::new(SqliteCatalog::in_memory().unwrap());
    let manager = ImportManager::new(
        Arc::clone(&source) as Arc<dyn CatalogSource>,
        Arc::clone(&store) as Arc<dyn CatalogStore>,
        config,
    );
    (manager, source, store)
}

async fn wait_until_idle(manager: &ImportManager) {
    for _ in 0..300 {
        if !manager.is_running() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("import did not finish in time");
}

async fn seed(source: &MockCatalogSource, count: usize) {
    let records = (0..count)
        .map(|i| {
            fixtures::raw_record_full(
                &format!("manga-{:03}", i),
                &format!("Series {}", i),
                &format!("2021-03-01T00:{:02}:{:02}+00:00", i / 60, i % 60),
                &format!("author-{}", i % 7),
            )
        })
        .collect();
    source.add_records(records).await;
    for i in 0..7 {
        source
            .add_author(&format!("author-{}", i), &format!("Author {}", i))
            .await;
    }
}

#[tokio::test]
async fn import_populates_catalog_with_resolved_authors() {
    let (manager, source, store) = build_manager(test_config());
    seed(&source, 25).await;

    manager.start(None).unwrap();
    wait_until_idle(&manager).await;

    assert_eq!(store.count().unwrap(), 25);

    let record = store.find_by_external_id("manga-003").unwrap().unwrap();
    assert_eq!(record.title, "Series 3");
    assert_eq!(record.author, "Author 3");
    assert!(record.cover_url.is_some());
    assert_eq!(record.genres, vec!["Action".to_string()]);

    let stats = store.stats().unwrap();
    assert_eq!(stats.total_records, 25);
    assert_eq!(stats.with_cover, 25);
    assert_eq!(stats.unique_authors, 7);

    // Authors were resolved in batches, never one call per record.
    let author_calls = source.recorded_author_calls().await;
    assert!(author_calls.len() <= 3);
}

#[tokio::test]
async fn reimport_is_idempotent() {
    let (manager, source, store) = build_manager(test_config());
    seed(&source, 12).await;

    manager.start(None).unwrap();
    wait_until_idle(&manager).await;
    let first: Vec<_> = store.list(&Default::default()).unwrap();

    manager.start(None).unwrap();
    wait_until_idle(&manager).await;
    let second: Vec<_> = store.list(&Default::default()).unwrap();

    assert_eq!(first, second);

    let status = manager.status().await;
    let result = status.last_result.unwrap();
    assert_eq!(result.inserted, 0);
    assert_eq!(result.updated, 12);
}

#[tokio::test]
async fn offset_ceiling_is_never_crossed() {
    let config = ImportConfig {
        batch_size: 5,
        rollover_threshold: 15,
        offset_ceiling: 20,
        rate_limit_ms: 0,
        retry_base_delay_ms: 1,
        ..Default::default()
    };
    let (manager, source, store) = build_manager(config);
    seed(&source, 60).await;

    manager.start(None).unwrap();
    wait_until_idle(&manager).await;

    assert_eq!(store.count().unwrap(), 60);
    for query in source.recorded_queries().await {
        assert!(
            query.offset + query.limit <= 20,
            "query at offset {} crossed the ceiling",
            query.offset
        );
    }
}

#[tokio::test]
async fn exhausted_retries_end_the_run_without_crashing() {
    let (manager, source, store) = build_manager(test_config());
    seed(&source, 30).await;
    // Every attempt at the first page fails; the run ends as if the
    // listing were empty, with the failure on record.
    source.fail_next_pages(3).await;

    manager.start(None).unwrap();
    wait_until_idle(&manager).await;

    let status = manager.status().await;
    let result = status.last_result.unwrap();
    assert_eq!(result.inserted, 0);
    assert_eq!(result.fetched, 0);
    assert!(!result.errors.is_empty());
    assert!(!result.stopped);
    assert_eq!(store.count().unwrap(), 0);

    // A later run with a healthy remote picks everything up.
    manager.start(None).unwrap();
    wait_until_idle(&manager).await;
    assert_eq!(store.count().unwrap(), 30);
}

#[tokio::test]
async fn resume_matches_where_a_full_run_left_off() {
    let (manager, source, store) = build_manager(test_config());
    seed(&source, 20).await;

    // Capped run covers the first half and reports a cursor.
    manager.start(Some(10)).unwrap();
    wait_until_idle(&manager).await;
    let cursor = manager
        .status()
        .await
        .last_result
        .unwrap()
        .last_cursor
        .unwrap();
    assert_eq!(store.count().unwrap(), 10);

    // Resuming from that cursor reaches every remaining record.
    manager.resume(&cursor, None).unwrap();
    wait_until_idle(&manager).await;

    assert_eq!(store.count().unwrap(), 20);
    assert!(store.find_by_external_id("manga-019").unwrap().is_some());
}

#[tokio::test]
async fn status_reflects_live_progress_and_stop() {
    let slow = ImportConfig {
        batch_size: 1,
        rate_limit_ms: 40,
        retry_base_delay_ms: 1,
        ..Default::default()
    };
    let (manager, source, _store) = build_manager(slow);
    seed(&source, 40).await;

    manager.start(None).unwrap();
    tokio::time::sleep(Duration::from_millis(100)).await;

    let status = manager.status().await;
    assert!(status.running);
    assert!(status.fetched > 0);

    assert!(manager.stop());
    wait_until_idle(&manager).await;

    let status = manager.status().await;
    assert!(!status.running);
    let result = status.last_result.unwrap();
    assert!(result.stopped);
    assert!(result.fetched < 40);
}
