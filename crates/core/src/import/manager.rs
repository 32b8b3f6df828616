//! Import lifecycle management.
//!
//! One import runs at a time. Start spawns the run as a background task
//! and returns immediately; status is served from shared counters while
//! the run is in flight; stop is a broadcast the run notices at its next
//! page boundary or sleep.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::NaiveDateTime;
use tokio::sync::{broadcast, RwLock};
use tracing::{info, warn};

use crate::catalog::CatalogStore;
use crate::source::{CatalogSource, PassFilter};

use super::config::ImportConfig;
use super::driver::{ImportDriver, MULTIPASS_RECORD_CAP};
use super::types::{ImportCursor, ImportError, ImportProgress, ImportResult, ImportStatus};

/// Owns the single permitted import run and its observable state.
pub struct ImportManager {
    driver: Arc<ImportDriver>,
    config: ImportConfig,
    progress: Arc<ImportProgress>,
    running: Arc<AtomicBool>,
    last_result: Arc<RwLock<Option<ImportResult>>>,
    shutdown_tx: broadcast::Sender<()>,
}

impl ImportManager {
    pub fn new(
        source: Arc<dyn CatalogSource>,
        store: Arc<dyn CatalogStore>,
        config: ImportConfig,
    ) -> Self {
        let progress = Arc::new(ImportProgress::default());
        let driver = Arc::new(ImportDriver::new(
            source,
            store,
            config.clone(),
            Arc::clone(&progress),
        ));
        let (shutdown_tx, _) = broadcast::channel(1);

        Self {
            driver,
            config,
            progress,
            running: Arc::new(AtomicBool::new(false)),
            last_result: Arc::new(RwLock::new(None)),
            shutdown_tx,
        }
    }

    /// Start a single-pass import over all handled content ratings.
    /// Fails if a run is already in flight.
    pub fn start(&self, max_records: Option<u64>) -> Result<(), ImportError> {
        let max_records = max_records.unwrap_or(self.config.max_records);
        self.spawn_run(ImportCursor::start(), max_records)
    }

    /// Resume a single-pass import from a creation-time cursor.
    pub fn resume(&self, cursor: &str, max_records: Option<u64>) -> Result<(), ImportError> {
        if !cursor_is_valid(cursor) {
            return Err(ImportError::InvalidCursor(cursor.to_string()));
        }
        let max_records = max_records.unwrap_or(self.config.max_records);
        self.spawn_run(ImportCursor::resume_from(cursor), max_records)
    }

    fn spawn_run(&self, cursor: ImportCursor, max_records: u64) -> Result<(), ImportError> {
        self.acquire_run_slot()?;

        let driver = Arc::clone(&self.driver);
        let progress = Arc::clone(&self.progress);
        let running = Arc::clone(&self.running);
        let last_result = Arc::clone(&self.last_result);
        let mut shutdown_rx = self.shutdown_tx.subscribe();

        info!("Import starting: cap={}", max_records);
        tokio::spawn(async move {
            let result = driver
                .run(
                    &PassFilter::default_ratings(),
                    cursor,
                    max_records,
                    &mut shutdown_rx,
                )
                .await;
            progress.set_cursor(result.last_cursor.clone());
            *last_result.write().await = Some(result);
            running.store(false, Ordering::SeqCst);
        });

        Ok(())
    }

    /// Start a multipass import: one pass per content rating, then one per
    /// publication demographic.
    pub fn start_multipass(&self) -> Result<(), ImportError> {
        self.acquire_run_slot()?;

        let driver = Arc::clone(&self.driver);
        let running = Arc::clone(&self.running);
        let last_result = Arc::clone(&self.last_result);
        let mut shutdown_rx = self.shutdown_tx.subscribe();

        info!("Multipass import starting");
        tokio::spawn(async move {
            let result = driver
                .run_multipass(MULTIPASS_RECORD_CAP, &mut shutdown_rx)
                .await;
            *last_result.write().await = Some(result);
            running.store(false, Ordering::SeqCst);
        });

        Ok(())
    }

    fn acquire_run_slot(&self) -> Result<(), ImportError> {
        if self
            .running
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            warn!("Import start rejected, a run is already in flight");
            return Err(ImportError::AlreadyRunning);
        }
        self.progress.reset();
        Ok(())
    }

    /// Request a graceful stop. Returns whether a run was there to stop.
    pub fn stop(&self) -> bool {
        if !self.running.load(Ordering::SeqCst) {
            return false;
        }
        info!("Import stop requested");
        let _ = self.shutdown_tx.send(());
        true
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Live snapshot: counters of the in-flight run (or the counters where
    /// the last run left them) plus the last completed result.
    pub async fn status(&self) -> ImportStatus {
        let last_result = self.last_result.read().await.clone();
        self.progress
            .snapshot(self.running.load(Ordering::SeqCst), last_result)
    }
}

/// The remote takes cursors in RFC 3339 with or without a UTC offset.
fn cursor_is_valid(cursor: &str) -> bool {
    NaiveDateTime::parse_from_str(cursor, "%Y-%m-%dT%H:%M:%S").is_ok()
        || chrono::DateTime::parse_from_rfc3339(cursor).is_ok()
}
