//! Import pipeline types.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::catalog::CatalogError;
use crate::source::SourceError;

/// Recorded error messages are capped so a long degraded run cannot grow
/// the result without bound. Counters keep counting past the cap.
pub const MAX_RECORDED_ERRORS: usize = 100;

/// Errors from the import pipeline.
#[derive(Debug, Error)]
pub enum ImportError {
    /// An import run is already in progress.
    #[error("An import is already running")]
    AlreadyRunning,

    /// Remote source failed.
    #[error("Source error: {0}")]
    Source(#[from] SourceError),

    /// Local catalog failed.
    #[error("Catalog error: {0}")]
    Store(#[from] CatalogError),

    /// A supplied resume cursor could not be used.
    #[error("Invalid cursor: {0}")]
    InvalidCursor(String),
}

/// Position in the creation-time ordered listing.
///
/// `created_at_since` narrows the listing to records created at or after
/// the timestamp; `offset` is the position within that narrowed window.
/// Keeping the offset below the remote's ceiling is the whole point of
/// rolling the timestamp forward.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ImportCursor {
    #[serde(default)]
    pub created_at_since: Option<String>,
    #[serde(default)]
    pub offset: u32,
}

impl ImportCursor {
    pub fn start() -> Self {
        Self::default()
    }

    pub fn resume_from(created_at_since: impl Into<String>) -> Self {
        Self {
            created_at_since: Some(created_at_since.into()),
            offset: 0,
        }
    }
}

/// Outcome of one import run (or one pass of a multipass run).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportResult {
    pub started_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<DateTime<Utc>>,
    /// Records the run has accounted for, successful or not.
    pub fetched: u64,
    /// Records inserted for the first time.
    pub inserted: u64,
    /// Records that already existed and were refreshed.
    pub updated: u64,
    /// Records passed over when a page's batch write failed and the run
    /// moved one batch past it.
    pub skipped: u64,
    /// Records dropped individually when their catalog lookup failed.
    pub errored: u64,
    /// Whether the run ended early on an operator stop.
    pub stopped: bool,
    /// Cursor position at the end of the run, usable for resumption.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_cursor: Option<String>,
    /// First MAX_RECORDED_ERRORS error messages.
    pub errors: Vec<String>,
}

impl ImportResult {
    pub fn begin() -> Self {
        Self {
            started_at: Utc::now(),
            finished_at: None,
            fetched: 0,
            inserted: 0,
            updated: 0,
            skipped: 0,
            errored: 0,
            stopped: false,
            last_cursor: None,
            errors: Vec::new(),
        }
    }

    pub fn add_error(&mut self, message: impl Into<String>) {
        if self.errors.len() < MAX_RECORDED_ERRORS {
            self.errors.push(message.into());
        }
    }

    /// Fold another run's counts into this one. Used by multipass imports.
    pub fn merge(&mut self, other: &ImportResult) {
        self.fetched += other.fetched;
        self.inserted += other.inserted;
        self.updated += other.updated;
        self.skipped += other.skipped;
        self.errored += other.errored;
        self.stopped = self.stopped || other.stopped;
        if other.last_cursor.is_some() {
            self.last_cursor = other.last_cursor.clone();
        }
        for error in &other.errors {
            self.add_error(error.clone());
        }
        if other.finished_at.is_some() {
            self.finished_at = other.finished_at;
        }
    }

    pub fn finish(&mut self) {
        self.finished_at = Some(Utc::now());
    }
}

/// Live snapshot of the import pipeline, served by the status endpoint.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ImportStatus {
    pub running: bool,
    pub fetched: u64,
    pub inserted: u64,
    pub updated: u64,
    pub skipped: u64,
    pub errored: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_pass: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_cursor: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_result: Option<ImportResult>,
}

/// Shared counters a running import updates as it goes.
///
/// Read concurrently by the status endpoint, so plain atomics rather than
/// a lock around the whole thing.
#[derive(Debug, Default)]
pub struct ImportProgress {
    fetched: AtomicU64,
    inserted: AtomicU64,
    updated: AtomicU64,
    skipped: AtomicU64,
    errored: AtomicU64,
    last_cursor: RwLock<Option<String>>,
    current_pass: RwLock<Option<String>>,
}

impl ImportProgress {
    pub fn reset(&self) {
        self.fetched.store(0, Ordering::Relaxed);
        self.inserted.store(0, Ordering::Relaxed);
        self.updated.store(0, Ordering::Relaxed);
        self.skipped.store(0, Ordering::Relaxed);
        self.errored.store(0, Ordering::Relaxed);
        *self.last_cursor.write().unwrap() = None;
        *self.current_pass.write().unwrap() = None;
    }

    pub fn record_page(&self, inserted: u64, updated: u64, skipped: u64, errored: u64) {
        self.inserted.fetch_add(inserted, Ordering::Relaxed);
        self.updated.fetch_add(updated, Ordering::Relaxed);
        self.skipped.fetch_add(skipped, Ordering::Relaxed);
        self.errored.fetch_add(errored, Ordering::Relaxed);
        self.fetched
            .fetch_add(inserted + updated + skipped + errored, Ordering::Relaxed);
    }

    pub fn set_cursor(&self, cursor: Option<String>) {
        *self.last_cursor.write().unwrap() = cursor;
    }

    pub fn set_pass(&self, pass: Option<String>) {
        *self.current_pass.write().unwrap() = pass;
    }

    pub fn snapshot(&self, running: bool, last_result: Option<ImportResult>) -> ImportStatus {
        ImportStatus {
            running,
            fetched: self.fetched.load(Ordering::Relaxed),
            inserted: self.inserted.load(Ordering::Relaxed),
            updated: self.updated.load(Ordering::Relaxed),
            skipped: self.skipped.load(Ordering::Relaxed),
            errored: self.errored.load(Ordering::Relaxed),
            current_pass: self.current_pass.read().unwrap().clone(),
            last_cursor: self.last_cursor.read().unwrap().clone(),
            last_result,
        }
    }
}
