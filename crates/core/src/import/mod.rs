//! MangaDex import pipeline.
//!
//! Pulls the remote catalog page by page, resolves authors in batches,
//! transforms each raw entry with degrading fallbacks, and upserts pages
//! transactionally into the local catalog. The driver walks a
//! creation-time cursor so a run can cover catalogs far larger than the
//! remote's 10,000 offset ceiling.

mod config;
mod driver;
mod fetcher;
mod manager;
mod processor;
mod resolver;
mod transform;
mod types;

pub use config::ImportConfig;
pub use driver::{ImportDriver, MULTIPASS_RECORD_CAP};
pub use fetcher::{FetchOutcome, PageFetcher};
pub use manager::ImportManager;
pub use processor::{BatchProcessor, PageOutcome};
pub use resolver::AuthorResolver;
pub use transform::transform;
pub use types::{
    ImportCursor, ImportError, ImportProgress, ImportResult, ImportStatus, MAX_RECORDED_ERRORS,
};
