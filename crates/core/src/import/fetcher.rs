//! Retry-wrapped page fetching.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast;
use tracing::warn;

use crate::source::{CatalogPage, CatalogSource, PageQuery};

use super::config::ImportConfig;

/// What became of one page fetch.
#[derive(Debug)]
pub enum FetchOutcome {
    /// The page arrived, possibly after retries.
    Page(CatalogPage),
    /// No page could be produced: every attempt failed, or the request
    /// would have crossed the remote's offset ceiling. The caller treats
    /// this as the end of the listing.
    NoPage,
    /// A stop signal arrived while waiting to retry.
    Stopped,
}

/// Fetches listing pages with linear-backoff retries.
///
/// Exhausting the attempts yields no page rather than an error; the
/// caller ends the run as if the listing ran out.
pub struct PageFetcher {
    source: Arc<dyn CatalogSource>,
    config: ImportConfig,
}

impl PageFetcher {
    pub fn new(source: Arc<dyn CatalogSource>, config: ImportConfig) -> Self {
        Self { source, config }
    }

    /// Fetch one page, retrying up to the configured attempt count.
    /// Attempt n sleeps n times the base delay before retrying.
    pub async fn fetch(
        &self,
        query: &PageQuery,
        shutdown_rx: &mut broadcast::Receiver<()>,
    ) -> FetchOutcome {
        if query.offset + query.limit > self.config.offset_ceiling {
            warn!(
                "Refusing fetch at offset {} with limit {}: would cross the {} ceiling",
                query.offset, query.limit, self.config.offset_ceiling
            );
            return FetchOutcome::NoPage;
        }

        for attempt in 1..=self.config.max_retries {
            match self.source.fetch_page(query).await {
                Ok(page) => return FetchOutcome::Page(page),
                Err(e) => {
                    warn!(
                        "Fetch at offset {} failed (attempt {}/{}): {}",
                        query.offset, attempt, self.config.max_retries, e
                    );
                    if attempt < self.config.max_retries {
                        let delay = Duration::from_millis(
                            self.config.retry_base_delay_ms * attempt as u64,
                        );
                        tokio::select! {
                            _ = shutdown_rx.recv() => return FetchOutcome::Stopped,
                            _ = tokio::time::sleep(delay) => {}
                        }
                    }
                }
            }
        }

        warn!(
            "Giving up on page at offset {} after {} attempts",
            query.offset, self.config.max_retries
        );
        FetchOutcome::NoPage
    }
}
