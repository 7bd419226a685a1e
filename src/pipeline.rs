//! One search-then-fetch run.
//!
//! The identifier source runs once. An empty result ends the run early
//! without touching the fetcher; otherwise the identifiers are handed to the
//! batch fetcher, which drains them to completion.

use std::sync::Arc;

use tracing::{info, instrument};

use crate::batch::{BatchError, BatchFetcher, BatchReport};
use crate::fetch::ObjectFetcher;
use crate::search::IdentifierSource;

/// How a pipeline run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineOutcome {
    /// The source produced no identifiers (or failed closed); nothing was fetched.
    NoIdentifiers,
    /// Every identifier was attempted.
    Completed(BatchReport),
}

/// Composes an identifier source with a batch fetcher.
#[derive(Debug, Clone)]
pub struct Pipeline {
    batch: BatchFetcher,
}

impl Pipeline {
    /// Creates a pipeline around a configured batch fetcher.
    #[must_use]
    pub fn new(batch: BatchFetcher) -> Self {
        Self { batch }
    }

    /// Returns the batch fetcher.
    #[must_use]
    pub fn batch(&self) -> &BatchFetcher {
        &self.batch
    }

    /// Runs the source once, then fetches everything it returned.
    ///
    /// # Errors
    ///
    /// Returns [`BatchError`] only for batch infrastructure failures; source
    /// failures and per-item fetch failures are not errors here.
    #[instrument(skip_all)]
    pub async fn run(
        &self,
        source: &dyn IdentifierSource,
        fetcher: Arc<dyn ObjectFetcher>,
    ) -> Result<PipelineOutcome, BatchError> {
        let identifiers = source.fetch_identifiers().await;
        if identifiers.is_empty() {
            info!("No identifiers found; nothing to download");
            return Ok(PipelineOutcome::NoIdentifiers);
        }

        let report = self.batch.run(&identifiers, fetcher).await?;
        info!(
            succeeded = report.succeeded(),
            failed = report.failed(),
            "All downloads completed"
        );
        Ok(PipelineOutcome::Completed(report))
    }
}
