//! Concurrency-limited batch fetcher.
//!
//! The [`BatchFetcher`] takes an ordered list of identifiers, derives a
//! [`WorkItem`] for each, and drives an [`ObjectFetcher`] over them with at
//! most `concurrency` fetches in flight. Individual failures are logged and
//! recorded; they never stop the rest of the batch.
//!
//! # Strategies
//!
//! - [`ConcurrencyStrategy::SlidingWindow`] acquires a semaphore permit per
//!   item, so a new fetch starts as soon as any slot frees. Parallelism stays
//!   pinned at the limit until the input runs out.
//! - [`ConcurrencyStrategy::FixedBatch`] runs consecutive chunks of
//!   `concurrency` items and waits for the whole chunk before starting the
//!   next one. One slow item idles every other slot of its chunk, so
//!   throughput is lower than the sliding window.
//!
//! # Example
//!
//! ```no_run
//! use std::path::PathBuf;
//! use std::sync::Arc;
//!
//! use pmc_downloader_core::batch::{BatchFetcher, ConcurrencyStrategy};
//! use pmc_downloader_core::fetch::{BucketLocation, HttpObjectFetcher, KeyLayout};
//! use pmc_downloader_core::search::Identifier;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let batch = BatchFetcher::new(2, ConcurrencyStrategy::SlidingWindow, KeyLayout::default(), PathBuf::from("."))?;
//! let fetcher = Arc::new(HttpObjectFetcher::new(BucketLocation::default())?);
//! let ids = vec![Identifier::from("100"), Identifier::from("200")];
//! let report = batch.run(&ids, fetcher).await?;
//! println!("ok: {}, failed: {}", report.succeeded(), report.failed());
//! # Ok(())
//! # }
//! ```

mod report;

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;

use futures_util::future::join_all;
use serde::Serialize;
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, instrument, warn};

use crate::fetch::{KeyLayout, ObjectFetcher, WorkItem};
use crate::search::Identifier;

pub use report::{BatchReport, FetchOutcome, ItemReport};

/// Minimum allowed concurrency value.
pub const MIN_CONCURRENCY: usize = 1;

/// Maximum allowed concurrency value.
pub const MAX_CONCURRENCY: usize = 100;

/// Default concurrency, kept low to respect the bucket's fair-use expectations.
pub const DEFAULT_CONCURRENCY: usize = 2;

/// Error type for batch fetcher operations.
#[derive(Debug, thiserror::Error)]
pub enum BatchError {
    /// Invalid concurrency value provided.
    #[error(
        "invalid concurrency value {value}: must be between {MIN_CONCURRENCY} and {MAX_CONCURRENCY}"
    )]
    InvalidConcurrency {
        /// The invalid value that was provided.
        value: usize,
    },

    /// Semaphore was closed unexpectedly.
    #[error("semaphore closed unexpectedly")]
    SemaphoreClosed,
}

/// How in-flight fetches are scheduled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ConcurrencyStrategy {
    /// Start the next item as soon as any slot frees.
    #[default]
    SlidingWindow,
    /// Run fully synchronized chunks of `concurrency` items.
    FixedBatch,
}

impl ConcurrencyStrategy {
    /// Returns the stable string label used in config and CLI.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::SlidingWindow => "sliding-window",
            Self::FixedBatch => "fixed-batch",
        }
    }
}

impl fmt::Display for ConcurrencyStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ConcurrencyStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sliding-window" | "sliding_window" | "sliding" => Ok(Self::SlidingWindow),
            "fixed-batch" | "fixed_batch" | "fixed" => Ok(Self::FixedBatch),
            other => Err(format!(
                "unknown strategy '{other}': expected 'sliding-window' or 'fixed-batch'"
            )),
        }
    }
}

/// Drives a fetch primitive over a list of identifiers with bounded parallelism.
///
/// # Concurrency Model
///
/// - Each fetch runs in its own Tokio task
/// - Sliding window: a permit is acquired before each task is spawned and
///   released when the task ends (RAII), even if the fetch panics
/// - Fixed batch: each chunk's tasks are joined before the next chunk spawns
/// - The report is assembled in input order regardless of completion order
#[derive(Debug, Clone)]
pub struct BatchFetcher {
    concurrency: usize,
    strategy: ConcurrencyStrategy,
    layout: KeyLayout,
    output_dir: PathBuf,
}

impl BatchFetcher {
    /// Creates a batch fetcher.
    ///
    /// # Errors
    ///
    /// Returns [`BatchError::InvalidConcurrency`] if `concurrency` is outside
    /// the valid range (1-100).
    #[instrument(level = "debug", skip(layout))]
    pub fn new(
        concurrency: usize,
        strategy: ConcurrencyStrategy,
        layout: KeyLayout,
        output_dir: PathBuf,
    ) -> Result<Self, BatchError> {
        if !(MIN_CONCURRENCY..=MAX_CONCURRENCY).contains(&concurrency) {
            return Err(BatchError::InvalidConcurrency { value: concurrency });
        }

        Ok(Self {
            concurrency,
            strategy,
            layout,
            output_dir,
        })
    }

    /// Returns the configured concurrency limit.
    #[must_use]
    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    /// Returns the configured strategy.
    #[must_use]
    pub fn strategy(&self) -> ConcurrencyStrategy {
        self.strategy
    }

    /// Returns the key layout used to derive work items.
    #[must_use]
    pub fn layout(&self) -> &KeyLayout {
        &self.layout
    }

    /// Returns the directory artifacts are written to.
    #[must_use]
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Builds the work items for `identifiers`, in order.
    #[must_use]
    pub fn work_items(&self, identifiers: &[Identifier]) -> Vec<WorkItem> {
        identifiers
            .iter()
            .map(|id| self.layout.work_item(id, &self.output_dir))
            .collect()
    }

    /// Attempts every identifier exactly once and returns the report.
    ///
    /// Resolves only after every item has finished, successfully or not. An
    /// empty list returns an empty report without touching `fetcher`.
    ///
    /// # Errors
    ///
    /// Returns [`BatchError::SemaphoreClosed`] if the semaphore is closed.
    ///
    /// Note: individual fetch failures do NOT cause this method to error.
    /// They are logged and recorded in the report.
    #[instrument(skip(self, identifiers, fetcher), fields(
        total = identifiers.len(),
        concurrency = self.concurrency,
        strategy = %self.strategy,
        backend = fetcher.name(),
    ))]
    pub async fn run(
        &self,
        identifiers: &[Identifier],
        fetcher: Arc<dyn ObjectFetcher>,
    ) -> Result<BatchReport, BatchError> {
        let items = self.work_items(identifiers);
        if items.is_empty() {
            debug!("no identifiers to fetch");
            return Ok(self.report(Vec::new()));
        }

        info!("starting batch");

        let results = match self.strategy {
            ConcurrencyStrategy::SlidingWindow => {
                self.run_sliding_window(&items, &fetcher).await?
            }
            ConcurrencyStrategy::FixedBatch => self.run_fixed_batch(&items, &fetcher).await,
        };

        let report = self.report(
            items
                .into_iter()
                .zip(results)
                .map(|(item, outcome)| ItemReport {
                    identifier: item.identifier,
                    key: item.key,
                    outcome,
                })
                .collect(),
        );

        info!(
            succeeded = report.succeeded(),
            failed = report.failed(),
            total = report.total(),
            "batch complete"
        );
        Ok(report)
    }

    async fn run_sliding_window(
        &self,
        items: &[WorkItem],
        fetcher: &Arc<dyn ObjectFetcher>,
    ) -> Result<Vec<FetchOutcome>, BatchError> {
        let semaphore = Arc::new(Semaphore::new(self.concurrency));
        let mut handles = Vec::with_capacity(items.len());

        for item in items {
            // Blocks while `concurrency` fetches are in flight
            let permit = Arc::clone(&semaphore)
                .acquire_owned()
                .await
                .map_err(|_| BatchError::SemaphoreClosed)?;

            let fetcher = Arc::clone(fetcher);
            let item = item.clone();
            handles.push(tokio::spawn(async move {
                let _permit = permit;
                fetch_one(fetcher.as_ref(), &item).await
            }));
        }

        debug!(task_count = handles.len(), "waiting for fetches to complete");

        let mut outcomes = Vec::with_capacity(handles.len());
        for handle in handles {
            outcomes.push(join_outcome(handle).await);
        }
        Ok(outcomes)
    }

    async fn run_fixed_batch(
        &self,
        items: &[WorkItem],
        fetcher: &Arc<dyn ObjectFetcher>,
    ) -> Vec<FetchOutcome> {
        let mut outcomes = Vec::with_capacity(items.len());

        for (index, chunk) in items.chunks(self.concurrency).enumerate() {
            let keys = chunk
                .iter()
                .map(|item| item.key.as_str())
                .collect::<Vec<_>>()
                .join(", ");
            info!(chunk = index + 1, keys = %keys, "processing chunk");

            let handles = chunk.iter().map(|item| {
                let fetcher = Arc::clone(fetcher);
                let item = item.clone();
                tokio::spawn(async move { fetch_one(fetcher.as_ref(), &item).await })
            });

            // The next chunk is not spawned until every task of this one has finished
            outcomes.extend(join_all(handles.map(join_outcome)).await);
        }

        outcomes
    }

    fn report(&self, items: Vec<ItemReport>) -> BatchReport {
        BatchReport {
            strategy: self.strategy,
            concurrency: self.concurrency,
            items,
        }
    }
}

/// Awaits one fetch task, turning a panic into a failure outcome.
async fn join_outcome(handle: JoinHandle<FetchOutcome>) -> FetchOutcome {
    match handle.await {
        Ok(outcome) => outcome,
        Err(e) => {
            warn!(error = %e, "fetch task panicked");
            FetchOutcome::Failure {
                error: format!("fetch task panicked: {e}"),
            }
        }
    }
}

/// Runs the fetch primitive for one item. Never returns an error.
async fn fetch_one(fetcher: &dyn ObjectFetcher, item: &WorkItem) -> FetchOutcome {
    info!(key = %item.key, "Starting download");
    match fetcher.fetch(item).await {
        Ok(output) => {
            info!(key = %item.key, path = %output.path.display(), "Downloaded successfully");
            FetchOutcome::Success { output }
        }
        Err(e) => {
            error!(key = %item.key, error = %e, "Failed to download");
            FetchOutcome::Failure {
                error: e.to_string(),
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn fetcher_with(concurrency: usize) -> Result<BatchFetcher, BatchError> {
        BatchFetcher::new(
            concurrency,
            ConcurrencyStrategy::default(),
            KeyLayout::default(),
            PathBuf::from("."),
        )
    }

    #[test]
    fn test_batch_new_valid_concurrency() {
        assert_eq!(fetcher_with(1).unwrap().concurrency(), 1);
        assert_eq!(fetcher_with(2).unwrap().concurrency(), 2);
        assert_eq!(fetcher_with(100).unwrap().concurrency(), 100);
    }

    #[test]
    fn test_batch_new_invalid_concurrency_zero() {
        assert!(matches!(
            fetcher_with(0),
            Err(BatchError::InvalidConcurrency { value: 0 })
        ));
    }

    #[test]
    fn test_batch_new_invalid_concurrency_too_high() {
        assert!(matches!(
            fetcher_with(101),
            Err(BatchError::InvalidConcurrency { value: 101 })
        ));
    }

    #[test]
    fn test_batch_error_display() {
        let msg = BatchError::InvalidConcurrency { value: 0 }.to_string();
        assert!(msg.contains("invalid concurrency"));
        assert!(msg.contains("100"));
    }

    #[test]
    fn test_work_items_preserve_order_and_keys() {
        let batch = BatchFetcher::new(
            2,
            ConcurrencyStrategy::FixedBatch,
            KeyLayout::default(),
            PathBuf::from("out"),
        )
        .unwrap();
        let ids: Vec<Identifier> = ["100", "200", "300"].into_iter().map(Identifier::from).collect();
        let keys: Vec<String> = batch.work_items(&ids).into_iter().map(|i| i.key).collect();
        assert_eq!(keys, vec!["PMC100.txt", "PMC200.txt", "PMC300.txt"]);
    }

    #[test]
    fn test_strategy_parse_and_display() {
        assert_eq!(
            "sliding-window".parse::<ConcurrencyStrategy>().unwrap(),
            ConcurrencyStrategy::SlidingWindow
        );
        assert_eq!(
            "Fixed_Batch".parse::<ConcurrencyStrategy>().unwrap(),
            ConcurrencyStrategy::FixedBatch
        );
        assert!("round-robin".parse::<ConcurrencyStrategy>().is_err());
        assert_eq!(ConcurrencyStrategy::FixedBatch.to_string(), "fixed-batch");
        assert_eq!(ConcurrencyStrategy::default(), ConcurrencyStrategy::SlidingWindow);
    }

    #[test]
    fn test_default_concurrency_constant() {
        assert_eq!(DEFAULT_CONCURRENCY, 2);
    }
}
