//! Per-item outcomes and the aggregated batch report.

use serde::Serialize;

use super::ConcurrencyStrategy;
use crate::fetch::FetchOutput;
use crate::search::Identifier;

/// Result of one fetch attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum FetchOutcome {
    /// The object was copied.
    Success {
        /// Raw output of the fetch primitive.
        output: FetchOutput,
    },
    /// The fetch primitive reported an error.
    Failure {
        /// Error detail as logged.
        error: String,
    },
}

impl FetchOutcome {
    /// Returns `true` for [`FetchOutcome::Success`].
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }
}

/// Outcome of one identifier in a batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ItemReport {
    /// Identifier the item was built from.
    pub identifier: Identifier,
    /// Remote key that was fetched.
    pub key: String,
    /// What happened.
    #[serde(flatten)]
    pub outcome: FetchOutcome,
}

/// Aggregated result of a batch run, one entry per input identifier in input order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BatchReport {
    /// Strategy the batch ran with.
    pub strategy: ConcurrencyStrategy,
    /// Concurrency limit the batch ran with.
    pub concurrency: usize,
    /// Per-item outcomes.
    pub items: Vec<ItemReport>,
}

impl BatchReport {
    /// Returns the number of successful items.
    #[must_use]
    pub fn succeeded(&self) -> usize {
        self.items.iter().filter(|i| i.outcome.is_success()).count()
    }

    /// Returns the number of failed items.
    #[must_use]
    pub fn failed(&self) -> usize {
        self.total() - self.succeeded()
    }

    /// Returns the number of items attempted.
    #[must_use]
    pub fn total(&self) -> usize {
        self.items.len()
    }

    /// Returns the identifiers whose fetch failed, in input order.
    #[must_use]
    pub fn failed_identifiers(&self) -> Vec<&Identifier> {
        self.items
            .iter()
            .filter(|i| !i.outcome.is_success())
            .map(|i| &i.identifier)
            .collect()
    }

    /// Returns `true` when no item failed.
    #[must_use]
    pub fn is_complete_success(&self) -> bool {
        self.failed() == 0
    }
}
