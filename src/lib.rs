//! PMC Downloader Core Library
//!
//! This library searches PubMed Central for article identifiers and
//! downloads the matching open-access full texts from the public
//! `pmc-oa-opendata` bucket, with a bounded number of concurrent fetches.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//! - [`search`] - Identifier source backed by the E-utilities `esearch` endpoint
//! - [`fetch`] - Fetch primitives (aws CLI, anonymous HTTPS) keyed by identifier
//! - [`batch`] - Concurrency-limited batch fetcher and its report
//! - [`pipeline`] - Composition of search and batch into one run

// Clippy lints - strict for library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod batch;
pub mod fetch;
pub mod pipeline;
pub mod search;
mod user_agent;

// Re-export commonly used types
pub use batch::{
    BatchError, BatchFetcher, BatchReport, ConcurrencyStrategy, DEFAULT_CONCURRENCY,
    FetchOutcome, ItemReport, MAX_CONCURRENCY, MIN_CONCURRENCY,
};
pub use fetch::{
    AwsCliFetcher, BucketLocation, FetchError, FetchOutput, HttpObjectFetcher, KeyLayout,
    ObjectFetcher, WorkItem,
};
pub use pipeline::{Pipeline, PipelineOutcome};
pub use search::{Identifier, IdentifierSource, SearchClient, SearchError, SearchQuery};
