//! Identifier source backed by the NCBI E-utilities `esearch` endpoint.
//!
//! A [`SearchClient`] issues exactly one GET request for its configured
//! [`SearchQuery`], decodes the XML result, and returns the identifiers found
//! at `eSearchResult > IdList > Id`. There is no pagination and no retry.
//!
//! # Example
//!
//! ```no_run
//! use pmc_downloader_core::search::{IdentifierSource, SearchClient, SearchQuery};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = SearchClient::new(SearchQuery::default())?;
//! let ids = client.fetch_identifiers().await;
//! println!("found {} identifiers", ids.len());
//! # Ok(())
//! # }
//! ```

mod error;
mod esearch;

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::ACCEPT;
use serde::Serialize;
use tracing::{debug, error, info, instrument};
use url::Url;

use crate::user_agent;

pub use error::SearchError;

/// Default E-utilities esearch endpoint.
pub const DEFAULT_SEARCH_URL: &str = "https://eutils.ncbi.nlm.nih.gov/entrez/eutils/esearch.fcgi";

/// Default database searched.
pub const DEFAULT_DATABASE: &str = "pmc";

/// Default search term.
pub const DEFAULT_TERM: &str = "cobb syndrome";

/// Default field the term is restricted to.
pub const DEFAULT_FIELD: &str = "title";

/// Default search client connect timeout (10 seconds).
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;

/// Default search client read timeout (30 seconds).
pub const DEFAULT_READ_TIMEOUT_SECS: u64 = 30;

/// Opaque token naming one remote article object.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct Identifier(String);

impl Identifier {
    /// Wraps a raw identifier token.
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Identifier {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Identifier {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for Identifier {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Query parameters for one esearch request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    /// Endpoint URL without query string.
    pub base_url: String,
    /// Entrez database (`db`).
    pub database: String,
    /// Search term (`term`), percent-encoded when the URL is built.
    pub term: String,
    /// Field restriction (`field`), e.g. `title`.
    pub field: Option<String>,
    /// Maximum identifiers returned (`retmax`); the service default applies when unset.
    pub max_results: Option<u32>,
    /// Ask the service to keep results on the history server (`usehistory=y`).
    pub use_history: bool,
}

impl Default for SearchQuery {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_SEARCH_URL.to_string(),
            database: DEFAULT_DATABASE.to_string(),
            term: DEFAULT_TERM.to_string(),
            field: Some(DEFAULT_FIELD.to_string()),
            max_results: None,
            use_history: true,
        }
    }
}

impl SearchQuery {
    /// Builds the full request URL.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::InvalidUrl`] when `base_url` does not parse.
    pub fn to_url(&self) -> Result<Url, SearchError> {
        let mut url =
            Url::parse(&self.base_url).map_err(|_| SearchError::invalid_url(&self.base_url))?;
        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("db", &self.database);
            pairs.append_pair("term", &self.term);
            if let Some(field) = &self.field {
                pairs.append_pair("field", field);
            }
            if let Some(max_results) = self.max_results {
                pairs.append_pair("retmax", &max_results.to_string());
            }
            if self.use_history {
                pairs.append_pair("usehistory", "y");
            }
        }
        Ok(url)
    }
}

/// A source of identifiers for the batch fetcher.
#[async_trait]
pub trait IdentifierSource: Send + Sync {
    /// Retrieves identifiers, surfacing any failure to the caller.
    async fn try_fetch_identifiers(&self) -> Result<Vec<Identifier>, SearchError>;

    /// Retrieves identifiers, failing closed.
    ///
    /// Any error is logged and turned into an empty list.
    async fn fetch_identifiers(&self) -> Vec<Identifier> {
        match self.try_fetch_identifiers().await {
            Ok(ids) => ids,
            Err(e) => {
                error!(error = %e, "Error fetching identifiers");
                Vec::new()
            }
        }
    }
}

/// HTTP client for the esearch endpoint.
#[derive(Debug, Clone)]
pub struct SearchClient {
    client: Client,
    query: SearchQuery,
}

impl SearchClient {
    /// Creates a search client with default timeouts.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::Client`] when HTTP client construction fails.
    pub fn new(query: SearchQuery) -> Result<Self, SearchError> {
        Self::with_timeouts(
            query,
            Duration::from_secs(DEFAULT_CONNECT_TIMEOUT_SECS),
            Duration::from_secs(DEFAULT_READ_TIMEOUT_SECS),
        )
    }

    /// Creates a search client with explicit timeouts.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::Client`] when HTTP client construction fails.
    pub fn with_timeouts(
        query: SearchQuery,
        connect_timeout: Duration,
        read_timeout: Duration,
    ) -> Result<Self, SearchError> {
        let client = Client::builder()
            .connect_timeout(connect_timeout)
            .timeout(read_timeout)
            .user_agent(user_agent::default_user_agent())
            .gzip(true)
            .build()
            .map_err(|source| SearchError::Client { source })?;
        Ok(Self { client, query })
    }

    /// Returns the configured query.
    #[must_use]
    pub fn query(&self) -> &SearchQuery {
        &self.query
    }
}

#[async_trait]
impl IdentifierSource for SearchClient {
    #[instrument(skip(self), fields(db = %self.query.database, term = %self.query.term))]
    async fn try_fetch_identifiers(&self) -> Result<Vec<Identifier>, SearchError> {
        let url = self.query.to_url()?;
        let url_str = url.to_string();
        debug!(url = %url_str, "querying search endpoint");

        let response = self
            .client
            .get(url)
            .header(ACCEPT, "application/xml,text/xml;q=0.9,*/*;q=0.8")
            .send()
            .await
            .map_err(|e| SearchError::network(&url_str, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(SearchError::http_status(&url_str, status.as_u16()));
        }

        let body = response
            .text()
            .await
            .map_err(|e| SearchError::body(&url_str, e))?;

        let parsed = esearch::parse_id_list(&body)?;
        let joined = parsed
            .ids
            .iter()
            .map(Identifier::as_str)
            .collect::<Vec<_>>()
            .join(",");
        info!(
            count = parsed.ids.len(),
            total = parsed.total,
            ids = %joined,
            "Fetched identifiers"
        );

        Ok(parsed.ids)
    }
}
