//! Error types for the search module.

use thiserror::Error;

/// Errors that can occur while retrieving identifiers from the search service.
#[derive(Debug, Error)]
pub enum SearchError {
    /// The search URL could not be built from the configured base URL.
    #[error("invalid search URL: {url}")]
    InvalidUrl {
        /// The invalid URL string.
        url: String,
    },

    /// HTTP client construction failed.
    #[error("failed to build search HTTP client: {source}")]
    Client {
        /// The underlying builder error.
        #[source]
        source: reqwest::Error,
    },

    /// Network-level error (DNS resolution, connection refused, TLS errors, timeouts).
    #[error("network error querying {url}: {source}")]
    Network {
        /// The search URL that failed.
        url: String,
        /// The underlying network error.
        #[source]
        source: reqwest::Error,
    },

    /// The search service answered with a non-success status.
    #[error("HTTP {status} from search endpoint {url}")]
    HttpStatus {
        /// The search URL.
        url: String,
        /// The HTTP status code.
        status: u16,
    },

    /// The response body could not be read.
    #[error("failed to read search response from {url}: {source}")]
    Body {
        /// The search URL.
        url: String,
        /// The underlying read error.
        #[source]
        source: reqwest::Error,
    },

    /// The response body is not well-formed XML for an esearch result.
    #[error("malformed esearch response: {source}")]
    Parse {
        /// The underlying XML decoding error.
        #[source]
        source: quick_xml::DeError,
    },

    /// The response parsed but carries no `IdList` element.
    #[error("esearch response is missing the IdList element")]
    MissingIdList,

    /// The service reported an error inside the result document.
    #[error("search service reported an error: {message}")]
    Service {
        /// Message from the `<ERROR>` element.
        message: String,
    },
}

impl SearchError {
    /// Creates an invalid URL error.
    pub fn invalid_url(url: impl Into<String>) -> Self {
        Self::InvalidUrl { url: url.into() }
    }

    /// Creates a network error from a reqwest error.
    pub fn network(url: impl Into<String>, source: reqwest::Error) -> Self {
        Self::Network {
            url: url.into(),
            source,
        }
    }

    /// Creates an HTTP status error.
    pub fn http_status(url: impl Into<String>, status: u16) -> Self {
        Self::HttpStatus {
            url: url.into(),
            status,
        }
    }

    /// Creates a body read error.
    pub fn body(url: impl Into<String>, source: reqwest::Error) -> Self {
        Self::Body {
            url: url.into(),
            source,
        }
    }

    /// Creates a service error from an `<ERROR>` element.
    pub fn service(message: impl Into<String>) -> Self {
        Self::Service {
            message: message.into(),
        }
    }
}
