//! Error types for the fetch module.
//!
//! Variants carry the remote key or URL so a failed item can be identified
//! from the log line alone.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while fetching one remote object.
#[derive(Debug, Error)]
pub enum FetchError {
    /// HTTP client construction failed.
    #[error("failed to build bucket HTTP client: {source}")]
    Client {
        /// The underlying builder error.
        #[source]
        source: reqwest::Error,
    },

    /// The object URL could not be built.
    #[error("invalid object URL: {url}")]
    InvalidUrl {
        /// The invalid URL string.
        url: String,
    },

    /// Network-level error (DNS resolution, connection refused, TLS errors, etc.)
    #[error("network error fetching {url}: {source}")]
    Network {
        /// The object URL.
        url: String,
        /// The underlying network error.
        #[source]
        source: reqwest::Error,
    },

    /// Request timed out before completion.
    #[error("timeout fetching {url}")]
    Timeout {
        /// The object URL.
        url: String,
    },

    /// The bucket answered with a non-success status (e.g. 404 for a missing object).
    #[error("HTTP {status} fetching {url}")]
    HttpStatus {
        /// The object URL.
        url: String,
        /// The HTTP status code.
        status: u16,
    },

    /// File system error while writing the local artifact.
    #[error("IO error writing to {path}: {source}")]
    Io {
        /// The destination path.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The copy tool could not be found on `PATH`.
    #[error("'{tool}' not found on PATH")]
    ToolNotFound {
        /// The tool name that was searched for.
        tool: String,
    },

    /// The copy tool could not be started.
    #[error("failed to start {program}: {source}")]
    CommandSpawn {
        /// The program path.
        program: PathBuf,
        /// The underlying spawn error.
        #[source]
        source: std::io::Error,
    },

    /// The copy tool exited unsuccessfully.
    #[error("copy of {key} exited with {status}: {stderr}")]
    CommandFailed {
        /// The remote key being copied.
        key: String,
        /// Exit status description (code or signal).
        status: String,
        /// Captured standard error, trimmed.
        stderr: String,
    },
}

impl FetchError {
    /// Creates an invalid URL error.
    pub fn invalid_url(url: impl Into<String>) -> Self {
        Self::InvalidUrl { url: url.into() }
    }

    /// Creates a network error, mapping reqwest timeouts to [`FetchError::Timeout`].
    pub fn network(url: impl Into<String>, source: reqwest::Error) -> Self {
        let url = url.into();
        if source.is_timeout() {
            Self::Timeout { url }
        } else {
            Self::Network { url, source }
        }
    }

    /// Creates an HTTP status error.
    pub fn http_status(url: impl Into<String>, status: u16) -> Self {
        Self::HttpStatus {
            url: url.into(),
            status,
        }
    }

    /// Creates an IO error.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Creates a command failure error.
    pub fn command_failed(
        key: impl Into<String>,
        status: impl Into<String>,
        stderr: impl Into<String>,
    ) -> Self {
        Self::CommandFailed {
            key: key.into(),
            status: status.into(),
            stderr: stderr.into(),
        }
    }
}
