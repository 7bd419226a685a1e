//! Anonymous HTTPS fetcher for public bucket objects.
//!
//! The object is requested from `{endpoint}/{bucket_path}/{key}` without any
//! signing and streamed straight into the destination file, so large texts
//! never sit fully in memory.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use futures_util::StreamExt;
use reqwest::Client;
use tokio::fs::File;
use tokio::io::{AsyncWriteExt, BufWriter};
use tracing::{debug, instrument, warn};
use url::Url;

use super::{BucketLocation, FetchError, FetchOutput, ObjectFetcher, WorkItem};
use crate::user_agent;

/// Default connect timeout for bucket requests (30 seconds).
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 30;

/// Default read timeout for bucket requests (5 minutes for large texts).
pub const DEFAULT_READ_TIMEOUT_SECS: u64 = 300;

/// Fetches objects over plain HTTPS from a public bucket.
///
/// Created once and shared across the batch so connections are pooled.
#[derive(Debug, Clone)]
pub struct HttpObjectFetcher {
    client: Client,
    endpoint: String,
    location: BucketLocation,
}

impl HttpObjectFetcher {
    /// Creates a fetcher against the bucket's default virtual-hosted endpoint.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::Client`] when HTTP client construction fails.
    pub fn new(location: BucketLocation) -> Result<Self, FetchError> {
        let endpoint = location.default_endpoint();
        Self::with_endpoint(location, endpoint)
    }

    /// Creates a fetcher against an explicit endpoint (mirrors, test servers).
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::Client`] when HTTP client construction fails.
    pub fn with_endpoint(
        location: BucketLocation,
        endpoint: impl Into<String>,
    ) -> Result<Self, FetchError> {
        Self::with_timeouts(
            location,
            endpoint,
            Duration::from_secs(DEFAULT_CONNECT_TIMEOUT_SECS),
            Duration::from_secs(DEFAULT_READ_TIMEOUT_SECS),
        )
    }

    /// Creates a fetcher with explicit endpoint and timeouts.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::Client`] when HTTP client construction fails.
    pub fn with_timeouts(
        location: BucketLocation,
        endpoint: impl Into<String>,
        connect_timeout: Duration,
        read_timeout: Duration,
    ) -> Result<Self, FetchError> {
        let client = Client::builder()
            .connect_timeout(connect_timeout)
            .timeout(read_timeout)
            .user_agent(user_agent::default_user_agent())
            .gzip(true)
            .build()
            .map_err(|source| FetchError::Client { source })?;
        Ok(Self {
            client,
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            location,
        })
    }

    /// Returns the URL an object key is fetched from.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::InvalidUrl`] when the endpoint and key do not form a valid URL.
    pub fn object_url(&self, key: &str) -> Result<Url, FetchError> {
        let raw = format!("{}/{}", self.endpoint, self.location.object_path(key));
        Url::parse(&raw).map_err(|_| FetchError::invalid_url(raw))
    }
}

#[async_trait]
impl ObjectFetcher for HttpObjectFetcher {
    fn name(&self) -> &'static str {
        "http"
    }

    #[instrument(skip(self, item), fields(key = %item.key))]
    async fn fetch(&self, item: &WorkItem) -> Result<FetchOutput, FetchError> {
        let url = self.object_url(&item.key)?;
        let url_str = url.to_string();
        debug!(url = %url_str, "requesting object");

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| FetchError::network(&url_str, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::http_status(&url_str, status.as_u16()));
        }

        let file = File::create(&item.destination)
            .await
            .map_err(|e| FetchError::io(&item.destination, e))?;

        match stream_to_file(response, file, &url_str, &item.destination).await {
            Ok(bytes) => Ok(FetchOutput {
                path: item.destination.clone(),
                bytes: Some(bytes),
                detail: format!("wrote {bytes} bytes from {url_str}"),
            }),
            Err(e) => {
                // Best-effort cleanup so a truncated artifact is not mistaken for a download.
                if let Err(rm) = tokio::fs::remove_file(&item.destination).await {
                    warn!(path = %item.destination.display(), error = %rm, "failed to remove partial file");
                }
                Err(e)
            }
        }
    }
}

async fn stream_to_file(
    response: reqwest::Response,
    file: File,
    url: &str,
    file_path: &Path,
) -> Result<u64, FetchError> {
    let mut writer = BufWriter::new(file);
    let mut stream = response.bytes_stream();
    let mut bytes_written: u64 = 0;

    while let Some(chunk_result) = stream.next().await {
        let chunk = chunk_result.map_err(|e| FetchError::network(url, e))?;
        writer
            .write_all(&chunk)
            .await
            .map_err(|e| FetchError::io(file_path, e))?;
        bytes_written += chunk.len() as u64;
    }

    writer
        .flush()
        .await
        .map_err(|e| FetchError::io(file_path, e))?;

    Ok(bytes_written)
}
