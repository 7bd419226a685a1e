//! Fetch primitives that copy one remote object to a local file.
//!
//! Each identifier maps deterministically to a [`WorkItem`]: a remote key
//! built as `prefix + identifier + suffix` and a destination path inside the
//! output directory. An [`ObjectFetcher`] copies the object named by the key
//! from a [`BucketLocation`] to that destination.
//!
//! Two backends are provided:
//! - [`HttpObjectFetcher`] - anonymous HTTPS GET against the bucket endpoint
//! - [`AwsCliFetcher`] - `aws s3 cp --no-sign-request` via the aws CLI

mod aws_cli;
mod error;
mod http;

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::Serialize;

use crate::search::Identifier;

pub use aws_cli::AwsCliFetcher;
pub use error::FetchError;
pub use http::HttpObjectFetcher;

/// Default bucket holding the PMC open-access subset.
pub const DEFAULT_BUCKET: &str = "pmc-oa-opendata";

/// Default path inside the bucket for non-commercial plain-text articles.
pub const DEFAULT_BUCKET_PATH: &str = "oa_noncomm/txt/all";

/// Default key prefix.
pub const DEFAULT_KEY_PREFIX: &str = "PMC";

/// Default key suffix.
pub const DEFAULT_KEY_SUFFIX: &str = ".txt";

/// Rule for turning an identifier into a remote key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyLayout {
    /// Prepended to the identifier.
    pub prefix: String,
    /// Appended to the identifier.
    pub suffix: String,
}

impl Default for KeyLayout {
    fn default() -> Self {
        Self {
            prefix: DEFAULT_KEY_PREFIX.to_string(),
            suffix: DEFAULT_KEY_SUFFIX.to_string(),
        }
    }
}

impl KeyLayout {
    /// Creates a layout from a prefix and suffix.
    pub fn new(prefix: impl Into<String>, suffix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            suffix: suffix.into(),
        }
    }

    /// Returns the remote key for an identifier.
    #[must_use]
    pub fn key_for(&self, identifier: &Identifier) -> String {
        format!("{}{}{}", self.prefix, identifier, self.suffix)
    }

    /// Builds the work item for an identifier, writing into `output_dir`.
    #[must_use]
    pub fn work_item(&self, identifier: &Identifier, output_dir: &Path) -> WorkItem {
        let key = self.key_for(identifier);
        WorkItem {
            identifier: identifier.clone(),
            destination: output_dir.join(&key),
            key,
        }
    }
}

/// Remote location objects are copied from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BucketLocation {
    /// Bucket name.
    pub bucket: String,
    /// Path inside the bucket, without leading or trailing slashes.
    pub path: String,
}

impl Default for BucketLocation {
    fn default() -> Self {
        Self::new(DEFAULT_BUCKET, DEFAULT_BUCKET_PATH)
    }
}

impl BucketLocation {
    /// Creates a location, normalizing slashes around `path`.
    pub fn new(bucket: impl Into<String>, path: impl AsRef<str>) -> Self {
        Self {
            bucket: bucket.into().trim_matches('/').to_string(),
            path: path.as_ref().trim_matches('/').to_string(),
        }
    }

    /// Returns the object path (`path/key`) inside the bucket.
    #[must_use]
    pub fn object_path(&self, key: &str) -> String {
        if self.path.is_empty() {
            key.to_string()
        } else {
            format!("{}/{key}", self.path)
        }
    }

    /// Returns the `s3://` URI for a key.
    #[must_use]
    pub fn s3_uri(&self, key: &str) -> String {
        format!("s3://{}/{}", self.bucket, self.object_path(key))
    }

    /// Returns the virtual-hosted HTTPS endpoint for the bucket.
    #[must_use]
    pub fn default_endpoint(&self) -> String {
        format!("https://{}.s3.amazonaws.com", self.bucket)
    }
}

/// One unit of batch work, derived from an identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkItem {
    /// The identifier this item was built from.
    pub identifier: Identifier,
    /// Remote object key.
    pub key: String,
    /// Local file the object is written to.
    pub destination: PathBuf,
}

/// Raw output of a successful fetch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FetchOutput {
    /// Local file written.
    pub path: PathBuf,
    /// Bytes written, when the backend knows it.
    pub bytes: Option<u64>,
    /// Backend output (captured stdout for the CLI backend).
    pub detail: String,
}

/// Copies one remote object to its local destination.
#[async_trait]
pub trait ObjectFetcher: Send + Sync {
    /// Short backend name used in logs.
    fn name(&self) -> &'static str;

    /// Fetches the object for `item`, overwriting any existing destination file.
    async fn fetch(&self, item: &WorkItem) -> Result<FetchOutput, FetchError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_layout_default_matches_reference_keys() {
        let layout = KeyLayout::default();
        for (id, expected) in [
            ("100", "PMC100.txt"),
            ("200", "PMC200.txt"),
            ("300", "PMC300.txt"),
        ] {
            assert_eq!(layout.key_for(&Identifier::from(id)), expected);
        }
    }

    #[test]
    fn test_work_item_destination_is_key_in_output_dir() {
        let layout = KeyLayout::new("PMC_", ".xml");
        let item = layout.work_item(&Identifier::from("42"), Path::new("/data/out"));
        assert_eq!(item.key, "PMC_42.xml");
        assert_eq!(item.destination, PathBuf::from("/data/out/PMC_42.xml"));
        assert_eq!(item.identifier.as_str(), "42");
    }

    #[test]
    fn test_bucket_location_default_s3_uri() {
        let location = BucketLocation::default();
        assert_eq!(
            location.s3_uri("PMC100.txt"),
            "s3://pmc-oa-opendata/oa_noncomm/txt/all/PMC100.txt"
        );
        assert_eq!(
            location.default_endpoint(),
            "https://pmc-oa-opendata.s3.amazonaws.com"
        );
    }

    #[test]
    fn test_bucket_location_normalizes_slashes() {
        let location = BucketLocation::new("bucket", "/a/b/");
        assert_eq!(location.object_path("k"), "a/b/k");

        let root = BucketLocation::new("bucket", "");
        assert_eq!(root.object_path("k"), "k");
        assert_eq!(root.s3_uri("k"), "s3://bucket/k");
    }
}
