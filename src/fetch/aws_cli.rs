//! Fetcher that shells out to `aws s3 cp` with anonymous access.

use std::path::PathBuf;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, instrument};

use super::{BucketLocation, FetchError, FetchOutput, ObjectFetcher, WorkItem};

/// Name of the aws CLI binary looked up on `PATH`.
pub const AWS_BINARY: &str = "aws";

/// Copies objects with the aws CLI (`aws s3 cp ... --no-sign-request`).
///
/// Each fetch runs one child process. Captured stdout is the success output;
/// on a non-zero exit the captured stderr becomes the failure detail.
#[derive(Debug, Clone)]
pub struct AwsCliFetcher {
    binary_path: PathBuf,
    location: BucketLocation,
}

impl AwsCliFetcher {
    /// Creates a fetcher with an explicit binary path.
    pub fn new(binary_path: impl Into<PathBuf>, location: BucketLocation) -> Self {
        Self {
            binary_path: binary_path.into(),
            location,
        }
    }

    /// Locates `aws` on `PATH`.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::ToolNotFound`] when the binary cannot be found.
    pub fn from_path(location: BucketLocation) -> Result<Self, FetchError> {
        let binary_path = which::which(AWS_BINARY).map_err(|_| FetchError::ToolNotFound {
            tool: AWS_BINARY.to_string(),
        })?;
        Ok(Self::new(binary_path, location))
    }

    /// Returns the binary this fetcher runs.
    #[must_use]
    pub fn binary_path(&self) -> &std::path::Path {
        &self.binary_path
    }

    fn command_for(&self, item: &WorkItem) -> Command {
        let mut command = Command::new(&self.binary_path);
        command
            .arg("s3")
            .arg("cp")
            .arg(self.location.s3_uri(&item.key))
            .arg(&item.destination)
            .arg("--no-sign-request")
            .kill_on_drop(true);
        command
    }
}

#[async_trait]
impl ObjectFetcher for AwsCliFetcher {
    fn name(&self) -> &'static str {
        "aws-cli"
    }

    #[instrument(skip(self, item), fields(key = %item.key))]
    async fn fetch(&self, item: &WorkItem) -> Result<FetchOutput, FetchError> {
        debug!(
            program = %self.binary_path.display(),
            source = %self.location.s3_uri(&item.key),
            "running copy command"
        );

        let output = self
            .command_for(item)
            .output()
            .await
            .map_err(|source| FetchError::CommandSpawn {
                program: self.binary_path.clone(),
                source,
            })?;

        if !output.status.success() {
            return Err(FetchError::command_failed(
                &item.key,
                output.status.to_string(),
                String::from_utf8_lossy(&output.stderr).trim(),
            ));
        }

        Ok(FetchOutput {
            path: item.destination.clone(),
            bytes: None,
            detail: String::from_utf8_lossy(&output.stdout).trim().to_string(),
        })
    }
}
