//! Integration tests for the aws CLI fetcher, using a stand-in script in
//! place of the real `aws` binary.

#![cfg(unix)]

use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

use pmc_downloader_core::{AwsCliFetcher, BucketLocation, FetchError, Identifier, KeyLayout, ObjectFetcher};
use tempfile::TempDir;

/// Writes a fake `aws` that logs its arguments and copies a canned body to
/// the destination, or fails for keys containing "PMC404".
fn fake_aws(dir: &Path) -> PathBuf {
    let script = dir.join("aws");
    let body = r#"#!/bin/sh
echo "$@" >> "$(dirname "$0")/calls.log"
case "$3" in
  *PMC404*) echo "fatal error: An error occurred (404) when calling the HeadObject operation" >&2; exit 1 ;;
esac
printf 'copied %s' "$3" > "$4"
echo "download: $3 to $4"
"#;
    std::fs::write(&script, body).unwrap();
    let mut permissions = std::fs::metadata(&script).unwrap().permissions();
    permissions.set_mode(0o755);
    std::fs::set_permissions(&script, permissions).unwrap();
    script
}

#[tokio::test]
async fn test_aws_cli_fetch_copies_with_unsigned_request() {
    let temp_dir = TempDir::new().unwrap();
    let script = fake_aws(temp_dir.path());
    let fetcher = AwsCliFetcher::new(&script, BucketLocation::default());
    let item = KeyLayout::default().work_item(&Identifier::from("42"), temp_dir.path());

    let output = fetcher.fetch(&item).await.unwrap();

    assert_eq!(output.path, temp_dir.path().join("PMC42.txt"));
    assert!(output.detail.contains("download:"), "got: {}", output.detail);
    assert_eq!(
        std::fs::read_to_string(temp_dir.path().join("PMC42.txt")).unwrap(),
        "copied s3://pmc-oa-opendata/oa_noncomm/txt/all/PMC42.txt"
    );

    let calls = std::fs::read_to_string(temp_dir.path().join("calls.log")).unwrap();
    assert!(calls.starts_with("s3 cp s3://pmc-oa-opendata/oa_noncomm/txt/all/PMC42.txt "));
    assert!(calls.trim_end().ends_with("--no-sign-request"), "got: {calls}");
}

#[tokio::test]
async fn test_aws_cli_nonzero_exit_is_command_failure() {
    let temp_dir = TempDir::new().unwrap();
    let script = fake_aws(temp_dir.path());
    let fetcher = AwsCliFetcher::new(&script, BucketLocation::default());
    let item = KeyLayout::default().work_item(&Identifier::from("404"), temp_dir.path());

    let err = fetcher.fetch(&item).await.unwrap_err();

    match err {
        FetchError::CommandFailed { key, stderr, .. } => {
            assert_eq!(key, "PMC404.txt");
            assert!(stderr.contains("(404)"), "got: {stderr}");
        }
        other => panic!("expected CommandFailed, got {other:?}"),
    }
}
