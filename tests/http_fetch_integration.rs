//! Integration tests for the anonymous HTTP bucket fetcher.

use std::path::Path;
use std::sync::Arc;

use pmc_downloader_core::{
    BatchFetcher, BucketLocation, ConcurrencyStrategy, FetchError, HttpObjectFetcher, Identifier,
    KeyLayout, ObjectFetcher,
};
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, ResponseTemplate};

mod support;
use support::socket_guard::start_mock_server_or_skip;

macro_rules! require_mock_server {
    () => {{
        let Some(mock_server) = start_mock_server_or_skip().await else {
            return;
        };
        mock_server
    }};
}

fn fetcher_for(server_uri: &str) -> HttpObjectFetcher {
    HttpObjectFetcher::with_endpoint(BucketLocation::default(), server_uri).unwrap()
}

fn work_item(id: &str, dir: &Path) -> pmc_downloader_core::WorkItem {
    KeyLayout::default().work_item(&Identifier::from(id), dir)
}

#[tokio::test]
async fn test_http_fetch_writes_object_under_key_name() {
    let mock_server = require_mock_server!();
    let temp_dir = TempDir::new().unwrap();

    Mock::given(method("GET"))
        .and(path("/oa_noncomm/txt/all/PMC1234567.txt"))
        .respond_with(ResponseTemplate::new(200).set_body_string("full text body"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let item = work_item("1234567", temp_dir.path());
    let output = fetcher_for(&mock_server.uri()).fetch(&item).await.unwrap();

    assert_eq!(output.path, temp_dir.path().join("PMC1234567.txt"));
    assert_eq!(output.bytes, Some(14));
    assert_eq!(
        std::fs::read_to_string(temp_dir.path().join("PMC1234567.txt")).unwrap(),
        "full text body"
    );
}

#[tokio::test]
async fn test_http_fetch_overwrites_existing_file() {
    let mock_server = require_mock_server!();
    let temp_dir = TempDir::new().unwrap();
    let destination = temp_dir.path().join("PMC1.txt");
    std::fs::write(&destination, "stale content that is longer than the new body").unwrap();

    Mock::given(method("GET"))
        .and(path("/oa_noncomm/txt/all/PMC1.txt"))
        .respond_with(ResponseTemplate::new(200).set_body_string("fresh"))
        .mount(&mock_server)
        .await;

    fetcher_for(&mock_server.uri())
        .fetch(&work_item("1", temp_dir.path()))
        .await
        .unwrap();

    assert_eq!(std::fs::read_to_string(destination).unwrap(), "fresh");
}

#[tokio::test]
async fn test_http_fetch_missing_object_is_error_and_leaves_no_file() {
    let mock_server = require_mock_server!();
    let temp_dir = TempDir::new().unwrap();

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&mock_server)
        .await;

    let err = fetcher_for(&mock_server.uri())
        .fetch(&work_item("999", temp_dir.path()))
        .await
        .unwrap_err();

    assert!(
        matches!(err, FetchError::HttpStatus { status: 404, .. }),
        "got: {err:?}"
    );
    assert!(!temp_dir.path().join("PMC999.txt").exists());
}

#[tokio::test]
async fn test_http_fetch_missing_output_dir_is_io_error() {
    let mock_server = require_mock_server!();
    let temp_dir = TempDir::new().unwrap();

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("text"))
        .mount(&mock_server)
        .await;

    let missing = temp_dir.path().join("does-not-exist");
    let err = fetcher_for(&mock_server.uri())
        .fetch(&work_item("1", &missing))
        .await
        .unwrap_err();

    assert!(matches!(err, FetchError::Io { .. }), "got: {err:?}");
}

#[tokio::test]
async fn test_batch_over_http_records_partial_failure() {
    let mock_server = require_mock_server!();
    let temp_dir = TempDir::new().unwrap();

    for id in ["1", "3"] {
        Mock::given(method("GET"))
            .and(path(format!("/oa_noncomm/txt/all/PMC{id}.txt")))
            .respond_with(ResponseTemplate::new(200).set_body_string(format!("article {id}")))
            .mount(&mock_server)
            .await;
    }
    Mock::given(method("GET"))
        .and(path("/oa_noncomm/txt/all/PMC2.txt"))
        .respond_with(ResponseTemplate::new(403))
        .mount(&mock_server)
        .await;

    let batch = BatchFetcher::new(
        2,
        ConcurrencyStrategy::FixedBatch,
        KeyLayout::default(),
        temp_dir.path().to_path_buf(),
    )
    .unwrap();
    let identifiers: Vec<Identifier> = ["1", "2", "3"].into_iter().map(Identifier::from).collect();

    let report = batch
        .run(&identifiers, Arc::new(fetcher_for(&mock_server.uri())))
        .await
        .unwrap();

    assert_eq!(report.succeeded(), 2);
    assert_eq!(report.failed_identifiers(), vec![&Identifier::from("2")]);
    assert_eq!(
        std::fs::read_to_string(temp_dir.path().join("PMC3.txt")).unwrap(),
        "article 3"
    );
    assert!(!temp_dir.path().join("PMC2.txt").exists());
}
