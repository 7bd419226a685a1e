//! CLI argument definitions using clap derive macros.

use std::fmt;
use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use pmc_downloader_core::fetch::{
    DEFAULT_BUCKET, DEFAULT_BUCKET_PATH, DEFAULT_KEY_PREFIX, DEFAULT_KEY_SUFFIX,
};
use pmc_downloader_core::search::{DEFAULT_DATABASE, DEFAULT_FIELD, DEFAULT_SEARCH_URL, DEFAULT_TERM};
use pmc_downloader_core::{ConcurrencyStrategy, DEFAULT_CONCURRENCY};

/// Default connect timeout for search and bucket requests, in seconds.
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 30;

/// Default read timeout for search and bucket requests, in seconds.
pub const DEFAULT_READ_TIMEOUT_SECS: u64 = 300;

/// Which fetch primitive copies objects out of the bucket.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum FetchBackend {
    /// Anonymous HTTPS GET against the bucket endpoint.
    #[default]
    Http,
    /// `aws s3 cp --no-sign-request` through the aws CLI.
    AwsCli,
}

impl FetchBackend {
    /// Parses a config-file label.
    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim().to_ascii_lowercase().as_str() {
            "http" | "https" => Some(Self::Http),
            "aws-cli" | "aws_cli" | "aws" => Some(Self::AwsCli),
            _ => None,
        }
    }
}

impl fmt::Display for FetchBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Http => "http",
            Self::AwsCli => "aws-cli",
        })
    }
}

/// Search PubMed Central and batch download open-access full texts.
///
/// Runs one esearch query, then copies `{prefix}{id}{suffix}` for every
/// returned identifier from the PMC open-access bucket, with a bounded
/// number of concurrent fetches.
///
/// Exit codes: 0 all downloads succeeded (or nothing to do), 1 partial
/// success, 2 every download failed or an empty search with --fail-on-empty.
#[derive(Parser, Debug, Clone)]
#[command(name = "pmc-downloader")]
#[command(author, version, about)]
pub struct Args {
    /// Increase output verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long)]
    pub quiet: bool,

    /// Maximum concurrent downloads (1-100)
    #[arg(short = 'c', long, default_value_t = DEFAULT_CONCURRENCY as u8, value_parser = clap::value_parser!(u8).range(1..=100))]
    pub concurrency: u8,

    /// Scheduling strategy: sliding-window or fixed-batch
    #[arg(long, default_value_t = ConcurrencyStrategy::SlidingWindow, value_parser = parse_strategy)]
    pub strategy: ConcurrencyStrategy,

    /// Fetch primitive used to copy objects
    #[arg(long, value_enum, default_value_t = FetchBackend::Http)]
    pub backend: FetchBackend,

    /// Search term
    #[arg(short = 't', long, default_value = DEFAULT_TERM)]
    pub term: String,

    /// Field the term is restricted to (empty for all fields)
    #[arg(long, default_value = DEFAULT_FIELD)]
    pub field: String,

    /// Entrez database to search
    #[arg(long = "db", default_value = DEFAULT_DATABASE)]
    pub database: String,

    /// Maximum identifiers requested from the search service (1-10000)
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..=10_000))]
    pub max_results: Option<u32>,

    /// esearch endpoint URL
    #[arg(long, default_value = DEFAULT_SEARCH_URL)]
    pub search_url: String,

    /// Bucket holding the full texts
    #[arg(long, default_value = DEFAULT_BUCKET)]
    pub bucket: String,

    /// Path inside the bucket
    #[arg(long, default_value = DEFAULT_BUCKET_PATH)]
    pub bucket_path: String,

    /// Key prefix prepended to each identifier
    #[arg(long, default_value = DEFAULT_KEY_PREFIX)]
    pub prefix: String,

    /// Key suffix appended to each identifier
    #[arg(long, default_value = DEFAULT_KEY_SUFFIX)]
    pub suffix: String,

    /// HTTP endpoint for the http backend (defaults to the bucket's S3 endpoint)
    #[arg(long)]
    pub endpoint: Option<String>,

    /// Path to the aws binary for the aws-cli backend (defaults to PATH lookup)
    #[arg(long)]
    pub aws_binary: Option<PathBuf>,

    /// Directory downloads are written to (default: current directory)
    #[arg(short = 'o', long)]
    pub output_dir: Option<PathBuf>,

    /// Treat an empty or failed search as an error (exit code 2)
    #[arg(long)]
    pub fail_on_empty: bool,

    /// List identifiers and derived keys without downloading
    #[arg(long)]
    pub dry_run: bool,

    /// Print the batch report as JSON instead of the text summary
    #[arg(long)]
    pub json: bool,

    /// Config file path (default: $XDG_CONFIG_HOME/pmc-downloader/config.toml)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// HTTP connect timeout in seconds (1-3600)
    #[arg(long, default_value_t = DEFAULT_CONNECT_TIMEOUT_SECS, value_parser = clap::value_parser!(u64).range(1..=3600))]
    pub connect_timeout: u64,

    /// HTTP read timeout in seconds (1-3600)
    #[arg(long, default_value_t = DEFAULT_READ_TIMEOUT_SECS, value_parser = clap::value_parser!(u64).range(1..=3600))]
    pub read_timeout: u64,
}

fn parse_strategy(raw: &str) -> Result<ConcurrencyStrategy, String> {
    raw.parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_default_args_parses_successfully() {
        let args = Args::try_parse_from(["pmc-downloader"]).unwrap();
        assert_eq!(args.verbose, 0);
        assert!(!args.quiet);
        assert_eq!(args.concurrency, 2); // DEFAULT_CONCURRENCY
        assert_eq!(args.strategy, ConcurrencyStrategy::SlidingWindow);
        assert_eq!(args.backend, FetchBackend::Http);
        assert_eq!(args.term, "cobb syndrome");
        assert_eq!(args.field, "title");
        assert_eq!(args.database, "pmc");
        assert_eq!(args.bucket, "pmc-oa-opendata");
        assert_eq!(args.bucket_path, "oa_noncomm/txt/all");
        assert_eq!(args.prefix, "PMC");
        assert_eq!(args.suffix, ".txt");
        assert!(args.max_results.is_none());
        assert!(args.output_dir.is_none());
        assert!(!args.fail_on_empty);
        assert!(!args.dry_run);
    }

    #[test]
    fn test_cli_verbose_flag_increments_count() {
        let args = Args::try_parse_from(["pmc-downloader", "-v"]).unwrap();
        assert_eq!(args.verbose, 1);

        let args = Args::try_parse_from(["pmc-downloader", "-vv"]).unwrap();
        assert_eq!(args.verbose, 2);
    }

    #[test]
    fn test_cli_help_flag_shows_usage() {
        let result = Args::try_parse_from(["pmc-downloader", "--help"]);
        let err = result.unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::DisplayHelp);
    }

    #[test]
    fn test_cli_invalid_flag_returns_error() {
        let err = Args::try_parse_from(["pmc-downloader", "--invalid-flag"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::UnknownArgument);
    }

    #[test]
    fn test_cli_concurrency_bounds() {
        let args = Args::try_parse_from(["pmc-downloader", "-c", "1"]).unwrap();
        assert_eq!(args.concurrency, 1);
        let args = Args::try_parse_from(["pmc-downloader", "--concurrency", "100"]).unwrap();
        assert_eq!(args.concurrency, 100);

        for bad in ["0", "101"] {
            let err = Args::try_parse_from(["pmc-downloader", "-c", bad]).unwrap_err();
            assert_eq!(err.kind(), clap::error::ErrorKind::ValueValidation);
        }
    }

    #[test]
    fn test_cli_strategy_values() {
        let args = Args::try_parse_from(["pmc-downloader", "--strategy", "fixed-batch"]).unwrap();
        assert_eq!(args.strategy, ConcurrencyStrategy::FixedBatch);

        let err = Args::try_parse_from(["pmc-downloader", "--strategy", "random"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::ValueValidation);
    }

    #[test]
    fn test_cli_backend_values() {
        let args = Args::try_parse_from(["pmc-downloader", "--backend", "aws-cli"]).unwrap();
        assert_eq!(args.backend, FetchBackend::AwsCli);

        let err = Args::try_parse_from(["pmc-downloader", "--backend", "ftp"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::InvalidValue);
    }

    #[test]
    fn test_cli_max_results_range() {
        let args = Args::try_parse_from(["pmc-downloader", "--max-results", "20"]).unwrap();
        assert_eq!(args.max_results, Some(20));

        let err = Args::try_parse_from(["pmc-downloader", "--max-results", "0"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::ValueValidation);
    }

    #[test]
    fn test_cli_search_and_layout_overrides() {
        let args = Args::try_parse_from([
            "pmc-downloader",
            "-t",
            "moyamoya disease",
            "--field",
            "",
            "--prefix",
            "PMC_",
            "--suffix",
            ".xml",
            "-o",
            "out",
        ])
        .unwrap();
        assert_eq!(args.term, "moyamoya disease");
        assert_eq!(args.field, "");
        assert_eq!(args.prefix, "PMC_");
        assert_eq!(args.suffix, ".xml");
        assert_eq!(args.output_dir, Some(PathBuf::from("out")));
    }

    #[test]
    fn test_fetch_backend_from_label() {
        assert_eq!(FetchBackend::from_label("HTTP"), Some(FetchBackend::Http));
        assert_eq!(FetchBackend::from_label("aws"), Some(FetchBackend::AwsCli));
        assert_eq!(FetchBackend::from_label("ftp"), None);
        assert_eq!(FetchBackend::AwsCli.to_string(), "aws-cli");
    }
}
