use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use pmc_downloader_core::{
    AwsCliFetcher, BatchFetcher, BucketLocation, HttpObjectFetcher, IdentifierSource, KeyLayout,
    ObjectFetcher, Pipeline, PipelineOutcome, SearchClient, SearchQuery,
};
use tracing::{debug, info};

use crate::ProcessExit;
use crate::app::{config_file, config_runtime, exit_handler, output, terminal};
use crate::cli::{Args, FetchBackend};

pub(crate) async fn run_downloader() -> Result<ProcessExit> {
    let (cli, cli_sources) = config_runtime::parse_cli_with_sources();

    let loaded = config_file::load_file_config(cli.config.as_deref())?;
    let args = config_runtime::apply_config_defaults(cli, &cli_sources, loaded.config.as_ref())?;

    let default_level = config_runtime::resolve_default_log_level(&args);
    let force_cli_log_level = config_runtime::should_force_cli_log_level(&cli_sources);
    terminal::init_tracing(default_level, force_cli_log_level);

    if let Some(path) = loaded.path.as_ref().filter(|_| loaded.config.is_some()) {
        debug!(path = %path.display(), "Loaded config file");
    }
    debug!(?args, "CLI arguments resolved");
    info!("PMC downloader starting");

    let connect_timeout = Duration::from_secs(args.connect_timeout);
    let read_timeout = Duration::from_secs(args.read_timeout);

    let source = SearchClient::with_timeouts(search_query(&args), connect_timeout, read_timeout)
        .context("Failed to build search client")?;
    let layout = KeyLayout::new(args.prefix.clone(), args.suffix.clone());
    let output_dir = args.output_dir.clone().unwrap_or_else(|| PathBuf::from("."));
    let batch = BatchFetcher::new(
        usize::from(args.concurrency),
        args.strategy,
        layout,
        output_dir.clone(),
    )?;

    if args.dry_run {
        let identifiers = source.fetch_identifiers().await;
        if identifiers.is_empty() {
            output::print_no_identifiers(&args.term);
            return Ok(exit_handler::exit_for_pipeline(
                &PipelineOutcome::NoIdentifiers,
                args.fail_on_empty,
            ));
        }
        output::print_dry_run(&batch.work_items(&identifiers));
        return Ok(ProcessExit::Success);
    }

    if !output_dir.exists() {
        fs::create_dir_all(&output_dir).with_context(|| {
            format!("Failed to create output directory: {}", output_dir.display())
        })?;
        info!(dir = %output_dir.display(), "Created output directory");
    }

    let fetcher = build_fetcher(&args, connect_timeout, read_timeout)?;
    info!(
        backend = fetcher.name(),
        concurrency = batch.concurrency(),
        strategy = %batch.strategy(),
        "Fetcher ready"
    );

    let pipeline = Pipeline::new(batch);
    let outcome = pipeline.run(&source, fetcher).await?;

    match &outcome {
        PipelineOutcome::NoIdentifiers => output::print_no_identifiers(&args.term),
        PipelineOutcome::Completed(report) if args.json => output::print_report_json(report)?,
        PipelineOutcome::Completed(report) => {
            output::print_completion_summary(report, &output_dir);
        }
    }

    Ok(exit_handler::exit_for_pipeline(&outcome, args.fail_on_empty))
}

fn search_query(args: &Args) -> SearchQuery {
    let field = args.field.trim();
    SearchQuery {
        base_url: args.search_url.clone(),
        database: args.database.clone(),
        term: args.term.clone(),
        field: (!field.is_empty()).then(|| field.to_string()),
        max_results: args.max_results,
        use_history: true,
    }
}

fn build_fetcher(
    args: &Args,
    connect_timeout: Duration,
    read_timeout: Duration,
) -> Result<Arc<dyn ObjectFetcher>> {
    let location = BucketLocation::new(args.bucket.clone(), &args.bucket_path);
    let fetcher: Arc<dyn ObjectFetcher> = match args.backend {
        FetchBackend::Http => {
            let endpoint = args
                .endpoint
                .clone()
                .unwrap_or_else(|| location.default_endpoint());
            Arc::new(
                HttpObjectFetcher::with_timeouts(location, endpoint, connect_timeout, read_timeout)
                    .context("Failed to build bucket HTTP client")?,
            )
        }
        FetchBackend::AwsCli => match args.aws_binary.as_ref() {
            Some(binary) => Arc::new(AwsCliFetcher::new(binary.clone(), location)),
            None => Arc::new(
                AwsCliFetcher::from_path(location)
                    .context("aws-cli backend selected but the aws binary is not available")?,
            ),
        },
    };
    Ok(fetcher)
}
