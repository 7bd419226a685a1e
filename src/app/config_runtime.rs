//! Merging of CLI flags with config file defaults.
//!
//! A value typed on the command line always wins. Otherwise the config file
//! value applies, and otherwise the clap default stays in place.

use std::collections::HashSet;

use anyhow::Result;
use clap::parser::ValueSource;
use clap::{ArgMatches, CommandFactory, FromArgMatches};

use crate::app::config_file::{FileConfig, VerbositySetting};
use crate::cli::Args;

/// Argument ids whose value came from the command line.
#[derive(Debug, Clone, Default)]
pub(crate) struct CliValueSources {
    explicit: HashSet<String>,
}

impl CliValueSources {
    /// Returns `true` when `id` was given on the command line.
    pub(crate) fn is_set(&self, id: &str) -> bool {
        self.explicit.contains(id)
    }

    fn from_matches(matches: &ArgMatches) -> Self {
        let explicit = Args::command()
            .get_arguments()
            .map(|arg| arg.get_id().as_str().to_string())
            .filter(|id| matches.value_source(id) == Some(ValueSource::CommandLine))
            .collect();
        Self { explicit }
    }
}

pub(crate) fn parse_cli_with_sources() -> (Args, CliValueSources) {
    let matches = Args::command().get_matches();
    let args = Args::from_arg_matches(&matches).unwrap_or_else(|err| err.exit());
    let sources = CliValueSources::from_matches(&matches);
    (args, sources)
}

#[cfg(test)]
pub(crate) fn parse_cli_from<I, T>(argv: I) -> Result<(Args, CliValueSources)>
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    let matches = Args::command().try_get_matches_from(argv)?;
    let args = Args::from_arg_matches(&matches)?;
    let sources = CliValueSources::from_matches(&matches);
    Ok((args, sources))
}

pub(crate) fn apply_config_defaults(
    mut args: Args,
    sources: &CliValueSources,
    file_config: Option<&FileConfig>,
) -> Result<Args> {
    let Some(file_config) = file_config else {
        return Ok(args);
    };

    fn take<T: Clone>(sources: &CliValueSources, id: &str, value: &Option<T>, slot: &mut T) {
        if !sources.is_set(id)
            && let Some(value) = value
        {
            *slot = value.clone();
        }
    }

    take(sources, "search_url", &file_config.search_url, &mut args.search_url);
    take(sources, "database", &file_config.database, &mut args.database);
    take(sources, "term", &file_config.term, &mut args.term);
    take(sources, "field", &file_config.field, &mut args.field);
    take(sources, "bucket", &file_config.bucket, &mut args.bucket);
    take(sources, "bucket_path", &file_config.bucket_path, &mut args.bucket_path);
    take(sources, "prefix", &file_config.key_prefix, &mut args.prefix);
    take(sources, "suffix", &file_config.key_suffix, &mut args.suffix);
    take(sources, "backend", &file_config.backend, &mut args.backend);
    take(sources, "concurrency", &file_config.concurrency, &mut args.concurrency);
    take(sources, "strategy", &file_config.strategy, &mut args.strategy);
    take(
        sources,
        "connect_timeout",
        &file_config.connect_timeout_secs,
        &mut args.connect_timeout,
    );
    take(
        sources,
        "read_timeout",
        &file_config.read_timeout_secs,
        &mut args.read_timeout,
    );

    if args.max_results.is_none() {
        args.max_results = file_config.max_results;
    }
    if args.endpoint.is_none() {
        args.endpoint.clone_from(&file_config.endpoint);
    }
    if args.aws_binary.is_none() {
        args.aws_binary.clone_from(&file_config.aws_binary);
    }
    if args.output_dir.is_none() {
        args.output_dir.clone_from(&file_config.output_dir);
    }

    if !sources.is_set("fail_on_empty")
        && let Some(fail_on_empty) = file_config.fail_on_empty
    {
        args.fail_on_empty = fail_on_empty;
    }

    if !sources.is_set("verbose")
        && !sources.is_set("quiet")
        && let Some(verbosity) = file_config.verbosity
    {
        apply_config_verbosity(&mut args, verbosity);
    }

    Ok(args)
}

fn apply_config_verbosity(args: &mut Args, verbosity: VerbositySetting) {
    match verbosity {
        VerbositySetting::Default => {
            args.quiet = false;
            args.verbose = 0;
        }
        VerbositySetting::Quiet => {
            args.quiet = true;
            args.verbose = 0;
        }
        VerbositySetting::Verbose => {
            args.quiet = false;
            args.verbose = 1;
        }
        VerbositySetting::Debug => {
            args.quiet = false;
            args.verbose = 2;
        }
    }
}

/// Determines the default log level from verbosity flags.
pub(crate) fn resolve_default_log_level(args: &Args) -> &'static str {
    if args.quiet {
        "error"
    } else {
        match args.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    }
}

/// A verbosity flag on the command line overrides `RUST_LOG`.
pub(crate) fn should_force_cli_log_level(sources: &CliValueSources) -> bool {
    sources.is_set("verbose") || sources.is_set("quiet")
}
