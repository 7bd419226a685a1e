//! Config file loading for CLI defaults.
//!
//! The file is a flat `key = value` subset of TOML: strings are
//! double-quoted, integers and booleans are bare, `#` starts a comment.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use pmc_downloader_core::ConcurrencyStrategy;

use crate::cli::FetchBackend;

/// Directory name under the config home.
const CONFIG_DIR_NAME: &str = "pmc-downloader";

/// TOML-backed file configuration for run defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileConfig {
    /// esearch endpoint URL.
    pub search_url: Option<String>,
    /// Entrez database.
    pub database: Option<String>,
    /// Search term.
    pub term: Option<String>,
    /// Field restriction (empty string disables it).
    pub field: Option<String>,
    /// `retmax` for the search request.
    pub max_results: Option<u32>,
    /// Bucket name.
    pub bucket: Option<String>,
    /// Path inside the bucket.
    pub bucket_path: Option<String>,
    /// Key prefix.
    pub key_prefix: Option<String>,
    /// Key suffix.
    pub key_suffix: Option<String>,
    /// HTTP endpoint for the http backend.
    pub endpoint: Option<String>,
    /// Fetch backend.
    pub backend: Option<FetchBackend>,
    /// aws binary path for the aws-cli backend.
    pub aws_binary: Option<PathBuf>,
    /// Default concurrency (same range as CLI).
    pub concurrency: Option<u8>,
    /// Scheduling strategy.
    pub strategy: Option<ConcurrencyStrategy>,
    /// Default output directory.
    pub output_dir: Option<PathBuf>,
    /// Treat an empty search as fatal.
    pub fail_on_empty: Option<bool>,
    /// Default verbosity mode.
    pub verbosity: Option<VerbositySetting>,
    /// HTTP connect timeout in seconds.
    pub connect_timeout_secs: Option<u64>,
    /// HTTP read timeout in seconds.
    pub read_timeout_secs: Option<u64>,
}

impl FileConfig {
    /// Validates config values against runtime and CLI constraints.
    pub fn validate(&self) -> Result<()> {
        if let Some(concurrency) = self.concurrency
            && !(1..=100).contains(&concurrency)
        {
            bail!("Invalid config value for `concurrency`: {concurrency}. Expected range: 1..=100");
        }

        if let Some(max_results) = self.max_results
            && !(1..=10_000).contains(&max_results)
        {
            bail!(
                "Invalid config value for `max_results`: {max_results}. Expected range: 1..=10000"
            );
        }

        validate_timeout_secs("connect_timeout_secs", self.connect_timeout_secs)?;
        validate_timeout_secs("read_timeout_secs", self.read_timeout_secs)?;

        Ok(())
    }
}

fn validate_timeout_secs(field: &str, value: Option<u64>) -> Result<()> {
    let Some(value) = value else {
        return Ok(());
    };
    if !(1..=3600).contains(&value) {
        bail!("Invalid config value for `{field}`: {value}. Expected range: 1..=3600");
    }
    Ok(())
}

/// Supported config verbosity labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerbositySetting {
    Default,
    Verbose,
    Quiet,
    Debug,
}

/// Loaded config metadata.
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    /// Resolved config path if a base directory is known.
    pub path: Option<PathBuf>,
    /// Parsed file config when a config file exists and was valid.
    pub config: Option<FileConfig>,
}

/// Resolves default config path.
///
/// Priority:
/// 1. `$XDG_CONFIG_HOME/pmc-downloader/config.toml`
/// 2. `$HOME/.config/pmc-downloader/config.toml`
#[must_use]
pub fn resolve_default_config_path() -> Option<PathBuf> {
    if let Some(xdg_config_home) = env_var_non_empty_os("XDG_CONFIG_HOME") {
        return Some(
            PathBuf::from(xdg_config_home)
                .join(CONFIG_DIR_NAME)
                .join("config.toml"),
        );
    }

    let home = env_var_non_empty_os("HOME")?;
    Some(
        PathBuf::from(home)
            .join(".config")
            .join(CONFIG_DIR_NAME)
            .join("config.toml"),
    )
}

fn env_var_non_empty_os(name: &str) -> Option<std::ffi::OsString> {
    let value = env::var_os(name)?;
    if value.is_empty() { None } else { Some(value) }
}

/// Loads config from an explicit path (which must exist) or the default path (if present).
pub fn load_file_config(explicit: Option<&Path>) -> Result<LoadedConfig> {
    if let Some(path) = explicit {
        let config = read_file_config(path)?;
        return Ok(LoadedConfig {
            path: Some(path.to_path_buf()),
            config: Some(config),
        });
    }

    let path = resolve_default_config_path();
    let config = match path.as_deref() {
        Some(path_ref) if path_ref.exists() => Some(read_file_config(path_ref)?),
        _ => None,
    };
    Ok(LoadedConfig { path, config })
}

fn read_file_config(path: &Path) -> Result<FileConfig> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file '{}'", path.display()))?;
    parse_config_str(&raw)
        .with_context(|| format!("Failed to parse config file '{}'", path.display()))
}

fn parse_config_str(raw: &str) -> Result<FileConfig> {
    let mut cfg = FileConfig::default();
    for (line_index, raw_line) in raw.lines().enumerate() {
        let line = strip_inline_comment(raw_line).trim();
        if line.is_empty() {
            continue;
        }

        let Some((raw_key, raw_value)) = line.split_once('=') else {
            bail!(
                "Invalid config syntax on line {}: expected key = value",
                line_index + 1
            );
        };

        let key = raw_key.trim();
        let value = raw_value.trim();
        let invalid = || format!("Invalid `{key}` value on line {}", line_index + 1);

        match key {
            "search_url" => cfg.search_url = Some(parse_string_literal(value).with_context(invalid)?),
            "database" => cfg.database = Some(parse_string_literal(value).with_context(invalid)?),
            "term" => cfg.term = Some(parse_string_literal(value).with_context(invalid)?),
            "field" => cfg.field = Some(parse_string_literal(value).with_context(invalid)?),
            "max_results" => {
                let parsed = parse_integer_u64(value).with_context(invalid)?;
                cfg.max_results = Some(
                    u32::try_from(parsed)
                        .map_err(|_| anyhow::anyhow!("max_results out of range for u32"))
                        .with_context(invalid)?,
                );
            }
            "bucket" => cfg.bucket = Some(parse_string_literal(value).with_context(invalid)?),
            "bucket_path" => {
                cfg.bucket_path = Some(parse_string_literal(value).with_context(invalid)?);
            }
            "key_prefix" => {
                cfg.key_prefix = Some(parse_string_literal(value).with_context(invalid)?);
            }
            "key_suffix" => {
                cfg.key_suffix = Some(parse_string_literal(value).with_context(invalid)?);
            }
            "endpoint" => cfg.endpoint = Some(parse_string_literal(value).with_context(invalid)?),
            "backend" => {
                let parsed = parse_string_literal(value).with_context(invalid)?;
                let Some(backend) = FetchBackend::from_label(&parsed) else {
                    bail!(
                        "Invalid `backend` value '{parsed}' on line {}: expected one of: http, aws-cli",
                        line_index + 1
                    );
                };
                cfg.backend = Some(backend);
            }
            "aws_binary" => {
                let parsed = parse_string_literal(value).with_context(invalid)?;
                cfg.aws_binary = Some(PathBuf::from(parsed));
            }
            "concurrency" => cfg.concurrency = Some(parse_integer_u8(value).with_context(invalid)?),
            "strategy" => {
                let parsed = parse_string_literal(value).with_context(invalid)?;
                let strategy = parsed
                    .parse::<ConcurrencyStrategy>()
                    .map_err(anyhow::Error::msg)
                    .with_context(invalid)?;
                cfg.strategy = Some(strategy);
            }
            "output_dir" => {
                let parsed = parse_string_literal(value).with_context(invalid)?;
                cfg.output_dir = Some(PathBuf::from(parsed));
            }
            "fail_on_empty" => cfg.fail_on_empty = Some(parse_boolean(value).with_context(invalid)?),
            "verbosity" => {
                let parsed = parse_string_literal(value).with_context(invalid)?;
                cfg.verbosity = Some(parse_verbosity(&parsed).with_context(invalid)?);
            }
            "connect_timeout_secs" => {
                cfg.connect_timeout_secs = Some(parse_integer_u64(value).with_context(invalid)?);
            }
            "read_timeout_secs" => {
                cfg.read_timeout_secs = Some(parse_integer_u64(value).with_context(invalid)?);
            }
            unknown => {
                bail!(
                    "Unknown configuration key: '{}' on line {}",
                    unknown,
                    line_index + 1
                );
            }
        }
    }
    cfg.validate()?;
    Ok(cfg)
}

fn strip_inline_comment(line: &str) -> &str {
    let mut in_string = false;
    for (index, ch) in line.char_indices() {
        match ch {
            '"' => in_string = !in_string,
            '#' if !in_string => return &line[..index],
            _ => {}
        }
    }
    line
}

fn parse_string_literal(raw_value: &str) -> Result<String> {
    if raw_value.len() < 2 || !raw_value.starts_with('"') || !raw_value.ends_with('"') {
        bail!("Expected double-quoted string");
    }
    Ok(raw_value[1..raw_value.len() - 1].to_string())
}

fn parse_integer_u8(raw_value: &str) -> Result<u8> {
    let token = raw_value.trim();
    if token.is_empty() {
        bail!("Expected integer value");
    }
    let value = token.parse::<u16>()?;
    u8::try_from(value).map_err(|_| anyhow::anyhow!("Integer value out of range for u8"))
}

fn parse_integer_u64(raw_value: &str) -> Result<u64> {
    let token = raw_value.trim();
    if token.is_empty() {
        bail!("Expected integer value");
    }
    let value = token.parse::<i128>()?;
    if value < 0 {
        bail!("Expected non-negative integer");
    }
    u64::try_from(value).map_err(|_| anyhow::anyhow!("Integer value out of range for u64"))
}

fn parse_verbosity(value: &str) -> Result<VerbositySetting> {
    match value {
        "default" => Ok(VerbositySetting::Default),
        "verbose" => Ok(VerbositySetting::Verbose),
        "quiet" => Ok(VerbositySetting::Quiet),
        "debug" => Ok(VerbositySetting::Debug),
        _ => bail!("Expected one of: default, verbose, quiet, debug"),
    }
}

fn parse_boolean(raw_value: &str) -> Result<bool> {
    match raw_value.trim() {
        "true" => Ok(true),
        "false" => Ok(false),
        _ => bail!("Expected 'true' or 'false'"),
    }
}
