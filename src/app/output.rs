//! CLI output formatting: completion summary, JSON report, dry-run listing.

use std::path::Path;

use anyhow::Result;
use pmc_downloader_core::{BatchReport, FetchOutcome, WorkItem};

/// Renders the human-readable completion summary.
pub(crate) fn render_completion_summary(report: &BatchReport, output_dir: &Path) -> Vec<String> {
    let mut lines = vec![format!(
        "Downloaded {} of {} articles to {} ({} failed)",
        report.succeeded(),
        report.total(),
        output_dir.display(),
        report.failed()
    )];

    if report.failed() > 0 {
        lines.push("Failure summary:".to_string());
        for item in &report.items {
            if let FetchOutcome::Failure { error } = &item.outcome {
                lines.push(format!("  {} ({}): {error}", item.identifier, item.key));
            }
        }
    }
    lines
}

pub(crate) fn print_completion_summary(report: &BatchReport, output_dir: &Path) {
    for line in render_completion_summary(report, output_dir) {
        println!("{line}");
    }
}

pub(crate) fn print_report_json(report: &BatchReport) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(report)?);
    Ok(())
}

pub(crate) fn print_dry_run(items: &[WorkItem]) {
    println!("Dry run: {} articles would be downloaded", items.len());
    for item in items {
        println!("  {} -> {}", item.identifier, item.destination.display());
    }
}

pub(crate) fn print_no_identifiers(term: &str) {
    println!("No articles found for '{term}'; nothing to download.");
}
