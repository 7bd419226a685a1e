//! Exit code logic for the downloader process.
//!
//! Single responsibility: map a pipeline outcome to the process exit outcome.

use pmc_downloader_core::PipelineOutcome;

use crate::ProcessExit;

/// Determines the process exit outcome from succeeded and failed download counts.
pub(crate) fn determine_exit_outcome(succeeded: usize, failed: usize) -> ProcessExit {
    if failed == 0 {
        ProcessExit::Success
    } else if succeeded > 0 {
        ProcessExit::Partial
    } else {
        ProcessExit::Failure
    }
}

/// Determines the exit outcome for a finished pipeline run.
///
/// An empty search is benign unless `fail_on_empty` is set.
pub(crate) fn exit_for_pipeline(outcome: &PipelineOutcome, fail_on_empty: bool) -> ProcessExit {
    match outcome {
        PipelineOutcome::NoIdentifiers if fail_on_empty => ProcessExit::Failure,
        PipelineOutcome::NoIdentifiers => ProcessExit::Success,
        PipelineOutcome::Completed(report) => {
            determine_exit_outcome(report.succeeded(), report.failed())
        }
    }
}
