//! CLI entry point for the PMC downloader.

use std::process::ExitCode;

mod app;
mod cli;

/// Final process outcome, mapped to the exit code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ProcessExit {
    /// Every download succeeded, or there was nothing to download.
    Success,
    /// Some downloads succeeded and some failed.
    Partial,
    /// Every download failed, or the run could not proceed.
    Failure,
}

impl ProcessExit {
    pub(crate) fn code(self) -> u8 {
        match self {
            Self::Success => 0,
            Self::Partial => 1,
            Self::Failure => 2,
        }
    }
}

impl From<ProcessExit> for ExitCode {
    fn from(exit: ProcessExit) -> Self {
        ExitCode::from(exit.code())
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    match app::runtime::run_downloader().await {
        Ok(exit) => exit.into(),
        Err(err) => {
            eprintln!("Error: {err:#}");
            ProcessExit::Failure.into()
        }
    }
}
