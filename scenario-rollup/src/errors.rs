// Copyright (c) The scenario-rollup Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::output::{NO_HEADING_TARGET, StderrStyles};
use camino::Utf8PathBuf;
use owo_colors::OwoColorize;
use rollup_metadata::RollupExitCode;
use rollup_runner::errors::{
    EngineCommandParseError, OrchestratorBuildError, RunError, SideLogOpenError, WriteJunitError,
};
use rollup_summary::errors::{CollectError, WriteReportError};
use std::error::Error;
use thiserror::Error;
use tracing::error;

// The #[error()] strings are placeholders: errors are meant to be printed with
// display_to_stderr, which colorizes them and walks the source chain.

/// An error that `scenario-rollup` reports and exits with.
#[derive(Debug, Error)]
#[doc(hidden)]
pub enum ExpectedError {
    #[error("engine command parse error")]
    EngineCommandParse {
        #[source]
        err: EngineCommandParseError,
    },
    #[error("side log open error")]
    SideLogOpen {
        #[source]
        err: SideLogOpenError,
    },
    #[error("orchestrator build error")]
    OrchestratorBuild {
        #[source]
        err: OrchestratorBuildError,
    },
    #[error("scenario discovery error")]
    Discover {
        #[source]
        err: RunError,
    },
    #[error("no scenarios to run")]
    NoScenarios { tags: String },
    #[error("scenarios failed")]
    ScenariosFailed {
        failed: usize,
        report_dir: Utf8PathBuf,
    },
    #[error("JUnit write error")]
    WriteJunit {
        #[source]
        err: WriteJunitError,
    },
    #[error("result collection error")]
    Collect {
        #[source]
        err: CollectError,
    },
    #[error("report write error")]
    WriteReport {
        #[source]
        err: WriteReportError,
    },
    #[error("error writing to stdout")]
    WriteOutput {
        #[source]
        err: std::io::Error,
    },
}

impl ExpectedError {
    /// Returns the exit code for the process.
    pub fn process_exit_code(&self) -> i32 {
        match self {
            Self::EngineCommandParse { .. } | Self::OrchestratorBuild { .. } => {
                RollupExitCode::SETUP_ERROR
            }
            Self::SideLogOpen { .. } => RollupExitCode::SIDE_LOG_OPEN_FAILED,
            Self::Discover { .. } => RollupExitCode::SCENARIO_LIST_FAILED,
            Self::NoScenarios { .. } => RollupExitCode::NO_SCENARIOS_RUN,
            Self::ScenariosFailed { .. } => RollupExitCode::SCENARIO_RUN_FAILED,
            Self::Collect { err } => match err {
                CollectError::InputDirNotFound { .. } | CollectError::InputNotADirectory { .. } => {
                    RollupExitCode::INPUT_DIR_NOT_FOUND
                }
                CollectError::NoResultFiles { .. } => RollupExitCode::NO_RESULT_FILES,
                _ => RollupExitCode::SETUP_ERROR,
            },
            Self::WriteJunit { .. } | Self::WriteReport { .. } | Self::WriteOutput { .. } => {
                RollupExitCode::WRITE_OUTPUT_ERROR
            }
        }
    }

    /// Displays this error to stderr.
    pub fn display_to_stderr(&self, styles: &StderrStyles) {
        let mut next_error = match self {
            Self::EngineCommandParse { err } => {
                error!("invalid engine command");
                Some(err as &dyn Error)
            }
            Self::SideLogOpen { err } => {
                error!("could not open the side log for engine output");
                Some(err as &dyn Error)
            }
            Self::OrchestratorBuild { err } => {
                error!("failed to set up the orchestrator");
                Some(err as &dyn Error)
            }
            Self::Discover { err } => {
                error!("failed to discover scenarios");
                Some(err as &dyn Error)
            }
            Self::NoScenarios { tags } => {
                error!("no scenarios matched tags {}", tags.style(styles.bold));
                None
            }
            Self::ScenariosFailed { failed, report_dir } => {
                let scenarios = if *failed == 1 { "scenario" } else { "scenarios" };
                error!(
                    "{} {scenarios} still failing after retries, see {}",
                    failed.style(styles.bold),
                    report_dir.style(styles.bold),
                );
                None
            }
            Self::WriteJunit { err } => {
                error!("failed to write the JUnit report");
                Some(err as &dyn Error)
            }
            Self::Collect { err } => {
                error!("{err}");
                err.source()
            }
            Self::WriteReport { err } => {
                error!("failed to write the executive summary");
                Some(err as &dyn Error)
            }
            Self::WriteOutput { err } => {
                error!("failed to write output");
                Some(err as &dyn Error)
            }
        };

        while let Some(err) = next_error {
            error!(target: NO_HEADING_TARGET, "\nCaused by:\n  {}", err);
            next_error = err.source();
        }
    }
}
