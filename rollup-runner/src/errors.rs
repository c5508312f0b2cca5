// Copyright (c) The scenario-rollup Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Errors produced by the scenario runner.

use crate::scenario::ScenarioId;
use camino::Utf8PathBuf;
use thiserror::Error;

pub use rollup_summary::errors::DisplayErrorChain;

/// Error returned while parsing a [`Parallelism`](crate::config::Parallelism) value.
#[derive(Clone, Debug, Error)]
#[error("invalid parallelism `{input}`: {message}")]
pub struct ParallelismParseError {
    input: String,
    message: String,
}

impl ParallelismParseError {
    pub(crate) fn new(input: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            input: input.into(),
            message: message.into(),
        }
    }
}

/// An error that occurred while opening the side log.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SideLogOpenError {
    /// The parent directory could not be created.
    #[error("error creating side log directory {dir}")]
    CreateDir {
        /// The directory.
        dir: Utf8PathBuf,

        /// The underlying error.
        #[source]
        error: std::io::Error,
    },

    /// The side log file could not be opened or written to.
    #[error("error opening side log {path}")]
    Open {
        /// The side log path.
        path: Utf8PathBuf,

        /// The underlying error.
        #[source]
        error: std::io::Error,
    },
}

/// An error reported by a scenario engine.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum EngineError {
    /// The engine process could not be started.
    #[error("failed to run engine `{program}`")]
    Spawn {
        /// The program being run.
        program: String,

        /// The underlying error.
        #[source]
        error: std::io::Error,
    },

    /// Listing scenarios failed.
    #[error("engine `{program}` failed to list scenarios: {message}")]
    ListFailed {
        /// The program being run.
        program: String,

        /// What went wrong, usually the last line of the engine's stderr.
        message: String,
    },

    /// The engine's scenario listing could not be parsed.
    #[error("engine `{program}` produced an invalid scenario listing")]
    ListParse {
        /// The program being run.
        program: String,

        /// The underlying error.
        #[source]
        error: serde_json::Error,
    },

    /// A custom engine error.
    #[error("{0}")]
    Other(String),
}

/// An error that occurred while parsing an engine command line.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum EngineCommandParseError {
    /// The command line was empty.
    #[error("engine command is empty")]
    Empty,

    /// The command line could not be split into words.
    #[error("error splitting engine command `{input}`")]
    Split {
        /// The command line.
        input: String,

        /// The underlying error.
        #[source]
        error: shell_words::ParseError,
    },
}

/// An error that occurred while building an [`Orchestrator`](crate::runner::Orchestrator).
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum OrchestratorBuildError {
    /// The tokio runtime could not be created.
    #[error("error creating tokio runtime")]
    TokioRuntimeCreate(#[source] std::io::Error),
}

/// An error that aborted a run before any scenario was executed.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum RunError {
    /// The engine could not discover scenarios.
    #[error("error discovering scenarios")]
    Discover(#[source] EngineError),

    /// The engine reported the same scenario ID more than once.
    #[error("engine reported scenario ID `{id}` more than once")]
    DuplicateScenarioId {
        /// The duplicated ID.
        id: ScenarioId,
    },
}

/// An error that occurred while writing the JUnit report for a run.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum WriteJunitError {
    /// An error occurred while operating on the file system.
    #[error("error operating on path {file}")]
    Fs {
        /// The file being operated on.
        file: Utf8PathBuf,

        /// The underlying IO error.
        #[source]
        error: std::io::Error,
    },

    /// An error occurred while producing JUnit XML.
    #[error("error writing JUnit output to {file}")]
    Junit {
        /// The output file.
        file: Utf8PathBuf,

        /// The underlying error.
        #[source]
        error: Box<dyn std::error::Error + Send + Sync>,
    },
}
