// Copyright (c) The scenario-rollup Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Errors produced while collecting and rendering summaries.

use camino::Utf8PathBuf;
use std::{error, fmt};
use thiserror::Error;

/// Displays an error along with its chain of sources on a single line, separated by `: `.
#[derive(Clone, Copy, Debug)]
pub struct DisplayErrorChain<E>(E);

impl<E: error::Error> DisplayErrorChain<E> {
    /// Creates a new `DisplayErrorChain`.
    pub fn new(error: E) -> Self {
        Self(error)
    }
}

impl<E: error::Error> fmt::Display for DisplayErrorChain<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)?;
        let mut source = self.0.source();
        while let Some(error) = source {
            write!(f, ": {error}")?;
            source = error.source();
        }
        Ok(())
    }
}

/// A fatal error that occurred while collecting a summary.
///
/// Problems with individual result files are not fatal: those files are recorded in
/// [`ExecutionSummary::skipped_files`](crate::model::ExecutionSummary::skipped_files) instead.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CollectError {
    /// The input directory does not exist.
    #[error("input directory not found: {path}")]
    InputDirNotFound {
        /// The path that was looked up.
        path: Utf8PathBuf,
    },

    /// The input path exists but is not a directory.
    #[error("input path is not a directory: {path}")]
    InputNotADirectory {
        /// The path that was looked up.
        path: Utf8PathBuf,
    },

    /// No result files were found under the input directory.
    #[error("no JUnit XML files found under {path}")]
    NoResultFiles {
        /// The input directory.
        path: Utf8PathBuf,
    },
}

/// An error that occurred while reading or parsing a single result file.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ResultFileError {
    /// The file could not be read.
    #[error("failed to read file")]
    Read(#[source] std::io::Error),

    /// The file is not well-formed XML.
    #[error("malformed XML at byte {position}")]
    Xml {
        /// The byte offset at which the error was detected.
        position: usize,

        /// The underlying error.
        #[source]
        error: quick_xml::Error,
    },

    /// The file has a document type declaration, which is never accepted.
    #[error("document type declarations are not allowed")]
    DocTypeNotAllowed,

    /// The file ended with elements still open.
    #[error("unexpected end of file: {open} element(s) not closed")]
    Truncated {
        /// The number of elements left open.
        open: usize,
    },

    /// The file has no root element.
    #[error("no root element")]
    Empty,

    /// The file has more than one root element.
    #[error("more than one root element")]
    MultipleRoots,
}

/// An error that occurred while writing the rendered report.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum WriteReportError {
    /// The parent directory of the output file could not be created.
    #[error("error creating output directory {dir}")]
    CreateDir {
        /// The directory being created.
        dir: Utf8PathBuf,

        /// The underlying error.
        #[source]
        error: std::io::Error,
    },

    /// The output file could not be written.
    #[error("error writing report to {file}")]
    Write {
        /// The output file.
        file: Utf8PathBuf,

        /// The underlying error.
        #[source]
        error: std::io::Error,
    },
}
