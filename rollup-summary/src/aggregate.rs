// Copyright (c) The scenario-rollup Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Collecting result files from a directory tree into an [`ExecutionSummary`].

use crate::{
    errors::{CollectError, DisplayErrorChain},
    junit_xml,
    model::{ContextGuess, ExecutionSummary, SkippedFile},
};
use camino::{Utf8Path, Utf8PathBuf};
use std::{ffi::OsStr, path::Path};
use tracing::{debug, warn};
use walkdir::WalkDir;

/// The file name of the evidence report linked from the summary. Matched case-insensitively.
pub const EVIDENCE_FILE_NAME: &str = "karate-summary.html";

const RESULT_FILE_EXTENSION: &str = "xml";

/// Walks `root` and builds a summary out of every JUnit XML file beneath it.
///
/// Files are visited in file-name order, so the output is deterministic for a given tree. A file
/// that can't be read or parsed, a directory that can't be listed, and a result file whose path
/// isn't UTF-8 are all logged, recorded in [`ExecutionSummary::skipped_files`], and otherwise
/// ignored.
pub fn collect(root: &Utf8Path) -> Result<ExecutionSummary, CollectError> {
    if !root.exists() {
        return Err(CollectError::InputDirNotFound {
            path: root.to_owned(),
        });
    }
    if !root.is_dir() {
        return Err(CollectError::InputNotADirectory {
            path: root.to_owned(),
        });
    }

    let files = discover(root);
    if files.result_files.is_empty() {
        return Err(CollectError::NoResultFiles {
            path: root.to_owned(),
        });
    }

    let guess_from = files
        .evidence_file
        .as_deref()
        .or_else(|| files.result_files.first().map(Utf8PathBuf::as_path))
        .and_then(Utf8Path::parent);
    let context = guess_from
        .map(|dir| ContextGuess::from_path(root, dir))
        .unwrap_or_default();

    let mut suites = Vec::new();
    let mut skipped_files = files.unreadable;
    for path in files.result_files {
        match junit_xml::parse_file(&path) {
            Ok(file_suites) => {
                debug!("read {} suite(s) from {path}", file_suites.len());
                suites.extend(file_suites);
            }
            Err(error) => {
                let reason = DisplayErrorChain::new(&error).to_string();
                warn!("skipping result file {path}: {reason}");
                skipped_files.push(SkippedFile { path, reason });
            }
        }
    }

    Ok(ExecutionSummary::new(
        suites,
        files.evidence_file,
        context,
        skipped_files,
    ))
}

#[derive(Debug, Default)]
struct DiscoveredFiles {
    result_files: Vec<Utf8PathBuf>,
    evidence_file: Option<Utf8PathBuf>,
    unreadable: Vec<SkippedFile>,
}

impl DiscoveredFiles {
    fn skip(&mut self, path: Utf8PathBuf, reason: String) {
        warn!("skipping {path}: {reason}");
        self.unreadable.push(SkippedFile { path, reason });
    }
}

fn discover(root: &Utf8Path) -> DiscoveredFiles {
    let mut files = DiscoveredFiles::default();

    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(error) => {
                let path = error.path().map_or_else(|| root.to_owned(), lossy_path);
                files.skip(path, DisplayErrorChain::new(&error).to_string());
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }
        let path = match Utf8PathBuf::try_from(entry.into_path()) {
            Ok(path) => path,
            Err(error) => {
                let path = error.into_path_buf();
                if is_result_file(path.extension()) {
                    files.skip(lossy_path(&path), "path is not valid UTF-8".to_owned());
                }
                continue;
            }
        };

        let Some(file_name) = path.file_name() else {
            continue;
        };
        if file_name.eq_ignore_ascii_case(EVIDENCE_FILE_NAME) {
            if files.evidence_file.is_none() {
                files.evidence_file = Some(path);
            }
        } else if is_result_file(path.extension().map(OsStr::new)) {
            files.result_files.push(path);
        }
    }

    files
}

fn is_result_file(extension: Option<&OsStr>) -> bool {
    extension.is_some_and(|ext| ext.eq_ignore_ascii_case(RESULT_FILE_EXTENSION))
}

fn lossy_path(path: &Path) -> Utf8PathBuf {
    Utf8PathBuf::from(path.to_string_lossy().into_owned())
}
