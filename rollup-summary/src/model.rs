// Copyright (c) The scenario-rollup Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The canonical summary model.
//!
//! Everything here is built bottom-up and never mutated afterwards: [`TestCaseResult::new`] feeds
//! [`SuiteReport::new`], which feeds [`ExecutionSummary::new`]. Derived values (passed counts,
//! orderings, the failure list) are computed once, at construction time.

use crate::{
    rollup::RollupStatus,
    text::{
        LONG_DETAILS_MAX_CHARS, SHORT_MESSAGE_MAX_CHARS, one_line_truncated,
        truncate_with_ellipsis,
    },
};
use camino::{Utf8Component, Utf8Path, Utf8PathBuf};
use std::{fmt, time::Duration};

/// The maximum number of entries returned by [`ExecutionSummary::top_failures`].
pub const TOP_FAILURES_LIMIT: usize = 20;

/// The label used for context fields that couldn't be inferred.
pub const UNKNOWN_CONTEXT: &str = "unknown";

/// The status of a single test case.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum CaseStatus {
    /// The test case passed, or carried no status marker.
    Pass,

    /// The test case had a `<failure>` or `<error>` marker.
    Fail,

    /// The test case had a `<skipped>` marker.
    Skip,
}

impl CaseStatus {
    /// Returns the label used for filtering and display.
    pub fn label(self) -> &'static str {
        match self {
            Self::Pass => "PASS",
            Self::Fail => "FAIL",
            Self::Skip => "SKIP",
        }
    }

    /// Returns the CSS class used to color this status.
    pub fn css_class(self) -> &'static str {
        match self {
            Self::Pass => "ok",
            Self::Fail => "bad",
            Self::Skip => "warn",
        }
    }
}

impl fmt::Display for CaseStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Converts a seconds value read from a result file into a duration.
///
/// Negative, infinite and NaN values become zero.
pub fn duration_from_secs(secs: f64) -> Duration {
    Duration::try_from_secs_f64(secs).unwrap_or_default()
}

/// One `<testcase>` element.
#[derive(Clone, Debug, PartialEq)]
pub struct TestCaseResult {
    name: String,
    classname: String,
    elapsed: Duration,
    status: CaseStatus,
    short_message: String,
    long_details: String,
    source_file: Utf8PathBuf,
}

impl TestCaseResult {
    /// Creates a new test case result.
    ///
    /// `message` is collapsed onto one line and bounded; `details` is trimmed and bounded.
    pub fn new(
        name: impl Into<String>,
        classname: impl Into<String>,
        elapsed: Duration,
        status: CaseStatus,
        message: &str,
        details: &str,
        source_file: impl Into<Utf8PathBuf>,
    ) -> Self {
        Self {
            name: name.into(),
            classname: classname.into(),
            elapsed,
            status,
            short_message: one_line_truncated(message, SHORT_MESSAGE_MAX_CHARS),
            long_details: truncate_with_ellipsis(details, LONG_DETAILS_MAX_CHARS),
            source_file: source_file.into(),
        }
    }

    /// The test case name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The test case class name, typically the feature the scenario belongs to.
    pub fn classname(&self) -> &str {
        &self.classname
    }

    /// Time taken by the test case.
    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    /// The status of the test case.
    pub fn status(&self) -> CaseStatus {
        self.status
    }

    /// A one-line, bounded reason. Empty if none was recorded.
    pub fn short_message(&self) -> &str {
        &self.short_message
    }

    /// Longer failure text, bounded. Empty if none was recorded.
    pub fn long_details(&self) -> &str {
        &self.long_details
    }

    /// The result file this test case was read from.
    pub fn source_file(&self) -> &Utf8Path {
        &self.source_file
    }
}

/// One `<testsuite>` element.
#[derive(Clone, Debug, PartialEq)]
pub struct SuiteReport {
    display_name: String,
    total: usize,
    failed: usize,
    skipped: usize,
    passed: usize,
    elapsed: Duration,
    cases: Vec<TestCaseResult>,
}

impl SuiteReport {
    /// Creates a new suite report. `passed` is derived as `max(0, total - failed - skipped)`.
    pub fn new(
        display_name: impl Into<String>,
        total: usize,
        failed: usize,
        skipped: usize,
        elapsed: Duration,
        cases: Vec<TestCaseResult>,
    ) -> Self {
        Self {
            display_name: display_name.into(),
            total,
            failed,
            skipped,
            passed: total.saturating_sub(failed).saturating_sub(skipped),
            elapsed,
            cases,
        }
    }

    /// The suite's display name.
    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    /// The total number of tests, as recorded in the file or counted from its cases.
    pub fn total(&self) -> usize {
        self.total
    }

    /// Failures plus errors.
    pub fn failed(&self) -> usize {
        self.failed
    }

    /// The number of skipped tests.
    pub fn skipped(&self) -> usize {
        self.skipped
    }

    /// The number of passed tests. Never negative.
    pub fn passed(&self) -> usize {
        self.passed
    }

    /// Time taken by the suite.
    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    /// The suite's test cases, in document order.
    pub fn cases(&self) -> &[TestCaseResult] {
        &self.cases
    }

    /// The rollup status of this suite.
    pub fn status(&self) -> RollupStatus {
        RollupStatus::rollup(self.total, self.failed, self.skipped)
    }
}

/// Suite, environment and service labels inferred from the result directory layout.
///
/// Result trees are conventionally laid out as `<root>/<suite>/<env>/<service>/...`.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ContextGuess {
    /// The suite label.
    pub suite: String,

    /// The environment label.
    pub env: String,

    /// The service label.
    pub service: String,
}

impl ContextGuess {
    /// Infers the context from the first three segments of `dir` relative to `root`.
    ///
    /// Returns [`ContextGuess::default`] if `dir` isn't under `root`, or is fewer than three
    /// segments deep.
    pub fn from_path(root: &Utf8Path, dir: &Utf8Path) -> Self {
        let Ok(rel) = dir.strip_prefix(root) else {
            return Self::default();
        };
        let mut segments = rel.components().filter_map(|component| match component {
            Utf8Component::Normal(segment) => Some(segment),
            _ => None,
        });
        match (segments.next(), segments.next(), segments.next()) {
            (Some(suite), Some(env), Some(service)) => Self {
                suite: suite.to_owned(),
                env: env.to_owned(),
                service: service.to_owned(),
            },
            _ => Self::default(),
        }
    }
}

impl Default for ContextGuess {
    fn default() -> Self {
        Self {
            suite: UNKNOWN_CONTEXT.to_owned(),
            env: UNKNOWN_CONTEXT.to_owned(),
            service: UNKNOWN_CONTEXT.to_owned(),
        }
    }
}

/// A result file that was found but could not be read or parsed.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SkippedFile {
    /// The path to the file.
    pub path: Utf8PathBuf,

    /// Why the file was skipped.
    pub reason: String,
}

/// The whole-run summary.
#[derive(Clone, Debug, PartialEq)]
pub struct ExecutionSummary {
    total: usize,
    passed: usize,
    failed: usize,
    skipped: usize,
    elapsed: Duration,
    suites: Vec<SuiteReport>,
    failures: Vec<TestCaseResult>,
    context: ContextGuess,
    evidence_file: Option<Utf8PathBuf>,
    skipped_files: Vec<SkippedFile>,
}

impl ExecutionSummary {
    /// Builds a summary from a list of suites.
    ///
    /// Suites are ordered by failed count (descending), then display name. Failures are every
    /// failing case across all suites, ordered by elapsed time (descending), then name.
    pub fn new(
        mut suites: Vec<SuiteReport>,
        evidence_file: Option<Utf8PathBuf>,
        context: ContextGuess,
        skipped_files: Vec<SkippedFile>,
    ) -> Self {
        suites.sort_by(|a, b| {
            b.failed
                .cmp(&a.failed)
                .then_with(|| a.display_name.cmp(&b.display_name))
        });

        let mut failures: Vec<_> = suites
            .iter()
            .flat_map(|suite| suite.cases.iter())
            .filter(|case| case.status == CaseStatus::Fail)
            .cloned()
            .collect();
        failures.sort_by(|a, b| b.elapsed.cmp(&a.elapsed).then_with(|| a.name.cmp(&b.name)));

        // Counts and times come straight from result files, so totals saturate.
        let count = |field: fn(&SuiteReport) -> usize| {
            suites
                .iter()
                .map(field)
                .fold(0, usize::saturating_add)
        };
        let elapsed = suites
            .iter()
            .map(|s| s.elapsed)
            .fold(Duration::ZERO, Duration::saturating_add);

        Self {
            total: count(|s| s.total),
            passed: count(|s| s.passed),
            failed: count(|s| s.failed),
            skipped: count(|s| s.skipped),
            elapsed,
            suites,
            failures,
            context,
            evidence_file,
            skipped_files,
        }
    }

    /// Total tests across all suites.
    pub fn total(&self) -> usize {
        self.total
    }

    /// Passed tests across all suites.
    pub fn passed(&self) -> usize {
        self.passed
    }

    /// Failed tests across all suites.
    pub fn failed(&self) -> usize {
        self.failed
    }

    /// Skipped tests across all suites.
    pub fn skipped(&self) -> usize {
        self.skipped
    }

    /// Summed suite durations.
    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    /// Suites, in display order.
    pub fn suites(&self) -> &[SuiteReport] {
        &self.suites
    }

    /// Every failing test case, slowest first.
    pub fn failures(&self) -> &[TestCaseResult] {
        &self.failures
    }

    /// The slowest failing test cases, up to [`TOP_FAILURES_LIMIT`].
    pub fn top_failures(&self) -> &[TestCaseResult] {
        &self.failures[..self.failures.len().min(TOP_FAILURES_LIMIT)]
    }

    /// The inferred suite/env/service context.
    pub fn context(&self) -> &ContextGuess {
        &self.context
    }

    /// The evidence file, if one was found.
    pub fn evidence_file(&self) -> Option<&Utf8Path> {
        self.evidence_file.as_deref()
    }

    /// Result files that were skipped.
    pub fn skipped_files(&self) -> &[SkippedFile] {
        &self.skipped_files
    }

    /// The rollup status of the whole run.
    pub fn status(&self) -> RollupStatus {
        RollupStatus::rollup(self.total, self.failed, self.skipped)
    }
}
