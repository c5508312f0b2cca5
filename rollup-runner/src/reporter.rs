// Copyright (c) The scenario-rollup Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Prints the orchestrator's console lines.
//!
//! The main structure in this module is [`ConsoleReporter`]. Every line it prints is a single
//! aligned, `|`-separated record, for example:
//!
//! ```text
//! [SCN 02] RETRY | 1/2 | env=dev | svc=billing | src=features/billing/refund.feature:14 | SCN="refund" | reason=timeout (see report)
//! [SCN 02] PASS  | 3.10s | env=dev | svc=billing | src=features/billing/refund.feature:14 | SCN="refund" | (passed after retries)
//! [RUN] SUMMARY | env=dev | svc=billing | total=5 | passed=5 | failed=0 | ...
//! ```

use crate::{
    config::{RunContext, TagSelector},
    runner::{RunEvent, RunResults},
    scenario::{ScenarioOutcome, ScenarioStatus},
};
use camino::Utf8Path;
use chrono::{DateTime, Local};
use itertools::Itertools;
use owo_colors::{OwoColorize, Style};
use rollup_summary::text::{SHORT_MESSAGE_MAX_CHARS, one_line, one_line_truncated};
use std::{borrow::Cow, fmt, io, io::Write, time::Duration};

/// A short classification of a failure message, shown on RETRY lines.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum FailureReason {
    /// The message mentions a timeout.
    Timeout,

    /// The message mentions an HTTP 4xx or 5xx status.
    HttpError,

    /// The message mentions a failed match or assertion.
    AssertionFailed,

    /// Anything else.
    Failed,
}

impl FailureReason {
    /// Classifies a failure message. The first matching rule wins.
    pub fn classify(message: &str) -> Self {
        let normalized = one_line(message).to_lowercase();
        if normalized.contains("timeout") {
            Self::Timeout
        } else if normalized.contains("http 5") || normalized.contains("http 4") {
            Self::HttpError
        } else if normalized.contains("match failed") || normalized.contains("assert") {
            Self::AssertionFailed
        } else {
            Self::Failed
        }
    }

    /// A short label for this reason.
    pub fn label(self) -> &'static str {
        match self {
            Self::Timeout => "timeout",
            Self::HttpError => "http error",
            Self::AssertionFailed => "assertion failed",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (see report)", self.label())
    }
}

/// Shortens a scenario locator for console output.
///
/// Strips a `classpath:` prefix and any `?query`, normalizes backslashes, and keeps the last three
/// path segments.
pub fn short_locator(locator: &str) -> String {
    let locator = locator.strip_prefix("classpath:").unwrap_or(locator);
    let locator = locator.split('?').next().unwrap_or(locator);
    let locator = locator.replace('\\', "/");
    let segments: Vec<_> = locator.split('/').filter(|s| !s.is_empty()).collect();
    segments[segments.len().saturating_sub(3)..].join("/")
}

/// Makes a scenario name safe to print inside a double-quoted field.
pub fn safe_name(name: &str) -> Cow<'_, str> {
    if name.contains('"') {
        Cow::Owned(name.replace('"', "'"))
    } else {
        Cow::Borrowed(name)
    }
}

/// Writes console lines for a run.
#[derive(Debug)]
pub struct ConsoleReporter {
    context: RunContext,
    tags: TagSelector,
    styles: Box<Styles>,
}

impl ConsoleReporter {
    /// Creates a new reporter for a run with the given labels and tags.
    pub fn new(context: RunContext, tags: TagSelector) -> Self {
        Self {
            context,
            tags,
            styles: Box::default(),
        }
    }

    /// Colorizes output.
    pub fn colorize(&mut self) {
        self.styles.colorize();
    }

    /// Writes the line printed before discovery.
    pub fn write_header(
        &self,
        parallelism: usize,
        max_retries: usize,
        started_at: DateTime<Local>,
        mut writer: impl Write,
    ) -> io::Result<()> {
        writeln!(
            writer,
            "{} | env={} | svc={} | tags={} | threads={} | retries={} | started={}",
            "[RUN] START".style(self.styles.count),
            self.context.env,
            self.context.service_label(),
            self.tags,
            parallelism,
            max_retries,
            started_at.format("%Y-%m-%d %H:%M:%S"),
        )
    }

    /// Reports a run event. Only retries produce output.
    pub fn report_event(&self, event: &RunEvent<'_>, mut writer: impl Write) -> io::Result<()> {
        match event {
            RunEvent::RetryStarted {
                ordinal,
                retry,
                max_retries,
                previous,
            } => {
                let scenario = &previous.scenario;
                writeln!(
                    writer,
                    "[SCN {:02}] {} | {}/{} | env={} | svc={} | src={} | SCN=\"{}\" | reason={}",
                    ordinal,
                    "RETRY".style(self.styles.retry),
                    retry,
                    max_retries,
                    self.context.env,
                    self.context.service_label(),
                    short_locator(&scenario.locator),
                    safe_name(&scenario.name),
                    FailureReason::classify(previous.failure_message_or_empty()),
                )
            }
            RunEvent::RunStarted { .. }
            | RunEvent::InitialPassFinished { .. }
            | RunEvent::RetryFinished { .. } => Ok(()),
        }
    }

    /// Writes one line per final outcome, in final order, followed by the summary line.
    pub fn write_final(&self, results: &RunResults, mut writer: impl Write) -> io::Result<()> {
        let report_dir = self.context.report_dir();
        for outcome in &results.outcomes {
            self.write_outcome(results, outcome, &report_dir, &mut writer)?;
        }
        self.write_summary(results, &report_dir, writer)
    }

    fn write_outcome(
        &self,
        results: &RunResults,
        outcome: &ScenarioOutcome,
        report_dir: &Utf8Path,
        mut writer: impl Write,
    ) -> io::Result<()> {
        let ordinal = results.final_index.ordinal(outcome.id());
        let retry_count = results.retry_count(outcome.id());
        let scenario = &outcome.scenario;
        let time = DisplaySecs(outcome.duration);
        let env = &self.context.env;
        let svc = self.context.service_label();

        match outcome.status {
            ScenarioStatus::Pass => {
                write!(
                    writer,
                    "[SCN {ordinal:02}] {} | {time} | env={env} | svc={svc} | src={} | SCN=\"{}\"",
                    "PASS ".style(self.styles.pass),
                    short_locator(&scenario.locator),
                    safe_name(&scenario.name),
                )?;
                if retry_count > 0 {
                    write!(writer, " | (passed after retries)")?;
                }
                writeln!(writer)
            }
            ScenarioStatus::Skip => writeln!(
                writer,
                "[SCN {ordinal:02}] {} | {time} | env={env} | svc={svc} | src={} | SCN=\"{}\"",
                "SKIP ".style(self.styles.skip),
                short_locator(&scenario.locator),
                safe_name(&scenario.name),
            ),
            ScenarioStatus::Fail => {
                writeln!(
                    writer,
                    "[SCN {ordinal:02}] {} | {time} | env={env} | svc={svc} | src={} | SCN=\"{}\" | retried={retry_count} | see report",
                    "FAIL ".style(self.styles.fail),
                    short_locator(&scenario.locator),
                    safe_name(&scenario.name),
                )?;
                writeln!(
                    writer,
                    "         error: {}",
                    one_line_truncated(outcome.failure_message_or_empty(), SHORT_MESSAGE_MAX_CHARS)
                        .style(self.styles.fail_output),
                )?;
                writeln!(writer, "         report: {report_dir}")
            }
        }
    }

    fn write_summary(
        &self,
        results: &RunResults,
        report_dir: &Utf8Path,
        mut writer: impl Write,
    ) -> io::Result<()> {
        let stats = &results.stats;
        let status = stats.status();
        let status_style = if stats.is_success() {
            self.styles.pass
        } else {
            self.styles.fail
        };
        let fields = [
            format!("env={}", self.context.env),
            format!("svc={}", self.context.service_label()),
            format!("total={}", stats.scenario_count.style(self.styles.count)),
            format!("passed={}", stats.passed),
            format!("failed={}", stats.failed),
            format!("skipped={}", stats.skipped),
            format!("retriedScenarios={}", stats.retried_scenarios),
            format!("totalRetries={}", stats.total_retries),
            format!("time={}", DisplaySecs(results.elapsed)),
            format!("status={}", status.style(status_style)),
            format!("reportDir={report_dir}"),
        ];
        writeln!(
            writer,
            "{} | {}",
            "[RUN] SUMMARY".style(self.styles.count),
            fields.iter().join(" | "),
        )
    }
}

/// Displays a duration as seconds with two decimals, e.g. `1.25s`.
struct DisplaySecs(Duration);

impl fmt::Display for DisplaySecs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}s", self.0.as_secs_f64())
    }
}

#[derive(Debug, Default)]
struct Styles {
    count: Style,
    pass: Style,
    retry: Style,
    fail: Style,
    fail_output: Style,
    skip: Style,
}

impl Styles {
    fn colorize(&mut self) {
        self.count = Style::new().bold();
        self.pass = Style::new().green().bold();
        self.retry = Style::new().magenta().bold();
        self.fail = Style::new().red().bold();
        self.fail_output = Style::new().magenta();
        self.skip = Style::new().yellow().bold();
    }
}
