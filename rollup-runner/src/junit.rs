// Copyright (c) The scenario-rollup Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Writes a JUnit report for an orchestrated run.
//!
//! The report has one `<testsuite>` per scenario suite and one `<testcase>` per scenario, holding
//! its latest outcome. Superseded failing attempts are recorded as reruns, so scenarios that passed
//! on retry show up as flaky.

use crate::{
    errors::WriteJunitError,
    runner::RunResults,
    scenario::{ScenarioOutcome, ScenarioStatus},
};
use camino::{Utf8Path, Utf8PathBuf};
use quick_junit::{NonSuccessKind, Report, TestCase, TestCaseStatus, TestRerun, TestSuite};
use rollup_summary::text::{SHORT_MESSAGE_MAX_CHARS, one_line_truncated};
use std::{collections::BTreeMap, fs::File};
use tracing::debug;

/// The name of the report file within the report directory.
pub const JUNIT_FILE_NAME: &str = "junit.xml";

/// Writes `junit.xml` into `report_dir`, creating it if necessary. Returns the path written.
pub fn write_junit_report(
    results: &RunResults,
    report_dir: &Utf8Path,
) -> Result<Utf8PathBuf, WriteJunitError> {
    let report = build_report(results);

    std::fs::create_dir_all(report_dir).map_err(|error| WriteJunitError::Fs {
        file: report_dir.to_owned(),
        error,
    })?;
    let junit_path = report_dir.join(JUNIT_FILE_NAME);
    let f = File::create(&junit_path).map_err(|error| WriteJunitError::Fs {
        file: junit_path.clone(),
        error,
    })?;
    report
        .serialize(f)
        .map_err(|error| WriteJunitError::Junit {
            file: junit_path.clone(),
            error: Box::new(error),
        })?;

    debug!("wrote JUnit report to {junit_path}");
    Ok(junit_path)
}

fn build_report(results: &RunResults) -> Report {
    let mut test_suites: BTreeMap<&str, TestSuite> = BTreeMap::new();
    for outcome in &results.outcomes {
        let suite = outcome.scenario.suite.as_str();
        let testcase = testcase_for(outcome, results.history(outcome.id()));
        test_suites
            .entry(suite)
            .or_insert_with(|| TestSuite::new(suite))
            .add_test_case(testcase);
    }

    let mut report = Report::new("scenario-rollup");
    report
        .set_timestamp(results.started_at)
        .set_time(results.elapsed)
        .add_test_suites(test_suites.into_values());
    report
}

fn testcase_for(outcome: &ScenarioOutcome, history: &[ScenarioOutcome]) -> TestCase {
    let mut testcase_status = match outcome.status {
        ScenarioStatus::Pass => TestCaseStatus::success(),
        ScenarioStatus::Skip => TestCaseStatus::skipped(),
        ScenarioStatus::Fail => {
            let mut status = TestCaseStatus::non_success(NonSuccessKind::Failure);
            set_failure_message(outcome, |message, description| {
                status.set_message(message).set_description(description);
            });
            status
        }
    };

    for previous in history.iter().filter(|o| o.status.is_failure()) {
        let mut test_rerun = TestRerun::new(NonSuccessKind::Failure);
        test_rerun.set_time(previous.duration);
        set_failure_message(previous, |message, description| {
            test_rerun.set_message(message).set_description(description);
        });
        testcase_status.add_rerun(test_rerun);
    }

    let mut testcase = TestCase::new(outcome.scenario.name.as_str(), testcase_status);
    testcase
        .set_classname(outcome.scenario.suite.as_str())
        .set_time(outcome.duration);
    testcase
}

fn set_failure_message(outcome: &ScenarioOutcome, set: impl FnOnce(String, String)) {
    let full = outcome.failure_message_or_empty();
    if !full.trim().is_empty() {
        set(
            one_line_truncated(full, SHORT_MESSAGE_MAX_CHARS),
            full.to_owned(),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        index::ScenarioIndex,
        runner::RunStats,
        scenario::{AttemptResult, Scenario, ScenarioId},
    };
    use camino_tempfile::tempdir;
    use chrono::Local;
    use rollup_summary::{junit_xml, model::CaseStatus};
    use std::{sync::Arc, time::Duration};

    #[test]
    fn report_round_trips_through_reader() {
        let scenario = |id: &str, suite: &str, index| {
            Arc::new(Scenario {
                id: ScenarioId::new(id),
                name: format!("{id} <works>"),
                locator: String::new(),
                suite: suite.to_owned(),
                discovery_index: index,
            })
        };
        let flaky = scenario("a", "orders", 0);
        let broken = scenario("b", "orders", 1);
        let skipped = scenario("c", "users", 2);

        let outcomes = vec![
            ScenarioOutcome::new(
                Arc::clone(&flaky),
                1,
                AttemptResult::pass(Duration::from_secs(1)),
            ),
            ScenarioOutcome::new(
                Arc::clone(&broken),
                2,
                AttemptResult::fail(Duration::from_secs(2), "match failed\nexpected: 1"),
            ),
            ScenarioOutcome::new(skipped, 0, AttemptResult::skip(Duration::ZERO)),
        ];
        let superseded = [
            (
                ScenarioId::new("a"),
                vec![ScenarioOutcome::new(
                    flaky,
                    0,
                    AttemptResult::fail(Duration::from_secs(1), "timeout"),
                )],
            ),
            (
                ScenarioId::new("b"),
                vec![
                    ScenarioOutcome::new(
                        Arc::clone(&broken),
                        0,
                        AttemptResult::fail(Duration::from_secs(1), "first"),
                    ),
                    ScenarioOutcome::new(
                        broken,
                        1,
                        AttemptResult::fail(Duration::from_secs(1), "second"),
                    ),
                ],
            ),
        ]
        .into();
        let index = ScenarioIndex::build(outcomes.iter().map(ScenarioOutcome::id));
        let results = RunResults {
            outcomes,
            superseded,
            retry_counts: [(ScenarioId::new("a"), 1), (ScenarioId::new("b"), 2)].into(),
            initial_index: index.clone(),
            final_index: index,
            stats: RunStats::default(),
            started_at: Local::now(),
            elapsed: Duration::from_secs(5),
        };

        let dir = tempdir().expect("created temp dir");
        let report_dir = dir.path().join("smoke/dev/all");
        let path = write_junit_report(&results, &report_dir).expect("wrote report");
        assert_eq!(path, report_dir.join(JUNIT_FILE_NAME));

        let suites = junit_xml::parse_file(&path).expect("report is readable");
        let names: Vec<_> = suites.iter().map(|s| s.display_name()).collect();
        assert_eq!(names, ["orders", "users"]);

        let orders = &suites[0];
        assert_eq!(orders.total(), 2);
        assert_eq!(orders.failed(), 1);
        let statuses: Vec<_> = orders.cases().iter().map(|c| c.status()).collect();
        assert_eq!(statuses, [CaseStatus::Pass, CaseStatus::Fail]);
        assert_eq!(orders.cases()[0].name(), "a <works>");
        assert_eq!(orders.cases()[1].short_message(), "match failed expected: 1");

        assert_eq!(suites[1].skipped(), 1);
    }
}
