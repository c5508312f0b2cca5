// Copyright (c) The scenario-rollup Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Scenarios and the outcomes of running them.

use rollup_metadata::ScenarioSummary;
use std::{fmt, sync::Arc, time::Duration};

/// A stable identifier for a scenario, unique within a run and unchanged across retries.
#[derive(Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct ScenarioId(Arc<str>);

impl ScenarioId {
    /// Creates a new scenario ID.
    pub fn new(id: impl AsRef<str>) -> Self {
        Self(id.as_ref().into())
    }

    /// Returns the ID as a string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ScenarioId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A scenario discovered by an engine.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Scenario {
    /// The stable identifier.
    pub id: ScenarioId,

    /// The display name.
    pub name: String,

    /// Where the scenario is defined: a file and line, or a logical path.
    pub locator: String,

    /// The grouping name, typically the file the scenario is defined in.
    pub suite: String,

    /// The position at which the engine reported this scenario, starting from 0.
    pub discovery_index: usize,
}

impl Scenario {
    /// Creates a scenario from an engine's listing.
    ///
    /// If the listing has no suite, the locator (minus any line number or query) is used.
    pub fn from_summary(summary: ScenarioSummary, discovery_index: usize) -> Self {
        let suite = match summary.suite {
            Some(suite) if !suite.trim().is_empty() => suite,
            _ => suite_from_locator(&summary.locator).to_owned(),
        };
        Self {
            id: ScenarioId::new(&summary.id),
            name: summary.name,
            locator: summary.locator,
            suite,
            discovery_index,
        }
    }

    /// The total order used for every listing of scenarios.
    pub fn sort_key(&self) -> (&ScenarioId, usize) {
        (&self.id, self.discovery_index)
    }
}

fn suite_from_locator(locator: &str) -> &str {
    let path = locator.split('?').next().unwrap_or(locator);
    // Strip a trailing `:<line>`.
    match path.rsplit_once(':') {
        Some((file, line)) if !line.is_empty() && line.bytes().all(|b| b.is_ascii_digit()) => file,
        _ => path,
    }
}

/// The status of a single attempt.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum ScenarioStatus {
    /// The scenario passed.
    Pass,

    /// The scenario failed.
    Fail,

    /// The scenario was skipped by the engine.
    Skip,
}

impl ScenarioStatus {
    /// Returns true if the attempt failed.
    pub fn is_failure(self) -> bool {
        matches!(self, Self::Fail)
    }
}

/// What an engine reports back for one attempt at a scenario.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct AttemptResult {
    /// The status.
    pub status: ScenarioStatus,

    /// Time taken by the attempt.
    pub duration: Duration,

    /// Failure text, if the attempt failed.
    pub failure_message: Option<String>,
}

impl AttemptResult {
    /// A passing attempt.
    pub fn pass(duration: Duration) -> Self {
        Self {
            status: ScenarioStatus::Pass,
            duration,
            failure_message: None,
        }
    }

    /// A failing attempt.
    pub fn fail(duration: Duration, message: impl Into<String>) -> Self {
        Self {
            status: ScenarioStatus::Fail,
            duration,
            failure_message: Some(message.into()),
        }
    }

    /// A skipped attempt.
    pub fn skip(duration: Duration) -> Self {
        Self {
            status: ScenarioStatus::Skip,
            duration,
            failure_message: None,
        }
    }
}

/// One execution of one scenario.
///
/// Outcomes are never mutated. A later attempt at the same scenario produces a new outcome that
/// supersedes the previous one.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ScenarioOutcome {
    /// The scenario.
    pub scenario: Arc<Scenario>,

    /// 0 for the initial run, `n` for the `n`th retry pass.
    pub attempt: usize,

    /// The status of this attempt.
    pub status: ScenarioStatus,

    /// Time taken by this attempt.
    pub duration: Duration,

    /// Failure text. Only present for failing attempts.
    pub failure_message: Option<String>,
}

impl ScenarioOutcome {
    /// Creates an outcome from an engine's attempt result.
    pub fn new(scenario: Arc<Scenario>, attempt: usize, result: AttemptResult) -> Self {
        let failure_message = if result.status.is_failure() {
            result.failure_message
        } else {
            None
        };
        Self {
            scenario,
            attempt,
            status: result.status,
            duration: result.duration,
            failure_message,
        }
    }

    /// Returns the scenario ID.
    pub fn id(&self) -> &ScenarioId {
        &self.scenario.id
    }

    /// Returns the failure message, or an empty string.
    pub fn failure_message_or_empty(&self) -> &str {
        self.failure_message.as_deref().unwrap_or("")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("classpath:features/orders.feature:12", "classpath:features/orders.feature" ; "line suffix")]
    #[test_case("features/orders.feature?line=3", "features/orders.feature" ; "query")]
    #[test_case("features/orders.feature", "features/orders.feature" ; "plain")]
    #[test_case("classpath:features", "classpath:features" ; "non numeric suffix")]
    fn suite_from_locator_strips_position(locator: &str, expected: &str) {
        assert_eq!(suite_from_locator(locator), expected);
    }

    #[test]
    fn from_summary_prefers_listed_suite() {
        let summary = ScenarioSummary {
            id: "orders-1".to_owned(),
            name: "create order".to_owned(),
            locator: "features/orders.feature:7".to_owned(),
            suite: Some("orders".to_owned()),
            tags: vec![],
        };
        let scenario = Scenario::from_summary(summary.clone(), 3);
        assert_eq!(scenario.suite, "orders");
        assert_eq!(scenario.discovery_index, 3);

        let scenario = Scenario::from_summary(
            ScenarioSummary {
                suite: None,
                ..summary
            },
            0,
        );
        assert_eq!(scenario.suite, "features/orders.feature");
    }

    #[test]
    fn non_failures_drop_messages() {
        let scenario = Arc::new(Scenario::from_summary(
            ScenarioSummary {
                id: "a".to_owned(),
                name: "a".to_owned(),
                locator: String::new(),
                suite: None,
                tags: vec![],
            },
            0,
        ));
        let mut result = AttemptResult::pass(Duration::ZERO);
        result.failure_message = Some("stale".to_owned());
        let outcome = ScenarioOutcome::new(scenario, 0, result);
        assert_eq!(outcome.failure_message, None);
    }
}
