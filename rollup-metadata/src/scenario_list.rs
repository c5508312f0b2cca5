// Copyright (c) The scenario-rollup Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use serde::{Deserialize, Serialize};

/// The exit code an engine uses to report that `exec <id>` skipped the scenario.
///
/// This follows the automake convention for skipped tests.
pub const ENGINE_SKIP_EXIT_CODE: i32 = 77;

/// The JSON printed by an external engine for `list`.
///
/// ```json
/// {
///   "scenarios": [
///     { "id": "users.feature:12", "name": "get user", "locator": "classpath:features/users.feature:12",
///       "suite": "users", "tags": ["@smoke"] }
///   ]
/// }
/// ```
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub struct ScenarioListSummary {
    /// The scenarios selected by the engine, in discovery order.
    pub scenarios: Vec<ScenarioSummary>,
}

impl ScenarioListSummary {
    /// Parses the JSON output of an engine's `list` command.
    pub fn parse_json(json: impl AsRef<str>) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json.as_ref())
    }

    /// Serializes this list as JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// A single scenario as reported by an external engine.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub struct ScenarioSummary {
    /// Identifier that stays stable across re-runs of the same scenario.
    pub id: String,

    /// Human-readable scenario name.
    pub name: String,

    /// Where the scenario is defined, e.g. `classpath:features/users.feature:12`.
    #[serde(default)]
    pub locator: String,

    /// The grouping this scenario belongs to, typically the feature it was defined in.
    ///
    /// Engines that don't report a suite get one derived from the locator.
    #[serde(default)]
    pub suite: Option<String>,

    /// Tags attached to the scenario.
    #[serde(default)]
    pub tags: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use test_case::test_case;

    #[test]
    fn parse_full_listing() {
        let json = r#"{
            "scenarios": [
                {
                    "id": "users.feature:12",
                    "name": "get user",
                    "locator": "classpath:features/users.feature:12",
                    "suite": "users",
                    "tags": ["@smoke", "@svc_users"]
                }
            ]
        }"#;
        let summary = ScenarioListSummary::parse_json(json).expect("listing is valid");
        assert_eq!(
            summary.scenarios,
            vec![ScenarioSummary {
                id: "users.feature:12".to_owned(),
                name: "get user".to_owned(),
                locator: "classpath:features/users.feature:12".to_owned(),
                suite: Some("users".to_owned()),
                tags: vec!["@smoke".to_owned(), "@svc_users".to_owned()],
            }]
        );
    }

    #[test_case(r#"{"scenarios": []}"#, 0 ; "empty")]
    #[test_case(r#"{"scenarios": [{"id": "a", "name": "a"}]}"#, 1 ; "optional fields omitted")]
    fn parse_minimal_listing(json: &str, count: usize) {
        let summary = ScenarioListSummary::parse_json(json).expect("listing is valid");
        assert_eq!(summary.scenarios.len(), count);
        for scenario in &summary.scenarios {
            assert_eq!(scenario.locator, "");
            assert_eq!(scenario.suite, None);
            assert!(scenario.tags.is_empty());
        }
    }

    #[test]
    fn parse_rejects_missing_id() {
        let json = r#"{"scenarios": [{"name": "no id"}]}"#;
        ScenarioListSummary::parse_json(json).expect_err("id is required");
    }
}
