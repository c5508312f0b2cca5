// Copyright (c) The scenario-rollup Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Classification of a set of counts into a single rollup status.
//!
//! The same function classifies individual suites, the whole summary, and the orchestrator's
//! final status line, so all three always agree.

use std::fmt;

/// The rollup status of a suite or a whole run.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum RollupStatus {
    /// Nothing was counted at all.
    NoTests,

    /// Everything counted was skipped.
    AllSkipped,

    /// At least one test executed and none failed.
    Pass,

    /// Every executed test failed.
    Fail,

    /// Some, but not all, executed tests failed.
    Unstable,
}

impl RollupStatus {
    /// Classifies `total` tests, of which `failed` failed and `skipped` were skipped.
    pub fn rollup(total: usize, failed: usize, skipped: usize) -> Self {
        if total == 0 {
            return Self::NoTests;
        }
        let executed = executed_count(total, skipped);
        if executed == 0 {
            Self::AllSkipped
        } else if failed == 0 {
            Self::Pass
        } else if failed == executed {
            Self::Fail
        } else {
            Self::Unstable
        }
    }

    /// Returns the label shown in badges and pills.
    pub fn label(self) -> &'static str {
        match self {
            Self::NoTests => "NO TESTS",
            Self::AllSkipped => "ALL SKIPPED",
            Self::Pass => "PASS",
            Self::Fail => "FAIL",
            Self::Unstable => "UNSTABLE",
        }
    }

    /// Returns the CSS class used to color badges and pills.
    pub fn css_class(self) -> &'static str {
        match self {
            Self::NoTests | Self::AllSkipped | Self::Unstable => "warn",
            Self::Pass => "ok",
            Self::Fail => "bad",
        }
    }
}

impl fmt::Display for RollupStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// The number of tests that actually ran: `max(0, total - skipped)`.
pub fn executed_count(total: usize, skipped: usize) -> usize {
    total.saturating_sub(skipped)
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;
    use test_strategy::proptest;

    #[test_case(0, 0, 0, RollupStatus::NoTests ; "nothing")]
    #[test_case(0, 3, 2, RollupStatus::NoTests ; "zero total wins over other counts")]
    #[test_case(4, 0, 4, RollupStatus::AllSkipped ; "all skipped")]
    #[test_case(4, 1, 6, RollupStatus::AllSkipped ; "more skipped than total")]
    #[test_case(5, 0, 2, RollupStatus::Pass ; "pass with skips")]
    #[test_case(5, 3, 2, RollupStatus::Fail ; "every executed test failed")]
    #[test_case(5, 1, 2, RollupStatus::Unstable ; "some failed")]
    #[test_case(3, 7, 0, RollupStatus::Unstable ; "failed exceeds executed")]
    fn rollup_boundaries(total: usize, failed: usize, skipped: usize, expected: RollupStatus) {
        assert_eq!(RollupStatus::rollup(total, failed, skipped), expected);
    }

    #[test]
    fn presentation_table() {
        let table = [
            (RollupStatus::NoTests, "NO TESTS", "warn"),
            (RollupStatus::AllSkipped, "ALL SKIPPED", "warn"),
            (RollupStatus::Pass, "PASS", "ok"),
            (RollupStatus::Fail, "FAIL", "bad"),
            (RollupStatus::Unstable, "UNSTABLE", "warn"),
        ];
        for (status, label, css) in table {
            assert_eq!(status.label(), label);
            assert_eq!(status.css_class(), css);
            assert_eq!(status.to_string(), label);
        }
    }

    #[proptest(cases = 256)]
    fn rollup_is_total_and_consistent(
        #[strategy(0usize..1000)] total: usize,
        #[strategy(0usize..1000)] failed: usize,
        #[strategy(0usize..1000)] skipped: usize,
    ) {
        let status = RollupStatus::rollup(total, failed, skipped);
        let executed = executed_count(total, skipped);
        match status {
            RollupStatus::NoTests => assert_eq!(total, 0),
            RollupStatus::AllSkipped => assert!(total > 0 && executed == 0),
            RollupStatus::Pass => assert!(executed > 0 && failed == 0),
            RollupStatus::Fail => assert!(executed > 0 && failed == executed),
            RollupStatus::Unstable => {
                assert!(executed > 0 && failed > 0 && failed != executed)
            }
        }
        // Pure: the same inputs always classify the same way.
        assert_eq!(status, RollupStatus::rollup(total, failed, skipped));
    }
}
