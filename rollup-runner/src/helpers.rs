// Copyright (c) The scenario-rollup Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

/// Utilities for pluralizing various words based on count or plurality.
pub(crate) mod plural {
    /// Returns "scenario" if `count` is 1, otherwise "scenarios".
    pub(crate) fn scenarios_str(count: usize) -> &'static str {
        if count == 1 { "scenario" } else { "scenarios" }
    }

    /// Returns "retry" if `count` is 1, otherwise "retries".
    pub(crate) fn retries_str(count: usize) -> &'static str {
        if count == 1 { "retry" } else { "retries" }
    }
}
