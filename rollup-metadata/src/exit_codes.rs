// Copyright (c) The scenario-rollup Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

/// Documented exit codes for `scenario-rollup` failures.
///
/// `scenario-rollup` invocations may fail for a variety of reasons. This structure documents the
/// exit codes that may occur in case of expected failures.
///
/// Unknown/unexpected failures will always result in exit code 1.
pub enum RollupExitCode {}

impl RollupExitCode {
    /// No errors occurred and `scenario-rollup` exited normally.
    pub const OK: i32 = 0;

    /// No scenarios matched the tag selector, but no other errors occurred.
    pub const NO_SCENARIOS_RUN: i32 = 4;

    /// One or more scenarios were still failing after all retries.
    pub const SCENARIO_RUN_FAILED: i32 = 100;

    /// The external engine could not list scenarios.
    pub const SCENARIO_LIST_FAILED: i32 = 104;

    /// The side log that receives engine output could not be opened.
    pub const SIDE_LOG_OPEN_FAILED: i32 = 105;

    /// The result directory passed to `summary` does not exist.
    pub const INPUT_DIR_NOT_FOUND: i32 = 106;

    /// The result directory passed to `summary` contained no result files.
    pub const NO_RESULT_FILES: i32 = 107;

    /// Writing a report artifact, or data to stdout or stderr, produced an error.
    pub const WRITE_OUTPUT_ERROR: i32 = 110;

    /// A user issue happened while setting up a `scenario-rollup` invocation.
    pub const SETUP_ERROR: i32 = 96;
}
