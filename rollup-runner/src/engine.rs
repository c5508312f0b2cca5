// Copyright (c) The scenario-rollup Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The interface to scenario execution engines.

use crate::{
    config::TagSelector,
    errors::EngineError,
    scenario::{AttemptResult, Scenario},
    side_log::SideLog,
};
use rollup_metadata::ScenarioSummary;

/// Something that can discover and execute scenarios.
///
/// Engines are the timeout authority: the orchestrator never interrupts a call. Calls may block,
/// and [`execute`](Self::execute) is called concurrently from several worker threads during the
/// initial pass.
pub trait ScenarioEngine: Send + Sync + 'static {
    /// Lists the scenarios matching `tags`, in the engine's discovery order.
    fn discover(
        &self,
        tags: &TagSelector,
        side_log: &SideLog,
    ) -> Result<Vec<ScenarioSummary>, EngineError>;

    /// Executes a scenario for the first time.
    fn execute(
        &self,
        scenario: &Scenario,
        side_log: &SideLog,
    ) -> Result<AttemptResult, EngineError>;

    /// Executes a scenario again after it failed.
    ///
    /// Retries only ever happen one at a time. The default implementation calls
    /// [`execute`](Self::execute).
    fn rerun(
        &self,
        scenario: &Scenario,
        side_log: &SideLog,
    ) -> Result<AttemptResult, EngineError> {
        self.execute(scenario, side_log)
    }
}
