// Copyright (c) The scenario-rollup Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The retry orchestrator.
//!
//! A run has two stages:
//!
//! 1. The initial pass executes every discovered scenario, `parallelism` at a time.
//! 2. Up to `max_retries` retry passes follow. Each pass takes the scenarios that are currently
//!    failing and re-runs them one after the other. A scenario that passes drops out of the next
//!    pass.
//!
//! Outcomes are merged by scenario ID: the latest attempt replaces the previous one, which is kept
//! as history.

use crate::{
    config::{Parallelism, TagSelector},
    engine::ScenarioEngine,
    errors::{DisplayErrorChain, OrchestratorBuildError, RunError},
    helpers::plural,
    index::ScenarioIndex,
    scenario::{AttemptResult, Scenario, ScenarioId, ScenarioOutcome, ScenarioStatus},
    side_log::SideLog,
};
use chrono::{DateTime, Local};
use debug_ignore::DebugIgnore;
use futures::prelude::*;
use itertools::Itertools;
use rollup_metadata::ScenarioSummary;
use rollup_summary::rollup::RollupStatus;
use std::{
    any::Any,
    collections::{BTreeMap, BTreeSet},
    panic::{AssertUnwindSafe, catch_unwind},
    sync::Arc,
    time::{Duration, Instant},
};
use tokio::runtime::Runtime;
use tracing::{debug, warn};

/// Orchestrator options.
#[derive(Debug, Default)]
pub struct OrchestratorBuilder {
    parallelism: Option<Parallelism>,
    max_retries: usize,
    tags: TagSelector,
}

impl OrchestratorBuilder {
    /// Sets the number of scenarios to run simultaneously during the initial pass.
    ///
    /// Defaults to the number of CPUs.
    pub fn set_parallelism(&mut self, parallelism: Parallelism) -> &mut Self {
        self.parallelism = Some(parallelism);
        self
    }

    /// Sets the maximum number of retry passes.
    pub fn set_max_retries(&mut self, max_retries: usize) -> &mut Self {
        self.max_retries = max_retries;
        self
    }

    /// Sets the tags used to select scenarios.
    pub fn set_tags(&mut self, tags: TagSelector) -> &mut Self {
        self.tags = tags;
        self
    }

    /// Creates a new orchestrator driving `engine`, with engine output going to `side_log`.
    pub fn build<E: ScenarioEngine>(
        self,
        engine: E,
        side_log: SideLog,
    ) -> Result<Orchestrator<E>, OrchestratorBuildError> {
        let parallelism = self.parallelism.unwrap_or(Parallelism::NumCpus).compute();
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .thread_name("scenario-rollup-worker")
            .build()
            .map_err(OrchestratorBuildError::TokioRuntimeCreate)?;

        Ok(Orchestrator {
            engine: DebugIgnore(Arc::new(engine)),
            side_log,
            parallelism,
            max_retries: self.max_retries,
            tags: self.tags,
            runtime,
        })
    }
}

/// Runs scenarios through an engine, retrying failures.
///
/// Created using [`OrchestratorBuilder::build`].
#[derive(Debug)]
pub struct Orchestrator<E> {
    engine: DebugIgnore<Arc<E>>,
    side_log: SideLog,
    parallelism: usize,
    max_retries: usize,
    tags: TagSelector,
    runtime: Runtime,
}

impl<E: ScenarioEngine> Orchestrator<E> {
    /// The number of scenarios run simultaneously during the initial pass.
    pub fn parallelism(&self) -> usize {
        self.parallelism
    }

    /// The maximum number of retry passes.
    pub fn max_retries(&self) -> usize {
        self.max_retries
    }

    /// Discovers and runs scenarios.
    ///
    /// The callback is called on the orchestrator thread as the run progresses. Nothing is
    /// reported per scenario during the initial pass.
    ///
    /// Returns an error if discovery fails. Engine errors while executing scenarios are recorded
    /// as failed attempts.
    pub fn run<F>(self, mut callback: F) -> Result<RunResults, RunError>
    where
        F: FnMut(RunEvent<'_>),
    {
        let started_at = Local::now();
        let start = Instant::now();

        let listed = self
            .engine
            .discover(&self.tags, &self.side_log)
            .map_err(RunError::Discover)?;
        let scenarios = to_scenarios(listed)?;
        debug!(
            "discovered {} {} with tags {}",
            scenarios.len(),
            plural::scenarios_str(scenarios.len()),
            self.tags,
        );

        callback(RunEvent::RunStarted {
            scenario_count: scenarios.len(),
            parallelism: self.parallelism,
            max_retries: self.max_retries,
        });

        let mut merged = MergedResults::default();
        for outcome in self.initial_pass(scenarios) {
            merged.merge(outcome);
        }
        let initial_index = ScenarioIndex::build(merged.sorted().map(|outcome| outcome.id()));
        callback(RunEvent::InitialPassFinished {
            failed: merged.failing().count(),
        });

        let mut retry_counts: BTreeMap<ScenarioId, usize> = BTreeMap::new();
        for pass in 1..=self.max_retries {
            // Snapshot the failing set: outcomes merged during this pass don't affect it.
            let failing: Vec<_> = merged.failing().cloned().collect();
            if failing.is_empty() {
                debug!("nothing failing, skipping remaining retry passes");
                break;
            }
            debug!(
                "retry pass {pass}/{}: {} failing {}",
                self.max_retries,
                failing.len(),
                plural::scenarios_str(failing.len()),
            );

            for previous in failing {
                let retry_count = retry_counts.entry(previous.id().clone()).or_default();
                *retry_count += 1;
                let retry = *retry_count;
                let ordinal = initial_index.ordinal(previous.id());

                callback(RunEvent::RetryStarted {
                    ordinal,
                    retry,
                    max_retries: self.max_retries,
                    previous: &previous,
                });
                let outcome = self.rerun(Arc::clone(&previous.scenario), pass);
                callback(RunEvent::RetryFinished {
                    ordinal,
                    outcome: &outcome,
                });
                merged.merge(outcome);
            }
        }

        let total_retries: usize = retry_counts.values().sum();
        debug!(
            "run finished after {total_retries} {}",
            plural::retries_str(total_retries),
        );
        Ok(merged.finish(initial_index, retry_counts, started_at, start.elapsed()))
    }

    fn initial_pass(&self, scenarios: Vec<Arc<Scenario>>) -> Vec<ScenarioOutcome> {
        let engine: &Arc<E> = &self.engine;
        let side_log = &self.side_log;
        let run_fut = stream::iter(scenarios)
            .map(|scenario| {
                let engine = Arc::clone(engine);
                let side_log = side_log.clone();
                async move {
                    let start = Instant::now();
                    let task_scenario = Arc::clone(&scenario);
                    let res = tokio::task::spawn_blocking(move || {
                        engine.execute(&task_scenario, &side_log)
                    })
                    .await;
                    let result = match res {
                        Ok(Ok(result)) => result,
                        Ok(Err(error)) => {
                            let message = DisplayErrorChain::new(&error).to_string();
                            warn!("engine error executing {}: {message}", scenario.id);
                            AttemptResult::fail(start.elapsed(), message)
                        }
                        Err(join_error) => {
                            let message = match join_error.try_into_panic() {
                                Ok(payload) => panic_message(&*payload),
                                Err(join_error) => join_error.to_string(),
                            };
                            warn!("engine panicked executing {}: {message}", scenario.id);
                            AttemptResult::fail(start.elapsed(), message)
                        }
                    };
                    ScenarioOutcome::new(scenario, 0, result)
                }
            })
            // Scenarios are started in discovery order but may finish in any order.
            .buffer_unordered(self.parallelism)
            .collect::<Vec<_>>();

        self.runtime.block_on(run_fut)
    }

    fn rerun(&self, scenario: Arc<Scenario>, pass: usize) -> ScenarioOutcome {
        let start = Instant::now();
        let res = catch_unwind(AssertUnwindSafe(|| {
            self.engine.rerun(&scenario, &self.side_log)
        }));
        let result = match res {
            Ok(Ok(result)) => result,
            Ok(Err(error)) => {
                let message = DisplayErrorChain::new(&error).to_string();
                warn!("engine error re-running {}: {message}", scenario.id);
                AttemptResult::fail(start.elapsed(), message)
            }
            Err(payload) => {
                let message = panic_message(&*payload);
                warn!("engine panicked re-running {}: {message}", scenario.id);
                AttemptResult::fail(start.elapsed(), message)
            }
        };
        ScenarioOutcome::new(scenario, pass, result)
    }
}

fn to_scenarios(listed: Vec<ScenarioSummary>) -> Result<Vec<Arc<Scenario>>, RunError> {
    let mut seen = BTreeSet::new();
    listed
        .into_iter()
        .enumerate()
        .map(|(discovery_index, summary)| {
            let scenario = Scenario::from_summary(summary, discovery_index);
            if !seen.insert(scenario.id.clone()) {
                return Err(RunError::DuplicateScenarioId { id: scenario.id });
            }
            Ok(Arc::new(scenario))
        })
        .collect()
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    let message = if let Some(s) = payload.downcast_ref::<&str>() {
        s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.as_str()
    } else {
        "(non-string payload)"
    };
    format!("engine panicked: {message}")
}

/// The latest outcome per scenario, plus every superseded attempt.
#[derive(Debug, Default)]
struct MergedResults {
    latest: BTreeMap<ScenarioId, ScenarioOutcome>,
    superseded: BTreeMap<ScenarioId, Vec<ScenarioOutcome>>,
}

impl MergedResults {
    fn merge(&mut self, outcome: ScenarioOutcome) {
        let id = outcome.id().clone();
        if let Some(previous) = self.latest.insert(id.clone(), outcome) {
            self.superseded.entry(id).or_default().push(previous);
        }
    }

    fn sorted(&self) -> impl Iterator<Item = &ScenarioOutcome> {
        self.latest
            .values()
            .sorted_by(|a, b| a.scenario.sort_key().cmp(&b.scenario.sort_key()))
    }

    fn failing(&self) -> impl Iterator<Item = &ScenarioOutcome> {
        self.sorted().filter(|outcome| outcome.status.is_failure())
    }

    fn finish(
        self,
        initial_index: ScenarioIndex,
        retry_counts: BTreeMap<ScenarioId, usize>,
        started_at: DateTime<Local>,
        elapsed: Duration,
    ) -> RunResults {
        let outcomes: Vec<_> = self.sorted().cloned().collect();
        let final_index = ScenarioIndex::build(outcomes.iter().map(ScenarioOutcome::id));
        let stats = RunStats::new(&outcomes, &retry_counts);
        debug!("run finished: {stats:?}");

        RunResults {
            outcomes,
            superseded: self.superseded,
            retry_counts,
            initial_index,
            final_index,
            stats,
            started_at,
            elapsed,
        }
    }
}

/// An event that occurred during a run.
#[derive(Clone, Debug)]
#[non_exhaustive]
pub enum RunEvent<'a> {
    /// Scenarios were discovered and the initial pass is about to start.
    RunStarted {
        /// The number of scenarios discovered.
        scenario_count: usize,

        /// The number of scenarios run simultaneously during the initial pass.
        parallelism: usize,

        /// The maximum number of retry passes.
        max_retries: usize,
    },

    /// Every scenario has run once.
    InitialPassFinished {
        /// The number of scenarios that failed.
        failed: usize,
    },

    /// A failing scenario is about to be re-run.
    RetryStarted {
        /// The scenario's ordinal in the initial index.
        ordinal: usize,

        /// The retry number for this scenario, starting from 1.
        retry: usize,

        /// The maximum number of retry passes.
        max_retries: usize,

        /// The outcome being retried.
        previous: &'a ScenarioOutcome,
    },

    /// A re-run finished.
    RetryFinished {
        /// The scenario's ordinal in the initial index.
        ordinal: usize,

        /// The outcome of the re-run.
        outcome: &'a ScenarioOutcome,
    },
}

/// The merged results of a run.
#[derive(Clone, Debug)]
pub struct RunResults {
    /// The latest outcome for every scenario, sorted by scenario ID then discovery index.
    pub outcomes: Vec<ScenarioOutcome>,

    /// Attempts that were replaced by a later attempt, oldest first.
    pub superseded: BTreeMap<ScenarioId, Vec<ScenarioOutcome>>,

    /// The number of retries issued per scenario. Scenarios that were never retried are absent.
    pub retry_counts: BTreeMap<ScenarioId, usize>,

    /// Ordinals built from the initial pass, used for retry lines.
    pub initial_index: ScenarioIndex,

    /// Ordinals built from the final results, used for the final listing.
    pub final_index: ScenarioIndex,

    /// Statistics for the run.
    pub stats: RunStats,

    /// When the run started.
    pub started_at: DateTime<Local>,

    /// How long the run took, including discovery.
    pub elapsed: Duration,
}

impl RunResults {
    /// The number of retries issued for `id`.
    pub fn retry_count(&self, id: &ScenarioId) -> usize {
        self.retry_counts.get(id).copied().unwrap_or(0)
    }

    /// Attempts at `id` that were superseded, oldest first.
    pub fn history(&self, id: &ScenarioId) -> &[ScenarioOutcome] {
        self.superseded.get(id).map_or(&[], Vec::as_slice)
    }

    /// Outcomes that are still failing.
    pub fn failing(&self) -> impl Iterator<Item = &ScenarioOutcome> {
        self.outcomes
            .iter()
            .filter(|outcome| outcome.status.is_failure())
    }
}

/// Statistics for a run.
#[derive(Copy, Clone, Default, Debug, Eq, PartialEq)]
pub struct RunStats {
    /// The number of scenarios discovered.
    pub scenario_count: usize,

    /// The number of scenarios whose latest outcome passed. Includes `passed_after_retries`.
    pub passed: usize,

    /// The number of scenarios that passed on retry.
    pub passed_after_retries: usize,

    /// The number of scenarios still failing after retries.
    pub failed: usize,

    /// The number of scenarios skipped by the engine.
    pub skipped: usize,

    /// The number of scenarios retried at least once.
    pub retried_scenarios: usize,

    /// The total number of retries issued.
    pub total_retries: usize,
}

impl RunStats {
    fn new(outcomes: &[ScenarioOutcome], retry_counts: &BTreeMap<ScenarioId, usize>) -> Self {
        let mut stats = Self {
            scenario_count: outcomes.len(),
            retried_scenarios: retry_counts.values().filter(|&&count| count > 0).count(),
            total_retries: retry_counts.values().sum(),
            ..Self::default()
        };
        for outcome in outcomes {
            match outcome.status {
                ScenarioStatus::Pass => {
                    stats.passed += 1;
                    if retry_counts.contains_key(outcome.id()) {
                        stats.passed_after_retries += 1;
                    }
                }
                ScenarioStatus::Fail => stats.failed += 1,
                ScenarioStatus::Skip => stats.skipped += 1,
            }
        }
        stats
    }

    /// Returns true if this run is considered a success: nothing is failing after retries.
    pub fn is_success(&self) -> bool {
        self.failed == 0
    }

    /// The rollup status of the run.
    pub fn status(&self) -> RollupStatus {
        RollupStatus::rollup(self.scenario_count, self.failed, self.skipped)
    }
}
