// Copyright (c) The scenario-rollup Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

#![warn(missing_docs)]

//! Core functionality for running scenarios with selective retries.
//!
//! The main structure in this crate is [`Orchestrator`](runner::Orchestrator), created through an
//! [`OrchestratorBuilder`](runner::OrchestratorBuilder). It discovers scenarios through a
//! [`ScenarioEngine`](engine::ScenarioEngine), runs all of them with bounded parallelism, then
//! retries only the failing ones, one pass at a time.
//!
//! For the binary, see the `scenario-rollup` crate.

pub mod command_engine;
pub mod config;
pub mod engine;
pub mod errors;
mod helpers;
pub mod index;
pub mod junit;
pub mod reporter;
pub mod runner;
pub mod scenario;
pub mod side_log;
