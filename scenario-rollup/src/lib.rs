// Copyright (c) The scenario-rollup Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Runs externally defined scenarios with selective retries, and rolls up JUnit XML results into a
//! single static HTML executive summary.
//!
//! * `scenario-rollup run` drives an engine executable: every scenario runs once in parallel, then
//!   failing scenarios are retried one at a time.
//! * `scenario-rollup summary [INPUT_DIR] [OUTPUT_FILE]` collects JUnit XML files and writes the
//!   summary.
//!
//! The engine protocol is documented in the `rollup-metadata` crate.

#![warn(missing_docs)]

mod dispatch;
mod errors;
mod output;

#[doc(hidden)]
pub use dispatch::*;
#[doc(hidden)]
pub use errors::*;
#[doc(hidden)]
pub use output::{OutputContext, OutputWriter, StderrStyles};
