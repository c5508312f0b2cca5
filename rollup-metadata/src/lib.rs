// Copyright (c) The scenario-rollup Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

#![warn(missing_docs)]

//! Structured data shared between `scenario-rollup` and the external engines it drives.
//!
//! External scenario engines are invoked as separate processes. This crate documents the JSON they
//! are expected to print when listing scenarios, and the exit codes `scenario-rollup` itself
//! produces.

mod exit_codes;
mod scenario_list;

pub use exit_codes::*;
pub use scenario_list::*;
