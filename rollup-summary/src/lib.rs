// Copyright (c) The scenario-rollup Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

#![warn(missing_docs)]

//! Executive summaries for JUnit-style result trees.
//!
//! The flow is:
//!
//! 1. [`aggregate::collect`] walks a directory tree, parses every JUnit XML file it finds and
//!    builds an [`ExecutionSummary`](model::ExecutionSummary).
//! 2. [`rollup::RollupStatus`] classifies suites and the whole run from their counts.
//! 3. [`render::render`] turns the summary into a single self-contained HTML document.

pub mod aggregate;
pub mod errors;
pub mod junit_xml;
pub mod model;
pub mod render;
pub mod rollup;
pub mod text;
