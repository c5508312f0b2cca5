// Copyright (c) The scenario-rollup Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! A [`ScenarioEngine`] backed by an external executable.
//!
//! The executable is invoked as:
//!
//! * `<program> [args...] list [--tags <tag>]...`: prints a
//!   [`ScenarioListSummary`] as JSON on stdout.
//! * `<program> [args...] exec <id>`: runs one scenario. Exit code 0 means the scenario passed,
//!   [`ENGINE_SKIP_EXIT_CODE`] means it was skipped, and anything else means it failed. The last
//!   non-empty line of stderr is used as the failure message.
//!
//! Re-runs use the same `exec` invocation. Everything the engine prints goes to the side log.

use crate::{
    config::TagSelector,
    engine::ScenarioEngine,
    errors::{EngineCommandParseError, EngineError},
    scenario::{AttemptResult, Scenario},
    side_log::SideLog,
};
use rollup_metadata::{ENGINE_SKIP_EXIT_CODE, ScenarioListSummary, ScenarioSummary};
use std::{io::Write, process::Output, time::Instant};
use tracing::{debug, trace};

/// Runs scenarios through an external engine executable.
#[derive(Clone, Debug)]
pub struct CommandEngine {
    program: String,
    args: Vec<String>,
}

impl CommandEngine {
    /// Creates an engine that runs `program`.
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    /// Parses a shell-style command line such as `java -jar engine.jar --path features`.
    pub fn from_command_line(input: &str) -> Result<Self, EngineCommandParseError> {
        let mut words = shell_words::split(input)
            .map_err(|error| EngineCommandParseError::Split {
                input: input.to_owned(),
                error,
            })?
            .into_iter();
        let program = words.next().ok_or(EngineCommandParseError::Empty)?;
        Ok(Self {
            program,
            args: words.collect(),
        })
    }

    /// Adds an argument passed before the subcommand.
    pub fn arg(&mut self, arg: impl Into<String>) -> &mut Self {
        self.args.push(arg.into());
        self
    }

    /// The program being run.
    pub fn program(&self) -> &str {
        &self.program
    }

    fn run<'a>(
        &'a self,
        extra_args: impl IntoIterator<Item = &'a str>,
    ) -> Result<Output, EngineError> {
        let expression = duct::cmd(
            &self.program,
            self.args
                .iter()
                .map(String::as_str)
                .chain(extra_args)
                .collect::<Vec<_>>(),
        );
        trace!("executing command: {:?}", expression);
        expression
            .stdout_capture()
            .stderr_capture()
            .unchecked()
            .run()
            .map_err(|error| EngineError::Spawn {
                program: self.program.clone(),
                error,
            })
    }
}

impl ScenarioEngine for CommandEngine {
    fn discover(
        &self,
        tags: &TagSelector,
        side_log: &SideLog,
    ) -> Result<Vec<ScenarioSummary>, EngineError> {
        let mut args = vec!["list"];
        for tag in tags.tags() {
            args.extend(["--tags", tag.as_str()]);
        }

        let output = self.run(args)?;
        append_output(side_log, &format!("list (tags: {tags})"), &output);
        if !output.status.success() {
            return Err(EngineError::ListFailed {
                program: self.program.clone(),
                message: failure_message(&output),
            });
        }

        let listing = ScenarioListSummary::parse_json(String::from_utf8_lossy(&output.stdout))
            .map_err(|error| EngineError::ListParse {
                program: self.program.clone(),
                error,
            })?;
        debug!("engine listed {} scenarios", listing.scenarios.len());
        Ok(listing.scenarios)
    }

    fn execute(
        &self,
        scenario: &Scenario,
        side_log: &SideLog,
    ) -> Result<AttemptResult, EngineError> {
        let start = Instant::now();
        let output = self.run(["exec", scenario.id.as_str()])?;
        let duration = start.elapsed();
        append_output(
            side_log,
            &format!("exec {} ({})", scenario.id, scenario.name),
            &output,
        );

        Ok(match output.status.code() {
            Some(0) => AttemptResult::pass(duration),
            Some(ENGINE_SKIP_EXIT_CODE) => AttemptResult::skip(duration),
            _ => AttemptResult::fail(duration, failure_message(&output)),
        })
    }
}

fn append_output(side_log: &SideLog, what: &str, output: &Output) {
    let mut sink = side_log.clone();
    let res = writeln!(sink, "---- {what}: {} ----", output.status)
        .and_then(|()| sink.write_all(&output.stdout))
        .and_then(|()| sink.write_all(&output.stderr))
        .and_then(|()| sink.flush());
    if let Err(error) = res {
        debug!("error writing engine output to side log: {error}");
    }
}

fn failure_message(output: &Output) -> String {
    let stderr = String::from_utf8_lossy(&output.stderr);
    match stderr.lines().rev().map(str::trim).find(|line| !line.is_empty()) {
        Some(line) => line.to_owned(),
        None => format!("engine exited with {}", output.status),
    }
}
