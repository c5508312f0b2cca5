// Copyright (c) The scenario-rollup Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::{
    errors::ExpectedError,
    output::{OutputContext, OutputOpts, OutputWriter, clap_styles},
};
use camino::{Utf8Path, Utf8PathBuf};
use chrono::Local;
use clap::{Args, Parser, Subcommand};
use rollup_metadata::RollupExitCode;
use rollup_runner::{
    command_engine::CommandEngine,
    config::{Parallelism, RunContext, TagSelector},
    junit::write_junit_report,
    reporter::ConsoleReporter,
    runner::OrchestratorBuilder,
    side_log::{DEFAULT_SIDE_LOG_PATH, SideLog},
};
use rollup_summary::{
    aggregate,
    render::{RenderOptions, render, write_report},
};
use std::io::Write;
use tracing::{debug, info, warn};

/// The default directory scanned for results, and the root of per-run report directories.
pub const DEFAULT_REPORT_ROOT: &str = "target/karate-reports";

/// The default location of the executive summary.
pub const DEFAULT_OUTPUT_FILE: &str = "target/executive-summary/index.html";

/// The suite name used for report directories when no suite is selected.
const DEFAULT_SUITE_NAME: &str = "all";

/// Runs scenarios with selective retries, and rolls up JUnit results into an executive summary.
#[derive(Debug, Parser)]
#[command(version, name = "scenario-rollup", styles = clap_styles::style())]
pub struct RollupApp {
    #[clap(flatten)]
    output: OutputOpts,

    #[clap(subcommand)]
    command: Command,
}

impl RollupApp {
    /// Initializes the output context.
    pub fn init_output(&self) -> OutputContext {
        self.output.init()
    }

    /// Executes the app, returning the process exit code.
    pub fn exec(
        self,
        output: OutputContext,
        output_writer: &mut OutputWriter,
    ) -> Result<i32, ExpectedError> {
        match self.command {
            Command::Run(opts) => opts.exec(output, output_writer),
            Command::Summary(opts) => opts.exec(output_writer),
        }
    }
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run scenarios through an engine, retrying the ones that fail
    ///
    /// Scenarios are discovered and executed by an external engine (see --engine). All of them
    /// run once with bounded parallelism, then failing scenarios are re-run one at a time, for up
    /// to --retries passes. Engine output goes to a side log; the console shows one line per
    /// retry, one line per scenario and a summary line.
    ///
    /// Exit codes: 0 when every scenario passed or was skipped, 100 when any scenario still fails
    /// after retries, and 4 when no scenarios matched the selected tags.
    Run(RunOpts),

    /// Build an HTML executive summary from JUnit XML results
    ///
    /// Every `.xml` file under INPUT_DIR is read; files that can't be parsed are listed in the
    /// report and otherwise skipped.
    Summary(SummaryOpts),
}

#[derive(Debug, Args)]
struct RunOpts {
    /// Command line of the scenario engine, e.g. `java -jar engine.jar`
    #[arg(long, env = "ROLLUP_ENGINE", value_name = "COMMAND")]
    engine: String,

    /// Environment label
    #[arg(long, env = "KARATE_ENV", default_value = "dev")]
    env: String,

    /// Service label: selects scenarios tagged `@svc_<SERVICE>`
    #[arg(long, env = "SERVICE")]
    service: Option<String>,

    /// Suite name: selects scenarios tagged `@<SUITE>` and names the report directory
    #[arg(long, env = "SUITE")]
    suite: Option<String>,

    /// Tags passed to the engine, separated by commas or spaces
    #[arg(long, env = "KARATE_TAGS", value_name = "TAGS")]
    tags: Option<String>,

    /// Number of scenarios to run simultaneously [possible values: integer or "num-cpus"]
    #[arg(
        long,
        short = 'j',
        env = "THREADS",
        default_value = "5",
        value_name = "THREADS",
        allow_negative_numbers = true
    )]
    threads: Parallelism,

    /// Maximum number of retry passes over failing scenarios
    #[arg(long, env = "RETRIES", default_value_t = 2)]
    retries: usize,

    /// Root of the per-run report directory `<ROOT>/<suite>/<env>/<service|all>`
    #[arg(long, default_value = DEFAULT_REPORT_ROOT, value_name = "ROOT")]
    report_root: Utf8PathBuf,

    /// File that engine output is appended to
    #[arg(long, env = "ROLLUP_SIDE_LOG", default_value = DEFAULT_SIDE_LOG_PATH, value_name = "PATH")]
    side_log: Utf8PathBuf,
}

impl RunOpts {
    fn exec(
        self,
        output: OutputContext,
        output_writer: &mut OutputWriter,
    ) -> Result<i32, ExpectedError> {
        let engine = CommandEngine::from_command_line(&self.engine)
            .map_err(|err| ExpectedError::EngineCommandParse { err })?;

        let mut tags = TagSelector::new(self.tags.as_deref(), self.service.as_deref());
        let suite = match self.suite.as_deref().map(str::trim) {
            Some(suite) if !suite.is_empty() => {
                tags = tags.with_leading_tag(format!("@{suite}"));
                suite.to_owned()
            }
            _ => DEFAULT_SUITE_NAME.to_owned(),
        };
        let context = RunContext {
            suite,
            env: self.env,
            service: self.service,
            report_root: self.report_root,
        };

        let side_log =
            SideLog::open(&self.side_log).map_err(|err| ExpectedError::SideLogOpen { err })?;
        if output.verbose {
            info!("engine output is written to {}", side_log.path());
        }

        let mut builder = OrchestratorBuilder::default();
        builder
            .set_parallelism(self.threads)
            .set_max_retries(self.retries)
            .set_tags(tags.clone());
        let orchestrator = builder
            .build(engine, side_log.sink())
            .map_err(|err| ExpectedError::OrchestratorBuild { err })?;

        let mut reporter = ConsoleReporter::new(context.clone(), tags.clone());
        if output.colorize_stdout() {
            reporter.colorize();
        }

        let mut writer = output_writer.stdout_writer();
        reporter
            .write_header(
                orchestrator.parallelism(),
                orchestrator.max_retries(),
                Local::now(),
                &mut writer,
            )
            .and_then(|()| writer.flush())
            .map_err(|err| ExpectedError::WriteOutput { err })?;

        let mut write_error = None;
        let results = orchestrator.run(|event| {
            let res = reporter
                .report_event(&event, &mut writer)
                .and_then(|()| writer.flush());
            if let Err(err) = res {
                write_error.get_or_insert(err);
            }
        });
        // Close the side log before anything else is reported.
        drop(side_log);
        let results = results.map_err(|err| ExpectedError::Discover { err })?;
        if let Some(err) = write_error {
            return Err(ExpectedError::WriteOutput { err });
        }

        reporter
            .write_final(&results, &mut writer)
            .and_then(|()| writer.flush())
            .map_err(|err| ExpectedError::WriteOutput { err })?;

        let report_dir = context.report_dir();
        let junit_path = write_junit_report(&results, &report_dir)
            .map_err(|err| ExpectedError::WriteJunit { err })?;
        debug!("JUnit report written to {junit_path}");

        if results.stats.scenario_count == 0 {
            return Err(ExpectedError::NoScenarios {
                tags: tags.to_string(),
            });
        }
        if !results.stats.is_success() {
            return Err(ExpectedError::ScenariosFailed {
                failed: results.stats.failed,
                report_dir,
            });
        }
        Ok(RollupExitCode::OK)
    }
}

#[derive(Debug, Args)]
struct SummaryOpts {
    /// Directory to scan for JUnit XML results
    #[arg(value_name = "INPUT_DIR", default_value = DEFAULT_REPORT_ROOT)]
    input_dir: Utf8PathBuf,

    /// Where to write the HTML summary
    #[arg(value_name = "OUTPUT_FILE", default_value = DEFAULT_OUTPUT_FILE)]
    output_file: Utf8PathBuf,
}

impl SummaryOpts {
    fn exec(self, output_writer: &mut OutputWriter) -> Result<i32, ExpectedError> {
        let summary =
            aggregate::collect(&self.input_dir).map_err(|err| ExpectedError::Collect { err })?;
        for skipped in summary.skipped_files() {
            debug!("skipped {}: {}", skipped.path, skipped.reason);
        }
        if !summary.skipped_files().is_empty() {
            warn!(
                "{} result files could not be read and are listed in the report",
                summary.skipped_files().len()
            );
        }

        let html = render(
            &summary,
            &RenderOptions {
                input_dir: &self.input_dir,
                output_file: &self.output_file,
                generated_at: Local::now(),
            },
        );
        write_report(&html, &self.output_file)
            .map_err(|err| ExpectedError::WriteReport { err })?;

        let mut writer = output_writer.stdout_writer();
        writeln!(writer, "Generated: {}", display_path(&self.output_file))
            .and_then(|()| writer.flush())
            .map_err(|err| ExpectedError::WriteOutput { err })?;
        Ok(RollupExitCode::OK)
    }
}

/// Shows `path` as an absolute path when possible.
fn display_path(path: &Utf8Path) -> String {
    match std::path::absolute(path) {
        Ok(absolute) => absolute.display().to_string(),
        Err(_) => path.to_string(),
    }
}
