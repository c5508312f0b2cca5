// Copyright (c) The scenario-rollup Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration for a scenario run.

use crate::errors::ParallelismParseError;
use camino::{Utf8Path, Utf8PathBuf};
use std::{fmt, str::FromStr, sync::LazyLock};
use tracing::warn;

/// The placeholder used in console lines and report paths when no service is selected.
pub const ALL_SERVICES: &str = "all";

/// The tag prefix used to select scenarios belonging to a service.
pub const SERVICE_TAG_PREFIX: &str = "@svc_";

/// Gets the number of available CPUs and caches the value.
#[inline]
pub fn get_num_cpus() -> usize {
    static NUM_CPUS: LazyLock<usize> = LazyLock::new(|| match std::thread::available_parallelism() {
        Ok(count) => count.into(),
        Err(err) => {
            warn!("unable to determine num-cpus ({err}), assuming 1 logical CPU");
            1
        }
    });

    *NUM_CPUS
}

/// The number of scenarios to run simultaneously during the initial pass.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Parallelism {
    /// Run with a specified number of workers.
    Count(usize),

    /// Run with a number of workers equal to the logical CPU count.
    NumCpus,
}

impl Parallelism {
    /// Gets the actual number of workers computed at runtime. Always at least 1.
    pub fn compute(self) -> usize {
        match self {
            Self::Count(threads) => threads.max(1),
            Self::NumCpus => get_num_cpus(),
        }
    }
}

impl FromStr for Parallelism {
    type Err = ParallelismParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s == "num-cpus" {
            return Ok(Self::NumCpus);
        }

        match s.parse::<isize>() {
            Err(e) => Err(ParallelismParseError::new(s, e.to_string())),
            Ok(0) => Err(ParallelismParseError::new(s, "parallelism may not be 0")),
            Ok(j) if j < 0 => Ok(Self::Count(
                (get_num_cpus() as isize + j).max(1) as usize,
            )),
            Ok(j) => Ok(Self::Count(j as usize)),
        }
    }
}

impl fmt::Display for Parallelism {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Count(threads) => write!(f, "{threads}"),
            Self::NumCpus => write!(f, "num-cpus"),
        }
    }
}

/// The tags passed to the engine to select scenarios.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct TagSelector {
    tags: Vec<String>,
}

impl TagSelector {
    /// Builds a selector out of a raw tag expression and an optional service label.
    ///
    /// The expression is split on commas and whitespace. If `service` is non-blank,
    /// `@svc_<service>` is appended.
    pub fn new(expression: Option<&str>, service: Option<&str>) -> Self {
        let mut tags: Vec<String> = expression
            .unwrap_or_default()
            .split(|c: char| c == ',' || c.is_whitespace())
            .filter(|tag| !tag.is_empty())
            .map(str::to_owned)
            .collect();
        if let Some(service) = service.map(str::trim).filter(|s| !s.is_empty()) {
            tags.push(format!("{SERVICE_TAG_PREFIX}{service}"));
        }
        Self { tags }
    }

    /// Returns a copy of this selector with `tag` placed first.
    pub fn with_leading_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.insert(0, tag.into());
        self
    }

    /// The individual tags.
    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    /// Returns true if no tags are selected.
    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }
}

impl fmt::Display for TagSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.tags.is_empty() {
            f.write_str("(none)")
        } else {
            f.write_str(&self.tags.join(","))
        }
    }
}

/// Labels describing a run, used in console lines and the report directory.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RunContext {
    /// The suite name, e.g. `smoke`.
    pub suite: String,

    /// The environment label, e.g. `dev`.
    pub env: String,

    /// The service label, if one was selected.
    pub service: Option<String>,

    /// The root under which per-run report directories are created.
    pub report_root: Utf8PathBuf,
}

impl RunContext {
    /// The service label, or `(all)` if none was selected.
    pub fn service_label(&self) -> &str {
        match self.service.as_deref() {
            Some(service) if !service.trim().is_empty() => service,
            _ => "(all)",
        }
    }

    /// The report directory for this run: `<report-root>/<suite>/<env>/<service|all>`.
    pub fn report_dir(&self) -> Utf8PathBuf {
        report_dir(
            &self.report_root,
            &self.suite,
            &self.env,
            self.service.as_deref(),
        )
    }
}

/// Computes `<report-root>/<suite>/<env>/<service|all>`.
pub fn report_dir(
    report_root: &Utf8Path,
    suite: &str,
    env: &str,
    service: Option<&str>,
) -> Utf8PathBuf {
    let service = service
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or(ALL_SERVICES);
    report_root.join(suite).join(env).join(service)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use test_case::test_case;

    #[test_case("4", Some(4) ; "positive")]
    #[test_case(" 2 ", Some(2) ; "whitespace")]
    #[test_case("0", None ; "zero")]
    #[test_case("many", None ; "garbage")]
    fn parse_parallelism(input: &str, expected: Option<usize>) {
        let parsed = input.parse::<Parallelism>().ok().map(Parallelism::compute);
        assert_eq!(parsed, expected);
    }

    #[test]
    fn parse_parallelism_relative() {
        assert_eq!(
            "num-cpus".parse::<Parallelism>().expect("valid").compute(),
            get_num_cpus()
        );
        let relative = "-1".parse::<Parallelism>().expect("valid").compute();
        assert_eq!(relative, get_num_cpus().saturating_sub(1).max(1));
        let huge = "-100000".parse::<Parallelism>().expect("valid").compute();
        assert_eq!(huge, 1);
    }

    #[test_case(None, None, &[], "(none)" ; "nothing")]
    #[test_case(Some("@smoke, @login  ~@wip"), None, &["@smoke", "@login", "~@wip"], "@smoke,@login,~@wip" ; "mixed separators")]
    #[test_case(Some(""), Some("billing"), &["@svc_billing"], "@svc_billing" ; "service only")]
    #[test_case(Some("@smoke"), Some("  "), &["@smoke"], "@smoke" ; "blank service")]
    fn tag_selector(expr: Option<&str>, service: Option<&str>, tags: &[&str], display: &str) {
        let selector = TagSelector::new(expr, service);
        assert_eq!(selector.tags(), tags);
        assert_eq!(selector.to_string(), display);
    }

    #[test]
    fn report_dir_layout() {
        let mut context = RunContext {
            suite: "smoke".to_owned(),
            env: "qa".to_owned(),
            service: None,
            report_root: "target/karate-reports".into(),
        };
        assert_eq!(context.report_dir(), "target/karate-reports/smoke/qa/all");
        assert_eq!(context.service_label(), "(all)");

        context.service = Some("billing".to_owned());
        assert_eq!(context.report_dir(), "target/karate-reports/smoke/qa/billing");
        assert_eq!(context.service_label(), "billing");
    }
}
