// Copyright (c) The scenario-rollup Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Rendering an [`ExecutionSummary`] as a single self-contained HTML document.
//!
//! The stylesheet and the filter/search script are embedded into the document, so the output can
//! be archived or attached to a CI run as one file.

mod format;

pub use format::{DisplayClockDuration, DisplayPercent, escape_attr, escape_html};

use crate::{
    errors::WriteReportError,
    model::{CaseStatus, ExecutionSummary, SuiteReport, TestCaseResult},
    text::first_non_blank,
};
use camino::{Utf8Path, Utf8PathBuf};
use chrono::{DateTime, Local};
use format::{AttrEscaped, HtmlEscaped};
use swrite::{SWrite, swrite};

static STYLESHEET: &str = include_str!("render/report.css");
static FILTER_SCRIPT: &str = include_str!("render/filters.js");

const TITLE: &str = "Scenario Executive Summary";
const NO_MESSAGE: &str = "(no message)";

/// Scenario filters offered above the per-suite breakdown, as (filter value, button label).
const FILTERS: [(&str, &str); 4] = [
    ("ALL", "All"),
    ("FAIL", "Failed"),
    ("PASS", "Passed"),
    ("SKIP", "Skipped"),
];

/// Options for [`render`].
#[derive(Clone, Debug)]
pub struct RenderOptions<'a> {
    /// The directory the summary was collected from. Mentioned when no evidence file was found.
    pub input_dir: &'a Utf8Path,

    /// The file the report will be written to. The evidence link is made relative to its
    /// parent directory.
    pub output_file: &'a Utf8Path,

    /// The time shown as the generation timestamp.
    pub generated_at: DateTime<Local>,
}

/// Renders `summary` into an HTML document.
pub fn render(summary: &ExecutionSummary, options: &RenderOptions<'_>) -> String {
    let mut out = String::with_capacity(64 * 1024);

    swrite!(
        out,
        "<!doctype html>\n<html lang=\"en\">\n<head>\n\
         <meta charset=\"utf-8\"/>\n\
         <meta name=\"viewport\" content=\"width=device-width, initial-scale=1\"/>\n\
         <title>{TITLE}</title>\n<style>\n{STYLESHEET}</style>\n</head>\n<body>\n\
         <div class=\"container\">\n"
    );

    write_topbar(&mut out, summary, options);
    write_cards(&mut out, summary);
    write_evidence(&mut out, summary, options);
    write_suite_table(&mut out, summary.suites());
    write_top_failures(&mut out, summary);
    write_skipped_files(&mut out, summary);
    write_scenarios(&mut out, summary.suites());

    swrite!(
        out,
        "<div class=\"footer\">Generated by scenario-rollup</div>\n</div>\n\
         <script>\n{FILTER_SCRIPT}</script>\n</body>\n</html>\n"
    );
    out
}

/// Writes a rendered report to `output_file`, creating parent directories as needed.
pub fn write_report(html: &str, output_file: &Utf8Path) -> Result<(), WriteReportError> {
    if let Some(dir) = output_file.parent().filter(|dir| !dir.as_str().is_empty()) {
        std::fs::create_dir_all(dir).map_err(|error| WriteReportError::CreateDir {
            dir: dir.to_owned(),
            error,
        })?;
    }
    std::fs::write(output_file, html).map_err(|error| WriteReportError::Write {
        file: output_file.to_owned(),
        error,
    })
}

fn suite_anchor(index: usize) -> String {
    format!("suite-{index}")
}

fn write_topbar(out: &mut String, summary: &ExecutionSummary, options: &RenderOptions<'_>) {
    let context = summary.context();
    let status = summary.status();
    swrite!(
        out,
        "<div class=\"topbar\"><div class=\"title\"><h1>{TITLE}</h1><p>\
         Suite: <b>{}</b> \u{b7} Env: <b>{}</b> \u{b7} Service: <b>{}</b> \u{b7} Generated: <b>{}</b>\
         </p></div>",
        HtmlEscaped(&context.suite),
        HtmlEscaped(&context.env),
        HtmlEscaped(&context.service),
        options.generated_at.format("%Y-%m-%d %H:%M:%S"),
    );
    swrite!(
        out,
        "<div class=\"badge\"><span class=\"dot {}\"></span>{}</div></div>\n",
        status.css_class(),
        status.label(),
    );
}

fn write_cards(out: &mut String, summary: &ExecutionSummary) {
    let total = summary.total();
    let percent = |part| DisplayPercent { part, total };

    let failed_hint = if summary.failed() > 0 {
        format!("{} of total, needs attention", percent(summary.failed()))
    } else {
        "No failures".to_owned()
    };
    let skipped_hint = if summary.skipped() > 0 {
        format!("{} of total, filtered or conditional", percent(summary.skipped()))
    } else {
        "None".to_owned()
    };

    out.push_str("<div class=\"cards\">");
    write_card(out, "Total", &total.to_string(), "Scenarios counted");
    write_card(
        out,
        "Passed",
        &summary.passed().to_string(),
        &percent(summary.passed()).to_string(),
    );
    write_card(out, "Failed", &summary.failed().to_string(), &failed_hint);
    write_card(out, "Skipped", &summary.skipped().to_string(), &skipped_hint);
    write_card(
        out,
        "Duration",
        &DisplayClockDuration(summary.elapsed()).to_string(),
        "Summed suite time",
    );
    out.push_str("</div>\n");
}

fn write_card(out: &mut String, label: &str, value: &str, hint: &str) {
    swrite!(
        out,
        "<div class=\"card\"><p class=\"label\">{}</p><p class=\"value\">{}</p>\
         <p class=\"hint\">{}</p></div>",
        HtmlEscaped(label),
        HtmlEscaped(value),
        HtmlEscaped(hint),
    );
}

fn write_evidence(out: &mut String, summary: &ExecutionSummary, options: &RenderOptions<'_>) {
    out.push_str("<h2>Evidence</h2>\n<div class=\"card\">");
    match summary.evidence_file() {
        Some(evidence) => {
            let href = evidence_href(evidence, options.output_file);
            swrite!(
                out,
                "<span class=\"pill info\"><a href=\"{}\">Open the detailed HTML report</a></span>",
                AttrEscaped(&href),
            );
        }
        None => {
            swrite!(
                out,
                "<p class=\"muted\">No detailed report found (expected {} under {}).</p>",
                crate::aggregate::EVIDENCE_FILE_NAME,
                HtmlEscaped(options.input_dir.as_str()),
            );
        }
    }
    out.push_str("</div>\n");
}

/// Computes the link to the evidence file, relative to the directory the report is written to.
fn evidence_href(evidence: &Utf8Path, output_file: &Utf8Path) -> String {
    let relative = match (
        absolute(evidence),
        output_file.parent().and_then(absolute),
    ) {
        (Some(evidence), Some(output_dir)) => pathdiff::diff_utf8_paths(evidence, output_dir),
        _ => None,
    };
    relative
        .as_deref()
        .unwrap_or(evidence)
        .as_str()
        .replace('\\', "/")
}

fn absolute(path: &Utf8Path) -> Option<Utf8PathBuf> {
    let path = if path.as_str().is_empty() {
        Utf8Path::new(".")
    } else {
        path
    };
    std::path::absolute(path)
        .ok()
        .and_then(|path| Utf8PathBuf::from_path_buf(path).ok())
}

fn write_suite_table(out: &mut String, suites: &[SuiteReport]) {
    out.push_str(
        "<h2>Results by Suite</h2>\n<table><thead><tr><th>Suite</th><th>Status</th>\
         <th>Passed</th><th>Failed</th><th>Skipped</th><th>Duration</th></tr></thead><tbody>",
    );
    for (index, suite) in suites.iter().enumerate() {
        let status = suite.status();
        swrite!(
            out,
            "<tr><td><a href=\"#{}\">{}</a></td><td><span class=\"pill {}\">{}</span></td>\
             <td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>",
            suite_anchor(index),
            HtmlEscaped(suite.display_name()),
            status.css_class(),
            status.label(),
            suite.passed(),
            suite.failed(),
            suite.skipped(),
            DisplayClockDuration(suite.elapsed()),
        );
    }
    out.push_str("</tbody></table>\n");
}

fn write_top_failures(out: &mut String, summary: &ExecutionSummary) {
    out.push_str("<h2>Top Failures</h2>\n");
    let top = summary.top_failures();
    if top.is_empty() {
        out.push_str("<div class=\"card\"><p class=\"muted\">No failures detected.</p></div>\n");
        return;
    }

    out.push_str(
        "<table><thead><tr><th>Scenario</th><th>Suite</th><th>Reason</th><th>Time</th>\
         </tr></thead><tbody>",
    );
    for case in top {
        swrite!(
            out,
            "<tr><td>{}</td><td class=\"muted\">{}</td><td>{}</td><td>{}</td></tr>",
            HtmlEscaped(case.name()),
            HtmlEscaped(case.classname()),
            HtmlEscaped(reason(case)),
            DisplayClockDuration(case.elapsed()),
        );
    }
    swrite!(
        out,
        "</tbody></table>\n<div class=\"footer\">Showing {} of {} failing scenarios</div>\n",
        top.len(),
        summary.failures().len(),
    );
}

fn write_skipped_files(out: &mut String, summary: &ExecutionSummary) {
    let skipped = summary.skipped_files();
    if skipped.is_empty() {
        return;
    }
    out.push_str(
        "<h2>Skipped Result Files</h2>\n<div class=\"card\"><p class=\"muted\">\
         These files could not be read and are not counted above.</p><ul>",
    );
    for file in skipped {
        swrite!(
            out,
            "<li><code>{}</code>: {}</li>",
            HtmlEscaped(file.path.as_str()),
            HtmlEscaped(&file.reason),
        );
    }
    out.push_str("</ul></div>\n");
}

fn write_scenarios(out: &mut String, suites: &[SuiteReport]) {
    out.push_str("<h2>Scenario Results</h2>\n<div class=\"toolbar\"><div class=\"btn-group\">");
    for (filter, label) in FILTERS {
        swrite!(
            out,
            "<button class=\"btn\" data-filter=\"{filter}\">{label}</button>"
        );
    }
    out.push_str(
        "</div><input id=\"search\" class=\"search\" type=\"search\" \
         placeholder=\"Search scenario or suite\"/></div>\n",
    );

    for (index, suite) in suites.iter().enumerate() {
        let status = suite.status();
        swrite!(
            out,
            "<details class=\"suite\" open id=\"{}\"><summary>\
             <span class=\"sum-title\">{}</span><span class=\"sum-meta\">\
             <span class=\"pill {}\">{}</span><span class=\"meta\">P {}</span>\
             <span class=\"meta\">F {}</span><span class=\"meta\">S {}</span>\
             <span class=\"meta\">{}</span></span></summary>\n",
            suite_anchor(index),
            HtmlEscaped(suite.display_name()),
            status.css_class(),
            status.label(),
            suite.passed(),
            suite.failed(),
            suite.skipped(),
            DisplayClockDuration(suite.elapsed()),
        );
        out.push_str(
            "<table class=\"scenario-table\"><thead><tr><th>Status</th><th>Scenario</th>\
             <th>Duration</th><th>Reason</th></tr></thead><tbody>",
        );
        for case in suite.cases() {
            write_scenario_row(out, suite, case);
        }
        out.push_str("</tbody></table></details>\n");
    }
}

fn write_scenario_row(out: &mut String, suite: &SuiteReport, case: &TestCaseResult) {
    let status = case.status();
    let search_text = format!("{} {}", suite.display_name(), case.name()).to_lowercase();
    swrite!(
        out,
        "<tr class=\"sc-row\" data-status=\"{}\" data-text=\"{}\">\
         <td><span class=\"pill {}\">{}</span></td><td>{}</td><td>{}</td><td>",
        status.label(),
        AttrEscaped(&search_text),
        status.css_class(),
        status.label(),
        HtmlEscaped(case.name()),
        DisplayClockDuration(case.elapsed()),
    );

    if status == CaseStatus::Fail {
        swrite!(
            out,
            "<div class=\"reason\">{}</div>",
            HtmlEscaped(reason(case))
        );
        if !case.long_details().is_empty() {
            swrite!(
                out,
                "<details class=\"mini\"><summary>Details</summary>\
                 <pre class=\"details\">{}</pre></details>",
                HtmlEscaped(case.long_details()),
            );
        }
    } else {
        out.push_str("<span class=\"muted\">-</span>");
    }
    out.push_str("</td></tr>\n");
}

fn reason(case: &TestCaseResult) -> &str {
    first_non_blank([case.short_message(), NO_MESSAGE]).unwrap_or(NO_MESSAGE)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ContextGuess, SkippedFile};
    use std::time::Duration;

    fn options() -> RenderOptions<'static> {
        RenderOptions {
            input_dir: Utf8Path::new("target/reports"),
            output_file: Utf8Path::new("target/summary/index.html"),
            generated_at: Local::now(),
        }
    }

    fn failing_case(name: &str, message: &str) -> TestCaseResult {
        TestCaseResult::new(
            name,
            "orders",
            Duration::from_secs(1),
            CaseStatus::Fail,
            message,
            "",
            "a.xml",
        )
    }

    #[test]
    fn empty_summary() {
        let summary = ExecutionSummary::new(vec![], None, ContextGuess::default(), vec![]);
        let html = render(&summary, &options());
        assert!(html.contains("<span class=\"dot warn\"></span>NO TESTS"));
        assert!(html.contains("No failures detected."));
        assert!(html.contains("No detailed report found"));
        assert!(html.contains("target/reports"));
        assert!(!html.contains("Skipped Result Files"));
        assert!(html.contains(">0%<"));
    }

    #[test]
    fn failures_and_placeholders() {
        let cases: Vec<_> = (0..22)
            .map(|i| failing_case(&format!("case {i:02}"), ""))
            .collect();
        let suite = SuiteReport::new("orders", 22, 22, 0, Duration::from_secs(90), cases);
        let summary = ExecutionSummary::new(
            vec![suite],
            None,
            ContextGuess::default(),
            vec![SkippedFile {
                path: "bad.xml".into(),
                reason: "malformed XML at byte 3".to_owned(),
            }],
        );
        let html = render(&summary, &options());

        assert!(html.contains("Showing 20 of 22 failing scenarios"));
        assert!(html.contains(NO_MESSAGE));
        assert!(html.contains("id=\"suite-0\""));
        assert!(html.contains("href=\"#suite-0\""));
        assert!(html.contains("data-status=\"FAIL\" data-text=\"orders case 00\""));
        assert!(html.contains("<span class=\"dot bad\"></span>FAIL"));
        assert!(html.contains("01:30"));
        assert!(html.contains("Skipped Result Files"));
        assert!(html.contains("<code>bad.xml</code>"));
    }

    #[test]
    fn names_are_escaped() {
        let suite = SuiteReport::new(
            "<b>suite</b>",
            1,
            1,
            0,
            Duration::ZERO,
            vec![failing_case("<script>alert('x')</script>", "a < b")],
        );
        let summary = ExecutionSummary::new(vec![suite], None, ContextGuess::default(), vec![]);
        let html = render(&summary, &options());

        assert!(!html.contains("<script>alert"));
        assert!(!html.contains("<b>suite</b>"));
        assert!(html.contains("&lt;script&gt;alert('x')&lt;/script&gt;"));
        assert!(html.contains("alert(&#39;x&#39;)"), "attribute escaping");
        assert!(html.contains("a &lt; b"));
    }

    #[test]
    fn evidence_link_is_relative_to_output() {
        assert_eq!(
            evidence_href(
                Utf8Path::new("target/reports/smoke/dev/all/karate-summary.html"),
                Utf8Path::new("target/summary/index.html"),
            ),
            "../reports/smoke/dev/all/karate-summary.html"
        );
        assert_eq!(
            evidence_href(
                Utf8Path::new("karate-summary.html"),
                Utf8Path::new("index.html"),
            ),
            "karate-summary.html"
        );
    }
}
