// Copyright (c) The scenario-rollup Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use camino::Utf8Path;
use camino_tempfile::tempdir;
use chrono::Local;
use color_eyre::eyre::Result;
use indoc::indoc;
use pretty_assertions::assert_eq;
use rollup_summary::{
    aggregate::collect,
    errors::CollectError,
    render::{RenderOptions, render, write_report},
    rollup::RollupStatus,
};
use std::time::Duration;

const SUITE_A: &str = indoc! {r#"
    <?xml version="1.0" encoding="UTF-8"?>
    <testsuite name="A" tests="3" failures="1" errors="0" skipped="0" time="12">
      <testcase name="a1" classname="A" time="4"/>
      <testcase name="a2" classname="A" time="4">
        <failure message="status code was 500">http 500 from /orders</failure>
      </testcase>
      <testcase name="a3" classname="A" time="4"/>
    </testsuite>
"#};

const SUITE_B: &str = indoc! {r#"
    <testsuites>
      <testsuite name="B" tests="2" failures="0" skipped="2" time="1">
        <testcase name="b1" classname="B"><skipped/></testcase>
        <testcase name="b2" classname="B"><skipped/></testcase>
      </testsuite>
    </testsuites>
"#};

fn write(path: &Utf8Path, contents: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, contents)?;
    Ok(())
}

#[test]
fn collect_two_suites() -> Result<()> {
    let dir = tempdir()?;
    let root = dir.path().join("karate-reports");
    let results = root.join("smoke/qa/orders");
    write(&results.join("TEST-b.xml"), SUITE_B)?;
    write(&results.join("TEST-a.XML"), SUITE_A)?;
    write(&results.join("karate-summary.html"), "<html></html>")?;
    write(&results.join("notes.txt"), "ignored")?;

    let summary = collect(&root)?;
    assert_eq!(summary.total(), 5);
    assert_eq!(summary.failed(), 1);
    assert_eq!(summary.skipped(), 2);
    assert_eq!(summary.passed(), 2);
    let names: Vec<_> = summary.suites().iter().map(|s| s.display_name()).collect();
    assert_eq!(names, ["A", "B"]);
    assert_eq!(summary.status(), RollupStatus::Unstable);
    assert_eq!(summary.suites()[1].status(), RollupStatus::AllSkipped);

    assert_eq!(summary.context().suite, "smoke");
    assert_eq!(summary.context().env, "qa");
    assert_eq!(summary.context().service, "orders");
    assert_eq!(
        summary.evidence_file(),
        Some(results.join("karate-summary.html").as_path())
    );
    assert!(summary.skipped_files().is_empty());

    let failures = summary.failures();
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].name(), "a2");
    assert_eq!(failures[0].short_message(), "status code was 500");
    Ok(())
}

#[test]
fn missing_root_is_fatal() -> Result<()> {
    let dir = tempdir()?;
    let root = dir.path().join("does-not-exist");
    let err = collect(&root).expect_err("missing root is an error");
    assert!(
        matches!(&err, CollectError::InputDirNotFound { path } if *path == root),
        "unexpected error: {err:?}"
    );
    assert!(err.to_string().contains(root.as_str()));
    Ok(())
}

#[test]
fn no_result_files_is_fatal() -> Result<()> {
    let dir = tempdir()?;
    write(&dir.path().join("a/readme.md"), "nothing here")?;
    let err = collect(dir.path()).expect_err("no result files is an error");
    assert!(
        matches!(err, CollectError::NoResultFiles { .. }),
        "unexpected error: {err:?}"
    );
    Ok(())
}

#[test]
fn malformed_files_are_skipped() -> Result<()> {
    let dir = tempdir()?;
    let root = dir.path();
    write(&root.join("a.xml"), SUITE_A)?;
    write(
        &root.join("b.xml"),
        r#"<!DOCTYPE testsuite><testsuite name="x" tests="1"/>"#,
    )?;
    write(&root.join("c.xml"), "<testsuite name=\"c\"><testcase>")?;

    let summary = collect(root)?;
    assert_eq!(summary.total(), 3);
    let skipped: Vec<_> = summary
        .skipped_files()
        .iter()
        .map(|file| file.path.file_name().unwrap_or_default())
        .collect();
    assert_eq!(skipped, ["b.xml", "c.xml"]);
    assert!(
        summary.skipped_files()[0]
            .reason
            .contains("document type declarations are not allowed")
    );
    assert_eq!(summary.context().suite, "unknown");
    Ok(())
}

#[test]
fn render_and_write() -> Result<()> {
    let dir = tempdir()?;
    let root = dir.path().join("reports");
    write(
        &root.join("s/e/svc/TEST-x.xml"),
        indoc! {r#"
            <testsuite name="checkout &lt;beta&gt;" tests="1" failures="1">
              <testcase name="&lt;script&gt;alert(1)&lt;/script&gt;" time="3700">
                <failure message="boom"/>
              </testcase>
            </testsuite>
        "#},
    )?;
    let summary = collect(&root)?;

    let output_file = dir.path().join("out/nested/index.html");
    let html = render(
        &summary,
        &RenderOptions {
            input_dir: &root,
            output_file: &output_file,
            generated_at: Local::now(),
        },
    );
    write_report(&html, &output_file)?;

    let written = std::fs::read_to_string(&output_file)?;
    assert_eq!(written, html);
    assert!(!written.contains("<script>alert(1)"));
    assert!(written.contains("&lt;script&gt;alert(1)&lt;/script&gt;"));
    assert!(written.contains("checkout &lt;beta&gt;"));
    assert!(written.contains("1:01:40"));
    assert!(written.contains("Suite: <b>s</b>"));
    Ok(())
}

#[test]
fn huge_totals_saturate() -> Result<()> {
    let dir = tempdir()?;
    let root = dir.path().join("reports");
    for name in ["x", "y", "z"] {
        write(
            &root.join(format!("TEST-{name}.xml")),
            &format!(
                r#"<testsuite name="{name}" tests="9223372036854775807" time="1e19"><testcase name="c"/></testsuite>"#
            ),
        )?;
    }

    let summary = collect(&root)?;
    assert!(summary.skipped_files().is_empty());
    assert_eq!(summary.suites().len(), 3);
    assert_eq!(summary.elapsed(), Duration::MAX);
    if cfg!(target_pointer_width = "64") {
        assert_eq!(summary.total(), usize::MAX);
        assert_eq!(summary.passed(), usize::MAX);
    }
    assert_eq!(summary.status(), RollupStatus::Pass);

    let output_file = dir.path().join("index.html");
    let html = render(
        &summary,
        &RenderOptions {
            input_dir: &root,
            output_file: &output_file,
            generated_at: Local::now(),
        },
    );
    assert!(html.contains("<html"));
    Ok(())
}

#[cfg(target_os = "linux")]
#[test]
fn non_utf8_result_paths_are_skipped() -> Result<()> {
    use std::{ffi::OsStr, os::unix::ffi::OsStrExt};

    let dir = tempdir()?;
    let root = dir.path();
    write(&root.join("a.xml"), SUITE_A)?;
    let bad_name = OsStr::from_bytes(b"b-\xff.xml");
    std::fs::write(root.as_std_path().join(bad_name), SUITE_B)?;
    std::fs::write(root.as_std_path().join(OsStr::from_bytes(b"c-\xff.txt")), "ignored")?;

    let summary = collect(root)?;
    assert_eq!(summary.total(), 3);
    assert_eq!(summary.skipped_files().len(), 1);
    let skipped = &summary.skipped_files()[0];
    assert!(skipped.path.as_str().ends_with("b-\u{fffd}.xml"), "{}", skipped.path);
    assert_eq!(skipped.reason, "path is not valid UTF-8");
    Ok(())
}
