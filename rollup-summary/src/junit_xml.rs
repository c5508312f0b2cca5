// Copyright (c) The scenario-rollup Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Reading JUnit-style XML result files.
//!
//! Files are read into a small element tree with [`quick_xml`], then normalized into
//! [`SuiteReport`]s. A root `<testsuite>` and a `<testsuites>` container (with arbitrarily nested
//! suites) produce the same shape of output: one report per `<testsuite>` element, each owning
//! the `<testcase>` elements that aren't inside a nested suite.
//!
//! Parsing is deliberately strict about untrusted input: document type declarations are rejected
//! outright, so no entities beyond the five predefined ones are ever expanded.

use crate::{
    errors::ResultFileError,
    model::{CaseStatus, SuiteReport, TestCaseResult, duration_from_secs},
    text::first_non_blank,
};
use camino::Utf8Path;
use quick_xml::{
    Reader,
    events::{BytesStart, Event},
};

const TESTSUITE: &str = "testsuite";
const TESTCASE: &str = "testcase";

/// Reads and parses the result file at `path`.
///
/// The file is decoded according to its byte order mark or the `encoding` in its XML
/// declaration, defaulting to UTF-8.
pub fn parse_file(path: &Utf8Path) -> Result<Vec<SuiteReport>, ResultFileError> {
    let contents = std::fs::read(path).map_err(ResultFileError::Read)?;
    parse_report_bytes(&contents, path)
}

/// Parses the contents of a result file.
///
/// `source` is recorded on every test case, and its file name is used for suites without a
/// `name` attribute. Suites with a total of zero are dropped.
pub fn parse_report(contents: &str, source: &Utf8Path) -> Result<Vec<SuiteReport>, ResultFileError> {
    Ok(build_suites(read_tree(Reader::from_str(contents))?, source))
}

/// Like [`parse_report`], but for raw bytes in any ASCII-compatible encoding the document
/// declares.
pub fn parse_report_bytes(
    contents: &[u8],
    source: &Utf8Path,
) -> Result<Vec<SuiteReport>, ResultFileError> {
    Ok(build_suites(read_tree(Reader::from_reader(contents))?, source))
}

fn build_suites(root: Element, source: &Utf8Path) -> Vec<SuiteReport> {
    let mut suite_elements = Vec::new();
    find_suites(&root, &mut suite_elements);

    suite_elements
        .into_iter()
        .map(|element| build_suite(element, source))
        .filter(|suite| {
            let keep = suite.total() > 0;
            if !keep {
                tracing::debug!(
                    "dropping empty suite `{}` from {source}",
                    suite.display_name()
                );
            }
            keep
        })
        .collect()
}

#[derive(Debug, Default)]
struct Element {
    name: String,
    attributes: Vec<(String, String)>,
    children: Vec<Element>,
    text: String,
}

impl Element {
    fn from_start(
        start: &BytesStart<'_>,
        reader: &Reader<&[u8]>,
        position: usize,
    ) -> Result<Self, ResultFileError> {
        let xml_err = |error: quick_xml::Error| ResultFileError::Xml { position, error };
        let decoder = reader.decoder();

        let name = decoder.decode(start.name().as_ref()).map_err(xml_err)?.into_owned();
        let mut attributes = Vec::new();
        for attr in start.attributes() {
            let attr = attr.map_err(|error| xml_err(error.into()))?;
            let key = decoder.decode(attr.key.as_ref()).map_err(xml_err)?.into_owned();
            let value = attr
                .decode_and_unescape_value(reader)
                .map_err(xml_err)?
                .into_owned();
            attributes.push((key, value));
        }

        Ok(Self {
            name,
            attributes,
            ..Default::default()
        })
    }

    /// Returns the trimmed value of an attribute, or an empty string if it's missing.
    fn attr(&self, name: &str) -> &str {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map_or("", |(_, value)| value.trim())
    }

    fn count_attr(&self, name: &str) -> usize {
        self.attr(name)
            .parse::<i64>()
            .ok()
            .and_then(|n| usize::try_from(n).ok())
            .unwrap_or(0)
    }

    fn secs_attr(&self, name: &str) -> f64 {
        self.attr(name).parse().unwrap_or(0.0)
    }

    fn child(&self, name: &str) -> Option<&Element> {
        self.children.iter().find(|child| child.name == name)
    }

    /// All text within this element and its descendants, trimmed.
    fn text_content(&self) -> String {
        fn push_text(element: &Element, out: &mut String) {
            out.push_str(&element.text);
            for child in &element.children {
                push_text(child, out);
            }
        }

        let mut out = String::new();
        push_text(self, &mut out);
        out.trim().to_owned()
    }
}

fn read_tree(mut reader: Reader<&[u8]>) -> Result<Element, ResultFileError> {
    reader.trim_text(true);

    let mut stack: Vec<Element> = Vec::new();
    let mut root = None;

    loop {
        let position = reader.buffer_position();
        let event = match reader.read_event() {
            Ok(event) => event,
            Err(error) => {
                return Err(ResultFileError::Xml {
                    position: reader.buffer_position(),
                    error,
                });
            }
        };
        let xml_err = |error: quick_xml::Error| ResultFileError::Xml { position, error };

        match event {
            Event::Start(start) => stack.push(Element::from_start(&start, &reader, position)?),
            Event::Empty(start) => {
                let element = Element::from_start(&start, &reader, position)?;
                attach(&mut stack, &mut root, element)?;
            }
            Event::End(_) => {
                // Mismatched end tags are reported by the reader itself.
                if let Some(element) = stack.pop() {
                    attach(&mut stack, &mut root, element)?;
                }
            }
            Event::Text(text) => {
                let text = text.unescape().map_err(xml_err)?;
                if let Some(current) = stack.last_mut() {
                    current.text.push_str(&text);
                }
            }
            Event::CData(cdata) => {
                let text = reader.decoder().decode(&cdata).map_err(xml_err)?;
                if let Some(current) = stack.last_mut() {
                    current.text.push_str(&text);
                }
            }
            Event::DocType(_) => return Err(ResultFileError::DocTypeNotAllowed),
            Event::Decl(_) | Event::PI(_) | Event::Comment(_) => {}
            Event::Eof => break,
        }
    }

    if !stack.is_empty() {
        return Err(ResultFileError::Truncated { open: stack.len() });
    }
    root.ok_or(ResultFileError::Empty)
}

fn attach(
    stack: &mut [Element],
    root: &mut Option<Element>,
    element: Element,
) -> Result<(), ResultFileError> {
    match stack.last_mut() {
        Some(parent) => parent.children.push(element),
        None if root.is_none() => *root = Some(element),
        None => return Err(ResultFileError::MultipleRoots),
    }
    Ok(())
}

/// Collects every `<testsuite>` element in document order, at any depth.
fn find_suites<'a>(element: &'a Element, out: &mut Vec<&'a Element>) {
    if element.name == TESTSUITE {
        out.push(element);
    }
    for child in &element.children {
        find_suites(child, out);
    }
}

/// Collects the `<testcase>` elements owned by a suite, without crossing into nested suites.
fn find_cases<'a>(element: &'a Element, out: &mut Vec<&'a Element>) {
    for child in &element.children {
        if child.name == TESTCASE {
            out.push(child);
        } else if child.name != TESTSUITE {
            find_cases(child, out);
        }
    }
}

fn build_suite(element: &Element, source: &Utf8Path) -> SuiteReport {
    let display_name = match element.attr("name") {
        "" => source.file_name().unwrap_or(source.as_str()),
        name => name,
    };

    let mut case_elements = Vec::new();
    find_cases(element, &mut case_elements);
    let cases: Vec<_> = case_elements
        .into_iter()
        .map(|case| build_case(case, source))
        .collect();

    let total = match element.count_attr("tests") {
        0 => cases.len(),
        tests => tests,
    };
    let failed = element
        .count_attr("failures")
        .saturating_add(element.count_attr("errors"));

    SuiteReport::new(
        display_name,
        total,
        failed,
        element.count_attr("skipped"),
        duration_from_secs(element.secs_attr("time")),
        cases,
    )
}

fn build_case(element: &Element, source: &Utf8Path) -> TestCaseResult {
    // Precedence: skipped, then failure, then error.
    let marker = element
        .child("skipped")
        .map(|marker| (CaseStatus::Skip, marker))
        .or_else(|| element.child("failure").map(|marker| (CaseStatus::Fail, marker)))
        .or_else(|| element.child("error").map(|marker| (CaseStatus::Fail, marker)));

    let (status, message, details) = match marker {
        Some((status, marker)) => {
            let details = marker.text_content();
            let message = first_non_blank([marker.attr("message"), details.as_str()])
                .unwrap_or_default()
                .to_owned();
            (status, message, details)
        }
        None => (CaseStatus::Pass, String::new(), String::new()),
    };

    TestCaseResult::new(
        element.attr("name"),
        element.attr("classname"),
        duration_from_secs(element.secs_attr("time")),
        status,
        &message,
        &details,
        source,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;
    use pretty_assertions::assert_eq;
    use std::time::Duration;
    use test_case::test_case;

    fn parse(contents: &str) -> Result<Vec<SuiteReport>, ResultFileError> {
        parse_report(contents, Utf8Path::new("reports/smoke/TEST-orders.xml"))
    }

    #[test]
    fn single_suite_root() {
        let suites = parse(indoc! {r#"
            <?xml version="1.0" encoding="UTF-8"?>
            <testsuite name="orders.feature" tests="4" failures="1" errors="1" skipped="1" time="2.5">
              <testcase name="create order" classname="orders" time="0.5"/>
              <testcase name="cancel order" classname="orders" time="1.25">
                <failure message="match failed: expected 200">stack line 1
            stack line 2</failure>
              </testcase>
              <testcase name="refund" classname="orders" time="0.25">
                <error>timeout after 30s</error>
              </testcase>
              <testcase name="later" classname="orders">
                <skipped/>
              </testcase>
            </testsuite>
        "#})
        .expect("parsed successfully");

        assert_eq!(suites.len(), 1);
        let suite = &suites[0];
        assert_eq!(suite.display_name(), "orders.feature");
        assert_eq!(suite.total(), 4);
        assert_eq!(suite.failed(), 2);
        assert_eq!(suite.skipped(), 1);
        assert_eq!(suite.passed(), 1);
        assert_eq!(suite.elapsed(), Duration::from_millis(2500));

        let statuses: Vec<_> = suite.cases().iter().map(|c| c.status()).collect();
        assert_eq!(
            statuses,
            [
                CaseStatus::Pass,
                CaseStatus::Fail,
                CaseStatus::Fail,
                CaseStatus::Skip
            ]
        );

        let cancel = &suite.cases()[1];
        assert_eq!(cancel.short_message(), "match failed: expected 200");
        assert_eq!(cancel.long_details(), "stack line 1\nstack line 2");
        assert_eq!(cancel.source_file(), "reports/smoke/TEST-orders.xml");

        // Without a message attribute, the text is used.
        assert_eq!(suite.cases()[2].short_message(), "timeout after 30s");
    }

    #[test]
    fn container_with_nested_suites() {
        let suites = parse(indoc! {r#"
            <testsuites>
              <testsuite name="outer" tests="1">
                <testcase name="outer case"/>
                <testsuite name="inner" tests="2">
                  <testcase name="inner 1"/>
                  <testcase name="inner 2"><failure message="boom"/></testcase>
                </testsuite>
              </testsuite>
              <testsuite name="empty" tests="0"/>
            </testsuites>
        "#})
        .expect("parsed successfully");

        let names: Vec<_> = suites.iter().map(|s| s.display_name()).collect();
        assert_eq!(names, ["outer", "inner"]);
        assert_eq!(suites[0].cases().len(), 1);
        assert_eq!(suites[1].cases().len(), 2);
    }

    #[test]
    fn missing_counts_fall_back_to_cases() {
        let suites = parse(indoc! {r#"
            <testsuite tests="bogus" failures="-3">
              <testcase name="a"/>
              <testcase name="b"/>
            </testsuite>
        "#})
        .expect("parsed successfully");

        assert_eq!(suites[0].display_name(), "TEST-orders.xml");
        assert_eq!(suites[0].total(), 2);
        assert_eq!(suites[0].failed(), 0);
    }

    #[test]
    fn skipped_beats_failure() {
        let suites = parse(indoc! {r#"
            <testsuite name="s" tests="1">
              <testcase name="both"><failure message="f"/><skipped message="not today"/></testcase>
            </testsuite>
        "#})
        .expect("parsed successfully");

        let case = &suites[0].cases()[0];
        assert_eq!(case.status(), CaseStatus::Skip);
        assert_eq!(case.short_message(), "not today");
    }

    #[test]
    fn cdata_and_entities() {
        let suites = parse(indoc! {r#"
            <testsuite name="a &amp; b" tests="1">
              <testcase name="x"><failure><![CDATA[<html> & stuff]]></failure></testcase>
            </testsuite>
        "#})
        .expect("parsed successfully");

        assert_eq!(suites[0].display_name(), "a & b");
        assert_eq!(suites[0].cases()[0].short_message(), "<html> & stuff");
    }

    #[test]
    fn declared_encoding_is_honored() {
        let text = indoc! {r#"
            <?xml version="1.0" encoding="ISO-8859-1"?>
            <testsuite name="café" tests="1" failures="1">
              <testcase name="résumé"><failure message="déjà vu"/></testcase>
            </testsuite>
        "#};
        let latin1: Vec<u8> = text
            .chars()
            .map(|c| u8::try_from(u32::from(c)).expect("text is Latin-1"))
            .collect();
        assert!(std::str::from_utf8(&latin1).is_err(), "input is not UTF-8");

        let suites = parse_report_bytes(&latin1, Utf8Path::new("TEST-cafe.xml"))
            .expect("parsed successfully");
        assert_eq!(suites[0].display_name(), "café");
        assert_eq!(suites[0].failed(), 1);
        let case = &suites[0].cases()[0];
        assert_eq!(case.name(), "résumé");
        assert_eq!(case.short_message(), "déjà vu");
    }

    #[test_case(
        r#"<!DOCTYPE foo [<!ENTITY xxe SYSTEM "file:///etc/passwd">]><testsuite name="&xxe;"/>"# ;
        "doctype"
    )]
    #[test_case(r#"<testsuite name="a"><testcase></testsuite>"# ; "mismatched end")]
    #[test_case(r#"<testsuite name="a"><testcase>"# ; "truncated")]
    #[test_case(r#"<testsuite name="&bogus;"/>"# ; "unknown entity")]
    #[test_case("" ; "empty")]
    #[test_case(r#"<testsuite tests="1"/><testsuite tests="1"/>"# ; "two roots")]
    fn rejects_malformed(contents: &str) {
        parse(contents).expect_err("malformed input is rejected");
    }

    #[test]
    fn doctype_error_kind() {
        let err = parse("<!DOCTYPE testsuite><testsuite/>").expect_err("doctype is rejected");
        assert!(
            matches!(err, ResultFileError::DocTypeNotAllowed),
            "unexpected error: {err:?}"
        );
    }
}
