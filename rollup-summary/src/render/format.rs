// Copyright (c) The scenario-rollup Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Display helpers for escaping, durations and percentages.

use std::{fmt, time::Duration};

/// Escapes `&`, `<`, `>` and `"` for use in HTML text.
pub fn escape_html(s: &str) -> String {
    HtmlEscaped(s).to_string()
}

/// Escapes text for use in a quoted HTML attribute. Also escapes `'`.
pub fn escape_attr(s: &str) -> String {
    AttrEscaped(s).to_string()
}

pub(super) struct HtmlEscaped<'a>(pub(super) &'a str);

impl fmt::Display for HtmlEscaped<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_escaped(f, self.0, false)
    }
}

pub(super) struct AttrEscaped<'a>(pub(super) &'a str);

impl fmt::Display for AttrEscaped<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_escaped(f, self.0, true)
    }
}

fn write_escaped(f: &mut fmt::Formatter<'_>, s: &str, attr: bool) -> fmt::Result {
    let mut last = 0;
    for (idx, c) in s.char_indices() {
        let replacement = match c {
            '&' => "&amp;",
            '<' => "&lt;",
            '>' => "&gt;",
            '"' => "&quot;",
            '\'' if attr => "&#39;",
            _ => continue,
        };
        f.write_str(&s[last..idx])?;
        f.write_str(replacement)?;
        last = idx + c.len_utf8();
    }
    f.write_str(&s[last..])
}

/// Displays a duration as `MM:SS`, or `H:MM:SS` once it reaches an hour.
///
/// Durations are rounded to the nearest second.
pub struct DisplayClockDuration(pub Duration);

impl fmt::Display for DisplayClockDuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let total_secs = (self.0.as_millis() + 500) / 1000;
        let secs = total_secs % 60;
        let total_mins = total_secs / 60;
        let mins = total_mins % 60;
        let hours = total_mins / 60;

        if hours > 0 {
            write!(f, "{hours}:{mins:02}:{secs:02}")
        } else {
            write!(f, "{mins:02}:{secs:02}")
        }
    }
}

/// Displays `100 * part / total` with one decimal place, or `0%` if `total` is zero.
pub struct DisplayPercent {
    /// The part.
    pub part: usize,

    /// The whole.
    pub total: usize,
}

impl fmt::Display for DisplayPercent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.total == 0 {
            return f.write_str("0%");
        }
        let pct = 100.0 * self.part as f64 / self.total as f64;
        write!(f, "{pct:.1}%")
    }
}
