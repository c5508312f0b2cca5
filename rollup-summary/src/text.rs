// Copyright (c) The scenario-rollup Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Text normalization shared by the summary model and console output.

/// Maximum length of a one-line failure message.
pub const SHORT_MESSAGE_MAX_CHARS: usize = 160;

/// Maximum length of the long failure details kept per test case.
pub const LONG_DETAILS_MAX_CHARS: usize = 1200;

const ELLIPSIS: &str = "...";

/// Collapses every run of whitespace into a single space and trims the result.
pub fn one_line(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Trims `s`, then truncates it to at most `max_chars` characters.
///
/// Truncated strings end in `...`, which counts towards `max_chars`.
pub fn truncate_with_ellipsis(s: &str, max_chars: usize) -> String {
    let trimmed = s.trim();
    if trimmed.chars().count() <= max_chars {
        return trimmed.to_owned();
    }
    let keep = max_chars.saturating_sub(ELLIPSIS.len());
    let mut out: String = trimmed.chars().take(keep).collect();
    out.push_str(ELLIPSIS);
    out
}

/// [`one_line`] followed by [`truncate_with_ellipsis`].
pub fn one_line_truncated(s: &str, max_chars: usize) -> String {
    truncate_with_ellipsis(&one_line(s), max_chars)
}

/// Returns the first value that isn't empty after trimming, trimmed.
pub fn first_non_blank<'a>(values: impl IntoIterator<Item = &'a str>) -> Option<&'a str> {
    values
        .into_iter()
        .map(str::trim)
        .find(|value| !value.is_empty())
}
