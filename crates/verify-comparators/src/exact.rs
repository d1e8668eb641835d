//! Bit-for-bit (and text-aware) exact comparison.
//!
//! Two comparison strategies are attempted in order:
//!
//! 1. **Text mode** -- if both inputs are valid UTF-8, decode them, strip
//!    trailing whitespace from every line and trailing blank lines from the
//!    whole string, then compare.  This avoids false negatives caused by
//!    editors or runners appending/trimming whitespace.
//! 2. **Binary mode** -- fall back to raw byte-for-byte comparison.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::json;

use verify_core::{ComparisonMethod, ComparisonOptions, ComparisonOutcome};

/// Line-boundary set matching Python's `str.splitlines()`: `\r\n` as a
/// single boundary, plus `\n`, `\r`, `\v`, `\f`, `\x1c`-`\x1e`, NEL (`\x85`),
/// and the Unicode line/paragraph separators.
static LINE_BOUNDARY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\r\n|[\n\r\x0b\x0c\x1c\x1d\x1e\u{85}\u{2028}\u{2029}]").unwrap());

pub fn compare(expected: &[u8], actual: &[u8], _options: &ComparisonOptions) -> ComparisonOutcome {
    let (matched, mode) = match (std::str::from_utf8(expected), std::str::from_utf8(actual)) {
        (Ok(expected_text), Ok(actual_text)) => (
            normalize_text(expected_text) == normalize_text(actual_text),
            "text",
        ),
        _ => (expected == actual, "binary"),
    };

    ComparisonOutcome {
        matched,
        method: ComparisonMethod::Exact,
        score: if matched { 1.0 } else { 0.0 },
        details: json!({
            "mode": mode,
            "byte_length_expected": expected.len(),
            "byte_length_actual": actual.len(),
        }),
    }
}

/// Strip trailing whitespace from each line and trailing blank lines, then
/// rejoin with `\n`. Does not canonicalize CRLF to LF beyond what
/// line-boundary splitting already does.
fn normalize_text(text: &str) -> String {
    let mut lines: Vec<&str> = Vec::new();
    let mut last_end = 0;
    for boundary in LINE_BOUNDARY_RE.find_iter(text) {
        lines.push(text[last_end..boundary.start()].trim_end());
        last_end = boundary.end();
    }
    if last_end < text.len() {
        lines.push(text[last_end..].trim_end());
    }
    while lines.last().is_some_and(|line| line.is_empty()) {
        lines.pop();
    }
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_bytes_match() {
        let result = compare(b"hello", b"hello", &ComparisonOptions::default());
        assert!(result.matched);
        assert_eq!(result.score, 1.0);
    }

    #[test]
    fn ignores_trailing_line_whitespace() {
        let expected = b"line one\nline two\n";
        let actual = b"line one  \nline two\t\n\n\n";
        let result = compare(expected, actual, &ComparisonOptions::default());
        assert!(result.matched);
    }

    #[test]
    fn splits_on_vertical_tab_and_unicode_line_separator() {
        let expected = "line one\x0bline two\u{2028}line three";
        let actual = "line one\nline two\nline three";
        let result = compare(expected.as_bytes(), actual.as_bytes(), &ComparisonOptions::default());
        assert!(result.matched);
    }

    #[test]
    fn mismatched_text_fails() {
        let result = compare(b"1\n2\n3\n", b"1\n2\n4\n", &ComparisonOptions::default());
        assert!(!result.matched);
        assert_eq!(result.score, 0.0);
    }

    #[test]
    fn falls_back_to_binary_mode_on_invalid_utf8() {
        let expected = [0xff, 0xfe, 0x00];
        let actual = [0xff, 0xfe, 0x00];
        let result = compare(&expected, &actual, &ComparisonOptions::default());
        assert!(result.matched);
        assert_eq!(result.details["mode"], "binary");
    }

    #[test]
    fn binary_mismatch_fails() {
        let result = compare(&[0xff, 0x00], &[0xff, 0x01], &ComparisonOptions::default());
        assert!(!result.matched);
    }
}
