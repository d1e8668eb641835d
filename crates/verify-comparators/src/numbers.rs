//! Shared number-extraction helpers for the numerical and statistical
//! comparators.
//!
//! Numbers are extracted from a byte payload using a liberal two-stage
//! strategy: try parsing the whole payload as JSON and collect every
//! numeric leaf (list elements, map values); if that fails or yields
//! nothing, fall back to a regex scan over the UTF-8-decoded text.

use std::sync::LazyLock;

use regex::Regex;

/// Matches a signed float/int literal, `inf`/`infinity`/`nan` (any case),
/// and Fortran-style exponents (`1.0D+02`).
static NUMBER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)[+-]?(?:inf(?:inity)?|nan|(?:\d+\.?\d*|\.\d+)(?:[edED][+-]?\d+)?)").unwrap()
});

/// Extract an ordered list of numbers from `data`: JSON numeric leaves if
/// the payload parses as JSON and yields at least one number, otherwise a
/// regex scan of the decoded text.
pub fn parse_numbers(data: &[u8]) -> Vec<f64> {
    let text = String::from_utf8_lossy(data);

    if let Ok(value) = serde_json::from_str::<serde_json::Value>(&text) {
        let mut acc = Vec::new();
        collect_json_numbers(&value, &mut acc);
        if !acc.is_empty() {
            return acc;
        }
    }

    NUMBER_RE
        .find_iter(&text)
        .filter_map(|m| to_float(m.as_str()))
        .collect()
}

/// Like [`parse_numbers`], but drops non-finite (NaN/inf) values.
pub fn parse_finite_numbers(data: &[u8]) -> Vec<f64> {
    parse_numbers(data).into_iter().filter(|v| v.is_finite()).collect()
}

fn collect_json_numbers(value: &serde_json::Value, acc: &mut Vec<f64>) {
    match value {
        serde_json::Value::Number(n) => {
            if let Some(f) = n.as_f64() {
                acc.push(f);
            }
        }
        serde_json::Value::Array(items) => {
            for item in items {
                collect_json_numbers(item, acc);
            }
        }
        serde_json::Value::Object(map) => {
            for v in map.values() {
                collect_json_numbers(v, acc);
            }
        }
        _ => {}
    }
}

/// Parse a single token to `f64`, converting Fortran-style `D`/`d`
/// exponent markers to `e` first.
fn to_float(token: &str) -> Option<f64> {
    let normalized: String = token
        .chars()
        .map(|c| if c == 'D' || c == 'd' { 'e' } else { c })
        .collect();
    normalized.parse().ok()
}
