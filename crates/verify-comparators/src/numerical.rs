//! Tolerance-based numerical comparison, semantically equivalent to
//! `numpy.allclose`: `|expected - actual| <= atol + rtol * |expected|`,
//! with NaN considered equal to NaN.

use serde_json::json;

use verify_core::{ComparisonMethod, ComparisonOptions, ComparisonOutcome};

use crate::numbers::parse_numbers;

const DEFAULT_RTOL: f64 = 1e-10;
const DEFAULT_ATOL: f64 = 1e-12;

pub fn compare(expected: &[u8], actual: &[u8], options: &ComparisonOptions) -> ComparisonOutcome {
    let rtol = options.rtol.unwrap_or(DEFAULT_RTOL);
    let atol = options.atol.unwrap_or(DEFAULT_ATOL);

    let expected_values = parse_numbers(expected);
    let actual_values = parse_numbers(actual);
    let count = expected_values.len().max(actual_values.len());

    if count == 0 {
        return ComparisonOutcome {
            matched: true,
            method: ComparisonMethod::NumericalTolerance,
            score: 1.0,
            details: json!({
                "max_relative_error": 0.0,
                "max_absolute_error": 0.0,
                "values_compared": 0,
                "mismatches": [],
            }),
        };
    }

    let pairs = expected_values.len().min(actual_values.len());
    let length_mismatch = expected_values.len() != actual_values.len();

    let mut mismatches = Vec::new();
    let mut max_abs_err = 0.0f64;
    let mut max_rel_err = 0.0f64;

    for i in 0..pairs {
        let exp_val = expected_values[i];
        let act_val = actual_values[i];
        let (abs_err, rel_err, ok) = values_close(exp_val, act_val, rtol, atol);
        max_abs_err = max_abs_err.max(abs_err);
        max_rel_err = max_rel_err.max(rel_err);
        if !ok {
            mismatches.push(json!({
                "index": i,
                "expected": format_value(exp_val),
                "actual": format_value(act_val),
                "absolute_error": abs_err,
                "relative_error": rel_err,
            }));
        }
    }

    if length_mismatch {
        let (longer, source) = if expected_values.len() > actual_values.len() {
            (&expected_values, "expected")
        } else {
            (&actual_values, "actual")
        };
        for i in pairs..longer.len() {
            mismatches.push(json!({
                "index": i,
                "expected": expected_values.get(i).map(|v| format_value(*v)).unwrap_or_else(|| json!("<missing>")),
                "actual": actual_values.get(i).map(|v| format_value(*v)).unwrap_or_else(|| json!("<missing>")),
                "absolute_error": f64::INFINITY,
                "relative_error": f64::INFINITY,
                "note": format!("value only present in {source}"),
            }));
        }
        max_abs_err = f64::INFINITY;
        max_rel_err = f64::INFINITY;
    }

    let matched = mismatches.is_empty();
    let score = if max_rel_err.is_infinite() || max_rel_err.is_nan() {
        0.0
    } else {
        (1.0 - max_rel_err).clamp(0.0, 1.0)
    };

    ComparisonOutcome {
        matched,
        method: ComparisonMethod::NumericalTolerance,
        score,
        details: json!({
            "max_relative_error": finite_or_marker(max_rel_err),
            "max_absolute_error": finite_or_marker(max_abs_err),
            "values_compared": count,
            "mismatches": mismatches,
        }),
    }
}

/// Returns `(absolute_error, relative_error, is_close)`.
fn values_close(expected: f64, actual: f64, rtol: f64, atol: f64) -> (f64, f64, bool) {
    if expected.is_nan() && actual.is_nan() {
        return (0.0, 0.0, true);
    }
    if expected.is_nan() || actual.is_nan() {
        return (f64::INFINITY, f64::INFINITY, false);
    }
    if expected == actual {
        return (0.0, 0.0, true);
    }
    if expected.is_infinite() || actual.is_infinite() {
        return (f64::INFINITY, f64::INFINITY, false);
    }

    let abs_err = (expected - actual).abs();
    let rel_err = if expected == 0.0 {
        abs_err
    } else {
        abs_err / expected.abs()
    };
    let ok = abs_err <= atol + rtol * expected.abs();
    (abs_err, rel_err, ok)
}

fn format_value(v: f64) -> serde_json::Value {
    if v.is_nan() {
        json!("NaN")
    } else if v.is_infinite() {
        json!(if v > 0.0 { "Infinity" } else { "-Infinity" })
    } else {
        json!(v)
    }
}

fn finite_or_marker(v: f64) -> serde_json::Value {
    if v.is_finite() { json!(v) } else { format_value(v) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matches_within_default_tolerance() {
        let expected = b"1.0\n2.0\n3.0\n";
        let actual = b"1.0000000001\n2.0000000001\n3.0\n";
        let result = compare(expected, actual, &ComparisonOptions::default());
        assert!(result.matched);
    }

    #[test]
    fn mismatch_outside_tolerance() {
        let expected = b"1.0\n2.0\n3.0\n";
        let actual = b"1.0\n2.0\n3.5\n";
        let result = compare(expected, actual, &ComparisonOptions::default());
        assert!(!result.matched);
    }

    #[test]
    fn identical_text_always_matches() {
        let text = b"1.0 2.0 3.0";
        let result = compare(text, text, &ComparisonOptions::default());
        assert!(result.matched);
        assert_eq!(result.score, 1.0);
    }

    #[test]
    fn nan_equals_nan() {
        let result = compare(b"nan", b"nan", &ComparisonOptions::default());
        assert!(result.matched);
    }

    #[test]
    fn mixed_nan_and_finite_mismatches() {
        let result = compare(b"nan", b"1.0", &ComparisonOptions::default());
        assert!(!result.matched);
    }

    #[test]
    fn same_sign_infinities_match() {
        let result = compare(b"inf", b"inf", &ComparisonOptions::default());
        assert!(result.matched);
    }

    #[test]
    fn opposite_sign_infinities_mismatch() {
        let result = compare(b"inf", b"-inf", &ComparisonOptions::default());
        assert!(!result.matched);
    }

    #[test]
    fn length_mismatch_is_a_failure() {
        let result = compare(b"1.0 2.0 3.0", b"1.0 2.0", &ComparisonOptions::default());
        assert!(!result.matched);
        assert_eq!(result.score, 0.0);
    }

    #[test]
    fn empty_on_both_sides_is_trivial_match() {
        let result = compare(b"", b"", &ComparisonOptions::default());
        assert!(result.matched);
        assert_eq!(result.score, 1.0);
    }
}
