//! Distribution equivalence via summary statistics (mean, population std,
//! min, max, median) plus an informational two-sample KS statistic.
//!
//! The verdict never depends on the KS statistic -- it is computed and
//! exposed in `details` only, to preserve backward-compatible output
//! without tying the pass/fail decision to a second threshold.

use serde_json::json;

use verify_core::{ComparisonMethod, ComparisonOptions, ComparisonOutcome};

use crate::numbers::parse_finite_numbers;

const DEFAULT_SIGNIFICANCE: f64 = 0.05;

pub fn compare(expected: &[u8], actual: &[u8], options: &ComparisonOptions) -> ComparisonOutcome {
    let significance = options.significance_level.unwrap_or(DEFAULT_SIGNIFICANCE);

    let expected_values = parse_finite_numbers(expected);
    let actual_values = parse_finite_numbers(actual);

    if expected_values.is_empty() && actual_values.is_empty() {
        return ComparisonOutcome {
            matched: true,
            method: ComparisonMethod::Statistical,
            score: 1.0,
            details: json!({ "note": "both outputs produced no finite numbers" }),
        };
    }
    if expected_values.is_empty() || actual_values.is_empty() {
        return ComparisonOutcome {
            matched: false,
            method: ComparisonMethod::Statistical,
            score: 0.0,
            details: json!({
                "note": "one output produced no finite numbers",
                "expected_count": expected_values.len(),
                "actual_count": actual_values.len(),
            }),
        };
    }

    let exp_stats = Summary::of(&expected_values);
    let act_stats = Summary::of(&actual_values);

    let named = [
        ("mean", exp_stats.mean, act_stats.mean),
        ("std", exp_stats.std, act_stats.std),
        ("min", exp_stats.min, act_stats.min),
        ("max", exp_stats.max, act_stats.max),
        ("median", exp_stats.median, act_stats.median),
    ];

    let mut deviations = serde_json::Map::new();
    let mut max_deviation = 0.0f64;
    let mut details = serde_json::Map::new();
    details.insert("count_expected".into(), json!(expected_values.len()));
    details.insert("count_actual".into(), json!(actual_values.len()));

    for (name, exp_val, act_val) in named {
        details.insert(format!("{name}_expected"), json!(exp_val));
        details.insert(format!("{name}_actual"), json!(act_val));
        let dev = normalized_deviation(exp_val, act_val);
        deviations.insert(name.to_string(), json!(dev));
        max_deviation = max_deviation.max(dev);
    }
    details.insert("deviations".into(), serde_json::Value::Object(deviations));
    details.insert("max_deviation".into(), json!(max_deviation));
    details.insert(
        "ks_statistic".into(),
        json!(ks_statistic(&expected_values, &actual_values)),
    );

    let matched = max_deviation <= significance;
    let score = if max_deviation.is_infinite() || max_deviation.is_nan() {
        0.0
    } else {
        (1.0 - max_deviation).clamp(0.0, 1.0)
    };

    ComparisonOutcome {
        matched,
        method: ComparisonMethod::Statistical,
        score,
        details: serde_json::Value::Object(details),
    }
}

struct Summary {
    mean: f64,
    std: f64,
    min: f64,
    max: f64,
    median: f64,
}

impl Summary {
    fn of(values: &[f64]) -> Self {
        let n = values.len();
        let mean = values.iter().sum::<f64>() / n as f64;
        let min = values.iter().cloned().fold(f64::INFINITY, f64::min);
        let max = values.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
        let variance = values.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / n as f64;
        let std = variance.sqrt();

        let mut sorted = values.to_vec();
        sorted.sort_by(|a, b| a.partial_cmp(b).unwrap());
        let median = if n % 2 == 1 {
            sorted[n / 2]
        } else {
            (sorted[n / 2 - 1] + sorted[n / 2]) / 2.0
        };

        Self { mean, std, min, max, median }
    }
}

/// `|expected - actual| / max(|expected|, |actual|, 1)`.
fn normalized_deviation(expected: f64, actual: f64) -> f64 {
    if expected == actual {
        return 0.0;
    }
    let diff = (expected - actual).abs();
    let scale = expected.abs().max(actual.abs()).max(1.0);
    diff / scale
}

/// Two-sample KS statistic: the maximum absolute difference between the
/// empirical CDFs, computed via a linear merge of the two sorted samples.
fn ks_statistic(a: &[f64], b: &[f64]) -> f64 {
    let mut sorted_a = a.to_vec();
    let mut sorted_b = b.to_vec();
    sorted_a.sort_by(|x, y| x.partial_cmp(y).unwrap());
    sorted_b.sort_by(|x, y| x.partial_cmp(y).unwrap());

    let (na, nb) = (sorted_a.len(), sorted_b.len());
    let (mut ia, mut ib) = (0usize, 0usize);
    let mut max_diff = 0.0f64;

    while ia < na && ib < nb {
        if sorted_a[ia] < sorted_b[ib] {
            ia += 1;
        } else if sorted_b[ib] < sorted_a[ia] {
            ib += 1;
        } else {
            ia += 1;
            ib += 1;
        }
        let cdf_a = ia as f64 / na as f64;
        let cdf_b = ib as f64 / nb as f64;
        max_diff = max_diff.max((cdf_a - cdf_b).abs());
    }

    max_diff
}
