//! Output comparison algorithms (C4): exact, numerical-tolerance,
//! statistical, and byte-similarity ("perceptual hash").
//!
//! Each method is a small stateless struct implementing
//! [`verify_core::Comparator`]; [`get_comparator`] dispatches on
//! [`ComparisonMethod`] via a static match, the same enum-keyed
//! dispatch style used for executor backends, rather than a runtime
//! trait-object registry.

mod exact;
mod numbers;
mod numerical;
mod perceptual;
mod statistical;

use verify_core::{Comparator, ComparisonMethod, ComparisonOptions, ComparisonOutcome};

pub struct ExactComparator;
impl Comparator for ExactComparator {
    fn compare(&self, expected: &[u8], actual: &[u8], options: &ComparisonOptions) -> ComparisonOutcome {
        exact::compare(expected, actual, options)
    }
}

pub struct NumericalToleranceComparator;
impl Comparator for NumericalToleranceComparator {
    fn compare(&self, expected: &[u8], actual: &[u8], options: &ComparisonOptions) -> ComparisonOutcome {
        numerical::compare(expected, actual, options)
    }
}

pub struct StatisticalComparator;
impl Comparator for StatisticalComparator {
    fn compare(&self, expected: &[u8], actual: &[u8], options: &ComparisonOptions) -> ComparisonOutcome {
        statistical::compare(expected, actual, options)
    }
}

pub struct PerceptualHashComparator;
impl Comparator for PerceptualHashComparator {
    fn compare(&self, expected: &[u8], actual: &[u8], options: &ComparisonOptions) -> ComparisonOutcome {
        perceptual::compare(expected, actual, options)
    }
}

/// Select the comparator implementation for `method`.
///
/// Every variant of [`ComparisonMethod`] is handled; there is no "unknown
/// method" runtime case because the enum is closed -- callers that need to
/// look up a method from a string should fail at deserialization, not here.
pub fn get_comparator(method: ComparisonMethod) -> &'static dyn Comparator {
    match method {
        ComparisonMethod::Exact => &ExactComparator,
        ComparisonMethod::NumericalTolerance => &NumericalToleranceComparator,
        ComparisonMethod::Statistical => &StatisticalComparator,
        ComparisonMethod::PerceptualHash => &PerceptualHashComparator,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dispatches_to_matching_method() {
        let outcome = get_comparator(ComparisonMethod::Exact).compare(
            b"same",
            b"same",
            &ComparisonOptions::default(),
        );
        assert_eq!(outcome.method, ComparisonMethod::Exact);
        assert!(outcome.matched);
    }

    #[test]
    fn every_method_round_trips_identical_input() {
        for method in [
            ComparisonMethod::Exact,
            ComparisonMethod::NumericalTolerance,
            ComparisonMethod::Statistical,
            ComparisonMethod::PerceptualHash,
        ] {
            let outcome = get_comparator(method).compare(b"1.0 2.0 3.0", b"1.0 2.0 3.0", &ComparisonOptions::default());
            assert!(outcome.matched, "{method:?} should match identical input");
        }
    }
}
