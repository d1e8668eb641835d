//! The `Comparator` trait: compares an expected output artifact against the
//! actual bytes a runner produced.

use crate::enums::ComparisonMethod;

/// Method-specific knobs forwarded to [`Comparator::compare`].
///
/// `tolerance` comes from [`crate::job::ExpectedOutput::tolerance`] and is
/// carried here for interface symmetry with the job model, but none of the
/// four shipped comparators currently read it — each reads its own named
/// option (`rtol`/`atol`, `significance_level`, `threshold`) with a built-in
/// default instead. Exact equality ignores all of these.
#[derive(Debug, Clone, Copy, Default)]
pub struct ComparisonOptions {
    pub tolerance: Option<f64>,
    pub rtol: Option<f64>,
    pub atol: Option<f64>,
    pub significance_level: Option<f64>,
    pub threshold: Option<f64>,
}

/// Outcome of comparing expected vs. actual output.
#[derive(Debug, Clone)]
pub struct ComparisonOutcome {
    pub matched: bool,
    pub method: ComparisonMethod,
    /// Similarity score between `0.0` (completely different) and `1.0`
    /// (identical).
    pub score: f64,
    /// Method-specific diagnostic information.
    pub details: serde_json::Value,
}

/// A single comparison algorithm.
pub trait Comparator: Send + Sync {
    fn compare(&self, expected: &[u8], actual: &[u8], options: &ComparisonOptions) -> ComparisonOutcome;
}
