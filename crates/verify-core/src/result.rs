//! `VerificationResult` and `OutputComparison`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::enums::{ComparisonMethod, VerificationLevel};

/// Result of comparing a single actual output artifact against its expected
/// value.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputComparison {
    /// Logical name of the compared output artifact.
    pub name: String,
    /// Whether the comparison passed according to the chosen method.
    pub matched: bool,
    /// Comparison algorithm that was used.
    pub method: ComparisonMethod,
    /// Numeric similarity score. Semantics depend on method: `1.0` = perfect
    /// match for EXACT/NUMERICAL_TOLERANCE, `1 - max_deviation` for
    /// STATISTICAL, byte-similarity ratio for PERCEPTUAL_HASH.
    pub score: f64,
    /// Method-specific diagnostic metadata (diff snippet, test statistic).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

/// Immutable record produced after a verification job completes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerificationResult {
    pub id: Uuid,
    pub job_id: Uuid,
    pub claim_id: Uuid,
    /// Highest verification level achieved by this run.
    pub verification_level: VerificationLevel,
    /// Overall pass/fail verdict for the verification.
    pub passed: bool,
    /// SHA-256 hex digest of the code that was executed.
    pub code_hash: String,
    /// Ed25519 signature over the canonical result payload. Empty until the
    /// signer has stamped the result.
    #[serde(default)]
    pub signature: String,
    /// Wall-clock execution time of the sandboxed run, in seconds.
    pub execution_time_seconds: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outputs_matched: Option<Vec<OutputComparison>>,
    /// Captured standard output, truncated to 1000 characters at this layer
    /// (the sandbox itself truncates to a larger 64 KiB bound beforehand).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stdout: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stderr: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    /// Container image (`name:tag`) used for execution.
    pub runner_image: String,
    pub created_at: DateTime<Utc>,
}

/// Result-layer truncation bound: the sandbox already truncates captured
/// stdout/stderr to 64 KiB before handing it to the runner; this second,
/// tighter bound is what gets persisted on the result record itself.
pub const RESULT_OUTPUT_TRUNCATION_CHARS: usize = 1000;

impl VerificationResult {
    pub fn new(
        job_id: Uuid,
        claim_id: Uuid,
        verification_level: VerificationLevel,
        passed: bool,
        code_hash: String,
        execution_time_seconds: f64,
        runner_image: String,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            job_id,
            claim_id,
            verification_level,
            passed,
            code_hash,
            signature: String::new(),
            execution_time_seconds,
            outputs_matched: None,
            stdout: None,
            stderr: None,
            error_message: None,
            runner_image,
            created_at: Utc::now(),
        }
    }

    /// Truncate `stdout`/`stderr` to [`RESULT_OUTPUT_TRUNCATION_CHARS`]
    /// characters before persisting, mirroring the worker's `[:1000]` slice.
    pub fn truncate_captured_output(&mut self) {
        if let Some(s) = &mut self.stdout {
            truncate_chars(s, RESULT_OUTPUT_TRUNCATION_CHARS);
        }
        if let Some(s) = &mut self.stderr {
            truncate_chars(s, RESULT_OUTPUT_TRUNCATION_CHARS);
        }
    }
}

fn truncate_chars(s: &mut String, max_chars: usize) {
    if let Some((idx, _)) = s.char_indices().nth(max_chars) {
        s.truncate(idx);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncates_to_char_boundary_not_byte_count() {
        let mut result = VerificationResult::new(
            Uuid::new_v4(),
            Uuid::new_v4(),
            VerificationLevel::L2ExecutionVerified,
            true,
            "abc".into(),
            0.5,
            "python:3.12-slim".into(),
        );
        result.stdout = Some("é".repeat(1500));
        result.truncate_captured_output();
        assert_eq!(result.stdout.unwrap().chars().count(), 1000);
    }

    #[test]
    fn leaves_short_output_untouched() {
        let mut result = VerificationResult::new(
            Uuid::new_v4(),
            Uuid::new_v4(),
            VerificationLevel::L2ExecutionVerified,
            true,
            "abc".into(),
            0.5,
            "python:3.12-slim".into(),
        );
        result.stdout = Some("short".into());
        result.truncate_captured_output();
        assert_eq!(result.stdout.as_deref(), Some("short"));
    }
}
