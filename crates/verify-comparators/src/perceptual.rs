//! Byte-similarity comparison for binary outputs (images and other blobs).
//!
//! This deliberately avoids any image-decoding dependency: it computes
//! SHA-256 of both payloads for a fast identical-file path, and otherwise
//! falls back to a byte-level similarity ratio over the overlapping
//! prefix. True perceptual similarity (rotation, crop, colour-space
//! changes) is out of scope -- see the module's Non-goals.

use serde_json::json;
use sha2::{Digest, Sha256};

use verify_core::{ComparisonMethod, ComparisonOptions, ComparisonOutcome};

const DEFAULT_THRESHOLD: f64 = 0.95;

pub fn compare(expected: &[u8], actual: &[u8], options: &ComparisonOptions) -> ComparisonOutcome {
    let threshold = options.threshold.unwrap_or(DEFAULT_THRESHOLD);

    let hash_expected = hex::encode(Sha256::digest(expected));
    let hash_actual = hex::encode(Sha256::digest(actual));

    if hash_expected == hash_actual {
        return ComparisonOutcome {
            matched: true,
            method: ComparisonMethod::PerceptualHash,
            score: 1.0,
            details: json!({
                "hash_expected": hash_expected,
                "hash_actual": hash_actual,
                "size_expected": expected.len(),
                "size_actual": actual.len(),
                "bytes_total": expected.len(),
                "bytes_matching": expected.len(),
                "similarity": 1.0,
            }),
        };
    }

    let (bytes_total, bytes_matching) = byte_similarity(expected, actual);
    let similarity = if bytes_total > 0 {
        bytes_matching as f64 / bytes_total as f64
    } else {
        0.0
    };

    ComparisonOutcome {
        matched: similarity >= threshold,
        method: ComparisonMethod::PerceptualHash,
        score: similarity,
        details: json!({
            "hash_expected": hash_expected,
            "hash_actual": hash_actual,
            "size_expected": expected.len(),
            "size_actual": actual.len(),
            "bytes_total": bytes_total,
            "bytes_matching": bytes_matching,
            "similarity": similarity,
        }),
    }
}

/// Returns `(bytes_total, bytes_matching)`. Bytes beyond the shorter
/// payload are counted as mismatches via `bytes_total = max(len_a, len_b)`.
fn byte_similarity(a: &[u8], b: &[u8]) -> (usize, usize) {
    let bytes_total = a.len().max(b.len());
    if bytes_total == 0 {
        return (0, 0);
    }
    let matching = a.iter().zip(b.iter()).filter(|(x, y)| x == y).count();
    (bytes_total, matching)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_bytes_take_the_fast_path() {
        let data = b"some binary blob";
        let result = compare(data, data, &ComparisonOptions::default());
        assert!(result.matched);
        assert_eq!(result.score, 1.0);
        assert_eq!(result.details["hash_expected"], result.details["hash_actual"]);
    }

    #[test]
    fn mostly_similar_bytes_match_above_threshold() {
        let expected = vec![1u8; 1000];
        let mut actual = vec![1u8; 1000];
        actual[0] = 2;
        let result = compare(&expected, &actual, &ComparisonOptions::default());
        assert!(result.matched);
        assert!(result.score > 0.99);
    }

    #[test]
    fn wildly_different_bytes_mismatch() {
        let expected = vec![0u8; 100];
        let actual = vec![255u8; 100];
        let result = compare(&expected, &actual, &ComparisonOptions::default());
        assert!(!result.matched);
        assert_eq!(result.score, 0.0);
    }

    #[test]
    fn empty_on_both_sides_has_zero_similarity_but_takes_fast_path() {
        let result = compare(b"", b"", &ComparisonOptions::default());
        assert!(result.matched);
        assert_eq!(result.score, 1.0);
    }
}
