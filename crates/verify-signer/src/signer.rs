//! Ed25519 signing and verification of [`VerificationResult`] records.

use std::path::Path;

use base64::Engine;
use ed25519_dalek::pkcs8::{DecodePrivateKey, EncodePrivateKey, EncodePublicKey, LineEnding};
use ed25519_dalek::{Signature, Signer as _, SigningKey, Verifier as _, VerifyingKey};
use rand_core::OsRng;
use serde_json::json;
use verify_core::VerificationResult;

use crate::error::SignerError;

/// Signs and verifies [`VerificationResult`] records using Ed25519.
///
/// When constructed with a path to an existing PKCS8 PEM private key, that
/// key is loaded and reused for every signing operation. If no key is
/// configured, or the configured path does not exist, an ephemeral keypair
/// is generated -- this is suitable for local development only, since
/// restarting the process invalidates every signature issued so far.
pub struct ResultSigner {
    signing_key: SigningKey,
    verifying_key: VerifyingKey,
}

impl ResultSigner {
    /// Load the signing key from `path` if it exists, else generate an
    /// ephemeral one.
    pub fn new(private_key_path: Option<&Path>) -> Result<Self, SignerError> {
        let signing_key = match private_key_path {
            Some(path) if path.exists() => {
                let pem = std::fs::read_to_string(path).map_err(|source| SignerError::Read {
                    path: path.display().to_string(),
                    source,
                })?;
                SigningKey::from_pkcs8_pem(&pem)?
            }
            _ => {
                tracing::warn!("no signing key found, generating ephemeral key (dev mode only)");
                SigningKey::generate(&mut OsRng)
            }
        };
        let verifying_key = signing_key.verifying_key();
        Ok(Self { signing_key, verifying_key })
    }

    /// Deterministic, sorted-key, whitespace-free JSON of the fields that
    /// make up a result's identity. `serde_json::Map` is backed by a
    /// `BTreeMap` (the `preserve_order` feature is not enabled anywhere in
    /// this workspace), so keys come out sorted without extra effort.
    pub fn canonical_payload(&self, result: &VerificationResult) -> Vec<u8> {
        let payload = json!({
            "job_id": result.job_id.to_string(),
            "claim_id": result.claim_id.to_string(),
            "code_hash": result.code_hash,
            "verification_level": result.verification_level,
            "passed": result.passed,
            "execution_time_seconds": result.execution_time_seconds,
            "created_at": result.created_at.to_rfc3339(),
        });
        serde_json::to_vec(&payload).expect("canonical payload is always valid JSON")
    }

    /// Sign `result`, returning a base64-encoded Ed25519 signature.
    pub fn sign(&self, result: &VerificationResult) -> String {
        let payload = self.canonical_payload(result);
        let signature = self.signing_key.sign(&payload);
        base64::engine::general_purpose::STANDARD.encode(signature.to_bytes())
    }

    /// Verify a base64-encoded signature against `result`. Never panics on
    /// malformed input; any decoding or verification failure yields `false`.
    pub fn verify(&self, result: &VerificationResult, signature: &str) -> bool {
        let Ok(sig_bytes) = base64::engine::general_purpose::STANDARD.decode(signature) else {
            return false;
        };
        let Ok(sig_bytes): Result<[u8; 64], _> = sig_bytes.try_into() else {
            return false;
        };
        let signature = Signature::from_bytes(&sig_bytes);
        let payload = self.canonical_payload(result);
        self.verifying_key.verify(&payload, &signature).is_ok()
    }

    /// The public key in SPKI PEM format, for publishing alongside results.
    pub fn public_key_pem(&self) -> String {
        self.verifying_key
            .to_public_key_pem(LineEnding::LF)
            .expect("ed25519 public key always encodes")
    }

    /// Persist the private key to `path` in PKCS8 PEM format, creating
    /// parent directories as needed.
    pub fn save_private_key(&self, path: &Path) -> Result<(), SignerError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|source| SignerError::Write {
                path: path.display().to_string(),
                source,
            })?;
        }
        let pem = self
            .signing_key
            .to_pkcs8_pem(LineEnding::LF)
            .expect("ed25519 private key always encodes");
        std::fs::write(path, pem.as_bytes()).map_err(|source| SignerError::Write {
            path: path.display().to_string(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use verify_core::VerificationLevel;
    use uuid::Uuid;

    fn sample_result() -> VerificationResult {
        VerificationResult::new(
            Uuid::new_v4(),
            Uuid::new_v4(),
            VerificationLevel::L3OutputVerifiedDeterministic,
            true,
            "deadbeef".into(),
            1.23,
            "verify-runner-python:latest".into(),
        )
    }

    #[test]
    fn ephemeral_key_signs_and_verifies() {
        let signer = ResultSigner::new(None).unwrap();
        let result = sample_result();
        let signature = signer.sign(&result);
        assert!(signer.verify(&result, &signature));
    }

    #[test]
    fn tampered_result_fails_verification() {
        let signer = ResultSigner::new(None).unwrap();
        let mut result = sample_result();
        let signature = signer.sign(&result);
        result.passed = !result.passed;
        assert!(!signer.verify(&result, &signature));
    }

    #[test]
    fn garbage_signature_does_not_panic() {
        let signer = ResultSigner::new(None).unwrap();
        let result = sample_result();
        assert!(!signer.verify(&result, "not-base64!!"));
        assert!(!signer.verify(&result, "dG9vc2hvcnQ="));
    }

    #[test]
    fn missing_key_path_falls_back_to_ephemeral() {
        let signer = ResultSigner::new(Some(Path::new("/nonexistent/key.pem"))).unwrap();
        let result = sample_result();
        let signature = signer.sign(&result);
        assert!(signer.verify(&result, &signature));
    }

    #[test]
    fn round_trips_through_pem_files() {
        let dir = tempfile::tempdir().unwrap();
        let key_path = dir.path().join("signing.pem");

        let signer = ResultSigner::new(None).unwrap();
        signer.save_private_key(&key_path).unwrap();

        let reloaded = ResultSigner::new(Some(&key_path)).unwrap();
        let result = sample_result();
        let signature = reloaded.sign(&result);
        assert!(signer.verify(&result, &signature));
    }
}
