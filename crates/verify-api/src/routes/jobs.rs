//! Submit/status/result endpoints for verification jobs.

use axum::Json;
use axum::Router;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use verify_core::{EnvironmentSpec, ExpectedOutput, JobStatus, ResourceLimits, RunnerKind, VerificationJob};

use crate::error::ApiError;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/v1/jobs", post(submit_job).get(list_jobs))
        .route("/v1/jobs/{job_id}", get(get_job_status))
        .route("/v1/jobs/{job_id}/result", get(get_job_result))
}

#[derive(Debug, Deserialize)]
struct SubmitJobRequest {
    claim_id: Uuid,
    runner_kind: RunnerKind,
    code_content: String,
    #[serde(default)]
    environment_spec: Option<EnvironmentSpec>,
    #[serde(default)]
    expected_outputs: Option<Vec<ExpectedOutput>>,
    #[serde(default)]
    resource_limits: Option<ResourceLimits>,
    submitted_by: String,
}

#[derive(Debug, Serialize)]
struct SubmitJobResponse {
    job_id: Uuid,
    status: JobStatus,
    code_hash: String,
}

#[derive(Debug, Serialize)]
struct JobStatusResponse {
    job_id: Uuid,
    status: JobStatus,
}

#[derive(Debug, Deserialize)]
struct ListJobsQuery {
    #[serde(default = "default_limit")]
    limit: isize,
}

fn default_limit() -> isize {
    50
}

async fn submit_job(
    State(state): State<AppState>,
    Json(body): Json<SubmitJobRequest>,
) -> Result<(StatusCode, Json<SubmitJobResponse>), ApiError> {
    let code_bytes = body.code_content.as_bytes();
    if code_bytes.len() > state.settings.max_code_size_bytes {
        return Err(ApiError::PayloadTooLarge(format!(
            "code_content exceeds maximum allowed size ({} bytes > {} bytes)",
            code_bytes.len(),
            state.settings.max_code_size_bytes
        )));
    }
    let code_hash = hex::encode(Sha256::digest(code_bytes));

    let mut job = VerificationJob::new(
        body.claim_id,
        body.runner_kind,
        code_hash.clone(),
        body.code_content,
        body.submitted_by,
    );
    job.environment_spec = body.environment_spec;
    job.expected_outputs = body.expected_outputs;
    job.resource_limits = body.resource_limits.unwrap_or_default();

    job.validate(state.settings.max_code_size_bytes)?;

    state.queue.enqueue(&job).await?;
    tracing::info!(job_id = %job.id, runner_kind = ?job.runner_kind, claim_id = %job.claim_id, "job submitted");

    Ok((
        StatusCode::CREATED,
        Json(SubmitJobResponse { job_id: job.id, status: JobStatus::Queued, code_hash }),
    ))
}

async fn get_job_status(
    State(state): State<AppState>,
    Path(job_id): Path<Uuid>,
) -> Result<Json<JobStatusResponse>, ApiError> {
    let status = state
        .queue
        .get_status(&job_id.to_string())
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("job {job_id} not found")))?;
    Ok(Json(JobStatusResponse { job_id, status }))
}

async fn get_job_result(
    State(state): State<AppState>,
    Path(job_id): Path<Uuid>,
) -> Result<Json<verify_core::VerificationResult>, ApiError> {
    let result = state.queue.get_result(&job_id.to_string()).await?.ok_or_else(|| {
        ApiError::NotFound(format!("no result found for job {job_id}; it may still be running"))
    })?;
    Ok(Json(result))
}

async fn list_jobs(
    State(state): State<AppState>,
    Query(query): Query<ListJobsQuery>,
) -> Result<Json<Vec<JobStatusResponse>>, ApiError> {
    let limit = query.limit.clamp(1, 200);
    let jobs = state.queue.list_recent_jobs(limit).await?;
    Ok(Json(
        jobs.into_iter()
            .map(|j| JobStatusResponse { job_id: j.job_id, status: j.status.unwrap_or(JobStatus::Pending) })
            .collect(),
    ))
}
