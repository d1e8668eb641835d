//! `VerificationJob`, `ResourceLimits`, and `ExpectedOutput`.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::enums::{ComparisonMethod, JobStatus, RunnerKind};
use crate::error::{Error, Result};

/// Hard resource limits enforced by the sandbox container.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ResourceLimits {
    /// Maximum CPU time in seconds.
    #[serde(default = "default_cpu_seconds")]
    pub cpu_seconds: u32,
    /// Maximum resident memory in megabytes.
    #[serde(default = "default_memory_mb")]
    pub memory_mb: u32,
    /// Maximum writable disk space in megabytes.
    #[serde(default = "default_disk_mb")]
    pub disk_mb: u32,
    /// Wall-clock timeout for the entire execution, in seconds.
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u32,
    /// Maximum number of concurrent processes/threads.
    #[serde(default = "default_pids_limit")]
    pub pids_limit: u32,
}

fn default_cpu_seconds() -> u32 {
    120
}
fn default_memory_mb() -> u32 {
    2048
}
fn default_disk_mb() -> u32 {
    256
}
fn default_timeout_seconds() -> u32 {
    120
}
fn default_pids_limit() -> u32 {
    64
}

impl Default for ResourceLimits {
    fn default() -> Self {
        Self {
            cpu_seconds: default_cpu_seconds(),
            memory_mb: default_memory_mb(),
            disk_mb: default_disk_mb(),
            timeout_seconds: default_timeout_seconds(),
            pids_limit: default_pids_limit(),
        }
    }
}

impl ResourceLimits {
    /// Validate the limits are all strictly positive, matching the
    /// `gt=0` constraints on the wire model.
    pub fn validate(&self) -> Result<()> {
        if self.cpu_seconds == 0 {
            return Err(Error::Validation("cpu_seconds must be > 0".into()));
        }
        if self.memory_mb == 0 {
            return Err(Error::Validation("memory_mb must be > 0".into()));
        }
        if self.disk_mb == 0 {
            return Err(Error::Validation("disk_mb must be > 0".into()));
        }
        if self.timeout_seconds == 0 {
            return Err(Error::Validation("timeout_seconds must be > 0".into()));
        }
        if self.pids_limit == 0 {
            return Err(Error::Validation("pids_limit must be > 0".into()));
        }
        Ok(())
    }
}

/// An expected artifact to compare against the runner's actual output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExpectedOutput {
    /// Logical name of the output artifact (e.g. `result.csv`, `plot.png`).
    pub name: String,
    /// Raw bytes of the expected output. Supplementary to `content_hash`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<Vec<u8>>,
    /// SHA-256 hex digest of the expected output.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_hash: Option<String>,
    /// Algorithm used to compare actual vs. expected output.
    #[serde(default = "default_comparison_method")]
    pub comparison_method: ComparisonMethod,
    /// Tolerance parameter forwarded to the comparator. Accepted for every
    /// method but currently only threaded through, not consumed, by the
    /// shipped comparators (each reads its own named option instead).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tolerance: Option<f64>,
}

fn default_comparison_method() -> ComparisonMethod {
    ComparisonMethod::Exact
}

impl ExpectedOutput {
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(Error::Validation("expected output name must not be empty".into()));
        }
        if let Some(tolerance) = self.tolerance {
            if tolerance < 0.0 {
                return Err(Error::Validation("tolerance must be >= 0".into()));
            }
        }
        Ok(())
    }
}

/// Optional environment specification (conda env, pip requirements, Julia
/// `Project.toml`, ...), carried opaquely and passed to the runner.
///
/// Unknown fields on the wire are ignored rather than rejected: this mirrors
/// the source model's untyped `dict` and lets callers attach
/// runner-specific extras without a schema change here.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EnvironmentSpec {
    #[serde(default)]
    pub env: HashMap<String, String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// A single verification job submitted for sandboxed execution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerificationJob {
    /// Unique identifier for this verification job. Generated with
    /// `Uuid::new_v4` rather than a time-ordered UUID so the id itself
    /// carries no creation-order signal beyond `created_at`.
    pub id: Uuid,
    /// Identifier of the scientific claim being verified.
    pub claim_id: Uuid,
    /// Execution environment to use for this job.
    pub runner_kind: RunnerKind,
    /// SHA-256 hex digest of `code_content`.
    pub code_hash: String,
    /// The source code to execute inside the sandbox.
    pub code_content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub environment_spec: Option<EnvironmentSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected_outputs: Option<Vec<ExpectedOutput>>,
    #[serde(default)]
    pub resource_limits: ResourceLimits,
    #[serde(default = "default_status")]
    pub status: JobStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Identifier of the user or service that submitted this job.
    pub submitted_by: String,
}

fn default_status() -> JobStatus {
    JobStatus::Pending
}

impl VerificationJob {
    /// Build a new job in `PENDING` status with a fresh id and timestamps.
    pub fn new(
        claim_id: Uuid,
        runner_kind: RunnerKind,
        code_hash: String,
        code_content: String,
        submitted_by: String,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            claim_id,
            runner_kind,
            code_hash,
            code_content,
            environment_spec: None,
            expected_outputs: None,
            resource_limits: ResourceLimits::default(),
            status: JobStatus::Pending,
            created_at: now,
            updated_at: now,
            submitted_by,
        }
    }

    /// Validate invariants that the HTTP boundary must enforce before the
    /// job is ever queued: non-empty code, a matching code hash, sane
    /// resource limits, and well-formed expected outputs.
    pub fn validate(&self, max_code_size_bytes: usize) -> Result<()> {
        if self.code_content.trim().is_empty() {
            return Err(Error::Validation("code_content must not be empty".into()));
        }
        if self.code_content.len() > max_code_size_bytes {
            return Err(Error::Validation(format!(
                "code_content exceeds maximum size of {max_code_size_bytes} bytes"
            )));
        }
        if self.submitted_by.trim().is_empty() {
            return Err(Error::Validation("submitted_by must not be empty".into()));
        }
        self.resource_limits.validate()?;
        if let Some(outputs) = &self.expected_outputs {
            for output in outputs {
                output.validate()?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_job() -> VerificationJob {
        VerificationJob::new(
            Uuid::new_v4(),
            RunnerKind::PythonScript,
            "deadbeef".into(),
            "print(1 + 1)".into(),
            "tester".into(),
        )
    }

    #[test]
    fn new_job_starts_pending() {
        let job = sample_job();
        assert_eq!(job.status, JobStatus::Pending);
        assert_eq!(job.created_at, job.updated_at);
    }

    #[test]
    fn rejects_empty_code() {
        let mut job = sample_job();
        job.code_content = "   ".into();
        assert!(job.validate(1_048_576).is_err());
    }

    #[test]
    fn rejects_oversized_code() {
        let mut job = sample_job();
        job.code_content = "x".repeat(10);
        assert!(job.validate(5).is_err());
    }

    #[test]
    fn rejects_zero_resource_limits() {
        let mut job = sample_job();
        job.resource_limits.timeout_seconds = 0;
        assert!(job.validate(1_048_576).is_err());
    }

    #[test]
    fn rejects_negative_tolerance() {
        let mut job = sample_job();
        job.expected_outputs = Some(vec![ExpectedOutput {
            name: "out.txt".into(),
            content: None,
            content_hash: None,
            comparison_method: ComparisonMethod::NumericalTolerance,
            tolerance: Some(-1.0),
        }]);
        assert!(job.validate(1_048_576).is_err());
    }

    #[test]
    fn environment_spec_ignores_unknown_fields() {
        let raw = serde_json::json!({"env": {"FOO": "bar"}, "conda_env": "base"});
        let spec: EnvironmentSpec = serde_json::from_value(raw).unwrap();
        assert_eq!(spec.env.get("FOO"), Some(&"bar".to_string()));
        assert_eq!(
            spec.extra.get("conda_env"),
            Some(&serde_json::Value::String("base".into()))
        );
    }
}
