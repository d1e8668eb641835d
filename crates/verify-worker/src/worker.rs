//! Background worker: pulls jobs off the queue and runs them end-to-end.
//!
//! Workers share load through a Redis Streams consumer group. Each message
//! is acknowledged only after the job has been fully processed, or has
//! irrecoverably failed -- a worker that crashes mid-job leaves the
//! message pending for another consumer to claim.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use verify_comparators::get_comparator;
use verify_core::{
    ComparisonOptions, JobStatus, OutputComparison, VerificationJob, VerificationLevel, VerificationResult,
};
use verify_queue::JobQueue;
use verify_runners::get_runner;
use verify_sandbox::{SandboxExecutor, SecurityPolicy};
use verify_signer::ResultSigner;

/// Name of the Redis Streams consumer group every worker instance joins.
pub const CONSUMER_GROUP: &str = "verify-workers";

/// Long-running loop that pulls jobs from `queue` and processes them with
/// `sandbox`, signing completed results with `signer`.
///
/// `shutdown` is checked once per iteration, not awaited mid-poll: the
/// blocking `dequeue` read is itself the suspension point, bounded at 5s,
/// so cancellation latency never exceeds that bound. A job already in
/// flight always finishes (or is marked `FAILED`) and is acknowledged
/// before the loop exits.
pub async fn run_worker(
    queue: Arc<JobQueue>,
    sandbox: Arc<dyn SandboxExecutor>,
    signer: Arc<ResultSigner>,
    consumer_name: &str,
    mut shutdown: watch::Receiver<bool>,
) {
    tracing::info!(consumer = consumer_name, group = CONSUMER_GROUP, "worker starting");

    loop {
        if *shutdown.borrow() {
            tracing::info!(consumer = consumer_name, "worker stopping, shutdown requested");
            break;
        }

        let messages = match queue.dequeue(CONSUMER_GROUP, consumer_name, 1, 5000).await {
            Ok(messages) => messages,
            Err(e) => {
                tracing::error!(error = %e, "worker loop error, retrying in 1s");
                tokio::time::sleep(Duration::from_secs(1)).await;
                continue;
            }
        };

        for dequeued in messages {
            let job_id = dequeued.job.id.to_string();
            if let Err(e) = process_job(&queue, &sandbox, &signer, &dequeued.job).await {
                tracing::error!(job_id, error = %e, "failed to process job");
                let _ = queue.set_status(&job_id, JobStatus::Failed).await;
            }
            if let Err(e) = queue.acknowledge(&dequeued.message_id, CONSUMER_GROUP).await {
                tracing::error!(job_id, error = %e, "failed to acknowledge message");
            }
        }
    }
}

/// Execute a single verification job end-to-end: prepare, run in the
/// sandbox, parse output, compare against expected artifacts, classify the
/// achieved verification level, sign, and store the result.
pub async fn process_job(
    queue: &JobQueue,
    sandbox: &dyn SandboxExecutor,
    signer: &ResultSigner,
    job: &VerificationJob,
) -> Result<(), verify_core::Error> {
    queue.set_status(&job.id.to_string(), JobStatus::Running).await?;

    let result = run_pipeline(sandbox, signer, job).await?;

    queue.store_result(&job.id.to_string(), &result).await?;

    tracing::info!(
        job_id = %job.id,
        level = ?result.verification_level,
        passed = result.passed,
        "job completed"
    );
    Ok(())
}

/// Run the verification pipeline for `job` against `sandbox` and return a
/// signed result, without touching the queue. Split out from
/// [`process_job`] so it can be exercised in tests against a fake sandbox
/// backend that never talks to Docker.
async fn run_pipeline(
    sandbox: &dyn SandboxExecutor,
    signer: &ResultSigner,
    job: &VerificationJob,
) -> Result<VerificationResult, verify_core::Error> {
    let runner = get_runner(job.runner_kind);
    let prepared = runner.prepare(job);

    let policy = SecurityPolicy::from_resource_limits(
        job.resource_limits.memory_mb,
        job.resource_limits.timeout_seconds,
        job.resource_limits.pids_limit,
        job.resource_limits.disk_mb,
    )
    .map_err(|e| verify_core::Error::Internal(format!("invalid security policy: {e}")))?;

    let sandbox_result = sandbox
        .run(
            &prepared.image,
            prepared.command.clone(),
            &prepared.code_files,
            prepared.data_files.as_ref(),
            &policy,
            Some(&prepared.env_vars),
        )
        .await
        .map_err(sandbox_to_core_error)?;

    let runner_output = runner.parse_output(
        sandbox_result.exit_code,
        &sandbox_result.stdout,
        &sandbox_result.stderr,
        sandbox_result.output_files.clone(),
    );

    let output_comparisons = if job.expected_outputs.is_some() && runner_output.success {
        compare_outputs(job, &runner_output.outputs)
    } else {
        Vec::new()
    };

    let (level, passed) = classify(
        sandbox_result.timed_out,
        sandbox_result.exit_code,
        &runner_output,
        &output_comparisons,
    );

    let mut result = VerificationResult::new(
        job.id,
        job.claim_id,
        level,
        passed,
        job.code_hash.clone(),
        sandbox_result.execution_time_seconds,
        prepared.image.clone(),
    );
    result.outputs_matched = if output_comparisons.is_empty() { None } else { Some(output_comparisons) };
    result.stdout = (!sandbox_result.stdout.is_empty()).then(|| sandbox_result.stdout.clone());
    result.stderr = (!sandbox_result.stderr.is_empty()).then(|| sandbox_result.stderr.clone());
    result.error_message = (!passed).then(|| runner_output.errors.clone());
    result.truncate_captured_output();

    result.signature = signer.sign(&result);
    Ok(result)
}

/// Disallowed image and path-traversal errors indicate a caller/runner bug,
/// not a flaky backend -- they are reported as `Validation` so they are
/// never mistaken for something worth retrying.
fn sandbox_to_core_error(err: verify_sandbox::SandboxError) -> verify_core::Error {
    use verify_sandbox::SandboxError;
    match err {
        SandboxError::ImageNotAllowed { .. } | SandboxError::PathTraversal { .. } => {
            verify_core::Error::Validation(err.to_string())
        }
        SandboxError::Timeout(_) => verify_core::Error::Timeout(err.to_string()),
        other => verify_core::Error::RuntimeFailure(other.to_string()),
    }
}

fn compare_outputs(job: &VerificationJob, actual_outputs: &HashMap<String, Vec<u8>>) -> Vec<OutputComparison> {
    let Some(expected_outputs) = &job.expected_outputs else {
        return Vec::new();
    };

    expected_outputs
        .iter()
        .map(|expected| {
            let Some(actual_data) = actual_outputs.get(&expected.name) else {
                return OutputComparison {
                    name: expected.name.clone(),
                    matched: false,
                    method: expected.comparison_method,
                    score: 0.0,
                    details: Some(serde_json::json!({ "error": "output not found" })),
                };
            };

            let expected_data = expected.content.as_deref().unwrap_or(&[]);
            let options = ComparisonOptions { tolerance: expected.tolerance, ..Default::default() };
            let outcome = get_comparator(expected.comparison_method).compare(expected_data, actual_data, &options);

            OutputComparison {
                name: expected.name.clone(),
                matched: outcome.matched,
                method: outcome.method,
                score: outcome.score,
                details: Some(outcome.details),
            }
        })
        .collect()
}

/// Determine the achieved verification level and pass/fail verdict.
///
/// A timeout always fails at L0. A runner that didn't succeed is
/// downgraded to L1 (the code at least reached the interpreter, even
/// though it didn't finish) rather than L0. When expected outputs were
/// supplied, every one of them must match for the run to pass; a partial
/// match caps the level at L2 regardless of what the runner itself
/// claimed. With no expected outputs, the runner's own assessment stands.
fn classify(
    timed_out: bool,
    exit_code: i32,
    runner_output: &verify_core::RunnerOutput,
    output_comparisons: &[OutputComparison],
) -> (VerificationLevel, bool) {
    if timed_out {
        return (VerificationLevel::L0Unverified, false);
    }
    if !runner_output.success {
        let level = if exit_code != 0 { VerificationLevel::L1SyntaxVerified } else { VerificationLevel::L0Unverified };
        return (level, false);
    }
    if !output_comparisons.is_empty() {
        if output_comparisons.iter().all(|c| c.matched) {
            return (runner_output.verification_level, true);
        }
        return (VerificationLevel::L2ExecutionVerified, false);
    }
    (runner_output.verification_level, runner_output.success)
}

#[cfg(test)]
mod tests {
    use super::*;
    use verify_core::{ComparisonMethod, RunnerOutput};
    use verify_sandbox::SandboxResult;

    fn output(success: bool, level: VerificationLevel) -> RunnerOutput {
        RunnerOutput {
            outputs: HashMap::new(),
            logs: String::new(),
            errors: String::new(),
            verification_level: level,
            success,
        }
    }

    #[test]
    fn timeout_always_fails_at_l0() {
        let (level, passed) = classify(true, 0, &output(true, VerificationLevel::L6FormallyProven), &[]);
        assert_eq!(level, VerificationLevel::L0Unverified);
        assert!(!passed);
    }

    #[test]
    fn failed_execution_with_nonzero_exit_reaches_l1() {
        let (level, passed) = classify(false, 1, &output(false, VerificationLevel::L2ExecutionVerified), &[]);
        assert_eq!(level, VerificationLevel::L1SyntaxVerified);
        assert!(!passed);
    }

    #[test]
    fn all_outputs_matching_keeps_runner_level() {
        let comparisons = vec![OutputComparison {
            name: "out.txt".into(),
            matched: true,
            method: ComparisonMethod::Exact,
            score: 1.0,
            details: None,
        }];
        let (level, passed) = classify(
            false,
            0,
            &output(true, VerificationLevel::L3OutputVerifiedDeterministic),
            &comparisons,
        );
        assert_eq!(level, VerificationLevel::L3OutputVerifiedDeterministic);
        assert!(passed);
    }

    #[test]
    fn partial_output_match_caps_at_l2_and_fails() {
        let comparisons = vec![
            OutputComparison { name: "a".into(), matched: true, method: ComparisonMethod::Exact, score: 1.0, details: None },
            OutputComparison { name: "b".into(), matched: false, method: ComparisonMethod::Exact, score: 0.0, details: None },
        ];
        let (level, passed) = classify(
            false,
            0,
            &output(true, VerificationLevel::L3OutputVerifiedDeterministic),
            &comparisons,
        );
        assert_eq!(level, VerificationLevel::L2ExecutionVerified);
        assert!(!passed);
    }

    #[test]
    fn no_expected_outputs_trusts_runner_assessment() {
        let (level, passed) = classify(false, 0, &output(true, VerificationLevel::L2ExecutionVerified), &[]);
        assert_eq!(level, VerificationLevel::L2ExecutionVerified);
        assert!(passed);
    }

    #[test]
    fn disallowed_image_maps_to_validation_error() {
        let err = sandbox_to_core_error(verify_sandbox::SandboxError::ImageNotAllowed { image: "evil:latest".into() });
        assert!(matches!(err, verify_core::Error::Validation(_)));
    }

    #[test]
    fn path_traversal_maps_to_validation_error() {
        let err = sandbox_to_core_error(verify_sandbox::SandboxError::PathTraversal {
            kind: "code_files",
            path: "../etc/passwd".into(),
        });
        assert!(matches!(err, verify_core::Error::Validation(_)));
    }

    /// Stands in for [`ContainerSandbox`] in pipeline tests: returns a
    /// canned result instead of talking to Docker.
    struct FakeSandbox {
        result: SandboxResult,
    }

    #[async_trait::async_trait]
    impl SandboxExecutor for FakeSandbox {
        async fn run(
            &self,
            _image: &str,
            _command: Vec<String>,
            _code_files: &HashMap<String, String>,
            _data_files: Option<&HashMap<String, Vec<u8>>>,
            _policy: &SecurityPolicy,
            _env_vars: Option<&HashMap<String, String>>,
        ) -> verify_sandbox::Result<SandboxResult> {
            Ok(self.result.clone())
        }
    }

    fn sample_job() -> VerificationJob {
        VerificationJob::new(
            uuid::Uuid::new_v4(),
            verify_core::RunnerKind::PythonScript,
            "hash".into(),
            "print(1 + 1)".into(),
            "tester".into(),
        )
    }

    #[tokio::test]
    async fn pipeline_runs_clean_exit_to_completion() {
        let sandbox = FakeSandbox {
            result: SandboxResult {
                exit_code: 0,
                stdout: "2".into(),
                stderr: String::new(),
                output_files: HashMap::new(),
                execution_time_seconds: 0.01,
                timed_out: false,
            },
        };
        let signer = ResultSigner::new(None).expect("ephemeral signer");
        let job = sample_job();

        let result = run_pipeline(&sandbox, &signer, &job).await.expect("pipeline succeeds");

        assert!(result.passed);
        assert_eq!(result.verification_level, VerificationLevel::L2ExecutionVerified);
        assert_eq!(result.stdout.as_deref(), Some("2"));
        assert!(!result.signature.is_empty());
    }

    #[tokio::test]
    async fn pipeline_marks_timeout_as_failed_l0() {
        let sandbox = FakeSandbox {
            result: SandboxResult {
                exit_code: -1,
                stdout: String::new(),
                stderr: String::new(),
                output_files: HashMap::new(),
                execution_time_seconds: 120.0,
                timed_out: true,
            },
        };
        let signer = ResultSigner::new(None).expect("ephemeral signer");
        let job = sample_job();

        let result = run_pipeline(&sandbox, &signer, &job).await.expect("pipeline succeeds");

        assert!(!result.passed);
        assert_eq!(result.verification_level, VerificationLevel::L0Unverified);
    }

    #[tokio::test]
    async fn pipeline_compares_expected_outputs() {
        let mut output_files = HashMap::new();
        output_files.insert("result.txt".to_string(), b"42".to_vec());
        let sandbox = FakeSandbox {
            result: SandboxResult {
                exit_code: 0,
                stdout: String::new(),
                stderr: String::new(),
                output_files,
                execution_time_seconds: 0.01,
                timed_out: false,
            },
        };
        let signer = ResultSigner::new(None).expect("ephemeral signer");
        let mut job = sample_job();
        job.expected_outputs = Some(vec![verify_core::ExpectedOutput {
            name: "result.txt".into(),
            content: Some(b"42".to_vec()),
            content_hash: None,
            comparison_method: ComparisonMethod::Exact,
            tolerance: None,
        }]);

        let result = run_pipeline(&sandbox, &signer, &job).await.expect("pipeline succeeds");

        assert!(result.passed);
        let comparisons = result.outputs_matched.expect("comparisons recorded");
        assert!(comparisons[0].matched);
    }
}
