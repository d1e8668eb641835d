//! The `Runner` trait: translates a [`VerificationJob`] into a concrete
//! execution plan and parses sandbox output back into structured results.
//!
//! Runners never touch Docker directly — that is `verify-sandbox`'s job.
//! This mirrors the split between an I/O-owning executor crate and its
//! pure pipeline-stage description types.

use std::collections::HashMap;

use crate::enums::VerificationLevel;
use crate::job::VerificationJob;

/// Everything the sandbox needs to execute a verification job.
#[derive(Debug, Clone)]
pub struct PreparedExecution {
    /// Docker image `name:tag` to run.
    pub image: String,
    /// Command and arguments to execute inside the container.
    pub command: Vec<String>,
    /// Mapping of `relative_path -> source code`, placed under `/code/`.
    pub code_files: HashMap<String, String>,
    /// Optional mapping of `relative_path -> raw bytes`, placed under
    /// `/data/`.
    pub data_files: Option<HashMap<String, Vec<u8>>>,
    /// Environment variables to set inside the container, merged over the
    /// sandbox's sanitized base environment.
    pub env_vars: HashMap<String, String>,
}

/// Structured output produced by parsing a sandbox run.
#[derive(Debug, Clone)]
pub struct RunnerOutput {
    /// Mapping of `filename -> content` for output artifacts extracted from
    /// `/output/`.
    pub outputs: HashMap<String, Vec<u8>>,
    /// Captured standard output from the execution.
    pub logs: String,
    /// Captured standard error from the execution.
    pub errors: String,
    /// Highest verification level this run can claim, independent of output
    /// comparison (the worker may still downgrade it).
    pub verification_level: VerificationLevel,
    /// Whether the run is considered successful by the runner's own
    /// language-specific criteria (exit code, parsed notebook cell errors,
    /// Lean kernel check, etc).
    pub success: bool,
}

/// A language-specific execution environment.
///
/// Implementations are zero-sized stateless structs selected by
/// [`get_runner`](https://docs.rs/verify-runners)-style static dispatch, not
/// a runtime-registered trait-object map.
pub trait Runner: Send + Sync {
    /// Translate the job's code content and metadata into concrete files,
    /// a command, and an image selection.
    fn prepare(&self, job: &VerificationJob) -> PreparedExecution;

    /// Parse sandbox results into structured output.
    fn parse_output(
        &self,
        exit_code: i32,
        stdout: &str,
        stderr: &str,
        output_files: HashMap<String, Vec<u8>>,
    ) -> RunnerOutput;
}
