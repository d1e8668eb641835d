use std::collections::HashMap;

use verify_core::enums::VerificationLevel;
use verify_core::job::VerificationJob;
use verify_core::runner::RunnerOutput;

/// Shared `env_vars` extraction: every runner forwards whatever the job's
/// `environment_spec.env` map carries, untouched.
pub(crate) fn env_vars(job: &VerificationJob) -> HashMap<String, String> {
    job.environment_spec
        .as_ref()
        .map(|spec| spec.env.clone())
        .unwrap_or_default()
}

/// Shared parse_output for runners whose only verdict is "ran to
/// completion" (exit 0) vs. "did not" (anything else), differing only in
/// which [`VerificationLevel`] a clean exit earns.
pub(crate) fn exit_code_parse_output(
    exit_code: i32,
    stdout: &str,
    stderr: &str,
    output_files: HashMap<String, Vec<u8>>,
    level_on_success: VerificationLevel,
) -> RunnerOutput {
    RunnerOutput {
        outputs: output_files,
        logs: stdout.to_string(),
        errors: stderr.to_string(),
        verification_level: if exit_code == 0 { level_on_success } else { VerificationLevel::L0Unverified },
        success: exit_code == 0,
    }
}
