//! Lean 4 proof checker runner.
//!
//! A clean exit from `lean` means the proof term fully elaborated and
//! type-checked, which is the strongest claim in the verification
//! hierarchy: [`VerificationLevel::L6FormallyProven`].

use std::collections::HashMap;

use verify_core::enums::VerificationLevel;
use verify_core::job::VerificationJob;
use verify_core::runner::{PreparedExecution, Runner, RunnerOutput};
use verify_sandbox::images;

use crate::common::{env_vars, exit_code_parse_output};

pub struct LeanRunner;

impl Runner for LeanRunner {
    fn prepare(&self, job: &VerificationJob) -> PreparedExecution {
        let mut code_files = HashMap::new();
        code_files.insert("proof.lean".to_string(), job.code_content.clone());

        PreparedExecution {
            image: images::LEAN4.to_string(),
            command: vec!["lean".to_string(), "/code/proof.lean".to_string()],
            code_files,
            data_files: None,
            env_vars: env_vars(job),
        }
    }

    fn parse_output(
        &self,
        exit_code: i32,
        stdout: &str,
        stderr: &str,
        output_files: HashMap<String, Vec<u8>>,
    ) -> RunnerOutput {
        exit_code_parse_output(exit_code, stdout, stderr, output_files, VerificationLevel::L6FormallyProven)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use verify_core::enums::RunnerKind;
    use uuid::Uuid;

    #[test]
    fn places_proof_file_and_invokes_lean() {
        let job = VerificationJob::new(Uuid::new_v4(), RunnerKind::Lean4, "hash".into(), "theorem t : True := trivial".into(), "tester".into());
        let prepared = LeanRunner.prepare(&job);
        assert_eq!(prepared.command, vec!["lean", "/code/proof.lean"]);
    }

    #[test]
    fn type_checked_proof_reaches_l6() {
        let output = LeanRunner.parse_output(0, "", "", HashMap::new());
        assert!(output.success);
        assert_eq!(output.verification_level, VerificationLevel::L6FormallyProven);
    }

    #[test]
    fn failed_elaboration_stays_at_l0() {
        let output = LeanRunner.parse_output(1, "", "error: unknown identifier", HashMap::new());
        assert!(!output.success);
        assert_eq!(output.verification_level, VerificationLevel::L0Unverified);
    }
}
