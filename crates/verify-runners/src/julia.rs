//! Julia script runner.

use std::collections::HashMap;

use verify_core::enums::VerificationLevel;
use verify_core::job::VerificationJob;
use verify_core::runner::{PreparedExecution, Runner, RunnerOutput};
use verify_sandbox::images;

use crate::common::{env_vars, exit_code_parse_output};

pub struct JuliaRunner;

impl Runner for JuliaRunner {
    fn prepare(&self, job: &VerificationJob) -> PreparedExecution {
        let mut code_files = HashMap::new();
        code_files.insert("script.jl".to_string(), job.code_content.clone());

        PreparedExecution {
            image: images::JULIA.to_string(),
            command: vec!["julia".to_string(), "/code/script.jl".to_string()],
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
        exit_code_parse_output(exit_code, stdout, stderr, output_files, VerificationLevel::L2ExecutionVerified)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use verify_core::enums::RunnerKind;
    use uuid::Uuid;

    #[test]
    fn places_script_and_invokes_julia() {
        let job = VerificationJob::new(Uuid::new_v4(), RunnerKind::Julia, "hash".into(), "println(1)".into(), "tester".into());
        let prepared = JuliaRunner.prepare(&job);
        assert_eq!(prepared.image, images::JULIA);
        assert_eq!(prepared.command, vec!["julia", "/code/script.jl"]);
        assert_eq!(prepared.code_files.get("script.jl").unwrap(), "println(1)");
    }
}
