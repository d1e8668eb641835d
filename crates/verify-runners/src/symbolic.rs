//! SymPy and SageMath symbolic computation runner.
//!
//! Both run inside the Python image: SymPy is pure Python, and SageMath is
//! typically invoked through its Python interface. L3 requires comparing
//! outputs against expected values, which is the worker's job, not this
//! runner's.

use std::collections::HashMap;

use verify_core::enums::VerificationLevel;
use verify_core::job::VerificationJob;
use verify_core::runner::{PreparedExecution, Runner, RunnerOutput};
use verify_sandbox::images;

use crate::common::{env_vars, exit_code_parse_output};

pub struct SymbolicRunner;

impl Runner for SymbolicRunner {
    fn prepare(&self, job: &VerificationJob) -> PreparedExecution {
        let mut code_files = HashMap::new();
        code_files.insert("symbolic.py".to_string(), job.code_content.clone());

        PreparedExecution {
            image: images::PYTHON.to_string(),
            command: vec!["python".to_string(), "/code/symbolic.py".to_string()],
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
