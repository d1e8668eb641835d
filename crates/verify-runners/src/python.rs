//! Python script and notebook runner.
//!
//! Plain scripts are written to `/code/run.py` and executed directly.
//! Notebooks are placed alongside a thin wrapper that converts them to a
//! plain script via `jupyter nbconvert` before executing the result --
//! this avoids needing a running Jupyter kernel inside the sandbox.

use std::collections::HashMap;

use verify_core::enums::{RunnerKind, VerificationLevel};
use verify_core::job::VerificationJob;
use verify_core::runner::{PreparedExecution, Runner, RunnerOutput};
use verify_sandbox::images;

use crate::common::{env_vars, exit_code_parse_output};

const NOTEBOOK_WRAPPER: &str = r#""""Wrapper that converts an .ipynb notebook to .py and executes it."""
import subprocess
import sys

convert_result = subprocess.run(
    [
        sys.executable, "-m", "jupyter", "nbconvert",
        "--to", "script",
        "--output-dir", "/code",
        "/code/notebook.ipynb",
    ],
    capture_output=True,
    text=True,
)

if convert_result.returncode != 0:
    print(convert_result.stderr, file=sys.stderr)
    sys.exit(convert_result.returncode)

exec_result = subprocess.run(
    [sys.executable, "/code/notebook.py"],
    capture_output=False,
)
sys.exit(exec_result.returncode)
"#;

pub struct PythonRunner;

impl Runner for PythonRunner {
    fn prepare(&self, job: &VerificationJob) -> PreparedExecution {
        let mut code_files = HashMap::new();
        if job.runner_kind == RunnerKind::PythonNotebook {
            code_files.insert("notebook.ipynb".to_string(), job.code_content.clone());
            code_files.insert("run.py".to_string(), NOTEBOOK_WRAPPER.to_string());
        } else {
            code_files.insert("run.py".to_string(), job.code_content.clone());
        }

        PreparedExecution {
            image: images::PYTHON.to_string(),
            command: vec!["python".to_string(), "/code/run.py".to_string()],
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
