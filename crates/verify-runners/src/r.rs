//! R script and R Markdown runner.
//!
//! Plain scripts run via `Rscript`; R Markdown documents are rendered with
//! `rmarkdown::render()`, writing output directly to `/output/`.

use std::collections::HashMap;

use verify_core::enums::{RunnerKind, VerificationLevel};
use verify_core::job::VerificationJob;
use verify_core::runner::{PreparedExecution, Runner, RunnerOutput};
use verify_sandbox::images;

use crate::common::{env_vars, exit_code_parse_output};

pub struct RRunner;

impl Runner for RRunner {
    fn prepare(&self, job: &VerificationJob) -> PreparedExecution {
        let mut code_files = HashMap::new();
        let command = if job.runner_kind == RunnerKind::RMarkdown {
            code_files.insert("input.Rmd".to_string(), job.code_content.clone());
            vec![
                "Rscript".to_string(),
                "-e".to_string(),
                "rmarkdown::render('/code/input.Rmd', output_dir='/output/')".to_string(),
            ]
        } else {
            code_files.insert("script.R".to_string(), job.code_content.clone());
            vec!["Rscript".to_string(), "/code/script.R".to_string()]
        };

        PreparedExecution {
            image: images::R.to_string(),
            command,
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
    use uuid::Uuid;

    fn job(kind: RunnerKind, code: &str) -> VerificationJob {
        VerificationJob::new(Uuid::new_v4(), kind, "hash".into(), code.into(), "tester".into())
    }

    #[test]
    fn plain_script_runs_with_rscript() {
        let prepared = RRunner.prepare(&job(RunnerKind::RScript, "print(1)"));
        assert_eq!(prepared.command, vec!["Rscript", "/code/script.R"]);
        assert_eq!(prepared.code_files.get("script.R").unwrap(), "print(1)");
    }

    #[test]
    fn rmarkdown_renders_to_output_dir() {
        let prepared = RRunner.prepare(&job(RunnerKind::RMarkdown, "# doc"));
        assert!(prepared.command.iter().any(|arg| arg.contains("rmarkdown::render")));
        assert!(prepared.code_files.contains_key("input.Rmd"));
    }
}
