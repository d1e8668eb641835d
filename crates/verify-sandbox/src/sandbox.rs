//! Docker container lifecycle management for sandboxed code execution.
//!
//! Each call to [`ContainerSandbox::run`] creates a fresh container,
//! executes the specified command, collects results, and unconditionally
//! removes the container regardless of success or failure.

use std::collections::HashMap;
use std::path::Path;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use bollard::Docker;
use bollard::container::{
    Config, DownloadFromContainerOptions, KillContainerOptions, LogOutput, LogsOptions,
    RemoveContainerOptions, StartContainerOptions, WaitContainerOptions,
};
use bollard::errors::Error as BollardError;
use bollard::image::CreateImageOptions;
use bytes::Bytes;
use futures::StreamExt;
use tempfile::TempDir;
use tracing::{info, warn};

use crate::error::{Result, SandboxError};
use crate::images;
use crate::output::{
    MAX_OUTPUT_BYTES, MAX_OUTPUT_FILES_BYTES, check_safe_relative_path, extract_tar,
    sanitize_output, strip_output_prefix, truncate_bytes,
};
use crate::security::SecurityPolicy;

/// Environment variable names that must never be forwarded to sandbox
/// containers because they can alter interpreter behaviour in dangerous
/// ways (executing arbitrary code at startup, loading shared libraries).
const BLOCKED_ENV_VARS: &[&str] = &[
    "LD_PRELOAD",
    "LD_LIBRARY_PATH",
    "PYTHONSTARTUP",
    "PYTHONPATH",
    "PYTHONINSPECT",
    "PYTHONBREAKPOINT",
    "RUBYOPT",
    "PERL5OPT",
    "NODE_OPTIONS",
    "JAVA_TOOL_OPTIONS",
    "R_PROFILE",
    "R_PROFILE_USER",
    "R_ENVIRON",
    "R_ENVIRON_USER",
    "JULIA_LOAD_PATH",
    "JULIA_DEPOT_PATH",
    "BASH_ENV",
    "ENV",
    "CDPATH",
    "GLOBIGNORE",
    "PATH",
    "HOME",
];

fn sanitize_env(env_vars: &HashMap<String, String>) -> Vec<String> {
    env_vars
        .iter()
        .filter_map(|(key, value)| {
            if BLOCKED_ENV_VARS.contains(&key.to_uppercase().as_str()) {
                warn!(env_var = %key, "blocked dangerous env var");
                None
            } else {
                Some(format!("{key}={value}"))
            }
        })
        .collect()
}

/// Outcome of a sandboxed container execution.
#[derive(Debug, Clone)]
pub struct SandboxResult {
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
    pub output_files: HashMap<String, Vec<u8>>,
    pub execution_time_seconds: f64,
    pub timed_out: bool,
}

/// A backend capable of running a verification job's prepared execution in
/// isolation and returning its outcome.
///
/// Production code only ever has [`ContainerSandbox`] behind this trait;
/// the seam exists so the worker pipeline can be exercised against a fake
/// backend without a Docker daemon.
#[async_trait]
pub trait SandboxExecutor: Send + Sync {
    async fn run(
        &self,
        image: &str,
        command: Vec<String>,
        code_files: &HashMap<String, String>,
        data_files: Option<&HashMap<String, Vec<u8>>>,
        policy: &SecurityPolicy,
        env_vars: Option<&HashMap<String, String>>,
    ) -> Result<SandboxResult>;
}

/// Manages the full lifecycle of ephemeral Docker containers used to run
/// untrusted verification code.
pub struct ContainerSandbox {
    docker: Docker,
}

impl ContainerSandbox {
    pub fn new() -> Result<Self> {
        let docker = Docker::connect_with_local_defaults()?;
        Ok(Self { docker })
    }

    pub fn with_client(docker: Docker) -> Self {
        Self { docker }
    }

    /// Execute `command` inside a sandboxed container and return the
    /// result. The container and its temporary bind-mount directories are
    /// removed before this returns, whether it returns `Ok` or `Err`.
    pub async fn run(
        &self,
        image: &str,
        command: Vec<String>,
        code_files: &HashMap<String, String>,
        data_files: Option<&HashMap<String, Vec<u8>>>,
        policy: &SecurityPolicy,
        env_vars: Option<&HashMap<String, String>>,
    ) -> Result<SandboxResult> {
        if !images::is_allowed(image) {
            return Err(SandboxError::ImageNotAllowed {
                image: image.to_string(),
            });
        }

        let code_dir = stage_files("verify_code_", code_files, "code_files")?;
        let data_dir = match data_files {
            Some(files) if !files.is_empty() => Some(stage_bytes("verify_data_", files, "data_files")?),
            _ => None,
        };

        let mut binds = vec![format!("{}:/code:ro", code_dir.path().display())];
        if let Some(dir) = &data_dir {
            binds.push(format!("{}:/data:ro", dir.path().display()));
        }

        let mut host_config = policy.to_host_config();
        host_config.binds = Some(binds);

        let safe_env = env_vars.map(sanitize_env).unwrap_or_default();

        self.pull_image(image).await;

        let config = Config {
            image: Some(image.to_string()),
            cmd: Some(command),
            working_dir: Some("/code".to_string()),
            env: Some(safe_env),
            attach_stdout: Some(true),
            attach_stderr: Some(true),
            tty: Some(false),
            host_config: Some(host_config),
            ..Default::default()
        };

        let container = self
            .docker
            .create_container(None::<bollard::container::CreateContainerOptions<String>>, config)
            .await?;
        let container_id = container.id;
        info!(container = %container_id, %image, "container created");

        let result = self.run_created_container(&container_id, policy).await;

        self.remove_container(&container_id).await;
        // code_dir/data_dir are cleaned up on drop at the end of this scope.

        result
    }

    async fn run_created_container(
        &self,
        container_id: &str,
        policy: &SecurityPolicy,
    ) -> Result<SandboxResult> {
        self.docker
            .start_container(container_id, None::<StartContainerOptions<String>>)
            .await?;
        info!(container = %container_id, "container started");

        let start = Instant::now();
        let (exit_code, timed_out) = self.wait_with_timeout(container_id, policy.timeout_seconds()).await;
        let elapsed = start.elapsed().as_secs_f64();

        let raw_stdout = self.collect_logs(container_id, true, false).await;
        let raw_stderr = self.collect_logs(container_id, false, true).await;

        let stdout_text = sanitize_output(&String::from_utf8_lossy(&truncate_bytes(
            raw_stdout,
            MAX_OUTPUT_BYTES,
        )));
        let stderr_text = sanitize_output(&String::from_utf8_lossy(&truncate_bytes(
            raw_stderr,
            MAX_OUTPUT_BYTES,
        )));

        let output_files = self.collect_output_files(container_id).await;

        Ok(SandboxResult {
            exit_code,
            stdout: stdout_text,
            stderr: stderr_text,
            output_files,
            execution_time_seconds: (elapsed * 1000.0).round() / 1000.0,
            timed_out,
        })
    }

    async fn wait_with_timeout(&self, container_id: &str, timeout_seconds: u32) -> (i32, bool) {
        let options = WaitContainerOptions {
            condition: "not-running",
        };
        let mut stream = self.docker.wait_container(container_id, Some(options));

        let outcome = tokio::time::timeout(
            Duration::from_secs(timeout_seconds as u64),
            stream.next(),
        )
        .await;

        match outcome {
            Ok(Some(Ok(response))) => (response.status_code as i32, false),
            Ok(Some(Err(e))) => {
                warn!(container = %container_id, error = %e, "container wait errored, killing");
                self.kill_container(container_id).await;
                (-1, true)
            }
            Ok(None) => {
                warn!(container = %container_id, "wait stream ended with no result");
                (-1, true)
            }
            Err(_) => {
                warn!(container = %container_id, timeout = timeout_seconds, "container timed out, killing");
                self.kill_container(container_id).await;
                (-1, true)
            }
        }
    }

    async fn kill_container(&self, container_id: &str) {
        if let Err(e) = self
            .docker
            .kill_container(container_id, None::<KillContainerOptions<String>>)
            .await
        {
            // Container may have already exited; this is expected and not
            // worth surfacing above debug level.
            tracing::debug!(container = %container_id, error = %e, "kill failed, likely already exited");
        }
    }

    async fn collect_logs(&self, container_id: &str, stdout: bool, stderr: bool) -> Vec<u8> {
        let options = LogsOptions::<String> {
            follow: false,
            stdout,
            stderr,
            tail: "all".to_string(),
            ..Default::default()
        };
        let mut stream = self.docker.logs(container_id, Some(options));
        let mut buf = Vec::new();
        while let Some(chunk) = stream.next().await {
            match chunk {
                Ok(LogOutput::StdOut { message })
                | Ok(LogOutput::StdErr { message })
                | Ok(LogOutput::Console { message })
                | Ok(LogOutput::StdIn { message }) => buf.extend_from_slice(&message),
                Err(e) => {
                    warn!(container = %container_id, error = %e, "log stream error");
                    break;
                }
            }
        }
        buf
    }

    async fn collect_output_files(&self, container_id: &str) -> HashMap<String, Vec<u8>> {
        let options = DownloadFromContainerOptions {
            path: "/output/".to_string(),
        };
        let mut stream = self.docker.download_from_container(container_id, Some(options));

        let mut chunks: Vec<Bytes> = Vec::new();
        let mut total = 0usize;
        loop {
            match stream.next().await {
                Some(Ok(chunk)) => {
                    total += chunk.len();
                    if total > MAX_OUTPUT_FILES_BYTES {
                        warn!(
                            container = %container_id,
                            limit = MAX_OUTPUT_FILES_BYTES,
                            "output archive exceeds size limit, truncating"
                        );
                        break;
                    }
                    chunks.push(chunk);
                }
                Some(Err(BollardError::DockerResponseServerError { status_code: 404, .. })) => {
                    // /output/ does not exist -- perfectly fine, no output files.
                    return HashMap::new();
                }
                Some(Err(e)) => {
                    warn!(container = %container_id, error = %e, "failed to retrieve /output/");
                    return HashMap::new();
                }
                None => break,
            }
        }

        let archive: Vec<u8> = chunks.into_iter().flat_map(|c| c.to_vec()).collect();
        match extract_tar(&archive) {
            Ok(files) => strip_output_prefix(files),
            Err(e) => {
                warn!(container = %container_id, error = %e, "failed to extract output archive");
                HashMap::new()
            }
        }
    }

    async fn remove_container(&self, container_id: &str) {
        let options = RemoveContainerOptions {
            force: true,
            ..Default::default()
        };
        match self.docker.remove_container(container_id, Some(options)).await {
            Ok(()) => info!(container = %container_id, "container removed"),
            Err(e) => warn!(container = %container_id, error = %e, "failed to remove container"),
        }
    }

    async fn pull_image(&self, image: &str) {
        let options = CreateImageOptions {
            from_image: image.to_string(),
            ..Default::default()
        };
        let mut stream = self.docker.create_image(Some(options), None, None);
        while let Some(result) = stream.next().await {
            if let Err(e) = result {
                warn!(%image, error = %e, "pull warning");
            }
        }
    }
}

#[async_trait]
impl SandboxExecutor for ContainerSandbox {
    async fn run(
        &self,
        image: &str,
        command: Vec<String>,
        code_files: &HashMap<String, String>,
        data_files: Option<&HashMap<String, Vec<u8>>>,
        policy: &SecurityPolicy,
        env_vars: Option<&HashMap<String, String>>,
    ) -> Result<SandboxResult> {
        ContainerSandbox::run(self, image, command, code_files, data_files, policy, env_vars).await
    }
}

fn stage_files(prefix: &str, files: &HashMap<String, String>, kind: &'static str) -> Result<TempDir> {
    let dir = tempfile::Builder::new().prefix(prefix).tempdir()?;
    for (relative_path, content) in files {
        check_safe_relative_path(kind, relative_path)?;
        write_staged_file(dir.path(), relative_path, content.as_bytes())?;
    }
    Ok(dir)
}

fn stage_bytes(prefix: &str, files: &HashMap<String, Vec<u8>>, kind: &'static str) -> Result<TempDir> {
    let dir = tempfile::Builder::new().prefix(prefix).tempdir()?;
    for (relative_path, content) in files {
        check_safe_relative_path(kind, relative_path)?;
        write_staged_file(dir.path(), relative_path, content)?;
    }
    Ok(dir)
}

fn write_staged_file(base: &Path, relative_path: &str, content: &[u8]) -> Result<()> {
    let dest = base.join(relative_path);
    if let Some(parent) = dest.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(dest, content)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_env_drops_blocked_vars() {
        let mut env = HashMap::new();
        env.insert("LD_PRELOAD".to_string(), "evil.so".to_string());
        env.insert("MY_VAR".to_string(), "ok".to_string());
        let safe = sanitize_env(&env);
        assert_eq!(safe.len(), 1);
        assert_eq!(safe[0], "MY_VAR=ok");
    }

    #[test]
    fn sanitize_env_blocklist_is_case_insensitive() {
        let mut env = HashMap::new();
        env.insert("path".to_string(), "/evil".to_string());
        assert!(sanitize_env(&env).is_empty());
    }

    #[test]
    fn stage_files_rejects_path_traversal() {
        let mut files = HashMap::new();
        files.insert("../escape.py".to_string(), "evil".to_string());
        let result = stage_files("verify_test_", &files, "code_files");
        assert!(result.is_err());
    }

    #[test]
    fn stage_files_writes_nested_paths() {
        let mut files = HashMap::new();
        files.insert("sub/dir/main.py".to_string(), "print(1)".to_string());
        let dir = stage_files("verify_test_", &files, "code_files").unwrap();
        let content = std::fs::read_to_string(dir.path().join("sub/dir/main.py")).unwrap();
        assert_eq!(content, "print(1)");
    }
}

#[cfg(test)]
mod integration_tests {
    use super::*;

    /// Requires a real Docker daemon with the `verify-runner-python` image
    /// available. Run with `cargo test -- --ignored`.
    #[tokio::test]
    #[ignore]
    async fn runs_hello_world_in_python_image() {
        let sandbox = ContainerSandbox::new().expect("connect to docker");
        let mut code_files = HashMap::new();
        code_files.insert("main.py".to_string(), "print('hello')".to_string());
        let policy = SecurityPolicy::default();

        let result = sandbox
            .run(
                images::PYTHON,
                vec!["python3".to_string(), "/code/main.py".to_string()],
                &code_files,
                None,
                &policy,
                None,
            )
            .await
            .expect("sandbox run should succeed");

        assert_eq!(result.exit_code, 0);
        assert!(result.stdout.contains("hello"));
        assert!(!result.timed_out);
    }

    #[tokio::test]
    #[ignore]
    async fn rejects_disallowed_image() {
        let sandbox = ContainerSandbox::new().expect("connect to docker");
        let code_files = HashMap::new();
        let policy = SecurityPolicy::default();

        let result = sandbox
            .run("alpine:latest", vec![], &code_files, None, &policy, None)
            .await;

        assert!(matches!(result, Err(SandboxError::ImageNotAllowed { .. })));
    }
}
