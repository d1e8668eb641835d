//! CLI command implementations. Thin wrappers over the HTTP API.

use anyhow::{Context, Result, bail};
use serde_json::{Value, json};

fn runner_kind_wire_value(runner: &str) -> Result<&'static str> {
    Ok(match runner {
        "python-script" => "PYTHON_SCRIPT",
        "python-notebook" => "PYTHON_NOTEBOOK",
        "r-script" => "R_SCRIPT",
        "r-markdown" => "R_MARKDOWN",
        "julia" => "JULIA",
        "lean4" => "LEAN4",
        "sympy" => "SYMPY",
        "sage" => "SAGE",
        other => bail!(
            "unknown runner kind '{other}' (expected one of: python-script, python-notebook, r-script, r-markdown, julia, lean4, sympy, sage)"
        ),
    })
}

pub async fn submit(
    api_url: &str,
    path: &str,
    claim_id: &str,
    runner: &str,
    submitted_by: &str,
) -> Result<()> {
    let code_content =
        std::fs::read_to_string(path).with_context(|| format!("failed to read source file: {path}"))?;
    let runner_kind = runner_kind_wire_value(runner)?;

    let client = reqwest::Client::new();
    let resp = client
        .post(format!("{api_url}/v1/jobs"))
        .json(&json!({
            "claim_id": claim_id,
            "runner_kind": runner_kind,
            "code_content": code_content,
            "submitted_by": submitted_by,
        }))
        .send()
        .await
        .context("failed to reach the verification API")?;

    print_response(resp).await
}

pub async fn status(api_url: &str, job_id: &str) -> Result<()> {
    let resp = reqwest::get(format!("{api_url}/v1/jobs/{job_id}"))
        .await
        .context("failed to reach the verification API")?;
    print_response(resp).await
}

pub async fn result(api_url: &str, job_id: &str) -> Result<()> {
    let resp = reqwest::get(format!("{api_url}/v1/jobs/{job_id}/result"))
        .await
        .context("failed to reach the verification API")?;
    print_response(resp).await
}

pub async fn list(api_url: &str, limit: u32) -> Result<()> {
    let resp = reqwest::get(format!("{api_url}/v1/jobs?limit={limit}"))
        .await
        .context("failed to reach the verification API")?;
    print_response(resp).await
}

async fn print_response(resp: reqwest::Response) -> Result<()> {
    let status = resp.status();
    let body: Value = resp.json().await.context("failed to parse API response as JSON")?;
    println!("{}", serde_json::to_string_pretty(&body)?);
    if !status.is_success() {
        bail!("request failed with status {status}");
    }
    Ok(())
}
