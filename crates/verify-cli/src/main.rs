//! `verify` operator CLI.

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "verify")]
#[command(about = "phiacta-verify operator CLI", long_about = None)]
struct Cli {
    /// API server URL
    #[arg(long, env = "VERIFY_API_URL", default_value = "http://localhost:8080")]
    api_url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Submit a source file as a verification job
    Submit {
        /// Path to the source file to verify
        path: String,
        /// Claim id this code is verifying
        #[arg(long)]
        claim_id: String,
        /// Runner kind (python-script, python-notebook, r-script, r-markdown, julia, lean4, sympy, sage)
        #[arg(long)]
        runner: String,
        /// Identifier of the person or system submitting the job
        #[arg(long, default_value = "verify-cli")]
        submitted_by: String,
    },
    /// Check a job's status
    Status {
        /// Job id
        job_id: String,
    },
    /// Fetch a job's signed verdict
    Result {
        /// Job id
        job_id: String,
    },
    /// List recently submitted jobs
    List {
        /// Maximum number of jobs to show
        #[arg(long, default_value = "50")]
        limit: u32,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_env_filter("info").init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Submit { path, claim_id, runner, submitted_by } => {
            commands::submit(&cli.api_url, &path, &claim_id, &runner, &submitted_by).await?;
        }
        Commands::Status { job_id } => {
            commands::status(&cli.api_url, &job_id).await?;
        }
        Commands::Result { job_id } => {
            commands::result(&cli.api_url, &job_id).await?;
        }
        Commands::List { limit } => {
            commands::list(&cli.api_url, limit).await?;
        }
    }

    Ok(())
}
