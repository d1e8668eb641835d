//! phiacta-verify worker process.
//!
//! Spawns `settings.max_concurrent_jobs` consumer tasks, each with a unique
//! consumer name inside the shared `verify-workers` consumer group, and
//! waits for them to drain on `Ctrl-C` before exiting.

use std::path::Path;
use std::sync::Arc;

use tokio::sync::watch;
use tracing::info;
use tracing_subscriber::EnvFilter;

use verify_config::Settings;
use verify_queue::JobQueue;
use verify_sandbox::{ContainerSandbox, SandboxExecutor};
use verify_signer::ResultSigner;
use verify_worker::run_worker;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = Settings::from_env()?;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_new(&settings.log_level).unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    info!("connecting to queue backend...");
    let queue = Arc::new(JobQueue::connect(&settings.redis_url).await?);
    info!("queue connected");

    let sandbox: Arc<dyn SandboxExecutor> = Arc::new(ContainerSandbox::new()?);
    let signer = Arc::new(ResultSigner::new(Some(Path::new(&settings.signing_key_path)))?);

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let hostname = std::env::var("HOSTNAME").unwrap_or_else(|_| "worker".to_string());
    let mut handles = Vec::with_capacity(settings.max_concurrent_jobs as usize);
    for i in 0..settings.max_concurrent_jobs {
        let consumer_name = format!("{hostname}-{i}");
        let queue = Arc::clone(&queue);
        let sandbox = Arc::clone(&sandbox);
        let signer = Arc::clone(&signer);
        let shutdown_rx = shutdown_rx.clone();
        handles.push(tokio::spawn(async move {
            run_worker(queue, sandbox, signer, &consumer_name, shutdown_rx).await;
        }));
    }

    info!(consumers = settings.max_concurrent_jobs, "worker pool started");
    tokio::signal::ctrl_c().await?;
    info!("shutdown signal received, draining in-flight jobs...");
    shutdown_tx.send(true)?;

    for handle in handles {
        let _ = handle.await;
    }
    info!("worker pool stopped");

    Ok(())
}
