//! Redis Streams job queue.

use redis::aio::ConnectionManager;
use redis::streams::{StreamReadOptions, StreamReadReply};
use redis::AsyncCommands;
use uuid::Uuid;
use verify_core::{Error, JobStatus, Result, VerificationJob, VerificationResult};

use crate::error::{from_json, from_redis};

const STREAM_KEY: &str = "verify:jobs:stream";
const STATUS_PREFIX: &str = "verify:jobs:status:";
const RESULT_PREFIX: &str = "verify:jobs:result:";
const JOB_PREFIX: &str = "verify:jobs:data:";
const JOBS_INDEX_KEY: &str = "verify:jobs:index";

/// Summary row returned by [`JobQueue::list_recent_jobs`].
#[derive(Debug, Clone)]
pub struct RecentJob {
    pub job_id: Uuid,
    /// `None` if the status key has expired or was never set.
    pub status: Option<JobStatus>,
}

/// A message popped from the stream, paired with the id needed to
/// acknowledge it once processing completes.
#[derive(Debug, Clone)]
pub struct DequeuedJob {
    pub message_id: String,
    pub job: VerificationJob,
}

/// Redis-backed job queue using Redis Streams with a consumer group, plus
/// plain key-value storage for job data, status, and results.
#[derive(Clone)]
pub struct JobQueue {
    redis: ConnectionManager,
}

impl JobQueue {
    pub async fn connect(redis_url: &str) -> Result<Self> {
        let client = redis::Client::open(redis_url)
            .map_err(|e| Error::Internal(format!("invalid redis url: {e}")))?;
        let redis = client.get_connection_manager().await.map_err(from_redis)?;
        Ok(Self { redis })
    }

    pub async fn health_check(&self) -> bool {
        let mut conn = self.redis.clone();
        redis::cmd("PING").query_async::<String>(&mut conn).await.is_ok()
    }

    /// Add a job to the stream and mark it `QUEUED`. Returns the Redis
    /// message id.
    pub async fn enqueue(&self, job: &VerificationJob) -> Result<String> {
        let mut conn = self.redis.clone();
        let job_id = job.id.to_string();
        let job_data = serde_json::to_string(job).map_err(from_json)?;

        let _: () = conn
            .set(format!("{JOB_PREFIX}{job_id}"), &job_data)
            .await
            .map_err(from_redis)?;

        let _: () = conn
            .zadd(JOBS_INDEX_KEY, job_id.as_str(), job.created_at.timestamp() as f64)
            .await
            .map_err(from_redis)?;

        let msg_id: String = conn
            .xadd(STREAM_KEY, "*", &[("job_id", job_id.as_str()), ("data", job_data.as_str())])
            .await
            .map_err(from_redis)?;

        self.set_status(&job_id, JobStatus::Queued).await?;
        tracing::info!(job_id, msg_id, "enqueued job");
        Ok(msg_id)
    }

    /// Read new messages from the stream as part of `group`, creating the
    /// group (and the stream, if needed) on first use.
    pub async fn dequeue(
        &self,
        group: &str,
        consumer: &str,
        count: usize,
        block_ms: usize,
    ) -> Result<Vec<DequeuedJob>> {
        let mut conn = self.redis.clone();

        match conn
            .xgroup_create_mkstream::<_, _, _, String>(STREAM_KEY, group, "0")
            .await
        {
            Ok(_) => {}
            Err(e) if e.code() == Some("BUSYGROUP") => {}
            Err(e) => return Err(from_redis(e)),
        }

        let options = StreamReadOptions::default()
            .group(group, consumer)
            .count(count)
            .block(block_ms);
        let reply: StreamReadReply = conn
            .xread_options(&[STREAM_KEY], &[">"], &options)
            .await
            .map_err(from_redis)?;

        let mut jobs = Vec::new();
        for stream_key in reply.keys {
            for entry in stream_key.ids {
                let data: Option<String> = entry.get("data");
                let Some(data) = data else {
                    tracing::warn!(message_id = entry.id, "stream entry missing data field");
                    continue;
                };
                match serde_json::from_str::<VerificationJob>(&data) {
                    Ok(job) => jobs.push(DequeuedJob { message_id: entry.id, job }),
                    Err(e) => {
                        tracing::error!(message_id = entry.id, error = %e, "failed to deserialize job");
                    }
                }
            }
        }
        Ok(jobs)
    }

    pub async fn acknowledge(&self, message_id: &str, group: &str) -> Result<()> {
        let mut conn = self.redis.clone();
        let _: i64 = conn.xack(STREAM_KEY, group, &[message_id]).await.map_err(from_redis)?;
        Ok(())
    }

    pub async fn set_status(&self, job_id: &str, status: JobStatus) -> Result<()> {
        let mut conn = self.redis.clone();
        let value = serde_json::to_value(status).map_err(from_json)?;
        let value = value.as_str().expect("JobStatus serializes to a string").to_string();
        let _: () = conn
            .set(format!("{STATUS_PREFIX}{job_id}"), &value)
            .await
            .map_err(from_redis)?;
        tracing::debug!(job_id, status = %value, "status updated");
        Ok(())
    }

    pub async fn get_status(&self, job_id: &str) -> Result<Option<JobStatus>> {
        let mut conn = self.redis.clone();
        let raw: Option<String> = conn.get(format!("{STATUS_PREFIX}{job_id}")).await.map_err(from_redis)?;
        Ok(raw.and_then(|value| serde_json::from_value(serde_json::Value::String(value)).ok()))
    }

    /// Persist a verification result and mark the job `COMPLETED`.
    pub async fn store_result(&self, job_id: &str, result: &VerificationResult) -> Result<()> {
        let mut conn = self.redis.clone();
        let data = serde_json::to_string(result).map_err(from_json)?;
        let _: () = conn
            .set(format!("{RESULT_PREFIX}{job_id}"), &data)
            .await
            .map_err(from_redis)?;
        self.set_status(job_id, JobStatus::Completed).await
    }

    pub async fn get_result(&self, job_id: &str) -> Result<Option<VerificationResult>> {
        let mut conn = self.redis.clone();
        let raw: Option<String> = conn.get(format!("{RESULT_PREFIX}{job_id}")).await.map_err(from_redis)?;
        raw.map(|data| serde_json::from_str(&data).map_err(from_json)).transpose()
    }

    pub async fn get_job(&self, job_id: &str) -> Result<Option<VerificationJob>> {
        let mut conn = self.redis.clone();
        let raw: Option<String> = conn.get(format!("{JOB_PREFIX}{job_id}")).await.map_err(from_redis)?;
        raw.map(|data| serde_json::from_str(&data).map_err(from_json)).transpose()
    }

    /// Most recently created `limit` jobs with their current status,
    /// newest first.
    pub async fn list_recent_jobs(&self, limit: isize) -> Result<Vec<RecentJob>> {
        let mut conn = self.redis.clone();
        let job_ids: Vec<String> = conn
            .zrevrange(JOBS_INDEX_KEY, 0, limit.saturating_sub(1))
            .await
            .map_err(from_redis)?;

        let mut rows = Vec::with_capacity(job_ids.len());
        for raw_id in job_ids {
            let status = self.get_status(&raw_id).await?;
            let Ok(job_id) = raw_id.parse::<Uuid>() else {
                tracing::warn!(raw_id, "index contains non-uuid job id");
                continue;
            };
            rows.push(RecentJob { job_id, status });
        }
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_names_match_the_wire_contract() {
        assert_eq!(STREAM_KEY, "verify:jobs:stream");
        assert_eq!(STATUS_PREFIX, "verify:jobs:status:");
        assert_eq!(RESULT_PREFIX, "verify:jobs:result:");
        assert_eq!(JOB_PREFIX, "verify:jobs:data:");
        assert_eq!(JOBS_INDEX_KEY, "verify:jobs:index");
    }
}

#[cfg(test)]
mod integration_tests {
    //! These exercise a real Redis instance and are ignored by default.
    //! Run with `REDIS_URL=redis://127.0.0.1 cargo test -- --ignored`.
    use super::*;
    use verify_core::RunnerKind;

    async fn connect() -> JobQueue {
        let url = std::env::var("REDIS_URL").unwrap_or_else(|_| "redis://127.0.0.1".into());
        JobQueue::connect(&url).await.unwrap()
    }

    #[tokio::test]
    #[ignore]
    async fn enqueue_then_dequeue_round_trips() {
        let queue = connect().await;
        let job = VerificationJob::new(
            Uuid::new_v4(),
            RunnerKind::PythonScript,
            "deadbeef".into(),
            "print(1)".into(),
            "tester".into(),
        );
        queue.enqueue(&job).await.unwrap();

        let dequeued = queue.dequeue("verify-workers", "test-consumer", 1, 1000).await.unwrap();
        assert!(dequeued.iter().any(|d| d.job.id == job.id));

        for d in &dequeued {
            queue.acknowledge(&d.message_id, "verify-workers").await.unwrap();
        }
    }
}
