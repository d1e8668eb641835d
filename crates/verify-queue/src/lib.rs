//! Redis Streams job queue (C6): enqueue/dequeue, status tracking, result
//! storage, and a recency index for listing jobs.

mod error;
mod queue;

pub use queue::{DequeuedJob, JobQueue, RecentJob};
