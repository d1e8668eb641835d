//! Background worker (C7) orchestrating the verification pipeline: queue,
//! sandbox, runners, comparators, and signer wired together into a single
//! dequeue-run-classify-sign loop.

pub mod worker;

pub use worker::{process_job, run_worker, CONSUMER_GROUP};
