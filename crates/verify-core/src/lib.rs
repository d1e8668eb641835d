//! Core domain types and traits for the verification engine.
//!
//! This crate contains:
//! - Job/result data model (`job`, `result`)
//! - Closed enums for status, verification level, runner kind, comparison method (`enums`)
//! - The `Runner` and `Comparator` traits implemented by `verify-runners` and
//!   `verify-comparators`
//! - Error types shared across the workspace (`error`)

pub mod comparator;
pub mod enums;
pub mod error;
pub mod job;
pub mod result;
pub mod runner;

pub use comparator::{Comparator, ComparisonOptions, ComparisonOutcome};
pub use enums::{ComparisonMethod, JobStatus, RunnerKind, VerificationLevel};
pub use error::{Error, Result};
pub use job::{EnvironmentSpec, ExpectedOutput, ResourceLimits, VerificationJob};
pub use result::{OutputComparison, VerificationResult};
pub use runner::{PreparedExecution, Runner, RunnerOutput};
