//! Error types shared across the verification engine.

use thiserror::Error;

/// Errors that can occur while building, queueing, or processing a
/// verification job, independent of any particular crate's I/O concerns.
#[derive(Debug, Error)]
pub enum Error {
    #[error("validation failed: {0}")]
    Validation(String),

    #[error("transient backend error: {0}")]
    Transient(String),

    #[error("timeout: {0}")]
    Timeout(String),

    #[error("runtime failure: {0}")]
    RuntimeFailure(String),

    #[error("failed to deserialize stored job or result: {0}")]
    Deserialization(String),

    #[error("signing key unavailable: {0}")]
    SigningKeyMissing(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("internal error: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, Error>;
