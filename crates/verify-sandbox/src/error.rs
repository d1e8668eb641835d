//! Errors raised while preparing or running a sandboxed container.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SandboxError {
    #[error("image {image:?} is not in the allowed image list")]
    ImageNotAllowed { image: String },

    #[error("path traversal in {kind} key: {path:?}")]
    PathTraversal { kind: &'static str, path: String },

    #[error("invalid security policy: {0}")]
    InvalidPolicy(String),

    #[error("docker API error: {0}")]
    Docker(#[from] bollard::errors::Error),

    #[error("container timed out after {0}s")]
    Timeout(u32),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, SandboxError>;
