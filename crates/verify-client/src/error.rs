use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("request to claims API failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("claims API returned {status}: {body}")]
    Status { status: reqwest::StatusCode, body: String },
}
