use thiserror::Error;

#[derive(Debug, Error)]
pub enum SignerError {
    #[error("failed to read signing key at {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed PKCS8 PEM signing key: {0}")]
    InvalidKey(#[from] ed25519_dalek::pkcs8::Error),

    #[error("failed to write signing key to {path}: {source}")]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },
}
