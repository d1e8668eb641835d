//! Ed25519 result signing (C5).

mod error;
mod signer;

pub use error::SignerError;
pub use signer::ResultSigner;
