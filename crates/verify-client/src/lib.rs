//! Thin async HTTP client for the upstream claims API.

mod client;
mod error;

pub use client::ClaimsApiClient;
pub use error::ClientError;
