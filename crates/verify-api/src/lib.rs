//! HTTP API for submitting and tracking verification jobs.
//!
//! Thin by design: the worker owns every piece of the verification
//! pipeline, this crate only exposes it over HTTP.

pub mod error;
pub mod routes;
pub mod state;

pub use state::AppState;
