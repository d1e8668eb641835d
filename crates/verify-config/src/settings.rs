//! Application configuration loaded from `VERIFY_*` environment variables.

use crate::error::{ConfigError, ConfigResult};

/// Configuration loaded from the environment at process startup.
///
/// Invalid values (non-numeric where numeric is expected) fail loading
/// outright — the process refuses to start rather than run with a guessed
/// value.
#[derive(Debug, Clone)]
pub struct Settings {
    pub redis_url: String,
    pub claims_api_url: String,
    pub claims_api_token: String,
    pub signing_key_path: String,
    pub max_concurrent_jobs: u32,
    pub max_code_size_bytes: usize,
    pub log_level: String,
    pub cors_allowed_origins: Vec<String>,
    pub bind_addr: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            redis_url: "redis://localhost:6379/0".to_string(),
            claims_api_url: "http://localhost:8000".to_string(),
            claims_api_token: String::new(),
            signing_key_path: "keys/ed25519.pem".to_string(),
            max_concurrent_jobs: 4,
            max_code_size_bytes: 1_048_576,
            log_level: "info".to_string(),
            cors_allowed_origins: vec!["http://localhost:3000".to_string()],
            bind_addr: "0.0.0.0:8080".to_string(),
        }
    }
}

impl Settings {
    /// Load settings from the process environment, falling back to
    /// documented defaults for anything unset.
    pub fn from_env() -> ConfigResult<Self> {
        Self::from_env_source(|key| std::env::var(key).ok())
    }

    /// Same as [`Self::from_env`] but takes an explicit lookup function,
    /// so tests can supply a fixed environment without mutating the
    /// process-global one.
    pub fn from_env_source(lookup: impl Fn(&str) -> Option<String>) -> ConfigResult<Self> {
        let defaults = Settings::default();

        let max_concurrent_jobs = match lookup("VERIFY_MAX_CONCURRENT_JOBS") {
            Some(raw) => parse_field("VERIFY_MAX_CONCURRENT_JOBS", &raw)?,
            None => defaults.max_concurrent_jobs,
        };
        let max_code_size_bytes = match lookup("VERIFY_MAX_CODE_SIZE_BYTES") {
            Some(raw) => parse_field("VERIFY_MAX_CODE_SIZE_BYTES", &raw)?,
            None => defaults.max_code_size_bytes,
        };
        let cors_allowed_origins = match lookup("VERIFY_CORS_ALLOWED_ORIGINS") {
            Some(raw) => raw
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
            None => defaults.cors_allowed_origins,
        };

        Ok(Settings {
            redis_url: lookup("VERIFY_REDIS_URL").unwrap_or(defaults.redis_url),
            claims_api_url: lookup("VERIFY_CLAIMS_API_URL").unwrap_or(defaults.claims_api_url),
            claims_api_token: lookup("VERIFY_CLAIMS_API_TOKEN").unwrap_or(defaults.claims_api_token),
            signing_key_path: lookup("VERIFY_SIGNING_KEY_PATH").unwrap_or(defaults.signing_key_path),
            max_concurrent_jobs,
            max_code_size_bytes,
            log_level: lookup("VERIFY_LOG_LEVEL").unwrap_or(defaults.log_level),
            cors_allowed_origins,
            bind_addr: lookup("VERIFY_BIND_ADDR").unwrap_or(defaults.bind_addr),
        })
    }
}

fn parse_field<T: std::str::FromStr>(field: &str, raw: &str) -> ConfigResult<T> {
    raw.parse().map_err(|_| ConfigError::InvalidValue {
        field: field.to_string(),
        message: format!("{raw:?} is not a valid number"),
    })
}
