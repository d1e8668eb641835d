//! Configuration loading errors.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },
}

pub type ConfigResult<T> = std::result::Result<T, ConfigError>;
