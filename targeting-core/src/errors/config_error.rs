//! Configuration errors.

use super::error_code::{self, TargetingErrorCode};

#[derive(Debug, Clone, thiserror::Error)]
pub enum ConfigError {
    #[error("config file not found: {path}")]
    FileNotFound { path: String },

    #[error("failed to parse {path}: {message}")]
    ParseError { path: String, message: String },

    #[error("invalid config value for `{field}`: {message}")]
    ValidationFailed { field: String, message: String },
}

impl TargetingErrorCode for ConfigError {
    fn error_code(&self) -> &'static str {
        error_code::CONFIG
    }
}
