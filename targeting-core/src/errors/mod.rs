//! Error handling for the targeting engine.
//! One error enum per subsystem, `thiserror` only, zero `anyhow`.

pub mod config_error;
pub mod engine_error;
pub mod error_code;
pub mod evaluation_error;
pub mod storage_error;
pub mod validation_error;

pub use config_error::ConfigError;
pub use engine_error::EngineError;
pub use error_code::TargetingErrorCode;
pub use evaluation_error::EvaluationError;
pub use storage_error::StorageError;
pub use validation_error::{FilterLocation, ValidationError};
