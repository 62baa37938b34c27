//! Top-level targeting configuration with layered resolution.

use std::path::Path;

use serde::{Deserialize, Serialize};

use super::{CompilePolicy, EmptyBlockPolicy, EvaluationConfig, InclusionPolicy};
use crate::errors::ConfigError;

/// Top-level configuration.
///
/// Resolution order (highest priority first):
/// 1. Environment variables (`TARGETING_*`)
/// 2. Project config (`targeting.toml` in the project root)
/// 3. Compiled defaults
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct TargetingConfig {
    pub evaluation: EvaluationConfig,
    pub compile: CompilePolicy,
}

impl TargetingConfig {
    /// Load configuration with layered resolution.
    pub fn load(root: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        let project_path = root.join("targeting.toml");
        if project_path.exists() {
            let content = std::fs::read_to_string(&project_path).map_err(|_| {
                ConfigError::FileNotFound {
                    path: project_path.display().to_string(),
                }
            })?;
            let file_config: TargetingConfig =
                toml::from_str(&content).map_err(|e| ConfigError::ParseError {
                    path: project_path.display().to_string(),
                    message: e.to_string(),
                })?;
            Self::merge(&mut config, &file_config);
        }

        Self::apply_env_overrides(&mut config);
        Self::validate(&config)?;
        Ok(config)
    }

    /// Load configuration from a TOML string (for testing).
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        let config: TargetingConfig =
            toml::from_str(toml_str).map_err(|e| ConfigError::ParseError {
                path: "<string>".to_string(),
                message: e.to_string(),
            })?;
        Self::validate(&config)?;
        Ok(config)
    }

    /// Validate the resolved configuration.
    pub fn validate(config: &TargetingConfig) -> Result<(), ConfigError> {
        if let Some(timeout) = config.evaluation.timeout_ms {
            if timeout == 0 {
                return Err(ConfigError::ValidationFailed {
                    field: "evaluation.timeout_ms".to_string(),
                    message: "must be greater than 0".to_string(),
                });
            }
        }
        if let Some(batch) = config.evaluation.batch_size {
            if batch == 0 {
                return Err(ConfigError::ValidationFailed {
                    field: "evaluation.batch_size".to_string(),
                    message: "must be greater than 0".to_string(),
                });
            }
        }
        if let Some(workers) = config.evaluation.workers {
            if workers == 0 {
                return Err(ConfigError::ValidationFailed {
                    field: "evaluation.workers".to_string(),
                    message: "must be greater than 0".to_string(),
                });
            }
        }
        Ok(())
    }

    /// Merge `other` into `base`; `other` wins where it carries a value.
    fn merge(base: &mut TargetingConfig, other: &TargetingConfig) {
        if other.evaluation.timeout_ms.is_some() {
            base.evaluation.timeout_ms = other.evaluation.timeout_ms;
        }
        if other.evaluation.max_retries.is_some() {
            base.evaluation.max_retries = other.evaluation.max_retries;
        }
        if other.evaluation.retry_backoff_ms.is_some() {
            base.evaluation.retry_backoff_ms = other.evaluation.retry_backoff_ms;
        }
        if other.evaluation.workers.is_some() {
            base.evaluation.workers = other.evaluation.workers;
        }
        if other.evaluation.batch_size.is_some() {
            base.evaluation.batch_size = other.evaluation.batch_size;
        }
        base.compile = other.compile;
    }

    /// Apply environment variable overrides.
    /// Pattern: `TARGETING_EVALUATION_TIMEOUT_MS`, `TARGETING_INCLUSION_POLICY`, etc.
    fn apply_env_overrides(config: &mut TargetingConfig) {
        if let Ok(val) = std::env::var("TARGETING_EVALUATION_TIMEOUT_MS") {
            if let Ok(v) = val.parse::<u64>() {
                config.evaluation.timeout_ms = Some(v);
            }
        }
        if let Ok(val) = std::env::var("TARGETING_EVALUATION_MAX_RETRIES") {
            if let Ok(v) = val.parse::<u32>() {
                config.evaluation.max_retries = Some(v);
            }
        }
        if let Ok(val) = std::env::var("TARGETING_EVALUATION_WORKERS") {
            if let Ok(v) = val.parse::<usize>() {
                config.evaluation.workers = Some(v);
            }
        }
        if let Ok(val) = std::env::var("TARGETING_INCLUSION_POLICY") {
            match val.as_str() {
                "bypass_filters" => config.compile.inclusion = InclusionPolicy::BypassFilters,
                "require_filters" => config.compile.inclusion = InclusionPolicy::RequireFilters,
                _ => {}
            }
        }
        if let Ok(val) = std::env::var("TARGETING_EMPTY_BLOCK_POLICY") {
            match val.as_str() {
                "reject" => config.compile.empty_block = EmptyBlockPolicy::Reject,
                "any_member_exists" => {
                    config.compile.empty_block = EmptyBlockPolicy::AnyMemberExists
                }
                _ => {}
            }
        }
    }
}
