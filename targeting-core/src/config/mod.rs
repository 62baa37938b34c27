//! Configuration system for the targeting engine.
//! TOML-based, layered resolution: env > project file > defaults.

pub mod evaluation_config;
pub mod policy_config;
pub mod targeting_config;

pub use evaluation_config::EvaluationConfig;
pub use policy_config::{CompilePolicy, EmptyBlockPolicy, InclusionPolicy};
pub use targeting_config::TargetingConfig;
