//! Stable error codes for machine-readable reporting.

pub const UNKNOWN_FIELD: &str = "TGT1001";
pub const ARGUMENT_ARITY_MISMATCH: &str = "TGT1002";
pub const ARGUMENT_TYPE_MISMATCH: &str = "TGT1003";
pub const CLASSIFICATION_MISMATCH: &str = "TGT1004";
pub const INVALID_ROUND: &str = "TGT1005";
pub const EMPTY_RULE: &str = "TGT1006";
pub const EMPTY_BLOCK: &str = "TGT1007";

pub const EVALUATION_FAILED: &str = "TGT2001";
pub const EVALUATION_TIMED_OUT: &str = "TGT2002";
pub const CANCELLED: &str = "TGT2003";

pub const STORAGE: &str = "TGT3001";
pub const MIGRATION_FAILED: &str = "TGT3002";
pub const NOT_FOUND: &str = "TGT3003";
pub const FREEZE_CONFLICT: &str = "TGT3004";

pub const CONFIG: &str = "TGT4001";

/// Trait mapping an error to its stable code.
/// Codes are part of the external contract and must never be renumbered.
pub trait TargetingErrorCode {
    fn error_code(&self) -> &'static str;
}
