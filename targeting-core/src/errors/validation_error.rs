//! Compile-time validation errors for submitted rule trees.
//! Reported as a batch so a rule-building UI can highlight every
//! offending filter in one round trip.

use serde::{Deserialize, Serialize};

use super::error_code::{self, TargetingErrorCode};

/// Points at the offending filter inside the rule tree.
///
/// `block_index` is `None` for household filters attached directly to the
/// rule; for member blocks it indexes into the concatenation of individual
/// blocks followed by collector blocks, matching the submission order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterLocation {
    pub rule_index: usize,
    pub block_index: Option<usize>,
}

impl FilterLocation {
    pub fn rule(rule_index: usize) -> Self {
        Self {
            rule_index,
            block_index: None,
        }
    }

    pub fn block(rule_index: usize, block_index: usize) -> Self {
        Self {
            rule_index,
            block_index: Some(block_index),
        }
    }
}

impl std::fmt::Display for FilterLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.block_index {
            Some(b) => write!(f, "rule {}, block {}", self.rule_index, b),
            None => write!(f, "rule {}", self.rule_index),
        }
    }
}

/// Validation errors raised while compiling a raw rule tree.
/// The compiler collects all of them before returning, never fail-fast.
#[derive(Debug, Clone, PartialEq, thiserror::Error, Serialize, Deserialize)]
pub enum ValidationError {
    #[error("{location}: unknown field `{field_name}`")]
    UnknownField {
        location: FilterLocation,
        field_name: String,
    },

    #[error("{location}: `{field_name}`: {message}")]
    ArgumentArityMismatch {
        location: FilterLocation,
        field_name: String,
        message: String,
    },

    #[error("{location}: `{field_name}`: {message}")]
    ArgumentTypeMismatch {
        location: FilterLocation,
        field_name: String,
        message: String,
    },

    #[error(
        "{location}: `{field_name}` is stored as {actual} but the filter declares {declared}"
    )]
    ClassificationMismatch {
        location: FilterLocation,
        field_name: String,
        actual: String,
        declared: String,
    },

    #[error("{location}: `{field_name}`: round {round:?} is not within 1..={rounds}")]
    InvalidRound {
        location: FilterLocation,
        field_name: String,
        round: Option<u32>,
        rounds: u32,
    },

    #[error("rule {rule_index} has no filters, no blocks, and no explicit ids")]
    EmptyRule { rule_index: usize },

    #[error("{location}: filter block contains no filters")]
    EmptyBlock { location: FilterLocation },
}

impl ValidationError {
    /// The rule this error points at.
    pub fn rule_index(&self) -> usize {
        match self {
            Self::UnknownField { location, .. }
            | Self::ArgumentArityMismatch { location, .. }
            | Self::ArgumentTypeMismatch { location, .. }
            | Self::ClassificationMismatch { location, .. }
            | Self::InvalidRound { location, .. }
            | Self::EmptyBlock { location } => location.rule_index,
            Self::EmptyRule { rule_index } => *rule_index,
        }
    }
}

impl TargetingErrorCode for ValidationError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::UnknownField { .. } => error_code::UNKNOWN_FIELD,
            Self::ArgumentArityMismatch { .. } => error_code::ARGUMENT_ARITY_MISMATCH,
            Self::ArgumentTypeMismatch { .. } => error_code::ARGUMENT_TYPE_MISMATCH,
            Self::ClassificationMismatch { .. } => error_code::CLASSIFICATION_MISMATCH,
            Self::InvalidRound { .. } => error_code::INVALID_ROUND,
            Self::EmptyRule { .. } => error_code::EMPTY_RULE,
            Self::EmptyBlock { .. } => error_code::EMPTY_BLOCK,
        }
    }
}
