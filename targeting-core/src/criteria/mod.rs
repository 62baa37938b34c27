//! The raw, user-submitted rule tree as it arrives from the API layer.

pub mod raw;

pub use raw::{
    ComparisonMethod, FlexFieldClassification, RawBlock, RawCriteria, RawFilter, RawRule,
};
