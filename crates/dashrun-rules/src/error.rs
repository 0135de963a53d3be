//! Error types for rule validation.

use crate::StatKind;

/// A stat change was rejected. Nothing was modified.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum StatsError {
    /// The named stat is outside the allowed range (or not a number).
    #[error("{stat} must be between {min} and {max}, got {value}")]
    OutOfRange {
        stat: StatKind,
        value: f64,
        min: f64,
        max: f64,
    },
}
