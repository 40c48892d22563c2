//! Validation Error Types

use crate::sample::Field;
use thiserror::Error;

/// Errors during sample validation
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    /// No sample was supplied at all
    #[error("Sample is missing")]
    MissingSample,

    /// Missing required field
    #[error("Missing required field: {0}")]
    MissingField(Field),

    /// NaN or infinite value
    #[error("{0} is not a valid numeric value")]
    NonFinite(Field),

    /// Value out of allowed range
    #[error("{field} value {value} is out of range [{min}, {max}]")]
    OutOfRange {
        field: Field,
        value: f64,
        min: f64,
        max: f64,
    },

    /// Value must be strictly greater than a minimum
    #[error("{field} must be greater than {min}, got {value}")]
    TooLow { field: Field, value: f64, min: f64 },

    /// Time did not advance past the previous accepted sample
    #[error("Time must increase monotonically: previous {previous}, got {value}")]
    TimeNotIncreasing { previous: f64, value: f64 },
}

impl ValidationError {
    /// Structural problems (data format) as opposed to bound violations
    pub fn is_format_error(&self) -> bool {
        matches!(
            self,
            ValidationError::MissingSample | ValidationError::MissingField(_)
        )
    }

    /// Field the error refers to, if any
    pub fn field(&self) -> Option<Field> {
        match self {
            ValidationError::MissingSample => None,
            ValidationError::MissingField(field) | ValidationError::NonFinite(field) => Some(*field),
            ValidationError::OutOfRange { field, .. } | ValidationError::TooLow { field, .. } => {
                Some(*field)
            }
            ValidationError::TimeNotIncreasing { .. } => Some(Field::Time),
        }
    }
}
