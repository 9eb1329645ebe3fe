//! Error taxonomy for the meshing engine.
//!
//! Every fallible public operation returns [`MeshError`]. Each variant carries a
//! human-readable description (via `Display`) and a stable machine-readable
//! code (via [`MeshError::code`]) so pipeline consumers can branch on failures
//! without parsing text.

use thiserror::Error;

/// Errors produced by validation and meshing operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MeshError {
    /// A single input value failed validation.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Several validation rules failed; the description joins all of them.
    #[error("validation failed: {0}")]
    MultipleErrors(String),

    /// A structure or option set was rejected by the meshing layer.
    #[error("meshing validation error: {0}")]
    ValidationError(String),

    /// An argument was out of range or otherwise unusable.
    #[error("invalid argument: {0}")]
    ArgumentError(String),

    /// A meshing phase could not complete.
    #[error("meshing operation failed: {0}")]
    OperationError(String),

    /// A numeric fault (overflow, non-finite intermediate) was detected.
    #[error("arithmetic fault during meshing: {0}")]
    ArithmeticError(String),

    /// An index referenced a vertex or face out of range.
    #[error("index out of range: {0}")]
    IndexError(String),

    /// A required value was absent.
    #[error("missing required value: {0}")]
    NullReferenceError(String),

    /// The operation observed a triggered cancellation token.
    #[error("the meshing operation was cancelled")]
    Cancelled,

    /// A batch call received no structures.
    #[error("batch contains no structures")]
    EmptyBatch,

    /// One or more batch workers failed; the description joins all failures.
    #[error("one or more batch operations failed: {0}")]
    AggregateError(String),

    /// A failure the engine did not anticipate.
    #[error("unexpected meshing failure: {0}")]
    UnexpectedError(String),
}

impl MeshError {
    /// Stable machine-readable code for this error kind.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::InvalidInput(_) => "Validation.Input",
            Self::MultipleErrors(_) => "Validation.MultipleErrors",
            Self::ValidationError(_) => "Meshing.ValidationError",
            Self::ArgumentError(_) => "Meshing.ArgumentError",
            Self::OperationError(_) => "Meshing.OperationError",
            Self::ArithmeticError(_) => "Meshing.ArithmeticError",
            Self::IndexError(_) => "Meshing.IndexError",
            Self::NullReferenceError(_) => "Meshing.NullReferenceError",
            Self::Cancelled => "Meshing.Cancelled",
            Self::EmptyBatch => "Meshing.EmptyBatch",
            Self::AggregateError(_) => "Meshing.AggregateError",
            Self::UnexpectedError(_) => "Meshing.UnexpectedError",
        }
    }

    /// Human-readable description (same text as `Display`).
    #[must_use]
    pub fn description(&self) -> String {
        self.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_stable() {
        assert_eq!(MeshError::Cancelled.code(), "Meshing.Cancelled");
        assert_eq!(MeshError::EmptyBatch.code(), "Meshing.EmptyBatch");
        assert_eq!(
            MeshError::InvalidInput("x".into()).code(),
            "Validation.Input"
        );
        assert_eq!(
            MeshError::AggregateError("a; b".into()).code(),
            "Meshing.AggregateError"
        );
    }

    #[test]
    fn description_names_the_offending_field() {
        let err = MeshError::InvalidInput("targetEdgeLengthXY must be positive".into());
        assert!(err.description().contains("targetEdgeLengthXY"));
    }
}
