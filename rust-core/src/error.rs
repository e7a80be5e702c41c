use thiserror::Error;

/// Everything that can go wrong while building or querying a moire pattern.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MoireError {
    /// A structural relation between the matrices does not hold, e.g. `E·A != B`.
    #[error("invariant violation: {0}")]
    InvariantViolation(String),

    /// A matrix cannot be used as requested (irrational `E`, singular cell, non-integral supercell).
    #[error("invalid transform: {0}")]
    InvalidTransform(String),

    /// Concrete builder parameters break a number-theoretic precondition.
    #[error("validation error: {0}")]
    ValidationError(String),

    /// The quantity depends on free symbols that have not been substituted yet.
    #[error("not yet determined: {0}")]
    NotYetDetermined(String),

    /// A bounded search ran out of room or an internal consistency check failed.
    #[error("internal error: {0}")]
    InternalError(String),

    #[error("parse error: {0}")]
    Parse(String),
}
