//! Copy errors.
//!
//! A failed copy-into may leave the target partially written. Nothing in the
//! engine retries: copying is deterministic, so a failure repeats.

use rep_types::TypeError;
use rep_value::ValueError;

/// Result alias for engine operations.
pub type CloneResult<T> = Result<T, CloneError>;

/// Errors raised by a copy operation.
#[derive(Debug, thiserror::Error)]
pub enum CloneError {
    #[error("cannot copy into a target from a null source")]
    NullSource,

    #[error("target of type `{target_ty}` is not an instance of source type `{source_ty}`")]
    InvalidTarget { source_ty: String, target_ty: String },

    #[error("values of type `{ty}` are immutable and cannot be copied into")]
    ImmutableTarget { ty: String },

    #[error("invalid rank of target array: expected {expected}, found {found}")]
    RankMismatch { expected: usize, found: usize },

    #[error("object of type `{ty}` holds {found} data where {expected} data was expected")]
    ShapeMismatch {
        ty: String,
        expected: &'static str,
        found: &'static str,
    },

    #[error(transparent)]
    Type(#[from] TypeError),

    #[error(transparent)]
    Value(#[from] ValueError),
}
