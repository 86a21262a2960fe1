//! Errors raised by the object model.

use rep_types::TypeError;

/// Errors raised while building or mutating values.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ValueError {
    #[error("slot {index} is out of range for a value with {len} slots")]
    SlotOutOfRange { index: usize, len: usize },

    #[error("type `{ty}` has no field named `{field}`")]
    UnknownField { ty: String, field: String },

    #[error("field `{field}` of `{ty}` is read-only")]
    ReadOnlyField { ty: String, field: String },

    #[error("`{ty}` expects {expected} values, got {found}")]
    ArityMismatch {
        ty: String,
        expected: usize,
        found: usize,
    },

    #[error("array shape holds {expected} elements, got {found}")]
    ShapeMismatch { expected: usize, found: usize },

    #[error("arrays need at least one dimension")]
    EmptyShape,

    #[error("array shape has more cells than can be addressed")]
    ShapeOverflow,

    #[error("index {index:?} is outside the array bounds")]
    IndexOutOfBounds { index: Vec<i64> },

    #[error("expected {expected} data, found {found}")]
    WrongData {
        expected: &'static str,
        found: &'static str,
    },

    #[error("`{0}` cannot be instantiated as a record")]
    NotARecord(String),

    #[error(transparent)]
    Type(#[from] TypeError),
}
