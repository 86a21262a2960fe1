//! Registration errors.

use crate::TypeId;

/// Errors raised while registering or resolving types.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum TypeError {
    #[error("unknown type id {0:?}")]
    UnknownType(TypeId),

    #[error("a type named `{0}` is already registered")]
    DuplicateName(String),

    #[error("type `{0}` is declared but not yet defined")]
    Undefined(String),

    #[error("type `{0}` is already defined")]
    AlreadyDefined(String),

    #[error("type `{0}` would inherit from itself")]
    CyclicBase(String),

    #[error("type `{name}` cannot derive from `{base}`: only classes take part in inheritance")]
    InvalidBase { name: String, base: String },

    #[error("type `{name}` declares field `{field}` more than once")]
    DuplicateField { name: String, field: String },

    #[error("type `{name}` of kind {kind} cannot declare fields")]
    FieldsNotAllowed { name: String, kind: &'static str },

    #[error("invalid definition of `{name}`: {reason}")]
    InvalidShape { name: String, reason: &'static str },
}
