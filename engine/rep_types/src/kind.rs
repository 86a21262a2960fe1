//! Structural shape of a type.

use crate::TypeId;

/// Builtin scalar categories.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum ScalarKind {
    Bool,
    Int,
    UInt,
    Byte,
    Float,
    Char,
    Text,
    Guid,
    Timestamp,
    Duration,
}

/// How a map or set stores its entries.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum CollectionFlavor {
    /// Ordinary mutable hash collection.
    Mutable,
    /// Copy-on-write collection with no in-place population primitive.
    Persistent,
    /// Read-only view over a backing mutable collection of type `backing`.
    ReadOnly { backing: TypeId },
}

/// The shape of a registered type.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub enum TypeKind {
    /// Dynamic slot type, never the runtime type of an object.
    Any,
    Scalar(ScalarKind),
    /// Enumeration, stored as an integer tag.
    Enum,
    /// Value-semantics aggregate, copied on assignment.
    Struct,
    /// Reference-semantics aggregate with optional single inheritance.
    Class,
    /// Array of `rank` dimensions. `vector` arrays are one-dimensional and zero-based.
    Array {
        elem: TypeId,
        rank: u8,
        vector: bool,
    },
    Map {
        key: TypeId,
        value: TypeId,
        flavor: CollectionFlavor,
    },
    Set {
        elem: TypeId,
        flavor: CollectionFlavor,
    },
    /// Fixed-arity positional aggregate.
    Tuple { slots: Box<[TypeId]> },
    /// Open, string-keyed property bag.
    Bag,
    /// Closure with a captured environment.
    Callable,
    /// Opaque host handle.
    Native,
}

impl TypeKind {
    /// Values of this kind are copied on assignment and have no identity.
    pub fn is_value_semantics(&self) -> bool {
        match self {
            TypeKind::Scalar(kind) => *kind != ScalarKind::Text,
            TypeKind::Enum | TypeKind::Struct => true,
            _ => false,
        }
    }

    /// Short label used in log events.
    pub fn label(&self) -> &'static str {
        match self {
            TypeKind::Any => "any",
            TypeKind::Scalar(_) => "scalar",
            TypeKind::Enum => "enum",
            TypeKind::Struct => "struct",
            TypeKind::Class => "class",
            TypeKind::Array { .. } => "array",
            TypeKind::Map { .. } => "map",
            TypeKind::Set { .. } => "set",
            TypeKind::Tuple { .. } => "tuple",
            TypeKind::Bag => "bag",
            TypeKind::Callable => "callable",
            TypeKind::Native => "native",
        }
    }
}
