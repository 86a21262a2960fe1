//! Self-describing type definitions.

use std::sync::Arc;

use crate::{FieldFlags, ScalarKind, TypeFlags, TypeId, TypeKind};

/// One declared storage slot of a class or struct.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct FieldDef {
    pub name: Arc<str>,
    pub ty: TypeId,
    pub flags: FieldFlags,
}

impl FieldDef {
    pub fn new(name: impl Into<Arc<str>>, ty: TypeId) -> Self {
        FieldDef {
            name: name.into(),
            ty,
            flags: FieldFlags::empty(),
        }
    }

    #[must_use]
    pub fn with_flags(mut self, flags: FieldFlags) -> Self {
        self.flags |= flags;
        self
    }

    /// Mark the member as excluded from copying.
    #[must_use]
    pub fn ignored(self) -> Self {
        self.with_flags(FieldFlags::IGNORE)
    }

    /// Mark the member as explicitly copied, even if transient.
    #[must_use]
    pub fn kept(self) -> Self {
        self.with_flags(FieldFlags::KEEP)
    }

    #[must_use]
    pub fn non_serialized(self) -> Self {
        self.with_flags(FieldFlags::NON_SERIALIZED)
    }

    #[must_use]
    pub fn readonly(self) -> Self {
        self.with_flags(FieldFlags::READONLY)
    }

    #[inline]
    pub fn is_ignored(&self) -> bool {
        self.flags.is_ignored()
    }
}

/// Everything the copier knows about a type.
///
/// Descriptors are immutable once registered in a [`TypeTable`](crate::TypeTable).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TypeDescriptor {
    pub name: Arc<str>,
    pub kind: TypeKind,
    pub base: Option<TypeId>,
    pub fields: Vec<FieldDef>,
    pub flags: TypeFlags,
}

impl TypeDescriptor {
    pub fn new(name: impl Into<Arc<str>>, kind: TypeKind) -> Self {
        TypeDescriptor {
            name: name.into(),
            kind,
            base: None,
            fields: Vec::new(),
            flags: TypeFlags::empty(),
        }
    }

    // Factory methods

    pub fn class(name: impl Into<Arc<str>>) -> Self {
        Self::new(name, TypeKind::Class)
    }

    pub fn structure(name: impl Into<Arc<str>>) -> Self {
        Self::new(name, TypeKind::Struct)
    }

    pub fn enumeration(name: impl Into<Arc<str>>) -> Self {
        Self::new(name, TypeKind::Enum)
    }

    pub fn bag(name: impl Into<Arc<str>>) -> Self {
        Self::new(name, TypeKind::Bag)
    }

    pub fn callable(name: impl Into<Arc<str>>) -> Self {
        Self::new(name, TypeKind::Callable)
    }

    pub fn native(name: impl Into<Arc<str>>) -> Self {
        Self::new(name, TypeKind::Native)
    }

    pub(crate) fn scalar(name: &'static str, kind: ScalarKind) -> Self {
        Self::new(name, TypeKind::Scalar(kind)).with_flags(TypeFlags::IMMUTABLE)
    }

    // Builders

    #[must_use]
    pub fn with_base(mut self, base: TypeId) -> Self {
        self.base = Some(base);
        self
    }

    #[must_use]
    pub fn with_field(mut self, field: FieldDef) -> Self {
        self.fields.push(field);
        self
    }

    /// Append a plain field of type `ty`.
    #[must_use]
    pub fn field(self, name: impl Into<Arc<str>>, ty: TypeId) -> Self {
        self.with_field(FieldDef::new(name, ty))
    }

    #[must_use]
    pub fn with_flags(mut self, flags: TypeFlags) -> Self {
        self.flags |= flags;
        self
    }

    #[inline]
    pub fn is_value_semantics(&self) -> bool {
        self.kind.is_value_semantics()
    }

    #[inline]
    pub fn has_flag(&self, flag: TypeFlags) -> bool {
        self.flags.contains(flag)
    }
}
