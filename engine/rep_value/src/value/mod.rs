//! Runtime values.
//!
//! # Design
//!
//! `Value` is cheap to clone: scalars are inline, text is a shared `Arc<str>`,
//! and objects are `Arc` handles. Cloning a `Value` never copies an object;
//! that is the copier's job.

use std::sync::Arc;

use rep_types::{ScalarKind, TypeId, TypeKind, TypeTable};

use crate::{ObjRef, ValueError};

/// A runtime value.
#[derive(Clone, Debug, Default)]
pub enum Value {
    /// Absent reference.
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    UInt(u64),
    Byte(u8),
    Float(f64),
    Char(char),
    /// Shared immutable string.
    Text(Arc<str>),
    Guid(u128),
    Timestamp(i64),
    Duration(i64),
    Enum {
        ty: TypeId,
        tag: i64,
    },
    /// Value-semantics aggregate.
    Struct(StructValue),
    /// Reference to a heap object.
    Ref(ObjRef),
}

impl Value {
    // Factory methods

    pub fn text(s: impl Into<Arc<str>>) -> Self {
        Value::Text(s.into())
    }

    pub fn enumeration(ty: TypeId, tag: i64) -> Self {
        Value::Enum { ty, tag }
    }

    /// The zero value of `ty`: null for reference types, zeroes for value types.
    ///
    /// Unknown types default to null, and so does a struct field whose type
    /// is one of the structs enclosing it.
    pub fn default_for(table: &TypeTable, ty: TypeId) -> Self {
        Self::default_within(table, ty, &mut Vec::new())
    }

    fn default_within(table: &TypeTable, ty: TypeId, enclosing: &mut Vec<TypeId>) -> Self {
        let Some(desc) = table.get(ty) else {
            return Value::Null;
        };
        match desc.kind {
            TypeKind::Scalar(kind) => match kind {
                ScalarKind::Bool => Value::Bool(false),
                ScalarKind::Int => Value::Int(0),
                ScalarKind::UInt => Value::UInt(0),
                ScalarKind::Byte => Value::Byte(0),
                ScalarKind::Float => Value::Float(0.0),
                ScalarKind::Char => Value::Char('\0'),
                ScalarKind::Text => Value::Null,
                ScalarKind::Guid => Value::Guid(0),
                ScalarKind::Timestamp => Value::Timestamp(0),
                ScalarKind::Duration => Value::Duration(0),
            },
            TypeKind::Enum => Value::Enum { ty, tag: 0 },
            TypeKind::Struct if enclosing.contains(&ty) => Value::Null,
            TypeKind::Struct => {
                let mut fields = Vec::new();
                if let Ok(layout) = table.layout(ty) {
                    enclosing.push(ty);
                    for member in layout.iter() {
                        fields.push(Self::default_within(table, member.field.ty, enclosing));
                    }
                    enclosing.pop();
                }
                Value::Struct(StructValue::new(ty, fields))
            }
            _ => Value::Null,
        }
    }

    // Queries

    #[inline]
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// The runtime type of this value, `None` for null.
    pub fn runtime_type(&self) -> Option<TypeId> {
        Some(match self {
            Value::Null => return None,
            Value::Bool(_) => TypeId::BOOL,
            Value::Int(_) => TypeId::INT,
            Value::UInt(_) => TypeId::UINT,
            Value::Byte(_) => TypeId::BYTE,
            Value::Float(_) => TypeId::FLOAT,
            Value::Char(_) => TypeId::CHAR,
            Value::Text(_) => TypeId::TEXT,
            Value::Guid(_) => TypeId::GUID,
            Value::Timestamp(_) => TypeId::TIMESTAMP,
            Value::Duration(_) => TypeId::DURATION,
            Value::Enum { ty, .. } => *ty,
            Value::Struct(s) => s.ty(),
            Value::Ref(obj) => obj.ty(),
        })
    }

    pub fn as_object(&self) -> Option<&ObjRef> {
        match self {
            Value::Ref(obj) => Some(obj),
            _ => None,
        }
    }

    pub fn as_struct(&self) -> Option<&StructValue> {
        match self {
            Value::Struct(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Reference identity: same object, or same shared text buffer.
    pub fn same_identity(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Ref(a), Value::Ref(b)) => a.ptr_eq(b),
            (Value::Text(a), Value::Text(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

/// Scalars compare by value, objects by identity.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b))
            | (Value::Timestamp(a), Value::Timestamp(b))
            | (Value::Duration(a), Value::Duration(b)) => a == b,
            (Value::UInt(a), Value::UInt(b)) => a == b,
            (Value::Byte(a), Value::Byte(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Char(a), Value::Char(b)) => a == b,
            (Value::Text(a), Value::Text(b)) => a == b,
            (Value::Guid(a), Value::Guid(b)) => a == b,
            (Value::Enum { ty: ta, tag: a }, Value::Enum { ty: tb, tag: b }) => ta == tb && a == b,
            (Value::Struct(a), Value::Struct(b)) => a == b,
            (Value::Ref(a), Value::Ref(b)) => a.ptr_eq(b),
            _ => false,
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Float(n)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(Arc::from(s))
    }
}

impl From<ObjRef> for Value {
    fn from(obj: ObjRef) -> Self {
        Value::Ref(obj)
    }
}

impl From<StructValue> for Value {
    fn from(s: StructValue) -> Self {
        Value::Struct(s)
    }
}

/// Instance of a value-semantics aggregate. Fields follow the struct's layout.
#[derive(Clone, Debug, PartialEq)]
pub struct StructValue {
    ty: TypeId,
    fields: Vec<Value>,
}

impl StructValue {
    pub fn new(ty: TypeId, fields: Vec<Value>) -> Self {
        StructValue { ty, fields }
    }

    /// Build a struct, checking the field count against its layout.
    pub fn checked(table: &TypeTable, ty: TypeId, fields: Vec<Value>) -> Result<Self, ValueError> {
        let desc = table.descriptor(ty)?;
        let layout = table.layout(ty)?;
        if desc.kind != TypeKind::Struct {
            return Err(ValueError::WrongData {
                expected: "struct",
                found: desc.kind.label(),
            });
        }
        if layout.len() != fields.len() {
            return Err(ValueError::ArityMismatch {
                ty: desc.name.to_string(),
                expected: layout.len(),
                found: fields.len(),
            });
        }
        Ok(StructValue { ty, fields })
    }

    #[inline]
    pub fn ty(&self) -> TypeId {
        self.ty
    }

    pub fn fields(&self) -> &[Value] {
        &self.fields
    }

    pub fn get(&self, index: usize) -> Result<&Value, ValueError> {
        self.fields.get(index).ok_or(ValueError::SlotOutOfRange {
            index,
            len: self.fields.len(),
        })
    }

    pub fn set(&mut self, index: usize, value: Value) -> Result<(), ValueError> {
        let len = self.fields.len();
        let slot = self
            .fields
            .get_mut(index)
            .ok_or(ValueError::SlotOutOfRange { index, len })?;
        *slot = value;
        Ok(())
    }

    /// Read a field by name.
    pub fn field(&self, table: &TypeTable, name: &str) -> Result<&Value, ValueError> {
        let index = table
            .field_index(self.ty, name)?
            .ok_or_else(|| ValueError::UnknownField {
                ty: table.name_of(self.ty).to_string(),
                field: name.to_string(),
            })?;
        self.get(index)
    }
}
