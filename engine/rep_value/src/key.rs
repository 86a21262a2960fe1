//! Hashable wrapper used by maps and sets.
//!
//! Scalars, text, enums and structs hash and compare by value. Objects hash
//! and compare by identity, so a cloned collection only finds the key
//! instances it actually contains.

use std::hash::{Hash, Hasher};

use crate::{ObjRef, Value};

/// A map key or set element.
#[derive(Clone, Debug)]
pub struct Key(Value);

impl Key {
    pub fn new(value: Value) -> Self {
        Key(value)
    }

    pub fn value(&self) -> &Value {
        &self.0
    }

    /// The object behind this key, if it is a reference.
    pub fn as_object(&self) -> Option<&ObjRef> {
        self.0.as_object()
    }
}

impl From<Value> for Key {
    fn from(value: Value) -> Self {
        Key(value)
    }
}

impl From<&str> for Key {
    fn from(s: &str) -> Self {
        Key(Value::from(s))
    }
}

impl PartialEq for Key {
    fn eq(&self, other: &Self) -> bool {
        key_eq(&self.0, &other.0)
    }
}

impl Eq for Key {}

impl Hash for Key {
    fn hash<H: Hasher>(&self, state: &mut H) {
        hash_value(&self.0, state);
    }
}

fn key_eq(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Float(x), Value::Float(y)) => x.to_bits() == y.to_bits(),
        (Value::Struct(x), Value::Struct(y)) => {
            x.ty() == y.ty()
                && x.fields().len() == y.fields().len()
                && x.fields().iter().zip(y.fields()).all(|(l, r)| key_eq(l, r))
        }
        _ => a == b,
    }
}

fn hash_value<H: Hasher>(value: &Value, state: &mut H) {
    std::mem::discriminant(value).hash(state);
    match value {
        Value::Null => {}
        Value::Bool(b) => b.hash(state),
        Value::Int(n) | Value::Timestamp(n) | Value::Duration(n) => n.hash(state),
        Value::UInt(n) => n.hash(state),
        Value::Byte(n) => n.hash(state),
        Value::Float(f) => f.to_bits().hash(state),
        Value::Char(c) => c.hash(state),
        Value::Text(s) => s.hash(state),
        Value::Guid(g) => g.hash(state),
        Value::Enum { ty, tag } => {
            ty.hash(state);
            tag.hash(state);
        }
        Value::Struct(s) => {
            s.ty().hash(state);
            for field in s.fields() {
                hash_value(field, state);
            }
        }
        Value::Ref(obj) => obj.addr().hash(state),
    }
}
