//! Heap objects.
//!
//! # Design
//!
//! An [`ObjRef`] is an `Arc<Object>`. Its address is its identity: two
//! handles are "the same object" exactly when they point at the same
//! allocation. Object storage sits behind a `parking_lot::RwLock`, so the
//! copier can swap in freshly built container data without changing the
//! object's identity.
//!
//! Reference cycles are not reclaimed automatically. Breaking them (for
//! example by clearing a field) is the host's concern.

use std::fmt;
use std::sync::Arc;

use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use rep_types::{FieldFlags, TypeId, TypeKind, TypeTable};
use rustc_hash::{FxHashMap, FxHashSet};

use crate::{ArrayData, Key, NativeData, PropertyBag, StructValue, Value, ValueError};

/// Shared handle to a heap object.
#[derive(Clone)]
pub struct ObjRef(Arc<Object>);

/// A heap object: its runtime type plus its storage.
pub struct Object {
    ty: TypeId,
    data: RwLock<ObjectData>,
}

/// Storage of a heap object.
#[derive(Clone, Debug)]
pub enum ObjectData {
    /// Class instance, one slot per layout member.
    Record(Record),
    /// Boxed value-semantics aggregate.
    Boxed(StructValue),
    Array(ArrayData),
    Map(FxHashMap<Key, Value>),
    PersistentMap(im::HashMap<Key, Value>),
    Set(FxHashSet<Key>),
    PersistentSet(im::HashSet<Key>),
    /// Read-only view over a backing map or set object.
    ReadOnly(ObjRef),
    Tuple(Vec<Value>),
    Bag(PropertyBag),
    Callable(Callable),
    Native(Arc<dyn NativeData>),
}

impl ObjRef {
    pub fn new(ty: TypeId, data: ObjectData) -> Self {
        ObjRef(Arc::new(Object {
            ty,
            data: RwLock::new(data),
        }))
    }

    /// Allocate a class instance from slot values in layout order.
    pub fn record(table: &TypeTable, ty: TypeId, slots: Vec<Value>) -> Result<Self, ValueError> {
        let desc = table.descriptor(ty)?;
        if desc.kind != TypeKind::Class {
            return Err(ValueError::NotARecord(desc.name.to_string()));
        }
        let layout = table.layout(ty)?;
        if layout.len() != slots.len() {
            return Err(ValueError::ArityMismatch {
                ty: desc.name.to_string(),
                expected: layout.len(),
                found: slots.len(),
            });
        }
        Ok(Self::new(ty, ObjectData::Record(Record::new(slots))))
    }

    /// Allocate a class instance with every field at its default.
    pub fn default_record(table: &TypeTable, ty: TypeId) -> Result<Self, ValueError> {
        let slots = table
            .layout(ty)?
            .iter()
            .map(|member| Value::default_for(table, member.field.ty))
            .collect();
        Self::record(table, ty, slots)
    }

    /// Box a struct value into a heap object with its own identity.
    pub fn boxed(value: StructValue) -> Self {
        Self::new(value.ty(), ObjectData::Boxed(value))
    }

    #[inline]
    pub fn ty(&self) -> TypeId {
        self.0.ty
    }

    /// Address of the allocation, the object's identity.
    #[inline]
    pub fn addr(&self) -> usize {
        Arc::as_ptr(&self.0) as usize
    }

    #[inline]
    pub fn ptr_eq(&self, other: &ObjRef) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    pub fn read(&self) -> RwLockReadGuard<'_, ObjectData> {
        self.0.data.read()
    }

    pub fn write(&self) -> RwLockWriteGuard<'_, ObjectData> {
        self.0.data.write()
    }

    /// Swap the object's storage, keeping its identity.
    pub fn replace(&self, data: ObjectData) -> ObjectData {
        std::mem::replace(&mut *self.write(), data)
    }

    // === Field access (checked) ===

    pub fn get_field(&self, table: &TypeTable, name: &str) -> Result<Value, ValueError> {
        let index = self.field_slot(table, name)?;
        match &*self.read() {
            ObjectData::Record(record) => record.slot(index).cloned(),
            other => Err(ValueError::WrongData {
                expected: "record",
                found: other.label(),
            }),
        }
    }

    /// Assign a field through the public path. Read-only fields are refused.
    pub fn set_field(&self, table: &TypeTable, name: &str, value: Value) -> Result<(), ValueError> {
        let index = self.field_slot(table, name)?;
        let layout = table.layout(self.ty())?;
        if layout[index].field.flags.contains(FieldFlags::READONLY) {
            return Err(ValueError::ReadOnlyField {
                ty: table.name_of(self.ty()).to_string(),
                field: name.to_string(),
            });
        }
        match &mut *self.write() {
            ObjectData::Record(record) => record.write_slot(index, value),
            other => Err(ValueError::WrongData {
                expected: "record",
                found: other.label(),
            }),
        }
    }

    fn field_slot(&self, table: &TypeTable, name: &str) -> Result<usize, ValueError> {
        table
            .field_index(self.ty(), name)?
            .ok_or_else(|| ValueError::UnknownField {
                ty: table.name_of(self.ty()).to_string(),
                field: name.to_string(),
            })
    }
}

impl fmt::Debug for ObjRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ObjRef({:?} @ {:#x})", self.ty(), self.addr())
    }
}

impl ObjectData {
    /// Short name of the storage shape, for error messages.
    pub fn label(&self) -> &'static str {
        match self {
            ObjectData::Record(_) => "record",
            ObjectData::Boxed(_) => "boxed struct",
            ObjectData::Array(_) => "array",
            ObjectData::Map(_) => "map",
            ObjectData::PersistentMap(_) => "persistent map",
            ObjectData::Set(_) => "set",
            ObjectData::PersistentSet(_) => "persistent set",
            ObjectData::ReadOnly(_) => "read-only wrapper",
            ObjectData::Tuple(_) => "tuple",
            ObjectData::Bag(_) => "property bag",
            ObjectData::Callable(_) => "callable",
            ObjectData::Native(_) => "native",
        }
    }

    /// Copy one level deep.
    ///
    /// Containers get new backing storage holding the same elements. A
    /// read-only wrapper gets a new backing object too. Nested objects and
    /// native handles are shared.
    pub fn shallow_copy(&self) -> ObjectData {
        match self {
            ObjectData::ReadOnly(backing) => {
                let inner = backing.read().shallow_copy();
                ObjectData::ReadOnly(ObjRef::new(backing.ty(), inner))
            }
            other => other.clone(),
        }
    }

    pub fn as_record(&self) -> Option<&Record> {
        match self {
            ObjectData::Record(record) => Some(record),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&ArrayData> {
        match self {
            ObjectData::Array(array) => Some(array),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&FxHashMap<Key, Value>> {
        match self {
            ObjectData::Map(map) => Some(map),
            _ => None,
        }
    }

    pub fn as_set(&self) -> Option<&FxHashSet<Key>> {
        match self {
            ObjectData::Set(set) => Some(set),
            _ => None,
        }
    }

    pub fn as_bag(&self) -> Option<&PropertyBag> {
        match self {
            ObjectData::Bag(bag) => Some(bag),
            _ => None,
        }
    }
}

/// Slots of a class instance, in layout order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Record {
    slots: Vec<Value>,
}

impl Record {
    pub fn new(slots: Vec<Value>) -> Self {
        Record { slots }
    }

    pub fn slots(&self) -> &[Value] {
        &self.slots
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn slot(&self, index: usize) -> Result<&Value, ValueError> {
        self.slots.get(index).ok_or(ValueError::SlotOutOfRange {
            index,
            len: self.slots.len(),
        })
    }

    /// Raw slot write. Ignores read-only policy; used by the copier to
    /// populate write-once fields of a fresh copy.
    pub fn write_slot(&mut self, index: usize, value: Value) -> Result<(), ValueError> {
        let len = self.slots.len();
        let slot = self
            .slots
            .get_mut(index)
            .ok_or(ValueError::SlotOutOfRange { index, len })?;
        *slot = value;
        Ok(())
    }
}

/// A closure: code identified by name plus its captured environment.
#[derive(Clone, Debug, PartialEq)]
pub struct Callable {
    name: Arc<str>,
    captures: Vec<Value>,
}

impl Callable {
    pub fn new(name: impl Into<Arc<str>>, captures: Vec<Value>) -> Self {
        Callable {
            name: name.into(),
            captures,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn captures(&self) -> &[Value] {
        &self.captures
    }

    /// Same code with a different environment.
    #[must_use]
    pub fn with_captures(&self, captures: Vec<Value>) -> Self {
        Callable {
            name: Arc::clone(&self.name),
            captures,
        }
    }
}

#[cfg(test)]
mod tests;
