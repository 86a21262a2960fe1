//! Concurrent type registry.
//!
//! The table is shared by every copy running in the process, so reads must
//! never block each other. Descriptors are append-only: once a [`TypeId`] is
//! handed out it stays valid, and once its type is defined the descriptor
//! never changes.
//!
//! # Design
//!
//! - Builtins are created eagerly at fixed indices
//! - Registered descriptors live in an append-only `RwLock<Vec<_>>`
//! - Name lookups and flattened layouts are cached in `DashMap`s
//! - Structural types (arrays, maps, sets, tuples) are interned by name
//!
//! # Forward Declarations
//!
//! A class or struct that refers to itself, directly or through other
//! types, is registered in two steps: [`TypeTable::declare`] reserves the id
//! and [`TypeTable::define`] supplies the full descriptor once every type it
//! mentions has an id. Until then the type is visible by name and may be
//! referenced by other definitions, but [`TypeTable::get`] and everything
//! built on it treat it as absent. Defining is the only time a descriptor
//! is replaced.

use std::sync::Arc;

use dashmap::{DashMap, DashSet};
use parking_lot::RwLock;
use rustc_hash::FxHashSet;

use crate::{
    CollectionFlavor, FieldDef, ScalarKind, TypeDescriptor, TypeError, TypeFlags, TypeId,
    TypeKind,
};

/// One storage slot in a flattened layout.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Member {
    /// The type that declared this field.
    pub owner: TypeId,
    pub field: FieldDef,
    /// Declared on or above a `BOUNDARY` base; carried over without a walk.
    pub behind_boundary: bool,
}

/// Flattened storage order of a type: base fields first, then derived ones.
///
/// A derived layout is always an extension of its base layout, so a slot
/// index means the same thing for a base and every type deriving from it.
pub type Layout = Arc<[Member]>;

/// Shared handle to a type table.
pub type SharedTypeTable = Arc<TypeTable>;

/// Registry of every type known to the copier.
#[derive(Debug)]
pub struct TypeTable {
    builtins: Box<[Arc<TypeDescriptor>]>,
    registered: RwLock<Vec<Arc<TypeDescriptor>>>,
    by_name: DashMap<Arc<str>, TypeId>,
    layouts: DashMap<TypeId, Layout>,
    /// Declared, not yet defined.
    pending: DashSet<TypeId>,
}

#[derive(Copy, Clone, PartialEq, Eq)]
enum Insert {
    Register,
    Intern,
    Declare,
}

impl TypeTable {
    /// Create a table holding only the builtin types.
    pub fn new() -> Self {
        let builtins: Box<[Arc<TypeDescriptor>]> = [
            TypeDescriptor::new("any", TypeKind::Any),
            TypeDescriptor::scalar("bool", ScalarKind::Bool),
            TypeDescriptor::scalar("int", ScalarKind::Int),
            TypeDescriptor::scalar("uint", ScalarKind::UInt),
            TypeDescriptor::scalar("byte", ScalarKind::Byte),
            TypeDescriptor::scalar("float", ScalarKind::Float),
            TypeDescriptor::scalar("char", ScalarKind::Char),
            TypeDescriptor::scalar("text", ScalarKind::Text),
            TypeDescriptor::scalar("guid", ScalarKind::Guid),
            TypeDescriptor::scalar("timestamp", ScalarKind::Timestamp),
            TypeDescriptor::scalar("duration", ScalarKind::Duration),
        ]
        .into_iter()
        .map(Arc::new)
        .collect();

        let by_name = DashMap::new();
        for (raw, desc) in (0u32..).zip(builtins.iter()) {
            by_name.insert(Arc::clone(&desc.name), TypeId::from_raw(raw));
        }

        TypeTable {
            builtins,
            registered: RwLock::new(Vec::new()),
            by_name,
            layouts: DashMap::new(),
            pending: DashSet::new(),
        }
    }

    /// Create a table wrapped for sharing between copy contexts.
    pub fn shared() -> SharedTypeTable {
        Arc::new(Self::new())
    }

    /// Total number of types, builtins included.
    pub fn len(&self) -> usize {
        self.builtins.len() + self.registered.read().len()
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    // === Lookup ===

    /// Descriptor of a defined type. Declared-only types yield `None`.
    pub fn get(&self, id: TypeId) -> Option<Arc<TypeDescriptor>> {
        if self.pending.contains(&id) {
            return None;
        }
        self.entry(id)
    }

    pub fn descriptor(&self, id: TypeId) -> Result<Arc<TypeDescriptor>, TypeError> {
        if self.pending.contains(&id) {
            return Err(TypeError::Undefined(self.name_of(id).to_string()));
        }
        self.known(id)
    }

    /// The id is in use, whether or not the type is defined yet.
    pub fn contains(&self, id: TypeId) -> bool {
        self.entry(id).is_some()
    }

    pub fn is_defined(&self, id: TypeId) -> bool {
        self.get(id).is_some()
    }

    /// Stored descriptor, the bare declaration for pending types.
    fn entry(&self, id: TypeId) -> Option<Arc<TypeDescriptor>> {
        let raw = id.raw();
        if raw < TypeId::FIRST_DYNAMIC {
            self.builtins.get(raw as usize).cloned()
        } else {
            let offset = (raw - TypeId::FIRST_DYNAMIC) as usize;
            self.registered.read().get(offset).cloned()
        }
    }

    fn known(&self, id: TypeId) -> Result<Arc<TypeDescriptor>, TypeError> {
        self.entry(id).ok_or(TypeError::UnknownType(id))
    }

    pub fn lookup(&self, name: &str) -> Option<TypeId> {
        self.by_name.get(name).map(|entry| *entry.value())
    }

    /// Display name of a type, falling back to the raw id for unknown handles.
    pub fn name_of(&self, id: TypeId) -> Arc<str> {
        match self.entry(id) {
            Some(desc) => Arc::clone(&desc.name),
            None => Arc::from(format!("{id:?}")),
        }
    }

    /// Check whether `derived` is `base` or inherits from it.
    pub fn is_subtype(&self, derived: TypeId, base: TypeId) -> bool {
        let mut current = Some(derived);
        while let Some(id) = current {
            if id == base {
                return true;
            }
            current = self.get(id).and_then(|desc| desc.base);
        }
        false
    }

    // === Layouts ===

    /// Flattened storage layout of `id`, computed once and cached.
    pub fn layout(&self, id: TypeId) -> Result<Layout, TypeError> {
        if let Some(layout) = self.layouts.get(&id).map(|entry| Arc::clone(entry.value())) {
            return Ok(layout);
        }

        // Derived type first, root base last.
        let mut chain = Vec::new();
        let mut current = Some(id);
        while let Some(ty) = current {
            let desc = self.descriptor(ty)?;
            current = desc.base;
            chain.push((ty, desc));
        }

        let boundary_at = chain
            .iter()
            .position(|(_, desc)| desc.has_flag(TypeFlags::BOUNDARY))
            .unwrap_or(chain.len());

        let mut members = Vec::new();
        for (depth, (owner, desc)) in chain.iter().enumerate().rev() {
            members.extend(desc.fields.iter().map(|field| Member {
                owner: *owner,
                field: field.clone(),
                behind_boundary: depth >= boundary_at,
            }));
        }

        let layout: Layout = members.into();
        Ok(Arc::clone(self.layouts.entry(id).or_insert(layout).value()))
    }

    /// Slot index of the field called `name`. Derived fields shadow base fields.
    pub fn field_index(&self, id: TypeId, name: &str) -> Result<Option<usize>, TypeError> {
        let layout = self.layout(id)?;
        Ok(layout.iter().rposition(|member| &*member.field.name == name))
    }

    // === Registration ===

    /// Register a new type. Fails if the name is already taken.
    pub fn register(&self, desc: TypeDescriptor) -> Result<TypeId, TypeError> {
        self.insert(desc, Insert::Register)
    }

    /// Reserve an id for a class or struct that is defined later with
    /// [`TypeTable::define`].
    pub fn declare(&self, name: impl Into<Arc<str>>, kind: TypeKind) -> Result<TypeId, TypeError> {
        let desc = TypeDescriptor::new(name, kind);
        if !matches!(desc.kind, TypeKind::Class | TypeKind::Struct) {
            return Err(TypeError::InvalidShape {
                name: desc.name.to_string(),
                reason: "only classes and structs can be declared ahead of their definition",
            });
        }
        self.insert(desc, Insert::Declare)
    }

    /// Complete a declared type. The descriptor must keep the declared name
    /// and kind; its fields may refer to the type itself.
    pub fn define(&self, id: TypeId, desc: TypeDescriptor) -> Result<(), TypeError> {
        let declared = self.known(id)?;
        if !self.pending.contains(&id) {
            return Err(TypeError::AlreadyDefined(declared.name.to_string()));
        }
        if declared.name != desc.name || declared.kind != desc.kind {
            return Err(TypeError::InvalidShape {
                name: declared.name.to_string(),
                reason: "a definition must keep the declared name and kind",
            });
        }
        self.validate(&desc)?;
        if self.reaches_base(desc.base, id) {
            return Err(TypeError::CyclicBase(desc.name.to_string()));
        }

        let mut registered = self.registered.write();
        // Another thread may have won the race since the check above.
        if self.pending.remove(&id).is_none() {
            return Err(TypeError::AlreadyDefined(declared.name.to_string()));
        }
        if let Some(slot) = registered.get_mut((id.raw() - TypeId::FIRST_DYNAMIC) as usize) {
            *slot = Arc::new(desc);
        }
        tracing::trace!(name = %declared.name, ?id, "defined type");
        Ok(())
    }

    /// Register a structural type, or return the existing one with the same name.
    fn intern(&self, desc: TypeDescriptor) -> Result<TypeId, TypeError> {
        self.insert(desc, Insert::Intern)
    }

    fn insert(&self, desc: TypeDescriptor, mode: Insert) -> Result<TypeId, TypeError> {
        // Validation reads the table, so it must run before the write lock.
        self.validate(&desc)?;

        let mut registered = self.registered.write();
        if let Some(existing) = self.lookup(&desc.name) {
            let same_shape = self.get_locked(&registered, existing)
                .is_some_and(|found| found.kind == desc.kind);
            return if mode == Insert::Intern && same_shape {
                Ok(existing)
            } else {
                Err(TypeError::DuplicateName(desc.name.to_string()))
            };
        }

        let raw = u32::try_from(registered.len())
            .ok()
            .and_then(|offset| offset.checked_add(TypeId::FIRST_DYNAMIC))
            .filter(|raw| *raw != u32::MAX)
            .ok_or_else(|| TypeError::InvalidShape {
                name: desc.name.to_string(),
                reason: "the type table is full",
            })?;
        let id = TypeId::from_raw(raw);

        tracing::trace!(name = %desc.name, kind = desc.kind.label(), ?id, "registered type");
        if mode == Insert::Declare {
            self.pending.insert(id);
        }
        let desc = Arc::new(desc);
        self.by_name.insert(Arc::clone(&desc.name), id);
        registered.push(desc);
        Ok(id)
    }

    /// Whether the base chain starting at `base` passes through `id`.
    fn reaches_base(&self, base: Option<TypeId>, id: TypeId) -> bool {
        let mut current = base;
        while let Some(ty) = current {
            if ty == id {
                return true;
            }
            current = self.entry(ty).and_then(|desc| desc.base);
        }
        false
    }

    fn get_locked(&self, registered: &[Arc<TypeDescriptor>], id: TypeId) -> Option<Arc<TypeDescriptor>> {
        let raw = id.raw();
        if raw < TypeId::FIRST_DYNAMIC {
            self.builtins.get(raw as usize).cloned()
        } else {
            registered.get((raw - TypeId::FIRST_DYNAMIC) as usize).cloned()
        }
    }

    fn validate(&self, desc: &TypeDescriptor) -> Result<(), TypeError> {
        let name = || desc.name.to_string();

        if let Some(base) = desc.base {
            let base_desc = self.known(base)?;
            if desc.kind != TypeKind::Class || base_desc.kind != TypeKind::Class {
                return Err(TypeError::InvalidBase {
                    name: name(),
                    base: base_desc.name.to_string(),
                });
            }
        }

        if !desc.fields.is_empty() && !matches!(desc.kind, TypeKind::Class | TypeKind::Struct) {
            return Err(TypeError::FieldsNotAllowed {
                name: name(),
                kind: desc.kind.label(),
            });
        }

        let mut seen = FxHashSet::default();
        for field in &desc.fields {
            self.known(field.ty)?;
            if !seen.insert(&*field.name) {
                return Err(TypeError::DuplicateField {
                    name: name(),
                    field: field.name.to_string(),
                });
            }
        }

        let invalid = |reason| TypeError::InvalidShape { name: name(), reason };
        match &desc.kind {
            TypeKind::Any | TypeKind::Scalar(_) => {
                return Err(invalid("builtin kinds cannot be registered"));
            }
            TypeKind::Array { elem, rank, vector } => {
                self.known(*elem)?;
                if *rank == 0 || (*vector && *rank != 1) {
                    return Err(invalid("array rank must be at least 1, and exactly 1 for vectors"));
                }
            }
            TypeKind::Map { key, value, flavor } => {
                self.known(*key)?;
                self.known(*value)?;
                self.validate_backing(*flavor, |kind| {
                    *kind
                        == TypeKind::Map {
                            key: *key,
                            value: *value,
                            flavor: CollectionFlavor::Mutable,
                        }
                })
                .map_err(|()| invalid("a read-only map must wrap a mutable map of the same shape"))?;
            }
            TypeKind::Set { elem, flavor } => {
                self.known(*elem)?;
                self.validate_backing(*flavor, |kind| {
                    *kind
                        == TypeKind::Set {
                            elem: *elem,
                            flavor: CollectionFlavor::Mutable,
                        }
                })
                .map_err(|()| invalid("a read-only set must wrap a mutable set of the same shape"))?;
            }
            TypeKind::Tuple { slots } => {
                for slot in slots.iter() {
                    self.known(*slot)?;
                }
            }
            TypeKind::Enum
            | TypeKind::Struct
            | TypeKind::Class
            | TypeKind::Bag
            | TypeKind::Callable
            | TypeKind::Native => {}
        }
        Ok(())
    }

    fn validate_backing(
        &self,
        flavor: CollectionFlavor,
        accepts: impl Fn(&TypeKind) -> bool,
    ) -> Result<(), ()> {
        match flavor {
            CollectionFlavor::ReadOnly { backing } => match self.get(backing) {
                Some(desc) if accepts(&desc.kind) => Ok(()),
                _ => Err(()),
            },
            CollectionFlavor::Mutable | CollectionFlavor::Persistent => Ok(()),
        }
    }

    // === Structural Types ===

    /// One-dimensional, zero-based array of `elem`.
    pub fn array_of(&self, elem: TypeId) -> Result<TypeId, TypeError> {
        let name = format!("{}[]", self.name_of(elem));
        self.intern(TypeDescriptor::new(
            name,
            TypeKind::Array {
                elem,
                rank: 1,
                vector: true,
            },
        ))
    }

    /// General array of `rank` dimensions that may carry non-zero lower bounds.
    pub fn array_with_rank(&self, elem: TypeId, rank: u8) -> Result<TypeId, TypeError> {
        let elem_name = self.name_of(elem);
        let name = if rank == 1 {
            format!("{elem_name}[*]")
        } else {
            format!("{elem_name}[{}]", ",".repeat(usize::from(rank.saturating_sub(1))))
        };
        self.intern(TypeDescriptor::new(
            name,
            TypeKind::Array {
                elem,
                rank,
                vector: false,
            },
        ))
    }

    pub fn map_of(&self, key: TypeId, value: TypeId) -> Result<TypeId, TypeError> {
        self.intern_map("Map", key, value, CollectionFlavor::Mutable)
    }

    pub fn persistent_map_of(&self, key: TypeId, value: TypeId) -> Result<TypeId, TypeError> {
        self.intern_map("PersistentMap", key, value, CollectionFlavor::Persistent)
    }

    pub fn read_only_map_of(&self, key: TypeId, value: TypeId) -> Result<TypeId, TypeError> {
        let backing = self.map_of(key, value)?;
        self.intern_map("ReadOnlyMap", key, value, CollectionFlavor::ReadOnly { backing })
    }

    pub fn set_of(&self, elem: TypeId) -> Result<TypeId, TypeError> {
        self.intern_set("Set", elem, CollectionFlavor::Mutable)
    }

    pub fn persistent_set_of(&self, elem: TypeId) -> Result<TypeId, TypeError> {
        self.intern_set("PersistentSet", elem, CollectionFlavor::Persistent)
    }

    pub fn read_only_set_of(&self, elem: TypeId) -> Result<TypeId, TypeError> {
        let backing = self.set_of(elem)?;
        self.intern_set("ReadOnlySet", elem, CollectionFlavor::ReadOnly { backing })
    }

    pub fn tuple_of(&self, slots: &[TypeId]) -> Result<TypeId, TypeError> {
        let names: Vec<Arc<str>> = slots.iter().map(|slot| self.name_of(*slot)).collect();
        let name = format!("({})", names.join(", "));
        self.intern(TypeDescriptor::new(
            name,
            TypeKind::Tuple {
                slots: slots.into(),
            },
        ))
    }

    fn intern_map(
        &self,
        prefix: &str,
        key: TypeId,
        value: TypeId,
        flavor: CollectionFlavor,
    ) -> Result<TypeId, TypeError> {
        let name = format!("{prefix}<{}, {}>", self.name_of(key), self.name_of(value));
        self.intern(TypeDescriptor::new(name, TypeKind::Map { key, value, flavor }))
    }

    fn intern_set(
        &self,
        prefix: &str,
        elem: TypeId,
        flavor: CollectionFlavor,
    ) -> Result<TypeId, TypeError> {
        let name = format!("{prefix}<{}>", self.name_of(elem));
        self.intern(TypeDescriptor::new(name, TypeKind::Set { elem, flavor }))
    }
}

impl Default for TypeTable {
    fn default() -> Self {
        Self::new()
    }
}
