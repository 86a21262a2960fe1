//! Runtime type model for Replica.
//!
//! Rust has no reflection, so every type that takes part in a copy describes
//! its own storage: kind, base type, ordered fields and policy flags. The
//! copier never looks at anything a [`TypeDescriptor`] does not declare.
//!
//! # Type Identity
//!
//! - [`TypeId`]: 32-bit handle, O(1) equality, builtins at fixed indices
//! - [`TypeTable`]: concurrent registry that owns every descriptor
//! - [`Layout`]: flattened storage order of a class (base fields first)

mod descriptor;
mod errors;
mod flags;
mod idx;
mod kind;
mod table;

pub use descriptor::{FieldDef, TypeDescriptor};
pub use errors::TypeError;
pub use flags::{FieldFlags, TypeFlags};
pub use idx::TypeId;
pub use kind::{CollectionFlavor, ScalarKind, TypeKind};
pub use table::{Layout, Member, SharedTypeTable, TypeTable};
