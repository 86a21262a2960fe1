//! Dynamic object model for Replica.
//!
//! Values come in two flavours:
//! - value semantics: scalars, enums and [`StructValue`]s, copied on assignment
//! - reference semantics: [`ObjRef`], a shared handle whose identity is its address
//!
//! Every object carries the [`TypeId`](rep_types::TypeId) of its runtime type and
//! its storage behind a lock, so a copy can read a source graph while other
//! threads hold handles to it.

mod array;
mod bag;
mod errors;
mod key;
mod native;
mod object;
mod value;

pub use array::{ArrayData, Dim};
pub use bag::PropertyBag;
pub use errors::ValueError;
pub use key::Key;
pub use native::NativeData;
pub use object::{Callable, ObjRef, Object, ObjectData, Record};
pub use value::{StructValue, Value};
