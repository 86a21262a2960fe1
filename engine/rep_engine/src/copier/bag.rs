//! Property bags.
//!
//! Bags carry no declared member types, so every entry is decided by its
//! runtime value: nulls stay null, values of ignored types become null,
//! callables are kept by reference and everything else is deep-copied.

use rep_types::TypeKind;
use rep_value::{ObjRef, ObjectData, PropertyBag, Value};

use super::Copier;
use crate::CloneResult;

impl Copier<'_> {
    pub(super) fn fill_bag(&mut self, src: &ObjRef, dst: &ObjRef) -> CloneResult<()> {
        let entries: Vec<_> = match &*src.read() {
            ObjectData::Bag(bag) => bag.iter().map(|(k, v)| (k.clone(), v.clone())).collect(),
            other => return Err(self.shape_error(src, "bag", other.label())),
        };

        let mut copy = PropertyBag::with_capacity(entries.len());
        for (name, value) in entries {
            let value = match &value {
                Value::Null => Value::Null,
                value if self.is_runtime_ignored(value) => Value::Null,
                Value::Ref(obj) if self.is_callable(obj) => value.clone(),
                value => self.clone_value(value)?,
            };
            copy.insert(name, value);
        }
        dst.replace(ObjectData::Bag(copy));
        Ok(())
    }

    fn is_callable(&self, obj: &ObjRef) -> bool {
        self.table()
            .get(obj.ty())
            .is_some_and(|desc| matches!(desc.kind, TypeKind::Callable))
    }
}
