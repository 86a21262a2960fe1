//! Tuples.

use rep_value::{ObjRef, ObjectData, Value};

use super::Copier;
use crate::plan::SlotAction;
use crate::CloneResult;

impl Copier<'_> {
    pub(super) fn fill_tuple(&mut self, actions: &[SlotAction], src: &ObjRef, dst: &ObjRef) -> CloneResult<()> {
        let slots = self.tuple_slots(src)?;
        let mut copied = Vec::with_capacity(slots.len());
        for (index, value) in slots.iter().enumerate() {
            let value = match actions.get(index) {
                Some(action) => self.apply(action, value)?,
                None => self.clone_value(value)?,
            };
            copied.push(value);
        }
        dst.replace(ObjectData::Tuple(copied));
        Ok(())
    }

    pub(super) fn tuple_slots(&self, src: &ObjRef) -> CloneResult<Vec<Value>> {
        match &*src.read() {
            ObjectData::Tuple(slots) => Ok(slots.clone()),
            other => Err(self.shape_error(src, "tuple", other.label())),
        }
    }
}
