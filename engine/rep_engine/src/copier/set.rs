//! Sets: mutable, persistent and read-only wrappers.

use rep_types::CollectionFlavor;
use rep_value::{Key, ObjRef, ObjectData};

use super::Copier;
use crate::plan::SetPlan;
use crate::CloneResult;

impl Copier<'_> {
    pub(super) fn set_data(&mut self, plan: &SetPlan, src: &ObjRef) -> CloneResult<ObjectData> {
        match plan.flavor {
            CollectionFlavor::Mutable => {
                let elems = self.cloned_elems(plan, src)?;
                Ok(ObjectData::Set(elems.into_iter().collect()))
            }
            CollectionFlavor::Persistent => {
                let elems = self.cloned_elems(plan, src)?;
                let set = elems
                    .into_iter()
                    .fold(im::HashSet::new(), |set, elem| set.update(elem));
                Ok(ObjectData::PersistentSet(set))
            }
            CollectionFlavor::ReadOnly { .. } => {
                let backing = self.read_only_backing(src)?;
                let inner = match self.clone_ref(&backing)? {
                    Some(inner) => inner,
                    None => {
                        let elems = self.cloned_elems(plan, &backing)?;
                        ObjRef::new(backing.ty(), ObjectData::Set(elems.into_iter().collect()))
                    }
                };
                Ok(ObjectData::ReadOnly(inner))
            }
        }
    }

    fn cloned_elems(&mut self, plan: &SetPlan, src: &ObjRef) -> CloneResult<Vec<Key>> {
        let elems: Vec<Key> = match &*src.read() {
            ObjectData::Set(set) => set.iter().cloned().collect(),
            ObjectData::PersistentSet(set) => set.iter().cloned().collect(),
            other => return Err(self.shape_error(src, "set", other.label())),
        };

        let mut cloned = Vec::with_capacity(elems.len());
        for elem in elems {
            cloned.push(self.clone_key(&plan.elem, elem)?);
        }
        Ok(cloned)
    }
}
