//! Maps: mutable, persistent and read-only wrappers.

use rep_types::CollectionFlavor;
use rep_value::{Key, ObjRef, ObjectData, Value};

use super::Copier;
use crate::plan::MapPlan;
use crate::CloneResult;

impl Copier<'_> {
    /// Fresh storage for a copy of `src` in the plan's flavour.
    pub(super) fn map_data(&mut self, plan: &MapPlan, src: &ObjRef) -> CloneResult<ObjectData> {
        match plan.flavor {
            CollectionFlavor::Mutable => {
                let entries = self.cloned_entries(plan, src)?;
                Ok(ObjectData::Map(entries.into_iter().collect()))
            }
            CollectionFlavor::Persistent => {
                let entries = self.cloned_entries(plan, src)?;
                let map = entries
                    .into_iter()
                    .fold(im::HashMap::new(), |map, (key, value)| map.update(key, value));
                Ok(ObjectData::PersistentMap(map))
            }
            CollectionFlavor::ReadOnly { .. } => {
                let backing = self.read_only_backing(src)?;
                let inner = match self.clone_ref(&backing)? {
                    Some(inner) => inner,
                    // Backing type ignored: rebuild it from the wrapper's entry plan.
                    None => {
                        let entries = self.cloned_entries(plan, &backing)?;
                        ObjRef::new(backing.ty(), ObjectData::Map(entries.into_iter().collect()))
                    }
                };
                Ok(ObjectData::ReadOnly(inner))
            }
        }
    }

    fn cloned_entries(&mut self, plan: &MapPlan, src: &ObjRef) -> CloneResult<Vec<(Key, Value)>> {
        let entries: Vec<(Key, Value)> = match &*src.read() {
            ObjectData::Map(map) => map.iter().map(|(k, v)| (k.clone(), v.clone())).collect(),
            ObjectData::PersistentMap(map) => map.iter().map(|(k, v)| (k.clone(), v.clone())).collect(),
            other => return Err(self.shape_error(src, "map", other.label())),
        };

        let mut cloned = Vec::with_capacity(entries.len());
        for (key, value) in entries {
            let key = self.clone_key(&plan.key, key)?;
            let value = self.apply(&plan.value, &value)?;
            cloned.push((key, value));
        }
        Ok(cloned)
    }
}
