//! Plan execution.
//!
//! A [`Copier`] owns the [`CopySession`] of one top-level call and walks the
//! source graph with the cached plans.
//!
//! # Locking
//!
//! Object storage is locked only long enough to snapshot or to swap in new
//! data, never across a nested copy. A self-referencing object is read
//! while its own copy is being written, so holding a guard over recursion
//! would deadlock.
//!
//! # Modes
//!
//! Recursive mode copies nested objects depth-first on the native stack.
//! Once the session is iterative, every object that needs more than a
//! shallow copy is shallow-copied, registered and queued; [`Copier::drain`]
//! then fills the queue in FIFO order.
//!
//! # Plans
//!
//! The copier memoizes every plan it uses, so one copy operation sees one
//! consistent set of plans even if the shared cache is cleared meanwhile.
//! A queued object is filled with the plan it was queued under.

mod array;
mod bag;
mod map;
mod set;
mod tuple;

use std::sync::Arc;

use rep_types::{TypeId, TypeTable};
use rep_value::{Key, ObjRef, ObjectData, StructValue, Value, ValueError};
use rustc_hash::{FxBuildHasher, FxHashMap, FxHashSet};

use crate::plan::{ClassPlan, FieldStep, KeyAction, PlanKind, SlotAction, StructPlan, TuplePlan};
use crate::session::CopySession;
use crate::stack::ensure_sufficient_stack;
use crate::{CloneError, CloneResult, Replicator};

/// Executes plans for one copy operation.
pub(crate) struct Copier<'a> {
    ctx: &'a Replicator,
    session: CopySession,
    class_plans: FxHashMap<(TypeId, PlanKind), Arc<ClassPlan>>,
    struct_plans: FxHashMap<TypeId, Arc<StructPlan>>,
}

impl<'a> Copier<'a> {
    pub(crate) fn new(ctx: &'a Replicator) -> Self {
        Copier {
            ctx,
            session: CopySession::new(ctx.config().iterative_threshold),
            class_plans: FxHashMap::default(),
            struct_plans: FxHashMap::default(),
        }
    }

    fn table(&self) -> &'a TypeTable {
        self.ctx.table()
    }

    pub(crate) fn class_plan(&mut self, ty: TypeId, kind: PlanKind) -> CloneResult<Arc<ClassPlan>> {
        if let Some(plan) = self.class_plans.get(&(ty, kind)) {
            return Ok(Arc::clone(plan));
        }
        let plan = self.ctx.class_plan(ty, kind)?;
        self.class_plans.insert((ty, kind), Arc::clone(&plan));
        Ok(plan)
    }

    fn struct_plan(&mut self, ty: TypeId) -> CloneResult<Arc<StructPlan>> {
        if let Some(plan) = self.struct_plans.get(&ty) {
            return Ok(Arc::clone(plan));
        }
        let plan = self.ctx.struct_plan(ty)?;
        self.struct_plans.insert(ty, Arc::clone(&plan));
        Ok(plan)
    }

    // === Dispatch ===

    /// Deep-copy any value.
    pub(crate) fn clone_value(&mut self, value: &Value) -> CloneResult<Value> {
        match value {
            Value::Null => Ok(Value::Null),
            Value::Ref(obj) => Ok(self.clone_ref(obj)?.map_or(Value::Null, Value::Ref)),
            Value::Struct(s) => self.clone_struct(s),
            scalar => Ok(match scalar.runtime_type() {
                Some(ty) if self.ctx.ignore_registry().is_ignored(ty) => {
                    Value::default_for(self.table(), ty)
                }
                _ => scalar.clone(),
            }),
        }
    }

    /// Deep-copy a value-semantics struct.
    pub(crate) fn clone_struct(&mut self, value: &StructValue) -> CloneResult<Value> {
        let plan = self.struct_plan(value.ty())?;
        match &*plan {
            StructPlan::Ignored(default) => Ok(default.clone()),
            StructPlan::Shared => Ok(Value::Struct(value.clone())),
            StructPlan::Fields(steps) => {
                let mut copy = value.clone();
                for (slot, field) in self.apply_steps(steps, value.fields())? {
                    copy.set(slot, field)?;
                }
                Ok(Value::Struct(copy))
            }
        }
    }

    /// Deep-copy an object. `None` means the object's type is ignored.
    pub(crate) fn clone_ref(&mut self, obj: &ObjRef) -> CloneResult<Option<ObjRef>> {
        let ty = obj.ty();
        if self.ctx.ignore_registry().is_ignored(ty) {
            return Ok(None);
        }
        if let Some(known) = self.session.get_known(obj) {
            return Ok(Some(known));
        }

        let plan = self.class_plan(ty, PlanKind::New)?;
        match &*plan {
            ClassPlan::Ignored => Ok(None),
            ClassPlan::Shared => Ok(Some(obj.clone())),
            plan if self.session.is_iterative() && plan.defers_fill() => {
                let copy = self.shallow_and_register(obj);
                self.session.enqueue(obj.clone(), copy.clone());
                Ok(Some(copy))
            }
            plan => ensure_sufficient_stack(|| self.instantiate(plan, obj)).map(Some),
        }
    }

    /// Fill every queued shallow copy. New work may be queued while draining.
    pub(crate) fn drain(&mut self) -> CloneResult<()> {
        let mut drained = 0usize;
        while let Some((src, dst)) = self.session.next_pending() {
            let plan = self.class_plan(src.ty(), PlanKind::New)?;
            self.fill(&plan, &src, &dst)?;
            drained += 1;
        }
        if drained > 0 {
            tracing::trace!(drained, tracked = self.session.tracked(), "drained deferred fills");
        }
        Ok(())
    }

    /// Copy `src` into the existing object `dst` with a `DeepInto` or
    /// `ShallowInto` plan.
    pub(crate) fn copy_into(&mut self, plan: &ClassPlan, src: &ObjRef, dst: &ObjRef) -> CloneResult<()> {
        self.session.add_known(src, dst);
        match plan {
            ClassPlan::Array(array) => self.array_into(array, src, dst),
            plan => self.fill(plan, src, dst),
        }
    }

    // === Instantiation ===

    fn instantiate(&mut self, plan: &ClassPlan, src: &ObjRef) -> CloneResult<ObjRef> {
        match plan {
            // Resolved by the caller before instantiation.
            ClassPlan::Ignored | ClassPlan::Shared => Ok(src.clone()),
            // Every slot is safe: the shallow copy is complete.
            ClassPlan::Tuple(TuplePlan::Direct) => Ok(self.shallow_and_register(src)),
            ClassPlan::SelfClone => self.clone_self(src),
            plan => {
                let copy = self.shallow_and_register(src);
                self.fill(plan, src, &copy)?;
                Ok(copy)
            }
        }
    }

    /// Bitwise-style copy of the storage, registered before any field is
    /// populated so cycles resolve to the new object.
    fn shallow_and_register(&mut self, src: &ObjRef) -> ObjRef {
        let data = src.read().shallow_copy();
        let copy = ObjRef::new(src.ty(), data);
        self.session.add_known(src, &copy);
        copy
    }

    /// Write the copied state of `src` into `dst`, which is either its
    /// registered shallow copy or a copy-into target. Arrays assume the
    /// former; copy-into walks arrays with [`Copier::array_into`].
    fn fill(&mut self, plan: &ClassPlan, src: &ObjRef, dst: &ObjRef) -> CloneResult<()> {
        match plan {
            ClassPlan::Ignored => Ok(()),
            ClassPlan::Shared => {
                let data = src.read().shallow_copy();
                dst.replace(data);
                Ok(())
            }
            ClassPlan::Record { steps } => self.fill_record(steps, src, dst),
            ClassPlan::Boxed => {
                let value = self.boxed_value(src)?;
                self.refill_boxed(&value, dst)
            }
            ClassPlan::Array(array) => self.fill_array(array, src, dst),
            ClassPlan::Map(map) => {
                let data = self.map_data(map, src)?;
                dst.replace(data);
                Ok(())
            }
            ClassPlan::Set(set) => {
                let data = self.set_data(set, src)?;
                dst.replace(data);
                Ok(())
            }
            ClassPlan::Bag => self.fill_bag(src, dst),
            ClassPlan::Tuple(TuplePlan::Direct) => {
                let slots = self.tuple_slots(src)?;
                dst.replace(ObjectData::Tuple(slots));
                Ok(())
            }
            ClassPlan::Tuple(TuplePlan::Slots(actions)) => self.fill_tuple(actions, src, dst),
            ClassPlan::Callable => self.fill_callable(src, dst),
            ClassPlan::SelfClone => {
                let data = match self.duplicate_native(src)? {
                    Some(data) => data,
                    None => src.read().clone(),
                };
                dst.replace(data);
                Ok(())
            }
            ClassPlan::Memberwise => {
                let data = self.memberwise_data(src)?;
                dst.replace(data);
                Ok(())
            }
        }
    }

    // === Slots ===

    fn apply(&mut self, action: &SlotAction, value: &Value) -> CloneResult<Value> {
        match action {
            SlotAction::Reset(default) => Ok(default.clone()),
            SlotAction::Keep => Ok(value.clone()),
            SlotAction::Deep => self.clone_value(value),
        }
    }

    fn apply_steps(&mut self, steps: &[FieldStep], slots: &[Value]) -> CloneResult<Vec<(usize, Value)>> {
        let mut writes = Vec::with_capacity(steps.len());
        for step in steps {
            let value = slots.get(step.slot).ok_or(ValueError::SlotOutOfRange {
                index: step.slot,
                len: slots.len(),
            })?;
            writes.push((step.slot, self.apply(&step.action, value)?));
        }
        Ok(writes)
    }

    /// Map keys and set elements: ignored types keep the original instance.
    fn clone_key(&mut self, action: &KeyAction, key: Key) -> CloneResult<Key> {
        match action {
            KeyAction::Original => Ok(key),
            KeyAction::Copy(_) if self.is_runtime_ignored(key.value()) => Ok(key),
            KeyAction::Copy(slot) => Ok(Key::new(self.apply(slot, key.value())?)),
        }
    }

    /// The value's own runtime type is ignored, whatever its declared type.
    fn is_runtime_ignored(&self, value: &Value) -> bool {
        let registry = self.ctx.ignore_registry();
        !registry.is_empty() && value.runtime_type().is_some_and(|ty| registry.is_ignored(ty))
    }

    // === Records ===

    fn fill_record(&mut self, steps: &[FieldStep], src: &ObjRef, dst: &ObjRef) -> CloneResult<()> {
        let slots = self.record_slots(src)?;
        let writes = self.apply_steps(steps, &slots)?;
        let mut guard = dst.write();
        match &mut *guard {
            ObjectData::Record(record) => {
                for (slot, value) in writes {
                    record.write_slot(slot, value)?;
                }
                Ok(())
            }
            other => Err(self.shape_error(dst, "record", other.label())),
        }
    }

    fn record_slots(&self, src: &ObjRef) -> CloneResult<Vec<Value>> {
        match &*src.read() {
            ObjectData::Record(record) => Ok(record.slots().to_vec()),
            other => Err(self.shape_error(src, "record", other.label())),
        }
    }

    // === Boxed structs ===

    fn refill_boxed(&mut self, value: &StructValue, dst: &ObjRef) -> CloneResult<()> {
        if let Value::Struct(copy) = self.clone_struct(value)? {
            dst.replace(ObjectData::Boxed(copy));
        }
        Ok(())
    }

    fn boxed_value(&self, src: &ObjRef) -> CloneResult<StructValue> {
        match &*src.read() {
            ObjectData::Boxed(value) => Ok(value.clone()),
            other => Err(self.shape_error(src, "boxed struct", other.label())),
        }
    }

    // === Callables ===

    fn fill_callable(&mut self, src: &ObjRef, dst: &ObjRef) -> CloneResult<()> {
        let callable = match &*src.read() {
            ObjectData::Callable(callable) => callable.clone(),
            other => return Err(self.shape_error(src, "callable", other.label())),
        };
        let mut captures = Vec::with_capacity(callable.captures().len());
        for capture in callable.captures() {
            captures.push(self.clone_value(capture)?);
        }
        dst.replace(ObjectData::Callable(callable.with_captures(captures)));
        Ok(())
    }

    // === Natives ===

    fn clone_self(&mut self, src: &ObjRef) -> CloneResult<ObjRef> {
        match self.duplicate_native(src)? {
            Some(data) => {
                let copy = ObjRef::new(src.ty(), data);
                self.session.add_known(src, &copy);
                Ok(copy)
            }
            None => Ok(src.clone()),
        }
    }

    fn duplicate_native(&self, src: &ObjRef) -> CloneResult<Option<ObjectData>> {
        let native = match &*src.read() {
            ObjectData::Native(native) => Arc::clone(native),
            other => return Err(self.shape_error(src, "native", other.label())),
        };
        Ok(native.duplicate().map(ObjectData::Native))
    }

    // === Member-wise containers ===

    /// Copy of the storage with every key, value and element deep-copied in
    /// place. A read-only wrapper deep-copies its backing object.
    fn memberwise_data(&mut self, src: &ObjRef) -> CloneResult<ObjectData> {
        let data = src.read().clone();
        Ok(match data {
            ObjectData::Map(entries) => {
                let mut copied = FxHashMap::with_capacity_and_hasher(entries.len(), FxBuildHasher);
                for (key, value) in entries {
                    copied.insert(self.deep_key(key)?, self.clone_value(&value)?);
                }
                ObjectData::Map(copied)
            }
            ObjectData::PersistentMap(entries) => {
                let mut copied = im::HashMap::new();
                for (key, value) in entries {
                    copied.insert(self.deep_key(key)?, self.clone_value(&value)?);
                }
                ObjectData::PersistentMap(copied)
            }
            ObjectData::Set(elems) => {
                let mut copied = FxHashSet::with_capacity_and_hasher(elems.len(), FxBuildHasher);
                for elem in elems {
                    copied.insert(self.deep_key(elem)?);
                }
                ObjectData::Set(copied)
            }
            ObjectData::PersistentSet(elems) => {
                let mut copied = im::HashSet::new();
                for elem in elems {
                    copied.insert(self.deep_key(elem)?);
                }
                ObjectData::PersistentSet(copied)
            }
            // An ignored backing stays shared.
            ObjectData::ReadOnly(backing) => {
                ObjectData::ReadOnly(self.clone_ref(&backing)?.unwrap_or(backing))
            }
            other => other,
        })
    }

    fn deep_key(&mut self, key: Key) -> CloneResult<Key> {
        self.clone_key(&KeyAction::Copy(SlotAction::Deep), key)
    }

    // === Shared helpers ===

    fn read_only_backing(&self, src: &ObjRef) -> CloneResult<ObjRef> {
        match &*src.read() {
            ObjectData::ReadOnly(backing) => Ok(backing.clone()),
            other => Err(self.shape_error(src, "read-only wrapper", other.label())),
        }
    }

    fn shape_error(&self, obj: &ObjRef, expected: &'static str, found: &'static str) -> CloneError {
        CloneError::ShapeMismatch {
            ty: self.table().name_of(obj.ty()).to_string(),
            expected,
            found,
        }
    }
}
