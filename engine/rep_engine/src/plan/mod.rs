//! Clone plans.
//!
//! A plan is the per-type recipe for copying an instance, compiled once from
//! the type's descriptor, the safety oracle and the ignore registry, then
//! cached. Plans never embed other plans: a nested value looks up its own
//! plan when it is reached, which keeps compilation free of recursion and
//! lets self-referential types compile in one step.
//!
//! # Plan Kinds
//!
//! Each reference type has up to three plans:
//! - [`PlanKind::New`]: produce a fresh copy
//! - [`PlanKind::DeepInto`]: deep-copy into an existing instance
//! - [`PlanKind::ShallowInto`]: shallow-copy into an existing instance
//!
//! Value-semantics structs have a single [`StructPlan`].
//!
//! # Concurrency
//!
//! The cache is a `DashMap`. A plan is built outside any lock; if two
//! threads build the same plan at once the first published one wins and the
//! other is dropped. Plans are pure functions of the type and the ignore
//! state at build time, so either result is correct.

mod compile;

use std::sync::Arc;

use dashmap::DashMap;
use rep_types::{CollectionFlavor, TypeId};
use rep_value::Value;

use crate::CloneResult;

pub(crate) use compile::PlanCompiler;

/// Which flavour of plan to build for a reference type.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub(crate) enum PlanKind {
    New,
    DeepInto,
    ShallowInto,
}

/// How one slot (field, element, entry value) is copied.
#[derive(Clone, Debug, PartialEq)]
pub(crate) enum SlotAction {
    /// Write this default instead of copying.
    Reset(Value),
    /// Copy the value unchanged.
    Keep,
    /// Deep-copy whatever the slot holds at runtime.
    Deep,
}

/// How a map key or set element is copied.
#[derive(Clone, Debug, PartialEq)]
pub(crate) enum KeyAction {
    /// The declared type is ignored: reuse the original instance.
    Original,
    Copy(SlotAction),
}

#[derive(Clone, Debug, PartialEq)]
pub(crate) struct FieldStep {
    pub slot: usize,
    pub action: SlotAction,
}

#[derive(Clone, Debug, PartialEq)]
pub(crate) struct ArrayPlan {
    pub elem: SlotAction,
}

#[derive(Clone, Debug, PartialEq)]
pub(crate) struct MapPlan {
    pub key: KeyAction,
    pub value: SlotAction,
    pub flavor: CollectionFlavor,
}

#[derive(Clone, Debug, PartialEq)]
pub(crate) struct SetPlan {
    pub elem: KeyAction,
    pub flavor: CollectionFlavor,
}

#[derive(Clone, Debug, PartialEq)]
pub(crate) enum TuplePlan {
    /// Every slot is safe: rebuild from the same slot values.
    Direct,
    /// Copy slot by slot, like a record.
    Slots(Box<[SlotAction]>),
}

/// Compiled procedure for a reference-semantics type.
#[derive(Clone, Debug, PartialEq)]
pub(crate) enum ClassPlan {
    /// The type is ignored: always null.
    Ignored,
    /// Instances are returned (or for copy-into, transferred) unchanged.
    Shared,
    /// Class instance: shallow copy, then the listed field steps.
    Record { steps: Box<[FieldStep]> },
    /// Boxed struct: copy through the struct plan, keep box identity.
    Boxed,
    Array(ArrayPlan),
    Map(MapPlan),
    Set(SetPlan),
    Bag,
    Tuple(TuplePlan),
    /// Closure: deep-copy the captured environment.
    Callable,
    /// Opaque native that duplicates itself.
    SelfClone,
    /// Container without an empty constructor: shallow copy, then deep-copy
    /// every key, value and element in place.
    Memberwise,
}

impl ClassPlan {
    /// Plans whose instances can be shallow-copied now and filled later
    /// from the session's work queue.
    ///
    /// The others never reach a nested object: they share the instance,
    /// drop it, or are complete after one shallow or native copy.
    pub(crate) fn defers_fill(&self) -> bool {
        !matches!(
            self,
            ClassPlan::Ignored
                | ClassPlan::Shared
                | ClassPlan::Tuple(TuplePlan::Direct)
                | ClassPlan::SelfClone
        )
    }

    pub(crate) fn label(&self) -> &'static str {
        match self {
            ClassPlan::Ignored => "ignored",
            ClassPlan::Shared => "shared",
            ClassPlan::Record { .. } => "record",
            ClassPlan::Boxed => "boxed",
            ClassPlan::Array(_) => "array",
            ClassPlan::Map(_) => "map",
            ClassPlan::Set(_) => "set",
            ClassPlan::Bag => "bag",
            ClassPlan::Tuple(TuplePlan::Direct) => "tuple-direct",
            ClassPlan::Tuple(TuplePlan::Slots(_)) => "tuple-slots",
            ClassPlan::Callable => "callable",
            ClassPlan::SelfClone => "self-clone",
            ClassPlan::Memberwise => "memberwise",
        }
    }
}

/// Compiled procedure for a value-semantics struct.
#[derive(Clone, Debug, PartialEq)]
pub(crate) enum StructPlan {
    /// The type is ignored: always this default.
    Ignored(Value),
    /// Safe: copy unchanged.
    Shared,
    /// Copy, then apply the listed field steps.
    Fields(Box<[FieldStep]>),
}

/// Concurrent plan cache.
#[derive(Debug, Default)]
pub(crate) struct PlanCache {
    classes: DashMap<(TypeId, PlanKind), Arc<ClassPlan>>,
    structs: DashMap<TypeId, Arc<StructPlan>>,
}

impl PlanCache {
    pub(crate) fn class(
        &self,
        ty: TypeId,
        kind: PlanKind,
        build: impl FnOnce() -> CloneResult<ClassPlan>,
    ) -> CloneResult<Arc<ClassPlan>> {
        let key = (ty, kind);
        if let Some(plan) = self.classes.get(&key).map(|entry| Arc::clone(entry.value())) {
            return Ok(plan);
        }
        let plan = Arc::new(build()?);
        Ok(Arc::clone(self.classes.entry(key).or_insert(plan).value()))
    }

    pub(crate) fn structure(
        &self,
        ty: TypeId,
        build: impl FnOnce() -> CloneResult<StructPlan>,
    ) -> CloneResult<Arc<StructPlan>> {
        if let Some(plan) = self.structs.get(&ty).map(|entry| Arc::clone(entry.value())) {
            return Ok(plan);
        }
        let plan = Arc::new(build()?);
        Ok(Arc::clone(self.structs.entry(ty).or_insert(plan).value()))
    }

    pub(crate) fn len(&self) -> usize {
        self.classes.len() + self.structs.len()
    }

    pub(crate) fn clear(&self) {
        self.classes.clear();
        self.structs.clear();
    }
}
