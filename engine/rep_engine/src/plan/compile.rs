//! Plan compilation.
//!
//! Priority order for reference types:
//! 1. ignored type
//! 2. safe type (returned as-is)
//! 3. property bag adapter
//! 4. map adapter, 5. set adapter, 6. array adapter
//! 7. small all-safe tuple rebuilt directly
//! 8. generic field-by-field record plan
//!
//! Maps and sets flagged `NO_DEFAULT_CTOR` skip their adapter and are copied
//! member-wise.

use rep_types::{FieldDef, TypeDescriptor, TypeFlags, TypeId, TypeKind, TypeTable};
use rep_value::Value;
use rustc_hash::FxHashSet;

use super::{
    ArrayPlan, ClassPlan, FieldStep, KeyAction, MapPlan, PlanKind, SetPlan, SlotAction,
    StructPlan, TuplePlan,
};
use crate::{CloneResult, CopyConfig, IgnoreRegistry, SafetyOracle};

/// Borrowed view of everything a plan depends on.
pub(crate) struct PlanCompiler<'a> {
    pub table: &'a TypeTable,
    pub oracle: &'a SafetyOracle,
    pub ignored: &'a IgnoreRegistry,
    pub config: &'a CopyConfig,
}

impl PlanCompiler<'_> {
    #[tracing::instrument(level = "trace", skip(self))]
    pub(crate) fn compile_class(&self, ty: TypeId, kind: PlanKind) -> CloneResult<ClassPlan> {
        let desc = self.table.descriptor(ty)?;
        let plan = match kind {
            PlanKind::New | PlanKind::DeepInto => self.deep_plan(ty, &desc, kind)?,
            PlanKind::ShallowInto => self.shallow_plan(ty, &desc)?,
        };
        tracing::debug!(
            ty = %desc.name,
            ?kind,
            plan = plan.label(),
            "compiled clone plan"
        );
        Ok(plan)
    }

    #[tracing::instrument(level = "trace", skip(self))]
    pub(crate) fn compile_struct(&self, ty: TypeId) -> CloneResult<StructPlan> {
        let desc = self.table.descriptor(ty)?;
        let plan = if self.ignored.is_ignored(ty) {
            StructPlan::Ignored(Value::default_for(self.table, ty))
        } else if self.is_direct_copy(ty)? {
            StructPlan::Shared
        } else {
            StructPlan::Fields(self.field_steps(ty, PlanKind::New)?)
        };
        tracing::debug!(ty = %desc.name, "compiled struct plan");
        Ok(plan)
    }

    fn deep_plan(&self, ty: TypeId, desc: &TypeDescriptor, kind: PlanKind) -> CloneResult<ClassPlan> {
        if self.ignored.is_ignored(ty) {
            return Ok(ClassPlan::Ignored);
        }
        if self.oracle.is_safe(self.table, ty) {
            return Ok(ClassPlan::Shared);
        }
        let no_ctor = desc.has_flag(TypeFlags::NO_DEFAULT_CTOR);

        Ok(match &desc.kind {
            TypeKind::Bag => ClassPlan::Bag,
            TypeKind::Map { .. } | TypeKind::Set { .. } if no_ctor => ClassPlan::Memberwise,
            TypeKind::Map { key, value, flavor } => ClassPlan::Map(MapPlan {
                key: self.key_action(*key)?,
                value: self.slot_action(*value)?,
                flavor: *flavor,
            }),
            TypeKind::Set { elem, flavor } => ClassPlan::Set(SetPlan {
                elem: self.key_action(*elem)?,
                flavor: *flavor,
            }),
            TypeKind::Array { elem, .. } => ClassPlan::Array(ArrayPlan {
                elem: self.slot_action(*elem)?,
            }),
            TypeKind::Tuple { slots } => ClassPlan::Tuple(self.tuple_plan(slots)?),
            TypeKind::Class => ClassPlan::Record {
                steps: self.field_steps(ty, kind)?,
            },
            TypeKind::Struct => ClassPlan::Boxed,
            TypeKind::Callable => ClassPlan::Callable,
            TypeKind::Native if desc.has_flag(TypeFlags::SELF_CLONE) => ClassPlan::SelfClone,
            TypeKind::Native | TypeKind::Any | TypeKind::Scalar(_) | TypeKind::Enum => {
                ClassPlan::Shared
            }
        })
    }

    /// Shallow copy-into ignores policy: records copy every walked slot raw,
    /// arrays copy cells raw over the overlapping extents, everything else
    /// takes a one-level copy of the source storage.
    fn shallow_plan(&self, ty: TypeId, desc: &TypeDescriptor) -> CloneResult<ClassPlan> {
        Ok(match desc.kind {
            TypeKind::Class => {
                let layout = self.table.layout(ty)?;
                let steps = layout
                    .iter()
                    .enumerate()
                    .filter(|(_, member)| !member.behind_boundary)
                    .map(|(slot, _)| FieldStep {
                        slot,
                        action: SlotAction::Keep,
                    })
                    .collect();
                ClassPlan::Record { steps }
            }
            TypeKind::Array { .. } => ClassPlan::Array(ArrayPlan {
                elem: SlotAction::Keep,
            }),
            _ => ClassPlan::Shared,
        })
    }

    /// Steps for every walked member. A fresh copy already holds the source
    /// values, so `New` plans drop the `Keep` steps.
    fn field_steps(&self, ty: TypeId, kind: PlanKind) -> CloneResult<Box<[FieldStep]>> {
        let layout = self.table.layout(ty)?;
        let mut steps = Vec::with_capacity(layout.len());
        for (slot, member) in layout.iter().enumerate() {
            if member.behind_boundary {
                continue;
            }
            let action = self.member_action(&member.field)?;
            if kind == PlanKind::New && action == SlotAction::Keep {
                continue;
            }
            steps.push(FieldStep { slot, action });
        }
        Ok(steps.into_boxed_slice())
    }

    fn member_action(&self, field: &FieldDef) -> CloneResult<SlotAction> {
        if field.is_ignored() {
            return Ok(SlotAction::Reset(Value::default_for(self.table, field.ty)));
        }
        self.slot_action(field.ty)
    }

    fn slot_action(&self, ty: TypeId) -> CloneResult<SlotAction> {
        if self.ignored.is_ignored(ty) {
            return Ok(SlotAction::Reset(Value::default_for(self.table, ty)));
        }
        if self.is_direct_copy(ty)? {
            return Ok(SlotAction::Keep);
        }
        Ok(SlotAction::Deep)
    }

    fn key_action(&self, ty: TypeId) -> CloneResult<KeyAction> {
        if self.ignored.is_ignored(ty) {
            return Ok(KeyAction::Original);
        }
        Ok(KeyAction::Copy(self.slot_action(ty)?))
    }

    fn tuple_plan(&self, slots: &[TypeId]) -> CloneResult<TuplePlan> {
        if slots.len() <= self.config.max_direct_tuple_arity {
            let mut direct = true;
            for slot in slots {
                if self.ignored.is_ignored(*slot) || !self.is_direct_copy(*slot)? {
                    direct = false;
                    break;
                }
            }
            if direct {
                return Ok(TuplePlan::Direct);
            }
        }
        let actions = slots
            .iter()
            .map(|slot| self.slot_action(*slot))
            .collect::<CloneResult<Vec<_>>>()?;
        Ok(TuplePlan::Slots(actions.into_boxed_slice()))
    }

    /// Safe, and no ignored type hides inside its value-semantics fields.
    fn is_direct_copy(&self, ty: TypeId) -> CloneResult<bool> {
        if !self.oracle.is_safe(self.table, ty) {
            return Ok(false);
        }
        let mut visited = FxHashSet::default();
        Ok(!self.reaches_ignored(ty, &mut visited)?)
    }

    fn reaches_ignored(&self, ty: TypeId, visited: &mut FxHashSet<TypeId>) -> CloneResult<bool> {
        if self.ignored.is_empty() {
            return Ok(false);
        }
        let desc = self.table.descriptor(ty)?;
        if desc.kind != TypeKind::Struct || !visited.insert(ty) {
            return Ok(false);
        }
        for member in self.table.layout(ty)?.iter() {
            let field_ty = member.field.ty;
            if self.ignored.is_ignored(field_ty) || self.reaches_ignored(field_ty, visited)? {
                return Ok(true);
            }
        }
        Ok(false)
    }
}
