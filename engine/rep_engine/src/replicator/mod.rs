//! Copy context and entry points.
//!
//! A [`Replicator`] owns the state that outlives a single copy: the type
//! table, the safety oracle, the ignore registry and the plan cache. Every
//! copy call builds a short-lived session on the calling thread, so one
//! replicator can be shared by reference across threads.
//!
//! # Design
//!
//! Policy lives in the context object rather than in process globals.
//! Tests build their own replicator and never need a global reset.

use std::sync::Arc;

use rep_types::{SharedTypeTable, TypeFlags, TypeId, TypeKind, TypeTable};
use rep_value::{ObjRef, ObjectData, Value};
use rustc_hash::FxHashSet;

use crate::copier::Copier;
use crate::plan::{ClassPlan, PlanCache, PlanCompiler, PlanKind, StructPlan};
use crate::{CloneError, CloneResult, CopyConfig, IgnoreRegistry, SafetyOracle};

/// Deep and shallow copier over one type table.
#[derive(Debug)]
pub struct Replicator {
    table: SharedTypeTable,
    config: CopyConfig,
    oracle: SafetyOracle,
    ignored: IgnoreRegistry,
    plans: PlanCache,
}

impl Replicator {
    /// Create a replicator with the default configuration.
    pub fn new(table: SharedTypeTable) -> Self {
        Self::with_config(table, CopyConfig::default())
    }

    pub fn with_config(table: SharedTypeTable, config: CopyConfig) -> Self {
        Replicator {
            table,
            config,
            oracle: SafetyOracle::new(),
            ignored: IgnoreRegistry::new(),
            plans: PlanCache::default(),
        }
    }

    pub fn table(&self) -> &TypeTable {
        &self.table
    }

    pub fn config(&self) -> &CopyConfig {
        &self.config
    }

    pub fn oracle(&self) -> &SafetyOracle {
        &self.oracle
    }

    pub fn ignore_registry(&self) -> &IgnoreRegistry {
        &self.ignored
    }

    /// Whether instances of `ty` may be shared instead of copied.
    pub fn is_safe(&self, ty: TypeId) -> bool {
        self.oracle.is_safe(&self.table, ty)
    }

    // === Copying ===

    /// Copy `value` and everything reachable from it.
    ///
    /// Shared references in the source stay shared in the copy and cycles
    /// are reproduced. Values of safe types are returned as they are.
    #[tracing::instrument(level = "trace", skip_all)]
    pub fn deep_clone(&self, value: &Value) -> CloneResult<Value> {
        let mut copier = Copier::new(self);
        let copy = copier.clone_value(value)?;
        copier.drain()?;
        Ok(copy)
    }

    /// Copy the top-level instance only.
    ///
    /// Members keep pointing at the source's objects. Arrays, maps and sets
    /// get new backing storage whose elements are shared with the source.
    pub fn shallow_clone(&self, value: &Value) -> Value {
        let Value::Ref(obj) = value else {
            return value.clone();
        };
        if self.is_safe(obj.ty()) {
            return value.clone();
        }
        let data = obj.read().shallow_copy();
        let data = match data {
            ObjectData::Native(native) => match native.duplicate() {
                Some(copy) => ObjectData::Native(copy),
                None => return value.clone(),
            },
            data => data,
        };
        Value::Ref(ObjRef::new(obj.ty(), data))
    }

    /// Deep-copy the state of `source` into the existing object `target`.
    ///
    /// `target` must be an instance of the source's type or of a type
    /// derived from it. A null target is returned as null.
    #[tracing::instrument(level = "trace", skip_all)]
    pub fn deep_clone_into(&self, source: &Value, target: &Value) -> CloneResult<Value> {
        self.clone_into(source, target, PlanKind::DeepInto)
    }

    /// Copy the member values of `source` into `target` without copying
    /// anything they reference.
    #[tracing::instrument(level = "trace", skip_all)]
    pub fn shallow_clone_into(&self, source: &Value, target: &Value) -> CloneResult<Value> {
        self.clone_into(source, target, PlanKind::ShallowInto)
    }

    fn clone_into(&self, source: &Value, target: &Value, kind: PlanKind) -> CloneResult<Value> {
        let Some((src, dst)) = self.check_into(source, target)? else {
            return Ok(target.clone());
        };
        if src.ptr_eq(&dst) {
            return Ok(target.clone());
        }

        let mut copier = Copier::new(self);
        let plan = copier.class_plan(src.ty(), kind)?;
        copier.copy_into(&plan, &src, &dst)?;
        copier.drain()?;
        Ok(Value::Ref(dst))
    }

    /// Validate a copy-into pair. `None` means there is nothing to copy.
    fn check_into(&self, source: &Value, target: &Value) -> CloneResult<Option<(ObjRef, ObjRef)>> {
        if target.is_null() {
            return Ok(None);
        }
        let src = match source {
            Value::Null => return Err(CloneError::NullSource),
            Value::Ref(obj) => obj,
            Value::Struct(s) => {
                return Err(CloneError::InvalidTarget {
                    source_ty: self.table.name_of(s.ty()).to_string(),
                    target_ty: self.type_name_of(target),
                })
            }
            scalar => {
                return Err(CloneError::ImmutableTarget {
                    ty: self.type_name_of(scalar),
                })
            }
        };
        let Value::Ref(dst) = target else {
            return Err(CloneError::InvalidTarget {
                source_ty: self.table.name_of(src.ty()).to_string(),
                target_ty: self.type_name_of(target),
            });
        };

        let desc = self.table.descriptor(src.ty())?;
        if desc.has_flag(TypeFlags::IMMUTABLE) {
            return Err(CloneError::ImmutableTarget {
                ty: desc.name.to_string(),
            });
        }
        if !self.is_compatible_target(src.ty(), dst.ty()) {
            return Err(CloneError::InvalidTarget {
                source_ty: desc.name.to_string(),
                target_ty: self.table.name_of(dst.ty()).to_string(),
            });
        }
        Ok(Some((src.clone(), dst.clone())))
    }

    /// Derived targets are accepted. Arrays also accept any array of the
    /// same element type; the rank is checked when the cells are copied.
    fn is_compatible_target(&self, source: TypeId, target: TypeId) -> bool {
        if self.table.is_subtype(target, source) {
            return true;
        }
        let elem_of = |ty: TypeId| {
            self.table.get(ty).and_then(|desc| match desc.kind {
                TypeKind::Array { elem, .. } => Some(elem),
                _ => None,
            })
        };
        matches!((elem_of(source), elem_of(target)), (Some(a), Some(b)) if a == b)
    }

    fn type_name_of(&self, value: &Value) -> String {
        match value.runtime_type() {
            Some(ty) => self.table.name_of(ty).to_string(),
            None => "null".to_owned(),
        }
    }

    // === Ignore policy ===

    /// Treat `ty` as ignored: deep copies yield its default in place of any
    /// instance. Cached plans are rebuilt.
    pub fn ignore_type(&self, ty: TypeId) {
        if self.ignored.ignore(ty) {
            tracing::debug!(ty = %self.table.name_of(ty), "type ignored");
            self.plans.clear();
        }
    }

    pub fn ignore_types(&self, types: impl IntoIterator<Item = TypeId>) {
        let before = self.ignored.len();
        self.ignored.ignore_many(types);
        if self.ignored.len() != before {
            self.plans.clear();
        }
    }

    /// Forget every ignored type. The next copy produces real copies again.
    pub fn clear_ignored_types(&self) {
        tracing::debug!(count = self.ignored.len(), "clearing ignored types");
        self.ignored.clear();
        self.plans.clear();
    }

    pub fn get_ignored_types(&self) -> FxHashSet<TypeId> {
        self.ignored.snapshot()
    }

    pub fn is_type_ignored(&self, ty: TypeId) -> bool {
        self.ignored.is_ignored(ty)
    }

    // === Plan cache ===

    /// Drop every cached plan. Safety verdicts are kept.
    pub fn clear_plan_cache(&self) {
        tracing::debug!(plans = self.plans.len(), "clearing plan cache");
        self.plans.clear();
    }

    pub fn cached_plan_count(&self) -> usize {
        self.plans.len()
    }

    pub(crate) fn class_plan(&self, ty: TypeId, kind: PlanKind) -> CloneResult<Arc<ClassPlan>> {
        self.plans.class(ty, kind, || self.compiler().compile_class(ty, kind))
    }

    pub(crate) fn struct_plan(&self, ty: TypeId) -> CloneResult<Arc<StructPlan>> {
        self.plans.structure(ty, || self.compiler().compile_struct(ty))
    }

    fn compiler(&self) -> PlanCompiler<'_> {
        PlanCompiler {
            table: &self.table,
            oracle: &self.oracle,
            ignored: &self.ignored,
            config: &self.config,
        }
    }
}
