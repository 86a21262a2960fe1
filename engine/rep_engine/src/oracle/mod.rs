//! Safety oracle.
//!
//! Decides, per type, whether instances may be returned unchanged instead of
//! copied. Verdicts are memoized for the life of the oracle and only dropped
//! by an explicit [`SafetyOracle::clear`].
//!
//! # Classification Rules
//!
//! | Type | Safe? | Reason |
//! |------|-------|--------|
//! | scalars, text, enums | yes | immutable leaves |
//! | `IMMUTABLE`-flagged types | yes | whitelisted by policy |
//! | natives | unless `SELF_CLONE` | opaque handles are shared |
//! | structs | if every field type is safe and no field is ignored | transitive |
//! | classes, containers, callables, `any` | no | shared mutable identity |
//!
//! # Design
//!
//! A struct currently under analysis is provisionally safe, so structural
//! self-containment terminates. A verdict reached under that assumption is
//! only cached once the outermost analysis completes; an unsafe verdict
//! never depends on an assumption and is cached immediately.
//!
//! A type that is declared but not yet defined is unsafe for now. Nothing
//! that reached it is cached, so the verdict is recomputed once the table
//! defines it.

use dashmap::DashMap;
use rep_types::{TypeFlags, TypeId, TypeKind, TypeTable};
use rustc_hash::FxHashSet;

/// Memoized per-type safety verdicts.
#[derive(Debug, Default)]
pub struct SafetyOracle {
    verdicts: DashMap<TypeId, bool>,
}

/// A verdict plus what it leaned on.
#[derive(Copy, Clone)]
struct Verdict {
    safe: bool,
    /// Assumed a struct still under analysis is safe.
    provisional: bool,
    /// Met a type the table does not define (yet).
    incomplete: bool,
}

impl Verdict {
    const UNSAFE: Self = Verdict::settled(false);

    const INCOMPLETE: Self = Verdict {
        safe: false,
        provisional: false,
        incomplete: true,
    };

    const fn settled(safe: bool) -> Self {
        Verdict {
            safe,
            provisional: false,
            incomplete: false,
        }
    }
}

impl SafetyOracle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether instances of `ty` may be returned without copying.
    ///
    /// Types unknown to `table`, or declared but not defined, are never safe.
    pub fn is_safe(&self, table: &TypeTable, ty: TypeId) -> bool {
        if let Some(safe) = self.cached(ty) {
            return safe;
        }
        let mut processing = FxHashSet::default();
        let verdict = self.classify(table, ty, &mut processing);
        if !verdict.incomplete {
            self.verdicts.insert(ty, verdict.safe);
        }
        verdict.safe
    }

    /// Number of memoized verdicts.
    pub fn len(&self) -> usize {
        self.verdicts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.verdicts.is_empty()
    }

    /// Forget every verdict.
    pub fn clear(&self) {
        self.verdicts.clear();
    }

    fn cached(&self, ty: TypeId) -> Option<bool> {
        self.verdicts.get(&ty).map(|entry| *entry.value())
    }

    fn classify(&self, table: &TypeTable, ty: TypeId, processing: &mut FxHashSet<TypeId>) -> Verdict {
        if let Some(safe) = self.cached(ty) {
            return Verdict::settled(safe);
        }
        if processing.contains(&ty) {
            return Verdict {
                safe: true,
                provisional: true,
                incomplete: false,
            };
        }
        let Some(desc) = table.get(ty) else {
            return Verdict::INCOMPLETE;
        };

        let verdict = if desc.has_flag(TypeFlags::IMMUTABLE) {
            Verdict::settled(true)
        } else {
            match desc.kind {
                TypeKind::Scalar(_) | TypeKind::Enum => Verdict::settled(true),
                TypeKind::Native => Verdict::settled(!desc.has_flag(TypeFlags::SELF_CLONE)),
                TypeKind::Struct => {
                    processing.insert(ty);
                    let verdict = self.classify_fields(table, ty, processing);
                    processing.remove(&ty);
                    verdict
                }
                TypeKind::Any
                | TypeKind::Class
                | TypeKind::Array { .. }
                | TypeKind::Map { .. }
                | TypeKind::Set { .. }
                | TypeKind::Tuple { .. }
                | TypeKind::Bag
                | TypeKind::Callable => Verdict::UNSAFE,
            }
        };

        if !verdict.provisional && !verdict.incomplete {
            self.verdicts.insert(ty, verdict.safe);
        }
        verdict
    }

    fn classify_fields(
        &self,
        table: &TypeTable,
        ty: TypeId,
        processing: &mut FxHashSet<TypeId>,
    ) -> Verdict {
        let Ok(layout) = table.layout(ty) else {
            return Verdict::INCOMPLETE;
        };
        let mut provisional = false;
        for member in layout.iter() {
            // An ignored member has to be reset, so the value must be copied.
            if member.field.is_ignored() {
                return Verdict::UNSAFE;
            }
            let field = self.classify(table, member.field.ty, processing);
            if !field.safe {
                return Verdict {
                    provisional: false,
                    ..field
                };
            }
            provisional |= field.provisional;
        }
        Verdict {
            safe: true,
            provisional,
            incomplete: false,
        }
    }
}

#[cfg(test)]
mod tests;
