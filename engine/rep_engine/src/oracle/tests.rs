#![allow(clippy::unwrap_used, reason = "tests use unwrap for brevity")]

use rep_types::{FieldDef, TypeDescriptor};

use super::*;

#[test]
fn builtins_are_safe_except_any() {
    let table = TypeTable::new();
    let oracle = SafetyOracle::new();

    for ty in [
        TypeId::BOOL,
        TypeId::INT,
        TypeId::UINT,
        TypeId::BYTE,
        TypeId::FLOAT,
        TypeId::CHAR,
        TypeId::TEXT,
        TypeId::GUID,
        TypeId::TIMESTAMP,
        TypeId::DURATION,
    ] {
        assert!(oracle.is_safe(&table, ty), "{ty:?} should be safe");
    }
    assert!(!oracle.is_safe(&table, TypeId::ANY));
}

#[test]
fn enums_are_safe_classes_are_not() {
    let table = TypeTable::new();
    let oracle = SafetyOracle::new();
    let color = table.register(TypeDescriptor::enumeration("Color")).unwrap();
    let node = table.register(TypeDescriptor::class("Node")).unwrap();

    assert!(oracle.is_safe(&table, color));
    assert!(!oracle.is_safe(&table, node));
}

#[test]
fn immutable_classes_are_whitelisted() {
    let table = TypeTable::new();
    let oracle = SafetyOracle::new();
    let comparer = table
        .register(TypeDescriptor::class("OrdinalComparer").with_flags(TypeFlags::IMMUTABLE))
        .unwrap();

    assert!(oracle.is_safe(&table, comparer));
}

#[test]
fn struct_safety_is_transitive() {
    let table = TypeTable::new();
    let oracle = SafetyOracle::new();
    let node = table.register(TypeDescriptor::class("Node")).unwrap();
    let point = table
        .register(
            TypeDescriptor::structure("Point")
                .field("x", TypeId::INT)
                .field("y", TypeId::INT),
        )
        .unwrap();
    let segment = table
        .register(
            TypeDescriptor::structure("Segment")
                .field("from", point)
                .field("to", point),
        )
        .unwrap();
    let handle = table
        .register(TypeDescriptor::structure("Handle").field("target", node))
        .unwrap();
    let wrapper = table
        .register(TypeDescriptor::structure("Wrapper").field("inner", handle))
        .unwrap();

    assert!(oracle.is_safe(&table, point));
    assert!(oracle.is_safe(&table, segment));
    assert!(!oracle.is_safe(&table, handle));
    assert!(!oracle.is_safe(&table, wrapper));
}

#[test]
fn struct_with_ignored_member_is_unsafe() {
    let table = TypeTable::new();
    let oracle = SafetyOracle::new();
    let secret = table
        .register(
            TypeDescriptor::structure("Secret")
                .field("id", TypeId::INT)
                .with_field(FieldDef::new("token", TypeId::TEXT).ignored()),
        )
        .unwrap();

    assert!(!oracle.is_safe(&table, secret));
}

#[test]
fn natives_are_safe_unless_self_cloning() {
    let table = TypeTable::new();
    let oracle = SafetyOracle::new();
    let handle = table.register(TypeDescriptor::native("FileHandle")).unwrap();
    let buffer = table
        .register(TypeDescriptor::native("Buffer").with_flags(TypeFlags::SELF_CLONE))
        .unwrap();

    assert!(oracle.is_safe(&table, handle));
    assert!(!oracle.is_safe(&table, buffer));
}

#[test]
fn containers_and_callables_are_unsafe() {
    let table = TypeTable::new();
    let oracle = SafetyOracle::new();
    let ints = table.array_of(TypeId::INT).unwrap();
    let map = table.map_of(TypeId::TEXT, TypeId::INT).unwrap();
    let pair = table.tuple_of(&[TypeId::INT, TypeId::INT]).unwrap();
    let func = table.register(TypeDescriptor::callable("Func")).unwrap();
    let bag = table.register(TypeDescriptor::bag("Expando")).unwrap();

    for ty in [ints, map, pair, func, bag] {
        assert!(!oracle.is_safe(&table, ty));
    }
}

#[test]
fn unknown_types_are_unsafe() {
    let table = TypeTable::new();
    let oracle = SafetyOracle::new();
    assert!(!oracle.is_safe(&table, TypeId::from_raw(TypeId::FIRST_DYNAMIC + 99)));
}

#[test]
fn verdicts_are_memoized_until_cleared() {
    let table = TypeTable::new();
    let oracle = SafetyOracle::new();
    let point = table
        .register(TypeDescriptor::structure("Point").field("x", TypeId::INT))
        .unwrap();

    assert!(oracle.is_empty());
    assert!(oracle.is_safe(&table, point));
    // Point and its field type.
    assert_eq!(oracle.len(), 2);

    assert!(oracle.is_safe(&table, point));
    assert_eq!(oracle.len(), 2);

    oracle.clear();
    assert!(oracle.is_empty());
}

#[test]
fn provisional_assumption_terminates_and_caches_root() {
    let table = TypeTable::new();
    let oracle = SafetyOracle::new();
    let leaf = table
        .register(TypeDescriptor::structure("Leaf").field("n", TypeId::INT))
        .unwrap();
    let mut processing = FxHashSet::default();
    processing.insert(leaf);

    // Under an assumption the verdict is provisional and stays uncached.
    let verdict = oracle.classify(&table, leaf, &mut processing);
    assert!(verdict.safe);
    assert!(verdict.provisional);
    assert!(oracle.cached(leaf).is_none());

    assert!(oracle.is_safe(&table, leaf));
    assert_eq!(oracle.cached(leaf), Some(true));
}

#[test]
fn self_containing_structs_resolve_through_their_own_fields() {
    let table = TypeTable::new();
    let oracle = SafetyOracle::new();
    let node = table.register(TypeDescriptor::class("Node")).unwrap();

    let span = table.declare("Span", TypeKind::Struct).unwrap();
    table
        .define(
            span,
            TypeDescriptor::structure("Span")
                .field("start", TypeId::INT)
                .field("parent", span),
        )
        .unwrap();
    let tagged = table.declare("Tagged", TypeKind::Struct).unwrap();
    table
        .define(
            tagged,
            TypeDescriptor::structure("Tagged")
                .field("inner", tagged)
                .field("owner", node),
        )
        .unwrap();

    assert!(oracle.is_safe(&table, span));
    assert_eq!(oracle.cached(span), Some(true));
    assert!(!oracle.is_safe(&table, tagged));
    assert_eq!(oracle.cached(tagged), Some(false));
}

#[test]
fn mutually_containing_structs_share_a_verdict() {
    let table = TypeTable::new();
    let oracle = SafetyOracle::new();
    let even = table.declare("Even", TypeKind::Struct).unwrap();
    let odd = table.declare("Odd", TypeKind::Struct).unwrap();
    table
        .define(even, TypeDescriptor::structure("Even").field("next", odd))
        .unwrap();
    table
        .define(odd, TypeDescriptor::structure("Odd").field("next", even).field("n", TypeId::INT))
        .unwrap();

    assert!(oracle.is_safe(&table, even));
    assert!(oracle.is_safe(&table, odd));
}

#[test]
fn declared_types_are_judged_again_once_defined() {
    let table = TypeTable::new();
    let oracle = SafetyOracle::new();
    let inner = table.declare("Inner", TypeKind::Struct).unwrap();
    let outer = table
        .register(TypeDescriptor::structure("Outer").field("inner", inner))
        .unwrap();

    assert!(!oracle.is_safe(&table, inner));
    assert!(!oracle.is_safe(&table, outer));
    assert!(oracle.cached(inner).is_none());
    assert!(oracle.cached(outer).is_none());

    table
        .define(inner, TypeDescriptor::structure("Inner").field("n", TypeId::INT))
        .unwrap();
    assert!(oracle.is_safe(&table, inner));
    assert!(oracle.is_safe(&table, outer));
}
