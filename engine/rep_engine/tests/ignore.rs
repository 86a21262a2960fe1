//! Ignored types and members.

#![allow(clippy::unwrap_used, reason = "tests use unwrap for brevity")]

mod common;

use common::Fixture;
use pretty_assertions::assert_eq;
use rep_types::{FieldDef, TypeDescriptor, TypeId};
use rep_value::{ArrayData, Key, ObjRef, ObjectData, PropertyBag, StructValue, Value};
use rustc_hash::FxHashMap;

/// `Holder { name: text, node: Node, stamp: timestamp }`
fn holder(fx: &Fixture) -> (TypeId, ObjRef, ObjRef) {
    let ty = fx
        .table()
        .register(
            TypeDescriptor::class("Holder")
                .field("name", TypeId::TEXT)
                .field("node", fx.node)
                .field("stamp", TypeId::TIMESTAMP),
        )
        .unwrap();
    let node = fx.node(1);
    let obj = ObjRef::record(
        fx.table(),
        ty,
        vec![Value::text("h"), Value::Ref(node.clone()), Value::Timestamp(42)],
    )
    .unwrap();
    (ty, obj, node)
}

#[test]
fn ignored_class_members_become_null() {
    let fx = Fixture::new();
    let (_, obj, node) = holder(&fx);
    fx.replicator.ignore_type(fx.node);

    let copy = fx.deep_obj(&obj);
    assert_eq!(fx.field(&copy, "node"), Value::Null);
    assert_eq!(fx.field(&copy, "name"), Value::text("h"));
    assert_eq!(fx.field(&copy, "stamp"), Value::Timestamp(42));
    assert!(fx.follow(&obj, "node").ptr_eq(&node));
}

#[test]
fn clearing_restores_real_copies() {
    let fx = Fixture::new();
    let (_, obj, node) = holder(&fx);
    fx.replicator.ignore_type(fx.node);
    assert_eq!(fx.field(&fx.deep_obj(&obj), "node"), Value::Null);

    fx.replicator.clear_ignored_types();
    let copy = fx.deep_obj(&obj);
    let copied = fx.follow(&copy, "node");
    assert!(!copied.ptr_eq(&node));
    assert_eq!(fx.value_of(&copied), 1);
}

#[test]
fn ignored_scalar_type_resets_to_default() {
    let fx = Fixture::new();
    let (_, obj, _) = holder(&fx);
    fx.replicator.ignore_type(TypeId::TIMESTAMP);

    let copy = fx.deep_obj(&obj);
    assert_eq!(fx.field(&copy, "stamp"), Value::Timestamp(0));
    assert_eq!(fx.deep(&Value::Timestamp(5)), Value::Timestamp(0));
}

#[test]
fn ignored_root_is_null() {
    let fx = Fixture::new();
    let node = fx.node(1);
    fx.replicator.ignore_type(fx.node);
    assert_eq!(fx.deep(&Value::Ref(node)), Value::Null);
}

#[test]
fn ignored_type_inside_struct_resets_that_field() {
    let fx = Fixture::new();
    let ty = fx
        .table()
        .register(
            TypeDescriptor::structure("Reading")
                .field("value", TypeId::FLOAT)
                .field("at", TypeId::TIMESTAMP),
        )
        .unwrap();
    let reading = Value::Struct(StructValue::new(ty, vec![Value::Float(1.5), Value::Timestamp(9)]));
    assert_eq!(fx.deep(&reading), reading);

    fx.replicator.ignore_type(TypeId::TIMESTAMP);
    let copy = fx.deep(&reading);
    assert_eq!(
        copy.as_struct().unwrap().fields(),
        &[Value::Float(1.5), Value::Timestamp(0)]
    );

    fx.replicator.ignore_type(ty);
    let copy = fx.deep(&reading);
    assert_eq!(
        copy.as_struct().unwrap().fields(),
        &[Value::Float(0.0), Value::Timestamp(0)]
    );
}

#[test]
fn member_flags_decide_what_is_copied() {
    let fx = Fixture::new();
    let ty = fx
        .table()
        .register(
            TypeDescriptor::class("Session")
                .with_field(FieldDef::new("token", TypeId::TEXT).ignored())
                .with_field(FieldDef::new("cache", fx.node).non_serialized())
                .with_field(FieldDef::new("user", fx.node).non_serialized().kept())
                .with_field(FieldDef::new("count", TypeId::INT).ignored().kept()),
        )
        .unwrap();
    let (cache, user) = (fx.node(1), fx.node(2));
    let obj = ObjRef::record(
        fx.table(),
        ty,
        vec![
            Value::text("secret"),
            Value::Ref(cache),
            Value::Ref(user.clone()),
            Value::Int(3),
        ],
    )
    .unwrap();

    let copy = fx.deep_obj(&obj);
    assert_eq!(fx.field(&copy, "token"), Value::Null);
    assert_eq!(fx.field(&copy, "cache"), Value::Null);
    assert_eq!(fx.field(&copy, "count"), Value::Int(0));
    let copied_user = fx.follow(&copy, "user");
    assert!(!copied_user.ptr_eq(&user));
    assert_eq!(fx.value_of(&copied_user), 2);
}

#[test]
fn ignored_key_types_keep_original_keys() {
    let fx = Fixture::new();
    let ty = fx.table().map_of(fx.node, fx.node).unwrap();
    let (key, value) = (fx.node(1), fx.node(2));
    let mut entries = FxHashMap::default();
    entries.insert(Key::from(Value::Ref(key.clone())), Value::Ref(value));
    let map = ObjRef::new(ty, ObjectData::Map(entries));
    fx.replicator.ignore_type(fx.node);

    let copy = fx.deep_obj(&map);
    let data = copy.read();
    let (copied_key, copied_value) = data.as_map().unwrap().iter().next().unwrap();
    assert!(copied_key.as_object().unwrap().ptr_eq(&key));
    assert_eq!(copied_value, &Value::Null);
}

#[test]
fn ignored_array_cells_become_null() {
    let fx = Fixture::new();
    let ty = fx.table().array_of(fx.node).unwrap();
    let items = vec![Value::Ref(fx.node(1)), Value::Ref(fx.node(2))];
    let array = ObjRef::new(ty, ObjectData::Array(ArrayData::vector(items)));
    fx.replicator.ignore_type(fx.node);

    let copy = fx.deep_obj(&array);
    assert_eq!(copy.read().as_array().unwrap().items(), &[Value::Null, Value::Null]);
}

#[test]
fn ignored_values_in_bags_become_null() {
    let fx = Fixture::new();
    let ty = fx.table().register(TypeDescriptor::bag("Props")).unwrap();
    let mut bag = PropertyBag::new();
    bag.insert("node", Value::Ref(fx.node(1)));
    bag.insert("id", Value::Guid(7));
    let obj = ObjRef::new(ty, ObjectData::Bag(bag));
    fx.replicator.ignore_types([fx.node, TypeId::GUID]);

    let copy = fx.deep_obj(&obj);
    let data = copy.read();
    let copied = data.as_bag().unwrap();
    assert_eq!(copied.get("node"), Some(&Value::Null));
    assert_eq!(copied.get("id"), Some(&Value::Null));
}

#[test]
fn registry_queries() {
    let fx = Fixture::new();
    assert!(!fx.replicator.is_type_ignored(fx.node));

    fx.replicator.ignore_types([fx.node, TypeId::GUID, fx.node]);
    let ignored = fx.replicator.get_ignored_types();
    assert_eq!(ignored.len(), 2);
    assert!(ignored.contains(&fx.node) && ignored.contains(&TypeId::GUID));
    assert!(fx.replicator.is_type_ignored(TypeId::GUID));

    fx.replicator.clear_ignored_types();
    assert!(fx.replicator.get_ignored_types().is_empty());
}

#[test]
fn shallow_clone_does_not_consult_the_registry() {
    let fx = Fixture::new();
    let (_, obj, node) = holder(&fx);
    fx.replicator.ignore_type(fx.node);

    let copy = fx.replicator.shallow_clone(&Value::Ref(obj));
    assert!(fx.follow(copy.as_object().unwrap(), "node").ptr_eq(&node));
}
