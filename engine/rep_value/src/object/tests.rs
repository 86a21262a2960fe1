#![allow(clippy::unwrap_used, reason = "tests use unwrap for brevity")]

use pretty_assertions::assert_eq;
use rep_types::{FieldDef, TypeDescriptor};

use super::*;

fn person(table: &TypeTable) -> TypeId {
    table
        .register(
            TypeDescriptor::class("Person")
                .with_field(FieldDef::new("id", TypeId::INT).readonly())
                .field("name", TypeId::TEXT)
                .field("friend", TypeId::ANY),
        )
        .unwrap()
}

#[test]
fn record_checks_arity() {
    let table = TypeTable::new();
    let ty = person(&table);

    let err = ObjRef::record(&table, ty, vec![Value::Int(1)]).unwrap_err();
    assert_eq!(
        err,
        ValueError::ArityMismatch {
            ty: "Person".to_string(),
            expected: 3,
            found: 1,
        }
    );
}

#[test]
fn record_rejects_non_class_types() {
    let table = TypeTable::new();
    let err = ObjRef::record(&table, TypeId::INT, vec![]).unwrap_err();
    assert_eq!(err, ValueError::NotARecord("int".to_string()));
}

#[test]
fn default_record_zeroes_fields() {
    let table = TypeTable::new();
    let ty = person(&table);
    let obj = ObjRef::default_record(&table, ty).unwrap();

    assert_eq!(obj.get_field(&table, "id").unwrap(), Value::Int(0));
    assert_eq!(obj.get_field(&table, "name").unwrap(), Value::Null);
}

#[test]
fn set_field_refuses_readonly() {
    let table = TypeTable::new();
    let ty = person(&table);
    let obj = ObjRef::default_record(&table, ty).unwrap();

    obj.set_field(&table, "name", Value::from("Ada")).unwrap();
    assert_eq!(obj.get_field(&table, "name").unwrap(), Value::from("Ada"));

    let err = obj.set_field(&table, "id", Value::Int(7)).unwrap_err();
    assert!(matches!(err, ValueError::ReadOnlyField { .. }));

    // The raw slot write bypasses the policy.
    if let ObjectData::Record(record) = &mut *obj.write() {
        record.write_slot(0, Value::Int(7)).unwrap();
    }
    assert_eq!(obj.get_field(&table, "id").unwrap(), Value::Int(7));
}

#[test]
fn unknown_field_reported() {
    let table = TypeTable::new();
    let ty = person(&table);
    let obj = ObjRef::default_record(&table, ty).unwrap();

    let err = obj.get_field(&table, "age").unwrap_err();
    assert_eq!(
        err,
        ValueError::UnknownField {
            ty: "Person".to_string(),
            field: "age".to_string(),
        }
    );
}

#[test]
fn identity_is_the_allocation() {
    let ty = TypeId::from_raw(TypeId::FIRST_DYNAMIC);
    let a = ObjRef::new(ty, ObjectData::Tuple(vec![]));
    let alias = a.clone();
    let b = ObjRef::new(ty, ObjectData::Tuple(vec![]));

    assert!(a.ptr_eq(&alias));
    assert_eq!(a.addr(), alias.addr());
    assert!(!a.ptr_eq(&b));
}

#[test]
fn replace_keeps_identity() {
    let ty = TypeId::from_raw(TypeId::FIRST_DYNAMIC);
    let obj = ObjRef::new(ty, ObjectData::Tuple(vec![Value::Int(1)]));
    let addr = obj.addr();

    let old = obj.replace(ObjectData::Tuple(vec![Value::Int(2)]));
    assert!(matches!(old, ObjectData::Tuple(ref v) if v == &[Value::Int(1)]));
    assert_eq!(obj.addr(), addr);
    assert!(matches!(&*obj.read(), ObjectData::Tuple(v) if v == &[Value::Int(2)]));
}

#[test]
fn shallow_copy_gives_new_backing_to_read_only_wrappers() {
    let ty = TypeId::from_raw(TypeId::FIRST_DYNAMIC);
    let mut set = FxHashSet::default();
    set.insert(Key::from("a"));
    let backing = ObjRef::new(ty, ObjectData::Set(set));
    let wrapper = ObjectData::ReadOnly(backing.clone());

    let ObjectData::ReadOnly(copy) = wrapper.shallow_copy() else {
        panic!("expected a read-only wrapper");
    };
    assert!(!copy.ptr_eq(&backing));
    assert_eq!(copy.read().as_set().unwrap().len(), 1);
}

#[test]
fn shallow_copy_shares_nested_objects() {
    let ty = TypeId::from_raw(TypeId::FIRST_DYNAMIC);
    let nested = ObjRef::new(ty, ObjectData::Tuple(vec![]));
    let data = ObjectData::Record(Record::new(vec![Value::Ref(nested.clone())]));

    let copy = data.shallow_copy();
    let slot = copy.as_record().unwrap().slot(0).unwrap();
    assert!(slot.as_object().unwrap().ptr_eq(&nested));
}

#[test]
fn callable_with_captures_keeps_name() {
    let f = Callable::new("add", vec![Value::Int(1)]);
    let g = f.with_captures(vec![Value::Int(2)]);

    assert_eq!(g.name(), "add");
    assert_eq!(g.captures(), &[Value::Int(2)]);
    assert_eq!(f.captures(), &[Value::Int(1)]);
}
