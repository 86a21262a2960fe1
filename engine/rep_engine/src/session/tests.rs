#![allow(clippy::unwrap_used, reason = "tests use unwrap for brevity")]

use pretty_assertions::assert_eq;
use rep_types::TypeId;
use rep_value::{ObjectData, Value};

use super::*;

fn object(n: i64) -> ObjRef {
    ObjRef::new(
        TypeId::from_raw(TypeId::FIRST_DYNAMIC),
        ObjectData::Tuple(vec![Value::Int(n)]),
    )
}

#[test]
fn unknown_source_has_no_copy() {
    let session = CopySession::new(1000);
    assert!(session.get_known(&object(0)).is_none());
    assert_eq!(session.tracked(), 0);
}

#[test]
fn inline_slots_then_overflow() {
    let mut session = CopySession::new(1000);
    let pairs: Vec<(ObjRef, ObjRef)> = (0..8).map(|n| (object(n), object(n))).collect();

    for (source, dest) in &pairs {
        session.add_known(source, dest);
    }

    assert_eq!(session.tracked(), 8);
    assert_eq!(session.overflow.len(), 8 - INLINE_SLOTS);
    for (source, dest) in &pairs {
        assert!(session.get_known(source).unwrap().ptr_eq(dest));
    }
}

#[test]
fn lookup_is_by_identity_not_content() {
    let mut session = CopySession::new(1000);
    let source = object(1);
    let twin = object(1);
    let dest = object(1);

    session.add_known(&source, &dest);
    assert!(session.get_known(&twin).is_none());
}

#[test]
fn escalates_at_threshold_and_stays_iterative() {
    let mut session = CopySession::new(4);
    let keep: Vec<ObjRef> = (0..6).map(object).collect();

    for (i, obj) in keep.iter().enumerate() {
        session.add_known(obj, obj);
        assert_eq!(session.is_iterative(), i + 1 >= 4, "after {} identities", i + 1);
    }
    assert!(session.is_iterative());
}

#[test]
fn zero_threshold_starts_iterative() {
    let session = CopySession::new(0);
    assert!(session.is_iterative());
}

#[test]
fn queue_is_fifo() {
    let mut session = CopySession::new(0);
    let a = object(1);
    let b = object(2);

    session.enqueue(a.clone(), a.clone());
    session.enqueue(b.clone(), b.clone());
    assert_eq!(session.pending_len(), 2);

    assert!(session.next_pending().unwrap().0.ptr_eq(&a));
    assert!(session.next_pending().unwrap().0.ptr_eq(&b));
    assert!(session.next_pending().is_none());
}
