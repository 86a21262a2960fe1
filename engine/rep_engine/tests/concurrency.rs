//! One replicator shared by many threads.

#![allow(clippy::unwrap_used, reason = "tests use unwrap for brevity")]

mod common;

use common::Fixture;
use pretty_assertions::assert_eq;
use rayon::prelude::*;
use rep_types::{TypeDescriptor, TypeId};
use rep_value::{ObjRef, Value};

#[test]
fn parallel_copies_share_plans() {
    let fx = Fixture::new();
    let ring = fx.ring(64);

    let starts: Vec<i64> = (0..64usize)
        .into_par_iter()
        .map(|i| {
            let copy = fx.deep_obj(&ring[i]);
            let mut cursor = copy.clone();
            for _ in 0..64 {
                cursor = fx.follow(&cursor, "next");
            }
            assert!(cursor.ptr_eq(&copy));
            fx.value_of(&copy)
        })
        .collect();

    assert_eq!(starts, (0..64).collect::<Vec<i64>>());
    assert!(fx.replicator.cached_plan_count() >= 1);
}

#[test]
fn first_use_from_many_threads_compiles_consistent_plans() {
    let fx = Fixture::new();
    let types: Vec<TypeId> = (0..16)
        .map(|i| {
            fx.table()
                .register(
                    TypeDescriptor::class(format!("Item{i}"))
                        .field("id", TypeId::INT)
                        .field("link", fx.node),
                )
                .unwrap()
        })
        .collect();

    (0..256usize).into_par_iter().for_each(|i| {
        let ty = types[i % types.len()];
        let node = fx.node(i as i64);
        let obj = ObjRef::record(fx.table(), ty, vec![Value::Int(i as i64), Value::Ref(node.clone())]).unwrap();

        let copy = fx.deep_obj(&obj);
        assert_eq!(fx.field(&copy, "id"), Value::Int(i as i64));
        let link = fx.follow(&copy, "link");
        assert!(!link.ptr_eq(&node));
        assert_eq!(fx.value_of(&link), i as i64);
    });
}

#[test]
fn policy_changes_race_with_copies() {
    let fx = Fixture::new();
    let ring = fx.ring(8);

    (0..128usize).into_par_iter().for_each(|i| {
        match i % 8 {
            0 => fx.replicator.ignore_type(TypeId::GUID),
            1 => fx.replicator.clear_ignored_types(),
            2 => fx.replicator.clear_plan_cache(),
            _ => {
                let copy = fx.deep_obj(&ring[i % ring.len()]);
                assert!(!copy.ptr_eq(&ring[i % ring.len()]));
            }
        }
    });
}
