//! Shared fixtures for the engine integration tests.

#![allow(dead_code, reason = "each test binary uses a different subset")]
#![allow(clippy::unwrap_used, reason = "tests use unwrap for brevity")]

use rep_engine::{CopyConfig, Replicator};
use rep_types::{TypeDescriptor, TypeId, TypeKind, TypeTable};
use rep_value::{ObjRef, Value};

/// `Node { value: int, next: Node, prev: Node }`
pub struct Fixture {
    pub replicator: Replicator,
    pub node: TypeId,
}

impl Fixture {
    pub fn new() -> Self {
        Self::with_config(CopyConfig::default())
    }

    pub fn with_config(config: CopyConfig) -> Self {
        let table = TypeTable::shared();
        let node = register_node(&table);
        Fixture {
            replicator: Replicator::with_config(table, config),
            node,
        }
    }

    pub fn table(&self) -> &TypeTable {
        self.replicator.table()
    }

    pub fn node(&self, value: i64) -> ObjRef {
        ObjRef::record(
            self.table(),
            self.node,
            vec![Value::Int(value), Value::Null, Value::Null],
        )
        .unwrap()
    }

    pub fn link(&self, from: &ObjRef, field: &str, to: &ObjRef) {
        from.set_field(self.table(), field, Value::Ref(to.clone())).unwrap();
    }

    pub fn field(&self, obj: &ObjRef, name: &str) -> Value {
        obj.get_field(self.table(), name).unwrap()
    }

    pub fn follow(&self, obj: &ObjRef, name: &str) -> ObjRef {
        self.field(obj, name).as_object().unwrap().clone()
    }

    pub fn value_of(&self, obj: &ObjRef) -> i64 {
        self.field(obj, "value").as_int().unwrap()
    }

    /// Doubly linked ring of `len` nodes numbered from zero.
    pub fn ring(&self, len: usize) -> Vec<ObjRef> {
        let nodes: Vec<ObjRef> = (0..len).map(|i| self.node(i as i64)).collect();
        for (i, node) in nodes.iter().enumerate() {
            self.link(node, "next", &nodes[(i + 1) % len]);
            self.link(node, "prev", &nodes[(i + len - 1) % len]);
        }
        nodes
    }

    pub fn deep(&self, value: &Value) -> Value {
        self.replicator.deep_clone(value).unwrap()
    }

    pub fn deep_obj(&self, obj: &ObjRef) -> ObjRef {
        self.deep(&Value::Ref(obj.clone())).as_object().unwrap().clone()
    }
}

pub fn register_node(table: &TypeTable) -> TypeId {
    let node = table.declare("Node", TypeKind::Class).unwrap();
    table
        .define(
            node,
            TypeDescriptor::class("Node")
                .field("value", TypeId::INT)
                .field("next", node)
                .field("prev", node),
        )
        .unwrap();
    node
}
