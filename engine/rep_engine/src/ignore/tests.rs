use pretty_assertions::assert_eq;

use super::*;

fn ty(n: u32) -> TypeId {
    TypeId::from_raw(TypeId::FIRST_DYNAMIC + n)
}

#[test]
fn starts_empty() {
    let registry = IgnoreRegistry::new();
    assert!(registry.is_empty());
    assert!(!registry.is_ignored(ty(0)));
}

#[test]
fn ignore_is_idempotent() {
    let registry = IgnoreRegistry::new();
    assert!(registry.ignore(ty(0)));
    assert!(!registry.ignore(ty(0)));
    assert_eq!(registry.len(), 1);
    assert!(registry.is_ignored(ty(0)));
    assert!(!registry.is_ignored(ty(1)));
}

#[test]
fn ignore_many_and_snapshot() {
    let registry = IgnoreRegistry::new();
    registry.ignore_many([ty(0), ty(1), ty(1), TypeId::TEXT]);

    let expected: FxHashSet<TypeId> = [ty(0), ty(1), TypeId::TEXT].into_iter().collect();
    assert_eq!(registry.snapshot(), expected);
}

#[test]
fn clear_removes_everything() {
    let registry = IgnoreRegistry::new();
    registry.ignore_many([ty(0), ty(1)]);
    registry.clear();

    assert!(registry.is_empty());
    assert!(!registry.is_ignored(ty(0)));
}

#[test]
fn concurrent_writers() {
    let registry = IgnoreRegistry::new();
    std::thread::scope(|scope| {
        for t in 0..4 {
            let registry = &registry;
            scope.spawn(move || {
                for n in 0..64 {
                    registry.ignore(ty(t * 64 + n));
                }
            });
        }
    });
    assert_eq!(registry.len(), 256);
}
