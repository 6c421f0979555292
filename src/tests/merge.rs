use std::cell::Cell;

use super::{ForcedMap, Keyed};
use crate::HamtMap;

/// The conflict function for merges that must not see any conflict.
fn reject_conflicts(
    _anc: Option<&i32>,
    _a: Option<&i32>,
    _b: Option<&i32>,
) -> Option<i32> {
    panic!("no conflict expected");
}

#[test]
fn merge_identities() {
    let a: HamtMap<&str, i32> = HamtMap::new().assoc("x", 1).assoc("y", 2);
    let b = a.assoc("z", 3);

    let same = HamtMap::merge(&a, &a, &a, reject_conflicts);
    assert!(same.ptr_eq(&a));

    let right = HamtMap::merge(&a, &a, &b, reject_conflicts);
    assert!(right.ptr_eq(&b));

    let left = HamtMap::merge(&a, &b, &a, reject_conflicts);
    assert!(left.ptr_eq(&b));
}

/// Disjoint single-key edits merge without consulting the resolver.
#[test]
fn disjoint_edits() {
    let ancestor = HamtMap::new().assoc("x", 1).assoc("y", 2);
    let a = ancestor.assoc("x", 10);
    let b = ancestor.assoc("y", 20);

    let merged = HamtMap::merge(&ancestor, &a, &b, reject_conflicts);
    assert_eq!(merged.len(), 2);
    assert_eq!(merged.get(&"x"), Some(&10));
    assert_eq!(merged.get(&"y"), Some(&20));
}

/// A genuine conflict reaches the resolver exactly once, with the
/// ancestor value and both sides.
#[test]
fn conflicting_edit_calls_resolver_once() {
    let ancestor = HamtMap::new().assoc("x", 1).assoc("y", 2);
    let a = ancestor.assoc("x", 10);
    let b = ancestor.assoc("x", 99);

    let calls = Cell::new(0);
    let merged = HamtMap::merge(&ancestor, &a, &b, |anc, va, vb| {
        calls.set(calls.get() + 1);
        assert_eq!(anc, Some(&1));
        assert_eq!(va, Some(&10));
        assert_eq!(vb, Some(&99));
        Some(77)
    });
    assert_eq!(calls.get(), 1);
    assert_eq!(merged.get(&"x"), Some(&77));
    assert_eq!(merged.get(&"y"), Some(&2));
}

/// The resolver may delete the conflicted key.
#[test]
fn resolver_deletes() {
    let ancestor = HamtMap::new().assoc("x", 1).assoc("y", 2);
    let a = ancestor.assoc("x", 10);
    let b = ancestor.assoc("x", 99);

    let merged = HamtMap::merge(&ancestor, &a, &b, |_, _, _| None);
    assert_eq!(merged.len(), 1);
    assert_eq!(merged.get(&"x"), None);
    assert_eq!(merged.get(&"y"), Some(&2));
}

/// Deleting on one side wins over an untouched other side.
#[test]
fn deletion_beside_no_change() {
    let ancestor = HamtMap::new().assoc("x", 1).assoc("y", 2);
    let a = ancestor.dissoc(&"x");

    let merged = HamtMap::merge(&ancestor, &a, &ancestor, reject_conflicts);
    assert_eq!(merged.len(), 1);
    assert_eq!(merged.get(&"x"), None);
}

/// Delete against change is a conflict with an absent side.
#[test]
fn deletion_against_change() {
    let ancestor = HamtMap::new().assoc("x", 1).assoc("y", 2);
    let a = ancestor.dissoc(&"x");
    let b = ancestor.assoc("x", 50);

    let calls = Cell::new(0);
    let merged = HamtMap::merge(&ancestor, &a, &b, |anc, va, vb| {
        calls.set(calls.get() + 1);
        assert_eq!(anc, Some(&1));
        assert_eq!(va, None);
        assert_eq!(vb, Some(&50));
        vb.copied()
    });
    assert_eq!(calls.get(), 1);
    assert_eq!(merged.get(&"x"), Some(&50));
}

/// Both sides adding the same key with equal values agrees silently;
/// different values conflict with an absent ancestor.
#[test]
fn additions_on_both_sides() {
    let ancestor: HamtMap<&str, i32> = HamtMap::new().assoc("base", 0);
    let a = ancestor.assoc("same", 5).assoc("clash", 1);
    let b = ancestor.assoc("same", 5).assoc("clash", 2);

    let calls = Cell::new(0);
    let merged = HamtMap::merge(&ancestor, &a, &b, |anc, va, vb| {
        calls.set(calls.get() + 1);
        assert_eq!(anc, None);
        assert_eq!(va, Some(&1));
        assert_eq!(vb, Some(&2));
        Some(3)
    });
    assert_eq!(calls.get(), 1);
    assert_eq!(merged.get(&"same"), Some(&5));
    assert_eq!(merged.get(&"clash"), Some(&3));
    assert_eq!(merged.len(), 3);
}

/// Changing to equal values on both sides takes the common value.
#[test]
fn convergent_edits() {
    let ancestor = HamtMap::new().assoc("x", 1);
    let a = ancestor.assoc("x", 9);
    let b = ancestor.assoc("x", 9);

    let merged = HamtMap::merge(&ancestor, &a, &b, reject_conflicts);
    assert_eq!(merged.get(&"x"), Some(&9));
}

/// Independent additions on a large shared base merge completely.
#[test]
fn large_disjoint_merge() {
    let mut ancestor: HamtMap<u32, u32> = HamtMap::new();
    for i in 0..2000 {
        ancestor = ancestor.assoc(i, i);
    }
    let mut a = ancestor.clone();
    for i in 2000..2100 {
        a = a.assoc(i, i);
    }
    let mut b = ancestor.clone();
    for i in 3000..3100 {
        b = b.assoc(i, i);
    }

    let merged = HamtMap::merge(&ancestor, &a, &b, |_, _, _| panic!("no conflict expected"));
    assert_eq!(merged.len(), 2200);
    for i in 0..2000 {
        assert_eq!(merged.get(&i), Some(&i));
    }
    for i in 2000..2100 {
        assert_eq!(merged.get(&i), Some(&i));
    }
    for i in 3000..3100 {
        assert_eq!(merged.get(&i), Some(&i));
    }
}

/// All entries deleted on both sides leaves the empty map.
#[test]
fn merge_to_empty() {
    let ancestor = HamtMap::new().assoc(1u32, 1u32).assoc(2, 2);
    let a = ancestor.dissoc(&1);
    let b = ancestor.dissoc(&2);

    let merged = HamtMap::merge(&ancestor, &a, &b, |_, _, _| panic!("no conflict expected"));
    assert!(merged.is_empty());
}

/// A merge whose subtree keeps one entry installs it inline.
#[test]
fn merge_collapses_single_survivor() {
    let ancestor = HamtMap::new().assoc(1u32, 1u32).assoc(2, 2).assoc(3, 3);
    let a = ancestor.dissoc(&1);
    let b = ancestor.dissoc(&2);

    let merged = HamtMap::merge(&ancestor, &a, &b, |_, _, _| panic!("no conflict expected"));
    assert_eq!(merged.len(), 1);
    assert_eq!(merged.get(&3), Some(&3));
    assert_eq!(super::chain_depth(merged.root().expect("non-empty")), 0);
}

/// Collision-node entries reconcile pairwise.
#[test]
fn merge_inside_collision_node() {
    let k1 = Keyed::new(1, 0x5050);
    let k2 = Keyed::new(2, 0x5050);

    let ancestor: ForcedMap<i32> = HamtMap::default().assoc(k1.clone(), 1).assoc(k2.clone(), 2);
    let a = ancestor.assoc(k1.clone(), 10);
    let b = ancestor.assoc(k2.clone(), 20);

    let merged = HamtMap::merge(&ancestor, &a, &b, |_, _, _| panic!("no conflict expected"));
    assert_eq!(merged.len(), 2);
    assert_eq!(merged.get(&k1), Some(&10));
    assert_eq!(merged.get(&k2), Some(&20));
}

/// Conflicts inside a collision node reach the resolver.
#[test]
fn conflict_inside_collision_node() {
    let k1 = Keyed::new(1, 0x6060);
    let k2 = Keyed::new(2, 0x6060);

    let ancestor: ForcedMap<i32> = HamtMap::default().assoc(k1.clone(), 1).assoc(k2.clone(), 2);
    let a = ancestor.assoc(k1.clone(), 10);
    let b = ancestor.assoc(k1.clone(), 30);

    let calls = Cell::new(0);
    let merged = HamtMap::merge(&ancestor, &a, &b, |anc, va, vb| {
        calls.set(calls.get() + 1);
        assert_eq!(anc, Some(&1));
        assert_eq!(va, Some(&10));
        assert_eq!(vb, Some(&30));
        Some(40)
    });
    assert_eq!(calls.get(), 1);
    assert_eq!(merged.get(&k1), Some(&40));
    assert_eq!(merged.get(&k2), Some(&2));
}

/// Merging maps with no common structure behaves like a union with
/// per-key reconciliation.
#[test]
fn merge_unrelated_maps() {
    let ancestor: HamtMap<u32, u32> = HamtMap::new();
    let mut a = HamtMap::new();
    let mut b = HamtMap::new();
    for i in 0..50 {
        a = a.assoc(i, i);
    }
    for i in 50..100 {
        b = b.assoc(i, i);
    }

    let merged = HamtMap::merge(&ancestor, &a, &b, |_, _, _| panic!("no conflict expected"));
    assert_eq!(merged.len(), 100);
    for i in 0..100 {
        assert_eq!(merged.get(&i), Some(&i));
    }
}
