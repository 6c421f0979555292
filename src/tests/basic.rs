use crate::HamtMap;

#[test]
fn empty_map() {
    let map: HamtMap<String, i32> = HamtMap::new();
    assert_eq!(map.len(), 0);
    assert!(map.is_empty());
    assert_eq!(map.get(&"missing".to_owned()), None);
}

#[test]
fn assoc_one() {
    let map = HamtMap::new().assoc("hello", 42);
    assert_eq!(map.len(), 1);
    assert!(!map.is_empty());
    assert_eq!(map.get(&"hello"), Some(&42));
}

#[test]
fn assoc_leaves_original_untouched() {
    let one = HamtMap::new().assoc("a", 1);
    let two = one.assoc("b", 2);
    assert_eq!(one.len(), 1);
    assert_eq!(one.get(&"b"), None);
    assert_eq!(two.len(), 2);
    assert_eq!(two.get(&"a"), Some(&1));
    assert_eq!(two.get(&"b"), Some(&2));
}

#[test]
fn get_missing_key() {
    let map = HamtMap::new().assoc("a", 1);
    assert_eq!(map.get(&"b"), None);
}

#[test]
fn assoc_multiple() {
    let mut map = HamtMap::new();
    for i in 0..100 {
        map = map.assoc(i, i * 10);
    }
    assert_eq!(map.len(), 100);
    for i in 0..100 {
        assert_eq!(map.get(&i), Some(&(i * 10)));
    }
}

#[test]
fn overwrite_value() {
    let map = HamtMap::new().assoc("k", 1);
    let map = map.assoc("k", 2);
    assert_eq!(map.len(), 1);
    assert_eq!(map.get(&"k"), Some(&2));
}

#[test]
fn contains_key() {
    let map = HamtMap::new().assoc(42, "val");
    assert!(map.contains_key(&42));
    assert!(!map.contains_key(&7));
}

#[test]
fn dissoc_existing() {
    let map = HamtMap::new().assoc("a", 1).assoc("b", 2);
    let map = map.dissoc(&"a");
    assert_eq!(map.len(), 1);
    assert_eq!(map.get(&"a"), None);
    assert_eq!(map.get(&"b"), Some(&2));
}

#[test]
fn dissoc_missing() {
    let map = HamtMap::new().assoc("a", 1);
    let same = map.dissoc(&"z");
    assert_eq!(same.len(), 1);
    assert_eq!(same.get(&"a"), Some(&1));
}

#[test]
fn dissoc_all() {
    let map = HamtMap::new().assoc(1, 10).assoc(2, 20).assoc(3, 30);
    let map = map.dissoc(&1).dissoc(&2).dissoc(&3);
    assert!(map.is_empty());
    assert_eq!(map.get(&1), None);
}

/// Count moves by one exactly when the key's presence changes.
#[test]
fn count_tracks_presence() {
    let map = HamtMap::new().assoc("k", 1);
    assert_eq!(map.assoc("k", 9).len(), map.len());
    assert_eq!(map.assoc("other", 9).len(), map.len() + 1);
    assert_eq!(map.dissoc(&"k").len(), map.len() - 1);
    assert_eq!(map.dissoc(&"other").len(), map.len());
}

#[test]
fn assoc_strict_on_fresh_key() {
    let map = HamtMap::new().assoc("a", 1);
    let map = map.assoc_strict("b", 2).expect("key is absent");
    assert_eq!(map.len(), 2);
}

#[test]
fn assoc_strict_on_present_key() {
    let map = HamtMap::new().assoc("a", 1);
    assert_eq!(map.assoc_strict("a", 2), Err(crate::DuplicateKey));
    assert_eq!(map.get(&"a"), Some(&1));
}

#[test]
fn empty_preserves_nothing_but_hasher() {
    let map = HamtMap::new().assoc(1, 1).assoc(2, 2);
    let empty = map.empty();
    assert!(empty.is_empty());
    assert_eq!(map.len(), 2);
}

/// Insert a, b, c; read back; remove b; read back.
#[test]
fn round_trip() {
    let map = HamtMap::new().assoc("a", 1).assoc("b", 2).assoc("c", 3);
    assert_eq!(map.len(), 3);
    assert_eq!(map.get(&"b"), Some(&2));

    let map = map.dissoc(&"b");
    assert_eq!(map.len(), 2);
    assert_eq!(map.get(&"b"), None);
    assert_eq!(map.get(&"a"), Some(&1));
    assert_eq!(map.get(&"c"), Some(&3));
}
