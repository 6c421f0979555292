use std::collections::HashMap;

use rand::seq::SliceRandom;
use rand::Rng;

use crate::HamtMap;

/// 10k random operations checked against a model map.
#[test]
fn random_churn() {
    let mut rng = rand::thread_rng();
    let mut model: HashMap<u16, u32> = HashMap::new();
    let mut map: HamtMap<u16, u32> = HamtMap::new();

    for _ in 0..10_000 {
        let key: u16 = rng.gen();
        if rng.gen_bool(0.3) {
            model.remove(&key);
            map = map.dissoc(&key);
        } else {
            let value: u32 = rng.gen();
            model.insert(key, value);
            map = map.assoc(key, value);
        }
    }

    assert_eq!(map.len(), model.len());
    for (k, v) in &model {
        assert_eq!(map.get(k), Some(v), "missing key {k}");
    }
}

/// Insert all, verify all, remove all in random order.
#[test]
fn thousand_entries() {
    let mut rng = rand::thread_rng();
    let mut map = HamtMap::new();
    for i in 0_u64..1000 {
        map = map.assoc(i, i * 3);
    }
    assert_eq!(map.len(), 1000);

    for i in 0_u64..1000 {
        assert_eq!(map.get(&i), Some(&(i * 3)), "missing key {i}");
    }

    let mut keys: Vec<u64> = (0..1000).collect();
    keys.shuffle(&mut rng);
    for key in keys {
        assert!(map.contains_key(&key), "failed to find key {key}");
        map = map.dissoc(&key);
    }
    assert!(map.is_empty());
}

/// A snapshot taken mid-churn stays intact to the end.
#[test]
fn snapshot_survives_churn() {
    let mut rng = rand::thread_rng();
    let mut model: HashMap<u16, u32> = HashMap::new();
    let mut map: HamtMap<u16, u32> = HamtMap::new();

    for _ in 0..3000 {
        let key: u16 = rng.gen();
        let value: u32 = rng.gen();
        model.insert(key, value);
        map = map.assoc(key, value);
    }
    let snapshot = map.clone();
    let frozen_model = model.clone();

    for _ in 0..3000 {
        let key: u16 = rng.gen();
        if rng.gen_bool(0.5) {
            map = map.dissoc(&key);
        } else {
            map = map.assoc(key, rng.gen());
        }
    }

    assert_eq!(snapshot.len(), frozen_model.len());
    for (k, v) in &frozen_model {
        assert_eq!(snapshot.get(k), Some(v));
    }
}

/// Transient bulk loads under churn agree with the model.
#[test]
fn transient_random_churn() {
    let mut rng = rand::thread_rng();
    let mut model: HashMap<u16, u32> = HashMap::new();
    let mut transient = HamtMap::new().as_transient();

    for _ in 0..10_000 {
        let key: u16 = rng.gen();
        if rng.gen_bool(0.3) {
            model.remove(&key);
            transient.dissoc(&key).expect("owned and live");
        } else {
            let value: u32 = rng.gen();
            model.insert(key, value);
            transient.assoc(key, value).expect("owned and live");
        }
    }

    let map = transient.persistent().expect("first publish");
    assert_eq!(map.len(), model.len());
    for (k, v) in &model {
        assert_eq!(map.get(k), Some(v));
    }
}
