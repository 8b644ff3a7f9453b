use super::*;

use crate::hash::bucket_index;
use proptest::prelude::*;
use proptest_derive::Arbitrary;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::{BTreeMap, HashSet};

fn validate_table<V>(table: &Table<V>, round: usize, keys: &mut HashSet<Vec<u8>>) {
    assert!(!table.is_empty(), "empty table reachable at round {round}");
    assert_eq!(table.buckets().len(), BUCKETS_PER_TABLE);

    for (i, bucket) in table.buckets().iter().enumerate() {
        match bucket {
            Bucket::Empty => {}
            Bucket::Leaf { key, .. } => {
                assert_eq!(
                    bucket_index(key, round),
                    i,
                    "leaf stored outside its bucket at round {round}"
                );
                assert!(keys.insert(key.to_vec()), "duplicate key {key:?}");
            }
            Bucket::Nested(child) => validate_table(child, round + 1, keys),
        }
    }
}

fn validate_trie<V>(t: &RehashTrie<V>) {
    let mut keys = HashSet::new();
    match &t.root {
        Some(root) => validate_table(root, 0, &mut keys),
        None => assert_eq!(t.count, 0, "absent root with live keys"),
    }
    assert_eq!(keys.len(), t.len(), "reachable leaf count must match len");

    let stats = t.stats();
    assert_eq!(stats.entries, t.len());
    let s = t.sparseness();
    assert!((0.0..1.0).contains(&s), "sparseness out of range: {s}");
}

fn key_strategy() -> impl Strategy<Value = Vec<u8>> {
    // A small alphabet keeps updates and repeated removals common.
    prop::collection::vec(0u8..6, 0..=5)
}

#[derive(Clone, Debug, Arbitrary)]
enum Op {
    #[proptest(weight = 5)]
    Set(#[proptest(strategy = "key_strategy()")] Vec<u8>, u64),
    #[proptest(weight = 3)]
    Clear(#[proptest(strategy = "key_strategy()")] Vec<u8>),
    #[proptest(weight = 2)]
    Get(#[proptest(strategy = "key_strategy()")] Vec<u8>),
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 256,
        max_shrink_iters: 50_000,
        .. ProptestConfig::default()
    })]

    #[test]
    fn prop_equivalence(ops in prop::collection::vec(any::<Op>(), 0..=1500)) {
        let mut t: RehashTrie<u64> = RehashTrie::new();
        let mut m: BTreeMap<Vec<u8>, u64> = BTreeMap::new();

        for op in ops {
            match op {
                Op::Set(key, value) => {
                    let outcome = t.set(&key, value).unwrap();
                    let expected = match m.insert(key, value) {
                        Some(old) => SetOutcome::Updated(old),
                        None => SetOutcome::Inserted,
                    };
                    prop_assert_eq!(outcome, expected);
                }
                Op::Clear(key) => {
                    prop_assert_eq!(t.clear(&key), m.remove(key.as_slice()));
                }
                Op::Get(key) => {
                    prop_assert_eq!(t.get(&key).copied(), m.get(key.as_slice()).copied());
                }
            }

            prop_assert_eq!(t.len(), m.len());
        }

        validate_trie(&t);
        let mut got: Vec<(Vec<u8>, u64)> = t.iter().map(|(k, v)| (k.to_vec(), *v)).collect();
        got.sort();
        let expected: Vec<(Vec<u8>, u64)> = m.iter().map(|(k, v)| (k.clone(), *v)).collect();
        prop_assert_eq!(got, expected);

        // Clearing every surviving key must release the whole structure.
        for key in m.keys() {
            prop_assert!(t.clear(key).is_some());
        }
        prop_assert!(t.root.is_none());
        prop_assert_eq!(t.depth(), 0);
    }

    #[test]
    fn prop_hash_deterministic(key in prop::collection::vec(any::<u8>(), 0..=32), round in 0usize..64) {
        prop_assert_eq!(hash::hash(&key, round), hash::hash(&key, round));
        prop_assert!(bucket_index(&key, round) < BUCKETS_PER_TABLE);
    }

    #[test]
    fn prop_round_trip(keys in prop::collection::hash_set(prop::collection::vec(any::<u8>(), 0..=16), 0..=300)) {
        let mut t: RehashTrie<usize> = RehashTrie::new();
        for (i, key) in keys.iter().enumerate() {
            prop_assert_eq!(t.set(key, i).unwrap(), SetOutcome::Inserted);
            prop_assert_eq!(t.get(key), Some(&i));
        }
        validate_trie(&t);
    }
}

fn for_each_permutation<T: Clone>(items: &[T], mut f: impl FnMut(Vec<T>)) {
    fn rec<T: Clone>(items: &[T], used: &mut [bool], out: &mut Vec<T>, f: &mut impl FnMut(Vec<T>)) {
        if out.len() == items.len() {
            f(out.clone());
            return;
        }
        for i in 0..items.len() {
            if used[i] {
                continue;
            }
            used[i] = true;
            out.push(items[i].clone());
            rec(items, used, out, f);
            out.pop();
            used[i] = false;
        }
    }

    let mut used = vec![false; items.len()];
    let mut out = Vec::with_capacity(items.len());
    rec(items, &mut used, &mut out, &mut f);
}

/// Three keys sharing a root bucket, plus three that spread out.
fn small_key_set() -> Vec<Vec<u8>> {
    let target = bucket_index(b"a", 0);
    let mut keys: Vec<Vec<u8>> = (0..)
        .map(|i| format!("c{i}").into_bytes())
        .filter(|k| bucket_index(k, 0) == target)
        .take(3)
        .collect();
    keys.extend([b"a".to_vec(), b"b".to_vec(), b"".to_vec()]);
    keys
}

#[test]
fn exhaustive_insert_order_small_set() {
    let keys = small_key_set();

    for_each_permutation(&keys, |perm| {
        let mut t: RehashTrie<u64> = RehashTrie::new();
        let mut m: BTreeMap<Vec<u8>, u64> = BTreeMap::new();

        for (i, k) in perm.into_iter().enumerate() {
            let v = i as u64;
            assert_eq!(t.set(&k, v), Ok(SetOutcome::Inserted));
            m.insert(k, v);
        }

        validate_trie(&t);
        for (k, v) in &m {
            assert_eq!(t.get(k), Some(v));
        }
    });
}

#[test]
fn exhaustive_remove_order_small_set() {
    let keys = small_key_set();

    // Insert in a fixed order, then remove in all permutations.
    let mut base_trie: RehashTrie<u64> = RehashTrie::new();
    for (i, k) in keys.iter().enumerate() {
        base_trie.set(k, i as u64).unwrap();
    }
    let base_depth = base_trie.depth();
    assert!(base_depth >= 2);

    for_each_permutation(&keys, |perm| {
        let mut t = base_trie.clone();

        for k in perm {
            assert!(t.clear(&k).is_some());
            assert_eq!(t.get(&k), None);
            assert!(t.depth() <= base_depth);
            validate_trie(&t);
        }
        assert_eq!(t.len(), 0);
        assert!(t.root.is_none());
    });
}

#[test]
fn random_churn_matches_model() {
    let mut rng = StdRng::seed_from_u64(0x5eed);
    let mut t: RehashTrie<u32> = RehashTrie::new();
    let mut m: BTreeMap<Vec<u8>, u32> = BTreeMap::new();

    for step in 0..20_000u32 {
        let len = rng.gen_range(1..=8);
        let key: Vec<u8> = (0..len).map(|_| rng.gen_range(b'a'..=b'h')).collect();
        if rng.gen_bool(0.6) {
            t.set(&key, step).unwrap();
            m.insert(key, step);
        } else {
            assert_eq!(t.clear(&key), m.remove(&key));
        }
    }

    validate_trie(&t);
    assert_eq!(t.len(), m.len());
    for (k, v) in &m {
        assert_eq!(t.get(k), Some(v));
    }
}
