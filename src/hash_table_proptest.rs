#![cfg(test)]

// Property tests for the raw table kept inside the crate so they can reach
// `assert_invariants` and `cap_index`.

use std::collections::HashMap;
use std::vec::Vec;

use proptest::prelude::*;

use crate::hash_table::Entry;
use crate::hash_table::HashTable;
use crate::hash_table::PRIME_CAPACITIES;

#[derive(Clone, Debug)]
enum Op {
    Insert(u32, i32),
    Remove(u32),
    Find(u32),
    Modify(u32, i32),
    Iterate,
    Clear,
}

// A narrow hash space makes long collision chains and wraparound common.
fn hash_of(key: u32, spread: u32) -> u64 {
    u64::from(key % spread)
}

fn arb_ops(max_key: u32) -> impl Strategy<Value = Vec<Op>> {
    let op = prop_oneof![
        6 => (0..max_key, any::<i32>()).prop_map(|(k, v)| Op::Insert(k, v)),
        3 => (0..max_key).prop_map(Op::Remove),
        2 => (0..max_key).prop_map(Op::Find),
        1 => (0..max_key, any::<i32>()).prop_map(|(k, d)| Op::Modify(k, d)),
        1 => Just(Op::Iterate),
        1 => Just(Op::Clear),
    ];
    proptest::collection::vec(op, 1..400)
}

// Property: state-machine equivalence against std::collections::HashMap.
// - Insert never overwrites and reports vacancy exactly when the model does.
// - Remove returns the stored value, or nothing when absent.
// - Iteration yields each live entry exactly once.
// - After every operation the bucket layout satisfies the Robin Hood
//   invariants and the load factor stays below 90% of the scheduled capacity.
proptest! {
    #![proptest_config(ProptestConfig { cases: 128, .. ProptestConfig::default() })]
    #[test]
    fn prop_state_machine(spread in 1u32..512, ops in arb_ops(600)) {
        let mut sut: HashTable<(u32, i32)> = HashTable::new();
        let mut model: HashMap<u32, i32> = HashMap::new();

        for op in ops {
            match op {
                Op::Insert(k, v) => {
                    let already = model.contains_key(&k);
                    match sut.entry(hash_of(k, spread), |(kk, _)| *kk == k) {
                        Entry::Occupied(entry) => {
                            prop_assert!(already, "occupied only when the key exists");
                            prop_assert_eq!(entry.get().1, model[&k]);
                        }
                        Entry::Vacant(entry) => {
                            prop_assert!(!already, "vacant only when the key is absent");
                            let stored = entry.insert((k, v));
                            prop_assert_eq!(*stored, (k, v));
                            model.insert(k, v);
                        }
                    }
                }
                Op::Remove(k) => {
                    let removed = sut.remove(hash_of(k, spread), |(kk, _)| *kk == k);
                    prop_assert_eq!(removed.map(|(_, v)| v), model.remove(&k));
                }
                Op::Find(k) => {
                    let found = sut.find(hash_of(k, spread), |(kk, _)| *kk == k);
                    prop_assert_eq!(found.map(|(_, v)| *v), model.get(&k).copied());
                }
                Op::Modify(k, d) => {
                    if let Some((_, v)) = sut.find_mut(hash_of(k, spread), |(kk, _)| *kk == k) {
                        *v = v.wrapping_add(d);
                    }
                    if let Some(v) = model.get_mut(&k) {
                        *v = v.wrapping_add(d);
                    }
                }
                Op::Iterate => {
                    let mut seen: Vec<(u32, i32)> = sut.iter().copied().collect();
                    seen.sort_unstable();
                    let mut expected: Vec<(u32, i32)> = model.iter().map(|(k, v)| (*k, *v)).collect();
                    expected.sort_unstable();
                    prop_assert_eq!(seen, expected);
                }
                Op::Clear => {
                    sut.clear();
                    model.clear();
                    prop_assert_eq!(sut.capacity(), PRIME_CAPACITIES[0]);
                }
            }

            sut.assert_invariants();
            prop_assert_eq!(sut.len(), model.len());
            prop_assert_eq!(sut.capacity(), PRIME_CAPACITIES[sut.cap_index()]);
            prop_assert!(10 * sut.len() < 9 * sut.capacity());
        }
    }
}

// Property: filling and then emptying a table in any order walks the
// schedule back down to the smallest capacity.
proptest! {
    #![proptest_config(ProptestConfig { cases: 32, .. ProptestConfig::default() })]
    #[test]
    fn prop_fill_then_drain_shrinks(keys in proptest::sample::subsequence((0u32..2000).collect::<Vec<_>>(), 100..1500), seed in any::<u64>()) {
        let mut sut: HashTable<u32> = HashTable::new();
        for &k in &keys {
            sut.entry(u64::from(k).wrapping_mul(0x9e37_79b9_7f4a_7c15), |v| *v == k).or_insert(k);
        }
        prop_assert_eq!(sut.len(), keys.len());
        sut.assert_invariants();

        let mut order = keys.clone();
        let len = order.len();
        for i in 0..len {
            let j = (seed.wrapping_add(i as u64) as usize) % len;
            order.swap(i, j);
        }
        for k in order {
            let removed = sut.remove(u64::from(k).wrapping_mul(0x9e37_79b9_7f4a_7c15), |v| *v == k);
            prop_assert_eq!(removed, Some(k));
            sut.assert_invariants();
        }
        prop_assert!(sut.is_empty());
        prop_assert_eq!(sut.capacity(), PRIME_CAPACITIES[0]);
    }
}
