use super::*;

use proptest::prelude::*;
use proptest_derive::Arbitrary;
use std::collections::BTreeMap;

fn validate_map<K: Key, A: BlockAlloc>(m: &OrderedMap<K, A>) {
    assert!(m.count <= m.capacity, "count exceeds capacity");
    if m.capacity == 0 {
        assert!(m.data.is_empty(), "unallocated map must hold no block");
        assert_eq!(m.count, 0);
    } else {
        let needed = m.capacity * (K::WIDTH + m.value_size);
        assert!(
            m.data.len() >= needed,
            "block of {} bytes cannot hold capacity {}",
            m.data.len(),
            m.capacity
        );
    }

    for i in 1..m.count {
        assert!(
            m.key_at(i - 1) < m.key_at(i),
            "keys must be strictly ascending (idx={i})"
        );
    }
}

fn v(x: u8) -> [u8; 4] {
    u32::from(x).to_ne_bytes()
}

fn read(bytes: &[u8]) -> u8 {
    u32::from_ne_bytes(bytes.try_into().unwrap()) as u8
}

#[derive(Clone, Debug, Arbitrary)]
enum Op {
    #[proptest(weight = 30)]
    InsertNew(#[proptest(strategy = "0u16..200")] u16, u8),
    #[proptest(weight = 15)]
    SetOrInsert(#[proptest(strategy = "0u16..200")] u16, u8),
    #[proptest(weight = 5)]
    SetExisting(#[proptest(strategy = "0u16..200")] u16, u8),
    #[proptest(weight = 15)]
    Remove(#[proptest(strategy = "0u16..200")] u16),
    #[proptest(weight = 5)]
    RemoveValue(u8),
    #[proptest(weight = 5)]
    RemoveSlot(#[proptest(strategy = "0u16..200")] u16),
    #[proptest(weight = 15)]
    Get(#[proptest(strategy = "0u16..200")] u16),
    #[proptest(weight = 3)]
    Compact,
    #[proptest(weight = 2)]
    Reserve(#[proptest(strategy = "0usize..64")] usize),
    #[proptest(weight = 1)]
    RetainEven,
    #[proptest(weight = 1)]
    Clear,
}

fn policy_strategy() -> impl Strategy<Value = GrowthPolicy> {
    (1usize..=4, 2usize..=3).prop_map(|(min, factor)| GrowthPolicy::new(min, factor).unwrap())
}

fn apply(
    m: &mut OrderedMap<u16>,
    model: &mut BTreeMap<u16, u8>,
    op: Op,
) -> std::result::Result<(), TestCaseError> {
    match op {
        Op::InsertNew(key, value) => {
            let expected = if model.contains_key(&key) {
                Err(Error::KeyExists)
            } else {
                model.insert(key, value);
                Ok(())
            };
            prop_assert_eq!(m.insert_new(key, &v(value)), expected);
        }
        Op::SetOrInsert(key, value) => {
            model.insert(key, value);
            prop_assert_eq!(m.set_or_insert(key, &v(value)), Ok(()));
        }
        Op::SetExisting(key, value) => {
            let expected = match model.get_mut(&key) {
                Some(slot) => {
                    *slot = value;
                    Ok(())
                }
                None => Err(Error::NotFound),
            };
            prop_assert_eq!(m.set_existing(key, &v(value)), expected);
        }
        Op::Remove(key) => {
            let expected = model.remove(&key).map(|_| key).ok_or(Error::NotFound);
            prop_assert_eq!(m.remove(key), expected);
        }
        Op::RemoveValue(value) => {
            let expected = model
                .iter()
                .find(|&(_, &mv)| mv == value)
                .map(|(&k, _)| k);
            if let Some(k) = expected {
                model.remove(&k);
            }
            prop_assert_eq!(m.remove_value(&v(value)), expected);
        }
        Op::RemoveSlot(key) => {
            let slot = m.get_slot(key).map(|(slot, _)| slot);
            match slot {
                Some(slot) => {
                    prop_assert!(model.remove(&key).is_some());
                    prop_assert_eq!(m.remove_slot(slot), Ok(key));
                }
                None => prop_assert!(!model.contains_key(&key)),
            }
        }
        Op::Get(key) => {
            prop_assert_eq!(m.get(key).map(read), model.get(&key).copied());
            prop_assert_eq!(m.contains_key(key), model.contains_key(&key));
        }
        Op::Compact => {
            m.compact();
            prop_assert_eq!(m.capacity(), m.len());
        }
        Op::Reserve(additional) => {
            m.reserve(additional).unwrap();
            prop_assert!(m.capacity() >= m.len() + additional);
        }
        Op::RetainEven => {
            m.retain(|k, _| k % 2 == 0);
            model.retain(|k, _| k % 2 == 0);
        }
        Op::Clear => {
            m.clear();
            model.clear();
        }
    }
    Ok(())
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 256,
        max_shrink_iters: 50_000,
        .. ProptestConfig::default()
    })]

    #[test]
    fn prop_equivalence_u16(
        policy in policy_strategy(),
        ops in prop::collection::vec(any::<Op>(), 0..=1000),
    ) {
        let mut m: OrderedMap<u16> = OrderedMap::with_policy(4, policy);
        let mut model: BTreeMap<u16, u8> = BTreeMap::new();

        for op in ops {
            apply(&mut m, &mut model, op)?;
            prop_assert_eq!(m.len(), model.len());
            prop_assert!(m.capacity() >= m.len());
        }

        validate_map(&m);
        let got: Vec<(u16, u8)> = m.iter().map(|(k, v)| (k, read(v))).collect();
        let expected: Vec<(u16, u8)> = model.into_iter().collect();
        prop_assert_eq!(got, expected);
    }

    #[test]
    fn prop_equivalence_key_set(
        policy in policy_strategy(),
        ops in prop::collection::vec((any::<bool>(), -100i64..100), 0..=1000),
    ) {
        let mut m: OrderedMap<i64> = OrderedMap::with_policy(0, policy);
        let mut model: BTreeMap<i64, ()> = BTreeMap::new();

        for (insert, key) in ops {
            if insert {
                let was_new = model.insert(key, ()).is_none();
                prop_assert_eq!(m.insert_new(key, &[]).is_ok(), was_new);
            } else {
                prop_assert_eq!(m.remove(key).is_ok(), model.remove(&key).is_some());
            }
            prop_assert_eq!(m.len(), model.len());
        }

        validate_map(&m);
        let got: Vec<i64> = m.keys().collect();
        let expected: Vec<i64> = model.keys().copied().collect();
        prop_assert_eq!(got, expected);

        let unused = (0i64..).find(|k| !model.contains_key(k));
        prop_assert_eq!(m.find_unused_key(), unused);
    }

    #[test]
    fn prop_compact_preserves_pairs(
        keys in prop::collection::btree_set(any::<u32>(), 0..300),
        drop_every in 1usize..5,
    ) {
        let policy = GrowthPolicy::new(3, 2).unwrap();
        let mut m: OrderedMap<u32> = OrderedMap::with_policy(8, policy);
        for &k in keys.iter().rev() {
            let mut value = [0u8; 8];
            value[..4].copy_from_slice(&k.to_ne_bytes());
            value[4..].copy_from_slice(&(!k).to_ne_bytes());
            m.insert_new(k, &value).unwrap();
        }
        let kept: Vec<u32> = keys.iter().copied().step_by(drop_every).collect();
        m.retain(|k, _| kept.binary_search(&k).is_ok());

        m.compact();
        validate_map(&m);
        if kept.is_empty() {
            prop_assert_eq!(m.capacity(), 0);
            prop_assert_eq!(m.memory_usage(), 0);
        } else {
            prop_assert_eq!(m.capacity(), kept.len());
        }
        for (i, (k, value)) in m.iter().enumerate() {
            prop_assert_eq!(k, kept[i]);
            prop_assert_eq!(&value[..4], &k.to_ne_bytes()[..]);
            prop_assert_eq!(&value[4..], &(!k).to_ne_bytes()[..]);
        }
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

#[test]
fn exhaustive_insert_order_small_set() {
    let keys: Vec<u16> = vec![0, 3, 7, 8, 100, 65535];
    let policy = GrowthPolicy::new(1, 2).unwrap();

    for_each_permutation(&keys, |perm| {
        let mut m: OrderedMap<u16> = OrderedMap::with_policy(4, policy);
        let mut model: BTreeMap<u16, u8> = BTreeMap::new();

        for (i, k) in perm.into_iter().enumerate() {
            let value = i as u8;
            assert_eq!(m.insert_new(k, &v(value)), Ok(()));
            model.insert(k, value);
            validate_map(&m);
        }

        let got: Vec<(u16, u8)> = m.iter().map(|(k, v)| (k, read(v))).collect();
        let expected: Vec<(u16, u8)> = model.into_iter().collect();
        assert_eq!(got, expected);
    });
}

#[test]
fn exhaustive_remove_order_small_set() {
    let keys: Vec<u16> = vec![0, 3, 7, 8, 100, 65535];
    let policy = GrowthPolicy::new(1, 2).unwrap();

    // Insert in a fixed order, then remove in all permutations.
    let mut base: OrderedMap<u16> = OrderedMap::with_policy(4, policy);
    let mut base_model: BTreeMap<u16, u8> = BTreeMap::new();
    for (i, &k) in keys.iter().enumerate() {
        base.insert_new(k, &v(i as u8)).unwrap();
        base_model.insert(k, i as u8);
    }

    for_each_permutation(&keys, |perm| {
        let mut m = base.clone();
        let mut model = base_model.clone();

        for k in perm {
            assert_eq!(m.remove(k), Ok(k));
            model.remove(&k);
            assert_eq!(m.len(), model.len());
            validate_map(&m);
            let got: Vec<(u16, u8)> = m.iter().map(|(k, v)| (k, read(v))).collect();
            let expected: Vec<(u16, u8)> = model.iter().map(|(&k, &v)| (k, v)).collect();
            assert_eq!(got, expected);
        }
        assert!(m.is_empty());
        m.compact();
        assert_eq!(m.capacity(), 0);
    });
}
