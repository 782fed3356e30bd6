#![cfg(test)]

// Property tests for Counter kept inside the crate so they can check
// group identity, which is not part of the public surface.

use crate::counter::Counter;
use proptest::prelude::*;

#[derive(Clone, Debug)]
enum Op {
    Owning,
    Empty,
    Copy(usize),
    Take(usize),
    Release(usize),
    Drop(usize),
    Swap(usize, usize),
    Assign(usize, usize),
    AssignMove(usize, usize),
}

fn arb_op() -> impl Strategy<Value = Op> {
    let idx = 0usize..64;
    prop_oneof![
        Just(Op::Owning),
        Just(Op::Empty),
        idx.clone().prop_map(Op::Copy),
        idx.clone().prop_map(Op::Take),
        idx.clone().prop_map(Op::Release),
        idx.clone().prop_map(Op::Drop),
        (idx.clone(), idx.clone()).prop_map(|(a, b)| Op::Swap(a, b)),
        (idx.clone(), idx.clone()).prop_map(|(a, b)| Op::Assign(a, b)),
        (idx.clone(), idx).prop_map(|(a, b)| Op::AssignMove(a, b)),
    ]
}

// Mutable and shared access to two distinct slots.
fn pair_mut<T>(v: &mut [T], i: usize, j: usize) -> (&mut T, &mut T) {
    assert_ne!(i, j);
    if i < j {
        let (l, r) = v.split_at_mut(j);
        (&mut l[i], &mut r[0])
    } else {
        let (l, r) = v.split_at_mut(i);
        (&mut r[0], &mut l[j])
    }
}

// Property: Counter agrees with a model that tracks group membership.
// Invariants checked after every operation:
// - count() equals the number of live slots in the same group (0 if none).
// - is_shared() holds iff count() >= 2 (representation follows the count).
// - Counters reported in one group by the model share one cell.
proptest! {
    #![proptest_config(ProptestConfig { cases: 128, .. ProptestConfig::default() })]
    #[test]
    fn prop_counter_matches_group_model(ops in proptest::collection::vec(arb_op(), 1..120)) {
        let mut slots: Vec<Counter> = Vec::new();
        let mut groups: Vec<Option<usize>> = Vec::new();
        let mut next_group = 0usize;

        for op in ops {
            let len = slots.len();
            match op {
                Op::Owning => {
                    slots.push(Counter::owning());
                    groups.push(Some(next_group));
                    next_group += 1;
                }
                Op::Empty => {
                    slots.push(Counter::empty());
                    groups.push(None);
                }
                Op::Copy(i) if len > 0 => {
                    let i = i % len;
                    let c = slots[i].try_copy().unwrap();
                    slots.push(c);
                    groups.push(groups[i]);
                }
                Op::Take(i) if len > 0 => {
                    let i = i % len;
                    let c = slots[i].take();
                    slots.push(c);
                    let g = groups[i].take();
                    groups.push(g);
                }
                Op::Release(i) if len > 0 => {
                    let i = i % len;
                    slots[i].release();
                    groups[i] = None;
                }
                Op::Drop(i) if len > 0 => {
                    let i = i % len;
                    drop(slots.swap_remove(i));
                    groups.swap_remove(i);
                }
                Op::Swap(i, j) if len > 1 && i % len != j % len => {
                    let (a, b) = pair_mut(&mut slots, i % len, j % len);
                    a.swap(b);
                    groups.swap(i % len, j % len);
                }
                Op::Assign(i, j) if len > 1 && i % len != j % len => {
                    let (i, j) = (i % len, j % len);
                    let (a, b) = pair_mut(&mut slots, i, j);
                    a.try_assign(b).unwrap();
                    groups[i] = groups[j];
                }
                Op::AssignMove(i, j) if len > 1 && i % len != j % len => {
                    let (i, j) = (i % len, j % len);
                    let (a, b) = pair_mut(&mut slots, i, j);
                    a.assign_move(b);
                    groups[i] = groups[j].take();
                }
                _ => {}
            }

            for (k, c) in slots.iter().enumerate() {
                let expected = match groups[k] {
                    Some(g) => groups.iter().filter(|x| **x == Some(g)).count(),
                    None => 0,
                };
                prop_assert_eq!(c.count(), expected);
                prop_assert_eq!(c.is_shared(), expected >= 2);
                prop_assert_eq!(c.is_sole_owner(), expected == 1);
            }
            for a in 0..slots.len() {
                for b in (a + 1)..slots.len() {
                    if groups[a].is_some() && groups[a] == groups[b] {
                        prop_assert!(slots[a].same_group(&slots[b]));
                    }
                }
            }
        }
    }
}
