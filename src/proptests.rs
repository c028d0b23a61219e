use super::*;

use proptest::prelude::*;
use proptest::sample::Index;
use proptest_derive::Arbitrary;
use std::collections::{BTreeMap, HashMap};

#[derive(Clone, Debug, Arbitrary)]
enum SlotOp {
    #[proptest(weight = 6)]
    Add(u32),
    #[proptest(weight = 4)]
    Remove(Index),
    #[proptest(weight = 1)]
    RemoveLast,
    #[proptest(weight = 1)]
    Trim(#[proptest(strategy = "0usize..40")] usize),
}

#[derive(Clone, Debug, Arbitrary)]
enum TreeOp {
    #[proptest(weight = 6)]
    Create(Index, bool),
    #[proptest(weight = 3)]
    Remove(Index),
    #[proptest(weight = 1)]
    Compact,
}

fn slot_ops() -> impl Strategy<Value = Vec<SlotOp>> {
    prop::collection::vec(any::<SlotOp>(), 0..=500)
}

fn tree_ops() -> impl Strategy<Value = Vec<TreeOp>> {
    prop::collection::vec(any::<TreeOp>(), 0..=300)
}

fn smallest_vacant(m: &BTreeMap<usize, u32>) -> usize {
    (0..).find(|i| !m.contains_key(i)).unwrap_or(0)
}

fn nth_live(m: &BTreeMap<usize, u32>, pick: &Index) -> Option<usize> {
    if m.is_empty() {
        return None;
    }
    m.keys().nth(pick.index(m.len())).copied()
}

/// Live contents, right bound and free-record accounting must agree with
/// the model.
macro_rules! check_slot_array {
    ($arr:expr, $m:expr) => {{
        let arr = &$arr;
        let m: &BTreeMap<usize, u32> = &$m;
        prop_assert_eq!(arr.len(), m.len());
        prop_assert_eq!(arr.last_index(), m.keys().next_back().copied());
        let live_end = arr.last_index().map_or(0, |l| l + 1);
        prop_assert_eq!(arr.free_slot_count(), live_end - m.len());
        let got: Vec<(usize, u32)> = arr.iter().map(|(i, v)| (i, v.unwrap())).collect();
        let expected: Vec<(usize, u32)> = m.iter().map(|(i, v)| (*i, *v)).collect();
        prop_assert_eq!(got, expected);
    }};
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 256,
        max_shrink_iters: 10_000,
        .. ProptestConfig::default()
    })]

    #[test]
    fn prop_stable_array_reuses_lowest_hole(ops in slot_ops()) {
        let mut arr: StableIndexSlotArray<Option<u32>> = StableIndexSlotArray::new(2);
        let mut m: BTreeMap<usize, u32> = BTreeMap::new();

        for op in ops {
            match op {
                SlotOp::Add(v) => {
                    let expected = smallest_vacant(&m);
                    let idx = arr.add(Some(v));
                    prop_assert_eq!(idx, expected);
                    m.insert(idx, v);
                }
                SlotOp::Remove(pick) => {
                    if let Some(idx) = nth_live(&m, &pick) {
                        arr.remove_at(idx);
                        m.remove(&idx);
                    }
                }
                SlotOp::RemoveLast => {
                    let expected = m.keys().next_back().copied();
                    prop_assert_eq!(arr.remove_last(), expected);
                    if let Some(idx) = expected {
                        m.remove(&idx);
                    }
                }
                SlotOp::Trim(max) => {
                    if arr.trim_excess(max) {
                        m.retain(|&i, _| i < max.max(1));
                    }
                }
            }
            check_slot_array!(arr, m);
        }
    }

    #[test]
    fn prop_trinary_array_matches_model(ops in slot_ops(), resort in any::<bool>()) {
        let cfg = TrinaryConfig {
            initial_capacity: 6,
            resort_threshold: if resort { Some(0.5) } else { None },
        };
        let mut arr = TrinaryStableIndexSlotArray::<Option<u32>>::with_config(&cfg, Intrinsic).unwrap();
        let mut m: BTreeMap<usize, u32> = BTreeMap::new();

        for op in ops {
            match op {
                SlotOp::Add(v) => {
                    let live_end = arr.last_index().map_or(0, |l| l + 1);
                    let idx = arr.add(Some(v));
                    prop_assert!(idx <= live_end);
                    prop_assert!(m.insert(idx, v).is_none(), "index {} handed out twice", idx);
                }
                SlotOp::Remove(pick) => {
                    if let Some(idx) = nth_live(&m, &pick) {
                        arr.remove_at(idx);
                        m.remove(&idx);
                    }
                }
                SlotOp::RemoveLast => {
                    let expected = m.keys().next_back().copied();
                    prop_assert_eq!(arr.remove_last(), expected);
                    if let Some(idx) = expected {
                        m.remove(&idx);
                    }
                }
                SlotOp::Trim(max) => {
                    if arr.trim_excess(max) {
                        m.retain(|&i, _| i < max.max(6));
                    }
                }
            }
            check_slot_array!(arr, m);
        }
    }

    #[test]
    fn prop_hole_stack_matches_model(ops in slot_ops()) {
        let mut arr: IntrusiveHoleStackArray<u32> = IntrusiveHoleStackArray::new(2);
        let mut m: BTreeMap<usize, u32> = BTreeMap::new();
        let mut high_water = 0usize;

        for op in ops {
            match op {
                SlotOp::Add(v) => {
                    let idx = arr.add(v);
                    prop_assert!(m.insert(idx, v).is_none(), "index {} handed out twice", idx);
                }
                SlotOp::Remove(pick) => {
                    if let Some(idx) = nth_live(&m, &pick) {
                        prop_assert_eq!(arr.remove(idx), m[&idx]);
                        m.remove(&idx);
                    }
                }
                SlotOp::RemoveLast | SlotOp::Trim(_) => {
                    if let Some((_, v)) = arr.remove_first_match(|_| true) {
                        let first = *m.keys().next().unwrap();
                        prop_assert_eq!(m.remove(&first), Some(v));
                    }
                }
            }

            high_water = high_water.max(m.len());
            let mut expected_capacity = 2;
            while expected_capacity < high_water {
                expected_capacity *= 2;
            }
            prop_assert_eq!(arr.capacity(), expected_capacity);
            prop_assert_eq!(arr.len(), m.len());
            prop_assert_eq!(arr.last_index(), m.keys().next_back().copied());
            prop_assert_eq!(arr.holes().count(), arr.hole_count());
            let got: Vec<(usize, u32)> = arr.iter().map(|(i, v)| (i, *v)).collect();
            let expected: Vec<(usize, u32)> = m.iter().map(|(i, v)| (*i, *v)).collect();
            prop_assert_eq!(got, expected);
        }
    }

    #[test]
    fn prop_binary_tree_stays_ancestral(ops in tree_ops(), auto_compact in 0usize..4) {
        let cfg = TreeConfig {
            initial_capacity: 4,
            compact_after_removals: auto_compact,
        };
        let mut tree = AncestrallyOrderedBinaryTree::with_config(0u32, &cfg).unwrap();
        // value -> parent value; values are unique and survive compaction.
        let mut model: HashMap<u32, Option<u32>> = HashMap::new();
        model.insert(0, None);
        let mut next_value = 1u32;

        for op in ops {
            let live: Vec<NodeId> = tree.iter().map(|(id, _)| id).collect();
            match op {
                TreeOp::Create(pick, left) => {
                    let parent = live[pick.index(live.len())];
                    let hand = if left { Hand::Left } else { Hand::Right };
                    if tree.node(parent).unwrap().child(hand).is_some() {
                        continue;
                    }
                    let id = tree.create_child(parent, hand, next_value);
                    prop_assert!(id > parent);
                    model.insert(next_value, Some(tree[parent]));
                    next_value += 1;
                }
                TreeOp::Remove(pick) => {
                    if live.len() < 2 {
                        continue;
                    }
                    let victim = live[1 + pick.index(live.len() - 1)];
                    let root_value = tree[victim];
                    let mut doomed = vec![root_value];
                    let mut i = 0;
                    while i < doomed.len() {
                        let v = doomed[i];
                        doomed.extend(model.iter().filter(|(_, p)| **p == Some(v)).map(|(c, _)| *c));
                        i += 1;
                    }
                    prop_assert_eq!(tree.remove(victim), doomed.len());
                    for v in doomed {
                        model.remove(&v);
                    }
                }
                TreeOp::Compact => {
                    let shifts = tree.shift_operations();
                    let had_holes = tree.hole_count() > 0;
                    tree.compact();
                    if !had_holes {
                        prop_assert_eq!(tree.shift_operations(), shifts);
                    }
                    prop_assert_eq!(tree.hole_count(), 0);
                }
            }

            prop_assert_eq!(tree.len(), model.len());
            for (id, node) in tree.iter() {
                let value = *node.value().unwrap();
                let parent_value = node.parent().map(|p| tree[p]);
                prop_assert_eq!(model.get(&value), Some(&parent_value));
                if let Some(parent) = node.parent() {
                    prop_assert!(parent < id);
                    let p = tree.node(parent).unwrap();
                    prop_assert!(p.left() == Some(id) || p.right() == Some(id));
                }
                for child in [node.left(), node.right()].into_iter().flatten() {
                    prop_assert_eq!(tree.node(child).and_then(|c| c.parent()), Some(id));
                }
            }
        }
    }

    #[test]
    fn prop_sibling_tree_counts(ops in tree_ops()) {
        let mut tree = SiblingChainTree::new(0u32);
        let mut next_value = 1u32;

        for op in ops {
            let live: Vec<NodeId> = tree.pre_order().map(|(id, _, _)| id).collect();
            prop_assert_eq!(live.len(), tree.len());
            match op {
                TreeOp::Create(pick, overlay) => {
                    let at = live[pick.index(live.len())];
                    if overlay && !at.is_root() {
                        tree.create_overlay_sibling(at, next_value);
                    } else {
                        tree.create_child(at, next_value);
                    }
                    next_value += 1;
                }
                TreeOp::Remove(pick) => {
                    if live.len() < 2 {
                        continue;
                    }
                    let victim = live[1 + pick.index(live.len() - 1)];
                    let before = tree.len();
                    let freed = tree.remove(victim);
                    prop_assert_eq!(tree.len(), before - freed);
                    prop_assert!(!tree.contains(victim));
                }
                TreeOp::Compact => {
                    // Always descending ends on a node without children.
                    if let Some(deepest) = tree.find_first_deepest(|_| true) {
                        prop_assert!(tree.node(deepest).unwrap().child().is_none());
                    }
                }
            }
        }

        let mut seen = std::collections::HashSet::new();
        for (id, _, _) in tree.pre_order() {
            prop_assert!(seen.insert(id), "{:?} visited twice", id);
        }
        prop_assert_eq!(seen.len(), tree.len());
    }
}

#[test]
fn ancestral_order_survives_single_removals() {
    // Full binary tree of depth 2: root, two children, four grandchildren.
    let build = || {
        let mut tree = AncestrallyOrderedBinaryTree::new(0u32);
        let l = tree.create_left_child(NodeId::ROOT, 1);
        let r = tree.create_right_child(NodeId::ROOT, 2);
        tree.create_left_child(l, 3);
        tree.create_right_child(l, 4);
        tree.create_left_child(r, 5);
        tree.create_right_child(r, 6);
        tree
    };

    for victim in 1u32..=6 {
        let mut tree = build();
        let id = tree.iter().find(|(_, n)| n.value() == Some(&victim)).unwrap().0;
        tree.remove(id);
        tree.compact();
        let values: Vec<u32> = tree.iter().map(|(_, n)| *n.value().unwrap()).collect();
        let mut sorted = values.clone();
        sorted.sort_unstable();
        // Values were created breadth-first, so index order keeps them sorted.
        assert_eq!(values, sorted);
        for (id, node) in tree.iter() {
            if let Some(p) = node.parent() {
                assert!(p < id);
            }
        }
    }
}
