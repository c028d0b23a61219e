//! Churn benchmarks comparing the three slot arrays against a plain `Vec`.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use stable_slots::{
    AncestrallyOrderedBinaryTree, IntrusiveHoleStackArray, NodeId, StableIndexSlotArray,
    TrinaryStableIndexSlotArray,
};

/// Indices `0..n` in a fixed pseudo-random order.
fn shuffled(n: usize) -> Vec<usize> {
    let mut order: Vec<usize> = (0..n).collect();
    order.shuffle(&mut StdRng::seed_from_u64(0x5eed));
    order
}

fn bench_fill(c: &mut Criterion) {
    let mut group = c.benchmark_group("fill");

    for size in [1_000, 10_000, 100_000].iter() {
        group.bench_with_input(BenchmarkId::new("Vec", size), size, |b, &n| {
            b.iter(|| {
                let mut v: Vec<Option<u64>> = Vec::with_capacity(16);
                for i in 0..n {
                    v.push(Some(i as u64));
                }
                black_box(v)
            });
        });

        group.bench_with_input(BenchmarkId::new("Stable", size), size, |b, &n| {
            b.iter(|| {
                let mut arr: StableIndexSlotArray<Option<u64>> = StableIndexSlotArray::new(16);
                for i in 0..n {
                    arr.add(Some(i as u64));
                }
                black_box(arr)
            });
        });

        group.bench_with_input(BenchmarkId::new("Trinary", size), size, |b, &n| {
            b.iter(|| {
                let mut arr: TrinaryStableIndexSlotArray<Option<u64>> =
                    TrinaryStableIndexSlotArray::new(16);
                for i in 0..n {
                    arr.add(Some(i as u64));
                }
                black_box(arr)
            });
        });

        group.bench_with_input(BenchmarkId::new("HoleStack", size), size, |b, &n| {
            b.iter(|| {
                let mut arr: IntrusiveHoleStackArray<u64> = IntrusiveHoleStackArray::new(16);
                for i in 0..n {
                    arr.add(i as u64);
                }
                black_box(arr)
            });
        });
    }

    group.finish();
}

/// Remove half of the slots in random order, then add them back.
fn bench_churn(c: &mut Criterion) {
    let mut group = c.benchmark_group("churn");

    for size in [1_000, 10_000].iter() {
        let order = shuffled(*size);
        let victims = &order[..size / 2];

        group.bench_with_input(BenchmarkId::new("Stable", size), size, |b, &n| {
            let mut arr: StableIndexSlotArray<Option<u64>> = StableIndexSlotArray::new(n);
            for i in 0..n {
                arr.add(Some(i as u64));
            }
            b.iter(|| {
                for &idx in victims {
                    arr.remove_at(idx);
                }
                for &idx in victims {
                    arr.add(Some(idx as u64));
                }
                black_box(arr.len())
            });
        });

        group.bench_with_input(BenchmarkId::new("Trinary", size), size, |b, &n| {
            let mut arr: TrinaryStableIndexSlotArray<Option<u64>> =
                TrinaryStableIndexSlotArray::new(n);
            for i in 0..n {
                arr.add(Some(i as u64));
            }
            b.iter(|| {
                for &idx in victims {
                    if arr.contains(idx) {
                        arr.remove_at(idx);
                    }
                }
                while arr.len() < n {
                    arr.add(Some(0));
                }
                black_box(arr.len())
            });
        });

        group.bench_with_input(BenchmarkId::new("HoleStack", size), size, |b, &n| {
            let mut arr: IntrusiveHoleStackArray<u64> = IntrusiveHoleStackArray::new(n);
            for i in 0..n {
                arr.add(i as u64);
            }
            b.iter(|| {
                for &idx in victims {
                    if arr.contains(idx) {
                        arr.remove(idx);
                    }
                }
                while arr.len() < n {
                    arr.add(0);
                }
                black_box(arr.len())
            });
        });
    }

    group.finish();
}

fn bench_iterate(c: &mut Criterion) {
    let mut group = c.benchmark_group("iterate_half_full");

    for size in [10_000, 100_000].iter() {
        let order = shuffled(*size);
        let victims = &order[..size / 2];

        let mut stable: StableIndexSlotArray<Option<u64>> = StableIndexSlotArray::new(*size);
        let mut holes: IntrusiveHoleStackArray<u64> = IntrusiveHoleStackArray::new(*size);
        for i in 0..*size {
            stable.add(Some(i as u64));
            holes.add(i as u64);
        }
        for &idx in victims {
            stable.remove_at(idx);
            holes.remove(idx);
        }

        group.bench_with_input(BenchmarkId::new("Stable", size), size, |b, _| {
            b.iter(|| black_box(stable.iter().filter_map(|(_, v)| *v).sum::<u64>()));
        });

        group.bench_with_input(BenchmarkId::new("HoleStack", size), size, |b, _| {
            b.iter(|| black_box(holes.iter().map(|(_, v)| *v).sum::<u64>()));
        });
    }

    group.finish();
}

fn bench_tree_compact(c: &mut Criterion) {
    let mut group = c.benchmark_group("binary_tree_compact");

    for depth in [10u32, 14].iter() {
        group.bench_with_input(BenchmarkId::new("remove_left_then_compact", depth), depth, |b, &depth| {
            b.iter(|| {
                let mut tree = AncestrallyOrderedBinaryTree::new(0u32);
                let mut frontier = vec![NodeId::ROOT];
                for level in 1..depth {
                    let mut next = Vec::with_capacity(frontier.len() * 2);
                    for &parent in &frontier {
                        next.push(tree.create_left_child(parent, level));
                        next.push(tree.create_right_child(parent, level));
                    }
                    frontier = next;
                }
                if let Some(left) = tree.node(NodeId::ROOT).and_then(|n| n.left()) {
                    tree.remove(left);
                }
                black_box(tree.compact())
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_fill, bench_churn, bench_iterate, bench_tree_compact);
criterion_main!(benches);
