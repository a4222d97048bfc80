// Copyright 2025 the Thicket Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use criterion::{BatchSize, Criterion, Throughput, black_box, criterion_group, criterion_main};
use kurbo::{Point, Rect, Vec2};
use thicket_tree::{RayCastInput, Tree};

fn gen_grid_rects(n: usize, cell: f64) -> Vec<Rect> {
    let mut out = Vec::with_capacity(n * n);
    for y in 0..n {
        for x in 0..n {
            let x0 = x as f64 * cell;
            let y0 = y as f64 * cell;
            out.push(Rect::new(x0, y0, x0 + cell, y0 + cell));
        }
    }
    out
}

#[derive(Clone)]
struct Rng(u64);

impl Rng {
    fn new(seed: u64) -> Self {
        Self(seed)
    }
    fn next_u64(&mut self) -> u64 {
        let mut x = self.0;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.0 = x;
        x
    }
    fn next_f64(&mut self) -> f64 {
        let v = self.next_u64() >> 11;
        (v as f64) / ((1u64 << 53) as f64)
    }
}

fn gen_random_rects(count: usize, extent: f64, rect_w: f64, rect_h: f64) -> Vec<Rect> {
    let mut out = Vec::with_capacity(count);
    let mut rng = Rng::new(0xCAFE_F00D_DEAD_BEEF);
    for _ in 0..count {
        let x0 = rng.next_f64() * (extent - rect_w).max(1.0);
        let y0 = rng.next_f64() * (extent - rect_h).max(1.0);
        out.push(Rect::new(x0, y0, x0 + rect_w, y0 + rect_h));
    }
    out
}

fn build_tree(rects: &[Rect]) -> Tree {
    let mut tree = Tree::new();
    for (i, r) in rects.iter().enumerate() {
        let _ = tree.create_proxy(*r, 1, i as u64);
    }
    tree
}

fn bench_build(c: &mut Criterion) {
    let mut group = c.benchmark_group("build");
    for &n in &[32usize, 64] {
        let rects = gen_grid_rects(n, 10.0);
        group.throughput(Throughput::Elements((n * n) as u64));
        group.bench_function(format!("grid_n{}", n), |b| {
            b.iter_batched(
                || rects.clone(),
                |rects| black_box(build_tree(&rects)),
                BatchSize::SmallInput,
            )
        });
    }
    group.finish();
}

fn bench_churn(c: &mut Criterion) {
    let mut group = c.benchmark_group("churn");
    let rects = gen_random_rects(4096, 2000.0, 8.0, 8.0);
    group.throughput(Throughput::Elements(rects.len() as u64));

    // Small jitter: stays inside the stored margin, no restructuring.
    group.bench_function("move_within_margin", |b| {
        b.iter_batched(
            || {
                let tree = build_tree(&rects);
                let ids: Vec<_> = tree.proxies().map(|(id, _)| id).collect();
                (tree, ids)
            },
            |(mut tree, ids)| {
                for id in &ids {
                    let r = tree.aabb(*id).unwrap() + Vec2::new(0.02, 0.02);
                    tree.move_proxy(*id, r).unwrap();
                }
                black_box(tree.height());
            },
            BatchSize::SmallInput,
        )
    });

    // Large displacement: every move removes and re-inserts its leaf.
    group.bench_function("move_reinsert", |b| {
        b.iter_batched(
            || {
                let tree = build_tree(&rects);
                let ids: Vec<_> = tree.proxies().map(|(id, _)| id).collect();
                (tree, ids)
            },
            |(mut tree, ids)| {
                for id in &ids {
                    let r = tree.aabb(*id).unwrap() + Vec2::new(37.0, -21.0);
                    tree.move_proxy(*id, r).unwrap();
                }
                black_box(tree.height());
            },
            BatchSize::SmallInput,
        )
    });
    group.finish();
}

fn bench_query(c: &mut Criterion) {
    let mut group = c.benchmark_group("query");
    let tree = build_tree(&gen_grid_rects(64, 10.0));
    let query = Rect::new(100.0, 100.0, 500.0, 500.0);
    group.bench_function("rect_n4096", |b| {
        b.iter(|| {
            let mut hits = 0usize;
            let stats = tree.query_all(black_box(query), |_, _| {
                hits += 1;
                true
            });
            black_box((hits, stats));
        })
    });
    group.finish();
}

fn bench_ray_cast(c: &mut Criterion) {
    let mut group = c.benchmark_group("ray_cast");
    let tree = build_tree(&gen_grid_rects(64, 10.0));
    let input = RayCastInput {
        origin: Point::new(-10.0, 5.0),
        translation: Vec2::new(700.0, 611.0),
        max_fraction: 1.0,
    };
    group.bench_function("diagonal_n4096", |b| {
        b.iter(|| {
            let mut best = f64::INFINITY;
            let stats = tree.ray_cast(black_box(&input), u64::MAX, |sub, _, _| {
                best = best.min(sub.max_fraction);
                sub.max_fraction
            });
            black_box((best, stats));
        })
    });
    group.finish();
}

fn bench_rebuild(c: &mut Criterion) {
    let mut group = c.benchmark_group("rebuild");
    let rects = gen_random_rects(4096, 2000.0, 8.0, 8.0);
    group.throughput(Throughput::Elements(rects.len() as u64));
    for &sort_leaves in &[false, true] {
        group.bench_function(format!("sort_{}", sort_leaves), |b| {
            b.iter_batched(
                || build_tree(&rects),
                |mut tree| {
                    let processed = tree.rebuild(sort_leaves);
                    black_box((processed, tree.height()));
                },
                BatchSize::SmallInput,
            )
        });
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_build,
    bench_churn,
    bench_query,
    bench_ray_cast,
    bench_rebuild,
);
criterion_main!(benches);
