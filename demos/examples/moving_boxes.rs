// Copyright 2025 the Thicket Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Simulated churn: a grid of boxes jitters every step.
//!
//! Shows how the stored-box margin absorbs small motions, how tree height
//! drifts under sustained movement, and what a rebuild restores.
//!
//! Run:
//! - `cargo run -p thicket_demos --example moving_boxes`

use kurbo::{Rect, Vec2};
use thicket_tree::{AABB_MARGIN, Tree};

const PER_SIDE: usize = 20;
const STEPS: usize = 60;

fn contains(a: &Rect, b: &Rect) -> bool {
    a.x0 <= b.x0 && a.y0 <= b.y0 && b.x1 <= a.x1 && b.y1 <= a.y1
}

fn main() {
    let mut tree = Tree::new();
    let mut ids = Vec::with_capacity(PER_SIDE * PER_SIDE);
    // Shadow of each proxy's stored (margin-fattened) box, maintained with
    // the same policy the tree applies, to report the in-place hit rate.
    let mut stored = Vec::with_capacity(PER_SIDE * PER_SIDE);
    for i in 0..PER_SIDE {
        for j in 0..PER_SIDE {
            let (x, y) = (i as f64, j as f64);
            let rect = Rect::new(x, y, x + 1.0, y + 1.0);
            ids.push(tree.create_proxy(rect, 1, ids.len() as u64));
            stored.push(rect.inflate(AABB_MARGIN, AABB_MARGIN));
        }
    }
    println!(
        "created {} proxies, height {}, ~{} KiB",
        tree.proxy_count(),
        tree.height(),
        tree.byte_count() / 1024
    );

    // A deterministic drift: boxes wander slightly, occasionally jumping.
    let mut seed = 0x2545_F491_4F6C_DD1D_u64;
    let mut rand = move || {
        seed ^= seed << 13;
        seed ^= seed >> 7;
        seed ^= seed << 17;
        (seed >> 11) as f64 / (1_u64 << 53) as f64
    };

    let mut in_place = 0_usize;
    let mut restructured = 0_usize;
    for step in 0..STEPS {
        for (slot, id) in ids.iter().enumerate() {
            let delta = if rand() < 0.02 {
                Vec2::new(rand() * 30.0 - 15.0, rand() * 30.0 - 15.0)
            } else {
                Vec2::new(rand() * 0.1 - 0.05, rand() * 0.1 - 0.05)
            };
            let next = tree.aabb(*id).unwrap() + delta;
            tree.move_proxy(*id, next).unwrap();
            if contains(&stored[slot], &next) {
                in_place += 1;
            } else {
                stored[slot] = next.inflate(AABB_MARGIN, AABB_MARGIN);
                restructured += 1;
            }
        }
        if step % 20 == 19 {
            println!("step {:>3}: height {}", step + 1, tree.height());
        }
    }
    println!(
        "moves held in place: {in_place}, restructured: {restructured} ({:.1}% in place)",
        100.0 * in_place as f64 / (in_place + restructured) as f64
    );

    let before = tree.height();
    let processed = tree.rebuild(true);
    println!(
        "rebuild over {processed} leaves: height {before} -> {}",
        tree.height()
    );
}
