// Copyright 2025 the Thicket Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Broad-phase basics.
//!
//! Create a few proxies, run an overlap query and a ray cast, and print what
//! the tree visits.
//!
//! Run:
//! - `cargo run -p thicket_demos --example broadphase_basics`

use kurbo::{Point, Rect, Vec2};
use thicket_tree::{RayCastInput, Tree};

fn main() {
    let mut tree = Tree::new();

    // Three objects in a row, each with its own category bit.
    let left = tree.create_proxy(Rect::new(-5.0, -1.0, -3.0, 1.0), 0x1, 10);
    let middle = tree.create_proxy(Rect::new(-1.0, -1.0, 1.0, 1.0), 0x2, 11);
    let right = tree.create_proxy(Rect::new(3.0, -1.0, 5.0, 1.0), 0x4, 12);
    println!("proxies: {left:?} {middle:?} {right:?}");

    // Overlap query around the origin
    let stats = tree.query_all(Rect::new(-2.0, -2.0, 2.0, 2.0), |id, payload| {
        println!("overlap hit: {id:?} payload={payload}");
        true
    });
    println!(
        "query visited {} nodes, {} leaves",
        stats.node_visits, stats.leaf_visits
    );

    // Masked query: only category 0x1 | 0x4 passes the filter
    tree.query(Rect::new(-10.0, -2.0, 10.0, 2.0), 0x5, |id, payload| {
        println!("masked hit: {id:?} payload={payload}");
        true
    });

    // Ray cast left to right, tracking the closest hit in the callback
    let input = RayCastInput {
        origin: Point::new(-8.0, 0.0),
        translation: Vec2::new(16.0, 0.0),
        max_fraction: 1.0,
    };
    let mut closest = None;
    let stats = tree.ray_cast(&input, u64::MAX, |sub, id, _| {
        closest = Some(id);
        println!("ray reached {id:?} (fraction bound {})", sub.max_fraction);
        // Returning the current bound keeps searching the whole ray.
        sub.max_fraction
    });
    println!(
        "ray visited {} nodes, {} leaves, last proxy {closest:?}",
        stats.node_visits, stats.leaf_visits
    );

    assert_eq!(tree.proxy_count(), 3, "all proxies should remain live");
}
