// Copyright 2025 the Thicket Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

// After you edit the crate's doc comment, run this command, then check README.md for any missing links
// cargo rdme --workspace-project=thicket_tree --heading-base-level=0

//! Thicket Tree: a dynamic 2D AABB tree for broad-phase collision queries.
//!
//! Thicket Tree is the acceleration structure beneath a collision pipeline:
//! it answers "which objects might be near this region or along this ray"
//! cheaply while objects move every simulation step.
//!
//! - Create, move, enlarge, and destroy proxies (bounded objects with a
//!   64-bit payload and a category bitmask).
//! - Query by overlap box or by ray, with callback-driven early termination.
//! - Rebuild the hierarchy in one pass to repair incremental drift.
//!
//! The tree stores each proxy's box with a small margin, so small per-step
//! motions update in place without restructuring. It never computes exact
//! geometric intersection — narrow-phase testing belongs to the caller,
//! inside the query callback.
//!
//! ## API overview
//!
//! - [`Tree`]: the node pool and hierarchy; all operations hang off it.
//! - [`ProxyId`]: generational handle of a proxy. Stale ids are detected,
//!   not undefined behavior; fallible accessors return [`InvalidProxy`].
//! - [`RayCastInput`]: origin, translation, and fraction bound of a ray.
//! - [`TreeStats`]: traversal counters returned by every query.
//! - [`aabb`]: the stateless box arithmetic the tree is built on.
//!
//! Key operations:
//! - [`Tree::create_proxy`] → [`ProxyId`]
//! - [`Tree::move_proxy`] / [`Tree::enlarge_proxy`] / [`Tree::destroy_proxy`]
//! - [`Tree::query`] / [`Tree::query_all`] / [`Tree::ray_cast`]
//! - [`Tree::rebuild`] → processed leaf count.
//!
//! ## Concurrency
//!
//! A tree is single-threaded: mutations must be externally serialized
//! against each other and against queries on the same tree. Read-only
//! queries are safe with each other, and independent trees are fully
//! independent.
//!
//! # Example
//!
//! ```rust
//! use thicket_tree::{Tree, RayCastInput};
//! use kurbo::{Point, Rect, Vec2};
//!
//! let mut tree = Tree::new();
//!
//! // Track three objects with category bits and payloads.
//! let _left = tree.create_proxy(Rect::new(-5.0, -1.0, -3.0, 1.0), 0x1, 10);
//! let middle = tree.create_proxy(Rect::new(-1.0, -1.0, 1.0, 1.0), 0x2, 11);
//! let _right = tree.create_proxy(Rect::new(3.0, -1.0, 5.0, 1.0), 0x4, 12);
//!
//! // Overlap query: only the middle proxy intersects the region.
//! let mut hits = Vec::new();
//! tree.query_all(Rect::new(-2.0, -2.0, 2.0, 2.0), |id, payload| {
//!     hits.push((id, payload));
//!     true
//! });
//! assert_eq!(hits, vec![(middle, 11)]);
//!
//! // Ray cast from the left; the callback owns hit bookkeeping.
//! let input = RayCastInput {
//!     origin: Point::new(-8.0, 0.0),
//!     translation: Vec2::new(16.0, 0.0),
//!     max_fraction: 1.0,
//! };
//! let mut first = None;
//! tree.ray_cast(&input, u64::MAX, |_, id, _| {
//!     first.get_or_insert(id);
//!     0.0
//! });
//! assert!(first.is_some());
//!
//! // Small motion stays in place; a rebuild restores balance after churn.
//! tree.move_proxy(middle, Rect::new(-0.95, -1.0, 1.05, 1.0)).unwrap();
//! let processed = tree.rebuild(true);
//! assert_eq!(processed, tree.proxy_count());
//! ```
//!
//! This crate is `no_std` and uses `alloc`.

#![no_std]

extern crate alloc;

pub mod aabb;
mod query;
mod rebuild;
mod tree;
mod types;

pub use tree::{AABB_MARGIN, Tree};
pub use types::{InvalidProxy, ProxyId, RayCastInput, TreeStats};
