// Copyright 2025 the Thicket Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Public types: proxy identifiers, traversal statistics, ray input, errors.

use core::fmt;

use kurbo::{Point, Vec2};

/// Identifier for a proxy (a tracked box) in a [`Tree`](crate::Tree).
///
/// This is a small, copyable handle that stays stable across moves, enlarges,
/// and rebuilds, but becomes invalid when the proxy is destroyed and its slot
/// is reused.
/// It consists of a slot index and a generation counter.
///
/// ## Semantics
///
/// - On create, a fresh slot is allocated with generation `1`.
/// - On destroy, the slot is freed; any existing `ProxyId` that pointed to
///   that slot is now stale.
/// - On reuse of a freed slot, its generation is incremented, producing a
///   new, distinct `ProxyId`.
///
/// ### Liveness
///
/// Use [`Tree::is_alive`](crate::Tree::is_alive) to check whether a `ProxyId`
/// still refers to a live proxy.
/// Stale `ProxyId`s never alias a different live proxy because the generation
/// must match.
///
/// ### Notes
///
/// - The generation increments on slot reuse and never decreases.
/// - `u32` is ample for practical lifetimes; behavior on generation overflow
///   is unspecified.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct ProxyId(pub(crate) u32, pub(crate) u32);

impl ProxyId {
    pub(crate) const fn new(idx: u32, generation: u32) -> Self {
        Self(idx, generation)
    }

    pub(crate) const fn idx(self) -> usize {
        self.0 as usize
    }

    pub(crate) const fn generation(self) -> u32 {
        self.1
    }
}

bitflags::bitflags! {
    /// Internal per-node state.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub(crate) struct NodeFlags: u16 {
        /// Node is in use (not on the free list).
        const ALLOCATED = 0b0000_0001;
        /// Node's stored box was widened in place by an enlarge and may be
        /// larger than the union of its children. Cleared on refit/rebuild.
        const ENLARGED  = 0b0000_0010;
    }
}

/// Traversal counters returned by queries and ray casts.
///
/// Useful for profiling and for tuning margin/rebuild policy: a healthy tree
/// visits `O(log n)` nodes per hit.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct TreeStats {
    /// Number of nodes popped from the traversal stack.
    pub node_visits: usize,
    /// Number of leaves whose box passed the geometric test.
    pub leaf_visits: usize,
}

/// Input for [`Tree::ray_cast`](crate::Tree::ray_cast).
///
/// The ray is parameterized as `origin + t * translation` for
/// `t` in `[0, max_fraction]`. A zero-length translation degenerates to a
/// point test against the origin.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct RayCastInput {
    /// Ray start point.
    pub origin: Point,
    /// Ray direction scaled by its length.
    pub translation: Vec2,
    /// Upper bound on the ray parameter, typically `1.0`.
    pub max_fraction: f64,
}

/// Error returned when a [`ProxyId`] is stale or out of range.
///
/// The tree is left untouched; the id simply no longer (or never did) refer
/// to a live proxy.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct InvalidProxy(pub ProxyId);

impl fmt::Display for InvalidProxy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "stale or out-of-range proxy id (slot {}, generation {})",
            self.0.0, self.0.1
        )
    }
}

impl core::error::Error for InvalidProxy {}
