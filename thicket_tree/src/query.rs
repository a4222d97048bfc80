// Copyright 2025 the Thicket Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Read-only traversals: box queries and ray casts.

use alloc::vec::Vec;
use kurbo::Rect;

use crate::aabb;
use crate::tree::{NULL_NODE, Tree};
use crate::types::{ProxyId, RayCastInput, TreeStats};

/// Initial traversal stack capacity; enough for a well-balanced tree of
/// millions of proxies without reallocation.
const STACK_CAPACITY: usize = 64;

impl Tree {
    /// Visit every proxy whose stored box overlaps `aabb` and whose category
    /// bits intersect `mask_bits`.
    ///
    /// The callback receives the proxy id and its user data; returning
    /// `false` stops the whole traversal immediately. Stored boxes carry the
    /// insertion margin, so expect conservative hits near box edges — exact
    /// geometry is the caller's narrow phase.
    pub fn query<F>(&self, aabb: Rect, mask_bits: u64, callback: F) -> TreeStats
    where
        F: FnMut(ProxyId, u64) -> bool,
    {
        self.query_masked(aabb, mask_bits, callback)
    }

    /// [`query`](Self::query) without a category filter.
    pub fn query_all<F>(&self, aabb: Rect, callback: F) -> TreeStats
    where
        F: FnMut(ProxyId, u64) -> bool,
    {
        self.query_masked(aabb, u64::MAX, callback)
    }

    fn query_masked<F>(&self, aabb: Rect, mask_bits: u64, mut callback: F) -> TreeStats
    where
        F: FnMut(ProxyId, u64) -> bool,
    {
        let mut stats = TreeStats::default();
        if self.root == NULL_NODE {
            return stats;
        }

        let mut stack: Vec<u32> = Vec::with_capacity(STACK_CAPACITY);
        stack.push(self.root);
        while let Some(index) = stack.pop() {
            stats.node_visits += 1;
            let node = &self.nodes[index as usize];
            if !aabb::overlaps(&node.fat_aabb, &aabb) {
                continue;
            }
            if node.is_leaf() {
                stats.leaf_visits += 1;
                if node.category_bits & mask_bits != 0
                    && !callback(ProxyId::new(index, node.generation), node.user_data)
                {
                    return stats;
                }
            } else {
                stack.push(node.child1);
                stack.push(node.child2);
            }
        }
        stats
    }

    /// Cast a ray through the tree, visiting proxies along it.
    ///
    /// Subtrees are pruned against the best fraction known so far: the
    /// callback returns a new fraction each time, and returning a value
    /// smaller than the current bound contracts the remaining search region.
    /// Returning a negative value terminates the traversal. The callback is
    /// handed the input with the currently active `max_fraction`, so a
    /// closest-hit caller can simply return its narrow-phase hit fraction.
    pub fn ray_cast<F>(&self, input: &RayCastInput, mask_bits: u64, mut callback: F) -> TreeStats
    where
        F: FnMut(&RayCastInput, ProxyId, u64) -> f64,
    {
        let mut stats = TreeStats::default();
        if self.root == NULL_NODE || input.max_fraction < 0.0 {
            return stats;
        }

        let mut max_fraction = input.max_fraction;
        let mut stack: Vec<u32> = Vec::with_capacity(STACK_CAPACITY);
        stack.push(self.root);
        while let Some(index) = stack.pop() {
            stats.node_visits += 1;
            let node = &self.nodes[index as usize];
            let sub_input = RayCastInput {
                origin: input.origin,
                translation: input.translation,
                max_fraction,
            };
            if aabb::ray_cast(&node.fat_aabb, &sub_input).is_none() {
                continue;
            }
            if node.is_leaf() {
                stats.leaf_visits += 1;
                if node.category_bits & mask_bits != 0 {
                    let id = ProxyId::new(index, node.generation);
                    let value = callback(&sub_input, id, node.user_data);
                    if value < 0.0 {
                        return stats;
                    }
                    max_fraction = max_fraction.min(value);
                }
            } else {
                stack.push(node.child1);
                stack.push(node.child2);
            }
        }
        stats
    }
}
