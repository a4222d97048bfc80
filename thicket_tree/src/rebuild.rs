// Copyright 2025 the Thicket Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Full top-down reconstruction from the current set of leaves.

use alloc::vec::Vec;
use core::cmp::Ordering;

use crate::tree::{NULL_NODE, Tree};
use crate::types::NodeFlags;

impl Tree {
    /// Discard the internal structure and rebuild it from the live leaves.
    ///
    /// Leaf nodes are reused in place, so every [`ProxyId`](crate::ProxyId)
    /// stays valid and its payload and boxes are untouched; internal nodes
    /// are recycled through the pool. The result is a median-split tree with
    /// height close to `ceil(log2(proxy_count))`, repairing the drift that
    /// accumulates under long incremental churn.
    ///
    /// With `sort_leaves`, each partition level fully sorts its range along
    /// the split axis, so leaves end up ordered by spatial locality; without
    /// it a cheaper median selection is used. Returns the number of leaves
    /// processed.
    pub fn rebuild(&mut self, sort_leaves: bool) -> usize {
        let mut leaves: Vec<u32> = Vec::with_capacity(self.proxy_count());
        #[allow(
            clippy::cast_possible_truncation,
            reason = "node indices are 32-bit by design"
        )]
        for index in 0..self.nodes.len() {
            if !self.nodes[index].is_allocated() {
                continue;
            }
            if self.nodes[index].is_leaf() {
                let node = &mut self.nodes[index];
                node.parent = NULL_NODE;
                node.flags.remove(NodeFlags::ENLARGED);
                leaves.push(index as u32);
            } else {
                self.free_node(index as u32);
            }
        }

        let count = leaves.len();
        self.root = match count {
            0 => NULL_NODE,
            _ => self.build_subtree(&mut leaves, sort_leaves),
        };
        #[cfg(debug_assertions)]
        self.validate();
        count
    }

    /// Build a balanced subtree over `leaves`, returning its root index.
    ///
    /// Splits at the median of leaf centers along the axis of greatest
    /// centroid extent; a degenerate spread still splits by count, keeping
    /// the recursion depth logarithmic.
    fn build_subtree(&mut self, leaves: &mut [u32], sort_leaves: bool) -> u32 {
        if leaves.len() == 1 {
            let leaf = leaves[0];
            self.nodes[leaf as usize].parent = NULL_NODE;
            return leaf;
        }

        let mid = leaves.len() / 2;
        {
            let nodes = &self.nodes;
            let center = |leaf: u32| nodes[leaf as usize].fat_aabb.center();
            let (min, max) = leaves.iter().fold(
                (center(leaves[0]), center(leaves[0])),
                |(min, max), &leaf| {
                    let c = center(leaf);
                    (
                        kurbo::Point::new(min.x.min(c.x), min.y.min(c.y)),
                        kurbo::Point::new(max.x.max(c.x), max.y.max(c.y)),
                    )
                },
            );
            let split_on_x = max.x - min.x >= max.y - min.y;
            let key = move |leaf: u32| {
                let c = center(leaf);
                if split_on_x { c.x } else { c.y }
            };
            let compare = |a: &u32, b: &u32| {
                key(*a).partial_cmp(&key(*b)).unwrap_or(Ordering::Equal)
            };
            if sort_leaves {
                leaves.sort_unstable_by(compare);
            } else {
                let _ = leaves.select_nth_unstable_by(mid, compare);
            }
        }

        let (left, right) = leaves.split_at_mut(mid);
        let child1 = self.build_subtree(left, sort_leaves);
        let child2 = self.build_subtree(right, sort_leaves);

        let parent = self.allocate_node();
        let fat = self.nodes[child1 as usize]
            .fat_aabb
            .union(self.nodes[child2 as usize].fat_aabb);
        let height = 1 + self.nodes[child1 as usize]
            .height
            .max(self.nodes[child2 as usize].height);
        {
            let node = &mut self.nodes[parent as usize];
            node.child1 = child1;
            node.child2 = child2;
            node.fat_aabb = fat;
            node.height = height;
            node.parent = NULL_NODE;
        }
        self.nodes[child1 as usize].parent = parent;
        self.nodes[child2 as usize].parent = parent;
        parent
    }
}
