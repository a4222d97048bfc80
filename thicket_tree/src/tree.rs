// Copyright 2025 the Thicket Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The tree itself: node pool, proxy lifecycle, balanced insertion/removal.

use alloc::vec::Vec;
use kurbo::Rect;

use crate::aabb;
use crate::types::{InvalidProxy, NodeFlags, ProxyId};

/// Sentinel index for "no node".
pub(crate) const NULL_NODE: u32 = u32::MAX;

/// Margin added around caller boxes when a leaf is (re)inserted.
///
/// Small per-step motions stay inside the stored box and skip restructuring;
/// queries may see correspondingly conservative results, which is the normal
/// broad-phase contract.
pub const AABB_MARGIN: f64 = 0.1;

#[derive(Clone, Debug)]
pub(crate) struct Node {
    /// Box stored in the hierarchy: the caller box plus margin, possibly
    /// grown further by enlarges. Internal nodes bound their children here.
    pub(crate) fat_aabb: Rect,
    /// The caller-supplied box. Meaningful for leaves only.
    pub(crate) aabb: Rect,
    /// Parent link; doubles as the free-list `next` while unallocated.
    pub(crate) parent: u32,
    pub(crate) child1: u32,
    pub(crate) child2: u32,
    /// Leaf height is 0; free nodes carry -1.
    pub(crate) height: i32,
    pub(crate) generation: u32,
    pub(crate) user_data: u64,
    pub(crate) category_bits: u64,
    pub(crate) flags: NodeFlags,
}

impl Node {
    #[inline]
    pub(crate) fn is_leaf(&self) -> bool {
        self.child1 == NULL_NODE
    }

    #[inline]
    pub(crate) fn is_allocated(&self) -> bool {
        self.flags.contains(NodeFlags::ALLOCATED)
    }
}

/// Dynamic bounding-box tree over 2D proxies.
///
/// Nodes live in a growable pool and reference each other by index, so
/// handles stay valid across pool growth and [rebuilds](Self::rebuild).
/// All operations are synchronous and single-threaded per tree; independent
/// trees are fully independent.
pub struct Tree {
    pub(crate) nodes: Vec<Node>,
    pub(crate) root: u32,
    free_list: u32,
    node_count: usize,
    proxy_count: usize,
}

impl Default for Tree {
    fn default() -> Self {
        Self::new()
    }
}

impl core::fmt::Debug for Tree {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Tree")
            .field("capacity", &self.nodes.len())
            .field("node_count", &self.node_count)
            .field("proxy_count", &self.proxy_count)
            .field("height", &self.height())
            .finish_non_exhaustive()
    }
}

impl Tree {
    /// Create a new empty tree.
    pub fn new() -> Self {
        Self {
            nodes: Vec::new(),
            root: NULL_NODE,
            free_list: NULL_NODE,
            node_count: 0,
            proxy_count: 0,
        }
    }

    /// Drop every proxy and reset the counters, keeping allocated capacity.
    ///
    /// All outstanding [`ProxyId`]s become stale; slot reuse after a clear
    /// still bumps generations, so old ids cannot alias new proxies.
    pub fn clear(&mut self) {
        self.root = NULL_NODE;
        self.free_list = NULL_NODE;
        self.node_count = 0;
        self.proxy_count = 0;
        for index in (0..self.nodes.len()).rev() {
            let next = self.free_list;
            let node = &mut self.nodes[index];
            node.parent = next;
            node.child1 = NULL_NODE;
            node.child2 = NULL_NODE;
            node.height = -1;
            node.flags = NodeFlags::empty();
            #[allow(
                clippy::cast_possible_truncation,
                reason = "node indices are 32-bit by design"
            )]
            {
                self.free_list = index as u32;
            }
        }
    }

    // --- proxy lifecycle ---

    /// Add a proxy for `aabb` and return its id.
    ///
    /// The stored box is enlarged by [`AABB_MARGIN`]; `category_bits` filters
    /// masked queries and `user_data` is handed back verbatim to callbacks.
    pub fn create_proxy(&mut self, aabb: Rect, category_bits: u64, user_data: u64) -> ProxyId {
        let index = self.allocate_node();
        let node = &mut self.nodes[index as usize];
        node.aabb = aabb;
        node.fat_aabb = aabb.inflate(AABB_MARGIN, AABB_MARGIN);
        node.category_bits = category_bits;
        node.user_data = user_data;
        node.height = 0;
        let generation = node.generation;

        self.insert_leaf(index);
        self.proxy_count += 1;
        ProxyId::new(index, generation)
    }

    /// Remove a proxy and recycle its node.
    pub fn destroy_proxy(&mut self, id: ProxyId) -> Result<(), InvalidProxy> {
        let index = self.leaf_index(id)?;
        self.remove_leaf(index);
        self.free_node(index);
        self.proxy_count -= 1;
        Ok(())
    }

    /// Move a proxy to a new box.
    ///
    /// If the stored box still contains `aabb` the update is in place and the
    /// tree topology is untouched — the common case for small per-step
    /// motion. Otherwise the leaf is removed and re-inserted with a fresh
    /// margin.
    pub fn move_proxy(&mut self, id: ProxyId, aabb: Rect) -> Result<(), InvalidProxy> {
        let index = self.leaf_index(id)?;
        let node = &mut self.nodes[index as usize];
        if aabb::contains(&node.fat_aabb, &aabb) {
            node.aabb = aabb;
            return Ok(());
        }

        self.remove_leaf(index);
        let node = &mut self.nodes[index as usize];
        node.aabb = aabb;
        node.fat_aabb = aabb.inflate(AABB_MARGIN, AABB_MARGIN);
        self.insert_leaf(index);
        Ok(())
    }

    /// Grow a proxy's box to the union of its current box and `aabb`.
    ///
    /// Ancestor boxes are widened in place without any restructuring, so this
    /// never changes topology. Useful for monotonic growth such as swept
    /// bounds of fast-moving objects.
    pub fn enlarge_proxy(&mut self, id: ProxyId, aabb: Rect) -> Result<(), InvalidProxy> {
        let index = self.leaf_index(id)?;
        let node = &mut self.nodes[index as usize];
        node.aabb = node.aabb.union(aabb);
        node.fat_aabb = node.fat_aabb.union(aabb);

        let mut current = node.parent;
        while current != NULL_NODE {
            let node = &mut self.nodes[current as usize];
            if aabb::contains(&node.fat_aabb, &aabb) {
                break;
            }
            node.fat_aabb = node.fat_aabb.union(aabb);
            node.flags.insert(NodeFlags::ENLARGED);
            current = node.parent;
        }
        Ok(())
    }

    // --- accessors ---

    /// The caller-visible box of a proxy: exactly the last value set by
    /// [`create_proxy`](Self::create_proxy), [`move_proxy`](Self::move_proxy),
    /// or [`enlarge_proxy`](Self::enlarge_proxy).
    pub fn aabb(&self, id: ProxyId) -> Result<Rect, InvalidProxy> {
        Ok(self.nodes[self.leaf_index(id)? as usize].aabb)
    }

    /// The user data attached to a proxy.
    pub fn user_data(&self, id: ProxyId) -> Result<u64, InvalidProxy> {
        Ok(self.nodes[self.leaf_index(id)? as usize].user_data)
    }

    /// The category bitmask attached to a proxy.
    pub fn category_bits(&self, id: ProxyId) -> Result<u64, InvalidProxy> {
        Ok(self.nodes[self.leaf_index(id)? as usize].category_bits)
    }

    /// Whether `id` refers to a live proxy.
    pub fn is_alive(&self, id: ProxyId) -> bool {
        self.leaf_index(id).is_ok()
    }

    /// Height of the tree; 0 when empty or holding a single proxy.
    pub fn height(&self) -> i32 {
        if self.root == NULL_NODE {
            0
        } else {
            self.nodes[self.root as usize].height
        }
    }

    /// Number of live proxies.
    pub fn proxy_count(&self) -> usize {
        self.proxy_count
    }

    /// Number of pool nodes in use (leaves plus internal nodes).
    pub fn node_count(&self) -> usize {
        self.node_count
    }

    /// Approximate memory footprint of the tree in bytes.
    pub fn byte_count(&self) -> usize {
        core::mem::size_of::<Self>() + self.nodes.capacity() * core::mem::size_of::<Node>()
    }

    /// Bounds of the whole hierarchy (the root's stored box), if any.
    pub fn root_bounds(&self) -> Option<Rect> {
        (self.root != NULL_NODE).then(|| self.nodes[self.root as usize].fat_aabb)
    }

    /// Iterate over all live proxies with their caller-visible boxes.
    pub fn proxies(&self) -> impl Iterator<Item = (ProxyId, Rect)> + '_ {
        self.nodes.iter().enumerate().filter_map(|(index, node)| {
            (node.is_allocated() && node.is_leaf()).then(|| {
                #[allow(
                    clippy::cast_possible_truncation,
                    reason = "node indices are 32-bit by design"
                )]
                let id = ProxyId::new(index as u32, node.generation);
                (id, node.aabb)
            })
        })
    }

    // --- pool ---

    pub(crate) fn allocate_node(&mut self) -> u32 {
        self.node_count += 1;
        if self.free_list != NULL_NODE {
            let index = self.free_list;
            let node = &mut self.nodes[index as usize];
            self.free_list = node.parent;
            node.parent = NULL_NODE;
            node.child1 = NULL_NODE;
            node.child2 = NULL_NODE;
            node.height = 0;
            node.user_data = 0;
            node.category_bits = 0;
            node.generation = node.generation.wrapping_add(1);
            node.flags = NodeFlags::ALLOCATED;
            return index;
        }

        #[allow(
            clippy::cast_possible_truncation,
            reason = "node indices are 32-bit by design"
        )]
        let index = self.nodes.len() as u32;
        self.nodes.push(Node {
            fat_aabb: Rect::ZERO,
            aabb: Rect::ZERO,
            parent: NULL_NODE,
            child1: NULL_NODE,
            child2: NULL_NODE,
            height: 0,
            generation: 1,
            user_data: 0,
            category_bits: 0,
            flags: NodeFlags::ALLOCATED,
        });
        index
    }

    pub(crate) fn free_node(&mut self, index: u32) {
        debug_assert!(self.node_count > 0);
        let next = self.free_list;
        let node = &mut self.nodes[index as usize];
        node.parent = next;
        node.child1 = NULL_NODE;
        node.child2 = NULL_NODE;
        node.height = -1;
        node.flags = NodeFlags::empty();
        self.free_list = index;
        self.node_count -= 1;
    }

    fn leaf_index(&self, id: ProxyId) -> Result<u32, InvalidProxy> {
        match self.nodes.get(id.idx()) {
            Some(node)
                if node.is_allocated()
                    && node.is_leaf()
                    && node.generation == id.generation() =>
            {
                Ok(id.0)
            }
            _ => Err(InvalidProxy(id)),
        }
    }

    // --- insertion / removal ---

    pub(crate) fn insert_leaf(&mut self, leaf: u32) {
        if self.root == NULL_NODE {
            self.root = leaf;
            self.nodes[leaf as usize].parent = NULL_NODE;
            return;
        }

        // Cost-guided descent to the best sibling: at each internal node,
        // compare making a new parent here against pushing the leaf into
        // either child, charging descendants the growth already paid above.
        let leaf_fat = self.nodes[leaf as usize].fat_aabb;
        let mut index = self.root;
        while !self.nodes[index as usize].is_leaf() {
            let (child1, child2, node_fat) = {
                let node = &self.nodes[index as usize];
                (node.child1, node.child2, node.fat_aabb)
            };

            let combined_cost = aabb::perimeter(&node_fat.union(leaf_fat));
            let cost = 2.0 * combined_cost;
            let inheritance_cost = 2.0 * (combined_cost - aabb::perimeter(&node_fat));

            let cost1 = self.descend_cost(child1, &leaf_fat, inheritance_cost);
            let cost2 = self.descend_cost(child2, &leaf_fat, inheritance_cost);

            if cost < cost1 && cost < cost2 {
                break;
            }
            index = if cost1 < cost2 { child1 } else { child2 };
        }

        let sibling = index;
        let old_parent = self.nodes[sibling as usize].parent;
        let new_parent = self.allocate_node();
        let (sibling_fat, sibling_height) = {
            let node = &self.nodes[sibling as usize];
            (node.fat_aabb, node.height)
        };
        {
            let node = &mut self.nodes[new_parent as usize];
            node.parent = old_parent;
            node.fat_aabb = sibling_fat.union(leaf_fat);
            node.height = sibling_height + 1;
            node.child1 = sibling;
            node.child2 = leaf;
        }
        self.nodes[sibling as usize].parent = new_parent;
        self.nodes[leaf as usize].parent = new_parent;

        if old_parent == NULL_NODE {
            self.root = new_parent;
        } else if self.nodes[old_parent as usize].child1 == sibling {
            self.nodes[old_parent as usize].child1 = new_parent;
        } else {
            self.nodes[old_parent as usize].child2 = new_parent;
        }

        // Refit and rebalance the ancestors.
        let mut index = new_parent;
        while index != NULL_NODE {
            self.refit(index);
            self.rotate(index);
            index = self.nodes[index as usize].parent;
        }
    }

    fn descend_cost(&self, child: u32, leaf_fat: &Rect, inheritance_cost: f64) -> f64 {
        let node = &self.nodes[child as usize];
        let expanded = aabb::perimeter(&node.fat_aabb.union(*leaf_fat));
        if node.is_leaf() {
            expanded + inheritance_cost
        } else {
            (expanded - aabb::perimeter(&node.fat_aabb)) + inheritance_cost
        }
    }

    pub(crate) fn remove_leaf(&mut self, leaf: u32) {
        if leaf == self.root {
            self.root = NULL_NODE;
            return;
        }

        let parent = self.nodes[leaf as usize].parent;
        let grandparent = self.nodes[parent as usize].parent;
        let sibling = if self.nodes[parent as usize].child1 == leaf {
            self.nodes[parent as usize].child2
        } else {
            self.nodes[parent as usize].child1
        };

        if grandparent == NULL_NODE {
            // The sibling becomes the new root.
            self.root = sibling;
            self.nodes[sibling as usize].parent = NULL_NODE;
            self.free_node(parent);
            return;
        }

        // The sibling rises into the grandparent; the parent is recycled.
        if self.nodes[grandparent as usize].child1 == parent {
            self.nodes[grandparent as usize].child1 = sibling;
        } else {
            self.nodes[grandparent as usize].child2 = sibling;
        }
        self.nodes[sibling as usize].parent = grandparent;
        self.free_node(parent);

        let mut index = grandparent;
        while index != NULL_NODE {
            self.refit(index);
            index = self.nodes[index as usize].parent;
        }
    }

    /// Recompute an internal node's box and height from its children.
    pub(crate) fn refit(&mut self, index: u32) {
        let (child1, child2) = {
            let node = &self.nodes[index as usize];
            (node.child1, node.child2)
        };
        debug_assert!(child1 != NULL_NODE && child2 != NULL_NODE);
        let fat = self.nodes[child1 as usize]
            .fat_aabb
            .union(self.nodes[child2 as usize].fat_aabb);
        let height = 1 + self.nodes[child1 as usize]
            .height
            .max(self.nodes[child2 as usize].height);
        let node = &mut self.nodes[index as usize];
        node.fat_aabb = fat;
        node.height = height;
        node.flags.remove(NodeFlags::ENLARGED);
    }

    // --- rotations ---

    /// Cost-guided local rotation at `ia`.
    ///
    /// Considers promoting one grandchild into the opposite child's slot (the
    /// four legal shape-preserving swaps) and applies the one that lowers the
    /// total perimeter of the affected internal nodes. Ties prefer the
    /// current arrangement.
    fn rotate(&mut self, ia: u32) {
        if self.nodes[ia as usize].height < 2 {
            return;
        }
        let (ib, ic) = {
            let node = &self.nodes[ia as usize];
            (node.child1, node.child2)
        };
        let (hb, ib1, ib2, b_fat) = {
            let node = &self.nodes[ib as usize];
            (node.height, node.child1, node.child2, node.fat_aabb)
        };
        let (hc, ic1, ic2, c_fat) = {
            let node = &self.nodes[ic as usize];
            (node.height, node.child1, node.child2, node.fat_aabb)
        };

        if hb == 0 {
            // child1 is a leaf; consider promoting one of child2's children.
            let f_fat = self.nodes[ic1 as usize].fat_aabb;
            let g_fat = self.nodes[ic2 as usize].fat_aabb;
            let cost_base = aabb::perimeter(&c_fat);
            let cost_f = aabb::perimeter(&b_fat.union(g_fat));
            let cost_g = aabb::perimeter(&b_fat.union(f_fat));
            if cost_base <= cost_f && cost_base <= cost_g {
                return;
            }
            let grandchild = if cost_f < cost_g { ic1 } else { ic2 };
            self.promote_grandchild(ia, ib, ic, grandchild);
        } else if hc == 0 {
            // child2 is a leaf; consider promoting one of child1's children.
            let d_fat = self.nodes[ib1 as usize].fat_aabb;
            let e_fat = self.nodes[ib2 as usize].fat_aabb;
            let cost_base = aabb::perimeter(&b_fat);
            let cost_d = aabb::perimeter(&c_fat.union(e_fat));
            let cost_e = aabb::perimeter(&c_fat.union(d_fat));
            if cost_base <= cost_d && cost_base <= cost_e {
                return;
            }
            let grandchild = if cost_d < cost_e { ib1 } else { ib2 };
            self.promote_grandchild(ia, ic, ib, grandchild);
        } else {
            // Both internal: four candidates, normalized to one scale by
            // carrying the unchanged child's perimeter.
            let d_fat = self.nodes[ib1 as usize].fat_aabb;
            let e_fat = self.nodes[ib2 as usize].fat_aabb;
            let f_fat = self.nodes[ic1 as usize].fat_aabb;
            let g_fat = self.nodes[ic2 as usize].fat_aabb;
            let area_b = aabb::perimeter(&b_fat);
            let area_c = aabb::perimeter(&c_fat);

            let candidates = [
                (area_b + aabb::perimeter(&b_fat.union(g_fat)), ib, ic, ic1),
                (area_b + aabb::perimeter(&b_fat.union(f_fat)), ib, ic, ic2),
                (area_c + aabb::perimeter(&c_fat.union(e_fat)), ic, ib, ib1),
                (area_c + aabb::perimeter(&c_fat.union(d_fat)), ic, ib, ib2),
            ];
            let mut best_cost = area_b + area_c;
            let mut best = None;
            for (cost, child, other, grandchild) in candidates {
                if cost < best_cost {
                    best_cost = cost;
                    best = Some((child, other, grandchild));
                }
            }
            if let Some((child, other, grandchild)) = best {
                self.promote_grandchild(ia, child, other, grandchild);
            }
        }
    }

    /// Swap `child` (a child of `ia`) with `grandchild` (a child of `other`,
    /// the opposite child of `ia`), then refit the two changed nodes.
    fn promote_grandchild(&mut self, ia: u32, child: u32, other: u32, grandchild: u32) {
        if self.nodes[ia as usize].child1 == child {
            self.nodes[ia as usize].child1 = grandchild;
        } else {
            self.nodes[ia as usize].child2 = grandchild;
        }
        if self.nodes[other as usize].child1 == grandchild {
            self.nodes[other as usize].child1 = child;
        } else {
            self.nodes[other as usize].child2 = child;
        }
        self.nodes[grandchild as usize].parent = ia;
        self.nodes[child as usize].parent = other;
        self.refit(other);
        self.refit(ia);
    }

    // --- debug validation ---

    /// Walk the whole structure asserting every invariant. Debug builds only.
    #[cfg(any(test, debug_assertions))]
    pub(crate) fn validate(&self) {
        use alloc::vec;

        if self.root == NULL_NODE {
            assert_eq!(self.proxy_count, 0, "empty tree must hold no proxies");
        } else {
            assert_eq!(
                self.nodes[self.root as usize].parent,
                NULL_NODE,
                "root must have no parent"
            );
            let mut reachable = 0_usize;
            let mut leaves = 0_usize;
            let mut stack = vec![self.root];
            while let Some(index) = stack.pop() {
                let node = &self.nodes[index as usize];
                assert!(node.is_allocated(), "reachable node must be allocated");
                reachable += 1;
                if node.is_leaf() {
                    assert_eq!(node.height, 0, "leaf height must be 0");
                    assert_eq!(node.child2, NULL_NODE, "leaf must have no children");
                    leaves += 1;
                    continue;
                }
                let child1 = &self.nodes[node.child1 as usize];
                let child2 = &self.nodes[node.child2 as usize];
                assert_eq!(child1.parent, index, "child1 must link back to parent");
                assert_eq!(child2.parent, index, "child2 must link back to parent");
                assert_eq!(
                    node.height,
                    1 + child1.height.max(child2.height),
                    "height must be one more than the taller child"
                );
                assert!(
                    aabb::contains(&node.fat_aabb, &child1.fat_aabb)
                        && aabb::contains(&node.fat_aabb, &child2.fat_aabb),
                    "node box must contain both children"
                );
                stack.push(node.child1);
                stack.push(node.child2);
            }
            assert_eq!(reachable, self.node_count, "every in-use node is reachable");
            assert_eq!(leaves, self.proxy_count, "leaf count must match proxies");
        }

        let mut free = 0_usize;
        let mut index = self.free_list;
        while index != NULL_NODE {
            assert!(
                !self.nodes[index as usize].is_allocated(),
                "free-list node must not be allocated"
            );
            free += 1;
            index = self.nodes[index as usize].parent;
        }
        assert_eq!(
            self.node_count + free,
            self.nodes.len(),
            "pool slots are either in use or free"
        );
    }
}
