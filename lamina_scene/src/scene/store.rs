// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Struct-of-arrays node storage with allocation, topology, and property management.

use alloc::vec::Vec;

use kurbo::{Affine, Rect};
use lamina_core::dirty::DirtyFlags;
use lamina_core::record::InvalidationRecord;
use lamina_core::source::InvalidationSource;
use understory_dirty::{CycleHandling, DirtyTracker};

use super::id::{INVALID, NodeId};
use crate::dirty;

/// Sent through `Parent` to a node that was attached, detached, or moved.
const ATTACHED: DirtyFlags = DirtyFlags::HIERARCHY
    .union(DirtyFlags::TRANSFORM)
    .union(DirtyFlags::APPEARANCE)
    .union(DirtyFlags::VISIBILITY);

/// Sent through `Child` to a node whose child list changed.
const CHILDREN_CHANGED: DirtyFlags = DirtyFlags::TOPOLOGY.union(DirtyFlags::LAYOUT);

/// Struct-of-arrays storage for a tree of nodes, one
/// [`InvalidationRecord`] per node.
///
/// Nodes are addressed by [`NodeId`] handles. Internally, each node occupies a
/// slot in parallel arrays. Destroyed nodes are recycled via a free list, and
/// generation counters prevent stale handle access.
#[derive(Debug)]
pub struct SceneTree {
    // -- Topology --
    pub(crate) parent: Vec<u32>,
    pub(crate) first_child: Vec<u32>,
    pub(crate) next_sibling: Vec<u32>,
    pub(crate) prev_sibling: Vec<u32>,

    // -- Local properties (set by callers) --
    pub(crate) local_transform: Vec<Affine>,
    pub(crate) local_opacity: Vec<f32>,
    pub(crate) extent: Vec<Rect>,
    pub(crate) hidden: Vec<bool>,

    // -- Cached derived state (written by update) --
    pub(crate) world_transform: Vec<Affine>,
    pub(crate) effective_opacity: Vec<f32>,
    pub(crate) effective_hidden: Vec<bool>,
    pub(crate) bounds: Vec<Rect>,

    // -- Invalidation --
    pub(crate) records: Vec<InvalidationRecord>,
    pub(crate) schedule: DirtyTracker<u32>,
    pub(crate) initial_dirty: DirtyFlags,

    // -- Allocation --
    pub(crate) generation: Vec<u32>,
    pub(crate) alive: Vec<bool>,
    pub(crate) free_list: Vec<u32>,
    pub(crate) len: u32,

    // -- Traversal cache --
    pub(crate) traversal_order: Vec<u32>,
    pub(crate) pass_index: u64,

    // -- Lifecycle tracking --
    pub(crate) pending_added: Vec<u32>,
    pub(crate) pending_removed: Vec<u32>,
}

impl Default for SceneTree {
    fn default() -> Self {
        Self::new()
    }
}

impl SceneTree {
    /// Creates an empty tree whose new nodes start dirty for
    /// [`DirtyFlags::INITIAL`].
    #[must_use]
    pub fn new() -> Self {
        Self::with_initial_dirty(DirtyFlags::INITIAL)
    }

    /// Creates an empty tree whose new nodes start dirty for `initial` on every
    /// source.
    ///
    /// Marker bits in `initial` are ignored.
    #[must_use]
    pub fn with_initial_dirty(initial: DirtyFlags) -> Self {
        Self {
            parent: Vec::new(),
            first_child: Vec::new(),
            next_sibling: Vec::new(),
            prev_sibling: Vec::new(),
            local_transform: Vec::new(),
            local_opacity: Vec::new(),
            extent: Vec::new(),
            hidden: Vec::new(),
            world_transform: Vec::new(),
            effective_opacity: Vec::new(),
            effective_hidden: Vec::new(),
            bounds: Vec::new(),
            records: Vec::new(),
            schedule: DirtyTracker::with_cycle_handling(CycleHandling::Error),
            initial_dirty: initial.trim(),
            generation: Vec::new(),
            alive: Vec::new(),
            free_list: Vec::new(),
            len: 0,
            traversal_order: Vec::new(),
            pass_index: 0,
            pending_added: Vec::new(),
            pending_removed: Vec::new(),
        }
    }

    // -- Allocation API --

    /// Creates a new root node and returns its handle.
    ///
    /// The node starts with an identity transform, full opacity, an empty
    /// extent, and a record seeded with the tree's initial dirty categories.
    pub fn create_node(&mut self) -> NodeId {
        let record = InvalidationRecord::new(self.initial_dirty);
        let idx = if let Some(idx) = self.free_list.pop() {
            // Reuse a freed slot.
            let i = idx as usize;
            self.generation[i] += 1;
            self.parent[i] = INVALID;
            self.first_child[i] = INVALID;
            self.next_sibling[i] = INVALID;
            self.prev_sibling[i] = INVALID;
            self.local_transform[i] = Affine::IDENTITY;
            self.local_opacity[i] = 1.0;
            self.extent[i] = Rect::ZERO;
            self.hidden[i] = false;
            self.world_transform[i] = Affine::IDENTITY;
            self.effective_opacity[i] = 1.0;
            self.effective_hidden[i] = false;
            self.bounds[i] = Rect::ZERO;
            self.records[i] = record;
            self.alive[i] = true;
            idx
        } else {
            // Allocate a new slot.
            let idx = self.len;
            self.len += 1;
            self.parent.push(INVALID);
            self.first_child.push(INVALID);
            self.next_sibling.push(INVALID);
            self.prev_sibling.push(INVALID);
            self.local_transform.push(Affine::IDENTITY);
            self.local_opacity.push(1.0);
            self.extent.push(Rect::ZERO);
            self.hidden.push(false);
            self.world_transform.push(Affine::IDENTITY);
            self.effective_opacity.push(1.0);
            self.effective_hidden.push(false);
            self.bounds.push(Rect::ZERO);
            self.records.push(record);
            self.generation.push(0);
            self.alive.push(true);
            idx
        };

        self.pending_added.push(idx);
        // Schedules the first visit and the traversal rebuild.
        self.apply(idx, InvalidationSource::Local, DirtyFlags::HIERARCHY);

        NodeId {
            idx,
            generation: self.generation[idx as usize],
        }
    }

    /// Destroys a node, freeing its slot for reuse.
    ///
    /// # Panics
    ///
    /// Panics if the node has children (remove them first) or if the handle
    /// is stale.
    pub fn destroy_node(&mut self, id: NodeId) {
        self.validate_id(id);
        let idx = id.idx;
        assert!(
            self.first_child[idx as usize] == INVALID,
            "cannot destroy node with children"
        );

        if self.parent[idx as usize] != INVALID {
            let p = self.parent[idx as usize];
            self.unlink_from_parent(idx);
            self.apply(p, InvalidationSource::Child, CHILDREN_CHANGED);
        }

        self.schedule.remove_key(idx);
        self.records[idx as usize] = InvalidationRecord::clean();

        // Bump generation so old handles immediately fail validation.
        self.generation[idx as usize] += 1;

        self.alive[idx as usize] = false;
        self.free_list.push(idx);
        self.pending_removed.push(idx);
        self.schedule.mark(idx, dirty::TOPOLOGY);
    }

    /// Returns whether the given handle refers to a live node.
    #[must_use]
    pub fn is_alive(&self, id: NodeId) -> bool {
        (id.idx < self.len)
            && self.generation[id.idx as usize] == id.generation
            && self.alive[id.idx as usize]
    }

    // -- Topology API --

    /// Adds `child` as the last child of `parent`.
    ///
    /// `parent` learns through `Child` that its child list and bounds changed;
    /// `child` learns through `Parent` that everything it inherits changed.
    ///
    /// # Panics
    ///
    /// Panics if either handle is stale, if `child` already has a parent, or
    /// if `parent` is `child` itself or one of its descendants.
    pub fn add_child(&mut self, parent: NodeId, child: NodeId) {
        self.validate_id(parent);
        self.validate_id(child);
        let c = child.idx;
        assert!(
            self.parent[c as usize] == INVALID,
            "child already has a parent"
        );
        assert!(
            !self.is_ancestor_or_self(c, parent.idx),
            "cannot attach a node under its own subtree"
        );
        self.link_last(parent.idx, c);
    }

    /// Removes `child` from its current parent, making it a root.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale or the node has no parent.
    pub fn remove_from_parent(&mut self, child: NodeId) {
        self.validate_id(child);
        let c = child.idx;
        assert!(self.parent[c as usize] != INVALID, "node has no parent");

        let p = self.parent[c as usize];
        self.unlink_from_parent(c);
        self.apply(p, InvalidationSource::Child, CHILDREN_CHANGED);
        self.apply(c, InvalidationSource::Parent, ATTACHED);
    }

    /// Moves `child` to be the last child of `new_parent`.
    ///
    /// If `child` already has a parent, it is removed first.
    ///
    /// # Panics
    ///
    /// Panics if either handle is stale, or if `new_parent` is `child` itself
    /// or one of its descendants.
    pub fn reparent(&mut self, child: NodeId, new_parent: NodeId) {
        self.validate_id(child);
        self.validate_id(new_parent);
        assert!(
            !self.is_ancestor_or_self(child.idx, new_parent.idx),
            "cannot reparent a node under its own subtree"
        );

        if self.parent[child.idx as usize] != INVALID {
            let old_p = self.parent[child.idx as usize];
            self.unlink_from_parent(child.idx);
            self.apply(old_p, InvalidationSource::Child, CHILDREN_CHANGED);
        }
        self.link_last(new_parent.idx, child.idx);
    }

    /// Inserts `child` before `sibling` in the sibling list.
    ///
    /// `child` must not already have a parent. `sibling` must have a parent.
    ///
    /// # Panics
    ///
    /// Panics if handles are stale, `child` already has a parent, `sibling`
    /// has no parent, or `sibling`'s parent lies inside `child`'s subtree.
    pub fn insert_before(&mut self, child: NodeId, sibling: NodeId) {
        self.validate_id(child);
        self.validate_id(sibling);
        let c = child.idx;
        let s = sibling.idx;
        assert!(
            self.parent[c as usize] == INVALID,
            "child already has a parent"
        );
        let p = self.parent[s as usize];
        assert!(p != INVALID, "sibling has no parent");
        assert!(
            !self.is_ancestor_or_self(c, p),
            "cannot attach a node under its own subtree"
        );

        self.parent[c as usize] = p;
        self.next_sibling[c as usize] = s;
        self.prev_sibling[c as usize] = self.prev_sibling[s as usize];

        if self.prev_sibling[s as usize] != INVALID {
            self.next_sibling[self.prev_sibling[s as usize] as usize] = c;
        } else {
            // `sibling` was the first child.
            self.first_child[p as usize] = c;
        }
        self.prev_sibling[s as usize] = c;

        self.apply(p, InvalidationSource::Child, CHILDREN_CHANGED);
        self.apply(c, InvalidationSource::Parent, ATTACHED);
    }

    /// Returns the parent of a node, if any.
    #[must_use]
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.validate_id(id);
        let p = self.parent[id.idx as usize];
        if p == INVALID {
            None
        } else {
            Some(NodeId {
                idx: p,
                generation: self.generation[p as usize],
            })
        }
    }

    /// Returns an iterator over the direct children of a node.
    #[must_use]
    pub fn children(&self, id: NodeId) -> Children<'_> {
        self.validate_id(id);
        Children {
            next_sibling: &self.next_sibling,
            generation: &self.generation,
            current: self.first_child[id.idx as usize],
        }
    }

    /// Returns the handles of root nodes (those with no parent).
    #[must_use]
    pub fn roots(&self) -> Vec<NodeId> {
        let mut roots = Vec::new();
        for idx in 0..self.len {
            if self.parent[idx as usize] == INVALID && self.alive[idx as usize] {
                roots.push(NodeId {
                    idx,
                    generation: self.generation[idx as usize],
                });
            }
        }
        roots
    }

    // -- Invalidation API --

    /// Returns the invalidation record of a node.
    #[must_use]
    pub fn record(&self, id: NodeId) -> &InvalidationRecord {
        self.validate_id(id);
        &self.records[id.idx as usize]
    }

    /// Invalidates `categories` on a node's record through `source`.
    ///
    /// Returns whether the record reported a change; if so, the node is
    /// scheduled for the next [`update`](Self::update). Nothing is forwarded to
    /// neighbours here; forwarding happens during the update pass.
    pub fn invalidate(
        &mut self,
        id: NodeId,
        source: InvalidationSource,
        categories: DirtyFlags,
    ) -> bool {
        self.validate_id(id);
        self.apply(id.idx, source, categories)
    }

    /// Returns whether any node is scheduled for the next update.
    #[must_use]
    pub fn needs_update(&self) -> bool {
        self.records.iter().any(|r| !r.is_clean())
            || !self.pending_added.is_empty()
            || !self.pending_removed.is_empty()
    }

    // -- Property getters (read-only, no invalidation) --

    /// Returns the local transform of a node.
    #[must_use]
    pub fn local_transform(&self, id: NodeId) -> Affine {
        self.validate_id(id);
        self.local_transform[id.idx as usize]
    }

    /// Returns the local opacity of a node.
    #[must_use]
    pub fn local_opacity(&self, id: NodeId) -> f32 {
        self.validate_id(id);
        self.local_opacity[id.idx as usize]
    }

    /// Returns the extent of a node's own content, in local coordinates.
    #[must_use]
    pub fn extent(&self, id: NodeId) -> Rect {
        self.validate_id(id);
        self.extent[id.idx as usize]
    }

    /// Returns the node's own hidden flag.
    #[must_use]
    pub fn is_hidden(&self, id: NodeId) -> bool {
        self.validate_id(id);
        self.hidden[id.idx as usize]
    }

    /// Returns the cached world transform of a node.
    ///
    /// Only valid after [`update`](Self::update) has been called.
    #[must_use]
    pub fn world_transform(&self, id: NodeId) -> Affine {
        self.validate_id(id);
        self.world_transform[id.idx as usize]
    }

    /// Returns the cached effective opacity of a node.
    ///
    /// Only valid after [`update`](Self::update) has been called.
    #[must_use]
    pub fn effective_opacity(&self, id: NodeId) -> f32 {
        self.validate_id(id);
        self.effective_opacity[id.idx as usize]
    }

    /// Returns whether the node is effectively hidden (including by an
    /// ancestor's hidden flag).
    ///
    /// Only valid after [`update`](Self::update) has been called.
    #[must_use]
    pub fn effective_hidden(&self, id: NodeId) -> bool {
        self.validate_id(id);
        self.effective_hidden[id.idx as usize]
    }

    /// Returns the cached bounds of a node's subtree, in local coordinates.
    ///
    /// This is the node's extent united with each visible child's bounds
    /// mapped through the child's local transform. Only valid after
    /// [`update`](Self::update) has been called.
    #[must_use]
    pub fn bounds(&self, id: NodeId) -> Rect {
        self.validate_id(id);
        self.bounds[id.idx as usize]
    }

    // -- Mutation API (auto-invalidates) --

    /// Sets the local transform of a node.
    ///
    /// Invalidates `TRANSFORM` locally, and `LAYOUT` on the parent through
    /// `Child` since the node's footprint in its parent moved.
    pub fn set_transform(&mut self, id: NodeId, transform: Affine) {
        self.validate_id(id);
        self.local_transform[id.idx as usize] = transform;
        self.apply(id.idx, InvalidationSource::Local, DirtyFlags::TRANSFORM);
        self.invalidate_parent_layout(id.idx);
    }

    /// Sets the local opacity of a node.
    pub fn set_opacity(&mut self, id: NodeId, opacity: f32) {
        self.validate_id(id);
        self.local_opacity[id.idx as usize] = opacity;
        self.apply(
            id.idx,
            InvalidationSource::Local,
            DirtyFlags::APPEARANCE | DirtyFlags::RENDER,
        );
    }

    /// Sets the extent of a node's own content.
    pub fn set_extent(&mut self, id: NodeId, extent: Rect) {
        self.validate_id(id);
        self.extent[id.idx as usize] = extent;
        self.apply(
            id.idx,
            InvalidationSource::Local,
            DirtyFlags::LAYOUT | DirtyFlags::RENDER,
        );
    }

    /// Sets the node's own hidden flag.
    ///
    /// Hidden nodes do not contribute to their parent's bounds.
    pub fn set_hidden(&mut self, id: NodeId, hidden: bool) {
        self.validate_id(id);
        self.hidden[id.idx as usize] = hidden;
        self.apply(id.idx, InvalidationSource::Local, DirtyFlags::VISIBILITY);
        self.invalidate_parent_layout(id.idx);
    }

    /// Marks the node's draw representation stale.
    pub fn mark_content_changed(&mut self, id: NodeId) {
        self.validate_id(id);
        self.apply(id.idx, InvalidationSource::Local, DirtyFlags::RENDER);
    }

    /// Marks the draw representation of the node and its whole subtree stale.
    ///
    /// The subtree is reached lazily: the next update forwards the request one
    /// level at a time.
    pub fn mark_subtree_changed(&mut self, id: NodeId) {
        self.validate_id(id);
        self.apply(
            id.idx,
            InvalidationSource::Local,
            DirtyFlags::RENDER | DirtyFlags::FORWARD,
        );
    }

    // -- Raw-index accessors --
    //
    // These accept raw slot indices (as found in `UpdateChanges`) rather than
    // `NodeId` handles, skipping generation validation.

    /// Returns the cached world transform at raw slot `idx`.
    ///
    /// # Panics
    ///
    /// Panics if `idx >= self.len`.
    #[must_use]
    pub fn world_transform_at(&self, idx: u32) -> Affine {
        assert!(
            idx < self.len,
            "slot index {idx} out of range (len {})",
            self.len
        );
        self.world_transform[idx as usize]
    }

    /// Returns the cached bounds at raw slot `idx`.
    ///
    /// # Panics
    ///
    /// Panics if `idx >= self.len`.
    #[must_use]
    pub fn bounds_at(&self, idx: u32) -> Rect {
        assert!(
            idx < self.len,
            "slot index {idx} out of range (len {})",
            self.len
        );
        self.bounds[idx as usize]
    }

    /// Returns the invalidation record at raw slot `idx`.
    ///
    /// # Panics
    ///
    /// Panics if `idx >= self.len`.
    #[must_use]
    pub fn record_at(&self, idx: u32) -> &InvalidationRecord {
        assert!(
            idx < self.len,
            "slot index {idx} out of range (len {})",
            self.len
        );
        &self.records[idx as usize]
    }

    // -- Internal helpers --

    /// Applies an invalidation to slot `idx` and schedules it if anything
    /// changed.
    pub(crate) fn apply(
        &mut self,
        idx: u32,
        source: InvalidationSource,
        categories: DirtyFlags,
    ) -> bool {
        let changed = self.records[idx as usize].invalidate(source, categories);
        if changed {
            self.schedule.mark(idx, dirty::PENDING);
            if categories.has_markers() {
                self.schedule.mark(idx, dirty::TOPOLOGY);
            }
        }
        changed
    }

    fn invalidate_parent_layout(&mut self, idx: u32) {
        let p = self.parent[idx as usize];
        if p != INVALID {
            self.apply(p, InvalidationSource::Child, DirtyFlags::LAYOUT);
        }
    }

    /// Appends `c` to `p`'s child list and invalidates both ends.
    fn link_last(&mut self, p: u32, c: u32) {
        self.parent[c as usize] = p;
        self.prev_sibling[c as usize] = INVALID;
        self.next_sibling[c as usize] = INVALID;

        if self.first_child[p as usize] == INVALID {
            self.first_child[p as usize] = c;
        } else {
            // Walk to last child.
            let mut last = self.first_child[p as usize];
            while self.next_sibling[last as usize] != INVALID {
                last = self.next_sibling[last as usize];
            }
            self.next_sibling[last as usize] = c;
            self.prev_sibling[c as usize] = last;
        }

        self.apply(p, InvalidationSource::Child, CHILDREN_CHANGED);
        self.apply(c, InvalidationSource::Parent, ATTACHED);
    }

    /// Returns whether `ancestor` is `idx` or one of its ancestors.
    fn is_ancestor_or_self(&self, ancestor: u32, mut idx: u32) -> bool {
        while idx != INVALID {
            if idx == ancestor {
                return true;
            }
            idx = self.parent[idx as usize];
        }
        false
    }

    /// Panics if the handle is stale.
    fn validate_id(&self, id: NodeId) {
        assert!(
            id.idx < self.len && self.generation[id.idx as usize] == id.generation,
            "stale NodeId: {id:?} (current gen: {})",
            if id.idx < self.len {
                self.generation[id.idx as usize]
            } else {
                u32::MAX
            }
        );
    }

    /// Removes `idx` from its parent's child list without touching records.
    fn unlink_from_parent(&mut self, idx: u32) {
        let p = self.parent[idx as usize];
        let prev = self.prev_sibling[idx as usize];
        let next = self.next_sibling[idx as usize];

        if prev != INVALID {
            self.next_sibling[prev as usize] = next;
        } else {
            // Was first child.
            self.first_child[p as usize] = next;
        }

        if next != INVALID {
            self.prev_sibling[next as usize] = prev;
        }

        self.parent[idx as usize] = INVALID;
        self.prev_sibling[idx as usize] = INVALID;
        self.next_sibling[idx as usize] = INVALID;
    }
}

/// Iterator over the direct children of a node, in sibling order.
///
/// Created by [`SceneTree::children`].
#[derive(Clone, Debug)]
pub struct Children<'a> {
    next_sibling: &'a [u32],
    generation: &'a [u32],
    current: u32,
}

impl Iterator for Children<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let idx = self.current;
        (idx != INVALID).then(|| {
            self.current = self.next_sibling[idx as usize];
            NodeId {
                idx,
                generation: self.generation[idx as usize],
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use alloc::vec;

    use super::*;

    use lamina_core::source::InvalidationSource::{Child, Local, Parent};

    /// Returns a tree with one freshly created and updated node.
    fn settled_root() -> (SceneTree, NodeId) {
        let mut tree = SceneTree::new();
        let root = tree.create_node();
        let _ = tree.update();
        (tree, root)
    }

    #[test]
    fn create_and_destroy() {
        let mut tree = SceneTree::new();
        let id = tree.create_node();
        assert!(tree.is_alive(id));
        tree.destroy_node(id);
        assert!(!tree.is_alive(id));
    }

    #[test]
    fn generation_prevents_stale_access() {
        let mut tree = SceneTree::new();
        let id1 = tree.create_node();
        tree.destroy_node(id1);
        let id2 = tree.create_node();
        // id2 reuses the same slot but has a different generation.
        assert!(!tree.is_alive(id1));
        assert!(tree.is_alive(id2));
        assert_eq!(id1.idx, id2.idx);
        assert_ne!(id1.generation, id2.generation);
    }

    #[test]
    #[should_panic(expected = "stale NodeId")]
    fn stale_handle_panics() {
        let mut tree = SceneTree::new();
        let id = tree.create_node();
        tree.destroy_node(id);
        let _ = tree.record(id);
    }

    #[test]
    fn new_node_record_is_seeded() {
        let mut tree = SceneTree::new();
        let id = tree.create_node();
        let record = tree.record(id);
        for source in InvalidationSource::ALL {
            assert_eq!(record.dirty(source), DirtyFlags::INITIAL);
        }
    }

    #[test]
    fn initial_dirty_is_configurable() {
        let mut tree = SceneTree::with_initial_dirty(DirtyFlags::LAYOUT | DirtyFlags::TOPOLOGY);
        let id = tree.create_node();
        assert_eq!(tree.record(id).dirty(Local), DirtyFlags::LAYOUT);
    }

    #[test]
    fn reused_slot_gets_fresh_record() {
        let (mut tree, root) = settled_root();
        assert!(tree.record(root).is_clean());
        tree.destroy_node(root);
        let again = tree.create_node();
        assert_eq!(again.idx, root.idx);
        assert_eq!(tree.record(again).dirty(Parent), DirtyFlags::INITIAL);
    }

    #[test]
    fn add_child_and_query() {
        let mut tree = SceneTree::new();
        let parent = tree.create_node();
        let child1 = tree.create_node();
        let child2 = tree.create_node();

        tree.add_child(parent, child1);
        tree.add_child(parent, child2);

        assert_eq!(tree.parent(child1), Some(parent));
        assert_eq!(tree.parent(child2), Some(parent));

        let kids: Vec<_> = tree.children(parent).collect();
        assert_eq!(kids, vec![child1, child2]);
    }

    #[test]
    fn add_child_invalidates_both_directions() {
        let mut tree = SceneTree::new();
        let parent = tree.create_node();
        let child = tree.create_node();
        let _ = tree.update();

        tree.add_child(parent, child);

        assert_eq!(tree.record(parent).dirty(Child), DirtyFlags::LAYOUT);
        assert!(tree.record(parent).dirty(Parent).is_empty());
        assert_eq!(
            tree.record(child).dirty(Parent),
            DirtyFlags::TRANSFORM | DirtyFlags::APPEARANCE | DirtyFlags::VISIBILITY
        );
        assert!(tree.record(child).dirty(Child).is_empty());
    }

    #[test]
    fn remove_from_parent_works() {
        let mut tree = SceneTree::new();
        let parent = tree.create_node();
        let child = tree.create_node();

        tree.add_child(parent, child);
        assert_eq!(tree.parent(child), Some(parent));

        tree.remove_from_parent(child);
        assert_eq!(tree.parent(child), None);
        assert!(tree.children(parent).next().is_none());
        assert_eq!(tree.roots(), vec![parent, child]);
    }

    #[test]
    fn reparent_moves_child() {
        let mut tree = SceneTree::new();
        let a = tree.create_node();
        let b = tree.create_node();
        let child = tree.create_node();
        tree.add_child(a, child);
        let _ = tree.update();

        tree.reparent(child, b);
        assert_eq!(tree.parent(child), Some(b));
        assert!(tree.children(a).next().is_none());
        assert!(tree.record(a).is_dirty(Child, DirtyFlags::LAYOUT));
        assert!(tree.record(b).is_dirty(Child, DirtyFlags::LAYOUT));
    }

    #[test]
    #[should_panic(expected = "own subtree")]
    fn reparent_under_descendant_panics() {
        let mut tree = SceneTree::new();
        let a = tree.create_node();
        let b = tree.create_node();
        tree.add_child(a, b);
        tree.reparent(a, b);
    }

    #[test]
    fn insert_before_orders_children() {
        let mut tree = SceneTree::new();
        let parent = tree.create_node();
        let first = tree.create_node();
        let second = tree.create_node();
        let inserted = tree.create_node();

        tree.add_child(parent, first);
        tree.add_child(parent, second);
        tree.insert_before(inserted, first);

        let kids: Vec<_> = tree.children(parent).collect();
        assert_eq!(kids, vec![inserted, first, second]);
    }

    #[test]
    fn insert_before_invalidates_parent_and_inserted_only() {
        let mut tree = SceneTree::new();
        let parent = tree.create_node();
        let first = tree.create_node();
        let inserted = tree.create_node();
        tree.add_child(parent, first);
        let _ = tree.update();

        tree.insert_before(inserted, first);

        assert_eq!(tree.record(parent).dirty(Child), DirtyFlags::LAYOUT);
        assert!(tree.record(parent).dirty(Local).is_empty());
        assert_eq!(
            tree.record(inserted).dirty(Parent),
            DirtyFlags::TRANSFORM | DirtyFlags::APPEARANCE | DirtyFlags::VISIBILITY
        );
        assert!(tree.record(first).is_clean(), "sibling must not be touched");

        let changes = tree.update();
        assert!(changes.topology_changed);
        assert_eq!(tree.traversal_order(), &[parent.idx, inserted.idx, first.idx]);
        assert!(tree.record(parent).is_clean());
        assert!(tree.record(inserted).is_clean());
        assert!(!tree.needs_update());
    }

    #[test]
    #[should_panic(expected = "own subtree")]
    fn add_child_to_itself_panics() {
        let mut tree = SceneTree::new();
        let a = tree.create_node();
        tree.add_child(a, a);
    }

    #[test]
    #[should_panic(expected = "own subtree")]
    fn add_root_under_its_descendant_panics() {
        let mut tree = SceneTree::new();
        let a = tree.create_node();
        let b = tree.create_node();
        tree.add_child(a, b);
        tree.add_child(b, a);
    }

    #[test]
    #[should_panic(expected = "own subtree")]
    fn insert_before_own_child_panics() {
        let mut tree = SceneTree::new();
        let a = tree.create_node();
        let b = tree.create_node();
        tree.add_child(a, b);
        tree.insert_before(a, b);
    }

    #[test]
    fn roots_skip_destroyed_slots() {
        let mut tree = SceneTree::new();
        let a = tree.create_node();
        let b = tree.create_node();
        let c = tree.create_node();
        tree.destroy_node(b);
        assert_eq!(tree.roots(), vec![a, c]);
        assert!(!tree.is_alive(b));

        let reused = tree.create_node();
        assert_eq!(reused.index(), b.index());
        assert_eq!(tree.roots(), vec![a, reused, c]);
    }

    #[test]
    #[should_panic(expected = "cannot destroy node with children")]
    fn destroy_with_children_panics() {
        let mut tree = SceneTree::new();
        let parent = tree.create_node();
        let child = tree.create_node();
        tree.add_child(parent, child);
        tree.destroy_node(parent);
    }

    #[test]
    fn destroy_child_invalidates_parent() {
        let mut tree = SceneTree::new();
        let parent = tree.create_node();
        let child = tree.create_node();
        tree.add_child(parent, child);
        let _ = tree.update();

        tree.destroy_node(child);
        assert!(tree.record(parent).is_dirty(Child, DirtyFlags::LAYOUT));
        assert!(tree.children(parent).next().is_none());
    }

    #[test]
    fn repeated_setter_coalesces() {
        let (mut tree, root) = settled_root();
        assert!(!tree.needs_update());

        tree.set_opacity(root, 0.5);
        let after_first = *tree.record(root);
        tree.set_opacity(root, 0.25);
        assert_eq!(*tree.record(root), after_first);
        assert!(tree.needs_update());
    }

    #[test]
    fn set_transform_notifies_parent() {
        let mut tree = SceneTree::new();
        let parent = tree.create_node();
        let child = tree.create_node();
        tree.add_child(parent, child);
        let _ = tree.update();

        tree.set_transform(child, Affine::translate((5.0, 0.0)));
        assert!(tree.record(child).is_dirty(Local, DirtyFlags::TRANSFORM));
        assert!(tree.record(parent).is_dirty(Child, DirtyFlags::LAYOUT));
        assert!(!tree.record(parent).is_dirty(Local, DirtyFlags::TRANSFORM));
    }

    #[test]
    fn invalidate_passes_through() {
        let (mut tree, root) = settled_root();
        assert!(tree.invalidate(root, Parent, DirtyFlags::CLIP));
        assert!(!tree.invalidate(root, Parent, DirtyFlags::CLIP));
        assert!(tree.invalidate(root, Parent, DirtyFlags::HIERARCHY));
        assert_eq!(tree.record(root).dirty(Parent), DirtyFlags::CLIP);
    }

    #[test]
    fn properties_read_back() {
        let (mut tree, root) = settled_root();
        let xf = Affine::scale(2.0);
        let extent = Rect::new(0.0, 0.0, 10.0, 20.0);
        tree.set_transform(root, xf);
        tree.set_opacity(root, 0.75);
        tree.set_extent(root, extent);
        tree.set_hidden(root, true);

        assert_eq!(tree.local_transform(root), xf);
        assert_eq!(tree.local_opacity(root), 0.75);
        assert_eq!(tree.extent(root), extent);
        assert!(tree.is_hidden(root));
    }
}
