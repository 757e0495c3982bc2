// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Update pass and change reporting.
//!
//! An update pass consults each node's
//! [`InvalidationRecord`](lamina_core::record::InvalidationRecord), recomputes
//! the cached state it says is stale, forwards what its neighbours need to
//! know, and validates what it recomputed:
//!
//! 1. **Topology**: Drain the `TOPOLOGY` channel and rebuild the depth-first
//!    pre-order traversal if anything structural happened.
//! 2. **Downward walk** (pre-order): For categories stale through `Local` or
//!    `Parent`: recompute `world_transform` (`TRANSFORM`),
//!    `effective_opacity` (`APPEARANCE`), and `effective_hidden`
//!    (`VISIBILITY`), then forward the same categories to every child
//!    through `Parent`. `FORWARD` re-issues `RENDER | FORWARD` to children.
//!    Inherited categories that arrived only through `Child` have nothing to
//!    recompute here and are simply validated.
//! 3. **Upward walk** (reverse pre-order, children first): For `LAYOUT`
//!    stale through any source, recompute `bounds`; if they changed, forward
//!    `LAYOUT` to the parent through `Child`. `RENDER` and `CLIP` are
//!    reported for redraw and validated.
//!
//! Forwarded categories are always [trimmed](lamina_core::dirty::DirtyFlags::trim)
//! so structural markers never leak into a neighbour's stored state.
//!
//! [`UpdateChanges`] uses raw slot indices (`u32`) rather than [`NodeId`]
//! handles so that consumers can index directly via the `*_at()` accessors.
//!
//! [`NodeId`]: super::NodeId

use alloc::vec::Vec;

use kurbo::{Affine, Rect};
use lamina_core::dirty::DirtyFlags;
use lamina_core::source::InvalidationSource;
#[cfg(feature = "trace-rich")]
use lamina_core::trace::{ChangeKind, NodeChange};
use lamina_core::trace::{InvalidateEvent, PassBeginEvent, PassEndEvent, Tracer, ValidateEvent};

use super::id::INVALID;
use super::store::SceneTree;
use crate::dirty;

/// Categories recomputed on the way down and inherited by children.
const INHERITED: DirtyFlags = DirtyFlags::TRANSFORM
    .union(DirtyFlags::APPEARANCE)
    .union(DirtyFlags::VISIBILITY)
    .union(DirtyFlags::FORWARD);

/// Categories that only require the node to be redrawn.
const REDRAW: DirtyFlags = DirtyFlags::RENDER.union(DirtyFlags::CLIP);

/// The set of changes produced by a single [`SceneTree::update`] call.
///
/// Each field contains the raw slot indices of nodes that changed in the
/// corresponding category.
#[derive(Clone, Debug, Default)]
pub struct UpdateChanges {
    /// Nodes whose world transform was recomputed.
    pub transforms: Vec<u32>,
    /// Nodes whose effective opacity was recomputed.
    pub opacities: Vec<u32>,
    /// Nodes whose effective hidden state flipped.
    pub visibility: Vec<u32>,
    /// Nodes whose subtree bounds changed.
    pub bounds: Vec<u32>,
    /// Nodes whose draw representation must be rebuilt.
    pub redraw: Vec<u32>,
    /// Nodes added since the last update.
    pub added: Vec<u32>,
    /// Nodes removed since the last update.
    pub removed: Vec<u32>,
    /// Whether the traversal order was rebuilt.
    pub topology_changed: bool,
}

impl UpdateChanges {
    /// Clears all change lists.
    pub fn clear(&mut self) {
        self.transforms.clear();
        self.opacities.clear();
        self.visibility.clear();
        self.bounds.clear();
        self.redraw.clear();
        self.added.clear();
        self.removed.clear();
        self.topology_changed = false;
    }

    /// Returns `true` if nothing changed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.transforms.is_empty()
            && self.opacities.is_empty()
            && self.visibility.is_empty()
            && self.bounds.is_empty()
            && self.redraw.is_empty()
            && self.added.is_empty()
            && self.removed.is_empty()
            && !self.topology_changed
    }
}

/// Per-pass bookkeeping threaded through the walks.
struct Pass<'t, 'a> {
    tracer: &'t mut Tracer<'a>,
    visited: u32,
    recomputed: u32,
    #[cfg(feature = "trace-rich")]
    node_changes: Vec<NodeChange>,
}

#[cfg(feature = "trace-rich")]
impl Pass<'_, '_> {
    fn note(&mut self, node: u32, kind: ChangeKind) {
        if self.tracer.is_active() {
            self.node_changes.push(NodeChange { node, kind });
        }
    }
}

impl SceneTree {
    /// Runs an update pass, recomputing stale cached state and returning the
    /// set of changes.
    pub fn update(&mut self) -> UpdateChanges {
        let mut changes = UpdateChanges::default();
        self.update_into(&mut changes);
        changes
    }

    /// Like [`update`](Self::update), but reuses a caller-provided buffer to
    /// avoid allocation.
    pub fn update_into(&mut self, changes: &mut UpdateChanges) {
        self.update_traced(changes, &mut Tracer::none());
    }

    /// Like [`update_into`](Self::update_into), reporting invalidations,
    /// validations, and pass boundaries to `tracer`.
    pub fn update_traced(&mut self, changes: &mut UpdateChanges, tracer: &mut Tracer<'_>) {
        changes.clear();
        let pass_index = self.pass_index;
        self.pass_index += 1;

        let structural: Vec<u32> = self
            .schedule
            .drain(dirty::TOPOLOGY)
            .deterministic()
            .run()
            .collect();
        if !structural.is_empty() {
            self.rebuild_traversal_order();
            changes.topology_changed = true;
        }

        let pending: Vec<u32> = self
            .schedule
            .drain(dirty::PENDING)
            .deterministic()
            .run()
            .filter(|&idx| self.alive[idx as usize])
            .collect();

        // Move lifecycle lists.
        core::mem::swap(&mut self.pending_added, &mut changes.added);
        core::mem::swap(&mut self.pending_removed, &mut changes.removed);

        if pending.is_empty() {
            return;
        }

        tracer.pass_begin(&PassBeginEvent {
            pass_index,
            pending: u32::try_from(pending.len()).unwrap_or(u32::MAX),
        });

        let mut pass = Pass {
            tracer,
            visited: 0,
            recomputed: 0,
            #[cfg(feature = "trace-rich")]
            node_changes: Vec::new(),
        };

        #[cfg(feature = "trace-rich")]
        for &idx in &structural {
            if self.alive[idx as usize] {
                pass.note(idx, ChangeKind::Topology);
            }
        }

        let order = core::mem::take(&mut self.traversal_order);
        for &idx in &order {
            self.update_down(idx, changes, &mut pass);
        }
        for &idx in order.iter().rev() {
            self.update_up(idx, changes, &mut pass);
        }
        self.traversal_order = order;

        // Everything forwarded during the walks was handled by them.
        self.schedule
            .drain(dirty::PENDING)
            .deterministic()
            .run()
            .for_each(|_| {});

        #[cfg(feature = "trace-rich")]
        pass.tracer.node_changes(pass_index, &pass.node_changes);

        pass.tracer.pass_end(&PassEndEvent {
            pass_index,
            visited: pass.visited,
            recomputed: pass.recomputed,
        });
    }

    /// Returns the current traversal order (depth-first pre-order).
    ///
    /// Only valid after [`update`](Self::update) has been called at least
    /// once.
    #[must_use]
    pub fn traversal_order(&self) -> &[u32] {
        &self.traversal_order
    }

    /// Recomputes inherited state at `idx` and forwards it to the children.
    fn update_down(&mut self, idx: u32, changes: &mut UpdateChanges, pass: &mut Pass<'_, '_>) {
        let record = self.records[idx as usize];
        if record.is_clean() {
            return;
        }
        pass.visited += 1;

        let down = (record.dirty(InvalidationSource::Local)
            | record.dirty(InvalidationSource::Parent))
            & INHERITED;
        let i = idx as usize;
        let p = self.parent[i];

        if down.intersects(DirtyFlags::TRANSFORM) {
            let parent_world = if p != INVALID {
                self.world_transform[p as usize]
            } else {
                Affine::IDENTITY
            };
            self.world_transform[i] = parent_world * self.local_transform[i];
            changes.transforms.push(idx);
            #[cfg(feature = "trace-rich")]
            pass.note(idx, ChangeKind::Transform);
        }

        if down.intersects(DirtyFlags::APPEARANCE) {
            let parent_opacity = if p != INVALID {
                self.effective_opacity[p as usize]
            } else {
                1.0
            };
            self.effective_opacity[i] = parent_opacity * self.local_opacity[i];
            changes.opacities.push(idx);
            #[cfg(feature = "trace-rich")]
            pass.note(idx, ChangeKind::Appearance);
        }

        if down.intersects(DirtyFlags::VISIBILITY) {
            let parent_hidden = p != INVALID && self.effective_hidden[p as usize];
            let new_hidden = parent_hidden || self.hidden[i];
            if new_hidden != self.effective_hidden[i] {
                self.effective_hidden[i] = new_hidden;
                changes.visibility.push(idx);
                #[cfg(feature = "trace-rich")]
                pass.note(idx, ChangeKind::Visibility);
            }
        }

        if !down.is_empty() {
            let mut forward = down;
            if down.intersects(DirtyFlags::FORWARD) {
                forward |= DirtyFlags::RENDER;
            }
            let mut child = self.first_child[i];
            while child != INVALID {
                self.forward(child, InvalidationSource::Parent, forward.trim(), pass);
                child = self.next_sibling[child as usize];
            }
            pass.recomputed += 1;
        }

        // Inherited categories reported by a descendant have nothing to
        // recompute at this level.
        let acknowledged = down | (record.dirty(InvalidationSource::Child) & INHERITED);
        self.acknowledge(idx, acknowledged, pass);
    }

    /// Recomputes aggregate state at `idx` and forwards it to the parent.
    fn update_up(&mut self, idx: u32, changes: &mut UpdateChanges, pass: &mut Pass<'_, '_>) {
        let record = self.records[idx as usize];
        if record.is_clean() {
            return;
        }
        let stale = record.combined();
        let i = idx as usize;

        if stale.intersects(DirtyFlags::LAYOUT) {
            let bounds = self.compute_bounds(idx);
            if bounds != self.bounds[i] {
                self.bounds[i] = bounds;
                changes.bounds.push(idx);
                #[cfg(feature = "trace-rich")]
                pass.note(idx, ChangeKind::Bounds);
                let p = self.parent[i];
                if p != INVALID {
                    self.forward(p, InvalidationSource::Child, DirtyFlags::LAYOUT, pass);
                }
            }
            pass.recomputed += 1;
        }

        if stale.intersects(REDRAW) {
            changes.redraw.push(idx);
            #[cfg(feature = "trace-rich")]
            pass.note(idx, ChangeKind::Redraw);
        }

        self.acknowledge(idx, stale & (DirtyFlags::LAYOUT | REDRAW), pass);
    }

    /// Own extent united with each visible child's bounds in this node's space.
    fn compute_bounds(&self, idx: u32) -> Rect {
        let mut bounds = self.extent[idx as usize];
        let mut child = self.first_child[idx as usize];
        while child != INVALID {
            let c = child as usize;
            if !self.hidden[c] {
                let child_bounds = self.local_transform[c].transform_rect_bbox(self.bounds[c]);
                bounds = bounds.union(child_bounds);
            }
            child = self.next_sibling[c];
        }
        bounds
    }

    fn forward(
        &mut self,
        idx: u32,
        source: InvalidationSource,
        categories: DirtyFlags,
        pass: &mut Pass<'_, '_>,
    ) {
        let changed = self.apply(idx, source, categories);
        pass.tracer.invalidate(&InvalidateEvent {
            node: idx,
            source,
            categories,
            changed,
            stored: self.records[idx as usize].dirty(source),
        });
    }

    fn acknowledge(&mut self, idx: u32, categories: DirtyFlags, pass: &mut Pass<'_, '_>) {
        if categories.is_empty() {
            return;
        }
        let validated = self.records[idx as usize].validate(categories);
        pass.tracer.validate(&ValidateEvent {
            node: idx,
            categories,
            validated,
        });
    }

    /// Rebuilds the depth-first pre-order traversal of all live nodes.
    fn rebuild_traversal_order(&mut self) {
        self.traversal_order.clear();
        // Start from roots.
        for idx in 0..self.len {
            if self.parent[idx as usize] == INVALID && self.alive[idx as usize] {
                self.dfs_collect(idx);
            }
        }
    }

    /// Depth-first pre-order collection starting from `idx`.
    fn dfs_collect(&mut self, idx: u32) {
        self.traversal_order.push(idx);
        let mut child = self.first_child[idx as usize];
        while child != INVALID {
            self.dfs_collect(child);
            child = self.next_sibling[child as usize];
        }
    }
}
