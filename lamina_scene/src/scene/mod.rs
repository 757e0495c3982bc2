// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Reference scene tree.
//!
//! A *node* is an element of a tree. Each node has:
//!
//! - An identity ([`NodeId`]), a generational handle that becomes stale when
//!   the node is destroyed.
//! - Topology: parent, first-child, and sibling links forming an ordered tree.
//! - **Local properties** set by the caller: [`transform`](SceneTree::set_transform),
//!   [`opacity`](SceneTree::set_opacity), [`extent`](SceneTree::set_extent), and
//!   [`hidden`](SceneTree::set_hidden).
//! - **Cached derived state** produced by [`update`](SceneTree::update):
//!   `world_transform`, `effective_opacity`, `effective_hidden`, and subtree
//!   `bounds`.
//! - An [`InvalidationRecord`](lamina_core::record::InvalidationRecord) that
//!   says which of those cached values are stale and from which direction.
//!
//! # Invalidation directions
//!
//! - **Local**: every setter invalidates the node's own record.
//! - **Parent**: inherited state (`TRANSFORM`, `APPEARANCE`, `VISIBILITY`,
//!   `FORWARD`) flows down: the update pass forwards it to each child.
//! - **Child**: aggregate state (`LAYOUT`) flows up: a changed child forwards
//!   it to its parent.
//!
//! Topology mutations send the marker categories (`TOPOLOGY` to the parent,
//! `HIERARCHY` to the moved child). Markers are never stored, so the records
//! always report them, which is what schedules the traversal rebuild.

mod id;
mod store;
mod update;

pub use id::{INVALID, NodeId};
pub use store::{Children, SceneTree};
pub use update::UpdateChanges;
