// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Reference scene tree for `lamina_core` invalidation records.
//!
//! `lamina_scene` is an owning consumer of
//! [`InvalidationRecord`](lamina_core::record::InvalidationRecord): one record
//! per node, driven by property setters and topology mutations, and consumed
//! by an update pass that recomputes world transforms, effective opacities,
//! visibility, and subtree bounds only where the records say they are stale.
//!
//! ```text
//!   set_transform / add_child / ...
//!       │
//!       ▼
//!   InvalidationRecord::invalidate ──► changed? ──► schedule (understory_dirty)
//!                                                        │
//!                 ┌──────────────────────────────────────┘
//!                 ▼
//!   SceneTree::update() ──► down walk (Parent) ──► up walk (Child) ──► UpdateChanges
//! ```
//!
//! **[`scene`]**: Struct-of-arrays node tree with generational handles.
//!
//! **[`dirty`]**: Scheduling channels for the `understory_dirty` tracker.
//!
//! # Example
//!
//! ```
//! use kurbo::{Affine, Rect};
//! use lamina_scene::scene::SceneTree;
//!
//! let mut tree = SceneTree::new();
//! let root = tree.create_node();
//! let child = tree.create_node();
//! tree.add_child(root, child);
//! tree.set_transform(child, Affine::translate((10.0, 0.0)));
//! tree.set_extent(child, Rect::new(0.0, 0.0, 5.0, 5.0));
//!
//! let changes = tree.update();
//! assert!(changes.topology_changed);
//! assert_eq!(tree.bounds(root), Rect::new(0.0, 0.0, 15.0, 5.0));
//!
//! // Nothing stale, nothing to do.
//! assert!(tree.update().is_empty());
//! ```
//!
//! # Crate features
//!
//! - `std` (disabled by default): Enables `std` support in dependencies.
//! - `trace` (disabled by default): Enables `lamina_core` tracing.
//! - `trace-rich` (disabled by default, implies `trace`): Per-node change
//!   events.

#![no_std]
#![cfg_attr(docsrs, feature(doc_auto_cfg))]

extern crate alloc;

pub mod dirty;
pub mod scene;
