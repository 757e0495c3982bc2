// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Per-node invalidation tracking for hierarchical scene graphs.
//!
//! `lamina_core` answers one question cheaply: which categories of a node's
//! cached derived state (layout, draw commands, transforms, ...) are known to
//! be stale, and through which direction did the staleness arrive? It does not
//! hold the cached values, decide what to recompute, or walk the tree. Those
//! belong to the owning scene.
//!
//! # Architecture
//!
//! ```text
//!   Scene mutation ──► InvalidationRecord::invalidate(source, flags) ──► changed?
//!                                  │                                      │
//!                                  ▼                                      ▼
//!                   dirty(Local / Parent / Child)        forward flags.trim() to
//!                                  │                     parent or children
//!                                  ▼
//!                  recompute cached state
//!                                  │
//!                                  ▼
//!               InvalidationRecord::validate(flags)
//! ```
//!
//! **[`dirty`]**: [`DirtyFlags`](dirty::DirtyFlags), the category bit-set.
//! Ordinary categories coalesce once stored; the two marker categories
//! (`TOPOLOGY`, `HIERARCHY`) are never stored and always signal.
//!
//! **[`source`]**: [`InvalidationSource`](source::InvalidationSource):
//! `Local`, `Parent`, or `Child`.
//!
//! **[`record`]**: [`InvalidationRecord`](record::InvalidationRecord), three
//! dirty sets (one per source) with `invalidate`, `validate`, and `trim`.
//!
//! **[`trace`]**: [`TraceSink`](trace::TraceSink) trait and event types for
//! update-pass instrumentation, with zero-overhead [`Tracer`](trace::Tracer)
//! wrapper.
//!
//! # Example
//!
//! ```
//! use lamina_core::dirty::DirtyFlags;
//! use lamina_core::record::InvalidationRecord;
//! use lamina_core::source::InvalidationSource;
//!
//! let mut record = InvalidationRecord::clean();
//! assert!(record.invalidate(InvalidationSource::Local, DirtyFlags::LAYOUT));
//! // Already stale: nothing new.
//! assert!(!record.invalidate(InvalidationSource::Local, DirtyFlags::LAYOUT));
//! // Structural markers always get through.
//! assert!(record.invalidate(InvalidationSource::Local, DirtyFlags::TOPOLOGY));
//!
//! assert!(record.validate(DirtyFlags::LAYOUT));
//! assert!(record.is_clean());
//! ```
//!
//! # Crate features
//!
//! - `trace` (disabled by default): Enables `Tracer` method bodies (one branch
//!   per call site).
//! - `trace-rich` (disabled by default, implies `trace`): Gates per-node
//!   change events.

#![no_std]
#![cfg_attr(docsrs, feature(doc_auto_cfg))]

#[cfg(test)]
extern crate alloc;

pub mod dirty;
pub mod record;
pub mod source;
pub mod trace;
