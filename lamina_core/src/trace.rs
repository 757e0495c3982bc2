// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tracing and diagnostics for invalidation and update passes.
//!
//! This module provides a [`TraceSink`] trait with per-event methods that an
//! owning scene calls as it invalidates, validates, and walks its nodes. All
//! method bodies default to no-ops, so implementing only the events you care
//! about is fine.
//!
//! [`Tracer`] wraps an optional `&mut dyn TraceSink`. When the `trace` feature
//! is **off**, every `Tracer` method compiles to nothing (zero overhead). When
//! **on**, each method performs a single `Option` branch before dispatching.
//!
//! # Crate features
//!
//! - `trace`: enables the `Tracer` method bodies (one branch per call).
//! - `trace-rich` (implies `trace`): gates [`NodeChange`] events and the
//!   corresponding `TraceSink` method.

use crate::dirty::DirtyFlags;
use crate::source::InvalidationSource;

// ---------------------------------------------------------------------------
// Event structs
// ---------------------------------------------------------------------------

/// Emitted after an invalidation is applied to a node's record.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct InvalidateEvent {
    /// Raw slot index of the node.
    pub node: u32,
    /// Direction the invalidation arrived from.
    pub source: InvalidationSource,
    /// Categories as requested, markers included.
    pub categories: DirtyFlags,
    /// Whether the record reported a change.
    pub changed: bool,
    /// The source's stored set after the call.
    pub stored: DirtyFlags,
}

/// Emitted after a node acknowledges recomputation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ValidateEvent {
    /// Raw slot index of the node.
    pub node: u32,
    /// Categories being acknowledged.
    pub categories: DirtyFlags,
    /// Whether any source actually held one of them.
    pub validated: bool,
}

/// Marks the beginning of an update pass.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PassBeginEvent {
    /// Monotonic pass counter.
    pub pass_index: u64,
    /// Number of nodes scheduled for a visit.
    pub pending: u32,
}

/// Marks the end of an update pass.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PassEndEvent {
    /// Monotonic pass counter.
    pub pass_index: u64,
    /// Number of nodes whose record was inspected.
    pub visited: u32,
    /// Number of recompute steps taken, counting the downward and upward
    /// walks separately.
    pub recomputed: u32,
}

/// Which cached value of a node was recomputed.
#[cfg(feature = "trace-rich")]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ChangeKind {
    /// World transform.
    Transform,
    /// Effective opacity.
    Appearance,
    /// Effective hidden state.
    Visibility,
    /// Aggregate bounds.
    Bounds,
    /// Draw representation needs rebuilding.
    Redraw,
    /// Child list changed.
    Topology,
}

/// A per-node recompute event (requires `trace-rich` feature).
#[cfg(feature = "trace-rich")]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct NodeChange {
    /// Raw slot index of the node.
    pub node: u32,
    /// What was recomputed.
    pub kind: ChangeKind,
}

// ---------------------------------------------------------------------------
// TraceSink trait
// ---------------------------------------------------------------------------

/// Receives trace events from an owning scene.
///
/// All methods have default no-op implementations, so you only need to
/// override the events you care about.
pub trait TraceSink {
    /// Called after an invalidation is applied.
    fn on_invalidate(&mut self, e: &InvalidateEvent) {
        _ = e;
    }

    /// Called after a validation is applied.
    fn on_validate(&mut self, e: &ValidateEvent) {
        _ = e;
    }

    /// Called at the start of an update pass.
    fn on_pass_begin(&mut self, e: &PassBeginEvent) {
        _ = e;
    }

    /// Called at the end of an update pass.
    fn on_pass_end(&mut self, e: &PassEndEvent) {
        _ = e;
    }

    /// Called with the per-node changes of a pass (requires `trace-rich`
    /// feature).
    #[cfg(feature = "trace-rich")]
    fn on_node_changes(&mut self, pass_index: u64, changes: &[NodeChange]) {
        _ = (pass_index, changes);
    }
}

// ---------------------------------------------------------------------------
// NoopSink
// ---------------------------------------------------------------------------

/// A [`TraceSink`] that discards all events.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopSink;

impl TraceSink for NoopSink {}

// ---------------------------------------------------------------------------
// Tracer wrapper
// ---------------------------------------------------------------------------

/// Thin wrapper around an optional [`TraceSink`].
///
/// When the `trace` feature is **off**, every method compiles to nothing. When
/// **on**, each method checks the inner `Option` (one branch) before
/// dispatching to the sink.
pub struct Tracer<'a> {
    #[cfg(feature = "trace")]
    sink: Option<&'a mut dyn TraceSink>,
    #[cfg(not(feature = "trace"))]
    _marker: core::marker::PhantomData<&'a mut dyn TraceSink>,
}

impl core::fmt::Debug for Tracer<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Tracer").finish_non_exhaustive()
    }
}

impl<'a> Tracer<'a> {
    /// Creates a tracer that dispatches to the given sink.
    #[inline]
    #[must_use]
    pub fn new(sink: &'a mut dyn TraceSink) -> Self {
        #[cfg(feature = "trace")]
        {
            Self { sink: Some(sink) }
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = sink;
            Self {
                _marker: core::marker::PhantomData,
            }
        }
    }

    /// Creates a tracer that discards all events.
    #[inline]
    #[must_use]
    pub fn none() -> Self {
        #[cfg(feature = "trace")]
        {
            Self { sink: None }
        }
        #[cfg(not(feature = "trace"))]
        {
            Self {
                _marker: core::marker::PhantomData,
            }
        }
    }

    /// Returns `true` if events are being delivered somewhere.
    ///
    /// Always `false` when the `trace` feature is off. Callers use this to
    /// skip building rich event buffers nobody will read.
    #[inline]
    #[must_use]
    pub fn is_active(&self) -> bool {
        #[cfg(feature = "trace")]
        {
            self.sink.is_some()
        }
        #[cfg(not(feature = "trace"))]
        {
            false
        }
    }

    /// Emits an [`InvalidateEvent`].
    #[inline]
    pub fn invalidate(&mut self, e: &InvalidateEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_invalidate(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`ValidateEvent`].
    #[inline]
    pub fn validate(&mut self, e: &ValidateEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_validate(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`PassBeginEvent`].
    #[inline]
    pub fn pass_begin(&mut self, e: &PassBeginEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_pass_begin(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`PassEndEvent`].
    #[inline]
    pub fn pass_end(&mut self, e: &PassEndEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_pass_end(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits per-node changes (requires `trace-rich` feature).
    #[cfg(feature = "trace-rich")]
    #[inline]
    pub fn node_changes(&mut self, pass_index: u64, changes: &[NodeChange]) {
        if let Some(s) = &mut self.sink {
            s.on_node_changes(pass_index, changes);
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_invalidate() -> InvalidateEvent {
        InvalidateEvent {
            node: 3,
            source: InvalidationSource::Parent,
            categories: DirtyFlags::TRANSFORM | DirtyFlags::HIERARCHY,
            changed: true,
            stored: DirtyFlags::TRANSFORM,
        }
    }

    #[test]
    fn noop_sink_compiles() {
        let mut sink = NoopSink;
        sink.on_invalidate(&sample_invalidate());
        sink.on_validate(&ValidateEvent {
            node: 3,
            categories: DirtyFlags::TRANSFORM,
            validated: true,
        });
        sink.on_pass_begin(&PassBeginEvent {
            pass_index: 0,
            pending: 1,
        });
        sink.on_pass_end(&PassEndEvent {
            pass_index: 0,
            visited: 1,
            recomputed: 1,
        });
    }

    #[test]
    fn tracer_none_does_nothing() {
        let mut tracer = Tracer::none();
        assert!(!tracer.is_active());
        tracer.invalidate(&sample_invalidate());
        tracer.pass_begin(&PassBeginEvent {
            pass_index: 0,
            pending: 0,
        });
    }

    #[cfg(feature = "trace")]
    #[test]
    fn tracer_dispatches_to_sink() {
        use alloc::vec::Vec;

        struct RecordingSink {
            nodes: Vec<u32>,
        }
        impl TraceSink for RecordingSink {
            fn on_invalidate(&mut self, e: &InvalidateEvent) {
                self.nodes.push(e.node);
            }
        }

        let mut sink = RecordingSink { nodes: Vec::new() };
        let mut tracer = Tracer::new(&mut sink);
        assert!(tracer.is_active());
        tracer.invalidate(&sample_invalidate());
        // Access sink after tracer is dropped.
        drop(tracer);
        assert_eq!(sink.nodes, &[3]);
    }
}
