// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Human-readable trace output.
//!
//! [`PrettyPrintSink`] implements [`TraceSink`] and writes one line per event
//! to a [`Write`](std::io::Write) destination (default: stderr).

use std::io::Write;

use lamina_core::trace::{
    ChangeKind, InvalidateEvent, NodeChange, PassBeginEvent, PassEndEvent, TraceSink,
    ValidateEvent,
};

/// Writes human-readable trace lines to a [`Write`](std::io::Write) destination.
pub struct PrettyPrintSink<W: Write = Box<dyn Write>> {
    writer: W,
}

impl<W: Write> std::fmt::Debug for PrettyPrintSink<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrettyPrintSink").finish_non_exhaustive()
    }
}

impl PrettyPrintSink {
    /// Creates a sink that writes to stderr.
    #[must_use]
    pub fn stderr() -> Self {
        Self {
            writer: Box::new(std::io::stderr()),
        }
    }

    /// Creates a sink that writes to a boxed writer.
    #[must_use]
    pub fn new(writer: Box<dyn Write>) -> Self {
        Self { writer }
    }
}

impl<W: Write> PrettyPrintSink<W> {
    /// Creates a sink that writes to the given destination.
    #[must_use]
    pub fn with_writer(writer: W) -> Self {
        Self { writer }
    }

    /// Consumes the sink and returns the destination.
    #[must_use]
    pub fn into_inner(self) -> W {
        self.writer
    }
}

pub(crate) fn kind_name(kind: ChangeKind) -> &'static str {
    match kind {
        ChangeKind::Transform => "transform",
        ChangeKind::Appearance => "appearance",
        ChangeKind::Visibility => "visibility",
        ChangeKind::Bounds => "bounds",
        ChangeKind::Redraw => "redraw",
        ChangeKind::Topology => "topology",
    }
}

impl<W: Write> TraceSink for PrettyPrintSink<W> {
    fn on_invalidate(&mut self, e: &InvalidateEvent) {
        let _ = writeln!(
            self.writer,
            "[invalidate] node={} source={} flags={} changed={} stored={}",
            e.node, e.source, e.categories, e.changed, e.stored,
        );
    }

    fn on_validate(&mut self, e: &ValidateEvent) {
        let _ = writeln!(
            self.writer,
            "[validate] node={} flags={} validated={}",
            e.node, e.categories, e.validated,
        );
    }

    fn on_pass_begin(&mut self, e: &PassBeginEvent) {
        let _ = writeln!(
            self.writer,
            "[pass:begin] pass={} pending={}",
            e.pass_index, e.pending,
        );
    }

    fn on_pass_end(&mut self, e: &PassEndEvent) {
        let _ = writeln!(
            self.writer,
            "[pass:end] pass={} visited={} recomputed={}",
            e.pass_index, e.visited, e.recomputed,
        );
    }

    fn on_node_changes(&mut self, pass_index: u64, changes: &[NodeChange]) {
        let _ = write!(
            self.writer,
            "[nodes] pass={pass_index} changes={}",
            changes.len()
        );
        for change in changes {
            let _ = write!(self.writer, " {}:{}", change.node, kind_name(change.kind));
        }
        let _ = writeln!(self.writer);
    }
}
