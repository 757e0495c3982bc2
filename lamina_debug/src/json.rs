// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! JSON-lines trace export.
//!
//! [`JsonLinesSink`] implements [`TraceSink`] and writes each event as a
//! single JSON object followed by a newline. Category sets are written as
//! arrays of names so the output stays readable without the bit layout.

use std::io::Write;

use lamina_core::dirty::DirtyFlags;
use lamina_core::trace::{
    InvalidateEvent, NodeChange, PassBeginEvent, PassEndEvent, TraceSink, ValidateEvent,
};
use serde_json::{Value, json};

use crate::pretty::kind_name;

/// Writes one JSON object per event to a [`Write`](std::io::Write) destination.
pub struct JsonLinesSink<W: Write> {
    writer: W,
    written: u64,
}

impl<W: Write> std::fmt::Debug for JsonLinesSink<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JsonLinesSink")
            .field("written", &self.written)
            .finish_non_exhaustive()
    }
}

impl<W: Write> JsonLinesSink<W> {
    /// Creates a sink that writes to the given destination.
    #[must_use]
    pub fn new(writer: W) -> Self {
        Self { writer, written: 0 }
    }

    /// Returns how many events have been written.
    #[must_use]
    pub fn written(&self) -> u64 {
        self.written
    }

    /// Consumes the sink and returns the destination.
    #[must_use]
    pub fn into_inner(self) -> W {
        self.writer
    }

    fn emit(&mut self, value: &Value) {
        if serde_json::to_writer(&mut self.writer, value).is_ok()
            && self.writer.write_all(b"\n").is_ok()
        {
            self.written += 1;
        }
    }
}

fn flag_names(flags: DirtyFlags) -> Value {
    flags
        .iter()
        .filter_map(DirtyFlags::name)
        .map(Value::from)
        .collect()
}

impl<W: Write> TraceSink for JsonLinesSink<W> {
    fn on_invalidate(&mut self, e: &InvalidateEvent) {
        self.emit(&json!({
            "event": "invalidate",
            "node": e.node,
            "source": e.source.as_str(),
            "flags": flag_names(e.categories),
            "changed": e.changed,
            "stored": flag_names(e.stored),
        }));
    }

    fn on_validate(&mut self, e: &ValidateEvent) {
        self.emit(&json!({
            "event": "validate",
            "node": e.node,
            "flags": flag_names(e.categories),
            "validated": e.validated,
        }));
    }

    fn on_pass_begin(&mut self, e: &PassBeginEvent) {
        self.emit(&json!({
            "event": "pass_begin",
            "pass": e.pass_index,
            "pending": e.pending,
        }));
    }

    fn on_pass_end(&mut self, e: &PassEndEvent) {
        self.emit(&json!({
            "event": "pass_end",
            "pass": e.pass_index,
            "visited": e.visited,
            "recomputed": e.recomputed,
        }));
    }

    fn on_node_changes(&mut self, pass_index: u64, changes: &[NodeChange]) {
        let changes: Vec<Value> = changes
            .iter()
            .map(|c| json!({ "node": c.node, "kind": kind_name(c.kind) }))
            .collect();
        self.emit(&json!({
            "event": "node_changes",
            "pass": pass_index,
            "changes": changes,
        }));
    }
}

#[cfg(test)]
mod tests {
    use lamina_core::source::InvalidationSource;

    use super::*;

    fn lines(sink: JsonLinesSink<Vec<u8>>) -> Vec<Value> {
        let text = String::from_utf8(sink.into_inner()).unwrap();
        text.lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect()
    }

    #[test]
    fn invalidate_is_one_object_per_line() {
        let mut sink = JsonLinesSink::new(Vec::new());
        sink.on_invalidate(&InvalidateEvent {
            node: 2,
            source: InvalidationSource::Child,
            categories: DirtyFlags::LAYOUT | DirtyFlags::TOPOLOGY,
            changed: true,
            stored: DirtyFlags::LAYOUT,
        });
        sink.on_validate(&ValidateEvent {
            node: 2,
            categories: DirtyFlags::LAYOUT,
            validated: true,
        });
        assert_eq!(sink.written(), 2);

        let parsed = lines(sink);
        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed[0]["event"], "invalidate");
        assert_eq!(parsed[0]["source"], "child");
        assert_eq!(parsed[0]["flags"], json!(["LAYOUT", "TOPOLOGY"]));
        assert_eq!(parsed[0]["stored"], json!(["LAYOUT"]));
        assert_eq!(parsed[1]["event"], "validate");
        assert_eq!(parsed[1]["validated"], true);
    }

    #[test]
    fn pass_events_carry_counts() {
        let mut sink = JsonLinesSink::new(Vec::new());
        sink.on_pass_begin(&PassBeginEvent {
            pass_index: 4,
            pending: 9,
        });
        sink.on_pass_end(&PassEndEvent {
            pass_index: 4,
            visited: 9,
            recomputed: 5,
        });

        let parsed = lines(sink);
        assert_eq!(parsed[0], json!({ "event": "pass_begin", "pass": 4, "pending": 9 }));
        assert_eq!(parsed[1]["recomputed"], 5);
    }

    #[test]
    fn empty_flags_are_an_empty_array() {
        let mut sink = JsonLinesSink::new(Vec::new());
        sink.on_validate(&ValidateEvent {
            node: 0,
            categories: DirtyFlags::EMPTY,
            validated: false,
        });
        let parsed = lines(sink);
        assert_eq!(parsed[0]["flags"], json!([]));
    }
}
