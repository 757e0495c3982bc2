// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Per-node invalidation record.
//!
//! An [`InvalidationRecord`] holds one [`DirtyFlags`] set per
//! [`InvalidationSource`]. A category is present in a source's set while an
//! invalidation that arrived through that source is still unacknowledged.
//!
//! The owning node drives the record with three calls:
//!
//! - [`invalidate`](InvalidationRecord::invalidate) when it (or a neighbour)
//!   changes. Returns whether anything new was learned.
//! - [`validate`](InvalidationRecord::validate) after recomputing cached
//!   state, clearing the categories on every source at once.
//! - [`dirty`](InvalidationRecord::dirty) to read what is still stale for a
//!   given source.
//!
//! Marker categories ([`DirtyFlags::MARKERS`]) are tested against but never
//! stored, so an invalidation carrying one always reports a change.

use crate::dirty::DirtyFlags;
use crate::source::{InvalidSource, InvalidationSource};

/// Dirty state for one node, tracked separately per source direction.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct InvalidationRecord {
    // Indexed by `InvalidationSource::index`.
    dirty: [DirtyFlags; 3],
}

impl InvalidationRecord {
    /// Creates a record with every source dirty for `initial`.
    ///
    /// Marker bits in `initial` are dropped, as with any invalidation.
    #[must_use]
    pub fn new(initial: DirtyFlags) -> Self {
        let mut record = Self::clean();
        for source in InvalidationSource::ALL {
            record.invalidate(source, initial);
        }
        record
    }

    /// Creates a record with nothing dirty.
    #[inline]
    #[must_use]
    pub const fn clean() -> Self {
        Self {
            dirty: [DirtyFlags::EMPTY; 3],
        }
    }

    /// Records an invalidation of `categories` arriving through `source`.
    ///
    /// Returns `false` if the source's set already held every category in
    /// `categories` (including when `categories` is empty). Otherwise stores
    /// the [trimmed](DirtyFlags::trim) categories and returns `true`.
    #[inline]
    pub fn invalidate(&mut self, source: InvalidationSource, categories: DirtyFlags) -> bool {
        let slot = &mut self.dirty[source.index()];
        if slot.contains(categories) {
            return false;
        }
        *slot |= categories.trim();
        true
    }

    /// Like [`invalidate`](Self::invalidate), but takes a raw source tag.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidSource`] if `tag` does not name a source. The record is
    /// left untouched.
    pub fn invalidate_raw(
        &mut self,
        tag: u8,
        categories: DirtyFlags,
    ) -> Result<bool, InvalidSource> {
        let source = InvalidationSource::try_from(tag)?;
        Ok(self.invalidate(source, categories))
    }

    /// Acknowledges that `categories` were recomputed.
    ///
    /// Clears `categories` from all three sources. Returns `true` if any
    /// source actually held one of them.
    #[inline]
    pub fn validate(&mut self, categories: DirtyFlags) -> bool {
        let mut validated = false;
        for slot in &mut self.dirty {
            // Bitwise `|`: every slot must be cleared.
            validated |= Self::clear(slot, categories);
        }
        validated
    }

    /// Returns `categories` without marker bits.
    #[inline]
    #[must_use]
    pub const fn trim(categories: DirtyFlags) -> DirtyFlags {
        categories.trim()
    }

    /// Returns the categories currently dirty through `source`.
    #[inline]
    #[must_use]
    pub const fn dirty(&self, source: InvalidationSource) -> DirtyFlags {
        self.dirty[source.index()]
    }

    /// Returns `true` if any of `categories` is dirty through `source`.
    #[inline]
    #[must_use]
    pub const fn is_dirty(&self, source: InvalidationSource, categories: DirtyFlags) -> bool {
        self.dirty(source).intersects(categories)
    }

    /// Returns the union of every source's dirty set.
    #[inline]
    #[must_use]
    pub const fn combined(&self) -> DirtyFlags {
        self.dirty[0].union(self.dirty[1]).union(self.dirty[2])
    }

    /// Returns `true` if nothing is dirty on any source.
    #[inline]
    #[must_use]
    pub const fn is_clean(&self) -> bool {
        self.combined().is_empty()
    }

    fn clear(slot: &mut DirtyFlags, categories: DirtyFlags) -> bool {
        let present = slot.intersects(categories);
        *slot -= categories;
        present
    }
}
