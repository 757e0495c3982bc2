// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Dirty-category vocabulary.
//!
//! A [`DirtyFlags`] value is a fixed-width bit-set over a closed set of named
//! categories. Each category names one kind of cached derived state that a
//! node may hold (layout metrics, a compiled draw representation, a world
//! transform, and so on).
//!
//! # Ordinary and marker categories
//!
//! - **Ordinary**: [`LAYOUT`](DirtyFlags::LAYOUT),
//!   [`RENDER`](DirtyFlags::RENDER), [`APPEARANCE`](DirtyFlags::APPEARANCE),
//!   [`TRANSFORM`](DirtyFlags::TRANSFORM), [`CLIP`](DirtyFlags::CLIP),
//!   [`VISIBILITY`](DirtyFlags::VISIBILITY) and
//!   [`FORWARD`](DirtyFlags::FORWARD). These are stored by an
//!   [`InvalidationRecord`](crate::record::InvalidationRecord) until
//!   validated, and repeated invalidations of the same category coalesce.
//!
//! - **Marker**: [`TOPOLOGY`](DirtyFlags::TOPOLOGY) and
//!   [`HIERARCHY`](DirtyFlags::HIERARCHY). These report a structural change in
//!   the graph. They are never stored, so every invalidation carrying one is
//!   reported as a change. [`trim`](DirtyFlags::trim) strips them.

use core::fmt;
use core::ops::{BitAnd, BitAndAssign, BitOr, BitOrAssign, Not, Sub, SubAssign};

/// A set of dirty categories.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct DirtyFlags(u32);

impl DirtyFlags {
    /// No categories.
    pub const EMPTY: Self = Self(0);

    /// Measured size or arrangement changed.
    pub const LAYOUT: Self = Self(1 << 0);

    /// Cached draw representation must be rebuilt.
    pub const RENDER: Self = Self(1 << 1);

    /// Colour or alpha changed.
    pub const APPEARANCE: Self = Self(1 << 2);

    /// Local or inherited transform changed.
    pub const TRANSFORM: Self = Self(1 << 3);

    /// Clip shape changed.
    pub const CLIP: Self = Self(1 << 4);

    /// Hidden or visible state changed.
    pub const VISIBILITY: Self = Self(1 << 5);

    /// An ancestor's invalidation must be forwarded further down the tree.
    pub const FORWARD: Self = Self(1 << 6);

    /// Marker: this node's child list changed.
    pub const TOPOLOGY: Self = Self(1 << 7);

    /// Marker: this node was attached, detached, or moved within a tree.
    pub const HIERARCHY: Self = Self(1 << 8);

    /// The two marker categories.
    pub const MARKERS: Self = Self(Self::TOPOLOGY.0 | Self::HIERARCHY.0);

    /// Every ordinary category.
    pub const ORDINARY: Self = Self(
        Self::LAYOUT.0
            | Self::RENDER.0
            | Self::APPEARANCE.0
            | Self::TRANSFORM.0
            | Self::CLIP.0
            | Self::VISIBILITY.0
            | Self::FORWARD.0,
    );

    /// Every known category.
    pub const ALL: Self = Self(Self::ORDINARY.0 | Self::MARKERS.0);

    /// Categories a freshly attached node knows nothing about.
    pub const INITIAL: Self = Self(
        Self::LAYOUT.0 | Self::RENDER.0 | Self::APPEARANCE.0 | Self::TRANSFORM.0,
    );

    /// Returns the raw bits.
    #[inline]
    #[must_use]
    pub const fn bits(self) -> u32 {
        self.0
    }

    /// Creates a set from raw bits, or `None` if any bit is not a known
    /// category.
    #[inline]
    #[must_use]
    pub const fn from_bits(bits: u32) -> Option<Self> {
        if bits & !Self::ALL.0 == 0 {
            Some(Self(bits))
        } else {
            None
        }
    }

    /// Creates a set from raw bits, dropping unknown bits.
    #[inline]
    #[must_use]
    pub const fn from_bits_truncate(bits: u32) -> Self {
        Self(bits & Self::ALL.0)
    }

    /// Returns `true` if no category is set.
    #[inline]
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Returns `true` if every category in `other` is also in `self`.
    ///
    /// The empty set is contained in every set.
    #[inline]
    #[must_use]
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// Returns `true` if `self` and `other` share at least one category.
    #[inline]
    #[must_use]
    pub const fn intersects(self, other: Self) -> bool {
        self.0 & other.0 != 0
    }

    /// Returns the union of both sets.
    #[inline]
    #[must_use]
    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    /// Returns the categories present in both sets.
    #[inline]
    #[must_use]
    pub const fn intersection(self, other: Self) -> Self {
        Self(self.0 & other.0)
    }

    /// Returns the categories in `self` but not in `other`.
    #[inline]
    #[must_use]
    pub const fn difference(self, other: Self) -> Self {
        Self(self.0 & !other.0)
    }

    /// Returns every known category not in `self`.
    #[inline]
    #[must_use]
    pub const fn complement(self) -> Self {
        Self(!self.0 & Self::ALL.0)
    }

    /// Returns `true` if either marker category is set.
    #[inline]
    #[must_use]
    pub const fn has_markers(self) -> bool {
        self.intersects(Self::MARKERS)
    }

    /// Returns `self` with both marker categories cleared.
    ///
    /// Ordinary categories are left untouched. Use this before storing or
    /// forwarding a set so that structural signals are not persisted as
    /// staleness.
    #[inline]
    #[must_use]
    pub const fn trim(self) -> Self {
        self.difference(Self::MARKERS)
    }

    /// Returns an iterator over the single-category members of this set, in
    /// bit order.
    #[inline]
    pub fn iter(self) -> Iter {
        Iter { remaining: self.0 }
    }

    /// Returns the name of a single-category set, or `None` if `self` is empty
    /// or holds more than one category.
    #[must_use]
    pub const fn name(self) -> Option<&'static str> {
        match self {
            Self::LAYOUT => Some("LAYOUT"),
            Self::RENDER => Some("RENDER"),
            Self::APPEARANCE => Some("APPEARANCE"),
            Self::TRANSFORM => Some("TRANSFORM"),
            Self::CLIP => Some("CLIP"),
            Self::VISIBILITY => Some("VISIBILITY"),
            Self::FORWARD => Some("FORWARD"),
            Self::TOPOLOGY => Some("TOPOLOGY"),
            Self::HIERARCHY => Some("HIERARCHY"),
            _ => None,
        }
    }
}

impl fmt::Debug for DirtyFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("DirtyFlags(")?;
        fmt::Display::fmt(self, f)?;
        f.write_str(")")
    }
}

/// Writes member names joined by `" | "`, or `EMPTY`.
impl fmt::Display for DirtyFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return f.write_str("EMPTY");
        }
        let mut first = true;
        for flag in self.iter() {
            if !first {
                f.write_str(" | ")?;
            }
            first = false;
            match flag.name() {
                Some(name) => f.write_str(name)?,
                None => write!(f, "{:#x}", flag.0)?,
            }
        }
        Ok(())
    }
}

impl BitOr for DirtyFlags {
    type Output = Self;

    #[inline]
    fn bitor(self, rhs: Self) -> Self {
        self.union(rhs)
    }
}

impl BitOrAssign for DirtyFlags {
    #[inline]
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl BitAnd for DirtyFlags {
    type Output = Self;

    #[inline]
    fn bitand(self, rhs: Self) -> Self {
        self.intersection(rhs)
    }
}

impl BitAndAssign for DirtyFlags {
    #[inline]
    fn bitand_assign(&mut self, rhs: Self) {
        self.0 &= rhs.0;
    }
}

impl Sub for DirtyFlags {
    type Output = Self;

    #[inline]
    fn sub(self, rhs: Self) -> Self {
        self.difference(rhs)
    }
}

impl SubAssign for DirtyFlags {
    #[inline]
    fn sub_assign(&mut self, rhs: Self) {
        self.0 &= !rhs.0;
    }
}

impl Not for DirtyFlags {
    type Output = Self;

    #[inline]
    fn not(self) -> Self {
        self.complement()
    }
}

impl IntoIterator for DirtyFlags {
    type Item = Self;
    type IntoIter = Iter;

    fn into_iter(self) -> Iter {
        self.iter()
    }
}

/// Iterator over the single-category members of a [`DirtyFlags`].
///
/// Created by [`DirtyFlags::iter`].
#[derive(Clone, Debug)]
pub struct Iter {
    remaining: u32,
}

impl Iterator for Iter {
    type Item = DirtyFlags;

    fn next(&mut self) -> Option<DirtyFlags> {
        if self.remaining == 0 {
            return None;
        }
        let lowest = self.remaining & self.remaining.wrapping_neg();
        self.remaining &= !lowest;
        Some(DirtyFlags(lowest))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = self.remaining.count_ones() as usize;
        (n, Some(n))
    }
}

impl ExactSizeIterator for Iter {}

#[cfg(test)]
mod tests {
    use alloc::format;
    use alloc::vec::Vec;

    use super::*;

    #[test]
    fn trim_strips_only_markers() {
        for bits in 0..=DirtyFlags::ALL.bits() {
            let flags = DirtyFlags::from_bits_truncate(bits);
            let trimmed = flags.trim();
            assert!(!trimmed.has_markers(), "{flags:?} kept a marker");
            assert_eq!(trimmed, flags & DirtyFlags::ORDINARY);
            if !flags.has_markers() {
                assert_eq!(trimmed, flags);
            }
        }
    }

    #[test]
    fn ordinary_and_markers_partition_all() {
        assert!(!DirtyFlags::ORDINARY.intersects(DirtyFlags::MARKERS));
        assert_eq!(DirtyFlags::ORDINARY | DirtyFlags::MARKERS, DirtyFlags::ALL);
        assert_eq!(DirtyFlags::MARKERS.iter().count(), 2);
        assert!(!DirtyFlags::INITIAL.has_markers());
    }

    #[test]
    fn contains_and_intersects() {
        let set = DirtyFlags::LAYOUT | DirtyFlags::RENDER;
        assert!(set.contains(DirtyFlags::LAYOUT));
        assert!(set.contains(DirtyFlags::EMPTY));
        assert!(!set.contains(DirtyFlags::LAYOUT | DirtyFlags::CLIP));
        assert!(set.intersects(DirtyFlags::LAYOUT | DirtyFlags::CLIP));
        assert!(!set.intersects(DirtyFlags::EMPTY));
    }

    #[test]
    fn complement_stays_within_known_bits() {
        assert_eq!(!DirtyFlags::EMPTY, DirtyFlags::ALL);
        assert_eq!(!DirtyFlags::ALL, DirtyFlags::EMPTY);
        assert_eq!(!DirtyFlags::MARKERS, DirtyFlags::ORDINARY);
    }

    #[test]
    fn from_bits_rejects_unknown() {
        assert_eq!(DirtyFlags::from_bits(1 << 0), Some(DirtyFlags::LAYOUT));
        assert_eq!(DirtyFlags::from_bits(1 << 31), None);
        assert_eq!(
            DirtyFlags::from_bits_truncate((1 << 31) | (1 << 3)),
            DirtyFlags::TRANSFORM
        );
    }

    #[test]
    fn assign_operators() {
        let mut set = DirtyFlags::EMPTY;
        set |= DirtyFlags::CLIP | DirtyFlags::FORWARD;
        set -= DirtyFlags::FORWARD;
        assert_eq!(set, DirtyFlags::CLIP);
        set &= DirtyFlags::LAYOUT;
        assert!(set.is_empty());
    }

    #[test]
    fn iter_yields_single_bits_in_order() {
        let set = DirtyFlags::TOPOLOGY | DirtyFlags::LAYOUT | DirtyFlags::TRANSFORM;
        let members: Vec<_> = set.iter().collect();
        assert_eq!(
            members,
            [
                DirtyFlags::LAYOUT,
                DirtyFlags::TRANSFORM,
                DirtyFlags::TOPOLOGY
            ]
        );
        assert_eq!(set.iter().len(), 3);
    }

    #[test]
    fn debug_lists_names() {
        assert_eq!(format!("{:?}", DirtyFlags::EMPTY), "DirtyFlags(EMPTY)");
        assert_eq!(
            format!("{:?}", DirtyFlags::LAYOUT | DirtyFlags::HIERARCHY),
            "DirtyFlags(LAYOUT | HIERARCHY)"
        );
        assert_eq!(format!("{}", DirtyFlags::RENDER), "RENDER");
    }
}
