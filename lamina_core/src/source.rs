// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Invalidation source direction.

use core::fmt;

/// The direction from which an invalidation reached a node.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum InvalidationSource {
    /// The node's own state changed.
    Local = 0,
    /// An ancestor's cached state changed in a way that affects this node.
    Parent = 1,
    /// A descendant's cached state changed in a way that affects aggregate
    /// state here.
    Child = 2,
}

impl InvalidationSource {
    /// Every source, in tag order.
    pub const ALL: [Self; 3] = [Self::Local, Self::Parent, Self::Child];

    /// Returns the raw tag (`0`, `1` or `2`).
    #[inline]
    #[must_use]
    pub const fn tag(self) -> u8 {
        self as u8
    }

    #[inline]
    pub(crate) const fn index(self) -> usize {
        self as usize
    }

    /// Returns a short lowercase label for diagnostics.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Local => "local",
            Self::Parent => "parent",
            Self::Child => "child",
        }
    }
}

impl fmt::Display for InvalidationSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<u8> for InvalidationSource {
    type Error = InvalidSource;

    fn try_from(tag: u8) -> Result<Self, InvalidSource> {
        match tag {
            0 => Ok(Self::Local),
            1 => Ok(Self::Parent),
            2 => Ok(Self::Child),
            other => Err(InvalidSource(other)),
        }
    }
}

/// A raw source tag that does not name an [`InvalidationSource`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct InvalidSource(pub u8);

impl fmt::Display for InvalidSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid invalidation source tag: {}", self.0)
    }
}

impl core::error::Error for InvalidSource {}

#[cfg(test)]
mod tests {
    use alloc::string::ToString;

    use super::*;

    #[test]
    fn tags_round_trip() {
        for source in InvalidationSource::ALL {
            assert_eq!(InvalidationSource::try_from(source.tag()), Ok(source));
        }
    }

    #[test]
    fn unknown_tag_is_rejected_by_value() {
        let err = InvalidationSource::try_from(3).unwrap_err();
        assert_eq!(err, InvalidSource(3));
        assert_eq!(err.to_string(), "invalid invalidation source tag: 3");
        assert_eq!(
            InvalidationSource::try_from(u8::MAX),
            Err(InvalidSource(u8::MAX))
        );
    }
}
