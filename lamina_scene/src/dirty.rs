// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Scheduling channel constants.
//!
//! The scene keeps two kinds of dirty state. Each node's
//! [`InvalidationRecord`](lamina_core::record::InvalidationRecord) says *what*
//! is stale on that node and from which direction. On top of that, an
//! [`understory_dirty`] tracker says *which* nodes have anything to look at,
//! so an update pass with nothing pending returns immediately.
//!
//! - [`PENDING`] is marked whenever a record reports a change.
//! - [`TOPOLOGY`] is marked whenever an invalidation carried a marker
//!   category. It triggers a traversal-order rebuild on the next pass.
//!
//! Neither channel propagates; the records and the update pass do the
//! forwarding.

use understory_dirty::Channel;

/// A node's record changed and the node needs a visit.
pub const PENDING: Channel = Channel::new(0);

/// A structural marker arrived; the traversal order must be rebuilt.
pub const TOPOLOGY: Channel = Channel::new(1);
