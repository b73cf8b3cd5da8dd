// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The ordered list of pressed and locked keys.

use smallvec::SmallVec;

use crate::types::KeyId;

/// Keys currently Pressed or Selected, in press order.
///
/// The tail is the "last active key". A key locked while idle is inserted at
/// the head, so locking never changes the last active key.
#[derive(Clone, Debug, Default)]
pub struct ActiveKeyRegistry {
    order: SmallVec<[KeyId; 8]>,
}

impl ActiveKeyRegistry {
    /// The most recently pressed key still active.
    pub fn last(&self) -> Option<KeyId> {
        self.order.last().copied()
    }

    /// Active keys from oldest to newest.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = KeyId> + '_ {
        self.order.iter().copied()
    }

    /// Number of active keys.
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Returns `true` if no key is active.
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Returns `true` if `id` is active.
    pub fn contains(&self, id: KeyId) -> bool {
        self.order.contains(&id)
    }

    pub(crate) fn push_back(&mut self, id: KeyId) {
        self.remove(id);
        self.order.push(id);
    }

    pub(crate) fn push_front(&mut self, id: KeyId) {
        self.remove(id);
        self.order.insert(0, id);
    }

    pub(crate) fn remove(&mut self, id: KeyId) {
        self.order.retain(|k| *k != id);
    }

    pub(crate) fn snapshot(&self) -> SmallVec<[KeyId; 8]> {
        self.order.clone()
    }
}
