// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Dead-key composition over a [`KeySet`].

use understory_kbd_binding::Accent;
use understory_kbd_state::{KeyCapabilities, KeyId, KeySet};

/// What a click did to the dead-key lock.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum DeadKeyChange {
    /// Nothing changed.
    Unchanged,
    /// A dead key got locked.
    Locked(KeyId),
    /// The locked dead key got unlocked.
    Unlocked(KeyId),
    /// The lock moved from one dead key to another.
    Swapped {
        /// Previously locked key.
        from: KeyId,
        /// Newly locked key.
        to: KeyId,
    },
}

impl DeadKeyChange {
    /// Whether the accent shown on the keys must be recomputed.
    pub fn changed(self) -> bool {
        self != Self::Unchanged
    }
}

/// Tracks the single locked dead key.
///
/// Locking selects the dead key in the [`KeySet`], which keeps it in the
/// active-key registry without making it the last active key. While locked,
/// the key's [`Accent`] applies to every clicked letter.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct DeadKeyLock {
    locked: Option<KeyId>,
}

impl DeadKeyLock {
    /// No dead key locked.
    pub fn new() -> Self {
        Self::default()
    }

    /// The locked dead key.
    pub fn locked(&self) -> Option<KeyId> {
        self.locked
    }

    /// The accent of the locked dead key.
    pub fn accent(&self, keys: &KeySet) -> Option<Accent> {
        let key = keys.get(self.locked?)?;
        Accent::from_dead_key(key.binding())
    }

    /// Handles a click on dead key `key`.
    ///
    /// Clicking the locked key again unlocks it; clicking another dead key
    /// swaps the lock.
    pub fn on_dead_key_clicked(&mut self, keys: &mut KeySet, key: KeyId) -> DeadKeyChange {
        let change = match self.locked {
            Some(locked) if locked == key => {
                keys.set_selected(key, false);
                self.locked = None;
                DeadKeyChange::Unlocked(key)
            }
            Some(from) => {
                keys.set_selected(key, true);
                self.locked = Some(key);
                DeadKeyChange::Swapped { from, to: key }
            }
            None => {
                keys.set_selected(key, true);
                self.locked = Some(key);
                DeadKeyChange::Locked(key)
            }
        };
        tracing::debug!(?change, "dead key clicked");
        change
    }

    /// Handles a click on any other key: everything but shift unlocks.
    pub fn on_key_clicked(&mut self, keys: &mut KeySet, key: KeyId) -> DeadKeyChange {
        if keys.capabilities(key).contains(KeyCapabilities::SHIFT) {
            return DeadKeyChange::Unchanged;
        }
        match self.locked.take() {
            Some(locked) => {
                keys.set_selected(locked, false);
                tracing::debug!(?locked, "dead key released by click");
                DeadKeyChange::Unlocked(locked)
            }
            None => DeadKeyChange::Unchanged,
        }
    }

    /// Re-reads the lock from `keys` after an external reset.
    pub fn sync(&mut self, keys: &KeySet) -> DeadKeyChange {
        let now = keys.special_keys().dead;
        match (self.locked, now) {
            (Some(old), None) => {
                self.locked = None;
                DeadKeyChange::Unlocked(old)
            }
            (None, Some(new)) => {
                self.locked = Some(new);
                DeadKeyChange::Locked(new)
            }
            (Some(old), Some(new)) if old != new => {
                self.locked = Some(new);
                DeadKeyChange::Swapped { from: old, to: new }
            }
            _ => DeadKeyChange::Unchanged,
        }
    }
}
