// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Public types: key identifiers, states, capabilities, overrides, and reset policies.

use alloc::string::String;

/// Identifier for a key instance in a [`KeySet`](crate::KeySet) (generational).
///
/// Identifiers of removed instances stay invalid even if their slot is reused.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct KeyId(pub(crate) u32, pub(crate) u32);

impl KeyId {
    pub(crate) const fn new(idx: u32, generation: u32) -> Self {
        Self(idx, generation)
    }

    pub(crate) const fn idx(self) -> usize {
        self.0 as usize
    }
}

/// Visible state of a key instance.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum KeyState {
    /// Idle.
    #[default]
    Normal,
    /// At least one touch point is on the key.
    Pressed,
    /// Locked on without a touch (dead key or caps lock).
    Selected,
    /// Does not react to touches.
    Disabled,
}

bitflags::bitflags! {
    /// What role a key plays at its current shift level.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct KeyCapabilities: u8 {
        /// Inserts text and is not dead.
        const NORMAL    = 0b0000_0001;
        /// A dead key.
        const DEAD      = 0b0000_0010;
        /// The shift key.
        const SHIFT     = 0b0000_0100;
        /// Backspace.
        const BACKSPACE = 0b0000_1000;
        /// The compose key.
        const COMPOSE   = 0b0001_0000;
        /// The symbol view toggle.
        const SYM       = 0b0010_0000;
    }
}

/// Host-provided presentation override for one key instance.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct KeyOverride {
    /// Replaces the label when set.
    pub label: Option<String>,
    /// Icon name for the presentation layer.
    pub icon: Option<String>,
    /// When `false` the key is [`KeyState::Disabled`].
    pub enabled: bool,
    /// Draw the key highlighted.
    pub highlighted: bool,
}

impl Default for KeyOverride {
    fn default() -> Self {
        Self {
            label: None,
            icon: None,
            enabled: true,
            highlighted: false,
        }
    }
}

/// How [`KeySet::reset_active_keys`](crate::KeySet::reset_active_keys) treats locked keys.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ResetPolicy {
    /// Clear every touch count and every Selected flag, including caps lock.
    ClearAll,
    /// Like `ClearAll`, but a Selected shift key (caps lock) stays locked.
    #[default]
    PreserveCapsLock,
}

/// What a reset left behind.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct ResetOutcome {
    /// The caps-locked shift key that was preserved, if any.
    pub caps_locked: Option<KeyId>,
    /// The dead key that was unlocked, if any.
    pub unlocked_dead_key: Option<KeyId>,
    /// Number of registry members that were cleared.
    pub cleared: usize,
}

/// Shift and dead keys found among the active keys.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct SpecialKeys {
    /// An active (pressed or locked) shift key.
    pub shift: Option<KeyId>,
    /// The locked dead key.
    pub dead: Option<KeyId>,
}
