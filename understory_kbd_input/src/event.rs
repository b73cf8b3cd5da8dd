// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Key events delivered to the input context.

use alloc::string::String;

use understory_kbd_binding::{KeyCode, Resolved, SpecialKey};
use understory_kbd_state::KeyId;

bitflags::bitflags! {
    /// Modifiers in effect for a key event.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct Modifiers: u8 {
        /// Shift is latched, locked, or held.
        const SHIFT = 1 << 0;
        /// Fn is latched or locked.
        const FN = 1 << 1;
    }
}

/// What happened to the key.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum KeyEventKind {
    /// The key got its first touch.
    Press,
    /// The key lost its last touch.
    Release,
    /// The key was clicked.
    Click,
    /// The key was held past the long-press timeout.
    LongPress,
}

/// A key event as the input context sees it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct KeyEvent {
    /// What happened.
    pub kind: KeyEventKind,
    /// Text carried by the event.
    pub text: String,
    /// Key code.
    pub key_code: KeyCode,
    /// Special kind, [`SpecialKey::NotSpecial`] for ordinary keys.
    pub special: SpecialKey,
    /// Modifiers in effect.
    pub modifiers: Modifiers,
    /// The key that produced the event, `None` for synthesized events.
    pub origin: Option<KeyId>,
}

impl KeyEvent {
    /// Builds an event from a resolved key.
    pub fn from_resolved(
        kind: KeyEventKind,
        resolved: Resolved,
        modifiers: Modifiers,
        origin: Option<KeyId>,
    ) -> Self {
        Self {
            kind,
            text: resolved.event.text,
            key_code: resolved.event.key_code,
            special: resolved.event.special,
            modifiers,
            origin,
        }
    }

    /// A synthesized backspace click.
    pub fn backspace(origin: Option<KeyId>) -> Self {
        Self {
            kind: KeyEventKind::Click,
            text: String::from("\u{8}"),
            key_code: KeyCode::Backspace,
            special: SpecialKey::NotSpecial,
            modifiers: Modifiers::empty(),
            origin,
        }
    }

    /// Whether this is an arrow key.
    pub fn is_arrow(&self) -> bool {
        matches!(
            self.key_code,
            KeyCode::Left | KeyCode::Up | KeyCode::Right | KeyCode::Down
        )
    }
}
