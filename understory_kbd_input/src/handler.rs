// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Turns dispatcher events into [`KeyEvent`]s.

use understory_kbd_state::{KeyCapabilities, KeySet};
use understory_kbd_touch::KeyTouch;

use crate::event::{KeyEvent, KeyEventKind, Modifiers};

/// Converts [`KeyTouch`]es into key events and tracks a physically held shift.
///
/// While shift is down, pressing any other key marks the upcoming shift click
/// as ignored: the user used shift as a held modifier, so releasing it must not
/// also advance the latch cycle. The mark is consumed by exactly one shift
/// click.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct KeyEventHandler {
    shift_held: bool,
    ignore_shift_click: bool,
}

impl KeyEventHandler {
    /// A handler with shift up.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a shift key is physically down.
    pub fn shift_held(&self) -> bool {
        self.shift_held
    }

    /// Whether the next shift click will be swallowed.
    pub fn ignores_next_shift_click(&self) -> bool {
        self.ignore_shift_click
    }

    /// Handles a key getting its first touch.
    pub fn on_pressed(
        &mut self,
        keys: &KeySet,
        touch: &KeyTouch,
        modifiers: Modifiers,
    ) -> Option<KeyEvent> {
        if is_shift(keys, touch) {
            self.shift_held = true;
            self.ignore_shift_click = false;
        } else if self.shift_held {
            self.ignore_shift_click = true;
        }
        self.event(keys, touch, modifiers, KeyEventKind::Press)
    }

    /// Handles a key losing its last touch.
    pub fn on_released(
        &mut self,
        keys: &KeySet,
        touch: &KeyTouch,
        modifiers: Modifiers,
    ) -> Option<KeyEvent> {
        if is_shift(keys, touch) {
            self.shift_held = false;
        }
        self.event(keys, touch, modifiers, KeyEventKind::Release)
    }

    /// Handles a click. Returns `None` for a swallowed shift click.
    pub fn on_clicked(
        &mut self,
        keys: &KeySet,
        touch: &KeyTouch,
        modifiers: Modifiers,
    ) -> Option<KeyEvent> {
        if is_shift(keys, touch) && self.ignore_shift_click {
            self.ignore_shift_click = false;
            tracing::debug!(key = ?touch.key, "shift click swallowed after use as held modifier");
            return None;
        }
        self.event(keys, touch, modifiers, KeyEventKind::Click)
    }

    /// Handles a long press.
    pub fn on_long_pressed(
        &self,
        keys: &KeySet,
        touch: &KeyTouch,
        modifiers: Modifiers,
    ) -> Option<KeyEvent> {
        self.event(keys, touch, modifiers, KeyEventKind::LongPress)
    }

    /// Forgets held-shift bookkeeping.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    fn event(
        &self,
        keys: &KeySet,
        touch: &KeyTouch,
        modifiers: Modifiers,
        kind: KeyEventKind,
    ) -> Option<KeyEvent> {
        let key = keys.get(touch.key)?;
        let upper_case = touch.upper_case || self.shift_held;
        let mut modifiers = modifiers;
        modifiers.set(Modifiers::SHIFT, modifiers.contains(Modifiers::SHIFT) || upper_case);
        Some(KeyEvent::from_resolved(
            kind,
            key.resolve(upper_case),
            modifiers,
            Some(touch.key),
        ))
    }
}

fn is_shift(keys: &KeySet, touch: &KeyTouch) -> bool {
    keys.capabilities(touch.key).contains(KeyCapabilities::SHIFT)
}
