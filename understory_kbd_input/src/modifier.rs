// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Latched and locked modifiers.

/// Persistent state of a modifier.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum ModifierState {
    /// Off.
    #[default]
    Clear,
    /// On for the next key click only.
    Latched,
    /// On until clicked again (caps lock).
    Locked,
}

impl ModifierState {
    /// Whether the modifier currently applies.
    pub fn is_active(self) -> bool {
        self != Self::Clear
    }
}

/// A modifier that cycles `Clear → Latched → Locked → Clear` on clicks.
///
/// Whether the modifier key is physically held is tracked separately from the
/// persistent state, so holding it while clicking another key does not move
/// the cycle. Auto-capitalization may latch the modifier as well; such a latch
/// is remembered, and clicking the modifier while it is in effect goes back to
/// `Clear` rather than on to `Locked`.
///
/// ```
/// use understory_kbd_input::{ModifierLatch, ModifierState};
///
/// let mut shift = ModifierLatch::new();
/// assert_eq!(shift.click(), ModifierState::Latched);
/// assert_eq!(shift.click(), ModifierState::Locked);
/// assert_eq!(shift.click(), ModifierState::Clear);
/// ```
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct ModifierLatch {
    state: ModifierState,
    held: bool,
    auto_latched: bool,
}

impl ModifierLatch {
    /// A clear, released modifier.
    pub fn new() -> Self {
        Self::default()
    }

    /// Persistent state.
    pub fn state(&self) -> ModifierState {
        self.state
    }

    /// Whether the modifier key is physically down.
    pub fn is_held(&self) -> bool {
        self.held
    }

    /// Whether the modifier applies to the next click, latched, locked, or held.
    pub fn is_active(&self) -> bool {
        self.held || self.state.is_active()
    }

    /// Whether the current latch came from auto-capitalization.
    pub fn is_auto_latched(&self) -> bool {
        self.auto_latched
    }

    /// Records the modifier key going down or up.
    pub fn set_held(&mut self, held: bool) {
        self.held = held;
    }

    /// Advances the click cycle and returns the new state.
    pub fn click(&mut self) -> ModifierState {
        self.state = match self.state {
            ModifierState::Clear => ModifierState::Latched,
            ModifierState::Latched if self.auto_latched => ModifierState::Clear,
            ModifierState::Latched => ModifierState::Locked,
            ModifierState::Locked => ModifierState::Clear,
        };
        self.auto_latched = false;
        tracing::debug!(state = ?self.state, "modifier clicked");
        self.state
    }

    /// Sets the state directly. Returns `true` if it changed.
    pub fn set_state(&mut self, state: ModifierState) -> bool {
        if state == ModifierState::Clear {
            self.auto_latched = false;
        }
        let changed = self.state != state;
        self.state = state;
        changed
    }

    /// Drops a latch after it has been applied to a click.
    ///
    /// A locked modifier is unaffected. Returns `true` if the state changed.
    pub fn consume(&mut self) -> bool {
        if self.state == ModifierState::Latched {
            self.set_state(ModifierState::Clear)
        } else {
            false
        }
    }

    /// Feeds the auto-capitalization result for the current cursor position.
    ///
    /// Never touches a locked modifier. A manual latch survives as long as the
    /// cursor did not move. Otherwise the modifier is latched if `triggered`
    /// or held, and cleared if not. Returns `true` if the state changed.
    pub fn apply_auto_caps(&mut self, triggered: bool, cursor_moved: bool) -> bool {
        match self.state {
            ModifierState::Locked => false,
            ModifierState::Latched if !cursor_moved => {
                self.auto_latched |= triggered;
                false
            }
            _ => {
                let state = if triggered || self.held {
                    ModifierState::Latched
                } else {
                    ModifierState::Clear
                };
                let changed = self.set_state(state);
                self.auto_latched = triggered;
                changed
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn three_clicks_return_to_clear() {
        let mut shift = ModifierLatch::new();
        shift.click();
        shift.click();
        assert_eq!(shift.click(), ModifierState::Clear);
    }

    #[test]
    fn click_on_auto_latch_clears() {
        let mut shift = ModifierLatch::new();
        assert!(shift.apply_auto_caps(true, true));
        assert!(shift.is_auto_latched());
        assert_eq!(shift.click(), ModifierState::Clear, "auto latch does not lock");
        assert_eq!(shift.click(), ModifierState::Latched);
        assert_eq!(shift.click(), ModifierState::Locked);
    }

    #[test]
    fn auto_caps_never_overrides_lock() {
        let mut shift = ModifierLatch::new();
        shift.set_state(ModifierState::Locked);
        assert!(!shift.apply_auto_caps(false, true));
        assert!(!shift.apply_auto_caps(true, true));
        assert_eq!(shift.state(), ModifierState::Locked);
    }

    #[test]
    fn manual_latch_survives_when_cursor_stays() {
        let mut shift = ModifierLatch::new();
        shift.click();
        assert!(!shift.apply_auto_caps(false, false));
        assert_eq!(shift.state(), ModifierState::Latched);
        assert!(shift.apply_auto_caps(false, true));
        assert_eq!(shift.state(), ModifierState::Clear);
    }

    #[test]
    fn held_modifier_is_active_without_state_change() {
        let mut shift = ModifierLatch::new();
        shift.set_held(true);
        assert!(shift.is_active());
        assert_eq!(shift.state(), ModifierState::Clear);
        assert!(!shift.consume(), "clear stays clear");

        shift.set_state(ModifierState::Locked);
        assert!(!shift.consume(), "locks are not consumed");
    }
}
