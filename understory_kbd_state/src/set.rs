// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! [`KeySet`]: the arena of key instances plus the active-key registry.

use alloc::sync::Arc;
use alloc::vec::Vec;
use core::fmt;

use understory_kbd_binding::Accent;
use understory_kbd_layout::{Binding, Key};

use crate::instance::{KeyInstance, MAX_TOUCH_POINTS};
use crate::registry::ActiveKeyRegistry;
use crate::types::{
    KeyCapabilities, KeyId, KeyOverride, KeyState, ResetOutcome, ResetPolicy, SpecialKeys,
};

/// Owns every [`KeyInstance`] of a session and the shared [`ActiveKeyRegistry`].
///
/// All touch points, across all key areas, mutate key state through one
/// `KeySet`, which keeps these invariants:
///
/// - `0 <= touch_point_count <= 20`.
/// - A key with a touch count above zero is in the registry.
/// - A key leaves the registry only when it is neither pressed nor selected.
/// - At most one dead key is selected.
///
/// ```
/// use std::sync::Arc;
/// use understory_kbd_layout::{Action, Binding, Key};
/// use understory_kbd_state::{KeySet, KeyState};
///
/// let mut keys = KeySet::new();
/// let a = keys.insert(Arc::new(Key::single(Binding::new(Action::Insert, "a"))));
///
/// assert!(keys.increase_touch_point_count(a));
/// assert_eq!(keys.get(a).unwrap().state(), KeyState::Pressed);
/// assert_eq!(keys.last_active_key(), Some(a));
///
/// assert!(keys.decrease_touch_point_count(a));
/// assert_eq!(keys.last_active_key(), None);
/// assert!(!keys.decrease_touch_point_count(a), "underflow is refused");
/// ```
#[derive(Clone, Default)]
pub struct KeySet {
    /// slots
    slots: Vec<Option<KeyInstance>>,
    /// last generation per slot (persists across frees)
    generations: Vec<u32>,
    free_list: Vec<usize>,
    registry: ActiveKeyRegistry,
}

impl fmt::Debug for KeySet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let alive = self.slots.iter().filter(|s| s.is_some()).count();
        f.debug_struct("KeySet")
            .field("keys_total", &self.slots.len())
            .field("keys_alive", &alive)
            .field("free_list", &self.free_list.len())
            .field("registry", &self.registry)
            .finish_non_exhaustive()
    }
}

impl KeySet {
    /// Creates an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an instance of `key` and returns its id.
    pub fn insert(&mut self, key: Arc<Key>) -> KeyId {
        let instance = KeyInstance::new(key);
        let (idx, generation) = if let Some(idx) = self.free_list.pop() {
            let generation = self.generations[idx].saturating_add(1);
            self.generations[idx] = generation;
            self.slots[idx] = Some(instance);
            (idx, generation)
        } else {
            self.slots.push(Some(instance));
            self.generations.push(1);
            (self.slots.len() - 1, 1)
        };
        #[allow(
            clippy::cast_possible_truncation,
            reason = "KeyId uses 32-bit indices; a keyboard never has 2^32 keys."
        )]
        let idx = idx as u32;
        KeyId::new(idx, generation)
    }

    /// Removes an instance. Stale ids are ignored.
    pub fn remove(&mut self, id: KeyId) -> Option<KeyInstance> {
        if !self.is_alive(id) {
            return None;
        }
        self.registry.remove(id);
        self.free_list.push(id.idx());
        self.slots[id.idx()].take()
    }

    /// Returns true if `id` refers to a live instance.
    pub fn is_alive(&self, id: KeyId) -> bool {
        self.generations.get(id.idx()) == Some(&id.1)
            && self.slots.get(id.idx()).is_some_and(Option::is_some)
    }

    /// The instance for `id`, if live.
    pub fn get(&self, id: KeyId) -> Option<&KeyInstance> {
        if !self.is_alive(id) {
            return None;
        }
        self.slots[id.idx()].as_ref()
    }

    fn get_mut(&mut self, id: KeyId) -> Option<&mut KeyInstance> {
        if !self.is_alive(id) {
            return None;
        }
        self.slots[id.idx()].as_mut()
    }

    /// All live instances.
    pub fn iter(&self) -> impl Iterator<Item = (KeyId, &KeyInstance)> + '_ {
        self.slots.iter().enumerate().filter_map(|(idx, slot)| {
            let key = slot.as_ref()?;
            #[allow(
                clippy::cast_possible_truncation,
                reason = "Slots are only created through insert, which fits u32."
            )]
            let id = KeyId::new(idx as u32, self.generations[idx]);
            Some((id, key))
        })
    }

    /// The registry of pressed and selected keys.
    pub fn registry(&self) -> &ActiveKeyRegistry {
        &self.registry
    }

    /// The most recently pressed key still active, if any.
    pub fn last_active_key(&self) -> Option<KeyId> {
        self.registry.last()
    }

    /// Adds a touch point to `id`.
    ///
    /// Returns `false` without changing anything if the key is stale,
    /// disabled, or already at [`MAX_TOUCH_POINTS`].
    pub fn increase_touch_point_count(&mut self, id: KeyId) -> bool {
        let Some(key) = self.get_mut(id) else {
            return false;
        };
        if key.state == KeyState::Disabled || key.touch_count >= MAX_TOUCH_POINTS {
            return false;
        }
        key.touch_count += 1;
        if key.touch_count == 1 {
            self.refresh(id);
        }
        true
    }

    /// Removes a touch point from `id`. Returns `false` if the count is already zero.
    pub fn decrease_touch_point_count(&mut self, id: KeyId) -> bool {
        let Some(key) = self.get_mut(id) else {
            return false;
        };
        if key.touch_count == 0 {
            return false;
        }
        key.touch_count -= 1;
        if key.touch_count == 0 {
            self.refresh(id);
        }
        true
    }

    /// Drops every touch point on `id`.
    pub fn reset_touch_point_count(&mut self, id: KeyId) {
        if let Some(key) = self.get_mut(id) {
            if key.touch_count > 0 {
                key.touch_count = 0;
                self.refresh(id);
            }
        }
    }

    /// Locks or unlocks `id`.
    ///
    /// Locking a dead key unlocks any other locked dead key.
    pub fn set_selected(&mut self, id: KeyId, selected: bool) {
        if !self.is_alive(id) {
            return;
        }
        if selected && self.capabilities(id).contains(KeyCapabilities::DEAD) {
            let others: Vec<KeyId> = self
                .registry
                .iter()
                .filter(|&other| {
                    other != id
                        && self.capabilities(other).contains(KeyCapabilities::DEAD)
                        && self.get(other).is_some_and(KeyInstance::is_selected)
                })
                .collect();
            for other in others {
                self.set_selected(other, false);
            }
        }
        if let Some(key) = self.get_mut(id) {
            key.selected = selected;
        }
        self.refresh(id);
    }

    /// Turns gravity hysteresis on for `id`. It turns off when the key returns to Normal.
    pub fn activate_gravity(&mut self, id: KeyId) {
        if let Some(key) = self.get_mut(id) {
            key.gravity = true;
        }
    }

    /// Sets the shift level and accent `id` shows, recomputing its label.
    pub fn set_modifiers(&mut self, id: KeyId, shift: bool, accent: Option<&Accent>) {
        if let Some(key) = self.get_mut(id) {
            key.shift = shift;
            key.accent = accent.cloned();
            key.relabel();
        }
    }

    /// Sets whether a composition is in progress, which changes compose key labels.
    pub fn set_composing(&mut self, id: KeyId, composing: bool) {
        if let Some(key) = self.get_mut(id) {
            key.composing = composing;
            key.relabel();
        }
    }

    /// Substitutes (or restores, with `None`) one level's binding.
    pub fn set_binding_override(&mut self, id: KeyId, shift: bool, binding: Option<Binding>) {
        if let Some(key) = self.get_mut(id) {
            key.bindings.set(shift, binding);
            key.relabel();
        }
    }

    /// Sets or clears the presentation override of `id`.
    ///
    /// Disabling a key drops its touch points first. Returns `true` if the key
    /// was pressed and got released this way.
    pub fn set_override(&mut self, id: KeyId, presentation: Option<KeyOverride>) -> bool {
        let enabled = presentation.as_ref().is_none_or(|o| o.enabled);
        let Some(key) = self.get_mut(id) else {
            return false;
        };
        let was_pressed = key.touch_count > 0;
        key.presentation = presentation;

        if enabled {
            if key.state == KeyState::Disabled {
                key.state = KeyState::Normal;
                self.refresh(id);
            }
            return false;
        }
        if key.state == KeyState::Disabled {
            return false;
        }
        key.touch_count = 0;
        key.selected = false;
        self.refresh(id);
        if let Some(key) = self.get_mut(id) {
            key.state = KeyState::Disabled;
        }
        was_pressed
    }

    /// The role `id` plays at its current level (empty for stale ids).
    pub fn capabilities(&self, id: KeyId) -> KeyCapabilities {
        self.get(id)
            .map(KeyInstance::capabilities)
            .unwrap_or_default()
    }

    /// Active keys from oldest to newest.
    pub fn active_keys(&self) -> impl DoubleEndedIterator<Item = KeyId> + '_ {
        self.registry.iter()
    }

    /// The first active key, oldest first, matching `pred`.
    pub fn find_active(&self, mut pred: impl FnMut(KeyId, &KeyInstance) -> bool) -> Option<KeyId> {
        self.registry
            .iter()
            .find(|&id| self.get(id).is_some_and(|k| pred(id, k)))
    }

    /// The active shift key and the locked dead key, scanning at most once.
    pub fn special_keys(&self) -> SpecialKeys {
        let mut found = SpecialKeys::default();
        for id in self.registry.iter() {
            let Some(key) = self.get(id) else {
                continue;
            };
            let caps = key.capabilities();
            if found.shift.is_none() && caps.contains(KeyCapabilities::SHIFT) {
                found.shift = Some(id);
            }
            if found.dead.is_none() && caps.contains(KeyCapabilities::DEAD) && key.is_selected()
            {
                found.dead = Some(id);
            }
            if found.shift.is_some() && found.dead.is_some() {
                break;
            }
        }
        found
    }

    /// Clears the registry according to `policy`.
    ///
    /// No key is clicked or released as a side effect; callers decide what,
    /// if anything, to tell the presentation layer.
    pub fn reset_active_keys(&mut self, policy: ResetPolicy) -> ResetOutcome {
        let mut outcome = ResetOutcome::default();
        for id in self.registry.snapshot() {
            let Some(key) = self.get(id) else {
                self.registry.remove(id);
                continue;
            };
            let caps = key.capabilities();
            let caps_locked = caps.contains(KeyCapabilities::SHIFT)
                && key.is_selected()
                && key.touch_point_count() == 0;
            if policy == ResetPolicy::PreserveCapsLock && caps_locked {
                outcome.caps_locked = Some(id);
                continue;
            }
            if caps.contains(KeyCapabilities::DEAD) && key.is_selected() {
                outcome.unlocked_dead_key = Some(id);
            }
            if let Some(key) = self.get_mut(id) {
                key.touch_count = 0;
                key.selected = false;
            }
            self.refresh(id);
            outcome.cleared += 1;
        }
        tracing::debug!(?policy, ?outcome, "reset active keys");
        outcome
    }

    /// Recomputes the state of `id` from its touch count and selection and
    /// keeps the registry in step.
    fn refresh(&mut self, id: KeyId) {
        let Some(key) = self.slots[id.idx()].as_mut() else {
            return;
        };
        if key.state == KeyState::Disabled {
            return;
        }
        let old = key.state;
        let new = if key.touch_count > 0 {
            KeyState::Pressed
        } else if key.selected {
            KeyState::Selected
        } else {
            KeyState::Normal
        };
        if old == new {
            return;
        }
        key.state = new;
        match new {
            KeyState::Pressed => self.registry.push_back(id),
            KeyState::Normal => {
                key.gravity = false;
                self.registry.remove(id);
            }
            KeyState::Selected if old == KeyState::Normal => self.registry.push_front(id),
            KeyState::Selected | KeyState::Disabled => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use understory_kbd_layout::{Action, BindingFlags};

    fn letter(keys: &mut KeySet, label: &str) -> KeyId {
        keys.insert(Arc::new(Key::single(Binding::new(Action::Insert, label))))
    }

    fn dead(keys: &mut KeySet, label: &str) -> KeyId {
        keys.insert(Arc::new(Key::single(
            Binding::new(Action::Insert, label).with_flags(BindingFlags::DEAD),
        )))
    }

    fn shift(keys: &mut KeySet) -> KeyId {
        keys.insert(Arc::new(Key::single(Binding::new(Action::Shift, ""))))
    }

    #[test]
    fn twenty_first_increase_fails() {
        let mut keys = KeySet::new();
        let a = letter(&mut keys, "a");
        for n in 0..20 {
            assert!(keys.increase_touch_point_count(a), "increase {n} succeeds");
        }
        assert!(!keys.increase_touch_point_count(a), "21st increase fails");
        assert_eq!(keys.get(a).unwrap().touch_point_count(), 20);
    }

    #[test]
    fn registry_tracks_press_order() {
        let mut keys = KeySet::new();
        let a = letter(&mut keys, "a");
        let b = letter(&mut keys, "b");
        keys.increase_touch_point_count(a);
        keys.increase_touch_point_count(b);
        assert_eq!(keys.last_active_key(), Some(b));
        assert_eq!(keys.active_keys().collect::<Vec<_>>(), [a, b]);

        // A second touch on `a` is not a new press.
        keys.increase_touch_point_count(a);
        assert_eq!(keys.last_active_key(), Some(b));

        keys.decrease_touch_point_count(b);
        assert_eq!(keys.last_active_key(), Some(a));
        keys.decrease_touch_point_count(a);
        assert_eq!(keys.last_active_key(), Some(a), "one touch remains on a");
        keys.decrease_touch_point_count(a);
        assert_eq!(keys.last_active_key(), None);
        assert!(keys.registry().is_empty());
    }

    #[test]
    fn locking_an_idle_key_never_becomes_last_active() {
        let mut keys = KeySet::new();
        let a = letter(&mut keys, "a");
        let acute = dead(&mut keys, "´");
        keys.increase_touch_point_count(a);
        keys.set_selected(acute, true);
        assert_eq!(keys.last_active_key(), Some(a));
        assert_eq!(keys.get(acute).unwrap().state(), KeyState::Selected);

        keys.decrease_touch_point_count(a);
        assert_eq!(keys.last_active_key(), Some(acute), "locked key stays active");
        keys.set_selected(acute, false);
        assert_eq!(keys.last_active_key(), None);
    }

    #[test]
    fn selected_key_survives_release() {
        let mut keys = KeySet::new();
        let acute = dead(&mut keys, "´");
        keys.increase_touch_point_count(acute);
        keys.set_selected(acute, true);
        keys.decrease_touch_point_count(acute);
        assert_eq!(keys.get(acute).unwrap().state(), KeyState::Selected);
        assert!(keys.registry().contains(acute));
    }

    #[test]
    fn only_one_dead_key_is_selected() {
        let mut keys = KeySet::new();
        let acute = dead(&mut keys, "´");
        let grave = dead(&mut keys, "`");
        keys.set_selected(acute, true);
        keys.set_selected(grave, true);
        assert!(!keys.get(acute).unwrap().is_selected());
        assert_eq!(keys.special_keys().dead, Some(grave));
    }

    #[test]
    fn gravity_clears_when_key_goes_normal() {
        let mut keys = KeySet::new();
        let a = letter(&mut keys, "a");
        keys.increase_touch_point_count(a);
        keys.activate_gravity(a);
        assert!(keys.get(a).unwrap().has_gravity());
        keys.decrease_touch_point_count(a);
        assert!(!keys.get(a).unwrap().has_gravity());
    }

    #[test]
    fn reset_policies_differ_on_caps_lock() {
        let mut keys = KeySet::new();
        let caps = shift(&mut keys);
        let a = letter(&mut keys, "a");
        let acute = dead(&mut keys, "´");

        let setup = |keys: &mut KeySet| {
            keys.set_selected(caps, true);
            keys.set_selected(acute, true);
            keys.increase_touch_point_count(a);
            keys.increase_touch_point_count(a);
        };

        setup(&mut keys);
        let outcome = keys.reset_active_keys(ResetPolicy::PreserveCapsLock);
        assert_eq!(outcome.caps_locked, Some(caps));
        assert_eq!(outcome.unlocked_dead_key, Some(acute));
        assert_eq!(outcome.cleared, 2);
        assert_eq!(keys.active_keys().collect::<Vec<_>>(), [caps]);
        assert_eq!(keys.get(a).unwrap().touch_point_count(), 0);

        setup(&mut keys);
        let outcome = keys.reset_active_keys(ResetPolicy::ClearAll);
        assert_eq!(outcome.caps_locked, None);
        assert!(keys.registry().is_empty());
        assert!(!keys.get(caps).unwrap().is_selected());
    }

    #[test]
    fn disabling_a_pressed_key_releases_it() {
        let mut keys = KeySet::new();
        let a = letter(&mut keys, "a");
        keys.increase_touch_point_count(a);
        let disabled = KeyOverride {
            enabled: false,
            ..KeyOverride::default()
        };
        assert!(keys.set_override(a, Some(disabled)));
        assert_eq!(keys.get(a).unwrap().state(), KeyState::Disabled);
        assert!(keys.registry().is_empty());
        assert!(!keys.increase_touch_point_count(a), "disabled keys take no touches");

        assert!(!keys.set_override(a, None));
        assert_eq!(keys.get(a).unwrap().state(), KeyState::Normal);
        assert!(keys.increase_touch_point_count(a));
    }

    #[test]
    fn override_label_wins() {
        let mut keys = KeySet::new();
        let a = letter(&mut keys, "a");
        keys.set_override(
            a,
            Some(KeyOverride {
                label: Some("Go".into()),
                ..KeyOverride::default()
            }),
        );
        assert_eq!(keys.get(a).unwrap().label(), "Go");
    }

    #[test]
    fn modifiers_relabel() {
        let mut keys = KeySet::new();
        let e = keys.insert(Arc::new(Key::new(
            Binding::new(Action::Insert, "e").with_accents("´", "é"),
            Binding::new(Action::Insert, "E").with_accents("´", "É"),
        )));
        keys.set_modifiers(e, true, Some(&Accent::new('´')));
        assert_eq!(keys.get(e).unwrap().label(), "É");
        keys.set_modifiers(e, false, None);
        assert_eq!(keys.get(e).unwrap().label(), "e");
    }

    #[test]
    fn stale_ids_are_rejected() {
        let mut keys = KeySet::new();
        let a = letter(&mut keys, "a");
        keys.increase_touch_point_count(a);
        assert!(keys.remove(a).is_some());
        assert!(keys.registry().is_empty(), "removal leaves the registry");

        let b = letter(&mut keys, "b");
        assert_ne!(a, b, "slot reuse bumps the generation");
        assert!(keys.get(a).is_none());
        assert!(!keys.increase_touch_point_count(a));
        assert_eq!(keys.iter().count(), 1);
    }
}
