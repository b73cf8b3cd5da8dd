// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The runtime wrapper around a layout key.

use alloc::string::String;
use alloc::sync::Arc;

use understory_kbd_binding::{Accent, BindingOverrides, Resolved};
use understory_kbd_layout::{Action, Binding, Key};

use crate::types::{KeyCapabilities, KeyOverride, KeyState};

/// Maximum number of touch points counted on one key.
pub const MAX_TOUCH_POINTS: u8 = 20;

/// Runtime state of one key of the active layout.
///
/// Instances are owned by a [`KeySet`](crate::KeySet) and mutated only through
/// it, so that the active-key registry always agrees with their state.
#[derive(Clone, Debug)]
pub struct KeyInstance {
    key: Arc<Key>,
    pub(crate) bindings: BindingOverrides,
    pub(crate) presentation: Option<KeyOverride>,
    pub(crate) state: KeyState,
    pub(crate) selected: bool,
    pub(crate) touch_count: u8,
    pub(crate) gravity: bool,
    pub(crate) shift: bool,
    pub(crate) accent: Option<Accent>,
    pub(crate) composing: bool,
    label: String,
}

impl KeyInstance {
    pub(crate) fn new(key: Arc<Key>) -> Self {
        let mut instance = Self {
            key,
            bindings: BindingOverrides::default(),
            presentation: None,
            state: KeyState::Normal,
            selected: false,
            touch_count: 0,
            gravity: false,
            shift: false,
            accent: None,
            composing: false,
            label: String::new(),
        };
        instance.relabel();
        instance
    }

    /// The layout key.
    pub fn key(&self) -> &Arc<Key> {
        &self.key
    }

    /// The key's stable id from the layout, if any.
    pub fn id(&self) -> Option<&str> {
        self.key.id.as_deref()
    }

    /// Current state.
    pub fn state(&self) -> KeyState {
        self.state
    }

    /// Whether the key is locked on.
    pub fn is_selected(&self) -> bool {
        self.selected
    }

    /// Number of touch points currently on the key.
    pub fn touch_point_count(&self) -> u8 {
        self.touch_count
    }

    /// Whether gravity hysteresis is active for this key.
    pub fn has_gravity(&self) -> bool {
        self.gravity
    }

    /// Whether the key reacts to touches.
    pub fn is_enabled(&self) -> bool {
        self.presentation.as_ref().is_none_or(|o| o.enabled)
    }

    /// The presentation override, if any.
    pub fn presentation(&self) -> Option<&KeyOverride> {
        self.presentation.as_ref()
    }

    /// The shift level the key is showing.
    pub fn shift(&self) -> bool {
        self.shift
    }

    /// The accent the key is showing, if any.
    pub fn accent(&self) -> Option<&Accent> {
        self.accent.as_ref()
    }

    /// The effective binding at the current shift level.
    pub fn binding(&self) -> &Binding {
        self.bindings.binding(&self.key, self.shift)
    }

    /// Label to display: the override label if set, else the resolved label.
    pub fn label(&self) -> &str {
        self.presentation
            .as_ref()
            .and_then(|o| o.label.as_deref())
            .unwrap_or(&self.label)
    }

    /// The role the key plays at its current level.
    pub fn capabilities(&self) -> KeyCapabilities {
        let binding = self.binding();
        let dead = binding.is_dead();
        let mut caps = KeyCapabilities::empty();
        caps.set(KeyCapabilities::DEAD, dead);
        if !dead {
            caps.set(KeyCapabilities::NORMAL, binding.action == Action::Insert);
            caps.set(KeyCapabilities::SHIFT, binding.action == Action::Shift);
        }
        caps.set(KeyCapabilities::BACKSPACE, binding.action == Action::Backspace);
        caps.set(KeyCapabilities::COMPOSE, binding.action == Action::Compose);
        caps.set(KeyCapabilities::SYM, binding.action == Action::Sym);
        caps
    }

    /// Resolves the key against its current modifiers.
    ///
    /// `upper_case` forces the shifted binding even if the key shows the
    /// unshifted one (shift held while clicking).
    pub fn resolve(&self, upper_case: bool) -> Resolved {
        self.bindings.resolve(
            &self.key,
            self.shift || upper_case,
            self.accent.as_ref(),
            self.composing,
        )
    }

    pub(crate) fn relabel(&mut self) {
        self.label = self
            .bindings
            .resolve(&self.key, self.shift, self.accent.as_ref(), self.composing)
            .label;
    }
}
