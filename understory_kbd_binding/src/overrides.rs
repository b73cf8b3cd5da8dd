// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Runtime substitution of a key's bindings.

use understory_kbd_layout::{Binding, Key};

use crate::{Accent, Resolved, resolve_binding};

/// Per-level binding substitutes for one key instance.
///
/// Each level is independent; clearing a level restores the key's own binding.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BindingOverrides {
    slots: [Option<Binding>; 2],
}

impl BindingOverrides {
    /// Sets or clears (`None`) the substitute for one shift level.
    pub fn set(&mut self, shift: bool, binding: Option<Binding>) {
        self.slots[usize::from(shift)] = binding;
    }

    /// Returns `true` if neither level is overridden.
    pub fn is_empty(&self) -> bool {
        self.slots.iter().all(Option::is_none)
    }

    /// The effective binding of `key` at the given level.
    pub fn binding<'a>(&'a self, key: &'a Key, shift: bool) -> &'a Binding {
        self.slots[usize::from(shift)]
            .as_ref()
            .unwrap_or_else(|| key.binding(shift))
    }

    /// Like [`resolve`](crate::resolve), honoring the overrides.
    pub fn resolve(
        &self,
        key: &Key,
        shift: bool,
        accent: Option<&Accent>,
        composing: bool,
    ) -> Resolved {
        resolve_binding(self.binding(key, shift), accent, composing)
    }
}
