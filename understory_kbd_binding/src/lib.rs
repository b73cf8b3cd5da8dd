// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Understory Keyboard Binding: turn a key plus modifier state into a label and an event template.
//!
//! [`resolve`] is a pure function of a [`Key`], the shift level, an optional
//! dead-key [`Accent`], and whether a composition is in progress. It never
//! mutates anything; the caller owns modifier state and cycle rotation.
//!
//! - The binding is chosen by the shift flag from the key's two bindings.
//! - With an accent, the binding's accent table is consulted positionally;
//!   a missing entry falls back to the plain label.
//! - Control actions map to key codes and default text
//!   (space → `" "`, backspace → `"\b"`, return → `"\r"`, tab → `"\t"`).
//!
//! ```
//! use understory_kbd_binding::{Accent, KeyCode, resolve};
//! use understory_kbd_layout::{Action, Binding, Key};
//!
//! let e = Key::new(
//!     Binding::new(Action::Insert, "e").with_accents("´`", "éè"),
//!     Binding::new(Action::Insert, "E").with_accents("´`", "ÉÈ"),
//! );
//!
//! let plain = resolve(&e, false, None, false);
//! assert_eq!(plain.label, "e");
//! assert_eq!(plain.event.key_code, KeyCode::Char('e'));
//!
//! let acute = Accent::new('´');
//! assert_eq!(resolve(&e, true, Some(&acute), false).event.text, "É");
//!
//! // Accents the key does not know leave the label alone.
//! assert_eq!(resolve(&e, false, Some(&Accent::new('^')), false).label, "e");
//! ```
//!
//! [`BindingOverrides`] lets a host substitute either level's binding at
//! runtime, for example to turn a key into `@` for email fields.
//!
//! This crate is `no_std` and uses `alloc`.

#![no_std]

extern crate alloc;

mod accent;
mod event;
mod overrides;

pub use accent::{Accent, accented_label};
pub use event::{EventTemplate, KeyCode, SpecialKey};
pub use overrides::BindingOverrides;

use alloc::string::String;
use understory_kbd_layout::{Action, Binding, Key};

/// The outcome of resolving a key against modifier state.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Resolved {
    /// Label to display, with the accent applied.
    pub label: String,
    /// The binding's action.
    pub action: Action,
    /// The event a click on this key produces.
    pub event: EventTemplate,
}

/// Resolves `key` at the given shift level and modifier state.
pub fn resolve(key: &Key, shift: bool, accent: Option<&Accent>, composing: bool) -> Resolved {
    resolve_binding(key.binding(shift), accent, composing)
}

/// Resolves a single binding. Used directly when a binding is overridden.
pub fn resolve_binding(binding: &Binding, accent: Option<&Accent>, composing: bool) -> Resolved {
    let label = match binding.action {
        // The compose key reads blank until a composition starts.
        Action::Compose if !composing => String::new(),
        _ => String::from(accented_label(binding, accent)),
    };
    let event = EventTemplate::for_action(binding, &label, composing);
    Resolved {
        label,
        action: binding.action,
        event,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use understory_kbd_layout::BindingFlags;

    fn key(action: Action, label: &str) -> Key {
        Key::single(Binding::new(action, label))
    }

    #[test]
    fn control_actions_have_default_text() {
        let cases = [
            (Action::Space, KeyCode::Space, " "),
            (Action::Backspace, KeyCode::Backspace, "\u{8}"),
            (Action::Return, KeyCode::Return, "\r"),
            (Action::Tab, KeyCode::Tab, "\t"),
        ];
        for (action, code, text) in cases {
            let r = resolve(&key(action, ""), false, None, false);
            assert_eq!(r.event.key_code, code, "{action:?}");
            assert_eq!(r.event.text, text, "{action:?}");
            assert_eq!(r.event.special, SpecialKey::NotSpecial, "{action:?}");
        }
    }

    #[test]
    fn cycle_returns_cycle_set() {
        let mut binding = Binding::new(Action::Cycle, "abc");
        binding.cycle_set = String::from("abc2");
        let r = resolve(&Key::single(binding), false, None, false);
        assert_eq!(r.event.special, SpecialKey::CycleSet);
        assert_eq!(r.event.text, "abc2");
    }

    #[test]
    fn compose_commits_only_while_composing() {
        let compose = key(Action::Compose, "ok");
        let idle = resolve(&compose, false, None, false);
        assert_eq!(idle.event.key_code, KeyCode::Return);
        assert_eq!(idle.event.text, "\r");
        assert_eq!(idle.label, "", "compose key is blank while idle");

        let busy = resolve(&compose, false, None, true);
        assert_eq!(busy.event.special, SpecialKey::Commit);
        assert_eq!(busy.label, "ok");
    }

    #[test]
    fn special_actions_map_to_special_kinds() {
        let cases = [
            (Action::LayoutMenu, SpecialKey::LayoutMenu),
            (Action::Sym, SpecialKey::Sym),
            (Action::Commit, SpecialKey::Commit),
            (Action::Switch, SpecialKey::Switch),
            (Action::OnOffToggle, SpecialKey::OnOffToggle),
            (Action::PlusMinusToggle, SpecialKey::ChangeSign),
        ];
        for (action, special) in cases {
            let r = resolve(&key(action, "x"), false, None, false);
            assert_eq!(r.event.special, special, "{action:?}");
        }
    }

    #[test]
    fn insert_uses_first_char_as_key_code() {
        let r = resolve(&key(Action::Insert, "ab"), false, None, false);
        assert_eq!(r.event.key_code, KeyCode::Char('a'));
        assert_eq!(r.event.text, "ab");

        let sep = resolve(&key(Action::DecimalSeparator, ","), false, None, false);
        assert_eq!(sep.event.key_code, KeyCode::Char(','));

        let empty = resolve(&key(Action::Insert, ""), false, None, false);
        assert_eq!(empty.event.key_code, KeyCode::Unknown);
    }

    #[test]
    fn shift_selects_precomputed_binding() {
        let k = Key::new(
            Binding::new(Action::Insert, "a"),
            Binding::new(Action::Shift, "").with_flags(BindingFlags::DEAD),
        );
        assert_eq!(resolve(&k, false, None, false).action, Action::Insert);
        assert_eq!(resolve(&k, true, None, false).action, Action::Shift);
    }

    #[test]
    fn arrows_resolve_to_arrow_codes() {
        let r = resolve(&key(Action::Left, "<"), false, None, false);
        assert_eq!(r.event.key_code, KeyCode::Left);
        assert!(r.event.text.is_empty());
    }
}
