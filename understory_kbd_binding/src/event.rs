// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Event templates produced by a resolved binding.

use alloc::string::String;
use understory_kbd_layout::{Action, Binding};

/// Key code of an emitted event.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum KeyCode {
    /// No key code (special events, empty labels).
    #[default]
    Unknown,
    /// Shift.
    Shift,
    /// Space bar.
    Space,
    /// Backspace.
    Backspace,
    /// Return / enter.
    Return,
    /// Tab.
    Tab,
    /// Arrow left.
    Left,
    /// Arrow up.
    Up,
    /// Arrow right.
    Right,
    /// Arrow down.
    Down,
    /// A character key, identified by the first character of its text.
    Char(char),
}

/// Events that are not plain key presses and need host handling.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum SpecialKey {
    /// An ordinary key event.
    #[default]
    NotSpecial,
    /// Open the layout menu.
    LayoutMenu,
    /// Rotate a multitap cycle set; the event text is the set.
    CycleSet,
    /// Toggle the symbol view.
    Sym,
    /// Commit the preedit.
    Commit,
    /// Switch keyboards.
    Switch,
    /// Toggle the input method.
    OnOffToggle,
    /// Toggle a number's sign.
    ChangeSign,
}

/// Text, key code, and special kind of the event a binding produces.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EventTemplate {
    /// Text to insert or deliver with the key event.
    pub text: String,
    /// Key code.
    pub key_code: KeyCode,
    /// Special kind.
    pub special: SpecialKey,
}

impl EventTemplate {
    fn key(key_code: KeyCode, text: &str) -> Self {
        Self {
            text: String::from(text),
            key_code,
            special: SpecialKey::NotSpecial,
        }
    }

    fn special(special: SpecialKey) -> Self {
        Self {
            text: String::new(),
            key_code: KeyCode::Unknown,
            special,
        }
    }

    /// The template for `binding`, whose resolved label is `label`.
    pub(crate) fn for_action(binding: &Binding, label: &str, composing: bool) -> Self {
        match binding.action {
            Action::Insert | Action::DecimalSeparator => Self::key(
                label.chars().next().map_or(KeyCode::Unknown, KeyCode::Char),
                label,
            ),
            Action::Shift => Self::key(KeyCode::Shift, ""),
            Action::Space => Self::key(KeyCode::Space, " "),
            Action::Backspace => Self::key(KeyCode::Backspace, "\u{8}"),
            Action::Return => Self::key(KeyCode::Return, "\r"),
            Action::Tab => Self::key(KeyCode::Tab, "\t"),
            Action::Left => Self::key(KeyCode::Left, ""),
            Action::Up => Self::key(KeyCode::Up, ""),
            Action::Right => Self::key(KeyCode::Right, ""),
            Action::Down => Self::key(KeyCode::Down, ""),
            Action::Cycle => Self {
                text: binding.cycle_set.clone(),
                ..Self::special(SpecialKey::CycleSet)
            },
            Action::LayoutMenu => Self::special(SpecialKey::LayoutMenu),
            Action::Sym => Self::special(SpecialKey::Sym),
            Action::Commit => Self::special(SpecialKey::Commit),
            Action::Switch => Self::special(SpecialKey::Switch),
            Action::OnOffToggle => Self::special(SpecialKey::OnOffToggle),
            Action::PlusMinusToggle => Self::special(SpecialKey::ChangeSign),
            Action::Compose if composing => Self::special(SpecialKey::Commit),
            Action::Compose => Self::key(KeyCode::Return, "\r"),
        }
    }
}
