// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Dead-key accents and positional accent lookup.

use alloc::string::String;
use understory_kbd_layout::Binding;

/// An accent contributed by a locked dead key.
///
/// The accent is identified by its `mark`, normally the first character of the
/// dead key's label. A dead key may also carry its own table mapping base
/// letters to accented letters; that table is used when the clicked key's
/// binding has no entry for the mark.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Accent {
    mark: char,
    letters: String,
    accented: String,
}

impl Accent {
    /// An accent with no table of its own.
    pub fn new(mark: char) -> Self {
        Self {
            mark,
            letters: String::new(),
            accented: String::new(),
        }
    }

    /// The accent of a dead-key binding, or `None` if its label is empty.
    pub fn from_dead_key(binding: &Binding) -> Option<Self> {
        let mark = binding.label.chars().next()?;
        Some(Self {
            mark,
            letters: binding.accents.clone(),
            accented: binding.accented_labels.clone(),
        })
    }

    /// The accent character.
    pub fn mark(&self) -> char {
        self.mark
    }

    /// The accented form of `binding`'s label, if either table has one.
    pub fn apply<'a>(&'a self, binding: &'a Binding) -> Option<&'a str> {
        if let Some(found) = positional(&binding.accents, &binding.accented_labels, self.mark) {
            return Some(found);
        }
        let mut chars = binding.label.chars();
        match (chars.next(), chars.next()) {
            (Some(base), None) => positional(&self.letters, &self.accented, base),
            _ => None,
        }
    }
}

/// The label of `binding` with `accent` applied, or the plain label.
pub fn accented_label<'a>(binding: &'a Binding, accent: Option<&'a Accent>) -> &'a str {
    accent
        .and_then(|accent| accent.apply(binding))
        .unwrap_or(&binding.label)
}

fn positional<'a>(keys: &str, values: &'a str, wanted: char) -> Option<&'a str> {
    let idx = keys.chars().position(|c| c == wanted)?;
    let (start, c) = values.char_indices().nth(idx)?;
    Some(&values[start..start + c.len_utf8()])
}
