// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The host text field a keyboard session types into.

use alloc::string::String;

use understory_kbd_layout::LayoutKind;

use crate::event::KeyEvent;

/// Kind of text the focused field expects.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum ContentType {
    /// Free text.
    #[default]
    FreeText,
    /// Numbers only.
    Number,
    /// Phone numbers.
    PhoneNumber,
    /// Email addresses.
    Email,
    /// URLs.
    Url,
}

impl ContentType {
    /// The layout kind that serves this content type.
    pub fn layout_kind(self) -> LayoutKind {
        match self {
            Self::FreeText => LayoutKind::General,
            Self::Number => LayoutKind::Number,
            Self::PhoneNumber => LayoutKind::PhoneNumber,
            Self::Email => LayoutKind::Email,
            Self::Url => LayoutKind::Url,
        }
    }

    /// Whether auto-capitalization makes sense for this content type.
    pub fn allows_auto_caps(self) -> bool {
        !matches!(self, Self::Number | Self::PhoneNumber)
    }
}

/// Text around the cursor of the focused field.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SurroundingText {
    /// The text.
    pub text: String,
    /// Cursor position as a byte offset into `text`.
    pub cursor: usize,
}

impl SurroundingText {
    /// Creates surrounding text with the cursor at `cursor`.
    pub fn new(text: impl Into<String>, cursor: usize) -> Self {
        Self {
            text: text.into(),
            cursor,
        }
    }

    /// The text before the cursor, or `None` if the cursor is out of range or
    /// not on a character boundary.
    pub fn before_cursor(&self) -> Option<&str> {
        self.text.get(..self.cursor)
    }
}

/// Sink and source for the focused text field.
///
/// Every `send_*` call is fire-and-forget. Queries have defaults describing a
/// plain free-text field without surrounding-text support.
pub trait InputContext {
    /// Delivers a key event.
    fn send_key_event(&mut self, event: &KeyEvent);

    /// Commits text, replacing any preedit.
    fn send_commit_string(&mut self, text: &str);

    /// Shows `text` as the uncommitted preedit.
    fn send_preedit_string(&mut self, text: &str, has_candidates: bool);

    /// Copies the selection.
    fn copy(&mut self) {}

    /// Pastes the clipboard.
    fn paste(&mut self) {}

    /// The field's content type.
    fn content_type(&self) -> ContentType {
        ContentType::FreeText
    }

    /// Whether the field wants auto-capitalization.
    fn auto_capitalization_enabled(&self) -> bool {
        true
    }

    /// Text around the cursor, if the field exposes it.
    fn surrounding_text(&self) -> Option<SurroundingText> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn before_cursor_respects_boundaries() {
        assert_eq!(SurroundingText::new("Hé. x", 4).before_cursor(), Some("Hé."));
        assert_eq!(SurroundingText::new("Hé", 2).before_cursor(), None, "inside é");
        assert_eq!(SurroundingText::new("Hi", 9).before_cursor(), None);
    }

    #[test]
    fn content_types_map_to_layouts() {
        assert_eq!(ContentType::Url.layout_kind(), LayoutKind::Url);
        assert!(!ContentType::PhoneNumber.allows_auto_caps());
        assert!(ContentType::Email.allows_auto_caps());
    }
}
