// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Errors raised while loading layout documents.

use alloc::string::String;
use core::fmt;

/// A 1-based line/column position inside a layout document.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct TextPos {
    /// Line, starting at 1.
    pub line: u32,
    /// Column, starting at 1.
    pub column: u32,
}

impl TextPos {
    /// Creates a position.
    pub const fn new(line: u32, column: u32) -> Self {
        Self { line, column }
    }
}

impl From<roxmltree::TextPos> for TextPos {
    fn from(pos: roxmltree::TextPos) -> Self {
        Self::new(pos.row, pos.col)
    }
}

impl fmt::Display for TextPos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// Failure to load a layout document.
///
/// Any of these aborts the whole document; there is no partial recovery.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum LayoutError {
    /// The document is not well-formed XML.
    #[error("{file}:{pos}: malformed XML: {message}")]
    Xml {
        /// Document name.
        file: String,
        /// Where the XML parser gave up.
        pos: TextPos,
        /// The XML parser's message.
        message: String,
    },
    /// An element appeared where the grammar does not allow it.
    #[error("{file}:{pos}: expected {expected}, but got '<{found}>'")]
    UnexpectedElement {
        /// Document name.
        file: String,
        /// Position of the offending element.
        pos: TextPos,
        /// What the grammar allows here.
        expected: &'static str,
        /// Tag name found instead.
        found: String,
    },
    /// An attribute the element does not define.
    #[error("{file}:{pos}: unknown attribute '{attribute}' on <{element}>")]
    UnknownAttribute {
        /// Document name.
        file: String,
        /// Position of the element.
        pos: TextPos,
        /// Element tag name.
        element: &'static str,
        /// Attribute name.
        attribute: String,
    },
    /// An attribute value outside its enumeration, or a malformed bool.
    #[error("{file}:{pos}: invalid value '{value}' for '{attribute}', expected one of {expected}")]
    InvalidValue {
        /// Document name.
        file: String,
        /// Position of the element.
        pos: TextPos,
        /// Attribute name.
        attribute: &'static str,
        /// The rejected value.
        value: String,
        /// Accepted values, `|`-separated.
        expected: String,
    },
    /// A required attribute is absent or empty.
    #[error("{file}:{pos}: <{element}> requires a non-empty '{attribute}' attribute")]
    MissingAttribute {
        /// Document name.
        file: String,
        /// Position of the element.
        pos: TextPos,
        /// Element tag name.
        element: &'static str,
        /// Attribute name.
        attribute: &'static str,
    },
    /// An element has none of its required children.
    #[error("{file}:{pos}: <{element}> must contain at least one {expected}")]
    MissingChild {
        /// Document name.
        file: String,
        /// Position of the element.
        pos: TextPos,
        /// Element tag name.
        element: &'static str,
        /// The child that is required.
        expected: &'static str,
    },
    /// A document imports itself, directly or transitively.
    #[error("import cycle through '{file}'")]
    ImportCycle {
        /// The document that was imported twice on one chain.
        file: String,
    },
    /// No source could provide the named document.
    #[error("layout document '{name}' not found")]
    NotFound {
        /// Requested document name.
        name: String,
    },
    /// Reading the document failed.
    #[cfg(feature = "std")]
    #[error("failed to read '{}'", path.display())]
    Io {
        /// Resolved path.
        path: std::path::PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}

impl LayoutError {
    /// The position inside the document, for errors that have one.
    pub fn pos(&self) -> Option<TextPos> {
        match self {
            Self::Xml { pos, .. }
            | Self::UnexpectedElement { pos, .. }
            | Self::UnknownAttribute { pos, .. }
            | Self::InvalidValue { pos, .. }
            | Self::MissingAttribute { pos, .. }
            | Self::MissingChild { pos, .. } => Some(*pos),
            _ => None,
        }
    }
}
