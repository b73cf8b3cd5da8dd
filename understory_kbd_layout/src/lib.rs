// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Understory Keyboard Layout: the static layout model of an on-screen keyboard.
//!
//! A keyboard is described by an XML document and parsed into an immutable tree:
//!
//! - [`Keyboard`]: root attributes plus one [`Layout`] per `(kind, orientation)`.
//! - [`Layout`]: the [`Section`]s shown for a content type and orientation.
//! - [`Section`] → [`Row`] → [`Key`]: geometry-free structure; widths and
//!   heights are classes, resolved to pixels by the touch layer.
//! - [`Binding`]: what a key does at one shift level (action, labels, accent table).
//!
//! The tree does not change while a layout is loaded. Runtime state such as
//! pressed keys and modifiers lives in `understory_kbd_state`.
//!
//! ## Grammar
//!
//! ```text
//! <keyboard version title language catalog autocapitalization>
//!   <import file=.../> | <import><symview src=.../><number src=.../><phonenumber src=.../></import>
//!   <layout type orientation uniform-font-size>
//!     <section id movable type style>
//!       <row height>
//!         <key style width rtl id> <binding .../> </key>
//!         <spacer/>
//! ```
//!
//! Parsing is strict; see [`parse_keyboard`] and [`LayoutError`].
//!
//! ## Imports
//!
//! [`LayoutLoader`] follows `<import file>` entries in document order. A later
//! definition of the same `(kind, orientation)` replaces sections by id and
//! never touches the other orientation:
//!
//! ```
//! use understory_kbd_layout::{LayoutKind, LayoutLoader, MemorySource, Orientation};
//!
//! let mut source = MemorySource::new();
//! source.insert(
//!     "base.xml",
//!     r#"<keyboard>
//!          <layout orientation="landscape"><section id="main"><row><key><binding label="a"/></key></row></section></layout>
//!          <layout orientation="portrait"><section id="main"><row><key><binding label="b"/></key></row></section></layout>
//!        </keyboard>"#,
//! );
//! source.insert(
//!     "main.xml",
//!     r#"<keyboard>
//!          <import file="base.xml"/>
//!          <layout orientation="portrait"><section id="main"><row><key><binding label="c"/></key></row></section></layout>
//!        </keyboard>"#,
//! );
//!
//! let kb = LayoutLoader::new(source).load("main.xml").unwrap();
//! let label = |o| {
//!     kb.layout_exact(LayoutKind::General, o).unwrap().sections[0].rows[0].keys[0]
//!         .binding(false)
//!         .label
//!         .clone()
//! };
//! assert_eq!(label(Orientation::Landscape), "a");
//! assert_eq!(label(Orientation::Portrait), "c");
//! ```
//!
//! With the `std` feature (default), [`FileSource`] resolves document names
//! against [`LayoutSearchPaths`].
//!
//! This crate is `no_std` and uses `alloc`.

#![no_std]

extern crate alloc;
#[cfg(feature = "std")]
extern crate std;

mod error;
#[cfg(feature = "std")]
mod fs;
mod loader;
mod model;
mod parser;

pub use error::{LayoutError, TextPos};
#[cfg(feature = "std")]
pub use fs::{FileSource, LayoutSearchPaths, SYSTEM_LAYOUT_DIR, USER_LAYOUT_DIR};
pub use loader::{
    BUILTIN_LAYOUT, CompanionKeyboards, LayoutLoader, LayoutSet, LayoutSource, MemorySource,
};
pub use model::{
    Action, Binding, BindingFlags, Companions, Header, Key, KeyStyle, KeyWidth, Keyboard, Layout,
    LayoutKind, Orientation, Row, RowHeight, Section, SectionKind,
};
pub use parser::{DocumentItem, KeyboardDocument, parse_keyboard};
