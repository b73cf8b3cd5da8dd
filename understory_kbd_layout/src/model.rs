// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The immutable layout tree: keyboard, layout, section, row, key, binding.

use alloc::string::String;
use alloc::sync::Arc;
use alloc::vec::Vec;

use smallvec::SmallVec;

/// What a binding does when its key is clicked.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum Action {
    /// Insert the binding's label as text.
    #[default]
    Insert,
    /// The shift modifier.
    Shift,
    /// Delete one character before the cursor.
    Backspace,
    /// Insert a space.
    Space,
    /// Rotate through the binding's cycle set (multitap).
    Cycle,
    /// Open the layout menu.
    LayoutMenu,
    /// Switch to the symbol view.
    Sym,
    /// Return / enter.
    Return,
    /// Commit the current preedit.
    Commit,
    /// Insert the locale's decimal separator (the binding label).
    DecimalSeparator,
    /// Toggle the sign of a number.
    PlusMinusToggle,
    /// Insert a tab.
    Tab,
    /// Switch to the next keyboard.
    Switch,
    /// Toggle the input method on or off.
    OnOffToggle,
    /// Commit while composing, otherwise behave as [`Action::Return`].
    Compose,
    /// Cursor left.
    Left,
    /// Cursor up.
    Up,
    /// Cursor right.
    Right,
    /// Cursor down.
    Down,
}

bitflags::bitflags! {
    /// Boolean attributes of a [`Binding`].
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct BindingFlags: u8 {
        /// The binding is a dead key: it stores an accent instead of producing text.
        const DEAD       = 0b0000_0001;
        /// Clicking the key returns to the previous view (symbol view "quick pick").
        const QUICK_PICK = 0b0000_0010;
        /// The label is right-to-left text.
        const RTL        = 0b0000_0100;
        /// The key may show a magnified popup while pressed.
        const ENLARGE    = 0b0000_1000;
        /// The binding belongs to the alt level.
        const ALT        = 0b0001_0000;
    }
}

/// One of the two level bindings of a [`Key`].
///
/// `accents` and `accented_labels` correspond positionally: the n-th accent
/// character maps to the n-th accented label character.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Binding {
    /// What clicking this binding does.
    pub action: Action,
    /// Primary label, also the inserted text for [`Action::Insert`].
    pub label: String,
    /// Secondary label shown in a corner of the key.
    pub secondary_label: String,
    /// Accent characters this binding reacts to.
    pub accents: String,
    /// Accented variants of the label, one per accent.
    pub accented_labels: String,
    /// Labels offered by the extended (long-press) popup.
    pub extended_labels: String,
    /// Characters rotated through by [`Action::Cycle`].
    pub cycle_set: String,
    /// Boolean attributes.
    pub flags: BindingFlags,
}

impl Binding {
    /// Creates a binding with the given action and label and everything else empty.
    pub fn new(action: Action, label: impl Into<String>) -> Self {
        Self {
            action,
            label: label.into(),
            ..Self::default()
        }
    }

    /// Builder-style helper that sets the accent table.
    #[must_use]
    pub fn with_accents(mut self, accents: impl Into<String>, accented: impl Into<String>) -> Self {
        self.accents = accents.into();
        self.accented_labels = accented.into();
        self
    }

    /// Builder-style helper that sets flags.
    #[must_use]
    pub fn with_flags(mut self, flags: BindingFlags) -> Self {
        self.flags = flags;
        self
    }

    /// Returns `true` if this binding is a dead key.
    pub fn is_dead(&self) -> bool {
        self.flags.contains(BindingFlags::DEAD)
    }
}

/// Visual style of a key.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum KeyStyle {
    /// Ordinary character key.
    #[default]
    Normal,
    /// Function key (shift, backspace, ...).
    Special,
    /// Dead-key styled key.
    DeadKey,
}

/// Width class of a key.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum KeyWidth {
    /// Narrow key.
    Small,
    /// Regular key.
    #[default]
    Medium,
    /// Wide key.
    Large,
    /// Wider key.
    XLarge,
    /// Widest fixed key.
    XxLarge,
    /// Takes whatever width the row has left.
    Stretched,
}

/// A key: two level bindings plus presentation attributes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Key {
    /// Visual style.
    pub style: KeyStyle,
    /// Width class.
    pub width: KeyWidth,
    /// Right-to-left key.
    pub rtl: bool,
    /// Stable identifier, used for overrides.
    pub id: Option<String>,
    bindings: [Binding; 2],
}

impl Key {
    /// Creates a normal, medium width key from its unshifted and shifted bindings.
    pub fn new(unshifted: Binding, shifted: Binding) -> Self {
        Self {
            style: KeyStyle::Normal,
            width: KeyWidth::Medium,
            rtl: false,
            id: None,
            bindings: [unshifted, shifted],
        }
    }

    /// Creates a key whose shifted binding is a copy of the unshifted one.
    pub fn single(binding: Binding) -> Self {
        Self::new(binding.clone(), binding)
    }

    /// Builder-style helper that sets the style.
    #[must_use]
    pub fn with_style(mut self, style: KeyStyle) -> Self {
        self.style = style;
        self
    }

    /// Builder-style helper that sets the width class.
    #[must_use]
    pub fn with_width(mut self, width: KeyWidth) -> Self {
        self.width = width;
        self
    }

    /// Builder-style helper that sets the stable id.
    #[must_use]
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// The binding for the given shift level.
    pub fn binding(&self, shift: bool) -> &Binding {
        &self.bindings[usize::from(shift)]
    }
}

/// Height class of a row.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum RowHeight {
    /// Short row.
    Small,
    /// Regular row.
    #[default]
    Medium,
    /// Tall row.
    Large,
    /// Taller row.
    XLarge,
    /// Tallest row.
    XxLarge,
}

/// A row of keys.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Row {
    /// Height class.
    pub height: RowHeight,
    /// Keys from left to right.
    pub keys: Vec<Arc<Key>>,
    /// Spacer positions. A value `n` means a spacer sits before `keys[n]`
    /// (or at the end of the row when `n == keys.len()`).
    pub spacers: SmallVec<[usize; 2]>,
}

/// Hit-testing tolerance of a section.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum SectionKind {
    /// Touches may land somewhat outside keys.
    #[default]
    Sloppy,
    /// Touches must land on keys.
    NonSloppy,
}

/// A named block of rows.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Section {
    /// Identifier, unique within a layout.
    pub id: String,
    /// Whether the section may be panned by the host.
    pub movable: bool,
    /// Hit-testing tolerance.
    pub kind: SectionKind,
    /// Style name for the presentation layer.
    pub style: String,
    /// Rows from top to bottom.
    pub rows: Vec<Row>,
}

impl Section {
    /// The largest number of keys in any row.
    pub fn max_columns(&self) -> usize {
        self.rows.iter().map(|row| row.keys.len()).max().unwrap_or(0)
    }

    /// All keys in row-major order.
    pub fn keys(&self) -> impl Iterator<Item = &Arc<Key>> + '_ {
        self.rows.iter().flat_map(|row| row.keys.iter())
    }
}

/// Content type a layout is meant for.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum LayoutKind {
    /// Regular text.
    #[default]
    General,
    /// URL entry.
    Url,
    /// Email entry.
    Email,
    /// Numeric entry.
    Number,
    /// Phone number entry.
    PhoneNumber,
    /// Sections shared by every kind.
    Common,
}

/// Screen orientation.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Orientation {
    /// Wide screen.
    #[default]
    Landscape,
    /// Tall screen.
    Portrait,
}

impl Orientation {
    /// The other orientation.
    pub fn flipped(self) -> Self {
        match self {
            Self::Landscape => Self::Portrait,
            Self::Portrait => Self::Landscape,
        }
    }
}

/// The sections of one `(kind, orientation)` pair.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Layout {
    /// Content type.
    pub kind: LayoutKind,
    /// Orientation.
    pub orientation: Orientation,
    /// Whether all keys share one font size.
    pub uniform_font_size: bool,
    /// Sections in definition order.
    pub sections: Vec<Arc<Section>>,
}

impl Layout {
    /// Looks up a section by id.
    pub fn section(&self, id: &str) -> Option<&Arc<Section>> {
        self.sections.iter().find(|section| section.id == id)
    }

    /// Inserts `section`, replacing a section with the same id in place.
    pub fn merge_section(&mut self, section: Arc<Section>) {
        match self.sections.iter_mut().find(|s| s.id == section.id) {
            Some(slot) => *slot = section,
            None => self.sections.push(section),
        }
    }
}

/// Companion documents named by `<import>` children.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Companions {
    /// Symbol view documents, in order.
    pub symview: Vec<String>,
    /// Number view documents.
    pub number: Vec<String>,
    /// Phone number view documents.
    pub phonenumber: Vec<String>,
}

impl Companions {
    /// Returns `true` if no companion is named.
    pub fn is_empty(&self) -> bool {
        self.symview.is_empty() && self.number.is_empty() && self.phonenumber.is_empty()
    }

    pub(crate) fn extend(&mut self, other: Self) {
        self.symview.extend(other.symview);
        self.number.extend(other.number);
        self.phonenumber.extend(other.phonenumber);
    }
}

/// Attributes of the `<keyboard>` root element.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Header {
    /// Format version.
    pub version: String,
    /// Display title.
    pub title: String,
    /// Language code, e.g. `en`.
    pub language: String,
    /// Translation catalog name.
    pub catalog: String,
    /// Whether auto-capitalization applies to this keyboard.
    pub autocapitalization: bool,
}

impl Default for Header {
    fn default() -> Self {
        Self {
            version: String::from("1.0"),
            title: String::new(),
            language: String::new(),
            catalog: String::new(),
            autocapitalization: true,
        }
    }
}

/// A fully composed keyboard: header, layouts, and companion documents.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Keyboard {
    /// Root attributes.
    pub header: Header,
    /// One entry per `(kind, orientation)`.
    pub layouts: Vec<Layout>,
    /// Companion documents collected from imports.
    pub companions: Companions,
}

impl Keyboard {
    /// Creates an empty keyboard with the given header.
    pub fn new(header: Header) -> Self {
        Self {
            header,
            layouts: Vec::new(),
            companions: Companions::default(),
        }
    }

    /// The layout defined for exactly this `(kind, orientation)`.
    pub fn layout_exact(&self, kind: LayoutKind, orientation: Orientation) -> Option<&Layout> {
        self.layouts
            .iter()
            .find(|l| l.kind == kind && l.orientation == orientation)
    }

    /// The layout for `(kind, orientation)`, falling back to the other
    /// orientation of the same kind, then to [`LayoutKind::General`].
    pub fn layout(&self, kind: LayoutKind, orientation: Orientation) -> Option<&Layout> {
        self.layout_exact(kind, orientation)
            .or_else(|| self.layout_exact(kind, orientation.flipped()))
            .or_else(|| {
                (kind != LayoutKind::General)
                    .then(|| self.layout(LayoutKind::General, orientation))
                    .flatten()
            })
    }

    /// Merges `layout` into this keyboard.
    ///
    /// A layout for a new `(kind, orientation)` is appended. A layout for an
    /// existing pair replaces that pair's sections by id and leaves every other
    /// pair, including the other orientation, untouched.
    pub fn merge_layout(&mut self, layout: Layout) {
        let existing = self
            .layouts
            .iter_mut()
            .find(|l| l.kind == layout.kind && l.orientation == layout.orientation);
        match existing {
            Some(target) => {
                target.uniform_font_size = layout.uniform_font_size;
                for section in layout.sections {
                    target.merge_section(section);
                }
            }
            None => self.layouts.push(layout),
        }
    }
}
