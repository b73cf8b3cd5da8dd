// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! XML parser for keyboard layout documents.
//!
//! The grammar is strict: unknown elements, unknown attributes, and values
//! outside an attribute's enumeration abort the document with a positioned
//! [`LayoutError`]. Imports are not resolved here; they are returned as
//! [`DocumentItem::Import`] entries for [`LayoutLoader`](crate::LayoutLoader)
//! to follow.

use alloc::borrow::ToOwned;
use alloc::string::{String, ToString};
use alloc::sync::Arc;
use alloc::vec::Vec;

use hashbrown::HashSet;
use roxmltree::{Document, Node};
use smallvec::SmallVec;

use crate::error::{LayoutError, TextPos};
use crate::model::{
    Action, Binding, BindingFlags, Companions, Header, Key, KeyStyle, KeyWidth, Layout,
    LayoutKind, Orientation, Row, RowHeight, Section, SectionKind,
};

/// One top-level entry of a keyboard document, in document order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DocumentItem {
    /// `<import file=.../>`: merge another document's layouts here.
    Import(String),
    /// `<import>` with symview/number/phonenumber children.
    Companions(Companions),
    /// A `<layout>` element.
    Layout(Layout),
}

/// A parsed, unresolved keyboard document.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct KeyboardDocument {
    /// Root attributes.
    pub header: Header,
    /// Imports and layouts in document order.
    pub items: Vec<DocumentItem>,
}

const ACTIONS: &[(&str, Action)] = &[
    ("insert", Action::Insert),
    ("shift", Action::Shift),
    ("backspace", Action::Backspace),
    ("space", Action::Space),
    ("cycle", Action::Cycle),
    ("layout_menu", Action::LayoutMenu),
    ("sym", Action::Sym),
    ("return", Action::Return),
    ("commit", Action::Commit),
    ("decimal_separator", Action::DecimalSeparator),
    ("plus_minus_toggle", Action::PlusMinusToggle),
    ("tab", Action::Tab),
    ("switch", Action::Switch),
    ("on_off_toggle", Action::OnOffToggle),
    ("compose", Action::Compose),
    ("left", Action::Left),
    ("up", Action::Up),
    ("right", Action::Right),
    ("down", Action::Down),
];

const LAYOUT_KINDS: &[(&str, LayoutKind)] = &[
    ("general", LayoutKind::General),
    ("url", LayoutKind::Url),
    ("email", LayoutKind::Email),
    ("number", LayoutKind::Number),
    ("phonenumber", LayoutKind::PhoneNumber),
    ("common", LayoutKind::Common),
];

const ORIENTATIONS: &[(&str, Orientation)] = &[
    ("landscape", Orientation::Landscape),
    ("portrait", Orientation::Portrait),
];

const SECTION_KINDS: &[(&str, SectionKind)] = &[
    ("sloppy", SectionKind::Sloppy),
    ("non-sloppy", SectionKind::NonSloppy),
];

const ROW_HEIGHTS: &[(&str, RowHeight)] = &[
    ("small", RowHeight::Small),
    ("medium", RowHeight::Medium),
    ("large", RowHeight::Large),
    ("x-large", RowHeight::XLarge),
    ("xx-large", RowHeight::XxLarge),
];

const KEY_STYLES: &[(&str, KeyStyle)] = &[
    ("normal", KeyStyle::Normal),
    ("special", KeyStyle::Special),
    ("deadkey", KeyStyle::DeadKey),
];

const KEY_WIDTHS: &[(&str, KeyWidth)] = &[
    ("small", KeyWidth::Small),
    ("medium", KeyWidth::Medium),
    ("large", KeyWidth::Large),
    ("x-large", KeyWidth::XLarge),
    ("xx-large", KeyWidth::XxLarge),
    ("stretched", KeyWidth::Stretched),
];

const BOOLS: &[(&str, bool)] = &[("true", true), ("1", true), ("false", false), ("0", false)];

/// Parses a keyboard document.
///
/// `file` is only used to label errors.
///
/// ```
/// use understory_kbd_layout::{parse_keyboard, DocumentItem};
///
/// let doc = parse_keyboard(
///     r#"<keyboard title="Tiny" language="en">
///          <layout type="general" orientation="landscape">
///            <section id="main">
///              <row><key><binding label="a"/><binding shift="true" label="A"/></key></row>
///            </section>
///          </layout>
///        </keyboard>"#,
///     "tiny.xml",
/// )
/// .unwrap();
/// assert_eq!(doc.header.title, "Tiny");
/// assert!(matches!(doc.items[0], DocumentItem::Layout(_)));
/// ```
pub fn parse_keyboard(source: &str, file: &str) -> Result<KeyboardDocument, LayoutError> {
    let doc = Document::parse(source).map_err(|e| LayoutError::Xml {
        file: file.to_owned(),
        pos: e.pos().into(),
        message: e.to_string(),
    })?;
    let mut parser = Parser {
        doc: &doc,
        file,
        key_ids: HashSet::new(),
    };
    parser.keyboard(doc.root_element())
}

struct Parser<'a, 'input> {
    doc: &'a Document<'input>,
    file: &'a str,
    key_ids: HashSet<String>,
}

impl Parser<'_, '_> {
    fn keyboard(&mut self, node: Node<'_, '_>) -> Result<KeyboardDocument, LayoutError> {
        if node.tag_name().name() != "keyboard" {
            return Err(self.unexpected(node, "'<keyboard>'"));
        }
        self.check_attributes(
            node,
            "keyboard",
            &["version", "title", "language", "catalog", "autocapitalization"],
        )?;
        let defaults = Header::default();
        let header = Header {
            version: node
                .attribute("version")
                .map_or(defaults.version, str::to_owned),
            title: text_attr(node, "title"),
            language: text_attr(node, "language"),
            catalog: text_attr(node, "catalog"),
            autocapitalization: self.choice(node, "autocapitalization", BOOLS, true)?,
        };

        let mut items = Vec::new();
        for child in elements(node) {
            match child.tag_name().name() {
                "import" => items.push(self.import(child)?),
                "layout" => items.push(DocumentItem::Layout(self.layout(child)?)),
                _ => return Err(self.unexpected(child, "'<import>' or '<layout>'")),
            }
        }
        if items.is_empty() {
            return Err(self.missing_child(node, "keyboard", "'<layout>' or '<import>'"));
        }
        Ok(KeyboardDocument { header, items })
    }

    fn import(&mut self, node: Node<'_, '_>) -> Result<DocumentItem, LayoutError> {
        self.check_attributes(node, "import", &["file"])?;
        if let Some(file) = node.attribute("file") {
            if let Some(child) = elements(node).next() {
                return Err(self.unexpected(child, "no children in a file '<import>'"));
            }
            if file.is_empty() {
                return Err(self.missing_attribute(node, "import", "file"));
            }
            return Ok(DocumentItem::Import(file.to_owned()));
        }

        let mut companions = Companions::default();
        for child in elements(node) {
            let (tag, list) = match child.tag_name().name() {
                "symview" => ("symview", &mut companions.symview),
                "number" => ("number", &mut companions.number),
                "phonenumber" => ("phonenumber", &mut companions.phonenumber),
                _ => {
                    return Err(
                        self.unexpected(child, "'<symview>', '<number>' or '<phonenumber>'")
                    );
                }
            };
            self.check_attributes(child, tag, &["src"])?;
            self.no_children(child)?;
            match child.attribute("src") {
                Some(src) if !src.is_empty() => list.push(src.to_owned()),
                _ => return Err(self.missing_attribute(child, tag, "src")),
            }
        }
        if companions.is_empty() {
            return Err(self.missing_child(node, "import", "'<symview>', '<number>' or '<phonenumber>'"));
        }
        Ok(DocumentItem::Companions(companions))
    }

    fn layout(&mut self, node: Node<'_, '_>) -> Result<Layout, LayoutError> {
        self.check_attributes(node, "layout", &["type", "orientation", "uniform-font-size"])?;
        let mut layout = Layout {
            kind: self.choice(node, "type", LAYOUT_KINDS, LayoutKind::General)?,
            orientation: self.choice(node, "orientation", ORIENTATIONS, Orientation::Landscape)?,
            uniform_font_size: self.choice(node, "uniform-font-size", BOOLS, false)?,
            sections: Vec::new(),
        };
        for child in elements(node) {
            if child.tag_name().name() != "section" {
                return Err(self.unexpected(child, "'<section>'"));
            }
            let section = self.section(child)?;
            layout.merge_section(Arc::new(section));
        }
        if layout.sections.is_empty() {
            return Err(self.missing_child(node, "layout", "'<section>'"));
        }
        Ok(layout)
    }

    fn section(&mut self, node: Node<'_, '_>) -> Result<Section, LayoutError> {
        self.check_attributes(node, "section", &["id", "movable", "type", "style"])?;
        let id = match node.attribute("id") {
            Some(id) if !id.is_empty() => id.to_owned(),
            _ => return Err(self.missing_attribute(node, "section", "id")),
        };
        let mut section = Section {
            id,
            movable: self.choice(node, "movable", BOOLS, true)?,
            kind: self.choice(node, "type", SECTION_KINDS, SectionKind::Sloppy)?,
            style: text_attr(node, "style"),
            rows: Vec::new(),
        };
        for child in elements(node) {
            if child.tag_name().name() != "row" {
                return Err(self.unexpected(child, "'<row>'"));
            }
            section.rows.push(self.row(child)?);
        }
        if section.rows.is_empty() {
            return Err(self.missing_child(node, "section", "'<row>'"));
        }
        Ok(section)
    }

    fn row(&mut self, node: Node<'_, '_>) -> Result<Row, LayoutError> {
        self.check_attributes(node, "row", &["height"])?;
        let mut row = Row {
            height: self.choice(node, "height", ROW_HEIGHTS, RowHeight::Medium)?,
            keys: Vec::new(),
            spacers: SmallVec::new(),
        };
        for child in elements(node) {
            match child.tag_name().name() {
                "key" => row.keys.push(Arc::new(self.key(child)?)),
                "spacer" => {
                    self.check_attributes(child, "spacer", &[])?;
                    self.no_children(child)?;
                    row.spacers.push(row.keys.len());
                }
                _ => return Err(self.unexpected(child, "'<key>' or '<spacer>'")),
            }
        }
        Ok(row)
    }

    fn key(&mut self, node: Node<'_, '_>) -> Result<Key, LayoutError> {
        self.check_attributes(node, "key", &["style", "width", "rtl", "id"])?;
        let style = self.choice(node, "style", KEY_STYLES, KeyStyle::Normal)?;
        let width = self.choice(node, "width", KEY_WIDTHS, KeyWidth::Medium)?;
        let rtl = self.choice(node, "rtl", BOOLS, false)?;
        let id = node.attribute("id").filter(|id| !id.is_empty()).map(str::to_owned);
        if let Some(id) = &id {
            if !self.key_ids.insert(id.clone()) {
                tracing::warn!(file = self.file, pos = %self.pos(node), id = %id, "duplicate key id");
            }
        }

        let mut slots: [Option<Binding>; 2] = [None, None];
        for child in elements(node) {
            if child.tag_name().name() != "binding" {
                return Err(self.unexpected(child, "'<binding>'"));
            }
            let (shift, binding) = self.binding(child)?;
            let slot = &mut slots[usize::from(shift)];
            if slot.is_some() {
                tracing::warn!(
                    file = self.file,
                    pos = %self.pos(child),
                    shift,
                    "duplicate binding ignored"
                );
                continue;
            }
            *slot = Some(binding);
        }

        let [unshifted, shifted] = slots;
        let (unshifted, shifted) = match (unshifted, shifted) {
            (Some(u), Some(s)) => (u, s),
            (Some(u), None) => (u.clone(), u),
            (None, Some(s)) => (s.clone(), s),
            (None, None) => return Err(self.missing_child(node, "key", "'<binding>'")),
        };
        let mut key = Key::new(unshifted, shifted)
            .with_style(style)
            .with_width(width);
        key.rtl = rtl;
        key.id = id;
        Ok(key)
    }

    fn binding(&mut self, node: Node<'_, '_>) -> Result<(bool, Binding), LayoutError> {
        self.check_attributes(
            node,
            "binding",
            &[
                "action",
                "shift",
                "alt",
                "label",
                "secondary_label",
                "accents",
                "accented_labels",
                "extended_labels",
                "cycleset",
                "dead",
                "quick_pick",
                "rtl",
                "enlarge",
            ],
        )?;
        self.no_children(node)?;

        let shift = self.choice(node, "shift", BOOLS, false)?;
        let label = text_attr(node, "label");
        let accents = text_attr(node, "accents");
        let accented_labels = text_attr(node, "accented_labels");
        if accents.chars().count() != accented_labels.chars().count() {
            tracing::warn!(
                file = self.file,
                pos = %self.pos(node),
                "accents and accented_labels differ in length"
            );
        }

        let mut flags = BindingFlags::empty();
        flags.set(BindingFlags::ALT, self.choice(node, "alt", BOOLS, false)?);
        flags.set(BindingFlags::DEAD, self.choice(node, "dead", BOOLS, false)?);
        flags.set(
            BindingFlags::QUICK_PICK,
            self.choice(node, "quick_pick", BOOLS, false)?,
        );
        flags.set(BindingFlags::RTL, self.choice(node, "rtl", BOOLS, false)?);
        let mut chars = label.chars();
        let single_lowercase = matches!((chars.next(), chars.next()), (Some(c), None) if c.is_lowercase());
        flags.set(
            BindingFlags::ENLARGE,
            self.choice(node, "enlarge", BOOLS, single_lowercase)?,
        );

        let binding = Binding {
            action: self.choice(node, "action", ACTIONS, Action::Insert)?,
            label,
            secondary_label: text_attr(node, "secondary_label"),
            accents,
            accented_labels,
            extended_labels: text_attr(node, "extended_labels"),
            cycle_set: text_attr(node, "cycleset"),
            flags,
        };
        Ok((shift, binding))
    }

    // --- helpers ---

    fn pos(&self, node: Node<'_, '_>) -> TextPos {
        self.doc.text_pos_at(node.range().start).into()
    }

    fn choice<T: Copy>(
        &self,
        node: Node<'_, '_>,
        attribute: &'static str,
        table: &[(&str, T)],
        default: T,
    ) -> Result<T, LayoutError> {
        let Some(value) = node.attribute(attribute) else {
            return Ok(default);
        };
        table
            .iter()
            .find(|(name, _)| *name == value)
            .map(|(_, v)| *v)
            .ok_or_else(|| LayoutError::InvalidValue {
                file: self.file.to_owned(),
                pos: self.pos(node),
                attribute,
                value: value.to_owned(),
                expected: table
                    .iter()
                    .map(|(name, _)| *name)
                    .collect::<Vec<_>>()
                    .join("|"),
            })
    }

    fn check_attributes(
        &self,
        node: Node<'_, '_>,
        element: &'static str,
        allowed: &[&str],
    ) -> Result<(), LayoutError> {
        match node.attributes().find(|a| !allowed.contains(&a.name())) {
            Some(attr) => Err(LayoutError::UnknownAttribute {
                file: self.file.to_owned(),
                pos: self.pos(node),
                element,
                attribute: attr.name().to_owned(),
            }),
            None => Ok(()),
        }
    }

    fn no_children(&self, node: Node<'_, '_>) -> Result<(), LayoutError> {
        match elements(node).next() {
            Some(child) => Err(self.unexpected(child, "no child elements")),
            None => Ok(()),
        }
    }

    fn unexpected(&self, node: Node<'_, '_>, expected: &'static str) -> LayoutError {
        LayoutError::UnexpectedElement {
            file: self.file.to_owned(),
            pos: self.pos(node),
            expected,
            found: node.tag_name().name().to_owned(),
        }
    }

    fn missing_attribute(
        &self,
        node: Node<'_, '_>,
        element: &'static str,
        attribute: &'static str,
    ) -> LayoutError {
        LayoutError::MissingAttribute {
            file: self.file.to_owned(),
            pos: self.pos(node),
            element,
            attribute,
        }
    }

    fn missing_child(
        &self,
        node: Node<'_, '_>,
        element: &'static str,
        expected: &'static str,
    ) -> LayoutError {
        LayoutError::MissingChild {
            file: self.file.to_owned(),
            pos: self.pos(node),
            element,
            expected,
        }
    }
}

fn elements<'a, 'input>(node: Node<'a, 'input>) -> impl Iterator<Item = Node<'a, 'input>> {
    node.children().filter(Node::is_element)
}

fn text_attr(node: Node<'_, '_>, name: &str) -> String {
    node.attribute(name).unwrap_or_default().to_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    const QW: &str = r#"<?xml version="1.0"?>
<keyboard version="1.0" title="Test" language="fi" autocapitalization="false">
  <layout type="general" orientation="landscape">
    <section id="main" type="non-sloppy">
      <row height="large">
        <key id="q"><binding label="q"/><binding shift="true" label="Q"/></key>
        <spacer/>
        <key style="deadkey"><binding label="´" dead="true" accents="aeiou" accented_labels="áéíóú"/></key>
        <key width="stretched"><binding action="space"/></key>
      </row>
    </section>
  </layout>
  <import file="common.xml"/>
  <import><symview src="sym1.xml"/><number src="num.xml"/></import>
</keyboard>"#;

    fn parse(src: &str) -> Result<KeyboardDocument, LayoutError> {
        parse_keyboard(src, "test.xml")
    }

    fn first_layout(doc: &KeyboardDocument) -> &Layout {
        match &doc.items[0] {
            DocumentItem::Layout(l) => l,
            other => panic!("expected a layout, got {other:?}"),
        }
    }

    #[test]
    fn parses_full_tree() {
        let doc = parse(QW).unwrap();
        assert_eq!(doc.header.language, "fi");
        assert!(!doc.header.autocapitalization, "explicit false");
        assert_eq!(doc.items.len(), 3);

        let layout = first_layout(&doc);
        let section = &layout.sections[0];
        assert_eq!(section.kind, SectionKind::NonSloppy);
        assert!(section.movable, "movable defaults to true");
        let row = &section.rows[0];
        assert_eq!(row.height, RowHeight::Large);
        assert_eq!(row.keys.len(), 3);
        assert_eq!(row.spacers.as_slice(), &[1]);

        let q = &row.keys[0];
        assert_eq!(q.id.as_deref(), Some("q"));
        assert_eq!(q.binding(true).label, "Q");
        assert!(q.binding(false).flags.contains(BindingFlags::ENLARGE));

        let dead = &row.keys[1];
        assert_eq!(dead.style, KeyStyle::DeadKey);
        assert!(dead.binding(false).is_dead());
        assert!(dead.binding(true).is_dead(), "missing shifted binding copies");

        assert_eq!(row.keys[2].width, KeyWidth::Stretched);
        assert_eq!(row.keys[2].binding(false).action, Action::Space);

        assert_eq!(doc.items[1], DocumentItem::Import("common.xml".into()));
        match &doc.items[2] {
            DocumentItem::Companions(c) => {
                assert_eq!(c.symview, ["sym1.xml"]);
                assert_eq!(c.number, ["num.xml"]);
                assert!(c.phonenumber.is_empty());
            }
            other => panic!("expected companions, got {other:?}"),
        }
    }

    #[test]
    fn unknown_tag_reports_position() {
        let src = "<keyboard>\n  <layout>\n    <section id=\"m\">\n      <rows/>\n    </section>\n  </layout>\n</keyboard>";
        let err = parse(src).unwrap_err();
        match &err {
            LayoutError::UnexpectedElement { pos, found, .. } => {
                assert_eq!(found, "rows");
                assert_eq!(*pos, TextPos::new(4, 7));
            }
            other => panic!("unexpected error {other:?}"),
        }
        let message = err.to_string();
        assert!(message.starts_with("test.xml:4:7"), "message: {message}");
    }

    #[test]
    fn invalid_enum_value_aborts() {
        let src = r#"<keyboard><layout orientation="sideways"><section id="m"><row/></section></layout></keyboard>"#;
        let err = parse(src).unwrap_err();
        assert!(
            matches!(&err, LayoutError::InvalidValue { attribute: "orientation", value, .. } if value == "sideways"),
            "got {err:?}"
        );
    }

    #[test]
    fn bool_accepts_digits_only_as_0_and_1() {
        let ok = r#"<keyboard autocapitalization="0"><layout><section id="m" movable="1"><row/></section></layout></keyboard>"#;
        let doc = parse(ok).unwrap();
        assert!(!doc.header.autocapitalization);
        assert!(first_layout(&doc).sections[0].movable);

        let bad = r#"<keyboard autocapitalization="yes"><layout><section id="m"><row/></section></layout></keyboard>"#;
        assert!(matches!(parse(bad), Err(LayoutError::InvalidValue { .. })));
    }

    #[test]
    fn unknown_attribute_aborts() {
        let src = r#"<keyboard><layout><section id="m"><row colour="red"/></section></layout></keyboard>"#;
        assert!(matches!(
            parse(src),
            Err(LayoutError::UnknownAttribute { element: "row", .. })
        ));
    }

    #[test]
    fn structural_requirements() {
        let no_id = r#"<keyboard><layout><section><row/></section></layout></keyboard>"#;
        assert!(matches!(
            parse(no_id),
            Err(LayoutError::MissingAttribute { attribute: "id", .. })
        ));

        let no_rows = r#"<keyboard><layout><section id="m"/></layout></keyboard>"#;
        assert!(matches!(
            parse(no_rows),
            Err(LayoutError::MissingChild { element: "section", .. })
        ));

        let no_binding = r#"<keyboard><layout><section id="m"><row><key/></row></section></layout></keyboard>"#;
        assert!(matches!(
            parse(no_binding),
            Err(LayoutError::MissingChild { element: "key", .. })
        ));

        let empty_import = r#"<keyboard><import/></keyboard>"#;
        assert!(matches!(
            parse(empty_import),
            Err(LayoutError::MissingChild { element: "import", .. })
        ));

        let no_src = r#"<keyboard><import><number/></import></keyboard>"#;
        assert!(matches!(
            parse(no_src),
            Err(LayoutError::MissingAttribute { attribute: "src", .. })
        ));

        assert!(matches!(
            parse("<keyboard/>"),
            Err(LayoutError::MissingChild { element: "keyboard", .. })
        ));
        assert!(matches!(
            parse("<layout/>"),
            Err(LayoutError::UnexpectedElement { .. })
        ));
    }

    #[test]
    fn duplicate_binding_keeps_first() {
        let src = r#"<keyboard><layout><section id="m"><row><key>
            <binding label="a"/><binding label="b"/><binding shift="true" label="A"/>
        </key></row></section></layout></keyboard>"#;
        let doc = parse(src).unwrap();
        let key = &first_layout(&doc).sections[0].rows[0].keys[0];
        assert_eq!(key.binding(false).label, "a");
        assert_eq!(key.binding(true).label, "A");
    }

    #[test]
    fn enlarge_defaults_from_label() {
        let src = r#"<keyboard><layout><section id="m"><row>
            <key><binding label="a"/></key>
            <key><binding label="A"/></key>
            <key><binding label="ab"/></key>
            <key><binding label="A" enlarge="true"/></key>
        </row></section></layout></keyboard>"#;
        let doc = parse(src).unwrap();
        let enlarged: Vec<bool> = first_layout(&doc).sections[0].rows[0]
            .keys
            .iter()
            .map(|k| k.binding(false).flags.contains(BindingFlags::ENLARGE))
            .collect();
        assert_eq!(enlarged, [true, false, false, true]);
    }

    #[test]
    fn malformed_xml_is_positioned() {
        let err = parse("<keyboard>\n<layout>\n</keyboard>").unwrap_err();
        assert!(matches!(err, LayoutError::Xml { .. }), "got {err:?}");
        assert!(
            matches!(err.pos(), Some(p) if p.line >= 2),
            "position should point past the first line: {err}"
        );
    }
}
