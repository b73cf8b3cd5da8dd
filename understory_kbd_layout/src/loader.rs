// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Import resolution and layout fallback.

use alloc::borrow::ToOwned;
use alloc::string::String;
use alloc::vec::Vec;

use hashbrown::HashMap;

use crate::error::LayoutError;
use crate::model::Keyboard;
use crate::parser::{DocumentItem, KeyboardDocument, parse_keyboard};

/// Something that can produce the text of a named layout document.
pub trait LayoutSource {
    /// Returns the document text for `name`.
    fn read(&self, name: &str) -> Result<String, LayoutError>;
}

/// An in-memory [`LayoutSource`], mostly useful for tests and embedded layouts.
#[derive(Clone, Debug, Default)]
pub struct MemorySource {
    files: HashMap<String, String>,
}

impl MemorySource {
    /// Creates an empty source.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces a document.
    pub fn insert(&mut self, name: impl Into<String>, text: impl Into<String>) -> &mut Self {
        self.files.insert(name.into(), text.into());
        self
    }
}

impl LayoutSource for MemorySource {
    fn read(&self, name: &str) -> Result<String, LayoutError> {
        self.files
            .get(name)
            .cloned()
            .ok_or_else(|| LayoutError::NotFound {
                name: name.to_owned(),
            })
    }
}

/// Companion keyboards named by `<import>` children, loaded on request.
#[derive(Clone, Debug, Default)]
pub struct CompanionKeyboards {
    /// Symbol view pages, in order.
    pub symview: Vec<Keyboard>,
    /// Number views.
    pub number: Vec<Keyboard>,
    /// Phone number views.
    pub phonenumber: Vec<Keyboard>,
}

/// Loads keyboard documents and follows their imports.
///
/// Imports are applied in document order, so a later import overrides
/// sections of the same `(kind, orientation)` and leaves everything else in
/// place.
#[derive(Clone, Debug)]
pub struct LayoutLoader<S> {
    source: S,
}

impl<S: LayoutSource> LayoutLoader<S> {
    /// Creates a loader reading from `source`.
    pub fn new(source: S) -> Self {
        Self { source }
    }

    /// The underlying source.
    pub fn source(&self) -> &S {
        &self.source
    }

    /// Loads `name` and everything it imports.
    pub fn load(&self, name: &str) -> Result<Keyboard, LayoutError> {
        let document = self.document(name)?;
        let mut keyboard = Keyboard::new(document.header.clone());
        let mut chain = Vec::from([name.to_owned()]);
        self.apply(&mut keyboard, document, &mut chain)?;
        tracing::debug!(
            name,
            layouts = keyboard.layouts.len(),
            "loaded keyboard"
        );
        Ok(keyboard)
    }

    /// Loads the companion documents recorded on `keyboard`.
    pub fn load_companions(&self, keyboard: &Keyboard) -> Result<CompanionKeyboards, LayoutError> {
        let load_all = |names: &[String]| -> Result<Vec<Keyboard>, LayoutError> {
            names.iter().map(|name| self.load(name)).collect()
        };
        Ok(CompanionKeyboards {
            symview: load_all(&keyboard.companions.symview)?,
            number: load_all(&keyboard.companions.number)?,
            phonenumber: load_all(&keyboard.companions.phonenumber)?,
        })
    }

    fn document(&self, name: &str) -> Result<KeyboardDocument, LayoutError> {
        let text = self.source.read(name)?;
        parse_keyboard(&text, name)
    }

    fn apply(
        &self,
        keyboard: &mut Keyboard,
        document: KeyboardDocument,
        chain: &mut Vec<String>,
    ) -> Result<(), LayoutError> {
        for item in document.items {
            match item {
                DocumentItem::Layout(layout) => keyboard.merge_layout(layout),
                DocumentItem::Companions(companions) => keyboard.companions.extend(companions),
                DocumentItem::Import(file) => {
                    if chain.contains(&file) {
                        return Err(LayoutError::ImportCycle { file });
                    }
                    let imported = self.document(&file)?;
                    tracing::trace!(file = %file, "applying import");
                    chain.push(file);
                    self.apply(keyboard, imported, chain)?;
                    chain.pop();
                }
            }
        }
        Ok(())
    }
}

/// The document used when nothing else loads.
pub const BUILTIN_LAYOUT: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<keyboard version="1.0" title="Built-in" language="en" autocapitalization="true">
  <layout type="general" orientation="landscape">
    <section id="main">
      <row>
        <key><binding label="q"/><binding shift="true" label="Q"/></key>
        <key><binding label="w"/><binding shift="true" label="W"/></key>
        <key><binding label="e" accents="´`^¨" accented_labels="éèêë"/><binding shift="true" label="E" accents="´`^¨" accented_labels="ÉÈÊË"/></key>
        <key><binding label="r"/><binding shift="true" label="R"/></key>
        <key><binding label="t"/><binding shift="true" label="T"/></key>
        <key><binding label="y"/><binding shift="true" label="Y"/></key>
        <key><binding label="u" accents="´`^¨" accented_labels="úùûü"/><binding shift="true" label="U" accents="´`^¨" accented_labels="ÚÙÛÜ"/></key>
        <key><binding label="i" accents="´`^¨" accented_labels="íìîï"/><binding shift="true" label="I" accents="´`^¨" accented_labels="ÍÌÎÏ"/></key>
        <key><binding label="o" accents="´`^¨" accented_labels="óòôö"/><binding shift="true" label="O" accents="´`^¨" accented_labels="ÓÒÔÖ"/></key>
        <key><binding label="p"/><binding shift="true" label="P"/></key>
      </row>
      <row>
        <key><binding label="a" accents="´`^¨" accented_labels="áàâä"/><binding shift="true" label="A" accents="´`^¨" accented_labels="ÁÀÂÄ"/></key>
        <key><binding label="s"/><binding shift="true" label="S"/></key>
        <key><binding label="d"/><binding shift="true" label="D"/></key>
        <key><binding label="f"/><binding shift="true" label="F"/></key>
        <key><binding label="g"/><binding shift="true" label="G"/></key>
        <key><binding label="h"/><binding shift="true" label="H"/></key>
        <key><binding label="j"/><binding shift="true" label="J"/></key>
        <key><binding label="k"/><binding shift="true" label="K"/></key>
        <key><binding label="l"/><binding shift="true" label="L"/></key>
        <key style="deadkey"><binding label="´" dead="true"/><binding shift="true" label="`" dead="true"/></key>
      </row>
      <row>
        <key style="special" width="large"><binding action="shift"/></key>
        <key><binding label="z"/><binding shift="true" label="Z"/></key>
        <key><binding label="x"/><binding shift="true" label="X"/></key>
        <key><binding label="c"/><binding shift="true" label="C"/></key>
        <key><binding label="v"/><binding shift="true" label="V"/></key>
        <key><binding label="b"/><binding shift="true" label="B"/></key>
        <key><binding label="n"/><binding shift="true" label="N"/></key>
        <key><binding label="m"/><binding shift="true" label="M"/></key>
        <key style="special" width="large"><binding action="backspace"/></key>
      </row>
      <row>
        <key style="special"><binding action="sym" label="?123"/></key>
        <key id="email_url_dot_key"><binding label=","/><binding shift="true" label=";"/></key>
        <key width="stretched"><binding action="space"/></key>
        <key id="email_url_key"><binding label="."/><binding shift="true" label=":"/></key>
        <key style="special" width="large"><binding action="return"/></key>
      </row>
    </section>
  </layout>
</keyboard>
"#;

/// The set of loaded keyboards and the one currently active.
///
/// A document that fails to load never joins the set; the previously active
/// keyboard (or the built-in one) stays in effect.
#[derive(Clone, Debug)]
pub struct LayoutSet {
    loaded: Vec<(String, Keyboard)>,
    active: Option<usize>,
    builtin: Keyboard,
}

impl Default for LayoutSet {
    fn default() -> Self {
        Self::new()
    }
}

impl LayoutSet {
    /// Creates a set holding only the built-in keyboard.
    pub fn new() -> Self {
        let document =
            parse_keyboard(BUILTIN_LAYOUT, "builtin").expect("built-in layout is well-formed");
        let mut builtin = Keyboard::new(document.header);
        for item in document.items {
            if let DocumentItem::Layout(layout) = item {
                builtin.merge_layout(layout);
            }
        }
        Self {
            loaded: Vec::new(),
            active: None,
            builtin,
        }
    }

    /// Loads `name` and makes it active.
    ///
    /// On failure the error is returned and the active keyboard is unchanged.
    pub fn load<S: LayoutSource>(
        &mut self,
        loader: &LayoutLoader<S>,
        name: &str,
    ) -> Result<&Keyboard, LayoutError> {
        let keyboard = match loader.load(name) {
            Ok(keyboard) => keyboard,
            Err(err) => {
                tracing::warn!(name, error = %err, "layout failed to load, keeping previous");
                return Err(err);
            }
        };
        let idx = match self.loaded.iter().position(|(n, _)| n == name) {
            Some(idx) => {
                self.loaded[idx].1 = keyboard;
                idx
            }
            None => {
                self.loaded.push((name.to_owned(), keyboard));
                self.loaded.len() - 1
            }
        };
        self.active = Some(idx);
        Ok(&self.loaded[idx].1)
    }

    /// Makes an already loaded keyboard active. Returns `false` if `name` is not loaded.
    pub fn activate(&mut self, name: &str) -> bool {
        match self.loaded.iter().position(|(n, _)| n == name) {
            Some(idx) => {
                self.active = Some(idx);
                true
            }
            None => false,
        }
    }

    /// Name of the active keyboard, or `None` when the built-in one is in use.
    pub fn active_name(&self) -> Option<&str> {
        self.active.map(|idx| self.loaded[idx].0.as_str())
    }

    /// The active keyboard.
    pub fn active(&self) -> &Keyboard {
        self.active
            .map_or(&self.builtin, |idx| &self.loaded[idx].1)
    }

    /// The built-in keyboard.
    pub fn builtin(&self) -> &Keyboard {
        &self.builtin
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{LayoutKind, Orientation};

    fn doc(body: &str) -> String {
        alloc::format!("<keyboard>{body}</keyboard>")
    }

    fn layout(orientation: &str, label: &str) -> String {
        alloc::format!(
            r#"<layout type="general" orientation="{orientation}"><section id="main"><row><key><binding label="{label}"/></key></row></section></layout>"#
        )
    }

    fn first_label(kb: &Keyboard, orientation: Orientation) -> &str {
        let layout = kb
            .layout_exact(LayoutKind::General, orientation)
            .expect("layout present");
        &layout.sections[0].rows[0].keys[0].binding(false).label
    }

    #[test]
    fn second_import_overrides_portrait_only() {
        let mut source = MemorySource::new();
        source
            .insert(
                "first.xml",
                doc(&(layout("landscape", "l1") + &layout("portrait", "p1"))),
            )
            .insert("second.xml", doc(&layout("portrait", "p2")))
            .insert(
                "main.xml",
                doc(r#"<import file="first.xml"/><import file="second.xml"/>"#),
            );
        let kb = LayoutLoader::new(source).load("main.xml").unwrap();

        assert_eq!(first_label(&kb, Orientation::Landscape), "l1");
        assert_eq!(first_label(&kb, Orientation::Portrait), "p2");
        assert_eq!(kb.layouts.len(), 2, "no duplicate layout entries");
    }

    #[test]
    fn import_cycle_is_an_error() {
        let mut source = MemorySource::new();
        source
            .insert("a.xml", doc(r#"<import file="b.xml"/>"#))
            .insert("b.xml", doc(r#"<import file="a.xml"/>"#));
        let err = LayoutLoader::new(source).load("a.xml").unwrap_err();
        assert!(matches!(err, LayoutError::ImportCycle { ref file } if file == "a.xml"));
    }

    #[test]
    fn same_file_may_be_imported_twice_sequentially() {
        let mut source = MemorySource::new();
        source
            .insert("common.xml", doc(&layout("landscape", "c")))
            .insert(
                "main.xml",
                doc(r#"<import file="common.xml"/><import file="common.xml"/>"#),
            );
        assert!(LayoutLoader::new(source).load("main.xml").is_ok());
    }

    #[test]
    fn companions_load_on_request() {
        let mut source = MemorySource::new();
        source
            .insert("sym.xml", doc(&layout("landscape", "!")))
            .insert(
                "main.xml",
                doc(&(layout("landscape", "a")
                    + r#"<import><symview src="sym.xml"/></import>"#)),
            );
        let loader = LayoutLoader::new(source);
        let kb = loader.load("main.xml").unwrap();
        let companions = loader.load_companions(&kb).unwrap();
        assert_eq!(companions.symview.len(), 1);
        assert_eq!(first_label(&companions.symview[0], Orientation::Landscape), "!");
        assert!(companions.number.is_empty());
    }

    #[test]
    fn failed_load_keeps_previous_active() {
        let mut source = MemorySource::new();
        source
            .insert("good.xml", doc(&layout("landscape", "g")))
            .insert("bad.xml", doc("<layot/>"));
        let loader = LayoutLoader::new(source);
        let mut set = LayoutSet::new();

        assert_eq!(set.active_name(), None);
        assert_eq!(first_label(set.active(), Orientation::Landscape), "q");

        set.load(&loader, "good.xml").unwrap();
        assert!(set.load(&loader, "bad.xml").is_err());
        assert!(set.load(&loader, "missing.xml").is_err());
        assert_eq!(set.active_name(), Some("good.xml"));
        assert_eq!(first_label(set.active(), Orientation::Landscape), "g");
        assert!(!set.activate("bad.xml"), "failed documents are not in the set");
    }
}
