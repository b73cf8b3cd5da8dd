// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Types a sentence by tapping the centers of keys on a layout.
//!
//! This example shows how to:
//! - load a keyboard document, falling back to the built-in layout,
//! - drive a `KeyboardSession` with press/release pairs and deadlines,
//! - implement `InputContext` with surrounding text so auto-capitalization
//!   and dead keys take effect.
//!
//! Run:
//! - `cargo run -p understory_kbd_demos --example type_text`
//! - `cargo run -p understory_kbd_demos --example type_text -- /path/to/layout.xml config.toml`
//!
//! Set `RUST_LOG=debug` to see the dispatcher and session traces.

use std::error::Error;

use kurbo::Point;
use understory_kbd_input::{
    InputConfig, InputContext, KeyEvent, KeyboardSession, Notification, SurroundingText,
};
use understory_kbd_layout::{
    Action, FileSource, LayoutLoader, LayoutSearchPaths, LayoutSet,
};
use understory_kbd_state::{KeyId, KeyInstance};

/// A single-line text field with the cursor at the end.
#[derive(Debug, Default)]
struct Field {
    text: String,
    preedit: String,
}

impl InputContext for Field {
    fn send_key_event(&mut self, event: &KeyEvent) {
        match event.text.as_str() {
            "\u{8}" => {
                self.text.pop();
            }
            text => self.text.push_str(text),
        }
    }

    fn send_commit_string(&mut self, text: &str) {
        self.preedit.clear();
        self.text.push_str(text);
    }

    fn send_preedit_string(&mut self, text: &str, _has_candidates: bool) {
        self.preedit = text.to_owned();
    }

    fn surrounding_text(&self) -> Option<SurroundingText> {
        Some(SurroundingText::new(self.text.clone(), self.text.len()))
    }
}

/// Finds the key in area 0 whose unshifted binding matches `pred`.
fn find_key(
    session: &KeyboardSession<Field>,
    pred: impl Fn(&KeyInstance) -> bool,
) -> Option<KeyId> {
    let area = session.area(0)?;
    area.keys()
        .find(|&id| session.keys().get(id).is_some_and(&pred))
}

fn tap(session: &mut KeyboardSession<Field>, key: KeyId, now: &mut u64) {
    let Some(center) = session
        .area(0)
        .and_then(|area| area.key_rect(key))
        .map(|rect| rect.center())
    else {
        return;
    };
    let mut notes = session.touch_press(0, None, center, *now);
    *now += 40;
    notes.extend(session.touch_release(0, None, center, *now));
    *now += 80;
    notes.extend(session.update_context());
    for note in notes {
        match note {
            Notification::ShiftChanged(state) => tracing::info!(?state, "shift"),
            Notification::AccentChanged(accent) => tracing::info!(?accent, "accent"),
            Notification::SpecialKey(special) => tracing::info!(?special, "host action"),
            _ => {}
        }
    }
}

fn type_char(session: &mut KeyboardSession<Field>, c: char, now: &mut u64) {
    let (dead, base) = match c {
        'é' => (Some("´"), 'e'),
        'è' => (Some("`"), 'e'),
        c => (None, c),
    };
    if let Some(mark) = dead {
        match find_key(session, |k| k.key().binding(false).label == mark) {
            Some(key) => tap(session, key, now),
            None => tracing::warn!(mark, "no dead key"),
        }
    }
    let key = if base == ' ' {
        find_key(session, |k| k.key().binding(false).action == Action::Space)
    } else {
        let mut buf = [0; 4];
        let label: &str = base.encode_utf8(&mut buf);
        find_key(session, |k| k.key().binding(false).label == label)
    };
    match key {
        Some(key) => tap(session, key, now),
        None => tracing::warn!(%c, "character not on the layout"),
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let mut args = std::env::args().skip(1);
    let mut layouts = LayoutSet::new();
    if let Some(path) = args.next() {
        let loader = LayoutLoader::new(FileSource::new(LayoutSearchPaths::default()));
        if layouts.load(&loader, &path).is_err() {
            tracing::warn!(%path, "using the built-in layout");
        }
    }
    let config: InputConfig = match args.next() {
        Some(path) => toml::from_str(&std::fs::read_to_string(path)?)?,
        None => InputConfig::default(),
    };

    let mut session = KeyboardSession::new(Field::default(), config);
    if !session.activate(layouts.active()) {
        return Err("keyboard has no usable layout".into());
    }
    session.update_context();

    let mut now = 0;
    for c in "hello, world. a café in the morning.".chars() {
        type_char(&mut session, c, &mut now);
    }
    while let Some(deadline) = session.next_deadline() {
        session.poll(deadline);
    }

    tracing::info!(text = %session.context().text, "typed");
    println!("{}", session.context().text);
    Ok(())
}
