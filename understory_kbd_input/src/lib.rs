// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Understory Keyboard Input: modifiers, key events, and keyboard sessions.
//!
//! The lower crates describe keys and turn touches into [`AreaEvent`]s. This
//! crate decides what those events mean for the text field:
//!
//! - [`ModifierLatch`]: the Clear → Latched → Locked cycle of shift and Fn,
//!   with press-and-hold and auto-capitalization.
//! - [`DeadKeyLock`]: which dead key is locked and the [`Accent`] it applies.
//! - [`KeyEventHandler`]: turns area events into [`KeyEvent`]s and suppresses
//!   the shift click after shift was held for another key.
//! - [`AutoRepeat`] and [`CycleTracker`]: backspace repeat and multitap, both
//!   driven by deadlines.
//! - [`InputContext`]: the host's text field.
//! - [`KeyboardSession`]: wires all of the above to one active layout.
//!
//! ```
//! use kurbo::Point;
//! use understory_kbd_input::{InputConfig, InputContext, KeyEvent, KeyboardSession};
//! use understory_kbd_layout::LayoutSet;
//!
//! #[derive(Default)]
//! struct Field(String);
//!
//! impl InputContext for Field {
//!     fn send_key_event(&mut self, event: &KeyEvent) {
//!         self.0.push_str(&event.text);
//!     }
//!     fn send_commit_string(&mut self, text: &str) {
//!         self.0.push_str(text);
//!     }
//!     fn send_preedit_string(&mut self, _text: &str, _has_candidates: bool) {}
//! }
//!
//! let layouts = LayoutSet::new();
//! let mut session = KeyboardSession::new(Field::default(), InputConfig::default());
//! assert!(session.activate(layouts.active()));
//!
//! let area = session.area(0).unwrap();
//! let q = area
//!     .keys()
//!     .find(|&id| session.keys().get(id).is_some_and(|k| k.label() == "q"))
//!     .unwrap();
//! let center: Point = area.key_rect(q).unwrap().center();
//!
//! session.touch_press(0, None, center, 0);
//! session.touch_release(0, None, center, 40);
//! assert_eq!(session.context().0, "q");
//! ```
//!
//! [`AreaEvent`]: understory_kbd_touch::AreaEvent
//! [`Accent`]: understory_kbd_binding::Accent
//!
//! This crate is `no_std` and uses `alloc`.

#![no_std]

extern crate alloc;

mod autocaps;
mod config;
mod context;
mod cycle;
mod dead_key;
mod event;
mod handler;
mod modifier;
mod repeat;
mod session;

pub use autocaps::{OBJECT_REPLACEMENT, triggers_auto_caps};
pub use config::InputConfig;
pub use context::{ContentType, InputContext, SurroundingText};
pub use cycle::{CycleStep, CycleTracker};
pub use dead_key::{DeadKeyChange, DeadKeyLock};
pub use event::{KeyEvent, KeyEventKind, Modifiers};
pub use handler::KeyEventHandler;
pub use modifier::{ModifierLatch, ModifierState};
pub use repeat::{AutoRepeat, RepeatEnd};
pub use session::{KeyboardSession, Modifier, Notification, Notifications};
