// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Understory Keyboard State: runtime state of the keys of an on-screen keyboard.
//!
//! Every key of the active layout gets a [`KeyInstance`] in a [`KeySet`]. The
//! set hands out generational [`KeyId`]s, which are what touch dispatch and
//! emitted events carry around; nothing needs to walk a widget tree to find
//! out which key was hit.
//!
//! A key instance tracks:
//!
//! - Its [`KeyState`]: Normal, Pressed, Selected (locked), or Disabled.
//! - How many touch points are on it (at most [`MAX_TOUCH_POINTS`]).
//! - Whether gravity hysteresis is active.
//! - The shift level, dead-key [`Accent`](understory_kbd_binding::Accent), and
//!   binding overrides it currently shows, with the resulting label cached.
//!
//! The [`ActiveKeyRegistry`] lists pressed and selected keys in press order.
//! It belongs to the `KeySet`, not to a global, so independent keyboards never
//! share state. Scans that used to need a visitor are plain iterator queries:
//! [`KeySet::find_active`] and [`KeySet::special_keys`].
//!
//! Resets come in two flavors, see [`ResetPolicy`].
//!
//! This crate is `no_std` and uses `alloc`.

#![no_std]

extern crate alloc;

mod instance;
mod registry;
mod set;
mod types;

pub use instance::{KeyInstance, MAX_TOUCH_POINTS};
pub use registry::ActiveKeyRegistry;
pub use set::KeySet;
pub use types::{
    KeyCapabilities, KeyId, KeyOverride, KeyState, ResetOutcome, ResetPolicy, SpecialKeys,
};
