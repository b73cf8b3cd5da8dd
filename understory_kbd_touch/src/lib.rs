// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Understory Keyboard Touch: turns raw touch points into key events.
//!
//! This crate sits between the host's touch input and the key state in
//! [`understory_kbd_state`]:
//!
//! - [`KeyArea`]: one layout section instantiated in a
//!   [`KeySet`](understory_kbd_state::KeySet), with its geometry and canonical
//!   shift key.
//! - [`KeyGrid`]: binary-search hit testing over row and key intervals.
//! - [`TouchDispatcher`]: the per-touch state machine. Press, move, and release
//!   calls return [`AreaEvent`]s instead of invoking callbacks.
//! - [`Timer`]: the deadline type behind long press; the host drives it by
//!   calling [`TouchDispatcher::poll`] at [`TouchDispatcher::next_deadline`].
//! - [`TouchConfig`] and [`KeyMetrics`]: tunables, loadable from TOML with the
//!   `serde` feature.
//!
//! Dispatch never fails: misses leave a touch unassigned, refused touch
//! points are reported through booleans, and unknown touch ids are ignored.
//!
//! This crate is `no_std` and uses `alloc`.

#![no_std]

extern crate alloc;

mod area;
mod config;
mod dispatcher;
mod grid;
mod timer;

pub use area::{EMAIL_URL_DOT_KEY, EMAIL_URL_KEY, KeyArea};
pub use config::{AbortPolicy, KeyMetrics, TouchConfig};
pub use dispatcher::{AreaEvent, AreaEvents, KeyTouch, PointerId, TouchDispatcher, TouchPoint};
pub use grid::KeyGrid;
pub use timer::Timer;
