// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Multitap cycling.

use alloc::string::String;
use alloc::vec::Vec;

use understory_kbd_state::KeyId;
use understory_kbd_touch::Timer;

/// Result of a click on a cycle key.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CycleStep {
    /// Text committed because a previous cycle ended.
    pub commit: Option<String>,
    /// The character now shown as preedit.
    pub preedit: String,
}

/// Rotates through a key's cycle set on repeated clicks.
///
/// Clicking the same cycle key within the timeout advances to the next
/// character; the pending character is committed by a click on another key
/// or when the timeout passes.
///
/// ```
/// # use std::sync::Arc;
/// # use understory_kbd_layout::{Action, Binding, Key};
/// # let key = understory_kbd_state::KeySet::new()
/// #     .insert(Arc::new(Key::single(Binding::new(Action::Cycle, "abc"))));
/// use understory_kbd_input::CycleTracker;
///
/// let mut cycle = CycleTracker::new(1500);
/// assert_eq!(cycle.on_click(key, "abc", 0).preedit, "a");
/// assert_eq!(cycle.on_click(key, "abc", 400).preedit, "b");
/// assert_eq!(cycle.poll(1899), None);
/// assert_eq!(cycle.poll(1900).as_deref(), Some("b"));
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CycleTracker {
    timeout: u64,
    timer: Timer,
    key: Option<KeyId>,
    set: Vec<char>,
    index: usize,
}

impl CycleTracker {
    /// An idle tracker committing after `timeout` milliseconds.
    pub fn new(timeout: u64) -> Self {
        Self {
            timeout,
            timer: Timer::new(),
            key: None,
            set: Vec::new(),
            index: 0,
        }
    }

    /// The character waiting to be committed.
    pub fn pending(&self) -> Option<char> {
        self.key?;
        self.set.get(self.index).copied()
    }

    /// When the pending character commits.
    pub fn deadline(&self) -> Option<u64> {
        self.timer.deadline()
    }

    /// Handles a click on cycle key `key` whose set is `cycle_set`.
    pub fn on_click(&mut self, key: KeyId, cycle_set: &str, now: u64) -> CycleStep {
        let mut step = CycleStep::default();
        if self.key == Some(key) && !self.set.is_empty() {
            self.index = (self.index + 1) % self.set.len();
        } else {
            step.commit = self.commit();
            self.set = cycle_set.chars().collect();
            self.index = 0;
            self.key = (!self.set.is_empty()).then_some(key);
        }
        if let Some(c) = self.pending() {
            step.preedit.push(c);
            self.timer.arm(now, self.timeout);
        }
        step
    }

    /// Commits the pending character, if any, ending the cycle.
    pub fn commit(&mut self) -> Option<String> {
        let pending = self.pending();
        self.cancel();
        pending.map(String::from)
    }

    /// Ends the cycle without committing.
    pub fn cancel(&mut self) {
        self.timer.cancel();
        self.key = None;
        self.set.clear();
        self.index = 0;
    }

    /// Commits the pending character once the timeout has passed.
    pub fn poll(&mut self, now: u64) -> Option<String> {
        if self.timer.fire(now) {
            self.commit()
        } else {
            None
        }
    }
}
