// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Backspace auto-repeat.

use understory_kbd_state::KeyId;
use understory_kbd_touch::Timer;

/// How a repeating key ended.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum RepeatEnd {
    /// The key was not repeating.
    Idle,
    /// Released before the first repeat; the click delivers the single event.
    Single,
    /// At least one repeat fired; the click must not add another event.
    Repeated,
}

/// Repeats a held key after `delay`, then every `interval` milliseconds.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct AutoRepeat {
    delay: u64,
    interval: u64,
    timer: Timer,
    key: Option<KeyId>,
    fired: bool,
}

impl AutoRepeat {
    /// A stopped repeater.
    pub fn new(delay: u64, interval: u64) -> Self {
        Self {
            delay,
            interval: interval.max(1),
            timer: Timer::new(),
            key: None,
            fired: false,
        }
    }

    /// The repeating key.
    pub fn key(&self) -> Option<KeyId> {
        self.key
    }

    /// When the next repeat fires.
    pub fn deadline(&self) -> Option<u64> {
        self.timer.deadline()
    }

    /// Starts repeating `key`, replacing any other key.
    pub fn start(&mut self, key: KeyId, now: u64) {
        self.key = Some(key);
        self.fired = false;
        self.timer.arm(now, self.delay);
    }

    /// Returns the key to repeat if a repeat is due, and re-arms.
    pub fn poll(&mut self, now: u64) -> Option<KeyId> {
        let deadline = self.timer.deadline()?;
        if !self.timer.fire(now) {
            return None;
        }
        self.fired = true;
        self.timer.arm(deadline, self.interval);
        self.key
    }

    /// Stops repeating `key`. Other keys are ignored.
    pub fn release(&mut self, key: KeyId) -> RepeatEnd {
        if self.key != Some(key) {
            return RepeatEnd::Idle;
        }
        self.stop()
    }

    /// Stops repeating whatever key is repeating.
    pub fn stop(&mut self) -> RepeatEnd {
        self.timer.cancel();
        let end = match (self.key.take(), self.fired) {
            (None, _) => RepeatEnd::Idle,
            (Some(_), false) => RepeatEnd::Single,
            (Some(_), true) => RepeatEnd::Repeated,
        };
        self.fired = false;
        end
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::sync::Arc;
    use understory_kbd_layout::{Action, Binding, Key};
    use understory_kbd_state::KeySet;

    fn backspace() -> KeyId {
        let mut keys = KeySet::new();
        keys.insert(Arc::new(Key::single(Binding::new(Action::Backspace, ""))))
    }

    #[test]
    fn repeats_after_delay_then_interval() {
        let key = backspace();
        let mut repeat = AutoRepeat::new(500, 100);
        repeat.start(key, 1000);
        assert_eq!(repeat.poll(1499), None);
        assert_eq!(repeat.poll(1500), Some(key));
        assert_eq!(repeat.deadline(), Some(1600));
        assert_eq!(repeat.poll(1550), None);
        assert_eq!(repeat.poll(1600), Some(key));
        assert_eq!(repeat.release(key), RepeatEnd::Repeated);
        assert_eq!(repeat.poll(5000), None);
    }

    #[test]
    fn quick_release_is_a_single_event() {
        let key = backspace();
        let mut repeat = AutoRepeat::new(500, 100);
        repeat.start(key, 0);
        assert_eq!(repeat.release(key), RepeatEnd::Single);
        assert_eq!(repeat.release(key), RepeatEnd::Idle);
    }
}
