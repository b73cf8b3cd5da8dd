// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Single-shot deadlines driven by the host clock.

/// A single-shot timer expressed as a deadline in milliseconds.
///
/// Nothing runs in the background: the host calls `poll`-style methods with
/// the current time and asks [`Timer::deadline`] when to wake up next. Arming
/// an armed timer replaces its deadline.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct Timer {
    deadline: Option<u64>,
}

impl Timer {
    /// An idle timer.
    pub const fn new() -> Self {
        Self { deadline: None }
    }

    /// Fires `delay` milliseconds after `now`.
    pub fn arm(&mut self, now: u64, delay: u64) {
        self.deadline = Some(now.saturating_add(delay));
    }

    /// Disarms the timer.
    pub fn cancel(&mut self) {
        self.deadline = None;
    }

    /// Whether the timer is armed.
    pub fn is_armed(&self) -> bool {
        self.deadline.is_some()
    }

    /// When the timer fires, if armed.
    pub fn deadline(&self) -> Option<u64> {
        self.deadline
    }

    /// Returns `true` and disarms if the deadline has passed.
    pub fn fire(&mut self, now: u64) -> bool {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fires_once_at_deadline() {
        let mut timer = Timer::new();
        timer.arm(1000, 600);
        assert!(!timer.fire(1599));
        assert!(timer.fire(1600));
        assert!(!timer.fire(1700), "single shot");
    }

    #[test]
    fn rearming_replaces() {
        let mut timer = Timer::new();
        timer.arm(0, 100);
        timer.arm(50, 100);
        assert_eq!(timer.deadline(), Some(150));
        assert!(!timer.fire(100));
        timer.cancel();
        assert!(!timer.is_armed());
    }
}
