// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Multi-touch to key dispatch with gravity hysteresis.
//!
//! A [`TouchDispatcher`] correlates touch points with the keys of one
//! [`KeyArea`]. Each touch id is either unassigned or assigned to a key, and
//! every press, move, and release updates the shared [`KeySet`] and returns the
//! [`AreaEvent`]s the presentation layer should see.
//!
//! ## Dispatch rules
//!
//! 1. **Press**: the key under the (offset-corrected) point gains a touch point.
//!    The first touch on a key emits [`AreaEvent::Pressed`] and arms the
//!    long-press timer for this touch.
//! 2. **Move**: while the point stays inside the assigned key's rectangle
//!    grown by the gravity margins, the assignment holds even if another key
//!    is under the finger. Otherwise the touch moves to whatever key is under
//!    it, releasing the old key and pressing the new one.
//! 3. **Release**: handled as a move to the release point followed by the
//!    release of the assigned key. A non-aborted release of an enabled key
//!    emits exactly one [`AreaEvent::Clicked`], or [`AreaEvent::DeadKeyClicked`]
//!    for dead keys.
//! 4. **Reset**: drops every touch and clears the registry without emitting
//!    anything.
//!
//! ```
//! use std::sync::Arc;
//! use kurbo::{Point, Rect};
//! use understory_kbd_layout::{Action, Binding, Key, Row, Section, SectionKind};
//! use understory_kbd_state::KeySet;
//! use understory_kbd_touch::{AreaEvent, KeyArea, TouchConfig, TouchDispatcher};
//!
//! let key = |l: &str| Arc::new(Key::single(Binding::new(Action::Insert, l)));
//! let section = Arc::new(Section {
//!     id: "main".into(),
//!     movable: true,
//!     kind: SectionKind::NonSloppy,
//!     style: String::new(),
//!     rows: vec![Row { keys: vec![key("q"), key("w")], ..Row::default() }],
//! });
//!
//! let mut keys = KeySet::new();
//! let mut area = KeyArea::new(section, &mut keys);
//! let (q, w) = (area.rows()[0][0], area.rows()[0][1]);
//! area.set_geometry([[
//!     (q, Rect::new(0.0, 0.0, 50.0, 40.0)),
//!     (w, Rect::new(50.0, 0.0, 100.0, 40.0)),
//! ]]);
//!
//! let mut touch = TouchDispatcher::new(TouchConfig::default().with_gravity(5.0, 5.0));
//! touch.on_press(&mut keys, &area, None, Point::new(48.0, 10.0), 0);
//! touch.on_move(&mut keys, &area, None, Point::new(53.0, 10.0), 10);
//! let events = touch.on_release(&mut keys, &area, None, Point::new(53.0, 10.0), 20);
//!
//! // Gravity kept the touch on `q` although the finger ended on `w`.
//! assert!(events.iter().any(|e| matches!(e, AreaEvent::Clicked(t) if t.key == q)));
//! assert_eq!(keys.last_active_key(), None);
//! ```

use alloc::collections::BTreeMap;
use core::num::NonZeroU64;

use kurbo::{Point, Rect};
use smallvec::SmallVec;
use understory_kbd_binding::Accent;
use understory_kbd_state::{
    KeyCapabilities, KeyId, KeyInstance, KeySet, ResetOutcome, ResetPolicy,
};

use crate::area::KeyArea;
use crate::config::{AbortPolicy, TouchConfig};
use crate::timer::Timer;

/// Touch identifier for tracking concurrent touch points.
pub type PointerId = NonZeroU64;

/// Events produced by one dispatch call, in emission order.
pub type AreaEvents = SmallVec<[AreaEvent; 4]>;

/// State of one touch point.
#[derive(Clone, Debug, PartialEq)]
pub struct TouchPoint {
    /// Key the touch is assigned to, if any.
    pub key: Option<KeyId>,
    /// Key the touch landed on when it went down.
    pub pressed_key: Option<KeyId>,
    /// Current corrected position.
    pub position: Point,
    /// Position before the last move.
    pub previous: Point,
    /// Timestamp of the press in milliseconds.
    pub down_time: u64,
    /// The touch already produced its click (rollover) and will not click again.
    pub spent: bool,
}

/// A key together with the modifier context of the touch that hit it.
#[derive(Clone, Debug, PartialEq)]
pub struct KeyTouch {
    /// The key.
    pub key: KeyId,
    /// The touch that caused the event.
    pub touch: PointerId,
    /// Accent of the locked dead key, if any.
    pub accent: Option<Accent>,
    /// Whether the shifted level applies (shift is down or forced).
    pub upper_case: bool,
    /// Corrected touch position.
    pub position: Point,
    /// `position` clamped inside the key, for presentation feedback.
    pub correction: Point,
}

/// Notification for the presentation layer.
#[derive(Clone, Debug, PartialEq)]
pub enum AreaEvent {
    /// A key got its first touch point.
    Pressed(KeyTouch),
    /// A key lost its last touch point.
    Released(KeyTouch),
    /// A non-dead key was clicked.
    Clicked(KeyTouch),
    /// A dead key was clicked.
    DeadKeyClicked(KeyTouch),
    /// A key was held past the long-press timeout.
    LongPressed(KeyTouch),
}

impl AreaEvent {
    /// The payload common to all variants.
    pub fn key_touch(&self) -> &KeyTouch {
        match self {
            Self::Pressed(t)
            | Self::Released(t)
            | Self::Clicked(t)
            | Self::DeadKeyClicked(t)
            | Self::LongPressed(t) => t,
        }
    }
}

/// Per-area touch state machine.
#[derive(Clone, Debug, Default)]
pub struct TouchDispatcher {
    touches: BTreeMap<PointerId, TouchPoint>,
    config: TouchConfig,
    long_press: Option<(PointerId, KeyId)>,
    long_press_timer: Timer,
    upper_case: bool,
}

fn pointer_or_default(pointer_id: Option<PointerId>) -> PointerId {
    pointer_id.unwrap_or(NonZeroU64::new(1).expect("1 is valid non-zero"))
}

impl TouchDispatcher {
    /// Creates a dispatcher with the given configuration.
    pub fn new(config: TouchConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    /// The configuration.
    pub fn config(&self) -> &TouchConfig {
        &self.config
    }

    /// Replaces the configuration. Active touches keep their assignments.
    pub fn set_config(&mut self, config: TouchConfig) {
        self.config = config;
    }

    /// Forces the shifted level on every emitted key touch.
    pub fn set_upper_case(&mut self, upper_case: bool) {
        self.upper_case = upper_case;
    }

    /// The state of a touch, if it is down.
    pub fn touch(&self, pointer_id: PointerId) -> Option<&TouchPoint> {
        self.touches.get(&pointer_id)
    }

    /// All touches that are down.
    pub fn touches(&self) -> impl Iterator<Item = (PointerId, &TouchPoint)> {
        self.touches.iter().map(|(&id, t)| (id, t))
    }

    /// When [`TouchDispatcher::poll`] next has work, if ever.
    pub fn next_deadline(&self) -> Option<u64> {
        self.long_press_timer.deadline()
    }

    /// Handles a touch going down.
    ///
    /// A press for a touch id that is already down first drops the old touch
    /// without a click.
    pub fn on_press(
        &mut self,
        keys: &mut KeySet,
        area: &KeyArea,
        pointer_id: Option<PointerId>,
        position: Point,
        timestamp: u64,
    ) -> AreaEvents {
        let pointer_id = pointer_or_default(pointer_id);
        let mut events = AreaEvents::new();
        if let Some(old) = self.touches.remove(&pointer_id) {
            tracing::debug!(?pointer_id, "press on a touch that is already down");
            if let Some(key) = old.key {
                self.leave_key(keys, area, pointer_id, key, old.position, true, &mut events);
            }
        }

        let position = self.offset(position);
        let hit = area.key_at(
            position,
            self.config.sloppy_margin,
            self.config.lock_vertical_movement,
        );
        if self.config.rollover_commit && hit.is_some() {
            self.rollover(keys, area, hit, &mut events);
        }

        let key = match hit {
            Some(key)
                if self.enter_key(
                    keys,
                    area,
                    pointer_id,
                    key,
                    position,
                    timestamp,
                    true,
                    &mut events,
                ) =>
            {
                Some(key)
            }
            _ => None,
        };
        tracing::debug!(?pointer_id, ?key, ?position, "touch pressed");
        self.touches.insert(
            pointer_id,
            TouchPoint {
                key,
                pressed_key: key,
                position,
                previous: position,
                down_time: timestamp,
                spent: false,
            },
        );
        events
    }

    /// Handles a touch moving. Unknown touch ids are ignored.
    pub fn on_move(
        &mut self,
        keys: &mut KeySet,
        area: &KeyArea,
        pointer_id: Option<PointerId>,
        position: Point,
        timestamp: u64,
    ) -> AreaEvents {
        let pointer_id = pointer_or_default(pointer_id);
        let mut events = AreaEvents::new();
        self.move_touch(
            keys,
            area,
            pointer_id,
            self.offset(position),
            timestamp,
            true,
            &mut events,
        );
        events
    }

    /// Handles a touch going up. Unknown touch ids are ignored.
    ///
    /// The release point first moves the touch. A key entered by that move is
    /// clicked without a press/release pair of its own. A key whose touch
    /// point was dropped while the touch was down, e.g. by disabling it, is
    /// never clicked.
    pub fn on_release(
        &mut self,
        keys: &mut KeySet,
        area: &KeyArea,
        pointer_id: Option<PointerId>,
        position: Point,
        timestamp: u64,
    ) -> AreaEvents {
        let pointer_id = pointer_or_default(pointer_id);
        let mut events = AreaEvents::new();
        let position = self.offset(position);
        let before = self.touches.get(&pointer_id).and_then(|t| t.key);
        self.move_touch(keys, area, pointer_id, position, timestamp, false, &mut events);

        let Some(touch) = self.touches.remove(&pointer_id) else {
            return events;
        };
        let Some(key) = touch.key else {
            tracing::trace!(?pointer_id, "unassigned touch released");
            return events;
        };

        let aborted = match self.config.abort_policy {
            AbortPolicy::NoKeyUnderRelease => area
                .key_at(
                    position,
                    self.config.sloppy_margin,
                    self.config.lock_vertical_movement,
                )
                .is_none(),
            AbortPolicy::LeftPressedKey => touch.pressed_key != Some(key),
        };
        let enabled = keys.get(key).is_some_and(KeyInstance::is_enabled);
        let click = (enabled && !aborted && !touch.spent)
            .then(|| self.key_touch(keys, area, pointer_id, key, position));

        let announce = before == Some(key);
        let counted = self.leave_key(keys, area, pointer_id, key, position, announce, &mut events);

        if let Some(click) = click.filter(|_| counted) {
            let dead = keys.capabilities(key).contains(KeyCapabilities::DEAD);
            tracing::debug!(?pointer_id, ?key, dead, "key clicked");
            events.push(if dead {
                AreaEvent::DeadKeyClicked(click)
            } else {
                AreaEvent::Clicked(click)
            });
        } else {
            tracing::debug!(?pointer_id, ?key, aborted, enabled, counted, "release without click");
        }
        events
    }

    /// Fires the long-press timer if its deadline has passed.
    pub fn poll(&mut self, keys: &KeySet, area: &KeyArea, now: u64) -> Option<AreaEvent> {
        if !self.long_press_timer.fire(now) {
            return None;
        }
        let (pointer_id, key) = self.long_press.take()?;
        let touch = self.touches.get(&pointer_id)?;
        if touch.key != Some(key) {
            return None;
        }
        tracing::debug!(?pointer_id, ?key, "long press");
        let position = touch.position;
        Some(AreaEvent::LongPressed(
            self.key_touch(keys, area, pointer_id, key, position),
        ))
    }

    /// Drops every touch and clears the registry per `policy`, emitting nothing.
    pub fn reset(&mut self, keys: &mut KeySet, policy: ResetPolicy) -> ResetOutcome {
        self.clear();
        keys.reset_active_keys(policy)
    }

    /// Forgets every touch and the long-press timer without touching key state.
    pub fn clear(&mut self) {
        self.touches.clear();
        self.long_press = None;
        self.long_press_timer.cancel();
    }

    fn offset(&self, position: Point) -> Point {
        Point::new(position.x, position.y + self.config.vertical_offset)
    }

    fn move_touch(
        &mut self,
        keys: &mut KeySet,
        area: &KeyArea,
        pointer_id: PointerId,
        position: Point,
        timestamp: u64,
        announce_enter: bool,
        events: &mut AreaEvents,
    ) {
        let Some(touch) = self.touches.get_mut(&pointer_id) else {
            return;
        };
        if touch.position == position {
            return;
        }
        touch.previous = touch.position;
        touch.position = position;
        let current = touch.key;

        if let Some(key) = current {
            let held = keys.get(key).is_some_and(KeyInstance::has_gravity)
                && area.key_rect(key).is_some_and(|rect| {
                    rect.inflate(self.config.horizontal_gravity, self.config.vertical_gravity)
                        .contains(position)
                });
            if held {
                tracing::trace!(?pointer_id, ?key, "gravity hold");
                return;
            }
        }

        let hit = area.key_at(
            position,
            self.config.sloppy_margin,
            self.config.lock_vertical_movement,
        );
        if hit == current {
            return;
        }
        if let Some(key) = current {
            self.leave_key(keys, area, pointer_id, key, position, true, events);
        }
        let key = match hit {
            Some(key)
                if self.enter_key(
                    keys,
                    area,
                    pointer_id,
                    key,
                    position,
                    timestamp,
                    announce_enter,
                    events,
                ) =>
            {
                Some(key)
            }
            _ => None,
        };
        tracing::debug!(?pointer_id, from = ?current, to = ?key, "touch reassigned");
        if let Some(touch) = self.touches.get_mut(&pointer_id) {
            touch.key = key;
        }
    }

    /// Adds a touch point to `key`. Returns `false` if the key refused it.
    ///
    /// `Pressed` is emitted for the first touch point only when `announce` is set.
    fn enter_key(
        &mut self,
        keys: &mut KeySet,
        area: &KeyArea,
        pointer_id: PointerId,
        key: KeyId,
        position: Point,
        timestamp: u64,
        announce: bool,
        events: &mut AreaEvents,
    ) -> bool {
        if !keys.increase_touch_point_count(key) {
            return false;
        }
        keys.activate_gravity(key);
        self.long_press = Some((pointer_id, key));
        self.long_press_timer
            .arm(timestamp, self.config.long_press_timeout);
        if announce && keys.get(key).is_some_and(|k| k.touch_point_count() == 1) {
            events.push(AreaEvent::Pressed(
                self.key_touch(keys, area, pointer_id, key, position),
            ));
        }
        true
    }

    /// Removes a touch point from `key` and cancels this touch's long press.
    fn leave_key(
        &mut self,
        keys: &mut KeySet,
        area: &KeyArea,
        pointer_id: PointerId,
        key: KeyId,
        position: Point,
        announce: bool,
        events: &mut AreaEvents,
    ) -> bool {
        if self.long_press.is_some_and(|(p, _)| p == pointer_id) {
            self.long_press = None;
            self.long_press_timer.cancel();
        }
        let counted = keys.decrease_touch_point_count(key);
        if counted && announce && keys.get(key).is_some_and(|k| k.touch_point_count() == 0) {
            events.push(AreaEvent::Released(
                self.key_touch(keys, area, pointer_id, key, position),
            ));
        }
        counted
    }

    /// Clicks the last pressed normal key of this area before `next` goes down.
    fn rollover(
        &mut self,
        keys: &mut KeySet,
        area: &KeyArea,
        next: Option<KeyId>,
        events: &mut AreaEvents,
    ) {
        let Some(last) = keys.last_active_key() else {
            return;
        };
        let eligible = Some(last) != next
            && keys.get(last).is_some_and(|k| {
                k.is_enabled()
                    && k.touch_point_count() > 0
                    && k.capabilities().contains(KeyCapabilities::NORMAL)
            });
        if !eligible {
            return;
        }
        let Some((&pointer_id, touch)) = self
            .touches
            .iter()
            .rev()
            .find(|(_, t)| t.key == Some(last) && !t.spent)
        else {
            return;
        };
        let position = touch.position;
        let click = self.key_touch(keys, area, pointer_id, last, position);
        tracing::debug!(?pointer_id, key = ?last, "rollover commit");

        for touch in self.touches.values_mut().filter(|t| t.key == Some(last)) {
            touch.key = None;
            touch.spent = true;
        }
        if self.long_press.is_some_and(|(_, k)| k == last) {
            self.long_press = None;
            self.long_press_timer.cancel();
        }
        keys.reset_touch_point_count(last);
        events.push(AreaEvent::Released(click.clone()));
        events.push(AreaEvent::Clicked(click));
    }

    fn key_touch(
        &self,
        keys: &KeySet,
        area: &KeyArea,
        pointer_id: PointerId,
        key: KeyId,
        position: Point,
    ) -> KeyTouch {
        let special = keys.special_keys();
        let accent = special
            .dead
            .and_then(|dead| keys.get(dead))
            .and_then(|dead| Accent::from_dead_key(dead.binding()));
        let upper_case = self.upper_case || special.shift.is_some_and(|shift| shift != key);
        let correction = area
            .key_rect(key)
            .map_or(position, |rect| correct(rect, position, self.config.correction_edge));
        KeyTouch {
            key,
            touch: pointer_id,
            accent,
            upper_case,
            position,
            correction,
        }
    }
}

/// Clamps `position` into `rect` shrunk by `edge` on every side.
fn correct(rect: Rect, position: Point, edge: f64) -> Point {
    let inner = rect.inset(-edge);
    if inner.width() <= 0.0 || inner.height() <= 0.0 {
        return rect.center();
    }
    Point::new(
        position.x.clamp(inner.x0, inner.x1),
        position.y.clamp(inner.y0, inner.y1),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::string::String;
    use alloc::sync::Arc;
    use alloc::vec;
    use alloc::vec::Vec;
    use understory_kbd_layout::{Action, Binding, BindingFlags, Key, Row, Section, SectionKind};
    use understory_kbd_state::{KeyOverride, KeyState};

    fn pid(n: u64) -> Option<PointerId> {
        NonZeroU64::new(n)
    }

    fn key(label: &str) -> Arc<Key> {
        Arc::new(Key::single(Binding::new(Action::Insert, label)))
    }

    /// `q` at x in [0, 50), `w` at [50, 100), `´` (dead) at [100, 150), shift at [150, 200).
    fn setup(config: TouchConfig) -> (KeySet, KeyArea, TouchDispatcher, [KeyId; 4]) {
        let section = Arc::new(Section {
            id: "main".into(),
            movable: true,
            kind: SectionKind::NonSloppy,
            style: String::new(),
            rows: vec![Row {
                keys: vec![
                    key("q"),
                    key("w"),
                    Arc::new(Key::single(
                        Binding::new(Action::Insert, "´")
                            .with_accents("aeiou", "áéíóú")
                            .with_flags(BindingFlags::DEAD),
                    )),
                    Arc::new(Key::single(Binding::new(Action::Shift, ""))),
                ],
                ..Row::default()
            }],
        });
        let mut keys = KeySet::new();
        let mut area = KeyArea::new(section, &mut keys);
        let ids: Vec<KeyId> = area.keys().collect();
        area.set_geometry([ids.iter().enumerate().map(|(i, &id)| {
            let x = 50.0 * i as f64;
            (id, Rect::new(x, 0.0, x + 50.0, 40.0))
        })]);
        let ids = [ids[0], ids[1], ids[2], ids[3]];
        (keys, area, TouchDispatcher::new(config), ids)
    }

    fn clicks(events: &AreaEvents) -> Vec<KeyId> {
        events
            .iter()
            .filter_map(|e| match e {
                AreaEvent::Clicked(t) => Some(t.key),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn gravity_holds_near_the_boundary() {
        let (mut keys, area, mut touch, [q, w, ..]) = setup(TouchConfig::default().with_gravity(5.0, 5.0));

        touch.on_press(&mut keys, &area, None, Point::new(48.0, 10.0), 0);
        assert_eq!(touch.touch(pid(1).unwrap()).unwrap().key, Some(q));

        let events = touch.on_move(&mut keys, &area, None, Point::new(53.0, 10.0), 10);
        assert!(events.is_empty());
        assert_eq!(touch.touch(pid(1).unwrap()).unwrap().key, Some(q), "within margin");

        let events = touch.on_move(&mut keys, &area, None, Point::new(60.0, 10.0), 20);
        assert_eq!(touch.touch(pid(1).unwrap()).unwrap().key, Some(w));
        assert!(matches!(&events[0], AreaEvent::Released(t) if t.key == q));
        assert!(matches!(&events[1], AreaEvent::Pressed(t) if t.key == w));
        assert_eq!(keys.get(q).unwrap().state(), KeyState::Normal);
    }

    #[test]
    fn release_clicks_the_assigned_key_once() {
        let (mut keys, area, mut touch, [q, ..]) = setup(TouchConfig::default());
        let events = touch.on_press(&mut keys, &area, None, Point::new(10.0, 10.0), 0);
        assert!(matches!(&events[..], [AreaEvent::Pressed(t)] if t.key == q));

        let events = touch.on_release(&mut keys, &area, None, Point::new(12.0, 10.0), 50);
        assert!(matches!(&events[0], AreaEvent::Released(t) if t.key == q));
        assert_eq!(clicks(&events), [q]);

        let events = touch.on_release(&mut keys, &area, None, Point::new(12.0, 10.0), 60);
        assert!(events.is_empty(), "second release of the same touch is a no-op");
    }

    #[test]
    fn release_off_the_keys_is_aborted() {
        let (mut keys, area, mut touch, _) = setup(TouchConfig::default());
        touch.on_press(&mut keys, &area, None, Point::new(10.0, 10.0), 0);
        let events = touch.on_release(&mut keys, &area, None, Point::new(10.0, 300.0), 50);
        assert!(clicks(&events).is_empty());
        assert!(keys.registry().is_empty());
    }

    #[test]
    fn sliding_policy_decides_abort() {
        let (mut keys, area, mut touch, [_, w, ..]) = setup(TouchConfig::default());
        touch.on_press(&mut keys, &area, None, Point::new(10.0, 10.0), 0);
        let events = touch.on_release(&mut keys, &area, None, Point::new(75.0, 10.0), 50);
        assert_eq!(clicks(&events), [w], "default policy clicks the key under release");

        let config = TouchConfig {
            abort_policy: AbortPolicy::LeftPressedKey,
            ..TouchConfig::default()
        };
        let (mut keys, area, mut touch, _) = setup(config);
        touch.on_press(&mut keys, &area, None, Point::new(10.0, 10.0), 0);
        let events = touch.on_release(&mut keys, &area, None, Point::new(75.0, 10.0), 50);
        assert!(clicks(&events).is_empty());
    }

    #[test]
    fn registry_is_empty_after_all_touches_release() {
        let (mut keys, area, mut touch, [q, w, ..]) = setup(TouchConfig::default());
        touch.on_press(&mut keys, &area, pid(1), Point::new(10.0, 10.0), 0);
        touch.on_press(&mut keys, &area, pid(2), Point::new(60.0, 10.0), 5);
        touch.on_press(&mut keys, &area, pid(3), Point::new(20.0, 10.0), 8);
        assert_eq!(keys.get(q).unwrap().touch_point_count(), 2);
        assert_eq!(keys.last_active_key(), Some(w));

        let first = touch.on_release(&mut keys, &area, pid(1), Point::new(10.0, 10.0), 20);
        assert_eq!(clicks(&first), [q]);
        assert!(
            !first.iter().any(|e| matches!(e, AreaEvent::Released(_))),
            "q is still held by touch 3"
        );
        touch.on_release(&mut keys, &area, pid(2), Point::new(60.0, 10.0), 25);
        touch.on_release(&mut keys, &area, pid(3), Point::new(20.0, 10.0), 30);
        assert_eq!(keys.last_active_key(), None);
        assert_eq!(touch.touches().count(), 0);
    }

    #[test]
    fn dead_keys_report_dead_clicks() {
        let (mut keys, area, mut touch, [_, _, acute, _]) = setup(TouchConfig::default());
        touch.on_press(&mut keys, &area, None, Point::new(110.0, 10.0), 0);
        let events = touch.on_release(&mut keys, &area, None, Point::new(110.0, 10.0), 10);
        assert!(clicks(&events).is_empty());
        assert!(matches!(events.last(), Some(AreaEvent::DeadKeyClicked(t)) if t.key == acute));
    }

    #[test]
    fn clicks_carry_locked_accent_and_held_shift() {
        let (mut keys, area, mut touch, [q, _, acute, shift]) = setup(TouchConfig::default());
        keys.set_selected(acute, true);
        touch.on_press(&mut keys, &area, pid(1), Point::new(160.0, 10.0), 0);
        touch.on_press(&mut keys, &area, pid(2), Point::new(10.0, 10.0), 5);
        let events = touch.on_release(&mut keys, &area, pid(2), Point::new(10.0, 10.0), 10);
        let Some(AreaEvent::Clicked(click)) = events.last() else {
            panic!("expected a click, got {events:?}");
        };
        assert_eq!(click.key, q);
        assert!(click.upper_case, "shift is held by touch 1");
        assert_eq!(click.accent.as_ref().map(Accent::mark), Some('´'));
        assert!(keys.registry().contains(shift));
    }

    #[test]
    fn long_press_fires_once_and_is_replaced_on_reassignment() {
        let (mut keys, area, mut touch, [_, w, ..]) = setup(TouchConfig::default());
        touch.on_press(&mut keys, &area, None, Point::new(10.0, 10.0), 0);
        assert_eq!(touch.next_deadline(), Some(600));
        touch.on_move(&mut keys, &area, None, Point::new(75.0, 10.0), 300);
        assert_eq!(touch.next_deadline(), Some(900), "re-arming replaces");

        assert_eq!(touch.poll(&keys, &area, 600), None);
        let fired = touch.poll(&keys, &area, 900);
        assert!(matches!(fired, Some(AreaEvent::LongPressed(t)) if t.key == w));
        assert_eq!(touch.poll(&keys, &area, 2000), None, "fires once");
    }

    #[test]
    fn release_cancels_long_press() {
        let (mut keys, area, mut touch, _) = setup(TouchConfig::default());
        touch.on_press(&mut keys, &area, None, Point::new(10.0, 10.0), 0);
        touch.on_release(&mut keys, &area, None, Point::new(10.0, 10.0), 100);
        assert_eq!(touch.next_deadline(), None);
        assert_eq!(touch.poll(&keys, &area, 1000), None);
    }

    #[test]
    fn reset_clears_everything_silently() {
        let (mut keys, area, mut touch, [q, ..]) = setup(TouchConfig::default());
        touch.on_press(&mut keys, &area, pid(1), Point::new(10.0, 10.0), 0);
        touch.on_press(&mut keys, &area, pid(2), Point::new(60.0, 10.0), 0);

        touch.reset(&mut keys, ResetPolicy::ClearAll);
        assert!(keys.registry().is_empty());
        assert_eq!(keys.get(q).unwrap().touch_point_count(), 0);
        assert_eq!(touch.next_deadline(), None);

        let events = touch.on_release(&mut keys, &area, pid(1), Point::new(10.0, 10.0), 10);
        assert!(events.is_empty(), "released touches were forgotten");
    }

    #[test]
    fn rollover_commits_the_held_key() {
        let config = TouchConfig {
            rollover_commit: true,
            ..TouchConfig::default()
        };
        let (mut keys, area, mut touch, [q, w, ..]) = setup(config);
        touch.on_press(&mut keys, &area, pid(1), Point::new(10.0, 10.0), 0);
        let events = touch.on_press(&mut keys, &area, pid(2), Point::new(60.0, 10.0), 5);
        assert_eq!(clicks(&events), [q]);
        assert_eq!(keys.get(q).unwrap().touch_point_count(), 0);

        let events = touch.on_release(&mut keys, &area, pid(1), Point::new(10.0, 10.0), 10);
        assert!(clicks(&events).is_empty(), "spent touch does not click again");
        let events = touch.on_release(&mut keys, &area, pid(2), Point::new(60.0, 10.0), 15);
        assert_eq!(clicks(&events), [w]);
    }

    #[test]
    fn disabled_keys_take_no_touches() {
        let (mut keys, area, mut touch, [q, ..]) = setup(TouchConfig::default());
        keys.set_override(
            q,
            Some(KeyOverride {
                enabled: false,
                ..KeyOverride::default()
            }),
        );
        let events = touch.on_press(&mut keys, &area, None, Point::new(10.0, 10.0), 0);
        assert!(events.is_empty());
        let events = touch.on_release(&mut keys, &area, None, Point::new(10.0, 10.0), 10);
        assert!(events.is_empty());
    }

    #[test]
    fn key_reenabled_while_held_is_not_clicked() {
        let (mut keys, area, mut touch, [q, ..]) = setup(TouchConfig::default());
        touch.on_press(&mut keys, &area, None, Point::new(10.0, 10.0), 0);
        keys.set_override(
            q,
            Some(KeyOverride {
                enabled: false,
                ..KeyOverride::default()
            }),
        );
        keys.set_override(q, None);
        assert!(keys.get(q).unwrap().is_enabled());

        let events = touch.on_release(&mut keys, &area, None, Point::new(10.0, 10.0), 10);
        assert!(events.is_empty(), "{events:?}");
        assert_eq!(keys.get(q).unwrap().touch_point_count(), 0);
        assert_eq!(touch.touches().count(), 0);
    }

    #[test]
    fn release_onto_another_key_clicks_it_without_a_press() {
        let (mut keys, area, mut touch, [q, w, ..]) = setup(TouchConfig::default());
        touch.on_press(&mut keys, &area, None, Point::new(10.0, 10.0), 0);
        let events = touch.on_release(&mut keys, &area, None, Point::new(75.0, 10.0), 50);

        assert_eq!(events.len(), 2, "{events:?}");
        assert!(matches!(&events[0], AreaEvent::Released(t) if t.key == q));
        assert!(matches!(&events[1], AreaEvent::Clicked(t) if t.key == w));
        assert_eq!(keys.get(w).unwrap().touch_point_count(), 0);
        assert_eq!(keys.get(w).unwrap().state(), KeyState::Normal);
        assert!(keys.registry().is_empty());
    }

    #[test]
    fn vertical_offset_and_correction() {
        let config = TouchConfig {
            vertical_offset: 20.0,
            ..TouchConfig::default()
        };
        let (mut keys, area, mut touch, [q, ..]) = setup(config);
        let events = touch.on_press(&mut keys, &area, None, Point::new(0.0, -15.0), 0);
        let AreaEvent::Pressed(t) = &events[0] else {
            panic!("expected a press");
        };
        assert_eq!(t.key, q);
        assert_eq!(t.position, Point::new(0.0, 5.0));
        assert_eq!(t.correction, Point::new(2.0, 5.0));
    }
}
