// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! One active keyboard wired to an input context.

use alloc::vec::Vec;
use core::fmt;

use kurbo::Point;
use smallvec::SmallVec;
use understory_kbd_binding::{Accent, KeyCode, SpecialKey};
use understory_kbd_layout::Keyboard;
use understory_kbd_state::{
    KeyCapabilities, KeyId, KeyOverride, KeySet, ResetOutcome, ResetPolicy,
};
use understory_kbd_touch::{AreaEvent, AreaEvents, KeyArea, KeyTouch, PointerId, TouchDispatcher};

use crate::autocaps::triggers_auto_caps;
use crate::config::InputConfig;
use crate::context::{ContentType, InputContext};
use crate::cycle::CycleTracker;
use crate::dead_key::DeadKeyLock;
use crate::event::{KeyEvent, Modifiers};
use crate::handler::KeyEventHandler;
use crate::modifier::{ModifierLatch, ModifierState};
use crate::repeat::{AutoRepeat, RepeatEnd};

/// A latching modifier a host can toggle directly.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Modifier {
    /// Shift.
    Shift,
    /// Fn.
    Fn,
}

/// What the presentation layer needs to redraw or react to.
#[derive(Clone, Debug, PartialEq)]
pub enum Notification {
    /// A key was pressed, released, clicked, or long-pressed; see the event kind.
    Key {
        /// The resolved event.
        event: KeyEvent,
        /// Touch context of the event.
        touch: KeyTouch,
    },
    /// A key lost its touch points because it got disabled.
    ForcedRelease(KeyId),
    /// The shift state changed.
    ShiftChanged(ModifierState),
    /// The Fn state changed.
    FnChanged(ModifierState),
    /// The accent shown on the keys changed.
    AccentChanged(Option<Accent>),
    /// A key asked for host action (symbol view, layout menu, keyboard switch, ...).
    SpecialKey(SpecialKey),
}

/// Notifications produced by one session call, in order.
pub type Notifications = SmallVec<[Notification; 4]>;

/// Touch dispatch, modifiers, and event delivery for one active layout.
///
/// Each section of the active layout becomes a [`KeyArea`] with its own
/// [`TouchDispatcher`]; all of them share one [`KeySet`]. Touch calls name the
/// area by index, in section order, with positions relative to that area.
///
/// The session never runs on its own: hosts call [`KeyboardSession::poll`]
/// at [`KeyboardSession::next_deadline`] to drive long press, backspace
/// repeat, and multitap commits.
pub struct KeyboardSession<C> {
    context: C,
    config: InputConfig,
    keys: KeySet,
    areas: Vec<(KeyArea, TouchDispatcher)>,
    layout_auto_caps: bool,
    closing_quotes: bool,
    content_type: ContentType,
    cursor: Option<usize>,
    shift: ModifierLatch,
    fn_latch: ModifierLatch,
    dead: DeadKeyLock,
    handler: KeyEventHandler,
    repeat: AutoRepeat,
    swallow_backspace_click: bool,
    cycle: CycleTracker,
    host_composing: bool,
    composing: bool,
}

impl<C> fmt::Debug for KeyboardSession<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyboardSession")
            .field("keys", &self.keys)
            .field("areas", &self.areas.len())
            .field("content_type", &self.content_type)
            .field("shift", &self.shift)
            .field("fn_latch", &self.fn_latch)
            .field("dead", &self.dead)
            .field("composing", &self.composing)
            .finish_non_exhaustive()
    }
}

impl<C: InputContext> KeyboardSession<C> {
    /// Creates a session with no layout loaded.
    pub fn new(context: C, config: InputConfig) -> Self {
        let content_type = context.content_type();
        Self {
            repeat: AutoRepeat::new(config.auto_repeat_delay, config.auto_repeat_interval),
            cycle: CycleTracker::new(config.multitap_timeout),
            context,
            config,
            keys: KeySet::new(),
            areas: Vec::new(),
            layout_auto_caps: true,
            closing_quotes: false,
            content_type,
            cursor: None,
            shift: ModifierLatch::new(),
            fn_latch: ModifierLatch::new(),
            dead: DeadKeyLock::new(),
            handler: KeyEventHandler::new(),
            swallow_backspace_click: false,
            host_composing: false,
            composing: false,
        }
    }

    /// The input context.
    pub fn context(&self) -> &C {
        &self.context
    }

    /// Mutable access to the input context.
    pub fn context_mut(&mut self) -> &mut C {
        &mut self.context
    }

    /// The configuration.
    pub fn config(&self) -> &InputConfig {
        &self.config
    }

    /// Key state of the active layout.
    pub fn keys(&self) -> &KeySet {
        &self.keys
    }

    /// The key area at `index`.
    pub fn area(&self, index: usize) -> Option<&KeyArea> {
        self.areas.get(index).map(|(area, _)| area)
    }

    /// All key areas in section order.
    pub fn areas(&self) -> impl Iterator<Item = &KeyArea> {
        self.areas.iter().map(|(area, _)| area)
    }

    /// Shift state.
    pub fn shift_state(&self) -> ModifierState {
        self.shift.state()
    }

    /// Fn state.
    pub fn fn_state(&self) -> ModifierState {
        self.fn_latch.state()
    }

    /// The locked dead key.
    pub fn locked_dead_key(&self) -> Option<KeyId> {
        self.dead.locked()
    }

    /// Content type the session last read from the context.
    pub fn content_type(&self) -> ContentType {
        self.content_type
    }

    /// Activates the layout of `keyboard` for the current content type and
    /// configured orientation, replacing the previous one.
    ///
    /// The previous layout is reset with the configured soft reset policy, so
    /// caps lock survives by default. Returns `false` and keeps the previous
    /// layout if `keyboard` has nothing usable.
    pub fn activate(&mut self, keyboard: &Keyboard) -> bool {
        let kind = self.content_type.layout_kind();
        let Some(layout) = keyboard.layout(kind, self.config.orientation) else {
            tracing::warn!(?kind, title = %keyboard.header.title, "keyboard has no usable layout");
            return false;
        };
        self.reset(self.config.reset_policy);
        for (area, _) in self.areas.drain(..) {
            area.unload(&mut self.keys);
        }
        for section in &layout.sections {
            let mut area = KeyArea::new(section.clone(), &mut self.keys);
            area.layout(self.config.width, &self.config.metrics);
            area.apply_content_type(&mut self.keys, kind);
            let touch = TouchDispatcher::new(self.config.touch.clone());
            self.areas.push((area, touch));
        }
        self.layout_auto_caps = keyboard.header.autocapitalization;
        self.closing_quotes = keyboard.header.language.starts_with("en");
        self.composing = !self.is_composing();
        self.sync_composing();
        self.refresh_levels();
        tracing::debug!(?kind, sections = self.areas.len(), "layout activated");
        true
    }

    /// Drops every touch and clears active keys per `policy` without sending
    /// anything to the context.
    ///
    /// [`ResetPolicy::ClearAll`] also clears latched and locked modifiers.
    pub fn reset(&mut self, policy: ResetPolicy) -> ResetOutcome {
        for (_, touch) in &mut self.areas {
            touch.clear();
        }
        let outcome = self.keys.reset_active_keys(policy);
        self.dead.sync(&self.keys);
        self.handler.reset();
        self.shift.set_held(false);
        self.repeat.stop();
        self.swallow_backspace_click = false;
        self.cycle.cancel();
        self.sync_composing();
        if policy == ResetPolicy::ClearAll {
            self.shift.set_state(ModifierState::Clear);
            self.fn_latch.set_state(ModifierState::Clear);
        }
        self.refresh_levels();
        outcome
    }

    /// Whether a composition is in progress, from the host or a pending
    /// multitap character.
    pub fn is_composing(&self) -> bool {
        self.host_composing || self.cycle.pending().is_some()
    }

    /// The host started or finished a composition of its own.
    ///
    /// While composing, compose keys resolve to a commit instead of return.
    pub fn set_compose_state(&mut self, composing: bool) {
        self.host_composing = composing;
        self.sync_composing();
    }

    /// Copies the selection, e.g. from a toolbar button.
    pub fn copy(&mut self) {
        self.commit_cycle();
        self.context.copy();
    }

    /// Pastes the clipboard, committing any pending multitap character first.
    pub fn paste(&mut self) {
        self.commit_cycle();
        self.context.paste();
    }

    /// The keyboard was hidden or the focused application changed: a full reset.
    pub fn hide(&mut self) -> ResetOutcome {
        self.reset(ResetPolicy::ClearAll)
    }

    /// A touch went down on area `area`.
    pub fn touch_press(
        &mut self,
        area: usize,
        pointer_id: Option<PointerId>,
        position: Point,
        timestamp: u64,
    ) -> Notifications {
        let Some((key_area, touch)) = self.areas.get_mut(area) else {
            return Notifications::new();
        };
        let events = touch.on_press(&mut self.keys, key_area, pointer_id, position, timestamp);
        self.handle_events(events, timestamp)
    }

    /// A touch moved on area `area`.
    pub fn touch_move(
        &mut self,
        area: usize,
        pointer_id: Option<PointerId>,
        position: Point,
        timestamp: u64,
    ) -> Notifications {
        let Some((key_area, touch)) = self.areas.get_mut(area) else {
            return Notifications::new();
        };
        let events = touch.on_move(&mut self.keys, key_area, pointer_id, position, timestamp);
        self.handle_events(events, timestamp)
    }

    /// A touch went up on area `area`.
    pub fn touch_release(
        &mut self,
        area: usize,
        pointer_id: Option<PointerId>,
        position: Point,
        timestamp: u64,
    ) -> Notifications {
        let Some((key_area, touch)) = self.areas.get_mut(area) else {
            return Notifications::new();
        };
        let events = touch.on_release(&mut self.keys, key_area, pointer_id, position, timestamp);
        self.handle_events(events, timestamp)
    }

    /// Runs every timer whose deadline has passed.
    pub fn poll(&mut self, now: u64) -> Notifications {
        let mut events = AreaEvents::new();
        for (area, touch) in &mut self.areas {
            events.extend(touch.poll(&self.keys, area, now));
        }
        let out = self.handle_events(events, now);
        while let Some(key) = self.repeat.poll(now) {
            self.context.send_key_event(&KeyEvent::backspace(Some(key)));
        }
        if let Some(text) = self.cycle.poll(now) {
            self.context.send_commit_string(&text);
            self.sync_composing();
        }
        out
    }

    /// The earliest time [`KeyboardSession::poll`] has work to do.
    pub fn next_deadline(&self) -> Option<u64> {
        self.areas
            .iter()
            .filter_map(|(_, touch)| touch.next_deadline())
            .chain(self.repeat.deadline())
            .chain(self.cycle.deadline())
            .min()
    }

    /// Clicks a modifier as if its key had been tapped.
    pub fn click_modifier(&mut self, modifier: Modifier) -> Notifications {
        let mut out = Notifications::new();
        match modifier {
            Modifier::Shift => {
                let state = self.shift.click();
                self.refresh_levels();
                out.push(Notification::ShiftChanged(state));
            }
            Modifier::Fn => out.push(Notification::FnChanged(self.fn_latch.click())),
        }
        out
    }

    /// Overrides the presentation of the key with layout id `key_id`.
    pub fn set_key_override(
        &mut self,
        key_id: &str,
        presentation: Option<KeyOverride>,
    ) -> Notifications {
        let mut out = Notifications::new();
        let found: Vec<KeyId> = self
            .areas
            .iter()
            .filter_map(|(area, _)| area.find_key(key_id))
            .collect();
        if found.is_empty() {
            tracing::debug!(key_id, "override for unknown key id");
        }
        for key in found {
            if self.keys.set_override(key, presentation.clone()) {
                out.push(Notification::ForcedRelease(key));
            }
        }
        out
    }

    /// Re-reads content type, cursor, and surrounding text from the context
    /// and updates auto-capitalization.
    ///
    /// A content type change only rebinds the email/URL keys; call
    /// [`KeyboardSession::activate`] to switch to a different layout kind.
    pub fn update_context(&mut self) -> Notifications {
        let mut out = Notifications::new();
        let content_type = self.context.content_type();
        if content_type != self.content_type {
            self.content_type = content_type;
            let kind = content_type.layout_kind();
            for (area, _) in &self.areas {
                area.apply_content_type(&mut self.keys, kind);
            }
        }
        if !self.auto_caps_enabled() {
            return out;
        }
        let Some(surrounding) = self.context.surrounding_text() else {
            return out;
        };
        let moved = self.cursor != Some(surrounding.cursor);
        self.cursor = Some(surrounding.cursor);
        let triggered = self.auto_caps_triggered();
        if self.shift.apply_auto_caps(triggered, moved) {
            tracing::debug!(state = ?self.shift.state(), "auto-capitalization");
            self.refresh_levels();
            out.push(Notification::ShiftChanged(self.shift.state()));
        }
        out
    }

    fn auto_caps_enabled(&self) -> bool {
        self.config.auto_caps
            && self.layout_auto_caps
            && self.content_type.allows_auto_caps()
            && self.context.auto_capitalization_enabled()
    }

    fn auto_caps_triggered(&self) -> bool {
        if !self.auto_caps_enabled() || self.cycle.pending().is_some() {
            return false;
        }
        self.context.surrounding_text().is_some_and(|s| {
            s.cursor == 0
                || s.before_cursor()
                    .is_some_and(|text| triggers_auto_caps(text, self.closing_quotes))
        })
    }

    fn commit_cycle(&mut self) {
        if let Some(text) = self.cycle.commit() {
            self.context.send_commit_string(&text);
        }
        self.sync_composing();
    }

    /// Pushes the composing state to compose keys when it changed.
    fn sync_composing(&mut self) {
        let composing = self.is_composing();
        if composing == self.composing {
            return;
        }
        self.composing = composing;
        for (area, _) in &self.areas {
            area.set_composing(&mut self.keys, composing);
        }
    }

    fn modifiers(&self) -> Modifiers {
        let mut modifiers = Modifiers::empty();
        modifiers.set(Modifiers::SHIFT, self.shift.is_active());
        modifiers.set(Modifiers::FN, self.fn_latch.is_active());
        modifiers
    }

    /// Pushes the current shift level and accent to every key.
    fn refresh_levels(&mut self) {
        let shift = self.shift.is_active();
        let locked = self.shift.state() == ModifierState::Locked;
        let upper_case = self.shift.state().is_active();
        let accent = self.dead.accent(&self.keys);
        for (area, touch) in &mut self.areas {
            area.modifiers_changed(&mut self.keys, shift, accent.as_ref());
            area.set_shift_state(&mut self.keys, shift, locked);
            touch.set_upper_case(upper_case);
        }
    }

    fn handle_events(&mut self, events: AreaEvents, now: u64) -> Notifications {
        let mut out = Notifications::new();
        for event in events {
            match event {
                AreaEvent::Pressed(touch) => self.on_pressed(touch, now, &mut out),
                AreaEvent::Released(touch) => self.on_released(touch, &mut out),
                AreaEvent::Clicked(touch) => self.on_clicked(touch, now, &mut out),
                AreaEvent::DeadKeyClicked(touch) => self.on_dead_key_clicked(touch, &mut out),
                AreaEvent::LongPressed(touch) => {
                    let modifiers = self.modifiers();
                    if let Some(event) = self.handler.on_long_pressed(&self.keys, &touch, modifiers)
                    {
                        out.push(Notification::Key { event, touch });
                    }
                }
            }
        }
        out
    }

    fn on_pressed(&mut self, touch: KeyTouch, now: u64, out: &mut Notifications) {
        let was_held = self.handler.shift_held();
        let modifiers = self.modifiers();
        let Some(event) = self.handler.on_pressed(&self.keys, &touch, modifiers) else {
            return;
        };
        if event.key_code == KeyCode::Backspace {
            self.repeat.start(touch.key, now);
            self.swallow_backspace_click = false;
        }
        out.push(Notification::Key { event, touch });
        if self.handler.shift_held() && !was_held {
            self.shift.set_held(true);
            self.refresh_levels();
        }
    }

    fn on_released(&mut self, touch: KeyTouch, out: &mut Notifications) {
        let was_held = self.handler.shift_held();
        let modifiers = self.modifiers();
        if self.repeat.release(touch.key) == RepeatEnd::Repeated {
            self.swallow_backspace_click = true;
        }
        if let Some(event) = self.handler.on_released(&self.keys, &touch, modifiers) {
            out.push(Notification::Key { event, touch });
        }
        if was_held && !self.handler.shift_held() {
            self.shift.set_held(false);
            self.refresh_levels();
        }
    }

    fn on_clicked(&mut self, touch: KeyTouch, now: u64, out: &mut Notifications) {
        let is_shift = self
            .keys
            .capabilities(touch.key)
            .contains(KeyCapabilities::SHIFT);
        let modifiers = self.modifiers();
        let Some(event) = self.handler.on_clicked(&self.keys, &touch, modifiers) else {
            return;
        };
        out.push(Notification::Key {
            event: event.clone(),
            touch: touch.clone(),
        });

        if is_shift {
            let state = self.shift.click();
            self.refresh_levels();
            out.push(Notification::ShiftChanged(state));
            return;
        }

        if event.special != SpecialKey::CycleSet {
            self.commit_cycle();
        }
        if let Some(special) = self.deliver(&event, now) {
            out.push(Notification::SpecialKey(special));
        }

        if self.dead.on_key_clicked(&mut self.keys, touch.key).changed() {
            self.refresh_levels();
            out.push(Notification::AccentChanged(None));
        }
        self.apply_shift_rules(&event, out);
        if self.fn_latch.consume() {
            out.push(Notification::FnChanged(self.fn_latch.state()));
        }
    }

    fn on_dead_key_clicked(&mut self, touch: KeyTouch, out: &mut Notifications) {
        let modifiers = self.modifiers();
        let Some(event) = self.handler.on_clicked(&self.keys, &touch, modifiers) else {
            return;
        };
        self.commit_cycle();
        let key = touch.key;
        out.push(Notification::Key { event, touch });
        if self.dead.on_dead_key_clicked(&mut self.keys, key).changed() {
            self.refresh_levels();
            out.push(Notification::AccentChanged(self.dead.accent(&self.keys)));
        }
    }

    /// Sends a clicked key's event to the context. Returns special kinds the
    /// host has to act on.
    fn deliver(&mut self, event: &KeyEvent, now: u64) -> Option<SpecialKey> {
        match event.special {
            SpecialKey::NotSpecial => {
                let repeated = event.key_code == KeyCode::Backspace
                    && core::mem::take(&mut self.swallow_backspace_click);
                if !repeated {
                    self.context.send_key_event(event);
                }
                None
            }
            SpecialKey::CycleSet => {
                let origin = event.origin?;
                let step = self.cycle.on_click(origin, &event.text, now);
                if let Some(text) = step.commit {
                    self.context.send_commit_string(&text);
                }
                self.context.send_preedit_string(&step.preedit, false);
                self.sync_composing();
                None
            }
            special => Some(special),
        }
    }

    /// Drops a latched shift after a click, except where the next character
    /// should still be capitalized.
    fn apply_shift_rules(&mut self, event: &KeyEvent, out: &mut Notifications) {
        if self.shift.state() != ModifierState::Latched {
            return;
        }
        if self.handler.shift_held() && !self.shift.is_auto_latched() {
            return;
        }
        let clear = match (event.key_code, event.special) {
            (KeyCode::Backspace, _) => false,
            _ if event.is_arrow() => false,
            (_, SpecialKey::Sym | SpecialKey::Switch | SpecialKey::LayoutMenu) => false,
            (KeyCode::Return, _) => !self.auto_caps_enabled(),
            (KeyCode::Space, _) => !self.auto_caps_triggered(),
            _ => true,
        };
        if clear && self.shift.set_state(ModifierState::Clear) {
            self.refresh_levels();
            out.push(Notification::ShiftChanged(ModifierState::Clear));
        }
    }
}
