// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! A key area: one layout section instantiated in a [`KeySet`].

use alloc::string::String;
use alloc::sync::Arc;
use alloc::vec::Vec;

use hashbrown::HashMap;
use kurbo::{Point, Rect};
use understory_kbd_binding::Accent;
use understory_kbd_layout::{Action, Binding, LayoutKind, Section, SectionKind};
use understory_kbd_state::{KeyCapabilities, KeyId, KeySet};

use crate::config::KeyMetrics;
use crate::grid::KeyGrid;

/// Key id whose binding becomes `/` for URLs and `@` for email addresses.
pub const EMAIL_URL_KEY: &str = "email_url_key";

/// Key id whose binding becomes `.` for URLs and email addresses.
pub const EMAIL_URL_DOT_KEY: &str = "email_url_dot_key";

/// The keys of one [`Section`], their geometry, and their hit-test grid.
///
/// Creating an area inserts one instance per key into the shared [`KeySet`];
/// [`KeyArea::unload`] removes them again.
#[derive(Clone, Debug)]
pub struct KeyArea {
    section: Arc<Section>,
    rows: Vec<Vec<KeyId>>,
    by_id: HashMap<String, KeyId>,
    shift_key: Option<KeyId>,
    grid: KeyGrid,
}

impl KeyArea {
    /// Instantiates `section` in `keys`.
    pub fn new(section: Arc<Section>, keys: &mut KeySet) -> Self {
        let mut by_id = HashMap::new();
        let mut shift_key = None;
        let rows = section
            .rows
            .iter()
            .map(|row| {
                row.keys
                    .iter()
                    .map(|key| {
                        let id = keys.insert(key.clone());
                        if let Some(name) = &key.id {
                            by_id.entry(name.clone()).or_insert(id);
                        }
                        if shift_key.is_none()
                            && keys.capabilities(id).contains(KeyCapabilities::SHIFT)
                        {
                            shift_key = Some(id);
                        }
                        id
                    })
                    .collect()
            })
            .collect();
        Self {
            section,
            rows,
            by_id,
            shift_key,
            grid: KeyGrid::new(),
        }
    }

    /// Removes this area's instances from `keys`.
    pub fn unload(self, keys: &mut KeySet) {
        for id in self.keys() {
            keys.remove(id);
        }
    }

    /// The section this area shows.
    pub fn section(&self) -> &Arc<Section> {
        &self.section
    }

    /// Key ids by row.
    pub fn rows(&self) -> &[Vec<KeyId>] {
        &self.rows
    }

    /// All key ids in row-major order.
    pub fn keys(&self) -> impl Iterator<Item = KeyId> + '_ {
        self.rows.iter().flatten().copied()
    }

    /// Whether `id` belongs to this area.
    pub fn contains(&self, id: KeyId) -> bool {
        self.keys().any(|k| k == id)
    }

    /// The canonical shift key: the first shift key of the section.
    pub fn shift_key(&self) -> Option<KeyId> {
        self.shift_key
    }

    /// Looks up a key by its layout id.
    pub fn find_key(&self, id: &str) -> Option<KeyId> {
        self.by_id.get(id).copied()
    }

    /// The hit-test grid.
    pub fn grid(&self) -> &KeyGrid {
        &self.grid
    }

    /// The rectangle of `id`.
    pub fn key_rect(&self, id: KeyId) -> Option<Rect> {
        self.grid.rect(id)
    }

    /// Lays out the section `width` pixels wide, starting at the origin.
    ///
    /// Fixed-width keys take their class width. Whatever is left of the row is
    /// shared equally by stretched keys and spacers; a row with neither is
    /// centered.
    pub fn layout(&mut self, width: f64, metrics: &KeyMetrics) {
        self.grid.clear();
        let mut y = 0.0;
        for (row, ids) in self.section.rows.iter().zip(&self.rows) {
            let height = metrics.row_height(row.height);
            let fixed: f64 = row
                .keys
                .iter()
                .filter_map(|k| metrics.key_width(k.width))
                .sum();
            let flexible = row
                .keys
                .iter()
                .filter(|k| metrics.key_width(k.width).is_none())
                .count()
                + row.spacers.len();
            let leftover = (width - fixed).max(0.0);
            #[allow(
                clippy::cast_precision_loss,
                reason = "A row has far fewer than 2^52 keys."
            )]
            let share = if flexible == 0 {
                0.0
            } else {
                leftover / flexible as f64
            };
            let mut x = if flexible == 0 { leftover / 2.0 } else { 0.0 };

            let mut cells = Vec::with_capacity(ids.len());
            for (idx, (key, &id)) in row.keys.iter().zip(ids).enumerate() {
                x += share * spacers_at(&row.spacers, idx);
                let w = metrics.key_width(key.width).unwrap_or(share);
                cells.push((id, Rect::new(x, y, x + w, y + height)));
                x += w;
            }
            self.grid.push_row(cells);
            y += height;
        }
    }

    /// Replaces the geometry with explicit rectangles, one row at a time.
    pub fn set_geometry<R, I>(&mut self, rows: R)
    where
        R: IntoIterator<Item = I>,
        I: IntoIterator<Item = (KeyId, Rect)>,
    {
        self.grid.clear();
        for row in rows {
            self.grid.push_row(row);
        }
    }

    /// Hit test honoring section sloppiness and vertical locking.
    ///
    /// In a sloppy section a touch up to `sloppy_margin` outside the keys is
    /// moved onto the nearest edge before the lookup. Non-finite points hit
    /// nothing.
    pub fn key_at(&self, point: Point, sloppy_margin: f64, lock_vertical: bool) -> Option<KeyId> {
        if !point.is_finite() {
            return None;
        }
        let bounds = self.grid.bounds();
        let mut point = point;
        if self.section.kind == SectionKind::Sloppy
            && !self.grid.is_empty()
            && bounds.inflate(sloppy_margin, sloppy_margin).contains(point)
        {
            let edge = f64::EPSILON * bounds.width().max(bounds.height()).max(1.0);
            point = Point::new(
                point.x.clamp(bounds.x0, (bounds.x1 - edge).max(bounds.x0)),
                point.y.clamp(bounds.y0, (bounds.y1 - edge).max(bounds.y0)),
            );
        }
        if lock_vertical {
            self.grid.key_at_clamped_y(point)
        } else {
            self.grid.key_at(point)
        }
    }

    /// Propagates a modifier change to every key that shows modifiers.
    ///
    /// The shift key, compose key, and locked keys keep their own look.
    pub fn modifiers_changed(&self, keys: &mut KeySet, shift: bool, accent: Option<&Accent>) {
        for id in self.keys() {
            let Some(key) = keys.get(id) else {
                continue;
            };
            let caps = key.capabilities();
            if caps.intersects(KeyCapabilities::SHIFT | KeyCapabilities::COMPOSE)
                || key.is_selected()
            {
                continue;
            }
            keys.set_modifiers(id, shift, accent);
        }
    }

    /// Shows the shift state on the canonical shift key.
    pub fn set_shift_state(&self, keys: &mut KeySet, active: bool, locked: bool) {
        if let Some(shift) = self.shift_key {
            keys.set_modifiers(shift, active, None);
            keys.set_selected(shift, locked);
        }
    }

    /// Tells the compose keys whether a composition is in progress.
    pub fn set_composing(&self, keys: &mut KeySet, composing: bool) {
        for id in self.keys() {
            if keys.capabilities(id).contains(KeyCapabilities::COMPOSE) {
                keys.set_composing(id, composing);
            }
        }
    }

    /// Rebinds the email/URL keys for a content type; other types restore them.
    pub fn apply_content_type(&self, keys: &mut KeySet, kind: LayoutKind) {
        let (main, dot) = match kind {
            LayoutKind::Url => (Some("/"), Some(".")),
            LayoutKind::Email => (Some("@"), Some(".")),
            _ => (None, None),
        };
        for (key_id, label) in [(EMAIL_URL_KEY, main), (EMAIL_URL_DOT_KEY, dot)] {
            let Some(id) = self.find_key(key_id) else {
                continue;
            };
            let binding = label.map(|l| Binding::new(Action::Insert, l));
            keys.set_binding_override(id, false, binding.clone());
            keys.set_binding_override(id, true, binding);
        }
    }
}

#[allow(
    clippy::cast_precision_loss,
    reason = "Spacer counts are tiny."
)]
fn spacers_at(spacers: &[usize], idx: usize) -> f64 {
    spacers.iter().filter(|&&s| s == idx).count() as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;
    use smallvec::smallvec;
    use understory_kbd_layout::{Key, KeyWidth, Row, RowHeight};

    fn letter(label: &str) -> Arc<Key> {
        Arc::new(Key::single(Binding::new(Action::Insert, label)))
    }

    fn section(kind: SectionKind) -> Arc<Section> {
        Arc::new(Section {
            id: "main".into(),
            movable: true,
            kind,
            style: String::new(),
            rows: vec![
                Row {
                    height: RowHeight::Medium,
                    keys: vec![letter("q"), letter("w")],
                    spacers: smallvec![],
                },
                Row {
                    height: RowHeight::Small,
                    keys: vec![
                        Arc::new(Key::single(Binding::new(Action::Shift, ""))),
                        Arc::new(
                            Key::single(Binding::new(Action::Insert, ".")).with_id(EMAIL_URL_KEY),
                        ),
                        Arc::new(
                            Key::single(Binding::new(Action::Space, "")).with_width(KeyWidth::Stretched),
                        ),
                    ],
                    spacers: smallvec![1],
                },
            ],
        })
    }

    #[test]
    fn layout_assigns_class_widths_and_stretches() {
        let mut keys = KeySet::new();
        let mut area = KeyArea::new(section(SectionKind::NonSloppy), &mut keys);
        area.layout(200.0, &KeyMetrics::default());

        let rows = area.rows().to_vec();
        // Row 0: 2 medium keys, centered in 200.
        assert_eq!(area.key_rect(rows[0][0]), Some(Rect::new(50.0, 0.0, 100.0, 50.0)));
        assert_eq!(area.key_rect(rows[0][1]), Some(Rect::new(100.0, 0.0, 150.0, 50.0)));
        // Row 1: 2 medium keys, a spacer before the second, and a stretched key share 100.
        assert_eq!(area.key_rect(rows[1][0]), Some(Rect::new(0.0, 50.0, 50.0, 90.0)));
        assert_eq!(area.key_rect(rows[1][1]), Some(Rect::new(100.0, 50.0, 150.0, 90.0)));
        assert_eq!(area.key_rect(rows[1][2]), Some(Rect::new(150.0, 50.0, 200.0, 90.0)));
    }

    #[test]
    fn finds_canonical_shift_and_ids() {
        let mut keys = KeySet::new();
        let area = KeyArea::new(section(SectionKind::Sloppy), &mut keys);
        assert_eq!(area.shift_key(), Some(area.rows()[1][0]));
        assert_eq!(area.find_key(EMAIL_URL_KEY), Some(area.rows()[1][1]));
        assert_eq!(keys.iter().count(), 5);

        area.unload(&mut keys);
        assert_eq!(keys.iter().count(), 0);
    }

    #[test]
    fn sloppy_sections_tolerate_near_misses() {
        let mut keys = KeySet::new();
        let mut sloppy = KeyArea::new(section(SectionKind::Sloppy), &mut keys);
        sloppy.layout(200.0, &KeyMetrics::default());
        let mut strict = KeyArea::new(section(SectionKind::NonSloppy), &mut keys);
        strict.layout(200.0, &KeyMetrics::default());

        let near = Point::new(60.0, -4.0);
        assert_eq!(sloppy.key_at(near, 10.0, false), Some(sloppy.rows()[0][0]));
        assert_eq!(strict.key_at(near, 10.0, false), None);
        assert_eq!(sloppy.key_at(Point::new(60.0, -40.0), 10.0, false), None);
    }

    #[test]
    fn degenerate_geometry_hits_nothing() {
        let mut keys = KeySet::new();
        let mut area = KeyArea::new(section(SectionKind::Sloppy), &mut keys);
        let q = area.rows()[0][0];

        area.set_geometry([[(q, Rect::new(0.0, 0.0, 50.0, 0.0))]]);
        assert_eq!(area.key_at(Point::new(10.0, 0.0), 10.0, false), None);
        area.set_geometry([[(q, Rect::ZERO)]]);
        assert_eq!(area.key_at(Point::new(3.0, 3.0), 10.0, true), None);
    }

    #[test]
    fn non_finite_points_hit_nothing() {
        let mut keys = KeySet::new();
        let mut area = KeyArea::new(section(SectionKind::Sloppy), &mut keys);
        area.layout(200.0, &KeyMetrics::default());

        assert_eq!(area.key_at(Point::new(f64::NAN, 20.0), 10.0, false), None);
        assert_eq!(area.key_at(Point::new(60.0, f64::NAN), 10.0, true), None);
        assert_eq!(area.key_at(Point::new(f64::INFINITY, 20.0), 10.0, false), None);
    }

    #[test]
    fn content_type_rebinds_and_restores() {
        let mut keys = KeySet::new();
        let area = KeyArea::new(section(SectionKind::Sloppy), &mut keys);
        let id = area.find_key(EMAIL_URL_KEY).unwrap();

        area.apply_content_type(&mut keys, LayoutKind::Email);
        assert_eq!(keys.get(id).unwrap().label(), "@");
        area.apply_content_type(&mut keys, LayoutKind::Url);
        assert_eq!(keys.get(id).unwrap().label(), "/");
        area.apply_content_type(&mut keys, LayoutKind::General);
        assert_eq!(keys.get(id).unwrap().label(), ".");
    }

    #[test]
    fn modifiers_skip_shift_and_locked_keys() {
        let mut keys = KeySet::new();
        let area = KeyArea::new(section(SectionKind::Sloppy), &mut keys);
        let q = area.rows()[0][0];
        let w = area.rows()[0][1];
        keys.set_selected(w, true);

        area.modifiers_changed(&mut keys, true, None);
        assert!(keys.get(q).unwrap().shift());
        assert!(!keys.get(w).unwrap().shift(), "locked keys keep their level");
        assert!(!keys.get(area.shift_key().unwrap()).unwrap().shift());

        area.set_shift_state(&mut keys, true, true);
        let shift = keys.get(area.shift_key().unwrap()).unwrap();
        assert!(shift.shift() && shift.is_selected());
    }
}
