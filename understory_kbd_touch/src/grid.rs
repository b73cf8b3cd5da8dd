// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Row/column interval index for point-to-key hit testing.

use alloc::vec::Vec;
use core::cmp::Ordering;

use hashbrown::HashMap;
use kurbo::{Point, Rect};
use understory_kbd_state::KeyId;

#[derive(Clone, Debug)]
struct GridRow {
    top: f64,
    bottom: f64,
    /// `(left, right, key)`, sorted and non-overlapping.
    keys: Vec<(f64, f64, KeyId)>,
}

/// Hit-test index over the keys of one key area.
///
/// Rows are stored as monotonic, non-overlapping half-open `[top, bottom)`
/// intervals and the keys of each row as `[left, right)` intervals, so a
/// lookup is two binary searches. Gaps between intervals (spacers, margins)
/// hit nothing.
///
/// ```
/// # use understory_kbd_touch::KeyGrid;
/// # use kurbo::{Point, Rect};
/// # fn ids() -> (understory_kbd_state::KeyId, understory_kbd_state::KeyId) {
/// #     use std::sync::Arc;
/// #     use understory_kbd_layout::{Action, Binding, Key};
/// #     let mut keys = understory_kbd_state::KeySet::new();
/// #     let k = Arc::new(Key::single(Binding::new(Action::Insert, "x")));
/// #     (keys.insert(k.clone()), keys.insert(k))
/// # }
/// let (q, w) = ids();
/// let mut grid = KeyGrid::new();
/// grid.push_row([
///     (q, Rect::new(0.0, 0.0, 50.0, 40.0)),
///     (w, Rect::new(50.0, 0.0, 100.0, 40.0)),
/// ]);
///
/// assert_eq!(grid.key_at(Point::new(49.9, 10.0)), Some(q));
/// assert_eq!(grid.key_at(Point::new(50.0, 10.0)), Some(w));
/// assert_eq!(grid.key_at(Point::new(100.0, 10.0)), None);
/// ```
#[derive(Clone, Debug, Default)]
pub struct KeyGrid {
    rows: Vec<GridRow>,
    rects: HashMap<KeyId, Rect>,
    bounds: Rect,
}

impl KeyGrid {
    /// Creates an empty grid.
    pub fn new() -> Self {
        Self::default()
    }

    /// Removes all rows.
    pub fn clear(&mut self) {
        self.rows.clear();
        self.rects.clear();
        self.bounds = Rect::ZERO;
    }

    /// Appends a row below the previous ones.
    ///
    /// The row's vertical extent is the union of its key rectangles. Keys must
    /// be given left to right without overlap; rows top to bottom. Rows whose
    /// extent would overlap the previous row are clipped to start at its bottom.
    pub fn push_row(&mut self, keys: impl IntoIterator<Item = (KeyId, Rect)>) {
        let mut row = GridRow {
            top: f64::INFINITY,
            bottom: f64::NEG_INFINITY,
            keys: Vec::new(),
        };
        let mut last_right = f64::NEG_INFINITY;
        for (id, rect) in keys {
            let rect = rect.abs();
            debug_assert!(
                rect.x0 >= last_right,
                "keys must be pushed left to right without overlap"
            );
            last_right = rect.x1;
            row.top = row.top.min(rect.y0);
            row.bottom = row.bottom.max(rect.y1);
            row.keys.push((rect.x0, rect.x1, id));
            self.rects.insert(id, rect);
            self.bounds = if self.rects.len() == 1 {
                rect
            } else {
                self.bounds.union(rect)
            };
        }
        if row.keys.is_empty() {
            return;
        }
        if let Some(prev) = self.rows.last() {
            row.top = row.top.max(prev.bottom);
        }
        self.rows.push(row);
    }

    /// The key whose interval contains `point`.
    pub fn key_at(&self, point: Point) -> Option<KeyId> {
        let row = self.row_index(point.y)?;
        self.key_in_row(row, point.x)
    }

    /// Like [`KeyGrid::key_at`], but points above the first row or below the
    /// last row are treated as being on that row.
    pub fn key_at_clamped_y(&self, point: Point) -> Option<KeyId> {
        let first = self.rows.first()?;
        let last = self.rows.last()?;
        let row = if point.y < first.top {
            0
        } else if point.y >= last.bottom {
            self.rows.len() - 1
        } else {
            self.row_index(point.y)?
        };
        self.key_in_row(row, point.x)
    }

    /// The rectangle of `id`, if it is in the grid.
    pub fn rect(&self, id: KeyId) -> Option<Rect> {
        self.rects.get(&id).copied()
    }

    /// Union of all key rectangles.
    pub fn bounds(&self) -> Rect {
        self.bounds
    }

    /// Number of rows.
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Returns `true` if the grid has no keys.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    fn row_index(&self, y: f64) -> Option<usize> {
        find_interval(&self.rows, y, |row| (row.top, row.bottom))
    }

    fn key_in_row(&self, row: usize, x: f64) -> Option<KeyId> {
        let keys = &self.rows[row].keys;
        find_interval(keys, x, |&(left, right, _)| (left, right)).map(|idx| keys[idx].2)
    }
}

/// Binary search for the half-open interval containing `value`.
fn find_interval<T>(items: &[T], value: f64, range: impl Fn(&T) -> (f64, f64)) -> Option<usize> {
    items
        .binary_search_by(|item| {
            let (start, end) = range(item);
            if value < start {
                Ordering::Greater
            } else if value >= end {
                Ordering::Less
            } else {
                Ordering::Equal
            }
        })
        .ok()
}
