// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tunables for touch dispatch and key geometry.

use understory_kbd_layout::{KeyWidth, RowHeight};

/// When a release counts as aborted (no click).
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum AbortPolicy {
    /// Aborted iff no key lies under the corrected release point.
    #[default]
    NoKeyUnderRelease,
    /// Aborted iff the key under the release point is not the key the touch
    /// first pressed (sliding to another key cancels).
    LeftPressedKey,
}

/// Touch dispatch configuration.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct TouchConfig {
    /// Horizontal gravity margin in pixels.
    pub horizontal_gravity: f64,
    /// Vertical gravity margin in pixels.
    pub vertical_gravity: f64,
    /// Long-press delay in milliseconds.
    pub long_press_timeout: u64,
    /// Added to every touch y before hit testing (fingers land below their target).
    pub vertical_offset: f64,
    /// Correction points are kept this far inside the key rectangle.
    pub correction_edge: f64,
    /// How far outside a sloppy section a touch still finds the nearest key.
    pub sloppy_margin: f64,
    /// Touches above or below the key area are treated as on the first or last row.
    pub lock_vertical_movement: bool,
    /// A new press clicks the previously pressed normal key immediately.
    pub rollover_commit: bool,
    /// Release abort rule.
    pub abort_policy: AbortPolicy,
}

impl Default for TouchConfig {
    fn default() -> Self {
        Self {
            horizontal_gravity: 8.0,
            vertical_gravity: 8.0,
            long_press_timeout: 600,
            vertical_offset: 0.0,
            correction_edge: 2.0,
            sloppy_margin: 10.0,
            lock_vertical_movement: false,
            rollover_commit: false,
            abort_policy: AbortPolicy::NoKeyUnderRelease,
        }
    }
}

impl TouchConfig {
    /// Builder-style helper that sets both gravity margins.
    #[must_use]
    pub fn with_gravity(mut self, horizontal: f64, vertical: f64) -> Self {
        self.horizontal_gravity = horizontal;
        self.vertical_gravity = vertical;
        self
    }
}

/// Pixel sizes for the width and height classes of a layout.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct KeyMetrics {
    /// Widths of small, medium, large, x-large, and xx-large keys.
    pub key_widths: [f64; 5],
    /// Heights of small, medium, large, x-large, and xx-large rows.
    pub row_heights: [f64; 5],
}

impl Default for KeyMetrics {
    fn default() -> Self {
        Self {
            key_widths: [40.0, 50.0, 75.0, 100.0, 125.0],
            row_heights: [40.0, 50.0, 60.0, 70.0, 80.0],
        }
    }
}

impl KeyMetrics {
    /// Fixed width of a class, `None` for [`KeyWidth::Stretched`].
    pub fn key_width(&self, width: KeyWidth) -> Option<f64> {
        let idx = match width {
            KeyWidth::Small => 0,
            KeyWidth::Medium => 1,
            KeyWidth::Large => 2,
            KeyWidth::XLarge => 3,
            KeyWidth::XxLarge => 4,
            KeyWidth::Stretched => return None,
        };
        Some(self.key_widths[idx])
    }

    /// Height of a row class.
    pub fn row_height(&self, height: RowHeight) -> f64 {
        let idx = match height {
            RowHeight::Small => 0,
            RowHeight::Medium => 1,
            RowHeight::Large => 2,
            RowHeight::XLarge => 3,
            RowHeight::XxLarge => 4,
        };
        self.row_heights[idx]
    }
}
