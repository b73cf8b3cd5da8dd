// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Session configuration.

use understory_kbd_layout::Orientation;
use understory_kbd_state::ResetPolicy;
use understory_kbd_touch::{KeyMetrics, TouchConfig};

/// Everything a [`KeyboardSession`](crate::KeyboardSession) can be tuned with.
///
/// With the `serde` feature this loads from TOML; missing fields keep their
/// defaults:
///
/// ```toml
/// auto_caps = false
/// multitap_timeout = 1200
///
/// [touch]
/// horizontal_gravity = 10.0
/// rollover_commit = true
/// ```
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct InputConfig {
    /// Touch dispatch tunables.
    pub touch: TouchConfig,
    /// Key and row sizes.
    pub metrics: KeyMetrics,
    /// Layout width in pixels.
    pub width: f64,
    /// Orientation used to pick layouts.
    pub orientation: Orientation,
    /// Milliseconds before a held backspace starts repeating.
    pub auto_repeat_delay: u64,
    /// Milliseconds between backspace repeats.
    pub auto_repeat_interval: u64,
    /// Milliseconds before a multitap character commits.
    pub multitap_timeout: u64,
    /// Auto-capitalization master switch.
    pub auto_caps: bool,
    /// Policy for soft resets, such as switching layouts.
    pub reset_policy: ResetPolicy,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            touch: TouchConfig::default(),
            metrics: KeyMetrics::default(),
            width: 480.0,
            orientation: Orientation::Portrait,
            auto_repeat_delay: 500,
            auto_repeat_interval: 100,
            multitap_timeout: 1500,
            auto_caps: true,
            reset_policy: ResetPolicy::PreserveCapsLock,
        }
    }
}

#[cfg(all(test, feature = "serde"))]
mod tests {
    use super::*;

    #[test]
    fn nested_tables_override_defaults() {
        let config: InputConfig = toml::from_str(
            r#"
            auto_caps = false
            reset_policy = "ClearAll"

            [touch]
            rollover_commit = true
            "#,
        )
        .unwrap();
        assert!(!config.auto_caps);
        assert_eq!(config.reset_policy, ResetPolicy::ClearAll);
        assert!(config.touch.rollover_commit);
        assert_eq!(config.touch.long_press_timeout, 600, "untouched nested default");
        assert_eq!(config.auto_repeat_delay, 500);
    }
}
