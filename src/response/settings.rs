// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Settings payload parsing.

use serde::Deserialize;

/// Device settings from `get_settings`.
///
/// Settings arrive as a flat list of groups (`general`, `webasto`,
/// `outputs`, ...), each holding keyed options. The accessors below walk
/// that structure so callers never index into it directly.
///
/// # Examples
///
/// ```
/// use thermoconnect::response::SettingsData;
///
/// let json = r#"{
///     "hw_version": "2.1",
///     "sw_version": "5.0.3",
///     "sw_variant": "marine",
///     "settings_tab": [
///         {"group": "general", "options": [{"key": "allow_GPS", "value": true}]},
///         {"group": "webasto", "options": [{"key": "OUTH", "timeout": 3600}]}
///     ]
/// }"#;
/// let settings: SettingsData = serde_json::from_str(json).unwrap();
/// assert_eq!(settings.value("general", "allow_GPS"), Some(&serde_json::json!(true)));
/// assert_eq!(settings.timeout("OUTH"), Some(3600));
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SettingsData {
    /// Hardware version string.
    #[serde(default)]
    pub hw_version: String,

    /// Software version string.
    #[serde(default)]
    pub sw_version: String,

    /// Software variant string.
    #[serde(default)]
    pub sw_variant: String,

    /// Grouped settings options.
    #[serde(default)]
    pub settings_tab: Vec<SettingsGroup>,
}

/// A named group of settings options.
#[derive(Debug, Clone, Deserialize)]
pub struct SettingsGroup {
    /// Group name, e.g. `general`, `webasto`, `outputs`.
    pub group: String,

    /// Options within this group.
    #[serde(default)]
    pub options: Vec<SettingsOption>,
}

/// A single settings option.
#[derive(Debug, Clone, Deserialize)]
pub struct SettingsOption {
    /// Option key, e.g. `allow_GPS` or an output line tag.
    pub key: String,

    /// Option value; type varies per key.
    pub value: Option<serde_json::Value>,

    /// Output timeout in seconds, present on output-line options.
    pub timeout: Option<u32>,
}

impl SettingsData {
    /// Returns the value of `key` within `group`, if present.
    #[must_use]
    pub fn value(&self, group: &str, key: &str) -> Option<&serde_json::Value> {
        self.settings_tab
            .iter()
            .filter(|g| g.group == group)
            .flat_map(|g| &g.options)
            .find(|o| o.key == key)
            .and_then(|o| o.value.as_ref())
    }

    /// Returns a boolean value from the `general` group.
    #[must_use]
    pub fn general_flag(&self, key: &str) -> Option<bool> {
        self.value("general", key).and_then(serde_json::Value::as_bool)
    }

    /// Returns a float value from the `general` group.
    #[must_use]
    pub fn general_f64(&self, key: &str) -> Option<f64> {
        self.value("general", key).and_then(serde_json::Value::as_f64)
    }

    /// Returns the timeout in seconds for an output line tag.
    ///
    /// Timeouts live in the `webasto` and `outputs` groups only.
    #[must_use]
    pub fn timeout(&self, key: &str) -> Option<u32> {
        self.settings_tab
            .iter()
            .filter(|g| g.group == "webasto" || g.group == "outputs")
            .flat_map(|g| &g.options)
            .find(|o| o.key == key)
            .and_then(|o| o.timeout)
    }
}
