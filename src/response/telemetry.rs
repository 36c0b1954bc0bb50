// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Telemetry payload parsing.

use serde::Deserialize;

/// Last reported telemetry from `get_data`.
///
/// Temperature and voltage arrive as strings with a trailing unit character
/// (`"21C"`, `"12.6V"`); the numeric derivation happens in
/// [`Device::apply_telemetry`](crate::state::Device::apply_telemetry).
///
/// # Examples
///
/// ```
/// use thermoconnect::response::TelemetryData;
///
/// let json = r#"{
///     "temperature": "21C",
///     "voltage": "12.6V",
///     "location": {"state": "OFF"},
///     "outputs": [{"line": "OUTH", "state": "OFF", "name": "", "icon": "car_heat"}]
/// }"#;
/// let data: TelemetryData = serde_json::from_str(json).unwrap();
/// assert_eq!(data.temperature, "21C");
/// assert_eq!(data.outputs.len(), 1);
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct TelemetryData {
    /// Raw temperature string with unit suffix.
    pub temperature: String,

    /// Raw voltage string with unit suffix.
    pub voltage: String,

    /// Last reported GPS location.
    pub location: Option<LocationRecord>,

    /// One record per configured output line.
    #[serde(default)]
    pub outputs: Vec<OutputRecord>,
}

/// GPS location record.
///
/// The record is only meaningful while its `state` is `"ON"`; devices with
/// GPS disabled still report a record with `state: "OFF"`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LocationRecord {
    /// `"ON"` when the device reports a usable position.
    #[serde(default)]
    pub state: String,

    /// Latitude in degrees.
    pub lat: Option<f64>,

    /// Longitude in degrees.
    pub lon: Option<f64>,
}

impl LocationRecord {
    /// Returns `true` if the device reports a usable position.
    #[must_use]
    pub fn is_on(&self) -> bool {
        self.state == "ON"
    }
}

/// State of a single output line.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct OutputRecord {
    /// Line tag: `OUTH`, `OUTV`, `OUT1` or `OUT2`.
    pub line: String,

    /// `"ON"` or `"OFF"`.
    #[serde(default)]
    pub state: String,

    /// User-assigned channel name; may be empty.
    #[serde(default)]
    pub name: String,

    /// Icon identifier for the channel.
    #[serde(default)]
    pub icon: String,
}

impl OutputRecord {
    /// Returns `true` unless the line reports `"OFF"` (or no state at all).
    #[must_use]
    pub fn is_on(&self) -> bool {
        !self.state.is_empty() && self.state != "OFF"
    }

    /// Returns the channel name, or `fallback` if the device reports an
    /// empty one.
    #[must_use]
    pub fn display_name(&self, fallback: &'static str) -> String {
        if self.name.is_empty() {
            fallback.to_string()
        } else {
            self.name.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn location_off_is_not_on() {
        let record = LocationRecord {
            state: "OFF".to_string(),
            lat: None,
            lon: None,
        };
        assert!(!record.is_on());
    }

    #[test]
    fn location_on_with_coordinates() {
        let json = r#"{"state": "ON", "lat": 1.0, "lon": 2.0}"#;
        let record: LocationRecord = serde_json::from_str(json).unwrap();
        assert!(record.is_on());
        assert_eq!(record.lat, Some(1.0));
        assert_eq!(record.lon, Some(2.0));
    }

    #[test]
    fn output_state_semantics() {
        let on = OutputRecord {
            state: "ON".to_string(),
            ..OutputRecord::default()
        };
        let off = OutputRecord {
            state: "OFF".to_string(),
            ..OutputRecord::default()
        };
        let unknown = OutputRecord::default();
        assert!(on.is_on());
        assert!(!off.is_on());
        assert!(!unknown.is_on());
    }

    #[test]
    fn empty_output_name_falls_back() {
        let record = OutputRecord {
            line: "OUTH".to_string(),
            ..OutputRecord::default()
        };
        assert_eq!(record.display_name("Primary"), "Primary");

        let named = OutputRecord {
            name: "Cabin heater".to_string(),
            ..record
        };
        assert_eq!(named.display_name("Primary"), "Cabin heater");
    }

    #[test]
    fn telemetry_without_outputs() {
        let json = r#"{"temperature": "70F", "voltage": "12.1V", "location": null}"#;
        let data: TelemetryData = serde_json::from_str(json).unwrap();
        assert!(data.outputs.is_empty());
        assert!(data.location.is_none());
    }
}
