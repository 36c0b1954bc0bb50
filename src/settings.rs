// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Settings-update payload builders.
//!
//! Every settings write posts the same envelope to the `post_setting`
//! endpoint: a `device_settings` and a `service_settings` section with only
//! the keys relevant to the operation populated, plus the always-present
//! `location_events: null` and `air_heater: {}` sections the vendor expects.

use serde_json::{Value, json};

use crate::types::{AuxOutput, Timeout};

/// Wraps populated sections in the full envelope.
fn envelope(device_settings: Value, service_settings: Value) -> Value {
    json!({
        "device_settings": device_settings,
        "service_settings": service_settings,
        "location_events": null,
        "air_heater": {},
    })
}

/// Builds the main-channel mode payload.
///
/// Switching between heater and ventilation rewrites both main-channel
/// timeout blocks, so the current timeouts ride along with the mode change.
pub(crate) fn ventilation_mode(
    ventilation: bool,
    heater_timeout: Timeout,
    vent_timeout: Timeout,
) -> Value {
    envelope(
        json!({
            "webasto_emul_mode": "thermoconnect",
            "OUTV_timeout_on": true,
            "OUTV_timeout_h": vent_timeout.hours(),
            "OUTV_timeout_min": vent_timeout.minutes(),
            "OUTH_timeout_on": true,
            "OUTH_timeout_h": heater_timeout.hours(),
            "OUTH_timeout_min": heater_timeout.minutes(),
        }),
        json!({
            "OUTH_on": !ventilation,
            "OUTV_on": ventilation,
            "heater_mode": i32::from(ventilation),
            "OUTV_name": "Ventilation",
            "OUTV_icon": "car_vent",
            "OUTH_name": "Heater",
            "OUTH_icon": "car_heat",
        }),
    )
}

/// Builds the timeout payload for an auxiliary output.
pub(crate) fn aux_timeout(
    output: AuxOutput,
    timeout: Timeout,
    name: &str,
    icon: &str,
) -> Value {
    let line = output.line().as_str();
    envelope(
        json!({
            (format!("{line}_function")): "enabled",
            (format!("{line}_timeout_on")): true,
            (format!("{line}_timeout_h")): timeout.hours(),
            (format!("{line}_timeout_min")): timeout.minutes(),
        }),
        json!({
            (format!("{line}_on")): true,
            (format!("{line}_name")): name,
            (format!("{line}_icon")): icon,
        }),
    )
}

/// Builds a payload carrying a single calibration value.
///
/// Used for `low_voltage_cutoff` and `ext_temp_comp`.
pub(crate) fn calibration_value(key: &str, value: f64) -> Value {
    envelope(json!({ (key): value }), json!({}))
}
