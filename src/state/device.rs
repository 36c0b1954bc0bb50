// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Device snapshot with derived fields.

use chrono::{DateTime, Utc};

use crate::error::ParseError;
use crate::response::{DeviceInfo, LocationRecord, OutputRecord, SettingsData, TelemetryData};
use crate::types::{AuxOutput, TemperatureUnit, Timeout};

/// The last-fetched snapshot of one registered device.
///
/// A `Device` holds no network access. It is a passive value owned by the
/// [`Session`](crate::Session) registry: replacing one of its raw payloads
/// through the `apply_*` operations re-derives all dependent fields
/// atomically, so accessors never observe a half-updated snapshot.
///
/// Identity is the device id, which is immutable after construction.
///
/// # Examples
///
/// ```
/// use thermoconnect::response::TelemetryData;
/// use thermoconnect::state::Device;
/// use thermoconnect::types::TemperatureUnit;
///
/// let mut device = Device::new("A1B2C3", "Camper");
/// let telemetry: TelemetryData = serde_json::from_str(r#"{
///     "temperature": "21C",
///     "voltage": "12.6V",
///     "location": {"state": "OFF"},
///     "outputs": [{"line": "OUTH", "state": "ON", "name": "", "icon": "car_heat"}]
/// }"#).unwrap();
///
/// device.apply_telemetry(telemetry).unwrap();
/// assert_eq!(device.temperature(), 21);
/// assert_eq!(device.temperature_unit(), TemperatureUnit::Celsius);
/// assert!(device.output_main());
/// assert!(!device.is_ventilation());
/// ```
#[derive(Debug, Clone)]
pub struct Device {
    id: String,
    name: String,

    settings: Option<SettingsData>,
    telemetry: Option<TelemetryData>,
    info: Option<DeviceInfo>,

    temperature: i32,
    temperature_unit: TemperatureUnit,
    voltage: f64,
    location: Option<LocationRecord>,

    output_main: Option<OutputRecord>,
    output_aux1: Option<OutputRecord>,
    output_aux2: Option<OutputRecord>,
    ventilation: bool,

    icon_heat: String,
    icon_vent: String,
    icon_aux1: String,
    icon_aux2: String,

    timeout_heat: Timeout,
    timeout_vent: Timeout,
    timeout_aux1: Timeout,
    timeout_aux2: Timeout,

    hardware_version: String,
    software_version: String,
    software_variant: String,

    allow_location: bool,
    low_voltage_cutoff: f64,
    temperature_compensation: f64,

    subscription_expiration: Option<DateTime<Utc>>,
}

impl Device {
    /// Creates an empty snapshot for a discovered device.
    #[must_use]
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            settings: None,
            telemetry: None,
            info: None,
            temperature: 0,
            temperature_unit: TemperatureUnit::Fahrenheit,
            voltage: 0.0,
            location: None,
            output_main: None,
            output_aux1: None,
            output_aux2: None,
            ventilation: false,
            icon_heat: String::new(),
            icon_vent: String::new(),
            icon_aux1: String::new(),
            icon_aux2: String::new(),
            timeout_heat: Timeout::default(),
            timeout_vent: Timeout::default(),
            timeout_aux1: Timeout::default(),
            timeout_aux2: Timeout::default(),
            hardware_version: String::new(),
            software_version: String::new(),
            software_variant: String::new(),
            allow_location: false,
            low_voltage_cutoff: 0.0,
            temperature_compensation: 0.0,
            subscription_expiration: None,
        }
    }

    // ========== Snapshot replacement ==========

    /// Replaces the telemetry snapshot and re-derives all dependent fields.
    ///
    /// # Errors
    ///
    /// Returns [`ParseError`] if the temperature or voltage string cannot be
    /// interpreted. The snapshot is left untouched on error.
    pub fn apply_telemetry(&mut self, data: TelemetryData) -> Result<(), ParseError> {
        let (temperature, unit) = parse_temperature(&data.temperature)?;
        let voltage = parse_voltage(&data.voltage)?;

        self.temperature = temperature;
        self.temperature_unit = unit;
        self.voltage = voltage;
        self.location = data.location.clone().filter(LocationRecord::is_on);

        self.output_main = None;
        self.output_aux1 = None;
        self.output_aux2 = None;
        for output in &data.outputs {
            match output.line.as_str() {
                // Exactly one of OUTH/OUTV is present and fixes the
                // main-channel mode.
                "OUTH" => {
                    self.ventilation = false;
                    self.icon_heat = output.icon.clone();
                    self.output_main = Some(output.clone());
                }
                "OUTV" => {
                    self.ventilation = true;
                    self.icon_vent = output.icon.clone();
                    self.output_main = Some(output.clone());
                }
                "OUT1" => {
                    self.icon_aux1 = output.icon.clone();
                    self.output_aux1 = Some(output.clone());
                }
                "OUT2" => {
                    self.icon_aux2 = output.icon.clone();
                    self.output_aux2 = Some(output.clone());
                }
                _ => {}
            }
        }

        self.telemetry = Some(data);
        Ok(())
    }

    /// Replaces the settings snapshot and re-derives all dependent fields.
    pub fn apply_settings(&mut self, data: SettingsData) {
        self.hardware_version = data.hw_version.clone();
        self.software_version = data.sw_version.clone();
        self.software_variant = data.sw_variant.clone();

        self.allow_location = data.general_flag("allow_GPS").unwrap_or(false);
        if let Some(cutoff) = data.general_f64("low_voltage_cutoff") {
            self.low_voltage_cutoff = cutoff;
        }
        if let Some(comp) = data.general_f64("ext_temp_comp") {
            self.temperature_compensation = comp;
        }

        if let Some(secs) = data.timeout("OUTH") {
            self.timeout_heat = Timeout::from_secs(secs);
        }
        if let Some(secs) = data.timeout("OUTV") {
            self.timeout_vent = Timeout::from_secs(secs);
        }
        if let Some(secs) = data.timeout("OUT1") {
            self.timeout_aux1 = Timeout::from_secs(secs);
        }
        if let Some(secs) = data.timeout("OUT2") {
            self.timeout_aux2 = Timeout::from_secs(secs);
        }

        self.settings = Some(data);
    }

    /// Replaces the device info snapshot and re-derives all dependent fields.
    pub fn apply_device_info(&mut self, info: DeviceInfo) {
        self.subscription_expiration = info
            .subscription
            .as_ref()
            .and_then(crate::response::Subscription::expiration_time);
        if !info.alias.is_empty() {
            self.name = info.alias.clone();
        }
        self.info = Some(info);
    }

    // ========== Identity ==========

    /// Returns the device id (QR code id).
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Returns the user-assigned device name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    // ========== Telemetry-derived fields ==========

    /// Returns the last reported temperature.
    #[must_use]
    pub fn temperature(&self) -> i32 {
        self.temperature
    }

    /// Returns the unit of [`temperature`](Self::temperature).
    #[must_use]
    pub fn temperature_unit(&self) -> TemperatureUnit {
        self.temperature_unit
    }

    /// Returns the last reported supply voltage.
    #[must_use]
    pub fn voltage(&self) -> f64 {
        self.voltage
    }

    /// Returns the last reported location, if the device has a usable fix.
    #[must_use]
    pub fn location(&self) -> Option<&LocationRecord> {
        self.location.as_ref()
    }

    /// Returns `true` if the main output is on.
    #[must_use]
    pub fn output_main(&self) -> bool {
        self.output_main.as_ref().is_some_and(OutputRecord::is_on)
    }

    /// Returns `true` if the first auxiliary output is on.
    #[must_use]
    pub fn output_aux1(&self) -> bool {
        self.output_aux1.as_ref().is_some_and(OutputRecord::is_on)
    }

    /// Returns `true` if the second auxiliary output is on.
    #[must_use]
    pub fn output_aux2(&self) -> bool {
        self.output_aux2.as_ref().is_some_and(OutputRecord::is_on)
    }

    /// Returns `true` if the main channel is configured for ventilation
    /// rather than heating.
    #[must_use]
    pub fn is_ventilation(&self) -> bool {
        self.ventilation
    }

    /// Returns the main channel's display name.
    ///
    /// `None` until telemetry has been applied; defaults to `"Primary"` when
    /// the device reports an empty name.
    #[must_use]
    pub fn output_main_name(&self) -> Option<String> {
        self.output_main
            .as_ref()
            .map(|record| record.display_name("Primary"))
    }

    /// Returns the first auxiliary channel's display name.
    #[must_use]
    pub fn output_aux1_name(&self) -> Option<String> {
        self.output_aux1
            .as_ref()
            .map(|record| record.display_name(AuxOutput::Aux1.default_name()))
    }

    /// Returns the second auxiliary channel's display name.
    #[must_use]
    pub fn output_aux2_name(&self) -> Option<String> {
        self.output_aux2
            .as_ref()
            .map(|record| record.display_name(AuxOutput::Aux2.default_name()))
    }

    /// Returns the heater icon identifier.
    #[must_use]
    pub fn icon_heat(&self) -> &str {
        &self.icon_heat
    }

    /// Returns the ventilation icon identifier.
    #[must_use]
    pub fn icon_vent(&self) -> &str {
        &self.icon_vent
    }

    /// Returns the first auxiliary output's icon identifier.
    #[must_use]
    pub fn icon_aux1(&self) -> &str {
        &self.icon_aux1
    }

    /// Returns the second auxiliary output's icon identifier.
    #[must_use]
    pub fn icon_aux2(&self) -> &str {
        &self.icon_aux2
    }

    // ========== Settings-derived fields ==========

    /// Returns the heater timeout.
    #[must_use]
    pub fn timeout_heat(&self) -> Timeout {
        self.timeout_heat
    }

    /// Returns the ventilation timeout.
    #[must_use]
    pub fn timeout_vent(&self) -> Timeout {
        self.timeout_vent
    }

    /// Returns the timeout of an auxiliary output.
    #[must_use]
    pub fn timeout_aux(&self, output: AuxOutput) -> Timeout {
        match output {
            AuxOutput::Aux1 => self.timeout_aux1,
            AuxOutput::Aux2 => self.timeout_aux2,
        }
    }

    /// Returns the hardware version string.
    #[must_use]
    pub fn hardware_version(&self) -> &str {
        &self.hardware_version
    }

    /// Returns the software version string.
    #[must_use]
    pub fn software_version(&self) -> &str {
        &self.software_version
    }

    /// Returns the software variant string.
    #[must_use]
    pub fn software_variant(&self) -> &str {
        &self.software_variant
    }

    /// Returns whether the device is allowed to report GPS positions.
    #[must_use]
    pub fn allow_location(&self) -> bool {
        self.allow_location
    }

    /// Returns the low-voltage cutoff calibration value.
    #[must_use]
    pub fn low_voltage_cutoff(&self) -> f64 {
        self.low_voltage_cutoff
    }

    /// Returns the external temperature compensation calibration value.
    #[must_use]
    pub fn temperature_compensation(&self) -> f64 {
        self.temperature_compensation
    }

    // ========== Info-derived fields ==========

    /// Returns when the device's subscription expires.
    #[must_use]
    pub fn subscription_expiration(&self) -> Option<DateTime<Utc>> {
        self.subscription_expiration
    }

    // ========== Raw snapshots ==========

    /// Returns the raw settings payload, if fetched.
    #[must_use]
    pub fn settings(&self) -> Option<&SettingsData> {
        self.settings.as_ref()
    }

    /// Returns the raw telemetry payload, if fetched.
    #[must_use]
    pub fn telemetry(&self) -> Option<&TelemetryData> {
        self.telemetry.as_ref()
    }

    /// Returns the raw device info payload, if fetched.
    #[must_use]
    pub fn device_info(&self) -> Option<&DeviceInfo> {
        self.info.as_ref()
    }
}

impl PartialEq for Device {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Device {}

/// Splits a reading like `"21C"` into its numeric part and unit character.
fn strip_unit<'a>(raw: &'a str, field: &str) -> Result<(&'a str, char), ParseError> {
    let unit = raw.chars().next_back().ok_or_else(|| ParseError::InvalidValue {
        field: field.to_string(),
        message: "empty reading".to_string(),
    })?;
    Ok((&raw[..raw.len() - unit.len_utf8()], unit))
}

fn parse_temperature(raw: &str) -> Result<(i32, TemperatureUnit), ParseError> {
    let (digits, unit) = strip_unit(raw, "temperature")?;
    let value = digits.parse().map_err(|_| ParseError::InvalidValue {
        field: "temperature".to_string(),
        message: format!("not an integer reading: {raw:?}"),
    })?;
    let unit = if unit == 'C' {
        TemperatureUnit::Celsius
    } else {
        TemperatureUnit::Fahrenheit
    };
    Ok((value, unit))
}

fn parse_voltage(raw: &str) -> Result<f64, ParseError> {
    let (digits, _) = strip_unit(raw, "voltage")?;
    digits.parse().map_err(|_| ParseError::InvalidValue {
        field: "voltage".to_string(),
        message: format!("not a float reading: {raw:?}"),
    })
}
