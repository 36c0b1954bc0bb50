// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Output-channel types for Webasto Connect devices.
//!
//! A device exposes one main output, configured as either a heater or a
//! ventilation channel, plus two auxiliary switchable outputs.

use std::fmt;
use std::str::FromStr;

use crate::error::ParseError;

/// Physical output line tags as reported in telemetry payloads.
///
/// # Examples
///
/// ```
/// use thermoconnect::types::OutputLine;
///
/// let line: OutputLine = "OUTH".parse().unwrap();
/// assert_eq!(line, OutputLine::Heater);
/// assert_eq!(line.as_str(), "OUTH");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OutputLine {
    /// Main output in heater mode (`OUTH`).
    Heater,
    /// Main output in ventilation mode (`OUTV`).
    Ventilation,
    /// First auxiliary output (`OUT1`).
    Aux1,
    /// Second auxiliary output (`OUT2`).
    Aux2,
}

impl OutputLine {
    /// Returns the line tag used by the vendor API.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Heater => "OUTH",
            Self::Ventilation => "OUTV",
            Self::Aux1 => "OUT1",
            Self::Aux2 => "OUT2",
        }
    }

    /// Returns `true` for the two main-channel tags.
    ///
    /// The main channel is mutually exclusive: a telemetry payload carries
    /// either an `OUTH` record or an `OUTV` record, never both.
    #[must_use]
    pub const fn is_main(&self) -> bool {
        matches!(self, Self::Heater | Self::Ventilation)
    }
}

impl fmt::Display for OutputLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for OutputLine {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "OUTH" => Ok(Self::Heater),
            "OUTV" => Ok(Self::Ventilation),
            "OUT1" => Ok(Self::Aux1),
            "OUT2" => Ok(Self::Aux2),
            _ => Err(ParseError::InvalidValue {
                field: "line".to_string(),
                message: format!("unknown output line {s:?}"),
            }),
        }
    }
}

/// Selector for one of the two auxiliary outputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AuxOutput {
    /// First auxiliary output.
    Aux1,
    /// Second auxiliary output.
    Aux2,
}

impl AuxOutput {
    /// Returns the line tag used in settings payload keys (`OUT1`/`OUT2`).
    #[must_use]
    pub const fn line(&self) -> OutputLine {
        match self {
            Self::Aux1 => OutputLine::Aux1,
            Self::Aux2 => OutputLine::Aux2,
        }
    }

    /// Returns the fallback display name used when the device reports an
    /// empty channel name.
    #[must_use]
    pub const fn default_name(&self) -> &'static str {
        match self {
            Self::Aux1 => "Output 1",
            Self::Aux2 => "Output 2",
        }
    }
}

/// Unit of the temperature readings reported by the device.
///
/// Derived from the raw telemetry string: `"21C"` is Celsius, `"70F"` is
/// Fahrenheit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TemperatureUnit {
    /// Degrees Celsius.
    Celsius,
    /// Degrees Fahrenheit.
    #[default]
    Fahrenheit,
}

impl TemperatureUnit {
    /// Returns the display symbol for this unit.
    #[must_use]
    pub const fn symbol(&self) -> &'static str {
        match self {
            Self::Celsius => "°C",
            Self::Fahrenheit => "°F",
        }
    }
}

impl fmt::Display for TemperatureUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol())
    }
}
