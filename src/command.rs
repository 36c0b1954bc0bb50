// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Webasto Connect output commands.
//!
//! Output switching does not go through the settings payload. The `command`
//! endpoint takes a fixed literal string per line and state, e.g.
//! `"OUT H ON"` to start the heater.
//!
//! # Examples
//!
//! ```
//! use thermoconnect::command::OutputCommand;
//! use thermoconnect::types::AuxOutput;
//!
//! assert_eq!(OutputCommand::main(false, true).as_str(), "OUT H ON");
//! assert_eq!(OutputCommand::main(true, false).as_str(), "OUT V OFF");
//! assert_eq!(OutputCommand::aux(AuxOutput::Aux2, true).as_str(), "OUT 2 ON");
//! ```

use std::fmt;

use crate::types::AuxOutput;

/// A literal output-switching command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OutputCommand {
    /// Start the heater (`OUT H ON`).
    HeaterOn,
    /// Stop the heater (`OUT H OFF`).
    HeaterOff,
    /// Start ventilation (`OUT V ON`).
    VentilationOn,
    /// Stop ventilation (`OUT V OFF`).
    VentilationOff,
    /// Switch the first auxiliary output on (`OUT 1 ON`).
    Aux1On,
    /// Switch the first auxiliary output off (`OUT 1 OFF`).
    Aux1Off,
    /// Switch the second auxiliary output on (`OUT 2 ON`).
    Aux2On,
    /// Switch the second auxiliary output off (`OUT 2 OFF`).
    Aux2Off,
}

impl OutputCommand {
    /// Returns the command for the main channel.
    ///
    /// Which literal is sent depends on the channel's configured mode:
    /// heater (`OUT H ...`) or ventilation (`OUT V ...`).
    #[must_use]
    pub const fn main(ventilation: bool, on: bool) -> Self {
        match (ventilation, on) {
            (false, true) => Self::HeaterOn,
            (false, false) => Self::HeaterOff,
            (true, true) => Self::VentilationOn,
            (true, false) => Self::VentilationOff,
        }
    }

    /// Returns the command for an auxiliary output.
    #[must_use]
    pub const fn aux(output: AuxOutput, on: bool) -> Self {
        match (output, on) {
            (AuxOutput::Aux1, true) => Self::Aux1On,
            (AuxOutput::Aux1, false) => Self::Aux1Off,
            (AuxOutput::Aux2, true) => Self::Aux2On,
            (AuxOutput::Aux2, false) => Self::Aux2Off,
        }
    }

    /// Returns the literal payload sent to the `command` endpoint.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::HeaterOn => "OUT H ON",
            Self::HeaterOff => "OUT H OFF",
            Self::VentilationOn => "OUT V ON",
            Self::VentilationOff => "OUT V OFF",
            Self::Aux1On => "OUT 1 ON",
            Self::Aux1Off => "OUT 1 OFF",
            Self::Aux2On => "OUT 2 ON",
            Self::Aux2Off => "OUT 2 OFF",
        }
    }
}

impl fmt::Display for OutputCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
