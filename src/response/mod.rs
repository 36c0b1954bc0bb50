// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Payload models for Webasto Connect API responses.
//!
//! The vendor API returns JSON bodies for the three read operations:
//!
//! - [`SettingsData`]: device settings (`get_settings`)
//! - [`TelemetryData`]: last reported telemetry (`get_data`)
//! - [`DeviceInfo`]: device/subscription info and device listing
//!   (`get_data_nopoll`)
//!
//! These structs are raw wire models. Derived fields (temperature as a
//! number, output channel states, timeouts) live on
//! [`Device`](crate::state::Device), which is populated from these payloads.

mod overview;
mod settings;
mod telemetry;

pub use overview::{DeviceInfo, DeviceListEntry, Subscription};
pub use settings::{SettingsData, SettingsGroup, SettingsOption};
pub use telemetry::{LocationRecord, OutputRecord, TelemetryData};
