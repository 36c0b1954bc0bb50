// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Device info payload parsing.

use chrono::{DateTime, Utc};
use serde::Deserialize;

/// Device and account info from `get_data_nopoll`.
///
/// This payload does double duty: scoped to the active device it carries
/// that device's id, alias and subscription; at the top level it also lists
/// every device registered to the account, which is what
/// [`Session::list_devices`](crate::Session::list_devices) enumerates.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DeviceInfo {
    /// Device id (QR code id) of the active device.
    #[serde(default)]
    pub id: String,

    /// User-assigned device name.
    #[serde(default)]
    pub alias: String,

    /// Subscription details for the active device.
    pub subscription: Option<Subscription>,

    /// All devices registered to the account.
    #[serde(default)]
    pub devices: Vec<DeviceListEntry>,
}

/// Subscription details.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct Subscription {
    /// Expiration as epoch seconds.
    pub expiration: i64,
}

impl Subscription {
    /// Returns the expiration as a UTC timestamp.
    ///
    /// Returns `None` if the epoch value is out of chrono's representable
    /// range.
    #[must_use]
    pub fn expiration_time(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.expiration, 0)
    }
}

/// One entry in the account's device listing.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct DeviceListEntry {
    /// Device id.
    pub id: String,

    /// User-assigned device name.
    #[serde(default)]
    pub alias: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_device_listing() {
        let json = r#"{
            "id": "A1B2C3",
            "alias": "Camper",
            "subscription": {"expiration": 1767225600},
            "devices": [
                {"id": "A1B2C3", "alias": "Camper"},
                {"id": "D4E5F6", "alias": "Boat"}
            ]
        }"#;
        let info: DeviceInfo = serde_json::from_str(json).unwrap();
        assert_eq!(info.devices.len(), 2);
        assert_eq!(info.devices[1].id, "D4E5F6");
    }

    #[test]
    fn subscription_expiration_to_utc() {
        let sub = Subscription {
            expiration: 1_767_225_600,
        };
        let when = sub.expiration_time().unwrap();
        assert_eq!(when.timestamp(), 1_767_225_600);
    }

    #[test]
    fn missing_subscription_is_none() {
        let info: DeviceInfo = serde_json::from_str(r#"{"id": "X"}"#).unwrap();
        assert!(info.subscription.is_none());
        assert!(info.devices.is_empty());
    }
}
