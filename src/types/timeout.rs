// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Output timeout values.
//!
//! The vendor settings payload does not carry timeouts as seconds. It splits
//! them into an hours and a minutes component, both computed modulo a 24-hour
//! wraparound. A timeout of 24 hours or more is therefore silently truncated
//! to its time-of-day equivalent before it reaches the device. That is the
//! vendor's behavior, and this type reproduces it exactly.

use std::fmt;

const SECS_PER_DAY: u32 = 24 * 3600;

/// An output timeout in seconds, with the vendor's hours/minutes encoding.
///
/// # Examples
///
/// ```
/// use thermoconnect::types::Timeout;
///
/// let t = Timeout::from_secs(3660);
/// assert_eq!(t.hours(), 1);
/// assert_eq!(t.minutes(), 1);
///
/// // 25 hours wraps around to 1 hour.
/// let t = Timeout::from_secs(25 * 3600);
/// assert_eq!(t.hours(), 1);
/// assert_eq!(t.minutes(), 0);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Timeout(u32);

impl Timeout {
    /// Creates a timeout from a number of seconds.
    #[must_use]
    pub const fn from_secs(secs: u32) -> Self {
        Self(secs)
    }

    /// Returns the timeout in seconds, as given.
    #[must_use]
    pub const fn as_secs(&self) -> u32 {
        self.0
    }

    /// Returns the hours component of the wire encoding.
    #[must_use]
    pub const fn hours(&self) -> u32 {
        (self.0 % SECS_PER_DAY) / 3600
    }

    /// Returns the minutes component of the wire encoding.
    #[must_use]
    pub const fn minutes(&self) -> u32 {
        ((self.0 % SECS_PER_DAY) % 3600) / 60
    }

    /// Returns the seconds the device will actually observe after the
    /// wire encoding: whole minutes, wrapped at 24 hours.
    #[must_use]
    pub const fn effective_secs(&self) -> u32 {
        self.hours() * 3600 + self.minutes() * 60
    }
}

impl From<u32> for Timeout {
    fn from(secs: u32) -> Self {
        Self::from_secs(secs)
    }
}

impl fmt::Display for Timeout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}s", self.0)
    }
}
