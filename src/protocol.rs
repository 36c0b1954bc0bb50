// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Wire-level building blocks for the Webasto Connect API.
//!
//! Every operation is an HTTPS POST to a single vendor base endpoint; a path
//! suffix selects the operation kind. Authentication is a session cookie
//! (`hssess`, or the `hssess-webclient` variant) captured from the first
//! response and attached to all subsequent requests.

use std::time::Duration;

use reqwest::Client;
use reqwest::header::SET_COOKIE;

use crate::error::ProtocolError;
use crate::retry::RETRY_DELAY;

/// The production API endpoint.
pub const API_URL: &str = "https://my.webastoconnect.com/webapi";

/// Origin header sent with every request.
pub(crate) const ORIGIN: &str = "https://my.webastoconnect.com";

/// Fixed user-agent string sent with every request.
pub(crate) const USER_AGENT: &str = concat!("thermoconnect/", env!("CARGO_PKG_VERSION"));

/// The operation kinds of the vendor API.
///
/// Read kinds (`GetSettings`, `GetData`, `GetDataNoPoll`) return a JSON body;
/// write kinds return an empty or ignored body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RequestKind {
    /// Username/password login; sets the session cookie.
    Login,
    /// Fetch device settings for the active device.
    GetSettings,
    /// Fetch last telemetry for the active device.
    GetData,
    /// Fetch device/subscription info and the device listing, without
    /// triggering a device poll.
    GetDataNoPoll,
    /// Select the session's active device.
    ChangeDevice,
    /// Post a settings-update envelope for the active device.
    PostSetting,
    /// Send a literal output command to the active device.
    Command,
}

impl RequestKind {
    /// Returns the path suffix under the base endpoint.
    #[must_use]
    pub const fn path(&self) -> &'static str {
        match self {
            Self::Login => "/login",
            Self::GetSettings => "/get_settings",
            Self::GetData => "/get_data",
            Self::GetDataNoPoll => "/get_data_nopoll",
            Self::ChangeDevice => "/change_device",
            Self::PostSetting => "/post_setting",
            Self::Command => "/command",
        }
    }

    /// Returns `true` if the response body carries JSON to decode.
    #[must_use]
    pub const fn is_read(&self) -> bool {
        matches!(self, Self::GetSettings | Self::GetData | Self::GetDataNoPoll)
    }
}

/// Request body for a [`RequestKind`].
///
/// Cloneable so a forbidden call can be replayed identically by the retry
/// queue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payload {
    /// No body.
    Empty,
    /// Form-encoded key/value pairs (login, device select).
    Form(Vec<(&'static str, String)>),
    /// A settings envelope, serialized as a JSON string body.
    Json(String),
    /// A literal command string.
    Text(&'static str),
}

impl Payload {
    /// Builds a JSON payload from a value.
    #[must_use]
    pub fn json(value: &serde_json::Value) -> Self {
        Self::Json(value.to_string())
    }
}

/// Outcome of a single authenticated call.
///
/// Unauthorized and invalid-request conditions surface as
/// [`Error`](crate::Error); a 403 is not an error but a deferred state,
/// represented here so callers consume it explicitly.
#[derive(Debug, Clone)]
pub enum CallOutcome {
    /// HTTP 200. Carries the decoded body for read kinds, `None` for writes.
    Success(Option<serde_json::Value>),
    /// HTTP 403. A retry of the identical call has been queued.
    Forbidden {
        /// Delay before the queued retry becomes due.
        retry_after: Duration,
    },
}

impl CallOutcome {
    /// Returns the decoded body, if this outcome carries one.
    #[must_use]
    pub fn into_json(self) -> Option<serde_json::Value> {
        match self {
            Self::Success(body) => body,
            Self::Forbidden { .. } => None,
        }
    }
}

/// The session cookie issued by the vendor on first response.
///
/// Two variants exist depending on the API version; the `webclient` variant
/// is preferred when both are offered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionCookie {
    /// Plain `hssess` cookie.
    Plain(String),
    /// `hssess-webclient` cookie.
    WebClient(String),
}

impl SessionCookie {
    /// Extracts the session cookie from a response's `Set-Cookie` headers.
    ///
    /// Returns `None` if neither variant is present. When both are present,
    /// `hssess-webclient` wins.
    #[must_use]
    pub(crate) fn from_response(response: &reqwest::Response) -> Option<Self> {
        let mut plain = None;
        let mut webclient = None;

        for header in response.headers().get_all(SET_COOKIE) {
            let Ok(raw) = header.to_str() else { continue };
            let Some((name, rest)) = raw.split_once('=') else {
                continue;
            };
            let value = rest.split(';').next().unwrap_or(rest).trim().to_string();
            match name.trim() {
                "hssess-webclient" => webclient = Some(value),
                "hssess" => plain = Some(value),
                _ => {}
            }
        }

        webclient.map(Self::WebClient).or(plain.map(Self::Plain))
    }

    /// Renders the `Cookie` request header value.
    #[must_use]
    pub fn header_value(&self) -> String {
        match self {
            Self::Plain(value) => format!("hssess={value};"),
            Self::WebClient(value) => format!("hssess-webclient={value};"),
        }
    }
}

/// Configuration for a Webasto Connect session.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use thermoconnect::protocol::SessionConfig;
///
/// // Production endpoint with the 60 second default timeout
/// let config = SessionConfig::new();
///
/// // Against a different endpoint (e.g. a test server)
/// let config = SessionConfig::new()
///     .with_base_url("http://127.0.0.1:8080/webapi")
///     .with_timeout(Duration::from_secs(5));
/// ```
#[derive(Debug, Clone)]
pub struct SessionConfig {
    base_url: String,
    timeout: Duration,
    retry_delay: Duration,
}

impl SessionConfig {
    /// Default per-request timeout.
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

    /// Creates a configuration pointing at the production endpoint.
    #[must_use]
    pub fn new() -> Self {
        Self {
            base_url: API_URL.to_string(),
            timeout: Self::DEFAULT_TIMEOUT,
            retry_delay: RETRY_DELAY,
        }
    }

    /// Overrides the base endpoint URL.
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Overrides the per-request timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Overrides the delay before a forbidden call is replayed.
    ///
    /// Defaults to [`RETRY_DELAY`](crate::RETRY_DELAY).
    #[must_use]
    pub fn with_retry_delay(mut self, retry_delay: Duration) -> Self {
        self.retry_delay = retry_delay;
        self
    }

    /// Returns the base endpoint URL.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Returns the per-request timeout.
    #[must_use]
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Returns the delay before a forbidden call is replayed.
    #[must_use]
    pub fn retry_delay(&self) -> Duration {
        self.retry_delay
    }

    /// Builds the full URL for a request kind.
    #[must_use]
    pub(crate) fn url_for(&self, kind: RequestKind) -> String {
        format!("{}{}", self.base_url, kind.path())
    }

    /// Creates the HTTP client for this configuration.
    pub(crate) fn build_client(&self) -> Result<Client, ProtocolError> {
        Client::builder()
            .timeout(self.timeout)
            .build()
            .map_err(ProtocolError::Http)
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn read_kinds() {
        assert!(RequestKind::GetSettings.is_read());
        assert!(RequestKind::GetData.is_read());
        assert!(RequestKind::GetDataNoPoll.is_read());
        assert!(!RequestKind::Login.is_read());
        assert!(!RequestKind::ChangeDevice.is_read());
        assert!(!RequestKind::PostSetting.is_read());
        assert!(!RequestKind::Command.is_read());
    }

    #[test]
    fn url_for_kind() {
        let config = SessionConfig::new().with_base_url("http://localhost:1234/webapi");
        assert_eq!(
            config.url_for(RequestKind::ChangeDevice),
            "http://localhost:1234/webapi/change_device"
        );
    }

    #[test]
    fn config_defaults() {
        let config = SessionConfig::new();
        assert_eq!(config.base_url(), API_URL);
        assert_eq!(config.timeout(), Duration::from_secs(60));
        assert_eq!(config.retry_delay(), Duration::from_secs(30));
    }

    #[test]
    fn cookie_header_values() {
        let plain = SessionCookie::Plain("abc123".to_string());
        assert_eq!(plain.header_value(), "hssess=abc123;");

        let webclient = SessionCookie::WebClient("def456".to_string());
        assert_eq!(webclient.header_value(), "hssess-webclient=def456;");
    }

    #[test]
    fn forbidden_outcome_has_no_body() {
        let outcome = CallOutcome::Forbidden {
            retry_after: Duration::from_secs(30),
        };
        assert!(outcome.into_json().is_none());
    }

    #[test]
    fn json_payload_is_compact() {
        let payload = Payload::json(&serde_json::json!({"a": 1}));
        assert_eq!(payload, Payload::Json("{\"a\":1}".to_string()));
    }
}
