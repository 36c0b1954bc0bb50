// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error types for the `thermoconnect` library.
//!
//! This module provides the error hierarchy for handling failures across the
//! library: authentication, transport, payload parsing, and device lookups.

use thiserror::Error;

/// The main error type for this library.
///
/// This enum encompasses all possible errors that can occur when talking to
/// the Webasto Connect service.
#[derive(Debug, Error)]
pub enum Error {
    /// Credentials were rejected or the session expired (HTTP 401).
    ///
    /// The session is no longer authorized; the caller must call
    /// [`Session::connect`](crate::Session::connect) again.
    #[error("unauthorized: username or password incorrect, or session expired")]
    Unauthorized,

    /// The API reported a status other than 200, 401 or 403.
    #[error("API reported {status}: {body}")]
    InvalidRequest {
        /// The HTTP status code returned by the API.
        status: u16,
        /// The response body text.
        body: String,
    },

    /// Error occurred during transport-level communication.
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// Error occurred while parsing a response payload.
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),

    /// The device id is not present in the session registry.
    ///
    /// Devices must be discovered through [`Session::update`](crate::Session::update)
    /// before they can be addressed by id.
    #[error("device {0:?} not found in registry")]
    DeviceNotFound(String),

    /// The session has not completed a successful login yet.
    #[error("session is not connected")]
    NotConnected,
}

/// Errors related to HTTP transport.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// HTTP request failed.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Invalid base URL.
    #[error("invalid address: {0}")]
    InvalidAddress(String),

    /// The login response carried no session cookie.
    #[error("no session cookie in login response")]
    MissingSessionCookie,
}

/// Errors related to parsing Webasto Connect payloads.
#[derive(Debug, Error)]
pub enum ParseError {
    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    /// Expected field is missing from the payload.
    #[error("missing field in payload: {0}")]
    MissingField(String),

    /// Failed to parse a specific value.
    #[error("failed to parse {field}: {message}")]
    InvalidValue {
        /// The field that failed to parse.
        field: String,
        /// Description of the parsing failure.
        message: String,
    },
}

/// A specialized Result type for this library.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_request_display() {
        let err = Error::InvalidRequest {
            status: 500,
            body: "internal error".to_string(),
        };
        assert_eq!(err.to_string(), "API reported 500: internal error");
    }

    #[test]
    fn error_from_parse_error() {
        let parse_err = ParseError::MissingField("temperature".to_string());
        let err: Error = parse_err.into();
        assert!(matches!(err, Error::Parse(ParseError::MissingField(_))));
    }

    #[test]
    fn device_not_found_display() {
        let err = Error::DeviceNotFound("A1B2C3".to_string());
        assert_eq!(err.to_string(), "device \"A1B2C3\" not found in registry");
    }

    #[test]
    fn missing_cookie_display() {
        let err = ProtocolError::MissingSessionCookie;
        assert_eq!(err.to_string(), "no session cookie in login response");
    }
}
