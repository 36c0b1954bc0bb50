// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! `thermoconnect` - A Rust client library for the Webasto Connect cloud
//! service.
//!
//! This library authenticates against the vendor HTTP API, discovers the
//! account's registered vehicle heater devices, polls their telemetry and
//! settings, and issues control commands.
//!
//! # Supported Features
//!
//! - **Session handling**: cookie-based login, 401 surfacing, deferred
//!   replay of forbidden (403) calls
//! - **Multi-device accounts**: per-session active-device selection, one
//!   snapshot per registered device
//! - **Output control**: main channel (heater or ventilation), two
//!   auxiliary outputs, per-channel timeouts
//! - **Calibration**: GPS allowance, low-voltage cutoff, temperature
//!   compensation
//!
//! # The active device
//!
//! The vendor API is single-session-scoped: settings, telemetry and command
//! calls always act on whichever device was most recently selected as
//! active. [`Session`] hides this by selecting the target device before
//! every device-scoped operation.
//!
//! # Quick Start
//!
//! ```no_run
//! use thermoconnect::Session;
//!
//! #[tokio::main]
//! async fn main() -> thermoconnect::Result<()> {
//!     let mut session = Session::new("user@example.com", "secret")?;
//!
//!     // Logs in and fetches a snapshot of every registered device
//!     session.connect().await?;
//!
//!     for device in session.devices() {
//!         println!(
//!             "{}: {}{}, {}V",
//!             device.name(),
//!             device.temperature(),
//!             device.temperature_unit(),
//!             device.voltage(),
//!         );
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Controlling outputs
//!
//! ```no_run
//! use thermoconnect::Session;
//! use thermoconnect::types::AuxOutput;
//!
//! # async fn example(session: &mut Session, id: &str) -> thermoconnect::Result<()> {
//! // Start the main output: heater or ventilation, depending on how the
//! // device is configured
//! session.set_output_main(id, true).await?;
//!
//! // 90 minute timeout on the first auxiliary output
//! session.set_aux_timeout(id, AuxOutput::Aux1, 90 * 60).await?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Deferred retries
//!
//! The API answers 403 when a call arrives at a bad moment. Such calls are
//! not errors: the identical request is queued for replay after 30 seconds,
//! and the queue is yours to drive or drop:
//!
//! ```no_run
//! # async fn example(session: &mut thermoconnect::Session) -> thermoconnect::Result<()> {
//! if let Some(deadline) = session.next_retry_deadline() {
//!     tokio::time::sleep_until(deadline).await;
//!     session.run_due_retries().await?;
//! }
//! # Ok(())
//! # }
//! ```

pub mod command;
pub mod error;
pub mod protocol;
pub mod response;
pub mod retry;
mod session;
mod settings;
pub mod state;
pub mod types;

pub use command::OutputCommand;
pub use error::{Error, ParseError, ProtocolError, Result};
pub use protocol::{API_URL, CallOutcome, Payload, RequestKind, SessionConfig, SessionCookie};
pub use retry::{PendingRetry, RETRY_DELAY};
pub use session::Session;
pub use state::Device;
pub use types::{AuxOutput, OutputLine, TemperatureUnit, Timeout};
