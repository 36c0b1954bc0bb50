// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The authenticated Webasto Connect session.
//!
//! A [`Session`] owns the credentials, the session cookie, the authorization
//! state and the per-device snapshot registry. The vendor API is
//! single-session-scoped: settings, telemetry and commands always target
//! whichever device was most recently selected as active, so every
//! device-scoped operation here selects its target first.
//!
//! All operations take `&mut self`. There is exactly one logical session and
//! no internal locking; callers must not issue overlapping operations on the
//! same `Session`.

use std::collections::BTreeMap;

use reqwest::{Client, StatusCode, header};
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::command::OutputCommand;
use crate::error::{Error, ParseError, ProtocolError, Result};
use crate::protocol::{
    CallOutcome, ORIGIN, Payload, RequestKind, SessionConfig, SessionCookie, USER_AGENT,
};
use crate::response::{DeviceInfo, SettingsData, TelemetryData};
use crate::retry::{PendingRetry, RetryQueue};
use crate::settings;
use crate::state::Device;
use crate::types::{AuxOutput, Timeout};

/// An authenticated session against the Webasto Connect cloud service.
///
/// # Examples
///
/// ```no_run
/// use thermoconnect::Session;
///
/// #[tokio::main]
/// async fn main() -> thermoconnect::Result<()> {
///     let mut session = Session::new("user@example.com", "secret")?;
///     session.connect().await?;
///
///     for (id, name) in session.list_devices() {
///         let device = session.device(&id).unwrap();
///         println!("{name}: {}{}", device.temperature(), device.temperature_unit());
///     }
///
///     // Start the heater (or ventilation, depending on configuration)
///     let (id, _) = session.list_devices().remove(0);
///     session.set_output_main(&id, true).await?;
///     Ok(())
/// }
/// ```
#[derive(Debug)]
pub struct Session {
    config: SessionConfig,
    http: Client,
    username: String,
    password: String,
    cookie: Option<SessionCookie>,
    authorized: bool,
    overview: Option<DeviceInfo>,
    devices: BTreeMap<String, Device>,
    retries: RetryQueue,
}

impl Session {
    /// Creates a session for a credential pair against the production
    /// endpoint.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client cannot be created.
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Result<Self> {
        Self::with_config(SessionConfig::new(), username, password)
    }

    /// Creates a session with a custom configuration.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client cannot be created.
    pub fn with_config(
        config: SessionConfig,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Result<Self> {
        let http = config.build_client()?;
        Ok(Self {
            config,
            http,
            username: username.into(),
            password: password.into(),
            cookie: None,
            authorized: false,
            overview: None,
            devices: BTreeMap::new(),
            retries: RetryQueue::default(),
        })
    }

    /// Returns `true` after the last call was accepted by the API.
    #[must_use]
    pub fn is_authorized(&self) -> bool {
        self.authorized
    }

    // ========== Authentication ==========

    /// Logs in and performs an initial full [`update`](Self::update).
    ///
    /// # Errors
    ///
    /// Returns [`Error::Unauthorized`] if the credentials are rejected. This
    /// is a user-visible condition and is not retried; fix the credentials
    /// and call `connect` again.
    pub async fn connect(&mut self) -> Result<()> {
        let payload = Payload::Form(vec![
            ("username", self.username.clone()),
            ("password", self.password.clone()),
        ]);
        self.call(RequestKind::Login, payload).await?;

        if !self.authorized {
            return Err(Error::Unauthorized);
        }
        if self.cookie.is_none() {
            return Err(ProtocolError::MissingSessionCookie.into());
        }

        debug!("login successful");
        self.update().await
    }

    /// The single authenticated request primitive.
    ///
    /// Sends `payload` to the endpoint selected by `kind` and interprets the
    /// status code:
    ///
    /// - 200 marks the session authorized; read kinds return the decoded
    ///   JSON body.
    /// - 401 clears the authorization flag and fails with
    ///   [`Error::Unauthorized`]; the registry is left untouched.
    /// - 403 queues exactly one deferred replay of the identical call and
    ///   returns [`CallOutcome::Forbidden`].
    /// - Anything else fails with [`Error::InvalidRequest`].
    ///
    /// The session cookie is captured from the first response only and
    /// reused for the lifetime of the session.
    ///
    /// # Errors
    ///
    /// See above; transport failures surface as [`Error::Protocol`].
    pub async fn call(&mut self, kind: RequestKind, payload: Payload) -> Result<CallOutcome> {
        let url = self.config.url_for(kind);
        debug!(%url, ?kind, "sending request");

        let mut request = self
            .http
            .post(&url)
            .header(header::ORIGIN, ORIGIN)
            .header(header::USER_AGENT, USER_AGENT);
        if let Some(cookie) = &self.cookie {
            request = request.header(header::COOKIE, cookie.header_value());
        }
        let request = match &payload {
            Payload::Empty => request,
            Payload::Form(fields) => request.form(fields),
            Payload::Json(body) => request.body(body.clone()),
            Payload::Text(text) => request.body(*text),
        };

        let response = request.send().await.map_err(ProtocolError::Http)?;

        // Cookie is sticky: only the first response may set it.
        if self.cookie.is_none() {
            self.cookie = SessionCookie::from_response(&response);
        }

        let status = response.status();
        match status {
            StatusCode::OK => {
                self.authorized = true;
                if kind.is_read() {
                    let body = response.json().await.map_err(ProtocolError::Http)?;
                    Ok(CallOutcome::Success(Some(body)))
                } else {
                    Ok(CallOutcome::Success(None))
                }
            }
            StatusCode::UNAUTHORIZED => {
                self.authorized = false;
                Err(Error::Unauthorized)
            }
            StatusCode::FORBIDDEN => {
                let delay = self.config.retry_delay();
                warn!(?kind, ?delay, "forbidden, queueing retry");
                self.retries.schedule(kind, payload, delay);
                Ok(CallOutcome::Forbidden { retry_after: delay })
            }
            _ => {
                let body = response.text().await.unwrap_or_default();
                Err(Error::InvalidRequest {
                    status: status.as_u16(),
                    body,
                })
            }
        }
    }

    // ========== Device discovery & refresh ==========

    /// Returns `(id, name)` for every device known from the last overview
    /// payload.
    ///
    /// Empty until the first successful [`update`](Self::update). Accounts
    /// whose overview carries no device listing fall back to the overview's
    /// own device identity.
    #[must_use]
    pub fn list_devices(&self) -> Vec<(String, String)> {
        let Some(overview) = &self.overview else {
            return Vec::new();
        };
        if overview.devices.is_empty() {
            if overview.id.is_empty() {
                return Vec::new();
            }
            return vec![(overview.id.clone(), overview.alias.clone())];
        }
        overview
            .devices
            .iter()
            .map(|entry| (entry.id.clone(), entry.alias.clone()))
            .collect()
    }

    /// Selects the session's active device.
    ///
    /// The vendor API is stateful per session: all subsequent device-scoped
    /// calls act on whichever device was most recently selected. This call
    /// precedes every per-device fetch or command issued by this library.
    ///
    /// # Errors
    ///
    /// Fails like any [`call`](Self::call).
    pub async fn change_device(&mut self, device_id: &str) -> Result<()> {
        self.select_device(device_id).await.map(|_| ())
    }

    /// Refreshes the overview payload and every listed device's snapshots.
    ///
    /// Each device is selected active in turn, then its settings, telemetry
    /// and device info are fetched and applied. A forbidden fetch skips that
    /// snapshot (its replay is queued) without failing the whole refresh.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotConnected`] before a successful login; otherwise
    /// fails like any [`call`](Self::call).
    pub async fn update(&mut self) -> Result<()> {
        if self.cookie.is_none() {
            return Err(Error::NotConnected);
        }

        if let Some(body) = self
            .call(RequestKind::GetDataNoPoll, Payload::Empty)
            .await?
            .into_json()
        {
            let overview: DeviceInfo =
                serde_json::from_value(body).map_err(ParseError::Json)?;
            self.overview = Some(overview);
        }

        for (id, name) in self.list_devices() {
            self.refresh_device(&id, &name).await?;
        }
        Ok(())
    }

    /// Refreshes a single, already-registered device.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DeviceNotFound`] if `device_id` has not been
    /// discovered yet; devices enter the registry only through
    /// [`update`](Self::update).
    pub async fn update_device(&mut self, device_id: &str) -> Result<()> {
        let name = self
            .devices
            .get(device_id)
            .ok_or_else(|| Error::DeviceNotFound(device_id.to_string()))?
            .name()
            .to_string();
        self.refresh_device(device_id, &name).await
    }

    /// Returns the snapshot of a registered device.
    #[must_use]
    pub fn device(&self, device_id: &str) -> Option<&Device> {
        self.devices.get(device_id)
    }

    /// Returns all registered device snapshots, ordered by id.
    pub fn devices(&self) -> impl Iterator<Item = &Device> {
        self.devices.values()
    }

    // ========== Mutating operations ==========

    /// Switches the main output (heater or ventilation, per configuration).
    ///
    /// Selects the device active, sends the matching literal command, then
    /// refreshes the device snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DeviceNotFound`] for an undiscovered id; otherwise
    /// fails like any [`call`](Self::call).
    pub async fn set_output_main(&mut self, device_id: &str, on: bool) -> Result<()> {
        let ventilation = self.require_device(device_id)?.is_ventilation();
        let command = OutputCommand::main(ventilation, on);
        self.send_command(device_id, command).await
    }

    /// Switches the first auxiliary output.
    ///
    /// # Errors
    ///
    /// Same as [`set_output_main`](Self::set_output_main).
    pub async fn set_output_aux1(&mut self, device_id: &str, on: bool) -> Result<()> {
        self.set_output_aux(device_id, AuxOutput::Aux1, on).await
    }

    /// Switches the second auxiliary output.
    ///
    /// # Errors
    ///
    /// Same as [`set_output_main`](Self::set_output_main).
    pub async fn set_output_aux2(&mut self, device_id: &str, on: bool) -> Result<()> {
        self.set_output_aux(device_id, AuxOutput::Aux2, on).await
    }

    /// Switches an auxiliary output.
    ///
    /// # Errors
    ///
    /// Same as [`set_output_main`](Self::set_output_main).
    pub async fn set_output_aux(
        &mut self,
        device_id: &str,
        output: AuxOutput,
        on: bool,
    ) -> Result<()> {
        self.require_device(device_id)?;
        self.send_command(device_id, OutputCommand::aux(output, on))
            .await
    }

    /// Configures the main channel for ventilation (`true`) or heating
    /// (`false`).
    ///
    /// The device's current main-channel timeouts ride along with the mode
    /// change, since the vendor payload rewrites both timeout blocks.
    ///
    /// # Errors
    ///
    /// Same as [`set_output_main`](Self::set_output_main).
    pub async fn set_ventilation_mode(&mut self, device_id: &str, ventilation: bool) -> Result<()> {
        let device = self.require_device(device_id)?;
        let payload =
            settings::ventilation_mode(ventilation, device.timeout_heat(), device.timeout_vent());
        self.post_setting(device_id, &payload).await
    }

    /// Sets the main-channel timeouts in seconds.
    ///
    /// Pass `None` to keep a timeout unchanged. Values of 24 hours or more
    /// wrap around to their time-of-day equivalent; that truncation is the
    /// vendor's, not this library's.
    ///
    /// # Errors
    ///
    /// Same as [`set_output_main`](Self::set_output_main).
    pub async fn set_main_timeout(
        &mut self,
        device_id: &str,
        heater: Option<u32>,
        ventilation: Option<u32>,
    ) -> Result<()> {
        let device = self.require_device(device_id)?;
        let heat = heater.map_or(device.timeout_heat(), Timeout::from_secs);
        let vent = ventilation.map_or(device.timeout_vent(), Timeout::from_secs);
        let payload = settings::ventilation_mode(device.is_ventilation(), heat, vent);
        self.post_setting(device_id, &payload).await
    }

    /// Sets an auxiliary output's timeout in seconds.
    ///
    /// The same 24-hour wraparound as [`set_main_timeout`](Self::set_main_timeout)
    /// applies.
    ///
    /// # Errors
    ///
    /// Same as [`set_output_main`](Self::set_output_main).
    pub async fn set_aux_timeout(
        &mut self,
        device_id: &str,
        output: AuxOutput,
        timeout_secs: u32,
    ) -> Result<()> {
        let device = self.require_device(device_id)?;
        let name = match output {
            AuxOutput::Aux1 => device.output_aux1_name(),
            AuxOutput::Aux2 => device.output_aux2_name(),
        }
        .unwrap_or_else(|| output.default_name().to_string());
        let icon = match output {
            AuxOutput::Aux1 => device.icon_aux1(),
            AuxOutput::Aux2 => device.icon_aux2(),
        }
        .to_string();
        let payload =
            settings::aux_timeout(output, Timeout::from_secs(timeout_secs), &name, &icon);
        self.post_setting(device_id, &payload).await
    }

    /// Sets the low-voltage cutoff calibration value.
    ///
    /// # Errors
    ///
    /// Same as [`set_output_main`](Self::set_output_main).
    pub async fn set_low_voltage_cutoff(&mut self, device_id: &str, value: f64) -> Result<()> {
        self.require_device(device_id)?;
        let payload = settings::calibration_value("low_voltage_cutoff", value);
        self.post_setting(device_id, &payload).await
    }

    /// Sets the external temperature compensation calibration value.
    ///
    /// # Errors
    ///
    /// Same as [`set_output_main`](Self::set_output_main).
    pub async fn set_temperature_compensation(
        &mut self,
        device_id: &str,
        value: f64,
    ) -> Result<()> {
        self.require_device(device_id)?;
        let payload = settings::calibration_value("ext_temp_comp", value);
        self.post_setting(device_id, &payload).await
    }

    // ========== Deferred retries ==========

    /// Returns the queued replays of forbidden calls.
    #[must_use]
    pub fn pending_retries(&self) -> &[PendingRetry] {
        self.retries.pending()
    }

    /// Drops every queued retry.
    pub fn cancel_retries(&mut self) {
        self.retries.cancel_all();
    }

    /// Returns the earliest retry deadline, if any retry is queued.
    #[must_use]
    pub fn next_retry_deadline(&self) -> Option<Instant> {
        self.retries.next_deadline()
    }

    /// Replays every due retry and returns how many were replayed.
    ///
    /// A replay that is forbidden again re-enqueues itself with a fresh
    /// deadline. Bodies of replayed read calls are discarded; the next
    /// [`update`](Self::update) refreshes the snapshots.
    ///
    /// # Errors
    ///
    /// Fails like any [`call`](Self::call); remaining due entries stay
    /// queued if a replay fails.
    pub async fn run_due_retries(&mut self) -> Result<usize> {
        let mut due = self.retries.take_due(Instant::now()).into_iter();
        let mut count = 0;
        while let Some(entry) = due.next() {
            let (kind, payload) = entry.into_parts();
            debug!(?kind, "replaying deferred call");
            if let Err(err) = self.call(kind, payload).await {
                // The not-yet-replayed entries go back in the queue.
                self.retries.restore(due);
                return Err(err);
            }
            count += 1;
        }
        Ok(count)
    }

    // ========== Internals ==========

    fn require_device(&self, device_id: &str) -> Result<&Device> {
        self.devices
            .get(device_id)
            .ok_or_else(|| Error::DeviceNotFound(device_id.to_string()))
    }

    /// Selects the active device; returns `false` if the select was
    /// forbidden (its replay is queued).
    async fn select_device(&mut self, device_id: &str) -> Result<bool> {
        let payload = Payload::Form(vec![("device", device_id.to_string())]);
        let outcome = self.call(RequestKind::ChangeDevice, payload).await?;
        Ok(matches!(outcome, CallOutcome::Success(_)))
    }

    async fn refresh_device(&mut self, device_id: &str, name: &str) -> Result<()> {
        if !self.select_device(device_id).await? {
            return Ok(());
        }

        let settings_body = self
            .call(RequestKind::GetSettings, Payload::Empty)
            .await?
            .into_json();
        let telemetry_body = self
            .call(RequestKind::GetData, Payload::Empty)
            .await?
            .into_json();
        let info_body = self
            .call(RequestKind::GetDataNoPoll, Payload::Empty)
            .await?
            .into_json();

        let device = self
            .devices
            .entry(device_id.to_string())
            .or_insert_with(|| Device::new(device_id, name));

        if let Some(body) = settings_body {
            let data: SettingsData = serde_json::from_value(body).map_err(ParseError::Json)?;
            device.apply_settings(data);
        }
        if let Some(body) = telemetry_body {
            let data: TelemetryData = serde_json::from_value(body).map_err(ParseError::Json)?;
            device.apply_telemetry(data)?;
        }
        if let Some(body) = info_body {
            let info: DeviceInfo = serde_json::from_value(body).map_err(ParseError::Json)?;
            device.apply_device_info(info);
        }
        Ok(())
    }

    /// Selects the device, sends a literal output command and refreshes the
    /// device snapshot.
    async fn send_command(&mut self, device_id: &str, command: OutputCommand) -> Result<()> {
        if !self.select_device(device_id).await? {
            return Ok(());
        }
        debug!(command = command.as_str(), device_id, "sending output command");
        self.call(RequestKind::Command, Payload::Text(command.as_str()))
            .await?;
        self.update_device(device_id).await
    }

    /// Selects the device, posts a settings envelope and refreshes the
    /// device snapshot.
    async fn post_setting(&mut self, device_id: &str, payload: &serde_json::Value) -> Result<()> {
        if !self.select_device(device_id).await? {
            return Ok(());
        }
        self.call(RequestKind::PostSetting, Payload::json(payload))
            .await?;
        self.update_device(device_id).await
    }
}
