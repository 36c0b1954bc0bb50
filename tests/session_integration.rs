// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Integration tests for the session layer using wiremock.

use std::time::Duration;

use serde_json::json;
use thermoconnect::types::AuxOutput;
use thermoconnect::{
    CallOutcome, Error, Payload, RequestKind, Session, SessionConfig, TemperatureUnit,
};
use wiremock::matchers::{body_json, body_string, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn session_for(server: &MockServer) -> Session {
    let config = SessionConfig::new()
        .with_base_url(format!("{}/webapi", server.uri()))
        .with_timeout(Duration::from_secs(5));
    Session::with_config(config, "user@example.com", "secret").unwrap()
}

/// A session whose queued retries are due immediately.
fn immediate_retry_session(server: &MockServer) -> Session {
    let config = SessionConfig::new()
        .with_base_url(format!("{}/webapi", server.uri()))
        .with_timeout(Duration::from_secs(5))
        .with_retry_delay(Duration::ZERO);
    Session::with_config(config, "user@example.com", "secret").unwrap()
}

fn overview_json() -> serde_json::Value {
    json!({
        "id": "A1B2C3",
        "alias": "Camper",
        "subscription": {"expiration": 1_767_225_600},
        "devices": [{"id": "A1B2C3", "alias": "Camper"}]
    })
}

fn settings_json() -> serde_json::Value {
    json!({
        "hw_version": "2.1",
        "sw_version": "5.0.3",
        "sw_variant": "marine",
        "settings_tab": [
            {"group": "general", "options": [
                {"key": "allow_GPS", "value": true},
                {"key": "low_voltage_cutoff", "value": 11.8},
                {"key": "ext_temp_comp", "value": -1.5}
            ]},
            {"group": "webasto", "options": [
                {"key": "OUTH", "timeout": 3600},
                {"key": "OUTV", "timeout": 1800}
            ]},
            {"group": "outputs", "options": [
                {"key": "OUT1", "timeout": 600},
                {"key": "OUT2", "timeout": 900}
            ]}
        ]
    })
}

fn telemetry_json() -> serde_json::Value {
    json!({
        "temperature": "21C",
        "voltage": "12.6V",
        "location": {"state": "OFF"},
        "outputs": [
            {"line": "OUTH", "state": "OFF", "name": "", "icon": "car_heat"},
            {"line": "OUT1", "state": "ON", "name": "Lamp", "icon": "plug"},
            {"line": "OUT2", "state": "OFF", "name": "", "icon": "plug"}
        ]
    })
}

async fn mount_login(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/webapi/login"))
        .respond_with(
            ResponseTemplate::new(200).insert_header("Set-Cookie", "hssess=abc123; Path=/"),
        )
        .mount(server)
        .await;
}

/// Mounts the read/select endpoints for the single-device fleet above.
async fn mount_fleet(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/webapi/change_device"))
        .respond_with(ResponseTemplate::new(200))
        .mount(server)
        .await;
    Mock::given(method("POST"))
        .and(path("/webapi/get_settings"))
        .respond_with(ResponseTemplate::new(200).set_body_json(settings_json()))
        .mount(server)
        .await;
    Mock::given(method("POST"))
        .and(path("/webapi/get_data"))
        .respond_with(ResponseTemplate::new(200).set_body_json(telemetry_json()))
        .mount(server)
        .await;
    Mock::given(method("POST"))
        .and(path("/webapi/get_data_nopoll"))
        .respond_with(ResponseTemplate::new(200).set_body_json(overview_json()))
        .mount(server)
        .await;
}

async fn connected_session(server: &MockServer) -> Session {
    mount_login(server).await;
    mount_fleet(server).await;
    let mut session = session_for(server);
    session.connect().await.unwrap();
    session
}

// ============================================================================
// Authentication
// ============================================================================

mod authentication {
    use super::*;

    #[tokio::test]
    async fn connect_logs_in_and_discovers_devices() {
        let server = MockServer::start().await;
        let session = connected_session(&server).await;

        assert!(session.is_authorized());
        assert_eq!(
            session.list_devices(),
            vec![("A1B2C3".to_string(), "Camper".to_string())]
        );

        let device = session.device("A1B2C3").unwrap();
        assert_eq!(device.temperature(), 21);
        assert_eq!(device.temperature_unit(), TemperatureUnit::Celsius);
        assert!((device.voltage() - 12.6).abs() < f64::EPSILON);
        assert_eq!(device.hardware_version(), "2.1");
        assert_eq!(device.output_main_name().unwrap(), "Primary");
        assert_eq!(device.output_aux1_name().unwrap(), "Lamp");
        assert_eq!(device.timeout_heat().as_secs(), 3600);
        assert_eq!(
            device.subscription_expiration().unwrap().timestamp(),
            1_767_225_600
        );
    }

    #[tokio::test]
    async fn rejected_credentials_raise_unauthorized() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/webapi/login"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let mut session = session_for(&server);
        let err = session.connect().await.unwrap_err();
        assert!(matches!(err, Error::Unauthorized));
        assert!(!session.is_authorized());
        assert_eq!(session.devices().count(), 0);
    }

    #[tokio::test]
    async fn session_cookie_is_sent_after_login() {
        let server = MockServer::start().await;
        mount_login(&server).await;
        Mock::given(method("POST"))
            .and(path("/webapi/get_data_nopoll"))
            .and(header("Cookie", "hssess=abc123;"))
            .respond_with(ResponseTemplate::new(200).set_body_json(overview_json()))
            .expect(1..)
            .mount(&server)
            .await;
        mount_fleet(&server).await;

        let mut session = session_for(&server);
        session.connect().await.unwrap();
    }

    #[tokio::test]
    async fn webclient_cookie_variant_is_preferred() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/webapi/login"))
            .respond_with(
                ResponseTemplate::new(200)
                    .append_header("Set-Cookie", "hssess=plain1; Path=/")
                    .append_header("Set-Cookie", "hssess-webclient=web1; Path=/"),
            )
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/webapi/get_data_nopoll"))
            .and(header("Cookie", "hssess-webclient=web1;"))
            .respond_with(ResponseTemplate::new(200).set_body_json(overview_json()))
            .expect(1..)
            .mount(&server)
            .await;
        mount_fleet(&server).await;

        let mut session = session_for(&server);
        session.connect().await.unwrap();
    }

    #[tokio::test]
    async fn login_without_cookie_fails() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/webapi/login"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let mut session = session_for(&server);
        let err = session.connect().await.unwrap_err();
        assert!(matches!(err, Error::Protocol(_)));
    }
}

// ============================================================================
// Call semantics: 401 / 403 / other
// ============================================================================

mod call_semantics {
    use super::*;

    #[tokio::test]
    async fn unauthorized_is_raised_and_registry_untouched() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/webapi/get_data"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let mut session = session_for(&server);
        let err = session
            .call(RequestKind::GetData, Payload::Empty)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Unauthorized));
        assert!(!session.is_authorized());
        assert_eq!(session.devices().count(), 0);
        assert!(session.pending_retries().is_empty());
    }

    #[tokio::test]
    async fn forbidden_queues_exactly_one_identical_retry() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/webapi/command"))
            .respond_with(ResponseTemplate::new(403))
            .mount(&server)
            .await;

        let mut session = session_for(&server);
        let outcome = session
            .call(RequestKind::Command, Payload::Text("OUT H ON"))
            .await
            .unwrap();
        assert!(matches!(
            outcome,
            CallOutcome::Forbidden { retry_after } if retry_after == Duration::from_secs(30)
        ));

        let pending = session.pending_retries();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].kind(), RequestKind::Command);
        assert_eq!(*pending[0].payload(), Payload::Text("OUT H ON"));
    }

    #[tokio::test]
    async fn cancel_drops_queued_retries() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/webapi/command"))
            .respond_with(ResponseTemplate::new(403))
            .mount(&server)
            .await;

        let mut session = session_for(&server);
        session
            .call(RequestKind::Command, Payload::Text("OUT 1 ON"))
            .await
            .unwrap();
        assert_eq!(session.pending_retries().len(), 1);
        assert!(session.next_retry_deadline().is_some());

        session.cancel_retries();
        assert!(session.pending_retries().is_empty());
        assert!(session.next_retry_deadline().is_none());
    }

    #[tokio::test]
    async fn no_due_retries_replays_nothing() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/webapi/command"))
            .respond_with(ResponseTemplate::new(403))
            .mount(&server)
            .await;

        let mut session = session_for(&server);
        session
            .call(RequestKind::Command, Payload::Text("OUT H ON"))
            .await
            .unwrap();

        // Deadline is 30 seconds out; nothing is due yet.
        let replayed = session.run_due_retries().await.unwrap();
        assert_eq!(replayed, 0);
        assert_eq!(session.pending_retries().len(), 1);
    }

    #[tokio::test]
    async fn due_retry_replays_the_identical_call() {
        let server = MockServer::start().await;
        // First command call is forbidden; the replay must carry the same
        // literal body and succeed.
        Mock::given(method("POST"))
            .and(path("/webapi/command"))
            .respond_with(ResponseTemplate::new(403))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/webapi/command"))
            .and(body_string("OUT H ON"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let mut session = immediate_retry_session(&server);
        let outcome = session
            .call(RequestKind::Command, Payload::Text("OUT H ON"))
            .await
            .unwrap();
        assert!(matches!(outcome, CallOutcome::Forbidden { .. }));
        assert_eq!(session.pending_retries().len(), 1);

        let replayed = session.run_due_retries().await.unwrap();
        assert_eq!(replayed, 1);
        assert!(session.pending_retries().is_empty());
    }

    #[tokio::test]
    async fn replay_hitting_forbidden_again_requeues() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/webapi/command"))
            .respond_with(ResponseTemplate::new(403))
            .mount(&server)
            .await;

        let mut session = immediate_retry_session(&server);
        session
            .call(RequestKind::Command, Payload::Text("OUT 1 ON"))
            .await
            .unwrap();
        assert_eq!(session.pending_retries().len(), 1);

        let replayed = session.run_due_retries().await.unwrap();
        assert_eq!(replayed, 1);

        // Forbidden again, so the call is back in the queue.
        let pending = session.pending_retries();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].kind(), RequestKind::Command);
        assert_eq!(*pending[0].payload(), Payload::Text("OUT 1 ON"));
    }

    #[tokio::test]
    async fn failed_replay_keeps_remaining_due_entries() {
        let server = MockServer::start().await;
        // Both calls are forbidden once; the command replay then fails hard.
        Mock::given(method("POST"))
            .and(path("/webapi/command"))
            .respond_with(ResponseTemplate::new(403))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/webapi/command"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/webapi/get_settings"))
            .respond_with(ResponseTemplate::new(403))
            .up_to_n_times(1)
            .mount(&server)
            .await;

        let mut session = immediate_retry_session(&server);
        session
            .call(RequestKind::Command, Payload::Text("OUT H ON"))
            .await
            .unwrap();
        session
            .call(RequestKind::GetSettings, Payload::Empty)
            .await
            .unwrap();
        assert_eq!(session.pending_retries().len(), 2);

        let err = session.run_due_retries().await.unwrap_err();
        assert!(matches!(err, Error::InvalidRequest { status: 500, .. }));

        // The settings replay never fired; it stays queued for the next tick.
        let pending = session.pending_retries();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].kind(), RequestKind::GetSettings);
    }

    #[tokio::test]
    async fn other_status_is_an_invalid_request() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/webapi/get_settings"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&server)
            .await;

        let mut session = session_for(&server);
        let err = session
            .call(RequestKind::GetSettings, Payload::Empty)
            .await
            .unwrap_err();
        match err {
            Error::InvalidRequest { status, body } => {
                assert_eq!(status, 500);
                assert_eq!(body, "boom");
            }
            other => panic!("expected InvalidRequest, got {other:?}"),
        }
    }
}

// ============================================================================
// Discovery & update
// ============================================================================

mod update {
    use super::*;

    #[tokio::test]
    async fn update_before_connect_fails() {
        let server = MockServer::start().await;
        let mut session = session_for(&server);
        let err = session.update().await.unwrap_err();
        assert!(matches!(err, Error::NotConnected));
    }

    #[tokio::test]
    async fn update_unknown_device_is_a_precondition_violation() {
        let server = MockServer::start().await;
        let mut session = connected_session(&server).await;

        let err = session.update_device("NOPE").await.unwrap_err();
        assert!(matches!(err, Error::DeviceNotFound(id) if id == "NOPE"));
    }

    #[tokio::test]
    async fn multi_device_accounts_refresh_every_device() {
        let server = MockServer::start().await;
        mount_login(&server).await;
        Mock::given(method("POST"))
            .and(path("/webapi/change_device"))
            .respond_with(ResponseTemplate::new(200))
            .expect(2..)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/webapi/get_settings"))
            .respond_with(ResponseTemplate::new(200).set_body_json(settings_json()))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/webapi/get_data"))
            .respond_with(ResponseTemplate::new(200).set_body_json(telemetry_json()))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/webapi/get_data_nopoll"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "A1B2C3",
                "alias": "Camper",
                "subscription": {"expiration": 1_767_225_600},
                "devices": [
                    {"id": "A1B2C3", "alias": "Camper"},
                    {"id": "D4E5F6", "alias": "Boat"}
                ]
            })))
            .mount(&server)
            .await;

        let mut session = session_for(&server);
        session.connect().await.unwrap();

        assert_eq!(session.devices().count(), 2);
        assert_eq!(
            session.list_devices(),
            vec![
                ("A1B2C3".to_string(), "Camper".to_string()),
                ("D4E5F6".to_string(), "Boat".to_string()),
            ]
        );
        assert!(session.device("D4E5F6").is_some());
    }
}

// ============================================================================
// Output commands
// ============================================================================

mod commands {
    use super::*;

    #[tokio::test]
    async fn main_output_on_sends_heater_literal() {
        let server = MockServer::start().await;
        let mut session = connected_session(&server).await;

        // The fleet's main channel reports OUTH, so heater commands are sent.
        Mock::given(method("POST"))
            .and(path("/webapi/command"))
            .and(body_string("OUT H ON"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        session.set_output_main("A1B2C3", true).await.unwrap();
    }

    #[tokio::test]
    async fn main_output_follows_ventilation_mode() {
        let server = MockServer::start().await;
        mount_login(&server).await;
        Mock::given(method("POST"))
            .and(path("/webapi/change_device"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/webapi/get_settings"))
            .respond_with(ResponseTemplate::new(200).set_body_json(settings_json()))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/webapi/get_data"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "temperature": "70F",
                "voltage": "12.1V",
                "location": {"state": "OFF"},
                "outputs": [
                    {"line": "OUTV", "state": "OFF", "name": "Fan", "icon": "car_vent"}
                ]
            })))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/webapi/get_data_nopoll"))
            .respond_with(ResponseTemplate::new(200).set_body_json(overview_json()))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/webapi/command"))
            .and(body_string("OUT V OFF"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let mut session = session_for(&server);
        session.connect().await.unwrap();
        assert!(session.device("A1B2C3").unwrap().is_ventilation());

        session.set_output_main("A1B2C3", false).await.unwrap();
    }

    #[tokio::test]
    async fn aux_outputs_send_numbered_literals() {
        let server = MockServer::start().await;
        let mut session = connected_session(&server).await;

        Mock::given(method("POST"))
            .and(path("/webapi/command"))
            .and(body_string("OUT 1 OFF"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/webapi/command"))
            .and(body_string("OUT 2 ON"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        session.set_output_aux1("A1B2C3", false).await.unwrap();
        session.set_output_aux2("A1B2C3", true).await.unwrap();
    }

    #[tokio::test]
    async fn commands_for_unknown_devices_fail() {
        let server = MockServer::start().await;
        let mut session = connected_session(&server).await;

        let err = session.set_output_main("NOPE", true).await.unwrap_err();
        assert!(matches!(err, Error::DeviceNotFound(_)));
    }
}

// ============================================================================
// Settings updates
// ============================================================================

mod settings_updates {
    use super::*;

    #[tokio::test]
    async fn low_voltage_cutoff_posts_the_envelope() {
        let server = MockServer::start().await;
        let mut session = connected_session(&server).await;

        Mock::given(method("POST"))
            .and(path("/webapi/post_setting"))
            .and(body_json(json!({
                "device_settings": {"low_voltage_cutoff": 11.5},
                "service_settings": {},
                "location_events": null,
                "air_heater": {}
            })))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        session
            .set_low_voltage_cutoff("A1B2C3", 11.5)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn aux_timeout_encodes_hours_and_minutes() {
        let server = MockServer::start().await;
        let mut session = connected_session(&server).await;

        // 5400 s = 1 h 30 min; channel name and icon come from telemetry.
        Mock::given(method("POST"))
            .and(path("/webapi/post_setting"))
            .and(body_json(json!({
                "device_settings": {
                    "OUT1_function": "enabled",
                    "OUT1_timeout_on": true,
                    "OUT1_timeout_h": 1,
                    "OUT1_timeout_min": 30
                },
                "service_settings": {
                    "OUT1_on": true,
                    "OUT1_name": "Lamp",
                    "OUT1_icon": "plug"
                },
                "location_events": null,
                "air_heater": {}
            })))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        session
            .set_aux_timeout("A1B2C3", AuxOutput::Aux1, 5400)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn main_timeout_wraps_at_24_hours() {
        let server = MockServer::start().await;
        let mut session = connected_session(&server).await;

        // 25 h wraps to 1 h: the vendor encoding's time-of-day truncation.
        // The ventilation timeout stays at the device's 1800 s.
        Mock::given(method("POST"))
            .and(path("/webapi/post_setting"))
            .and(body_json(json!({
                "device_settings": {
                    "webasto_emul_mode": "thermoconnect",
                    "OUTV_timeout_on": true,
                    "OUTV_timeout_h": 0,
                    "OUTV_timeout_min": 30,
                    "OUTH_timeout_on": true,
                    "OUTH_timeout_h": 1,
                    "OUTH_timeout_min": 0
                },
                "service_settings": {
                    "OUTH_on": true,
                    "OUTV_on": false,
                    "heater_mode": 0,
                    "OUTV_name": "Ventilation",
                    "OUTV_icon": "car_vent",
                    "OUTH_name": "Heater",
                    "OUTH_icon": "car_heat"
                },
                "location_events": null,
                "air_heater": {}
            })))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        session
            .set_main_timeout("A1B2C3", Some(25 * 3600), None)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn ventilation_mode_flips_the_main_channel() {
        let server = MockServer::start().await;
        let mut session = connected_session(&server).await;

        Mock::given(method("POST"))
            .and(path("/webapi/post_setting"))
            .and(body_json(json!({
                "device_settings": {
                    "webasto_emul_mode": "thermoconnect",
                    "OUTV_timeout_on": true,
                    "OUTV_timeout_h": 0,
                    "OUTV_timeout_min": 30,
                    "OUTH_timeout_on": true,
                    "OUTH_timeout_h": 1,
                    "OUTH_timeout_min": 0
                },
                "service_settings": {
                    "OUTH_on": false,
                    "OUTV_on": true,
                    "heater_mode": 1,
                    "OUTV_name": "Ventilation",
                    "OUTV_icon": "car_vent",
                    "OUTH_name": "Heater",
                    "OUTH_icon": "car_heat"
                },
                "location_events": null,
                "air_heater": {}
            })))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        session
            .set_ventilation_mode("A1B2C3", true)
            .await
            .unwrap();
    }
}
