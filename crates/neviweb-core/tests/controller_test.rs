#![allow(clippy::unwrap_used)]
// Integration tests for the polling controller against a wiremock backend.

use std::sync::Arc;
use std::time::Duration;

use pretty_assertions::assert_eq;
use secrecy::SecretString;
use serde_json::json;
use url::Url;
use wiremock::matchers::{body_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use neviweb_api::{
    ClientConfig, ErrorCode, Notifier, NotifyMode, OccupancyMode, RecordingNotifier,
    StatsPeriod, TransportConfig,
};
use neviweb_core::{
    ConnectionState, Controller, ControllerConfig, CoreError, DeviceKind, RefreshOutcome,
};

// ── Helpers ─────────────────────────────────────────────────────────

const THERMOSTAT_ID: u64 = 1;

fn thermostat_query() -> String {
    DeviceKind::Thermostat.attributes().join(",")
}

fn config(server: &MockServer) -> ControllerConfig {
    let mut client = ClientConfig::new("user@example.com", SecretString::from("hunter2".to_string()));
    client.notify = NotifyMode::Notification;
    let mut cfg = ControllerConfig::new(client);
    cfg.transport = TransportConfig::default()
        .with_base_url(Url::parse(&server.uri()).unwrap())
        .with_timeout(Duration::from_secs(5));
    cfg
}

fn controller(cfg: ControllerConfig) -> (Controller, Arc<RecordingNotifier>) {
    let notifier = Arc::new(RecordingNotifier::new());
    let ctrl = Controller::with_notifier(cfg, Arc::clone(&notifier) as Arc<dyn Notifier>).unwrap();
    (ctrl, notifier)
}

/// Login, one location, one thermostat with its signature.
async fn mount_account(server: &MockServer, expected_logins: u64) {
    Mock::given(method("POST"))
        .and(path("/api/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "session": "sess-1",
            "account": { "id": 555 }
        })))
        .expect(expected_logins)
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/locations"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!([{ "id": 10, "name": "Chalet" }])),
        )
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/devices"))
        .and(query_param("location$id", "10"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "id": THERMOSTAT_ID, "name": "Salon" }
        ])))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("/api/device/{THERMOSTAT_ID}/attribute")))
        .and(query_param("attributes", "signature"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "signature": { "model": 1123, "protocol": "sinope" }
        })))
        .mount(server)
        .await;
}

fn poll_mock() -> wiremock::MockBuilder {
    Mock::given(method("GET"))
        .and(path(format!("/api/device/{THERMOSTAT_ID}/attribute")))
        .and(query_param("attributes", thermostat_query()))
}

// ── Connect ─────────────────────────────────────────────────────────

#[tokio::test]
async fn test_connect_populates_store() {
    let server = MockServer::start().await;
    mount_account(&server, 1).await;
    let (ctrl, _) = controller(config(&server));

    ctrl.connect().await.unwrap();

    assert_eq!(*ctrl.connection_state().borrow(), ConnectionState::Connected);
    let snap = ctrl.store().device(THERMOSTAT_ID).unwrap();
    assert_eq!(snap.kind, DeviceKind::Thermostat);
    assert_eq!(snap.device.location_id, Some(10));
}

#[tokio::test]
async fn test_connect_rejected_login() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/login"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"error": {"code": "USRBADLOGIN"}})),
        )
        .mount(&server)
        .await;
    let (ctrl, notifier) = controller(config(&server));

    let result = ctrl.connect().await;

    assert!(matches!(result, Err(CoreError::LoginRejected)));
    assert_eq!(*ctrl.connection_state().borrow(), ConnectionState::Failed);
    assert_eq!(notifier.take().len(), 1);
}

// ── Refresh ─────────────────────────────────────────────────────────

#[tokio::test]
async fn test_refresh_stores_attributes() {
    let server = MockServer::start().await;
    mount_account(&server, 1).await;
    poll_mock()
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"roomTemperature": 21.5})),
        )
        .mount(&server)
        .await;
    let (ctrl, _) = controller(config(&server));
    ctrl.connect().await.unwrap();

    assert_eq!(
        ctrl.refresh_device(THERMOSTAT_ID).await.unwrap(),
        RefreshOutcome::Updated
    );
    assert_eq!(
        ctrl.refresh_device(THERMOSTAT_ID).await.unwrap(),
        RefreshOutcome::Unchanged
    );
    let snap = ctrl.store().device(THERMOSTAT_ID).unwrap();
    assert_eq!(snap.attributes["roomTemperature"], json!(21.5));
}

#[tokio::test]
async fn test_expired_session_reconnects_once_and_retries() {
    let server = MockServer::start().await;
    mount_account(&server, 2).await;
    poll_mock()
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"error": {"code": "USRSESSEXP"}})),
        )
        .up_to_n_times(1)
        .mount(&server)
        .await;
    poll_mock()
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"roomTemperature": 19.0})),
        )
        .mount(&server)
        .await;
    let (ctrl, _) = controller(config(&server));
    ctrl.connect().await.unwrap();

    let outcome = ctrl.refresh_device(THERMOSTAT_ID).await.unwrap();

    assert_eq!(outcome, RefreshOutcome::Updated);
    assert_eq!(*ctrl.connection_state().borrow(), ConnectionState::Connected);
    let snap = ctrl.store().device(THERMOSTAT_ID).unwrap();
    assert_eq!(snap.attributes["roomTemperature"], json!(19.0));
}

#[tokio::test]
async fn test_session_still_expired_after_reconnect_is_rejected() {
    let server = MockServer::start().await;
    mount_account(&server, 2).await;
    poll_mock()
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"error": {"code": "USRSESSEXP"}})),
        )
        .expect(2)
        .mount(&server)
        .await;
    let (ctrl, _) = controller(config(&server));
    ctrl.connect().await.unwrap();

    let outcome = ctrl.refresh_device(THERMOSTAT_ID).await.unwrap();

    assert_eq!(outcome, RefreshOutcome::Rejected(ErrorCode::SessionExpired));
}

#[tokio::test]
async fn test_unavailable_device_is_snoozed_then_resumes() {
    let server = MockServer::start().await;
    mount_account(&server, 1).await;
    poll_mock()
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"error": {"code": "DVCUNVLB"}})),
        )
        .up_to_n_times(1)
        .mount(&server)
        .await;
    poll_mock()
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"roomTemperature": 20.0})))
        .mount(&server)
        .await;
    let mut cfg = config(&server);
    cfg.snooze = Duration::from_millis(300);
    let (ctrl, notifier) = controller(cfg);
    ctrl.connect().await.unwrap();

    assert_eq!(
        ctrl.refresh_device(THERMOSTAT_ID).await.unwrap(),
        RefreshOutcome::Deactivated
    );
    let notes = notifier.take();
    assert_eq!(notes.len(), 1);
    assert!(notes[0].1.contains("Salon"));

    assert_eq!(
        ctrl.refresh_device(THERMOSTAT_ID).await.unwrap(),
        RefreshOutcome::Skipped
    );
    assert_eq!(ctrl.activity().inactive_ids(), vec![THERMOSTAT_ID]);

    tokio::time::sleep(Duration::from_millis(400)).await;
    assert_eq!(
        ctrl.refresh_device(THERMOSTAT_ID).await.unwrap(),
        RefreshOutcome::Updated
    );
}

#[tokio::test]
async fn test_gateway_timeout_keeps_previous_state() {
    let server = MockServer::start().await;
    mount_account(&server, 1).await;
    poll_mock()
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"roomTemperature": 22.0})))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    poll_mock()
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"errorCode": "ReadTimeout"})))
        .mount(&server)
        .await;
    let (ctrl, _) = controller(config(&server));
    ctrl.connect().await.unwrap();

    ctrl.refresh_device(THERMOSTAT_ID).await.unwrap();
    let outcome = ctrl.refresh_device(THERMOSTAT_ID).await.unwrap();

    assert_eq!(outcome, RefreshOutcome::ReadTimeout);
    let snap = ctrl.store().device(THERMOSTAT_ID).unwrap();
    assert_eq!(snap.attributes["roomTemperature"], json!(22.0));
}

#[tokio::test]
async fn test_unknown_device_is_an_error() {
    let server = MockServer::start().await;
    mount_account(&server, 1).await;
    let (ctrl, _) = controller(config(&server));
    ctrl.connect().await.unwrap();

    let err = ctrl.refresh_device(999).await.unwrap_err();
    assert!(matches!(err, CoreError::DeviceNotFound { device_id: 999 }));
}

// ── Poll cycle and energy ───────────────────────────────────────────

#[tokio::test]
async fn test_refresh_all_records_energy() {
    let server = MockServer::start().await;
    mount_account(&server, 1).await;
    poll_mock()
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"roomTemperature": 21.0})))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("/api/device/{THERMOSTAT_ID}/energy/hourly")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "history": [
                { "date": "2024-03-01T10:00:00Z", "energy": 400.0 },
                { "date": "2024-03-01T11:00:00Z", "energy": 250.0 }
            ]
        })))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let energy_file = dir.path().join("energy.json");
    let mut cfg = config(&server);
    cfg.energy_file = Some(energy_file.clone());
    let (ctrl, _) = controller(cfg);
    ctrl.connect().await.unwrap();
    let mut refreshed = ctrl.store().last_refresh();

    let summary = ctrl.refresh_all().await;

    assert_eq!(summary.updated, 1);
    assert_eq!(summary.failed, 0);
    assert_eq!(ctrl.energy_total_wh(THERMOSTAT_ID).await, Some(250.0));
    assert!(energy_file.exists());
    assert!(refreshed.has_changed().unwrap());
    assert!(refreshed.borrow_and_update().is_some());
}

fn hourly_stats_mock() -> wiremock::MockBuilder {
    Mock::given(method("GET")).and(path(format!("/api/device/{THERMOSTAT_ID}/energy/hourly")))
}

#[tokio::test]
async fn test_expired_session_on_stats_reconnects_once() {
    let server = MockServer::start().await;
    mount_account(&server, 2).await;
    poll_mock()
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"roomTemperature": 21.0})))
        .mount(&server)
        .await;
    hourly_stats_mock()
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"error": {"code": "USRSESSEXP"}})),
        )
        .up_to_n_times(1)
        .mount(&server)
        .await;
    hourly_stats_mock()
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "history": [{ "date": "2024-03-01T11:00:00Z", "energy": 180.0 }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let mut cfg = config(&server);
    cfg.energy_file = Some(dir.path().join("energy.json"));
    let (ctrl, _) = controller(cfg);
    ctrl.connect().await.unwrap();

    ctrl.refresh_all().await;

    assert_eq!(ctrl.energy_total_wh(THERMOSTAT_ID).await, Some(180.0));
    assert_eq!(*ctrl.connection_state().borrow(), ConnectionState::Connected);
}

#[tokio::test]
async fn test_device_stats_reports_vendor_error_instead_of_no_history() {
    let server = MockServer::start().await;
    mount_account(&server, 2).await;
    hourly_stats_mock()
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"error": {"code": "USRSESSEXP"}})),
        )
        .mount(&server)
        .await;
    let (ctrl, _) = controller(config(&server));
    ctrl.connect().await.unwrap();

    let err = ctrl
        .device_stats(THERMOSTAT_ID, StatsPeriod::Hourly)
        .await
        .unwrap_err();

    assert!(
        matches!(err, CoreError::Api { code: Some(ref code), .. } if code == "USRSESSEXP"),
        "unexpected error: {err:?}"
    );
}

#[tokio::test]
async fn test_start_stops_on_cancel() {
    let server = MockServer::start().await;
    mount_account(&server, 1).await;
    let mut cfg = config(&server);
    cfg.scan_interval = Duration::from_secs(3600);
    let (ctrl, _) = controller(cfg);
    ctrl.connect().await.unwrap();

    let cancel = tokio_util::sync::CancellationToken::new();
    let handle = ctrl.start(cancel.clone());
    cancel.cancel();

    tokio::time::timeout(Duration::from_secs(2), handle)
        .await
        .unwrap()
        .unwrap();
}

// ── Pass-through writes ─────────────────────────────────────────────

#[tokio::test]
async fn test_set_occupancy_mode_by_network_name() {
    let server = MockServer::start().await;
    mount_account(&server, 1).await;
    Mock::given(method("PUT"))
        .and(path("/api/location/10"))
        .and(body_json(json!({"mode": "away"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": true})))
        .expect(1)
        .mount(&server)
        .await;
    let (ctrl, _) = controller(config(&server));
    ctrl.connect().await.unwrap();

    ctrl.set_occupancy_mode("chalet", &OccupancyMode::Away)
        .await
        .unwrap();

    assert!(matches!(
        ctrl.set_occupancy_mode("Nowhere", &OccupancyMode::Home).await,
        Err(CoreError::NetworkNotFound { .. })
    ));
}
