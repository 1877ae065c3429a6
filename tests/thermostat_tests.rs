use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde_json::{json, Value};
use terneo_ax::{
    HvacAction, HvacMode, Notification, ParamValue, Preset, TerneoClient, Thermostat,
    ThermostatConfig,
};
use wiremock::matchers::{body_json, body_partial_json, method, path};
use wiremock::{Mock, MockBuilder, MockServer, ResponseTemplate};

const SERIAL: &str = "00110022003300AB";

fn params_reply(power_off: &str, mode: &str) -> Value {
    json!({
        "sn": SERIAL,
        "par": [
            [0, 6, "0"],
            [1, 6, "0"],
            [2, 2, mode],
            [5, 1, "24"],
            [7, 1, "12"],
            [26, 1, "35"],
            [27, 1, "5"],
            [125, 7, power_off]
        ]
    })
}

fn telemetry_reply(lock_type: u8, load: u8) -> Value {
    json!({
        "sn": SERIAL,
        "t.1": "360",
        "f.0": load.to_string(),
        "m.3": lock_type.to_string()
    })
}

fn fetch(cmd: u8) -> MockBuilder {
    Mock::given(method("POST"))
        .and(path("/api.cgi"))
        .and(body_partial_json(json!({ "cmd": cmd })))
}

async fn thermostat(server: &MockServer, params: Value, telemetry: Value) -> Thermostat {
    fetch(1)
        .respond_with(ResponseTemplate::new(200).set_body_json(params))
        .mount(server)
        .await;
    fetch(4)
        .respond_with(ResponseTemplate::new(200).set_body_json(telemetry))
        .mount(server)
        .await;

    let addr = server.address();
    let client = TerneoClient::builder(format!("{}:{}", addr.ip(), addr.port()))
        .refresh_interval(Duration::ZERO)
        .build()
        .unwrap();
    Thermostat::new(client)
}

#[tokio::test]
async fn update_exposes_climate_properties() {
    let server = MockServer::start().await;
    let mut t = thermostat(&server, params_reply("0", "1"), telemetry_reply(0, 1)).await;
    t.update().await.unwrap();

    assert_eq!(t.name(), "300AB");
    assert_eq!(t.hvac_mode(), HvacMode::Heat);
    assert_eq!(t.hvac_action(), HvacAction::Heating);
    assert_eq!(t.current_temperature(), Some(22.5));
    assert_eq!(t.target_temperature(), Some(24.0));
    assert_eq!(t.min_temp(), Some(5.0));
    assert_eq!(t.max_temp(), Some(35.0));
    assert_eq!(t.preset_mode(), Preset::Home);
    assert_eq!(t.extra_state_attributes()["hvac_mode"], "heating");
}

#[tokio::test]
async fn schedule_mode_reports_off_without_target() {
    let server = MockServer::start().await;
    let mut t = thermostat(&server, params_reply("0", "0"), telemetry_reply(0, 0)).await;
    t.update().await.unwrap();

    assert_eq!(t.client().operating_mode(), terneo_ax::OperatingMode::Schedule);
    assert_eq!(t.hvac_mode(), HvacMode::Off);
    assert_eq!(t.hvac_action(), HvacAction::Idle);
    assert_eq!(t.target_temperature(), None);
}

#[tokio::test]
async fn remote_lock_notification_fires_once() {
    let server = MockServer::start().await;
    let seen: Arc<Mutex<Vec<Notification>>> = Arc::new(Mutex::new(vec![]));
    let seen_clone = seen.clone();

    let mut t = thermostat(&server, params_reply("0", "1"), telemetry_reply(2, 0))
        .await
        .on_notification(move |n| seen_clone.lock().unwrap().push(n.clone()));

    t.update().await.unwrap();
    t.update().await.unwrap();

    let seen = seen.lock().unwrap();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].title, "TerneoAX");
    assert_eq!(seen[0].notification_id.as_deref(), Some(SERIAL));
    assert!(seen[0].message.contains(SERIAL));
    assert!(seen[0].message.contains("300AB"));
}

#[tokio::test]
async fn no_notification_while_remote_control_enabled() {
    let server = MockServer::start().await;
    let count = Arc::new(Mutex::new(0));
    let count_clone = count.clone();

    let mut t = thermostat(&server, params_reply("0", "1"), telemetry_reply(1, 0))
        .await
        .on_notification(move |_| *count_clone.lock().unwrap() += 1);

    t.update().await.unwrap();
    assert_eq!(*count.lock().unwrap(), 0);
}

#[tokio::test]
async fn set_hvac_mode_off_is_pushed_on_next_update() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api.cgi"))
        .and(body_json(json!({ "sn": SERIAL, "par": [[125, 7, "1"]] })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&server)
        .await;

    let mut t = thermostat(&server, params_reply("0", "1"), telemetry_reply(0, 0)).await;
    t.update().await.unwrap();

    t.set_hvac_mode(HvacMode::Off).unwrap();
    assert_eq!(t.hvac_mode(), HvacMode::Off);
    t.update().await.unwrap();
}

#[tokio::test]
async fn set_temperature_truncates_and_targets_manual_setpoint() {
    let server = MockServer::start().await;
    let mut t = thermostat(&server, params_reply("0", "1"), telemetry_reply(0, 0)).await;
    t.update().await.unwrap();

    t.set_temperature(26.7, None).unwrap();
    assert_eq!(
        t.client().parameter("manualFloorTemperature"),
        Some(&ParamValue::Int(26))
    );
    assert_eq!(t.target_temperature(), Some(26.0));
}

#[tokio::test]
async fn set_temperature_with_heat_switches_mode_first() {
    let server = MockServer::start().await;
    let mut t = thermostat(&server, params_reply("1", "1"), telemetry_reply(0, 0)).await;
    t.update().await.unwrap();
    assert_eq!(t.hvac_mode(), HvacMode::Off);

    t.set_temperature(21.0, Some(HvacMode::Heat)).unwrap();
    assert_eq!(t.hvac_mode(), HvacMode::Heat);
    assert_eq!(t.target_temperature(), Some(21.0));
}

#[tokio::test]
async fn set_temperature_while_off_is_rejected() {
    let server = MockServer::start().await;
    let mut t = thermostat(&server, params_reply("1", "1"), telemetry_reply(0, 0)).await;
    t.update().await.unwrap();

    let err = t.set_temperature(21.0, None).unwrap_err();
    assert!(matches!(err, terneo_ax::Error::InvalidMode(_)));
    assert_eq!(t.client().pending_parameters().count(), 0);
}

#[tokio::test]
async fn away_preset_switches_setpoint() {
    let server = MockServer::start().await;
    let mut t = thermostat(&server, params_reply("0", "1"), telemetry_reply(0, 0)).await;
    t.update().await.unwrap();

    t.set_preset_mode(Preset::Away).unwrap();
    assert_eq!(t.preset_mode(), Preset::Away);
    assert_eq!(t.target_temperature(), Some(12.0));

    t.set_temperature(10.0, None).unwrap();
    assert_eq!(
        t.client().parameter("awayFloorTemperature"),
        Some(&ParamValue::Int(10))
    );

    t.set_preset_mode(Preset::Home).unwrap();
    assert_eq!(t.preset_mode(), Preset::Home);
    assert_eq!(
        t.client().parameter("endAwayTime"),
        Some(&ParamValue::Int(536_112_000))
    );
}

#[tokio::test]
async fn telemetry_failure_still_reported_after_params() {
    let server = MockServer::start().await;
    fetch(1)
        .respond_with(ResponseTemplate::new(200).set_body_json(params_reply("0", "1")))
        .mount(&server)
        .await;
    fetch(4)
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;

    let addr = server.address();
    let config = ThermostatConfig::new(format!("{}:{}", addr.ip(), addr.port()));
    let mut t = Thermostat::from_config(&config).unwrap();

    let err = t.update().await.unwrap_err();
    assert!(matches!(err, terneo_ax::Error::Status(500)));
    assert_eq!(t.hvac_mode(), HvacMode::Heat);
    assert_eq!(t.current_temperature(), None);
}
