#![allow(clippy::unwrap_used)]
// End-to-end setup and adapter tests against a wiremock controller.

use std::path::PathBuf;
use std::time::Duration;

use pretty_assertions::assert_eq;
use secrecy::SecretString;
use serde_json::json;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use unifiled_core::platform::{setup, setup_with_retry};
use unifiled_core::{
    ControllerConfig, CoreError, Entity, Light, RetryPolicy, Sensor, SetupError, TlsVerification,
};

const TOKEN: &str = "session-token";

fn config_for(uri: &str) -> ControllerConfig {
    let mut config = ControllerConfig::new(
        "placeholder",
        20443,
        "admin",
        SecretString::from("hunter2".to_owned()),
    )
    .unwrap();
    config.url = uri.parse().unwrap();
    config.timeout = Duration::from_secs(2);
    config
}

async fn mount_login(server: &MockServer, expected: u64) {
    Mock::given(method("POST"))
        .and(path("/v1/login"))
        .and(body_json(json!({ "username": "admin", "password": "hunter2" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "access_token": TOKEN })))
        .expect(expected)
        .mount(server)
        .await;
}

fn devices() -> serde_json::Value {
    json!([
        {
            "id": "dev-1",
            "name": "Hallway",
            "isOnline": true,
            "type": "LED",
            "status": { "output": true, "led": 80, "power": 1500 },
            "info": { "model": "ULED-INSTANT", "version": "1.4.8" }
        },
        { "name": "no id, skipped" }
    ])
}

async fn mount_devices(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/v1/devices"))
        .and(header("authorization", format!("Bearer {TOKEN}").as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(devices()))
        .mount(server)
        .await;
}

#[tokio::test]
async fn setup_builds_one_light_and_sensor_per_valid_device() {
    let server = MockServer::start().await;
    mount_login(&server, 1).await;
    mount_devices(&server).await;

    let platform = setup(&config_for(&server.uri())).await.unwrap();

    assert_eq!(platform.lights().len(), 1);
    assert_eq!(platform.sensors().len(), 1);

    let light = &platform.lights()[0];
    assert_eq!(light.name(), "Hallway");
    assert_eq!(light.unique_id().as_str(), "dev-1");
    assert!(light.is_on());
    assert_eq!(light.brightness(), 204);
    assert_eq!(light.device_info().model, "ULED-INSTANT");
    assert_eq!(light.device_info().sw_version, "1.4.8");

    let sensor = &platform.sensors()[0];
    assert!((sensor.state() - 1.5).abs() < f64::EPSILON);
    assert_eq!(sensor.unit_of_measurement(), "kW");
}

#[tokio::test]
async fn wrong_typed_record_does_not_hide_the_others() {
    let server = MockServer::start().await;
    mount_login(&server, 1).await;
    Mock::given(method("GET"))
        .and(path("/v1/devices"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {
                "id": "good",
                "isOnline": true,
                "status": { "output": true, "led": 80, "power": 250 }
            },
            { "id": "bad", "status": { "led": "high" } }
        ])))
        .mount(&server)
        .await;

    let mut platform = setup(&config_for(&server.uri())).await.unwrap();

    let ids: Vec<_> = platform.lights().iter().map(|l| l.unique_id().as_str()).collect();
    assert_eq!(ids, vec!["good"]);
    assert_eq!(platform.sensors().len(), 1);

    let light = &mut platform.lights_mut()[0];
    light.update().await.unwrap();
    assert!(light.available());
    assert_eq!(light.brightness(), 204);
}

#[tokio::test]
async fn rejected_credentials_are_not_ready() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/login"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let err = setup(&config_for(&server.uri())).await.err().unwrap();
    assert!(err.is_retryable());
    assert!(matches!(
        err,
        SetupError::NotReady(CoreError::AuthenticationFailed { .. })
    ));
}

#[tokio::test]
async fn unreachable_controller_is_not_ready() {
    // Nothing listens on port 1.
    let err = setup(&config_for("http://127.0.0.1:1")).await.err().unwrap();
    assert!(err.is_retryable());
}

#[tokio::test]
async fn unreadable_ca_certificate_is_invalid() {
    let mut config = config_for("https://127.0.0.1:20443");
    config.tls = TlsVerification::CustomCa(PathBuf::from("/nonexistent/unifiled-ca.pem"));

    let err = setup(&config).await.err().unwrap();
    assert!(!err.is_retryable());
}

#[tokio::test]
async fn light_commands_send_documented_bodies() {
    let server = MockServer::start().await;
    mount_login(&server, 1).await;
    mount_devices(&server).await;

    Mock::given(method("PUT"))
        .and(path("/v1/devices/dev-1"))
        .and(body_json(json!({ "command": "config-brightness", "value": "50" })))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/v1/devices/dev-1"))
        .and(body_json(json!({ "command": "config-output", "value": "1" })))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/v1/devices/dev-1"))
        .and(body_json(json!({ "command": "config-output", "value": "0" })))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let platform = setup(&config_for(&server.uri())).await.unwrap();
    let light = &platform.lights()[0];

    light.turn_on(Some(128)).await.unwrap();
    light.turn_off().await.unwrap();
}

#[tokio::test]
async fn expired_session_logs_in_again() {
    let server = MockServer::start().await;
    mount_login(&server, 2).await;

    Mock::given(method("GET"))
        .and(path("/v1/devices"))
        .respond_with(ResponseTemplate::new(401))
        .up_to_n_times(1)
        .with_priority(1)
        .mount(&server)
        .await;
    mount_devices(&server).await;

    let platform = setup(&config_for(&server.uri())).await.unwrap();
    assert_eq!(platform.lights().len(), 1);
}

#[tokio::test]
async fn light_update_failure_keeps_last_known_state() {
    let server = MockServer::start().await;
    mount_login(&server, 1).await;

    Mock::given(method("GET"))
        .and(path("/v1/devices"))
        .respond_with(ResponseTemplate::new(200).set_body_json(devices()))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/devices"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let mut platform = setup(&config_for(&server.uri())).await.unwrap();
    let light = &mut platform.lights_mut()[0];

    let err = light.update().await.unwrap_err();
    assert!(matches!(err, CoreError::Api { status: Some(503), .. }));
    assert!(!light.available());
    assert!(light.is_on());
    assert_eq!(light.brightness(), 204);
}

#[tokio::test]
async fn retry_gives_up_on_invalid_configuration() {
    let mut config = config_for("https://127.0.0.1:20443");
    config.tls = TlsVerification::CustomCa(PathBuf::from("/nonexistent/unifiled-ca.pem"));

    let err = setup_with_retry(&config, &RetryPolicy::default(), &CancellationToken::new())
        .await
        .err()
        .unwrap();
    assert!(matches!(err, SetupError::Invalid(CoreError::Config { .. })));
}
