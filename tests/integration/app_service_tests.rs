//! AppService end to end: timers → connection → telemetry, button and
//! device twin, all on the simulated clock.

use glucolink::app::events::AppEvent;
use glucolink::cloud::connection::ConnectionState;
use glucolink::error::{ExitCode, TelemetryError};
use glucolink::scheduler::TimerSource;
use glucolink::signals::ShutdownFlag;

use super::mock_hw::{MockHub, ms, run_until, secs, started_app, test_config};

#[test]
fn start_arms_button_and_cloud_timers() {
    let app = started_app(test_config(), MockHub::new());
    assert_eq!(app.scheduler().live_count(), 2);
    assert_eq!(app.sink().events.first(), Some(&AppEvent::Started));
    assert_eq!(
        app.scheduler().period(app.cloud_timer().unwrap()),
        Some(secs(1))
    );
}

#[test]
fn first_cloud_tick_authenticates_and_reports_identity() {
    let flag = ShutdownFlag::new();
    let mut app = started_app(test_config(), MockHub::new());

    run_until(&mut app, &flag, secs(1));
    assert_eq!(app.connection_state(), ConnectionState::Authenticated);
    assert_eq!(app.transport().connects, 1);
    assert!(app.transport().telemetry.is_empty(), "no telemetry before auth");

    let identity = &app.transport().reported[0];
    for key in ["DeviceManufacturer", "DeviceModel", "SerialNumber", "FirmwareVersion"] {
        assert!(identity.contains(key), "{identity} lacks {key}");
    }

    let transitions: Vec<_> = app
        .sink()
        .events
        .iter()
        .filter_map(|e| match e {
            AppEvent::ConnectionChanged { to, .. } => Some(*to),
            _ => None,
        })
        .collect();
    assert_eq!(
        transitions,
        [
            ConnectionState::AuthenticationInitiated,
            ConnectionState::Authenticated
        ]
    );
}

#[test]
fn glucose_is_sent_every_tick_once_authenticated() {
    let flag = ShutdownFlag::new();
    let mut app = started_app(test_config(), MockHub::new());
    app.hardware_mut().glucose = 6.25;

    run_until(&mut app, &flag, secs(4));
    assert_eq!(app.transport().telemetry, vec!["{\"Glucose\":6.25}"; 3]);
    assert_eq!(app.telemetry().sent(), 3);
    assert_eq!(app.transport().violations, 0);
}

#[test]
fn telemetry_never_sent_while_unauthenticated() {
    use glucolink::cloud::connection::{ConnectionStatus, DisconnectReason};

    let flag = ShutdownFlag::new();
    let hub = MockHub::failing(
        usize::MAX >> 48,
        ConnectionStatus::Unauthenticated(DisconnectReason::DeviceDisabled),
    );
    let mut app = started_app(test_config(), hub);
    app.hardware_mut().button_pressed = true;

    run_until(&mut app, &flag, secs(30 * 60));
    assert!(app.transport().telemetry.is_empty());
    assert!(app.transport().connects > 1);
    assert_eq!(
        app.sink().count(|e| matches!(
            e,
            AppEvent::TelemetryDropped(TelemetryError::NotAuthenticated)
        )),
        1,
        "one press, one drop"
    );
}

#[test]
fn unreachable_network_keeps_state_and_drops_telemetry() {
    let flag = ShutdownFlag::new();
    let mut app = started_app(test_config(), MockHub::new());
    run_until(&mut app, &flag, secs(1));

    app.hardware_mut().network_up = false;
    run_until(&mut app, &flag, secs(3));
    assert_eq!(app.connection_state(), ConnectionState::Authenticated);
    assert!(app.transport().telemetry.is_empty());
    assert_eq!(
        app.sink().count(|e| matches!(
            e,
            AppEvent::TelemetryDropped(TelemetryError::NetworkUnavailable)
        )),
        2
    );
}

#[test]
fn button_press_edge_sends_one_message() {
    let flag = ShutdownFlag::new();
    let mut config = test_config();
    config.default_poll_period_secs = 60;
    let mut app = started_app(config, MockHub::new());
    run_until(&mut app, &flag, secs(60));
    assert!(app.connection().is_authenticated());

    app.hardware_mut().button_pressed = true;
    run_until(&mut app, &flag, secs(60) + ms(500));
    app.hardware_mut().button_pressed = false;
    run_until(&mut app, &flag, secs(61));
    app.hardware_mut().button_pressed = true;
    run_until(&mut app, &flag, secs(61) + ms(300));

    let presses = app
        .transport()
        .telemetry
        .iter()
        .filter(|t| *t == "{\"ButtonPress\":true}")
        .count();
    assert_eq!(presses, 2);
    assert_eq!(app.sink().count(|e| *e == AppEvent::ButtonPressed), 2);
}

#[test]
fn button_read_failure_is_fatal() {
    let flag = ShutdownFlag::new();
    let mut app = started_app(test_config(), MockHub::new());
    app.hardware_mut().fail_button = true;

    let code = app.run(&flag);
    assert_eq!(code, ExitCode::ButtonTimerGetButtonState);
    assert_eq!(app.scheduler().live_count(), 0);
}

#[test]
fn sensor_failure_is_fatal_once_authenticated() {
    let flag = ShutdownFlag::new();
    let mut app = started_app(test_config(), MockHub::new());
    app.hardware_mut().fail_sensor = true;

    run_until(&mut app, &flag, secs(1));
    assert!(app.exit_code().is_success(), "no reading before auth");
    assert_eq!(app.run(&flag), ExitCode::CloudTimerSensorPoll);
}

#[test]
fn desired_status_led_is_applied_and_reported() {
    let flag = ShutdownFlag::new();
    let mut app = started_app(test_config(), MockHub::new());
    run_until(&mut app, &flag, secs(1));

    app.transport_mut().desired(r#"{"StatusLED":true,"$version":2}"#);
    run_until(&mut app, &flag, secs(2));
    assert_eq!(app.hardware().led, Some(true));
    assert_eq!(app.transport().reported.last().unwrap(), r#"{"StatusLED":true}"#);
    assert!(app.sink().events.contains(&AppEvent::StatusLedChanged(true)));
}

#[test]
fn malformed_twin_update_is_ignored() {
    let flag = ShutdownFlag::new();
    let mut app = started_app(test_config(), MockHub::new());
    run_until(&mut app, &flag, secs(1));
    let reports = app.transport().reported.len();

    app.transport_mut().desired("{\"StatusLED\":");
    app.transport_mut().desired(r#"{"Unrelated":1}"#);
    run_until(&mut app, &flag, secs(2));
    assert_eq!(app.hardware().led, None);
    assert_eq!(app.transport().reported.len(), reports);
    assert!(app.exit_code().is_success());
}

#[test]
fn dispatch_table_covers_every_source() {
    // Button poll at 100ms, cloud poll at 1s: both sources dispatch without
    // tripping a consume error.
    let flag = ShutdownFlag::new();
    let mut app = started_app(test_config(), MockHub::new());
    run_until(&mut app, &flag, secs(5));
    assert!(app.exit_code().is_success());
    assert_eq!(TimerSource::COUNT, 3);
}
