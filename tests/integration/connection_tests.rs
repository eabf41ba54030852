//! Connection retry behaviour seen through the cloud poll timer.

use glucolink::app::events::AppEvent;
use glucolink::cloud::connection::{ConnectionState, ConnectionStatus, DisconnectReason};
use glucolink::signals::ShutdownFlag;

use super::mock_hw::{MockHub, TestApp, run_until, secs, started_app, test_config};

const BAD: ConnectionStatus = ConnectionStatus::Unauthenticated(DisconnectReason::BadCredential);

fn backoff_periods(app: &TestApp) -> Vec<u32> {
    app.sink()
        .events
        .iter()
        .filter_map(|e| match e {
            AppEvent::BackoffApplied { period_secs, .. } => Some(*period_secs),
            _ => None,
        })
        .collect()
}

fn cloud_period(app: &TestApp) -> u64 {
    app.scheduler()
        .period(app.cloud_timer().unwrap())
        .unwrap()
        .as_secs()
}

#[test]
fn failures_back_off_exponentially_to_the_cap() {
    let flag = ShutdownFlag::new();
    let mut app = started_app(test_config(), MockHub::failing(100, BAD));

    // Attempts at 1, 61, 181, 421, 901, 1501 s.
    run_until(&mut app, &flag, secs(1501));
    assert_eq!(backoff_periods(&app), [60, 120, 240, 480, 600, 600]);
    assert_eq!(app.connection().failures(), 6);
    assert_eq!(cloud_period(&app), 600);
    assert_eq!(app.transport().connects, 6);
    assert_eq!(app.connection_state(), ConnectionState::NotAuthenticated);
}

#[test]
fn success_after_failures_restores_default_period() {
    let flag = ShutdownFlag::new();
    let mut app = started_app(test_config(), MockHub::failing(2, BAD));

    // Failures at 1 s and 61 s, success at 181 s.
    run_until(&mut app, &flag, secs(181));
    assert_eq!(app.connection_state(), ConnectionState::Authenticated);
    assert_eq!(app.connection().failures(), 0);
    assert_eq!(cloud_period(&app), 1);
    assert_eq!(app.scheduler().deadline(app.cloud_timer().unwrap()), Some(secs(182)));
}

#[test]
fn only_one_attempt_in_flight() {
    let flag = ShutdownFlag::new();
    let mut app = started_app(test_config(), MockHub::silent());

    run_until(&mut app, &flag, secs(30));
    assert_eq!(app.transport().connects, 1);
    assert_eq!(
        app.connection_state(),
        ConnectionState::AuthenticationInitiated
    );
    assert!(app.transport().work_passes >= 29, "client keeps being pumped");
}

#[test]
fn unreachable_network_never_attempts() {
    let flag = ShutdownFlag::new();
    let mut app = started_app(test_config(), MockHub::new());
    app.hardware_mut().network_up = false;

    run_until(&mut app, &flag, secs(10));
    assert_eq!(app.transport().connects, 0);
    assert_eq!(cloud_period(&app), 1);
    assert!(backoff_periods(&app).is_empty());
}

#[test]
fn refused_setup_counts_as_failure() {
    let flag = ShutdownFlag::new();
    let mut app = started_app(test_config(), MockHub::refusing());

    run_until(&mut app, &flag, secs(61));
    assert_eq!(backoff_periods(&app), [60, 120]);
    assert_eq!(app.connection_state(), ConnectionState::NotAuthenticated);
    assert_eq!(app.transport().teardowns, 2);
}

#[test]
fn expiry_while_authenticated_reconnects_after_backoff() {
    let flag = ShutdownFlag::new();
    let mut app = started_app(test_config(), MockHub::new());
    run_until(&mut app, &flag, secs(1));

    app.transport_mut().inject(glucolink::app::commands::HubEvent::ConnectionStatus(
        ConnectionStatus::Unauthenticated(DisconnectReason::ExpiredSasToken),
    ));
    run_until(&mut app, &flag, secs(2));
    assert_eq!(app.connection_state(), ConnectionState::NotAuthenticated);
    assert_eq!(cloud_period(&app), 60);
    assert!(!app.transport().has_client());

    run_until(&mut app, &flag, secs(62));
    assert_eq!(app.connection_state(), ConnectionState::Authenticated);
    assert_eq!(app.transport().connects, 2);
    assert_eq!(cloud_period(&app), 1);
}
