//! Direct methods through the full loop: dispatch, response ownership and
//! the timed pump run.

use glucolink::app::events::AppEvent;
use glucolink::error::ExitCode;
use glucolink::signals::ShutdownFlag;

use super::mock_hw::{MockHub, TestApp, ms, run_until, secs, started_app, test_config};

/// App authenticated at t=1s; events injected now are handled at t=2s.
fn authenticated_app() -> (TestApp, ShutdownFlag) {
    let flag = ShutdownFlag::new();
    let mut app = started_app(test_config(), MockHub::new());
    run_until(&mut app, &flag, secs(1));
    assert!(app.connection().is_authenticated());
    (app, flag)
}

#[test]
fn trigger_alarm_answers_200() {
    let (mut app, flag) = authenticated_app();
    let id = app.transport_mut().invoke("TriggerAlarm", "");
    run_until(&mut app, &flag, secs(2));

    assert_eq!(
        app.transport().responses,
        [(id, 200, b"\"Alarm Triggered\"".to_vec())]
    );
    assert!(app.sink().events.contains(&AppEvent::AlarmTriggered));
}

#[test]
fn unknown_method_answers_minus_one() {
    let (mut app, flag) = authenticated_app();
    let id = app.transport_mut().invoke("SelfDestruct", "{}");
    run_until(&mut app, &flag, secs(2));
    assert_eq!(app.transport().responses, [(id, -1, b"{}".to_vec())]);
    assert!(app.hardware().pump_log.is_empty());
}

#[test]
fn inject_insulin_runs_pump_for_exact_duration() {
    let (mut app, flag) = authenticated_app();
    let id = app.transport_mut().invoke("InjectInsulin", "1500");
    run_until(&mut app, &flag, secs(2));

    assert_eq!(
        app.transport().responses,
        [(id, 100, b"\"Injecting insulin\"".to_vec())]
    );
    assert!(app.hardware().pump_active);
    assert_eq!(app.pending_actuation().map(|p| p.duration_ms), Some(1500));
    assert_eq!(app.scheduler().live_count(), 3);

    run_until(&mut app, &flag, secs(5));
    assert_eq!(
        app.hardware().pump_log,
        [(secs(2), true), (secs(2) + ms(1500), false)]
    );
    assert_eq!(app.pending_actuation(), None);
    assert_eq!(app.scheduler().live_count(), 2, "one-shot released");
    assert!(app.sink().events.contains(&AppEvent::PumpStopped));
}

#[test]
fn repeated_injection_extends_the_run() {
    let (mut app, flag) = authenticated_app();
    app.transport_mut().invoke("InjectInsulin", "1500");
    run_until(&mut app, &flag, secs(2));
    app.transport_mut().invoke("InjectInsulin", "\"1500\"");
    run_until(&mut app, &flag, secs(6));

    assert_eq!(
        app.hardware().pump_log,
        [(secs(2), true), (secs(3) + ms(1500), false)]
    );
    assert_eq!(app.hardware().pump_offs(), 1);
    assert_eq!(
        app.sink().count(|e| matches!(e, AppEvent::PumpStarted { .. })),
        2
    );
}

#[test]
fn invalid_dose_is_rejected() {
    let (mut app, flag) = authenticated_app();
    let id = app.transport_mut().invoke("InjectInsulin", "lots");
    let big = app.transport_mut().invoke("InjectInsulin", "600000");
    run_until(&mut app, &flag, secs(2));

    assert_eq!(
        app.transport().responses,
        [
            (id, 400, b"\"Invalid insulin dose\"".to_vec()),
            (big, 400, b"\"Invalid insulin dose\"".to_vec()),
        ]
    );
    assert!(app.hardware().pump_log.is_empty());
    assert_eq!(app.pending_actuation(), None);
}

#[test]
fn pump_failure_answers_500_and_leaves_nothing_pending() {
    let (mut app, flag) = authenticated_app();
    app.hardware_mut().fail_pump = true;
    let id = app.transport_mut().invoke("InjectInsulin", "1000");
    run_until(&mut app, &flag, secs(2));

    assert_eq!(
        app.transport().responses,
        [(id, 500, b"\"Pump unavailable\"".to_vec())]
    );
    assert_eq!(app.pending_actuation(), None);
    assert_eq!(app.scheduler().live_count(), 2);
    assert!(app.exit_code().is_success());
}

#[test]
fn pump_that_cannot_stop_is_fatal() {
    let (mut app, flag) = authenticated_app();
    app.transport_mut().invoke("InjectInsulin", "250");
    run_until(&mut app, &flag, secs(2));
    assert!(app.hardware().pump_active);

    app.hardware_mut().fail_pump = true;
    assert_eq!(app.run(&flag), ExitCode::PumpTimerSetPump);
    assert!(app.is_closed());
}

#[test]
fn shutoff_skips_a_pump_that_is_already_off() {
    let (mut app, flag) = authenticated_app();
    app.transport_mut().invoke("InjectInsulin", "1500");
    run_until(&mut app, &flag, secs(2));
    app.hardware_mut().pump_active = false;

    run_until(&mut app, &flag, secs(4));
    assert_eq!(app.hardware().pump_log, [(secs(2), true)]);
    assert_eq!(app.hardware().pump_offs(), 0);
    assert_eq!(app.pending_actuation(), None);
    assert!(app.sink().events.contains(&AppEvent::PumpStopped));
    assert!(app.exit_code().is_success());
}
