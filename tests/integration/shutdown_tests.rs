//! Termination and teardown.

use glucolink::adapters::time::SimClock;
use glucolink::app::events::AppEvent;
use glucolink::app::service::AppService;
use glucolink::error::ExitCode;
use glucolink::signals::ShutdownFlag;

use super::mock_hw::{MockHub, MockHw, RecordingSink, run_until, secs, started_app, test_config};

#[test]
fn termination_request_exits_with_sigterm_code() {
    let flag = ShutdownFlag::new();
    let mut app = started_app(test_config(), MockHub::new());
    run_until(&mut app, &flag, secs(3));

    flag.request();
    assert_eq!(app.run(&flag), ExitCode::TermHandlerSigTerm);
    assert_eq!(ExitCode::TermHandlerSigTerm.code(), 1);

    let scheduler = app.scheduler();
    assert_eq!(scheduler.live_count(), 0);
    assert_eq!(scheduler.created_count(), scheduler.released_count());
    assert!(
        app.sink()
            .events
            .contains(&AppEvent::ShuttingDown(ExitCode::TermHandlerSigTerm))
    );
}

#[test]
fn termination_during_pump_run_forces_everything_off() {
    let flag = ShutdownFlag::new();
    let mut app = started_app(test_config(), MockHub::new());
    run_until(&mut app, &flag, secs(1));
    app.transport_mut().desired(r#"{"StatusLED":true}"#);
    app.transport_mut().invoke("InjectInsulin", "30000");
    run_until(&mut app, &flag, secs(2));
    assert!(app.hardware().pump_active);
    assert_eq!(app.hardware().led, Some(true));

    flag.request();
    app.run(&flag);

    let hw = app.hardware();
    assert!(!hw.pump_active);
    assert_eq!(hw.pump_log.last(), Some(&(secs(2), false)));
    assert_eq!(hw.pump_offs(), 1);
    assert_eq!(hw.led, Some(false));
    assert!(!app.transport().has_client());
    assert_eq!(app.pending_actuation(), None);
    assert_eq!(app.scheduler().live_count(), 0);
}

#[test]
fn close_is_idempotent() {
    let mut app = started_app(test_config(), MockHub::new());
    app.close();
    app.close();
    assert!(app.is_closed());
    assert_eq!(
        app.sink()
            .count(|e| matches!(e, AppEvent::ShuttingDown(_))),
        1
    );
    assert_eq!(app.transport().teardowns, 1);
}

#[test]
fn loop_without_timers_fails() {
    let clock = SimClock::new();
    let mut app = AppService::new(
        test_config(),
        MockHw::new(clock.clone()),
        MockHub::new(),
        clock,
        RecordingSink::default(),
    );
    assert_eq!(app.run(&ShutdownFlag::new()), ExitCode::MainEventLoopFail);
    assert!(app.is_closed());
}
