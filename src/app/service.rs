//! Application service, the hexagonal core.
//!
//! [`AppService`] is the single owned context of the device: it holds the
//! scheduler, the connection state machine, the telemetry publisher, the
//! pending pump actuation and every adapter.  Handlers run one at a time
//! from [`AppService::run_once`], so no state is ever shared across
//! threads.
//!
//! ```text
//!                  ┌────────────────────────────────────┐
//!   Clock ───────▶ │  Scheduler ──▶ dispatch table      │
//!                  │   ┌────────────┬────────────────┐  │
//!                  │   │ ButtonPoll │ on_button_poll │  │ ──▶ EventSink
//!   DeviceHardware │   │ CloudPoll  │ on_cloud_poll  │  │
//!        ◀──────▶  │   │ PumpShutoff│ on_pump_shutoff│  │
//!                  │   └────────────┴────────────────┘  │
//!   CloudTransport │  ConnectionManager · Telemetry     │
//!        ◀──────▶  │  Methods · Twin                    │
//!                  └────────────────────────────────────┘
//! ```
//!
//! Every handler returns `Err(ExitCode)` on a fatal failure; the loop stops
//! dispatching and [`AppService::run`] winds down through
//! [`AppService::close`].

use core::time::Duration;

use log::{debug, error, info, warn};

use crate::cloud::connection::{Backoff, ConnectionManager, ConnectionState, ConnectionUpdate};
use crate::cloud::methods::{self, MethodAction, MethodResponse};
use crate::cloud::telemetry::{TelemetryMessage, TelemetryPublisher};
use crate::cloud::twin::{self, TwinUpdateKind};
use crate::config::SystemConfig;
use crate::drivers::button::PressDetector;
use crate::error::ExitCode;
use crate::scheduler::{RunOutcome, Scheduler, TimerHandle, TimerSource};
use crate::signals::ShutdownFlag;

use super::commands::{HubEvent, MethodRequest};
use super::events::AppEvent;
use super::ports::{Clock, CloudTransport, DeviceHardware, EventSink};

// ───────────────────────────────────────────────────────────────
// Dispatch table
// ───────────────────────────────────────────────────────────────

/// Signature of a timer handler.  It must acknowledge the expiration
/// through [`Scheduler::consume`] before doing anything else.
pub type TimerHandlerFn<H, T, C, S> =
    fn(&mut AppService<H, T, C, S>, TimerHandle) -> Result<(), ExitCode>;

/// A pump run in progress, ended by its one-shot timer.  Whether the pump
/// is actually on is read back from [`ActuatorPort::is_active`](super::ports::ActuatorPort::is_active).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingActuation {
    pub duration_ms: u32,
    pub timer: TimerHandle,
}

// ───────────────────────────────────────────────────────────────
// AppService
// ───────────────────────────────────────────────────────────────

pub struct AppService<H, T, C, S>
where
    H: DeviceHardware,
    T: CloudTransport,
    C: Clock,
    S: EventSink,
{
    config: SystemConfig,
    hw: H,
    transport: T,
    sink: S,
    scheduler: Scheduler<C>,
    /// Indexed by [`TimerSource::index`].
    handlers: [TimerHandlerFn<H, T, C, S>; TimerSource::COUNT],
    connection: ConnectionManager,
    telemetry: TelemetryPublisher,
    button: PressDetector,
    button_timer: Option<TimerHandle>,
    cloud_timer: Option<TimerHandle>,
    pump: Option<PendingActuation>,
    exit_code: ExitCode,
    closed: bool,
}

impl<H, T, C, S> AppService<H, T, C, S>
where
    H: DeviceHardware,
    T: CloudTransport,
    C: Clock,
    S: EventSink,
{
    /// Construct the service.  No timer is armed until [`start`](Self::start).
    pub fn new(config: SystemConfig, hw: H, transport: T, clock: C, sink: S) -> Self {
        let connection = ConnectionManager::new(Backoff::from_config(&config));
        Self {
            config,
            hw,
            transport,
            sink,
            scheduler: Scheduler::new(clock),
            handlers: [Self::on_button_poll, Self::on_cloud_poll, Self::on_pump_shutoff],
            connection,
            telemetry: TelemetryPublisher::new(),
            button: PressDetector::new(),
            button_timer: None,
            cloud_timer: None,
            pump: None,
            exit_code: ExitCode::Success,
            closed: false,
        }
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// Arm the button poll and cloud poll timers.
    pub fn start(&mut self) -> Result<(), ExitCode> {
        let button_period = Duration::from_millis(u64::from(self.config.button_poll_interval_ms));
        let button = self
            .scheduler
            .register_periodic(TimerSource::ButtonPoll, button_period)
            .map_err(|e| {
                error!("Cannot create button poll timer: {}", e);
                ExitCode::InitButtonPollTimer
            })?;
        self.button_timer = Some(button);

        let cloud_period = Duration::from_secs(u64::from(self.connection.period_secs()));
        let cloud = self
            .scheduler
            .register_periodic(TimerSource::CloudPoll, cloud_period)
            .map_err(|e| {
                error!("Cannot create cloud poll timer: {}", e);
                ExitCode::InitCloudTimer
            })?;
        self.cloud_timer = Some(cloud);

        self.sink.emit(&AppEvent::Started);
        info!(
            "AppService started (button every {:?}, cloud every {:?})",
            button_period, cloud_period
        );
        Ok(())
    }

    /// Wait for the next batch of timers and dispatch it.
    ///
    /// Returns the exit code after the batch; anything but
    /// [`ExitCode::Success`] means the loop must stop.
    pub fn run_once(&mut self, shutdown: &ShutdownFlag) -> ExitCode {
        if !self.exit_code.is_success() {
            return self.exit_code;
        }

        match self.scheduler.run(shutdown) {
            Ok(RunOutcome::Interrupted) => {
                info!("Termination requested");
                self.exit_code = ExitCode::TermHandlerSigTerm;
            }
            Ok(RunOutcome::Dispatch(batch)) => {
                for expired in batch {
                    // An earlier handler in this batch may have cancelled it.
                    if !self.scheduler.is_live(expired.handle) {
                        continue;
                    }
                    let handler = self.handlers[expired.source.index()];
                    if let Err(code) = handler(self, expired.handle) {
                        error!("{:?} handler failed: {}", expired.source, code);
                        self.exit_code = code;
                        break;
                    }
                }
            }
            Err(e) => {
                error!("Event loop failed: {}", e);
                self.exit_code = ExitCode::MainEventLoopFail;
            }
        }
        self.exit_code
    }

    /// Run until a signal or a fatal error, then tear everything down.
    pub fn run(&mut self, shutdown: &ShutdownFlag) -> ExitCode {
        while self.run_once(shutdown).is_success() {}
        self.close();
        self.exit_code
    }

    /// Release every timer, force the pump off, switch the LED off and
    /// destroy the cloud client.  Idempotent.
    pub fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        self.sink.emit(&AppEvent::ShuttingDown(self.exit_code));

        self.scheduler.shutdown();
        self.button_timer = None;
        self.cloud_timer = None;
        self.pump = None;

        self.force_pump_off();
        if let Err(e) = self.hw.set_status_led(false) {
            warn!("Cannot switch status LED off: {}", e);
        }
        self.transport.teardown();
        info!("Application exiting: {}", self.exit_code);
    }

    // ── Timer handlers ────────────────────────────────────────

    fn on_button_poll(&mut self, timer: TimerHandle) -> Result<(), ExitCode> {
        self.scheduler.consume(timer).map_err(|e| {
            error!("Button timer: {}", e);
            ExitCode::ButtonTimerConsume
        })?;

        let pressed = self.hw.is_pressed().map_err(|e| {
            error!("Button read: {}", e);
            ExitCode::ButtonTimerGetButtonState
        })?;

        if self.button.update(pressed) {
            self.sink.emit(&AppEvent::ButtonPressed);
            let reachable = self.hw.is_internet_reachable();
            self.publish(TelemetryMessage::ButtonPress, reachable);
        }
        Ok(())
    }

    fn on_cloud_poll(&mut self, timer: TimerHandle) -> Result<(), ExitCode> {
        self.scheduler.consume(timer).map_err(|e| {
            error!("Cloud timer: {}", e);
            ExitCode::CloudTimerConsume
        })?;

        let reachable = self.hw.is_internet_reachable();
        let update = self
            .connection
            .tick(reachable, &self.config.connection, &mut self.transport);
        self.apply_connection_update(update)?;

        if self.connection.is_authenticated() {
            let glucose = self.hw.read_glucose().map_err(|e| {
                error!("Sensor read: {}", e);
                ExitCode::CloudTimerSensorPoll
            })?;
            self.publish(TelemetryMessage::Glucose(glucose), reachable);
        }

        if self.connection.state() != ConnectionState::NotAuthenticated {
            self.transport.do_work();
        }
        self.drain_hub_events()
    }

    fn on_pump_shutoff(&mut self, timer: TimerHandle) -> Result<(), ExitCode> {
        self.scheduler.consume(timer).map_err(|e| {
            error!("Pump timer: {}", e);
            ExitCode::PumpTimerConsume
        })?;

        let pending = self.pump.take();
        if self.hw.is_active() {
            self.hw.set_active(false).map_err(|e| {
                error!("Pump off: {}", e);
                ExitCode::PumpTimerSetPump
            })?;
        } else {
            warn!("Pump already off at shutoff");
        }
        if let Some(p) = pending {
            debug!("Pump ran for {}ms", p.duration_ms);
        }
        self.sink.emit(&AppEvent::PumpStopped);
        Ok(())
    }

    // ── Cloud plumbing ────────────────────────────────────────

    fn drain_hub_events(&mut self) -> Result<(), ExitCode> {
        while let Some(event) = self.transport.poll_event() {
            match event {
                HubEvent::ConnectionStatus(status) => {
                    let update = self.connection.on_status(status, &mut self.transport);
                    self.apply_connection_update(update)?;
                }
                HubEvent::MethodInvoked(request) => self.handle_method(request),
                HubEvent::TwinUpdated { kind, payload } => self.handle_twin(kind, &payload),
                HubEvent::TelemetryConfirmed { accepted: true } => {
                    debug!("Telemetry confirmed");
                }
                HubEvent::TelemetryConfirmed { accepted: false } => {
                    warn!("Telemetry refused by hub");
                }
            }
        }
        Ok(())
    }

    fn apply_connection_update(&mut self, update: ConnectionUpdate) -> Result<(), ExitCode> {
        if let Some((from, to)) = update.transition {
            self.sink.emit(&AppEvent::ConnectionChanged { from, to });
        }

        if let Some(period_secs) = update.period_secs {
            if let Some(timer) = self.cloud_timer {
                self.scheduler
                    .set_period(timer, Duration::from_secs(u64::from(period_secs)))
                    .map_err(|e| {
                        error!("Cloud timer period: {}", e);
                        ExitCode::CloudTimerSetPeriod
                    })?;
            }
            let failures = self.connection.failures();
            if failures > 0 {
                self.sink.emit(&AppEvent::BackoffApplied {
                    period_secs,
                    failures,
                });
            }
        }

        if update.authenticated() {
            self.report_identity();
        }
        Ok(())
    }

    fn report_identity(&mut self) {
        match self.config.identity.to_report() {
            Ok(report) => {
                if let Err(e) = self.transport.report_properties(&report) {
                    warn!("Cannot report device identity: {}", e);
                }
            }
            Err(e) => warn!("Cannot encode device identity: {}", e),
        }
    }

    fn publish(&mut self, message: TelemetryMessage, reachable: bool) {
        let res = self.telemetry.publish(
            self.connection.state(),
            reachable,
            &message,
            &mut self.transport,
        );
        let event = match (res, message) {
            (Ok(()), TelemetryMessage::Glucose(g)) => AppEvent::TelemetrySent { glucose: Some(g) },
            (Ok(()), TelemetryMessage::ButtonPress) => AppEvent::TelemetrySent { glucose: None },
            (Err(e), _) => AppEvent::TelemetryDropped(e),
        };
        self.sink.emit(&event);
    }

    fn handle_method(&mut self, request: MethodRequest) {
        info!("Method '{}' invoked", request.name);
        let (mut response, action) = methods::dispatch(
            &request.name,
            &request.payload,
            self.config.max_pump_duration_ms,
        );

        match action {
            MethodAction::None => {}
            MethodAction::Alarm => self.sink.emit(&AppEvent::AlarmTriggered),
            MethodAction::StartPump { duration_ms } => {
                if !self.start_pump(duration_ms) {
                    response = MethodResponse::pump_unavailable();
                }
            }
        }
        self.transport.complete_method(request.id, response);
    }

    /// Switch the pump on and (re)arm its shutoff timer.  A run already in
    /// progress is extended: its timer is replaced and the pump stays on.
    fn start_pump(&mut self, duration_ms: u32) -> bool {
        if let Some(previous) = self.pump.take() {
            self.scheduler.cancel(previous.timer);
            debug!("Pump run of {}ms replaced", previous.duration_ms);
        }

        let delay = Duration::from_millis(u64::from(duration_ms));
        let timer = match self.scheduler.register_one_shot(TimerSource::PumpShutoff, delay) {
            Ok(timer) => timer,
            Err(e) => {
                error!("Cannot arm pump shutoff: {}", e);
                self.force_pump_off();
                return false;
            }
        };

        if !self.hw.is_active() {
            if let Err(e) = self.hw.set_active(true) {
                error!("Cannot switch pump on: {}", e);
                self.scheduler.cancel(timer);
                self.force_pump_off();
                return false;
            }
        }

        self.pump = Some(PendingActuation { duration_ms, timer });
        self.sink.emit(&AppEvent::PumpStarted { duration_ms });
        true
    }

    fn force_pump_off(&mut self) {
        if self.hw.is_active() {
            if let Err(e) = self.hw.set_active(false) {
                error!("Cannot switch pump off: {}", e);
            }
        }
    }

    fn handle_twin(&mut self, kind: TwinUpdateKind, payload: &[u8]) {
        let desired = match twin::parse_desired(kind, payload) {
            Ok(desired) => desired,
            Err(e) => {
                warn!("Ignoring malformed twin update: {}", e);
                return;
            }
        };
        let Some(on) = desired.status_led else {
            return;
        };

        if let Err(e) = self.hw.set_status_led(on) {
            warn!("Cannot set status LED: {}", e);
            return;
        }
        self.sink.emit(&AppEvent::StatusLedChanged(on));

        match twin::status_led_report(on) {
            Ok(report) => {
                if let Err(e) = self.transport.report_properties(&report) {
                    warn!("Cannot report StatusLED: {}", e);
                }
            }
            Err(e) => warn!("Cannot encode StatusLED report: {}", e),
        }
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn hardware(&self) -> &H {
        &self.hw
    }

    pub fn hardware_mut(&mut self) -> &mut H {
        &mut self.hw
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn scheduler(&self) -> &Scheduler<C> {
        &self.scheduler
    }

    pub fn connection(&self) -> &ConnectionManager {
        &self.connection
    }

    pub fn connection_state(&self) -> ConnectionState {
        self.connection.state()
    }

    pub fn telemetry(&self) -> &TelemetryPublisher {
        &self.telemetry
    }

    pub fn cloud_timer(&self) -> Option<TimerHandle> {
        self.cloud_timer
    }

    pub fn pending_actuation(&self) -> Option<PendingActuation> {
        self.pump
    }

    pub fn exit_code(&self) -> ExitCode {
        self.exit_code
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }
}
