//! Mock adapters for integration tests.
//!
//! [`MockHw`] records every pump and LED write with the simulated time it
//! happened at; [`MockHub`] is a scripted cloud transport that queues
//! inbound events until the next `do_work`, like the real client.

use std::collections::VecDeque;
use std::time::Duration;

use glucolink::adapters::time::SimClock;
use glucolink::app::commands::{HubEvent, MethodRequest, MethodRequestId};
use glucolink::app::events::AppEvent;
use glucolink::app::ports::{
    ActuatorPort, ButtonPort, Clock, CloudTransport, EventSink, NetworkProbe, SensorPort,
    StatusLedPort,
};
use glucolink::app::service::AppService;
use glucolink::cloud::connection::ConnectionStatus;
use glucolink::cloud::methods::MethodResponse;
use glucolink::cloud::twin::TwinUpdateKind;
use glucolink::config::{ConnectionSettings, ConnectionType, SystemConfig};
use glucolink::error::{ActuatorError, SensorError, TransportError};
use glucolink::signals::ShutdownFlag;

use embedded_hal::digital::ErrorKind;

pub type TestApp = AppService<MockHw, MockHub, SimClock, RecordingSink>;

// ── MockHw ────────────────────────────────────────────────────

pub struct MockHw {
    clock: SimClock,
    pub pump_active: bool,
    /// `(time, level)` for every successful pump write.
    pub pump_log: Vec<(Duration, bool)>,
    pub led: Option<bool>,
    pub button_pressed: bool,
    pub glucose: f32,
    pub network_up: bool,
    pub fail_pump: bool,
    pub fail_button: bool,
    pub fail_sensor: bool,
}

#[allow(dead_code)]
impl MockHw {
    pub fn new(clock: SimClock) -> Self {
        Self {
            clock,
            pump_active: false,
            pump_log: Vec::new(),
            led: None,
            button_pressed: false,
            glucose: 5.0,
            network_up: true,
            fail_pump: false,
            fail_button: false,
            fail_sensor: false,
        }
    }

    pub fn pump_offs(&self) -> usize {
        self.pump_log.iter().filter(|(_, on)| !on).count()
    }
}

impl SensorPort for MockHw {
    fn read_glucose(&mut self) -> Result<f32, SensorError> {
        if self.fail_sensor {
            return Err(SensorError::AdcReadFailed);
        }
        Ok(self.glucose)
    }
}

impl ButtonPort for MockHw {
    fn is_pressed(&mut self) -> Result<bool, SensorError> {
        if self.fail_button {
            return Err(SensorError::GpioReadFailed(ErrorKind::Other));
        }
        Ok(self.button_pressed)
    }
}

impl ActuatorPort for MockHw {
    fn set_active(&mut self, active: bool) -> Result<(), ActuatorError> {
        if self.fail_pump {
            return Err(ActuatorError::GpioWriteFailed(ErrorKind::Other));
        }
        self.pump_active = active;
        self.pump_log.push((self.clock.now(), active));
        Ok(())
    }

    fn is_active(&self) -> bool {
        self.pump_active
    }
}

impl StatusLedPort for MockHw {
    fn set_status_led(&mut self, on: bool) -> Result<(), ActuatorError> {
        self.led = Some(on);
        Ok(())
    }
}

impl NetworkProbe for MockHw {
    fn is_internet_reachable(&mut self) -> bool {
        self.network_up
    }
}

// ── MockHub ───────────────────────────────────────────────────

#[derive(Default)]
pub struct MockHub {
    /// Status reported for each successful `begin_connect`, in order.
    /// Once empty, attempts succeed.
    pub outcomes: VecDeque<ConnectionStatus>,
    /// Never answer connection attempts.
    pub silent: bool,
    /// Refuse to create a client.
    pub refuse_connect: bool,

    pub connects: u32,
    pub teardowns: u32,
    pub work_passes: u32,
    pub telemetry: Vec<String>,
    pub reported: Vec<String>,
    pub responses: Vec<(MethodRequestId, i32, Vec<u8>)>,
    /// Telemetry handed over while the hub had not confirmed authentication.
    pub violations: u32,

    client: bool,
    authenticated: bool,
    pending_status: Option<ConnectionStatus>,
    inbound: VecDeque<HubEvent>,
    ready: VecDeque<HubEvent>,
    next_id: MethodRequestId,
}

#[allow(dead_code)]
impl MockHub {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing(times: usize, status: ConnectionStatus) -> Self {
        Self {
            outcomes: std::iter::repeat_n(status, times).collect(),
            ..Self::default()
        }
    }

    /// A hub that never answers connection attempts.
    pub fn silent() -> Self {
        Self {
            silent: true,
            ..Self::default()
        }
    }

    /// A hub that refuses to create a client.
    pub fn refusing() -> Self {
        Self {
            refuse_connect: true,
            ..Self::default()
        }
    }

    /// Queue a cloud-side event for the next work pass.
    pub fn inject(&mut self, event: HubEvent) {
        self.inbound.push_back(event);
    }

    pub fn invoke(&mut self, name: &str, payload: &str) -> MethodRequestId {
        self.next_id += 1;
        let id = self.next_id;
        self.inject(HubEvent::MethodInvoked(MethodRequest {
            id,
            name: name.to_string(),
            payload: payload.as_bytes().to_vec(),
        }));
        id
    }

    pub fn desired(&mut self, patch: &str) {
        self.inject(HubEvent::TwinUpdated {
            kind: TwinUpdateKind::Partial,
            payload: patch.as_bytes().to_vec(),
        });
    }

    pub fn has_client(&self) -> bool {
        self.client
    }
}

impl CloudTransport for MockHub {
    fn begin_connect(&mut self, _settings: &ConnectionSettings) -> Result<(), TransportError> {
        if self.refuse_connect {
            return Err(TransportError::SetupFailed("refused"));
        }
        assert!(!self.client, "connection attempt while a client exists");
        self.connects += 1;
        self.client = true;
        self.authenticated = false;
        if !self.silent {
            self.pending_status = Some(
                self.outcomes
                    .pop_front()
                    .unwrap_or(ConnectionStatus::Authenticated),
            );
        }
        Ok(())
    }

    fn do_work(&mut self) {
        self.work_passes += 1;
        if let Some(status) = self.pending_status.take() {
            self.authenticated = status == ConnectionStatus::Authenticated;
            self.ready.push_back(HubEvent::ConnectionStatus(status));
        }
        self.ready.extend(self.inbound.drain(..));
    }

    fn poll_event(&mut self) -> Option<HubEvent> {
        self.ready.pop_front()
    }

    fn send_telemetry(&mut self, payload: &[u8]) -> Result<(), TransportError> {
        if !self.authenticated {
            self.violations += 1;
        }
        self.telemetry
            .push(String::from_utf8(payload.to_vec()).expect("telemetry is UTF-8"));
        Ok(())
    }

    fn report_properties(&mut self, payload: &[u8]) -> Result<(), TransportError> {
        self.reported
            .push(String::from_utf8(payload.to_vec()).expect("report is UTF-8"));
        Ok(())
    }

    fn complete_method(&mut self, id: MethodRequestId, response: MethodResponse) {
        let (status, body) = response.into_parts();
        self.responses.push((id, status, body.into_vec()));
    }

    fn teardown(&mut self) {
        self.teardowns += 1;
        self.client = false;
        self.authenticated = false;
        self.pending_status = None;
    }
}

// ── RecordingSink ─────────────────────────────────────────────

#[derive(Default)]
pub struct RecordingSink {
    pub events: Vec<AppEvent>,
}

#[allow(dead_code)]
impl RecordingSink {
    pub fn count(&self, pred: impl Fn(&AppEvent) -> bool) -> usize {
        self.events.iter().filter(|e| pred(e)).count()
    }
}

impl EventSink for RecordingSink {
    fn emit(&mut self, event: &AppEvent) {
        self.events.push(event.clone());
    }
}

// ── Helpers ───────────────────────────────────────────────────

pub fn test_config() -> SystemConfig {
    let mut config = SystemConfig::default();
    config.connection.connection_type = ConnectionType::Direct;
    config.connection.hostname = Some("hub.example.net".into());
    config.button_poll_interval_ms = 100;
    config
}

/// Build and start an app on a fresh simulated clock.
pub fn started_app(config: SystemConfig, hub: MockHub) -> TestApp {
    let clock = SimClock::new();
    let hw = MockHw::new(clock.clone());
    let mut app = AppService::new(config, hw, hub, clock, RecordingSink::default());
    app.start().expect("timers arm");
    app
}

/// Dispatch batches until simulated time reaches `t` (or the loop stops).
#[allow(dead_code)]
pub fn run_until(app: &mut TestApp, flag: &ShutdownFlag, t: Duration) {
    while app.scheduler().now() < t {
        if !app.run_once(flag).is_success() {
            break;
        }
    }
}

pub fn secs(s: u64) -> Duration {
    Duration::from_secs(s)
}

pub fn ms(v: u64) -> Duration {
    Duration::from_millis(v)
}
