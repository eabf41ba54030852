//! Port traits: the hexagonal boundary between domain logic and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ AppService (domain)
//! ```
//!
//! Driven adapters (clock, sensors, pins, network probe, cloud transport,
//! event sinks) implement these traits.  The
//! [`AppService`](super::service::AppService) owns them through generics,
//! so the domain core never touches hardware or the vendor SDK directly.

use core::time::Duration;

use crate::cloud::methods::MethodResponse;
use crate::config::ConnectionSettings;
use crate::error::{ActuatorError, SchedulerError, SensorError, TransportError};
use crate::signals::ShutdownFlag;

use super::commands::{HubEvent, MethodRequestId};
use super::events::AppEvent;

// ───────────────────────────────────────────────────────────────
// Clock (driven adapter: time source for the scheduler)
// ───────────────────────────────────────────────────────────────

/// Result of a blocking wait.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitOutcome {
    /// The deadline was reached.
    Elapsed,
    /// The termination flag was raised before the deadline.
    Interrupted,
}

/// Monotonic time source the scheduler blocks on.
pub trait Clock {
    /// Time since the clock was created.
    fn now(&self) -> Duration;

    /// Block until `deadline` (or forever when `None`), returning early with
    /// [`WaitOutcome::Interrupted`] once `shutdown` is raised.
    ///
    /// An `Err` is a failure of the wait primitive itself and is fatal to
    /// the event loop.
    fn wait_until(
        &mut self,
        deadline: Option<Duration>,
        shutdown: &ShutdownFlag,
    ) -> Result<WaitOutcome, SchedulerError>;
}

// ───────────────────────────────────────────────────────────────
// Hardware ports (driven adapters: hardware ↔ domain)
// ───────────────────────────────────────────────────────────────

/// Analog sensor reported to the cloud as a glucose reading.
pub trait SensorPort {
    fn read_glucose(&mut self) -> Result<f32, SensorError>;
}

/// Momentary push button.
pub trait ButtonPort {
    /// `true` while the button is held down.
    fn is_pressed(&mut self) -> Result<bool, SensorError>;
}

/// The pump output driven by the InjectInsulin method.
pub trait ActuatorPort {
    fn set_active(&mut self, active: bool) -> Result<(), ActuatorError>;

    fn is_active(&self) -> bool;
}

/// Status LED driven by the `StatusLED` desired twin property.
pub trait StatusLedPort {
    fn set_status_led(&mut self, on: bool) -> Result<(), ActuatorError>;
}

/// "Connected to the internet" check, polled once per cloud tick.
pub trait NetworkProbe {
    fn is_internet_reachable(&mut self) -> bool;
}

/// Everything the application needs from the board, in one bound.
pub trait DeviceHardware: SensorPort + ButtonPort + ActuatorPort + StatusLedPort + NetworkProbe {}

impl<T> DeviceHardware for T where
    T: SensorPort + ButtonPort + ActuatorPort + StatusLedPort + NetworkProbe
{
}

// ───────────────────────────────────────────────────────────────
// Cloud transport (driven adapter: domain ↔ IoT hub client)
// ───────────────────────────────────────────────────────────────

/// Narrow view of the IoT hub device client.
///
/// The transport is lower-layer style: nothing happens on the wire until
/// [`do_work`](Self::do_work) is called, and inbound notifications
/// (connection status, direct methods, twin updates, send confirmations)
/// are queued for [`poll_event`](Self::poll_event) rather than delivered
/// through callbacks.
pub trait CloudTransport {
    /// Create the client and start authenticating.  The outcome arrives
    /// later as a [`HubEvent::ConnectionStatus`].
    fn begin_connect(&mut self, settings: &ConnectionSettings) -> Result<(), TransportError>;

    /// Pump the client: send queued messages, receive inbound traffic.
    fn do_work(&mut self);

    /// Next queued inbound notification, if any.
    fn poll_event(&mut self) -> Option<HubEvent>;

    /// Queue a telemetry message.  Delivery is confirmed asynchronously.
    fn send_telemetry(&mut self, payload: &[u8]) -> Result<(), TransportError>;

    /// Queue a reported-properties patch for the device twin.
    fn report_properties(&mut self, payload: &[u8]) -> Result<(), TransportError>;

    /// Answer a direct method.  Ownership of the response body moves to the
    /// transport, which frees it once it has been sent.
    fn complete_method(&mut self, id: MethodRequestId, response: MethodResponse);

    /// Destroy the client.  Safe to call when no client exists.
    fn teardown(&mut self);
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → logging)
// ───────────────────────────────────────────────────────────────

/// The domain emits structured [`AppEvent`]s through this port.
pub trait EventSink {
    fn emit(&mut self, event: &AppEvent);
}
