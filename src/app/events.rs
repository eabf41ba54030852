//! Outbound application events.
//!
//! The [`AppService`](super::service::AppService) emits these through the
//! [`EventSink`](super::ports::EventSink) port.  Adapters on the other
//! side decide what to do with them: the binary logs them, tests record
//! them.

use crate::cloud::connection::ConnectionState;
use crate::error::{ExitCode, TelemetryError};

/// Structured events emitted by the application core.
#[derive(Debug, Clone, PartialEq)]
pub enum AppEvent {
    /// Timers registered, entering the event loop.
    Started,

    /// The cloud connection changed state.
    ConnectionChanged {
        from: ConnectionState,
        to: ConnectionState,
    },

    /// A connection attempt failed; the cloud poll now runs at this period.
    BackoffApplied { period_secs: u32, failures: u32 },

    /// A telemetry message was handed to the transport.
    TelemetrySent { glucose: Option<f32> },

    /// A telemetry message was dropped (never retried).
    TelemetryDropped(TelemetryError),

    /// The TriggerAlarm method ran.
    AlarmTriggered,

    /// The pump was switched on for `duration_ms`.
    PumpStarted { duration_ms: u32 },

    /// The pump shutoff timer fired and the pump is off again.
    PumpStopped,

    /// The button went from released to pressed.
    ButtonPressed,

    /// The status LED was set from the device twin.
    StatusLedChanged(bool),

    /// The event loop is winding down.
    ShuttingDown(ExitCode),
}
