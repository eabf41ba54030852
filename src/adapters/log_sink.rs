//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing structured application events
//! through the `log` facade (stderr via `env_logger` in the host binary).

use log::{info, warn};

use crate::app::events::AppEvent;
use crate::app::ports::EventSink;

/// Adapter that logs every [`AppEvent`].
#[derive(Debug, Default)]
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &AppEvent) {
        match event {
            AppEvent::Started => info!("START | timers armed"),
            AppEvent::ConnectionChanged { from, to } => {
                info!("CLOUD | {:?} -> {:?}", from, to);
            }
            AppEvent::BackoffApplied {
                period_secs,
                failures,
            } => {
                warn!("CLOUD | backoff {}s after {} failure(s)", period_secs, failures);
            }
            AppEvent::TelemetrySent { glucose: Some(g) } => info!("TELEM | Glucose={:.2}", g),
            AppEvent::TelemetrySent { glucose: None } => info!("TELEM | ButtonPress"),
            AppEvent::TelemetryDropped(e) => info!("TELEM | dropped: {}", e),
            AppEvent::AlarmTriggered => warn!("ALARM | triggered"),
            AppEvent::PumpStarted { duration_ms } => info!("PUMP  | on for {}ms", duration_ms),
            AppEvent::PumpStopped => info!("PUMP  | off"),
            AppEvent::ButtonPressed => info!("BTN   | pressed"),
            AppEvent::StatusLedChanged(on) => {
                info!("LED   | {}", if *on { "on" } else { "off" });
            }
            AppEvent::ShuttingDown(code) => info!("EXIT  | {}", code),
        }
    }
}
