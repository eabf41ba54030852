//! Telemetry publisher.
//!
//! Messages are formatted into a fixed-size stack buffer and handed to the
//! transport at most once.  Nothing is queued or retried: a message that
//! cannot go out right now (not authenticated, network down, too large,
//! transport refused) is counted as dropped and forgotten.

use core::fmt::Write;

use log::{debug, warn};

use crate::app::ports::CloudTransport;
use crate::error::TelemetryError;

use super::connection::ConnectionState;

/// Telemetry buffer size in bytes.
pub const TELEMETRY_BUFFER_SIZE: usize = 100;

/// Outbound telemetry messages.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TelemetryMessage {
    /// `{"Glucose":<value>}`, two decimals.
    Glucose(f32),
    /// `{"ButtonPress":true}`
    ButtonPress,
}

impl TelemetryMessage {
    /// Render into an `N`-byte buffer.  Fails instead of truncating.
    pub fn format<const N: usize>(&self) -> Result<heapless::String<N>, TelemetryError> {
        let mut buf = heapless::String::<N>::new();
        let res = match self {
            Self::Glucose(value) => write!(buf, "{{\"Glucose\":{:.2}}}", value),
            Self::ButtonPress => buf.write_str("{\"ButtonPress\":true}"),
        };
        res.map_err(|_| TelemetryError::BufferOverflow)?;
        Ok(buf)
    }
}

/// State-gated, fire-and-forget sender.
#[derive(Debug, Default)]
pub struct TelemetryPublisher<const N: usize = TELEMETRY_BUFFER_SIZE> {
    sent: u32,
    dropped: u32,
}

impl<const N: usize> TelemetryPublisher<N> {
    pub const fn new() -> Self {
        Self {
            sent: 0,
            dropped: 0,
        }
    }

    /// Send `message` if the client is authenticated and the network is up.
    pub fn publish(
        &mut self,
        state: ConnectionState,
        network_reachable: bool,
        message: &TelemetryMessage,
        transport: &mut impl CloudTransport,
    ) -> Result<(), TelemetryError> {
        let res = Self::try_send(state, network_reachable, message, transport);
        match res {
            Ok(()) => self.sent = self.sent.wrapping_add(1),
            Err(e) => {
                self.dropped = self.dropped.wrapping_add(1);
                warn!("Telemetry: dropped {:?}: {}", message, e);
            }
        }
        res
    }

    fn try_send(
        state: ConnectionState,
        network_reachable: bool,
        message: &TelemetryMessage,
        transport: &mut impl CloudTransport,
    ) -> Result<(), TelemetryError> {
        if state != ConnectionState::Authenticated {
            return Err(TelemetryError::NotAuthenticated);
        }
        if !network_reachable {
            return Err(TelemetryError::NetworkUnavailable);
        }
        let text = message.format::<N>()?;
        transport.send_telemetry(text.as_bytes())?;
        debug!("Telemetry: sent {}", text);
        Ok(())
    }

    /// Messages handed to the transport.
    pub fn sent(&self) -> u32 {
        self.sent
    }

    /// Messages dropped before reaching the transport.
    pub fn dropped(&self) -> u32 {
        self.dropped
    }
}
