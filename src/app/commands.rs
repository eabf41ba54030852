//! Inbound notifications from the cloud transport.
//!
//! The transport queues these while it is being pumped; the
//! [`AppService`](super::service::AppService) drains and interprets them
//! after every work pass.

use crate::cloud::connection::ConnectionStatus;
use crate::cloud::twin::TwinUpdateKind;

/// Opaque id the transport uses to match a method response to its request.
pub type MethodRequestId = u32;

/// A direct method invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodRequest {
    pub id: MethodRequestId,
    pub name: String,
    pub payload: Vec<u8>,
}

/// Notifications the transport hands back to the application core.
#[derive(Debug, Clone, PartialEq)]
pub enum HubEvent {
    /// Authentication succeeded, failed or expired.
    ConnectionStatus(ConnectionStatus),

    /// The cloud invoked a direct method and awaits a response.
    MethodInvoked(MethodRequest),

    /// The device twin changed (complete document or desired patch).
    TwinUpdated { kind: TwinUpdateKind, payload: Vec<u8> },

    /// The hub acknowledged (or refused) a telemetry message.
    TelemetryConfirmed { accepted: bool },
}
