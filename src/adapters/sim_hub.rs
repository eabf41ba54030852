//! Simulated IoT hub transport.
//!
//! Stands in for the vendor device client on the host.  It follows the
//! same lower-layer contract: nothing happens until
//! [`do_work`](CloudTransport::do_work), and every inbound notification is
//! queued for [`poll_event`](CloudTransport::poll_event).
//!
//! ```text
//!  begin_connect ─▶ client (authenticating)
//!        │  auth_latency_polls work passes
//!        ▼
//!  first `failed_attempts` attempts ─▶ Unauthenticated(BadCredential)
//!  later attempts                   ─▶ Authenticated
//!        │  each work pass while authenticated
//!        ▼
//!  telemetry confirmations, scripted methods and desired patches
//! ```

use std::collections::VecDeque;

use log::{info, warn};

use crate::app::commands::{HubEvent, MethodRequest, MethodRequestId};
use crate::app::ports::CloudTransport;
use crate::cloud::connection::{ConnectionStatus, DisconnectReason};
use crate::cloud::methods::MethodResponse;
use crate::cloud::twin::TwinUpdateKind;
use crate::config::{ConnectionSettings, ConnectionType, ScriptedAction, SimulatedHubConfig};
use crate::error::TransportError;

#[derive(Debug)]
struct Client {
    will_fail: bool,
    polls: u32,
    authenticated: bool,
    /// Set once the failure report has been queued.
    rejected: bool,
    polls_since_auth: u32,
}

pub struct SimulatedHub {
    config: SimulatedHubConfig,
    client: Option<Client>,
    attempts: u32,
    events: VecDeque<HubEvent>,
    next_action: usize,
    next_request_id: MethodRequestId,
    unconfirmed: u32,
    telemetry_sent: u32,
    reports_sent: u32,
    responses: u32,
}

impl SimulatedHub {
    pub fn new(config: SimulatedHubConfig) -> Self {
        Self {
            config,
            client: None,
            attempts: 0,
            events: VecDeque::new(),
            next_action: 0,
            next_request_id: 1,
            unconfirmed: 0,
            telemetry_sent: 0,
            reports_sent: 0,
            responses: 0,
        }
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub fn telemetry_sent(&self) -> u32 {
        self.telemetry_sent
    }

    pub fn reports_sent(&self) -> u32 {
        self.reports_sent
    }

    pub fn responses(&self) -> u32 {
        self.responses
    }

    fn authenticated(&self) -> bool {
        self.client.as_ref().is_some_and(|c| c.authenticated)
    }

    fn deliver_script(&mut self, polls_since_auth: u32) {
        while let Some(action) = self.config.script.get(self.next_action) {
            if action.after_polls() > polls_since_auth {
                break;
            }
            let event = match action {
                ScriptedAction::Method { name, payload, .. } => {
                    let id = self.next_request_id;
                    self.next_request_id = self.next_request_id.wrapping_add(1);
                    info!("SimHub: invoking method {} ({})", name, payload);
                    HubEvent::MethodInvoked(MethodRequest {
                        id,
                        name: name.clone(),
                        payload: payload.as_bytes().to_vec(),
                    })
                }
                ScriptedAction::DesiredPatch { patch, .. } => {
                    info!("SimHub: desired patch {}", patch);
                    HubEvent::TwinUpdated {
                        kind: TwinUpdateKind::Partial,
                        payload: patch.as_bytes().to_vec(),
                    }
                }
            };
            self.events.push_back(event);
            self.next_action += 1;
        }
    }
}

impl CloudTransport for SimulatedHub {
    fn begin_connect(&mut self, settings: &ConnectionSettings) -> Result<(), TransportError> {
        if self.client.is_some() {
            return Err(TransportError::SetupFailed("client already exists"));
        }
        if settings.connection_type == ConnectionType::IoTEdge && settings.edge_root_ca.is_none() {
            return Err(TransportError::SetupFailed("IoT Edge root CA not loaded"));
        }
        self.attempts += 1;
        self.client = Some(Client {
            will_fail: self.attempts <= self.config.failed_attempts,
            polls: 0,
            authenticated: false,
            rejected: false,
            polls_since_auth: 0,
        });
        info!("SimHub: attempt {} ({:?})", self.attempts, settings.connection_type);
        Ok(())
    }

    fn do_work(&mut self) {
        let latency = self.config.auth_latency_polls;
        let Some(client) = self.client.as_mut() else {
            return;
        };

        if !client.authenticated {
            if client.rejected {
                return;
            }
            client.polls += 1;
            if client.polls <= latency {
                return;
            }
            let status = if client.will_fail {
                client.rejected = true;
                ConnectionStatus::Unauthenticated(DisconnectReason::BadCredential)
            } else {
                client.authenticated = true;
                ConnectionStatus::Authenticated
            };
            self.events.push_back(HubEvent::ConnectionStatus(status));
            return;
        }

        client.polls_since_auth += 1;
        let polls_since_auth = client.polls_since_auth;
        for _ in 0..core::mem::take(&mut self.unconfirmed) {
            self.events
                .push_back(HubEvent::TelemetryConfirmed { accepted: true });
        }
        self.deliver_script(polls_since_auth);
    }

    fn poll_event(&mut self) -> Option<HubEvent> {
        self.events.pop_front()
    }

    fn send_telemetry(&mut self, payload: &[u8]) -> Result<(), TransportError> {
        if !self.authenticated() {
            return Err(TransportError::NotConnected);
        }
        info!("SimHub: telemetry {}", String::from_utf8_lossy(payload));
        self.unconfirmed += 1;
        self.telemetry_sent += 1;
        Ok(())
    }

    fn report_properties(&mut self, payload: &[u8]) -> Result<(), TransportError> {
        if !self.authenticated() {
            return Err(TransportError::NotConnected);
        }
        info!("SimHub: reported {}", String::from_utf8_lossy(payload));
        self.reports_sent += 1;
        Ok(())
    }

    fn complete_method(&mut self, id: MethodRequestId, response: MethodResponse) {
        let (status, body) = response.into_parts();
        if !self.authenticated() {
            warn!("SimHub: response to method {} dropped, not connected", id);
            return;
        }
        info!(
            "SimHub: method {} answered {} {}",
            id,
            status,
            String::from_utf8_lossy(&body)
        );
        self.responses += 1;
    }

    fn teardown(&mut self) {
        if self.client.take().is_some() {
            info!("SimHub: client destroyed");
        }
        self.unconfirmed = 0;
    }
}
