//! Connection state machine and retry backoff.
//!
//! ```text
//!                  tick: network up, setup ok
//!  NotAuthenticated ─────────────────────────▶ AuthenticationInitiated
//!        ▲   ▲                                        │
//!        │   └──────── status: Unauthenticated ───────┤
//!        │                                            │ status: Authenticated
//!        │                                            ▼
//!        └──────────── status: Unauthenticated ── Authenticated
//! ```
//!
//! Every failure (setup refused, authentication failed, connection lost)
//! stretches the cloud poll period; a success restores the default.  Only
//! one attempt is ever in flight: a new one starts only from
//! `NotAuthenticated`.

use core::fmt;

use log::{debug, info, warn};

use crate::app::ports::CloudTransport;
use crate::config::{ConnectionSettings, SystemConfig};

// ═══════════════════════════════════════════════════════════════
//  State and status types
// ═══════════════════════════════════════════════════════════════

/// Authentication state of the cloud client.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum ConnectionState {
    #[default]
    NotAuthenticated,
    AuthenticationInitiated,
    Authenticated,
}

/// Why the transport reported the device as unauthenticated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisconnectReason {
    ExpiredSasToken,
    DeviceDisabled,
    BadCredential,
    RetryExpired,
    NoNetwork,
    CommunicationError,
    Unknown,
}

impl fmt::Display for DisconnectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::ExpiredSasToken => "SAS token expired",
            Self::DeviceDisabled => "device disabled",
            Self::BadCredential => "bad credential",
            Self::RetryExpired => "retry expired",
            Self::NoNetwork => "no network",
            Self::CommunicationError => "communication error",
            Self::Unknown => "unknown reason",
        };
        f.write_str(text)
    }
}

/// Connection status reported by the transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionStatus {
    Authenticated,
    Unauthenticated(DisconnectReason),
}

// ═══════════════════════════════════════════════════════════════
//  Backoff
// ═══════════════════════════════════════════════════════════════

/// Cloud poll period schedule, in seconds.
///
/// After `n` consecutive failures the period is
/// `min(min_secs * 2^(n-1), max_secs)`; with no failures it is
/// `default_secs`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Backoff {
    pub default_secs: u32,
    pub min_secs: u32,
    pub max_secs: u32,
}

impl Default for Backoff {
    fn default() -> Self {
        Self {
            default_secs: 1,
            min_secs: 60,
            max_secs: 600,
        }
    }
}

impl Backoff {
    pub fn from_config(config: &SystemConfig) -> Self {
        Self {
            default_secs: config.default_poll_period_secs,
            min_secs: config.min_backoff_secs,
            max_secs: config.max_backoff_secs,
        }
    }

    /// Poll period after `failures` consecutive failed attempts.
    pub fn period_after(&self, failures: u32) -> u32 {
        if failures == 0 {
            return self.default_secs;
        }
        let doublings = (failures - 1).min(31);
        self.min_secs
            .saturating_mul(1u32 << doublings)
            .min(self.max_secs)
    }
}

// ═══════════════════════════════════════════════════════════════
//  State machine
// ═══════════════════════════════════════════════════════════════

/// What a tick or status report changed.  The caller applies it to the
/// scheduler and the event sink.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConnectionUpdate {
    /// `(from, to)` when the state moved.
    pub transition: Option<(ConnectionState, ConnectionState)>,
    /// New cloud poll period in seconds, when it changed.
    pub period_secs: Option<u32>,
}

impl ConnectionUpdate {
    /// `true` when this update entered `Authenticated`.
    pub fn authenticated(&self) -> bool {
        matches!(self.transition, Some((_, ConnectionState::Authenticated)))
    }
}

pub struct ConnectionManager {
    state: ConnectionState,
    backoff: Backoff,
    period_secs: u32,
    failures: u32,
}

impl ConnectionManager {
    pub fn new(backoff: Backoff) -> Self {
        Self {
            state: ConnectionState::NotAuthenticated,
            backoff,
            period_secs: backoff.default_secs,
            failures: 0,
        }
    }

    /// Cloud poll tick: start an attempt when disconnected and the network
    /// is up.
    pub fn tick(
        &mut self,
        network_reachable: bool,
        settings: &ConnectionSettings,
        transport: &mut impl CloudTransport,
    ) -> ConnectionUpdate {
        if !network_reachable {
            warn!("Cloud: network not ready, cannot connect");
            return ConnectionUpdate::default();
        }
        if self.state != ConnectionState::NotAuthenticated {
            return ConnectionUpdate::default();
        }

        match transport.begin_connect(settings) {
            Ok(()) => {
                info!("Cloud: authentication initiated ({:?})", settings.connection_type);
                ConnectionUpdate {
                    transition: Some(self.enter(ConnectionState::AuthenticationInitiated)),
                    period_secs: None,
                }
            }
            Err(e) => {
                warn!("Cloud: connection setup failed: {}", e);
                transport.teardown();
                ConnectionUpdate {
                    transition: None,
                    period_secs: Some(self.record_failure()),
                }
            }
        }
    }

    /// Apply a connection status report from the transport.
    pub fn on_status(
        &mut self,
        status: ConnectionStatus,
        transport: &mut impl CloudTransport,
    ) -> ConnectionUpdate {
        match status {
            ConnectionStatus::Authenticated => {
                if self.state != ConnectionState::AuthenticationInitiated {
                    debug!("Cloud: ignoring authentication report in {:?}", self.state);
                    return ConnectionUpdate::default();
                }
                let transition = self.enter(ConnectionState::Authenticated);
                self.failures = 0;
                let period = self.set_period(self.backoff.default_secs);
                info!("Cloud: authenticated");
                ConnectionUpdate {
                    transition: Some(transition),
                    period_secs: period,
                }
            }
            ConnectionStatus::Unauthenticated(reason) => {
                if self.state == ConnectionState::NotAuthenticated {
                    debug!("Cloud: ignoring '{}' while not authenticated", reason);
                    return ConnectionUpdate::default();
                }
                warn!("Cloud: not authenticated: {}", reason);
                transport.teardown();
                let transition = self.enter(ConnectionState::NotAuthenticated);
                ConnectionUpdate {
                    transition: Some(transition),
                    period_secs: Some(self.record_failure()),
                }
            }
        }
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn is_authenticated(&self) -> bool {
        self.state == ConnectionState::Authenticated
    }

    /// Current cloud poll period (seconds).
    pub fn period_secs(&self) -> u32 {
        self.period_secs
    }

    /// Consecutive failed attempts since the last success.
    pub fn failures(&self) -> u32 {
        self.failures
    }

    pub fn backoff(&self) -> Backoff {
        self.backoff
    }

    // ── Internal ──────────────────────────────────────────────

    fn enter(&mut self, to: ConnectionState) -> (ConnectionState, ConnectionState) {
        let from = core::mem::replace(&mut self.state, to);
        (from, to)
    }

    fn record_failure(&mut self) -> u32 {
        self.failures = self.failures.saturating_add(1);
        let period = self.backoff.period_after(self.failures);
        self.period_secs = period;
        info!(
            "Cloud: retry in {}s after {} failure(s)",
            period, self.failures
        );
        period
    }

    fn set_period(&mut self, secs: u32) -> Option<u32> {
        if self.period_secs == secs {
            return None;
        }
        self.period_secs = secs;
        Some(secs)
    }
}
