//! Unified error types for the glucolink device application.
//!
//! Every subsystem has its own small `Copy` error enum; the application
//! service maps the fatal ones onto an [`ExitCode`] so the process exit
//! status identifies the exact failure site.

use core::fmt;

use embedded_hal::digital::ErrorKind;

// ---------------------------------------------------------------------------
// Process exit codes
// ---------------------------------------------------------------------------

/// Termination codes for the application.
///
/// All values fit in a `u8`; zero is reserved for successful termination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ExitCode {
    Success = 0,

    TermHandlerSigTerm = 1,
    MainEventLoopFail = 2,

    ButtonTimerConsume = 3,
    ButtonTimerGetButtonState = 4,

    CloudTimerConsume = 5,
    CloudTimerSensorPoll = 6,

    PumpTimerConsume = 7,
    PumpTimerSetPump = 8,

    InitTermHandler = 9,
    InitSensor = 10,
    InitButtonPollTimer = 11,
    InitCloudTimer = 12,

    ParseArguments = 13,
    InitConfigFile = 14,
    ValidateConnectionType = 15,
    ValidateScopeId = 16,
    ValidateHostname = 17,
    ValidateIoTEdgeCaPath = 18,
    IoTEdgeRootCaOpen = 19,
    IoTEdgeRootCaFileSize = 20,
    IoTEdgeRootCaRead = 21,

    CloudTimerSetPeriod = 22,
    InitPump = 23,
    InitStatusLed = 24,
    ValidateTiming = 25,
}

impl ExitCode {
    pub const fn code(self) -> u8 {
        self as u8
    }

    pub const fn is_success(self) -> bool {
        matches!(self, Self::Success)
    }
}

impl fmt::Display for ExitCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?} ({})", self, self.code())
    }
}

impl From<ExitCode> for std::process::ExitCode {
    fn from(code: ExitCode) -> Self {
        Self::from(code.code())
    }
}

// ---------------------------------------------------------------------------
// Scheduler errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerError {
    /// Every timer slot is in use.
    Full,
    /// A periodic timer was given a zero period.
    InvalidPeriod,
    /// The handle does not name a live timer (cancelled or already released).
    StaleHandle,
    /// The timer has no pending expiration to consume.
    NothingToConsume,
    /// The operation only applies to periodic timers.
    NotPeriodic,
    /// The clock was asked to wait with nothing armed and no way to be woken.
    Stalled,
}

impl fmt::Display for SchedulerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Full => write!(f, "no free timer slot"),
            Self::InvalidPeriod => write!(f, "timer period must be non-zero"),
            Self::StaleHandle => write!(f, "stale timer handle"),
            Self::NothingToConsume => write!(f, "no pending timer expiration"),
            Self::NotPeriodic => write!(f, "timer is not periodic"),
            Self::Stalled => write!(f, "wait with no timer armed"),
        }
    }
}

// ---------------------------------------------------------------------------
// Transport errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportError {
    /// The client could not be created or configured.
    SetupFailed(&'static str),
    /// No client exists (not connected or already torn down).
    NotConnected,
    /// The transport refused to queue the message.
    Rejected,
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SetupFailed(why) => write!(f, "client setup failed: {why}"),
            Self::NotConnected => write!(f, "no cloud client"),
            Self::Rejected => write!(f, "message rejected by transport"),
        }
    }
}

// ---------------------------------------------------------------------------
// Telemetry errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TelemetryError {
    /// The cloud client is not authenticated yet.
    NotAuthenticated,
    /// The reachability probe reports no internet connection.
    NetworkUnavailable,
    /// The formatted message does not fit in the telemetry buffer.
    BufferOverflow,
    /// The transport refused the message.
    Transport(TransportError),
}

impl fmt::Display for TelemetryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotAuthenticated => write!(f, "not authenticated"),
            Self::NetworkUnavailable => write!(f, "network unavailable"),
            Self::BufferOverflow => write!(f, "cannot write telemetry to buffer"),
            Self::Transport(e) => write!(f, "transport: {e}"),
        }
    }
}

impl From<TransportError> for TelemetryError {
    fn from(e: TransportError) -> Self {
        Self::Transport(e)
    }
}

// ---------------------------------------------------------------------------
// Actuator errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActuatorError {
    /// GPIO set failed.
    GpioWriteFailed(ErrorKind),
}

impl fmt::Display for ActuatorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::GpioWriteFailed(kind) => write!(f, "GPIO write failed ({kind:?})"),
        }
    }
}

// ---------------------------------------------------------------------------
// Sensor errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorError {
    /// ADC device could not be opened.
    AdcOpenFailed,
    /// ADC read returned an error or unparsable data.
    AdcReadFailed,
    /// GPIO read returned an error.
    GpioReadFailed(ErrorKind),
}

impl fmt::Display for SensorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AdcOpenFailed => write!(f, "ADC open failed"),
            Self::AdcReadFailed => write!(f, "ADC read failed"),
            Self::GpioReadFailed(kind) => write!(f, "GPIO read failed ({kind:?})"),
        }
    }
}
