//! System configuration parameters
//!
//! All tunable parameters for the glucolink device.  Values come from an
//! optional JSON file (`--config`) and are then overridden by the
//! connection arguments the device application has always accepted
//! (`--ConnectionType`, `--ScopeID`, `--Hostname`, `--IoTEdgeRootCAPath`).

use std::fs::File;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use anyhow::Context;
use core::fmt;
use serde::{Deserialize, Serialize};

use crate::cloud::twin::DeviceIdentity;
use crate::error::ExitCode;

/// Largest IoT Edge root CA certificate accepted, in bytes.
pub const MAX_ROOT_CA_CERT_BYTES: u64 = 4096;

// ---------------------------------------------------------------------------
// Connection settings
// ---------------------------------------------------------------------------

/// How the device reaches its IoT hub.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConnectionType {
    #[default]
    NotDefined,
    /// Device provisioning service, addressed by scope id.
    #[serde(rename = "DPS")]
    Dps,
    /// Straight to the hub hostname.
    Direct,
    /// Through an IoT Edge gateway trusted by a root CA certificate.
    IoTEdge,
}

impl ConnectionType {
    fn parse(value: &str) -> Result<Self, ConfigError> {
        match value {
            "DPS" => Ok(Self::Dps),
            "Direct" => Ok(Self::Direct),
            "IoTEdge" => Ok(Self::IoTEdge),
            other => Err(ConfigError::InvalidConnectionType(other.to_string())),
        }
    }
}

/// Everything the transport needs to create a client.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectionSettings {
    pub connection_type: ConnectionType,
    pub scope_id: Option<String>,
    pub hostname: Option<String>,
    pub edge_root_ca_path: Option<PathBuf>,
    /// PEM contents of the IoT Edge root CA, loaded at startup.
    #[serde(skip)]
    pub edge_root_ca: Option<String>,
}

// ---------------------------------------------------------------------------
// Adapter selection
// ---------------------------------------------------------------------------

/// Where glucose readings come from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SensorSource {
    /// Random walk around a starting value.
    Simulated { seed: u64, start: f32 },
    /// Linux IIO ADC channel (`in_voltageN_raw`), scaled to volts.
    IioAdc {
        raw_path: PathBuf,
        bits: u8,
        reference_volts: f32,
    },
}

impl Default for SensorSource {
    fn default() -> Self {
        Self::Simulated {
            seed: 0x5EED,
            start: 5.0,
        }
    }
}

/// How internet reachability is decided.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NetworkSource {
    /// Always reachable.
    #[default]
    Always,
    /// Any non-loopback interface under `/sys/class/net` is up.
    Sysfs,
}

/// A scripted cloud-side action replayed by the simulated hub.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ScriptedAction {
    /// Invoke a direct method.
    Method {
        after_polls: u32,
        name: String,
        payload: String,
    },
    /// Push a desired-properties patch.
    DesiredPatch { after_polls: u32, patch: String },
}

impl ScriptedAction {
    /// Work passes after authentication before the action is delivered.
    pub fn after_polls(&self) -> u32 {
        match self {
            Self::Method { after_polls, .. } | Self::DesiredPatch { after_polls, .. } => {
                *after_polls
            }
        }
    }
}

/// Behaviour of the simulated IoT hub used by the host binary.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulatedHubConfig {
    /// Connection attempts that fail before one succeeds.
    pub failed_attempts: u32,
    /// Work passes between `begin_connect` and the authentication result.
    pub auth_latency_polls: u32,
    pub script: Vec<ScriptedAction>,
}

// ---------------------------------------------------------------------------
// System configuration
// ---------------------------------------------------------------------------

/// Core system configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SystemConfig {
    pub connection: ConnectionSettings,
    /// Reported to the device twin after authentication.
    pub identity: DeviceIdentity,

    // --- Cloud poll ---
    /// Cloud maintenance/telemetry period while healthy (seconds)
    pub default_poll_period_secs: u32,
    /// First retry period after a failure (seconds)
    pub min_backoff_secs: u32,
    /// Retry period cap (seconds)
    pub max_backoff_secs: u32,

    // --- Button ---
    /// Button poll interval (milliseconds)
    pub button_poll_interval_ms: u32,

    // --- Pump ---
    /// Longest accepted InjectInsulin duration (milliseconds)
    pub max_pump_duration_ms: u32,

    // --- Adapters ---
    pub sensor: SensorSource,
    pub network: NetworkSource,
    pub hub: SimulatedHubConfig,
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            connection: ConnectionSettings::default(),
            identity: DeviceIdentity::default(),

            default_poll_period_secs: 1,
            min_backoff_secs: 60,
            max_backoff_secs: 10 * 60,

            button_poll_interval_ms: 1,

            max_pump_duration_ms: 60_000,

            sensor: SensorSource::default(),
            network: NetworkSource::default(),
            hub: SimulatedHubConfig::default(),
        }
    }
}

impl SystemConfig {
    /// Read a JSON config file.  Missing fields take their defaults.
    pub fn load_file(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path.display()))?;
        serde_json::from_str(&text)
            .with_context(|| format!("parsing config file {}", path.display()))
    }

    /// Apply command-line connection overrides.
    pub fn apply(&mut self, cli: CommandLine) {
        if let Some(kind) = cli.connection_type {
            self.connection.connection_type = kind;
        }
        if cli.scope_id.is_some() {
            self.connection.scope_id = cli.scope_id;
        }
        if cli.hostname.is_some() {
            self.connection.hostname = cli.hostname;
        }
        if cli.edge_root_ca_path.is_some() {
            self.connection.edge_root_ca_path = cli.edge_root_ca_path;
        }
    }

    /// Check that the connection settings are complete for the chosen
    /// connection type and that the poll timings are coherent.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let conn = &self.connection;
        let present = |v: &Option<String>| v.as_deref().is_some_and(|s| !s.is_empty());

        match conn.connection_type {
            ConnectionType::NotDefined => return Err(ConfigError::MissingConnectionType),
            ConnectionType::Dps => {
                if !present(&conn.scope_id) {
                    return Err(ConfigError::MissingScopeId);
                }
            }
            ConnectionType::Direct => {
                if !present(&conn.hostname) {
                    return Err(ConfigError::MissingHostname);
                }
            }
            ConnectionType::IoTEdge => {
                if !present(&conn.hostname) {
                    return Err(ConfigError::MissingHostname);
                }
                if conn.edge_root_ca_path.is_none() {
                    return Err(ConfigError::MissingEdgeCaPath);
                }
            }
        }

        if self.default_poll_period_secs == 0 {
            return Err(ConfigError::InvalidTiming("poll period must be non-zero"));
        }
        if self.min_backoff_secs < self.default_poll_period_secs
            || self.max_backoff_secs < self.min_backoff_secs
        {
            return Err(ConfigError::InvalidTiming(
                "expected default poll <= min backoff <= max backoff",
            ));
        }
        if self.button_poll_interval_ms == 0 {
            return Err(ConfigError::InvalidTiming("button poll must be non-zero"));
        }
        Ok(())
    }

    /// Read the IoT Edge root CA certificate when the connection needs one.
    pub fn load_edge_root_ca(&mut self) -> Result<(), ConfigError> {
        if self.connection.connection_type != ConnectionType::IoTEdge {
            return Ok(());
        }
        let path = self
            .connection
            .edge_root_ca_path
            .as_ref()
            .ok_or(ConfigError::MissingEdgeCaPath)?;

        let mut file = File::open(path).map_err(|e| ConfigError::EdgeCaOpen(e.kind()))?;
        let size = file
            .metadata()
            .map_err(|e| ConfigError::EdgeCaRead(e.kind()))?
            .len();
        if size == 0 || size > MAX_ROOT_CA_CERT_BYTES {
            return Err(ConfigError::EdgeCaSize(size));
        }

        let mut pem = String::with_capacity(size as usize);
        file.read_to_string(&mut pem)
            .map_err(|e| ConfigError::EdgeCaRead(e.kind()))?;
        self.connection.edge_root_ca = Some(pem);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Command line
// ---------------------------------------------------------------------------

/// Parsed command-line arguments.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandLine {
    pub config_file: Option<PathBuf>,
    pub connection_type: Option<ConnectionType>,
    pub scope_id: Option<String>,
    pub hostname: Option<String>,
    pub edge_root_ca_path: Option<PathBuf>,
}

impl CommandLine {
    /// Parse arguments (without the program name).
    pub fn parse<I>(args: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = String>,
    {
        let mut cli = Self::default();
        let mut args = args.into_iter();

        while let Some(flag) = args.next() {
            let mut value = || {
                args.next()
                    .ok_or_else(|| ConfigError::MissingValue(flag.clone()))
            };
            match flag.as_str() {
                "--config" => cli.config_file = Some(PathBuf::from(value()?)),
                "-c" | "--ConnectionType" => {
                    cli.connection_type = Some(ConnectionType::parse(&value()?)?);
                }
                "-s" | "--ScopeID" => cli.scope_id = Some(value()?),
                "-h" | "--Hostname" => cli.hostname = Some(value()?),
                "-i" | "--IoTEdgeRootCAPath" => {
                    cli.edge_root_ca_path = Some(PathBuf::from(value()?));
                }
                _ => return Err(ConfigError::UnknownArgument(flag)),
            }
        }
        Ok(cli)
    }
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Startup configuration failures.  All of them are fatal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    UnknownArgument(String),
    MissingValue(String),
    InvalidConnectionType(String),
    MissingConnectionType,
    MissingScopeId,
    MissingHostname,
    MissingEdgeCaPath,
    InvalidTiming(&'static str),
    EdgeCaOpen(io::ErrorKind),
    EdgeCaSize(u64),
    EdgeCaRead(io::ErrorKind),
}

impl ConfigError {
    /// Exit code reported for this failure.
    pub fn exit_code(&self) -> ExitCode {
        match self {
            Self::UnknownArgument(_) | Self::MissingValue(_) => ExitCode::ParseArguments,
            Self::InvalidConnectionType(_) | Self::MissingConnectionType => {
                ExitCode::ValidateConnectionType
            }
            Self::MissingScopeId => ExitCode::ValidateScopeId,
            Self::MissingHostname => ExitCode::ValidateHostname,
            Self::MissingEdgeCaPath => ExitCode::ValidateIoTEdgeCaPath,
            Self::InvalidTiming(_) => ExitCode::ValidateTiming,
            Self::EdgeCaOpen(_) => ExitCode::IoTEdgeRootCaOpen,
            Self::EdgeCaSize(_) => ExitCode::IoTEdgeRootCaFileSize,
            Self::EdgeCaRead(_) => ExitCode::IoTEdgeRootCaRead,
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownArgument(a) => write!(f, "unknown argument '{a}'"),
            Self::MissingValue(a) => write!(f, "missing value for '{a}'"),
            Self::InvalidConnectionType(v) => {
                write!(f, "connection type '{v}' is not DPS, Direct or IoTEdge")
            }
            Self::MissingConnectionType => write!(f, "connection type is not set"),
            Self::MissingScopeId => write!(f, "DPS connection requires a scope id"),
            Self::MissingHostname => write!(f, "connection requires a hostname"),
            Self::MissingEdgeCaPath => write!(f, "IoT Edge connection requires a root CA path"),
            Self::InvalidTiming(why) => write!(f, "invalid timing: {why}"),
            Self::EdgeCaOpen(kind) => write!(f, "cannot open IoT Edge root CA ({kind})"),
            Self::EdgeCaSize(size) => write!(
                f,
                "IoT Edge root CA is {size} bytes (expected 1..={MAX_ROOT_CA_CERT_BYTES})"
            ),
            Self::EdgeCaRead(kind) => write!(f, "cannot read IoT Edge root CA ({kind})"),
        }
    }
}
