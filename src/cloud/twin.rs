//! Device twin documents.
//!
//! Inbound: the `StatusLED` desired property, taken either from a complete
//! twin document (`{"desired": {...}, "reported": {...}}`) or from a bare
//! desired-properties patch.  Outbound: reported-property patches for the
//! static device identity and the applied LED state.

use serde::{Deserialize, Serialize};

/// Shape of a twin update delivered by the transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TwinUpdateKind {
    /// Full document with `desired` and `reported` sections.
    Complete,
    /// Desired-properties patch only.
    Partial,
}

/// Desired properties this device understands.  Unknown keys are ignored.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct DesiredProperties {
    #[serde(rename = "StatusLED")]
    pub status_led: Option<bool>,
    #[serde(rename = "$version")]
    pub version: Option<u64>,
}

#[derive(Deserialize)]
struct CompleteTwin {
    #[serde(default)]
    desired: DesiredProperties,
}

/// Extract the desired properties from a twin update payload.
pub fn parse_desired(
    kind: TwinUpdateKind,
    payload: &[u8],
) -> Result<DesiredProperties, serde_json::Error> {
    match kind {
        TwinUpdateKind::Complete => {
            serde_json::from_slice::<CompleteTwin>(payload).map(|twin| twin.desired)
        }
        TwinUpdateKind::Partial => serde_json::from_slice(payload),
    }
}

/// Static identity reported once per successful authentication.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceIdentity {
    #[serde(rename = "DeviceManufacturer")]
    pub manufacturer: String,
    #[serde(rename = "DeviceModel")]
    pub model: String,
    #[serde(rename = "SerialNumber")]
    pub serial_number: String,
    #[serde(rename = "FirmwareVersion")]
    pub firmware_version: String,
}

impl Default for DeviceIdentity {
    fn default() -> Self {
        Self {
            manufacturer: "Group Romeo".into(),
            model: "GlucoLink".into(),
            serial_number: "GL-000001".into(),
            firmware_version: env!("CARGO_PKG_VERSION").into(),
        }
    }
}

impl DeviceIdentity {
    /// Reported-properties patch for the identity.
    pub fn to_report(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }
}

#[derive(Serialize)]
struct StatusLedReport {
    #[serde(rename = "StatusLED")]
    status_led: bool,
}

/// Reported-properties patch acknowledging the LED state.
pub fn status_led_report(on: bool) -> Result<Vec<u8>, serde_json::Error> {
    serde_json::to_vec(&StatusLedReport { status_led: on })
}
