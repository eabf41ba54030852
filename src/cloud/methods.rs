//! Direct method dispatcher.
//!
//! Maps a method name (exact match) to a local action and the response the
//! cloud receives.  The dispatcher only decides; the
//! [`AppService`](crate::app::service::AppService) performs the action and
//! may downgrade the response if the pump cannot be driven.
//!
//! | Method          | Action                      | Status | Body                     |
//! |-----------------|-----------------------------|--------|--------------------------|
//! | `TriggerAlarm`  | log alarm                   | 200    | `"Alarm Triggered"`      |
//! | `InjectInsulin` | pump on for payload ms      | 100    | `"Injecting insulin"`    |
//! | (bad dose)      | none                        | 400    | `"Invalid insulin dose"` |
//! | (pump failure)  | none                        | 500    | `"Pump unavailable"`     |
//! | anything else   | none                        | -1     | `{}`                     |

use log::{debug, warn};

pub const TRIGGER_ALARM: &str = "TriggerAlarm";
pub const INJECT_INSULIN: &str = "InjectInsulin";

pub const STATUS_ALARM_TRIGGERED: i32 = 200;
pub const STATUS_INJECTING: i32 = 100;
pub const STATUS_INVALID_DOSE: i32 = 400;
pub const STATUS_PUMP_UNAVAILABLE: i32 = 500;
pub const STATUS_UNKNOWN_METHOD: i32 = -1;

const BODY_ALARM_TRIGGERED: &str = "\"Alarm Triggered\"";
const BODY_INJECTING: &str = "\"Injecting insulin\"";
const BODY_INVALID_DOSE: &str = "\"Invalid insulin dose\"";
const BODY_PUMP_UNAVAILABLE: &str = "\"Pump unavailable\"";
const BODY_UNKNOWN_METHOD: &str = "{}";

/// Response to a direct method.
///
/// The body is allocated to exactly the length of the response text, with
/// no terminator.  Ownership moves to the transport through
/// [`CloudTransport::complete_method`](crate::app::ports::CloudTransport::complete_method).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodResponse {
    status: i32,
    body: Box<[u8]>,
}

impl MethodResponse {
    pub fn new(status: i32, body: &str) -> Self {
        Self {
            status,
            body: Box::from(body.as_bytes()),
        }
    }

    /// Answer for an InjectInsulin that could not drive the pump.
    pub fn pump_unavailable() -> Self {
        Self::new(STATUS_PUMP_UNAVAILABLE, BODY_PUMP_UNAVAILABLE)
    }

    pub fn status(&self) -> i32 {
        self.status
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    pub fn into_parts(self) -> (i32, Box<[u8]>) {
        (self.status, self.body)
    }
}

/// Local work a method asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MethodAction {
    None,
    Alarm,
    StartPump { duration_ms: u32 },
}

/// Decide the action and response for method `name`.
pub fn dispatch(name: &str, payload: &[u8], max_pump_ms: u32) -> (MethodResponse, MethodAction) {
    match name {
        TRIGGER_ALARM => {
            warn!("  ----- ALARM TRIGGERED! -----");
            (
                MethodResponse::new(STATUS_ALARM_TRIGGERED, BODY_ALARM_TRIGGERED),
                MethodAction::Alarm,
            )
        }
        INJECT_INSULIN => match parse_dose(payload, max_pump_ms) {
            Some(duration_ms) => (
                MethodResponse::new(STATUS_INJECTING, BODY_INJECTING),
                MethodAction::StartPump { duration_ms },
            ),
            None => {
                warn!(
                    "Methods: rejected insulin dose {:?}",
                    String::from_utf8_lossy(payload)
                );
                (
                    MethodResponse::new(STATUS_INVALID_DOSE, BODY_INVALID_DOSE),
                    MethodAction::None,
                )
            }
        },
        other => {
            debug!("Methods: unknown method '{}'", other);
            (
                MethodResponse::new(STATUS_UNKNOWN_METHOD, BODY_UNKNOWN_METHOD),
                MethodAction::None,
            )
        }
    }
}

/// Parse an InjectInsulin payload: a pump duration in milliseconds, as a
/// bare JSON number or a JSON string.  Returns `None` for zero, anything
/// above `max_ms`, or anything that is not a plain decimal count.
pub fn parse_dose(payload: &[u8], max_ms: u32) -> Option<u32> {
    let text = core::str::from_utf8(payload).ok()?.trim();
    let text = text
        .strip_prefix('"')
        .and_then(|t| t.strip_suffix('"'))
        .unwrap_or(text)
        .trim();
    if text.is_empty() || !text.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let value: u32 = text.parse().ok()?;
    (1..=max_ms).contains(&value).then_some(value)
}
