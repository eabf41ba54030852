//! Application core: domain logic behind port traits.
//!
//! This module holds the rules of the device: timer dispatch, cloud
//! connection management, telemetry gating, direct methods and the
//! device twin.  All interaction with hardware, time and the IoT hub
//! happens through the **port traits** defined in [`ports`], keeping this
//! layer testable with mock adapters and a simulated clock.

pub mod commands;
pub mod events;
pub mod ports;
pub mod service;
