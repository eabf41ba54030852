//! glucolink device library.
//!
//! A timer-driven device application that reports a glucose reading to a
//! cloud IoT hub and drives an insulin pump on command.  The library holds
//! the whole application core plus host adapters; `main.rs` only parses
//! the configuration and wires adapters to [`app::service::AppService`].
//!
//! ```text
//!  scheduler ──▶ app::service ──▶ cloud::{connection, telemetry, methods, twin}
//!                     │
//!                     ▼
//!               app::ports ◀── adapters ──▶ drivers, sensors
//! ```

#![deny(unused_must_use)]

pub mod adapters;
pub mod app;
pub mod cloud;
pub mod config;
pub mod drivers;
pub mod error;
pub mod scheduler;
pub mod sensors;
pub mod signals;
