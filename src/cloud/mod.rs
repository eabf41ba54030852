//! Cloud-facing domain logic.
//!
//! Everything here is pure: the modules decide *what* to send and *when*,
//! the [`CloudTransport`](crate::app::ports::CloudTransport) port does the
//! sending.
//!
//! | Module       | Concern                                              |
//! |--------------|------------------------------------------------------|
//! | `connection` | authentication state machine and poll backoff        |
//! | `telemetry`  | state-gated, fixed-buffer telemetry messages         |
//! | `methods`    | direct method name → local action + response         |
//! | `twin`       | desired `StatusLED`, reported device identity        |

pub mod connection;
pub mod methods;
pub mod telemetry;
pub mod twin;
