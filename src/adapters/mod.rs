//! Adapters: concrete implementations of the hexagonal port traits.
//!
//! | Adapter    | Implements                    | Connects to                 |
//! |------------|-------------------------------|-----------------------------|
//! | `adc`      | SensorPort                    | Linux IIO ADC channel       |
//! | `gpio`     | embedded-hal digital pins     | Simulated lines             |
//! | `hardware` | SensorPort, ButtonPort,       | Drivers + sensor + probe    |
//! |            | ActuatorPort, StatusLedPort,  |                             |
//! |            | NetworkProbe                  |                             |
//! | `log_sink` | EventSink                     | `log` facade                |
//! | `network`  | NetworkProbe                  | `/sys/class/net`, or static |
//! | `sim_hub`  | CloudTransport                | Simulated IoT hub           |
//! | `time`     | Clock                         | `Instant`, or simulated     |

pub mod adc;
pub mod gpio;
pub mod hardware;
pub mod log_sink;
pub mod network;
pub mod sim_hub;
pub mod time;
