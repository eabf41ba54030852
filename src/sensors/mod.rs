//! Sensor subsystem.
//!
//! Only one analog input exists on this device: the reading reported to
//! the cloud as `Glucose`.  It comes either from a simulated random walk or
//! from an ADC channel scaled to volts (see
//! [`IioAdcSensor`](crate::adapters::adc::IioAdcSensor)).

pub mod glucose;

pub use glucose::{raw_to_voltage, SimulatedGlucoseSensor};
