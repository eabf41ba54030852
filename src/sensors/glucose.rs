//! Glucose reading sources.
//!
//! ## Simulation
//!
//! Each read moves the value by a random step in `[-0.5, +0.5]`, drawn as
//! one of 41 evenly spaced values (`k / 40 - 0.5`, `k` in `0..=40`).
//!
//! ## ADC scaling
//!
//! A raw sample from an `n`-bit converter maps linearly onto
//! `[0, reference]` volts, full scale being `2^n - 1`.

use crate::app::ports::SensorPort;
use crate::error::SensorError;

/// Random-walk glucose simulator.
pub struct SimulatedGlucoseSensor {
    rng: fastrand::Rng,
    value: f32,
    reads: u32,
}

impl SimulatedGlucoseSensor {
    pub fn new(seed: u64, start: f32) -> Self {
        Self {
            rng: fastrand::Rng::with_seed(seed),
            value: start,
            reads: 0,
        }
    }

    /// Last value produced.
    pub fn value(&self) -> f32 {
        self.value
    }

    pub fn reads(&self) -> u32 {
        self.reads
    }

    fn step(&mut self) -> f32 {
        self.rng.u32(0..=40) as f32 / 40.0 - 0.5
    }
}

impl SensorPort for SimulatedGlucoseSensor {
    fn read_glucose(&mut self) -> Result<f32, SensorError> {
        self.value += self.step();
        self.reads += 1;
        Ok(self.value)
    }
}

/// Convert a raw ADC sample to volts.
///
/// Samples above full scale are clamped.  A zero or oversized bit count
/// is a configuration error.
pub fn raw_to_voltage(raw: u32, bits: u8, reference_volts: f32) -> Result<f32, SensorError> {
    if bits == 0 || bits > 24 {
        return Err(SensorError::AdcOpenFailed);
    }
    let full_scale = (1u32 << bits) - 1;
    Ok(raw.min(full_scale) as f32 * reference_volts / full_scale as f32)
}
