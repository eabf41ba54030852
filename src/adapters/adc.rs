//! Linux IIO ADC sensor.
//!
//! Reads `in_voltageN_raw` from an IIO device directory and scales the
//! sample to volts.  The file is re-read on every poll.

use std::path::{Path, PathBuf};

use log::{error, info};

use crate::app::ports::SensorPort;
use crate::error::SensorError;
use crate::sensors::raw_to_voltage;

pub struct IioAdcSensor {
    raw_path: PathBuf,
    bits: u8,
    reference_volts: f32,
}

impl IioAdcSensor {
    /// Check the channel is readable and the scaling is valid.
    pub fn open(raw_path: &Path, bits: u8, reference_volts: f32) -> Result<Self, SensorError> {
        raw_to_voltage(0, bits, reference_volts)?;
        let sensor = Self {
            raw_path: raw_path.to_path_buf(),
            bits,
            reference_volts,
        };
        sensor.read_raw().map_err(|_| {
            error!("ADC: cannot open {}", raw_path.display());
            SensorError::AdcOpenFailed
        })?;
        info!(
            "ADC: {} ({}-bit, {:.2} V reference)",
            raw_path.display(),
            bits,
            reference_volts
        );
        Ok(sensor)
    }

    fn read_raw(&self) -> Result<u32, SensorError> {
        let text =
            std::fs::read_to_string(&self.raw_path).map_err(|_| SensorError::AdcReadFailed)?;
        text.trim().parse().map_err(|_| SensorError::AdcReadFailed)
    }
}

impl SensorPort for IioAdcSensor {
    fn read_glucose(&mut self) -> Result<f32, SensorError> {
        let raw = self.read_raw()?;
        raw_to_voltage(raw, self.bits, self.reference_volts)
    }
}
