//! Insulin pump output.
//!
//! A single digital line, active high: high runs the pump, low stops it.
//! Timing lives in the application service (one-shot shutoff timer); this
//! driver is a dumb actuator that remembers the last level it wrote.

use embedded_hal::digital::{Error as _, OutputPin, PinState};

use crate::error::ActuatorError;

pub struct PumpDriver<P: OutputPin> {
    pin: P,
    active: bool,
}

impl<P: OutputPin> PumpDriver<P> {
    /// Take the pin and drive it low.
    pub fn new(mut pin: P) -> Result<Self, ActuatorError> {
        pin.set_low()
            .map_err(|e| ActuatorError::GpioWriteFailed(e.kind()))?;
        Ok(Self { pin, active: false })
    }

    pub fn set_active(&mut self, active: bool) -> Result<(), ActuatorError> {
        self.pin
            .set_state(PinState::from(active))
            .map_err(|e| ActuatorError::GpioWriteFailed(e.kind()))?;
        self.active = active;
        Ok(())
    }

    pub fn is_active(&self) -> bool {
        self.active
    }
}
