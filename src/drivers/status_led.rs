//! Status LED (active low).
//!
//! Mirrors the `StatusLED` desired twin property.  The LED is lit when the
//! pin is driven low.

use embedded_hal::digital::{Error as _, OutputPin, PinState};

use crate::error::ActuatorError;

pub struct StatusLed<P: OutputPin> {
    pin: P,
    on: bool,
}

impl<P: OutputPin> StatusLed<P> {
    /// Take the pin and switch the LED off.
    pub fn new(mut pin: P) -> Result<Self, ActuatorError> {
        pin.set_high()
            .map_err(|e| ActuatorError::GpioWriteFailed(e.kind()))?;
        Ok(Self { pin, on: false })
    }

    pub fn set(&mut self, on: bool) -> Result<(), ActuatorError> {
        self.pin
            .set_state(PinState::from(!on))
            .map_err(|e| ActuatorError::GpioWriteFailed(e.kind()))?;
        self.on = on;
        Ok(())
    }

    pub fn is_on(&self) -> bool {
        self.on
    }
}
