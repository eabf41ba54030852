//! Push button input and press-edge detection.
//!
//! Active-low momentary switch with a pull-up: the line reads low while
//! the button is held.  The button poll timer samples it every tick and
//! [`PressDetector`] turns the samples into press events.
//!
//! | Previous | Sample   | Result      |
//! |----------|----------|-------------|
//! | released | pressed  | press event |
//! | pressed  | pressed  | nothing     |
//! | any      | released | nothing     |

use embedded_hal::digital::{Error as _, InputPin};

use crate::error::SensorError;

/// Button line reader.
pub struct ButtonInput<P: InputPin> {
    pin: P,
}

impl<P: InputPin> ButtonInput<P> {
    pub fn new(pin: P) -> Self {
        Self { pin }
    }

    pub fn is_pressed(&mut self) -> Result<bool, SensorError> {
        self.pin
            .is_low()
            .map_err(|e| SensorError::GpioReadFailed(e.kind()))
    }
}

/// Released → pressed edge detector.
#[derive(Debug, Default)]
pub struct PressDetector {
    pressed: bool,
}

impl PressDetector {
    pub const fn new() -> Self {
        Self { pressed: false }
    }

    /// Feed one sample; returns `true` on the press edge only.
    pub fn update(&mut self, pressed: bool) -> bool {
        let edge = pressed && !self.pressed;
        self.pressed = pressed;
        edge
    }

    pub fn is_pressed(&self) -> bool {
        self.pressed
    }
}
