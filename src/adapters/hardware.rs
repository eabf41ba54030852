//! Hardware adapter. Bridges the board to the domain port traits.
//!
//! Owns the pump, status LED and button drivers plus the configured sensor
//! and network probe, exposing them through the hardware ports.  Pin types
//! are generic so the same adapter runs on real `embedded-hal` pins or on
//! the simulated ones in [`gpio`](super::gpio).

use embedded_hal::digital::{InputPin, OutputPin};

use crate::app::ports::{
    ActuatorPort, ButtonPort, NetworkProbe, SensorPort, StatusLedPort,
};
use crate::drivers::button::ButtonInput;
use crate::drivers::pump::PumpDriver;
use crate::drivers::status_led::StatusLed;
use crate::error::{ActuatorError, SensorError};

/// Concrete adapter that combines all hardware behind port traits.
pub struct HardwareAdapter<PumpPin: OutputPin, LedPin: OutputPin, ButtonPin: InputPin> {
    pump: PumpDriver<PumpPin>,
    led: StatusLed<LedPin>,
    button: ButtonInput<ButtonPin>,
    sensor: Box<dyn SensorPort>,
    network: Box<dyn NetworkProbe>,
}

impl<PumpPin, LedPin, ButtonPin> HardwareAdapter<PumpPin, LedPin, ButtonPin>
where
    PumpPin: OutputPin,
    LedPin: OutputPin,
    ButtonPin: InputPin,
{
    pub fn new(
        pump: PumpDriver<PumpPin>,
        led: StatusLed<LedPin>,
        button: ButtonInput<ButtonPin>,
        sensor: Box<dyn SensorPort>,
        network: Box<dyn NetworkProbe>,
    ) -> Self {
        Self {
            pump,
            led,
            button,
            sensor,
            network,
        }
    }

    pub fn is_led_on(&self) -> bool {
        self.led.is_on()
    }
}

// ── SensorPort / ButtonPort ───────────────────────────────────

impl<PumpPin: OutputPin, LedPin: OutputPin, ButtonPin: InputPin> SensorPort
    for HardwareAdapter<PumpPin, LedPin, ButtonPin>
{
    fn read_glucose(&mut self) -> Result<f32, SensorError> {
        self.sensor.read_glucose()
    }
}

impl<PumpPin: OutputPin, LedPin: OutputPin, ButtonPin: InputPin> ButtonPort
    for HardwareAdapter<PumpPin, LedPin, ButtonPin>
{
    fn is_pressed(&mut self) -> Result<bool, SensorError> {
        self.button.is_pressed()
    }
}

// ── ActuatorPort / StatusLedPort ──────────────────────────────

impl<PumpPin: OutputPin, LedPin: OutputPin, ButtonPin: InputPin> ActuatorPort
    for HardwareAdapter<PumpPin, LedPin, ButtonPin>
{
    fn set_active(&mut self, active: bool) -> Result<(), ActuatorError> {
        self.pump.set_active(active)
    }

    fn is_active(&self) -> bool {
        self.pump.is_active()
    }
}

impl<PumpPin: OutputPin, LedPin: OutputPin, ButtonPin: InputPin> StatusLedPort
    for HardwareAdapter<PumpPin, LedPin, ButtonPin>
{
    fn set_status_led(&mut self, on: bool) -> Result<(), ActuatorError> {
        self.led.set(on)
    }
}

// ── NetworkProbe ──────────────────────────────────────────────

impl<PumpPin: OutputPin, LedPin: OutputPin, ButtonPin: InputPin> NetworkProbe
    for HardwareAdapter<PumpPin, LedPin, ButtonPin>
{
    fn is_internet_reachable(&mut self) -> bool {
        self.network.is_internet_reachable()
    }
}
