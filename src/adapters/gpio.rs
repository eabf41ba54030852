//! Simulated GPIO lines.
//!
//! Host stand-ins for the board pins, implementing the `embedded-hal` 1.0
//! digital traits.  Clones share the line, so the binary or a test can keep
//! a probe while a driver owns the pin.  Faults can be injected to exercise
//! the error paths.

use std::cell::Cell;
use std::rc::Rc;

use embedded_hal::digital::{ErrorKind, ErrorType, InputPin, OutputPin};
use log::trace;

/// Injected GPIO fault.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SimPinError;

impl embedded_hal::digital::Error for SimPinError {
    fn kind(&self) -> ErrorKind {
        ErrorKind::Other
    }
}

#[derive(Debug, Default)]
struct Line {
    high: Cell<bool>,
    fail: Cell<bool>,
    writes: Cell<u32>,
}

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct SimOutputPin {
    name: &'static str,
    line: Rc<Line>,
}

impl SimOutputPin {
    pub fn new(initial_high: bool) -> Self {
        Self::named("out", initial_high)
    }

    pub fn named(name: &'static str, initial_high: bool) -> Self {
        let line = Rc::new(Line::default());
        line.high.set(initial_high);
        Self { name, line }
    }

    pub fn is_high(&self) -> bool {
        self.line.high.get()
    }

    /// Successful writes so far.
    pub fn writes(&self) -> u32 {
        self.line.writes.get()
    }

    pub fn fail_writes(&self, fail: bool) {
        self.line.fail.set(fail);
    }

    fn write(&mut self, high: bool) -> Result<(), SimPinError> {
        if self.line.fail.get() {
            return Err(SimPinError);
        }
        trace!("GPIO {}: {}", self.name, if high { "high" } else { "low" });
        self.line.high.set(high);
        self.line.writes.set(self.line.writes.get() + 1);
        Ok(())
    }
}

impl ErrorType for SimOutputPin {
    type Error = SimPinError;
}

impl OutputPin for SimOutputPin {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.write(false)
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.write(true)
    }
}

// ---------------------------------------------------------------------------
// Input
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct SimInputPin {
    line: Rc<Line>,
}

impl SimInputPin {
    pub fn new(initial_high: bool) -> Self {
        let line = Rc::new(Line::default());
        line.high.set(initial_high);
        Self { line }
    }

    /// Drive the simulated line level.
    pub fn set_high(&self, high: bool) {
        self.line.high.set(high);
    }

    pub fn fail_reads(&self, fail: bool) {
        self.line.fail.set(fail);
    }

    fn read(&self) -> Result<bool, SimPinError> {
        if self.line.fail.get() {
            return Err(SimPinError);
        }
        Ok(self.line.high.get())
    }
}

impl ErrorType for SimInputPin {
    type Error = SimPinError;
}

impl InputPin for SimInputPin {
    fn is_high(&mut self) -> Result<bool, Self::Error> {
        self.read()
    }

    fn is_low(&mut self) -> Result<bool, Self::Error> {
        self.read().map(|high| !high)
    }
}
