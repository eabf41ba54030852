//! Clock adapters.
//!
//! - [`MonotonicClock`]: `std::time::Instant` based; waits by sleeping in
//!   short slices so a raised termination flag is noticed promptly.
//! - [`SimClock`]: simulated time for tests and dry runs; a wait jumps
//!   straight to the deadline.  Clones share the same time, so a test can
//!   keep a copy while the scheduler owns the original.

use std::cell::Cell;
use std::rc::Rc;
use std::time::{Duration, Instant};

use crate::app::ports::{Clock, WaitOutcome};
use crate::error::SchedulerError;
use crate::signals::ShutdownFlag;

/// Longest single sleep while waiting for a deadline or the exit flag.
const WAIT_SLICE: Duration = Duration::from_millis(20);

/// Host monotonic clock.
pub struct MonotonicClock {
    start: Instant,
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }
}

impl Clock for MonotonicClock {
    fn now(&self) -> Duration {
        self.start.elapsed()
    }

    fn wait_until(
        &mut self,
        deadline: Option<Duration>,
        shutdown: &ShutdownFlag,
    ) -> Result<WaitOutcome, SchedulerError> {
        loop {
            if shutdown.is_requested() {
                return Ok(WaitOutcome::Interrupted);
            }
            let slice = match deadline {
                Some(deadline) => {
                    let now = self.now();
                    if now >= deadline {
                        return Ok(WaitOutcome::Elapsed);
                    }
                    (deadline - now).min(WAIT_SLICE)
                }
                // Nothing armed: only a signal can end the wait.
                None => WAIT_SLICE,
            };
            std::thread::sleep(slice);
        }
    }
}

/// Simulated clock.
#[derive(Debug, Clone, Default)]
pub struct SimClock {
    now: Rc<Cell<Duration>>,
}

impl SimClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Move time forward without dispatching anything.
    pub fn advance(&self, by: Duration) {
        self.now.set(self.now.get() + by);
    }
}

impl Clock for SimClock {
    fn now(&self) -> Duration {
        self.now.get()
    }

    fn wait_until(
        &mut self,
        deadline: Option<Duration>,
        shutdown: &ShutdownFlag,
    ) -> Result<WaitOutcome, SchedulerError> {
        if shutdown.is_requested() {
            return Ok(WaitOutcome::Interrupted);
        }
        let deadline = deadline.ok_or(SchedulerError::Stalled)?;
        if deadline > self.now.get() {
            self.now.set(deadline);
        }
        Ok(WaitOutcome::Elapsed)
    }
}
