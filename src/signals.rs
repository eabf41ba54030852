//! Termination-signal flag.
//!
//! The only thing that runs in signal context is `signal-hook`'s flag
//! store; everything else (logging, teardown) happens in the main loop
//! after it observes the flag.

use std::io;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use signal_hook::consts::{SIGINT, SIGTERM};

/// Shared exit flag, set by SIGTERM/SIGINT or by [`request`](Self::request).
#[derive(Debug, Clone, Default)]
pub struct ShutdownFlag(Arc<AtomicBool>);

impl ShutdownFlag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install SIGTERM and SIGINT handlers that set this flag.
    pub fn register_termination(&self) -> io::Result<()> {
        signal_hook::flag::register(SIGTERM, Arc::clone(&self.0))?;
        signal_hook::flag::register(SIGINT, Arc::clone(&self.0))?;
        Ok(())
    }

    /// Set the flag from ordinary code (tests, simulated signals).
    pub fn request(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_requested(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}
