//! Network reachability probes.
//!
//! - [`SysfsNetworkProbe`]: reachable when any non-loopback interface under
//!   `/sys/class/net` reports `operstate` `up`.
//! - [`StaticNetworkProbe`]: a switch, shared between clones, for
//!   simulation and tests.

use std::cell::Cell;
use std::path::PathBuf;
use std::rc::Rc;

use log::trace;

use crate::app::ports::NetworkProbe;

pub struct SysfsNetworkProbe {
    root: PathBuf,
}

impl Default for SysfsNetworkProbe {
    fn default() -> Self {
        Self::new("/sys/class/net")
    }
}

impl SysfsNetworkProbe {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl NetworkProbe for SysfsNetworkProbe {
    fn is_internet_reachable(&mut self) -> bool {
        let Ok(entries) = std::fs::read_dir(&self.root) else {
            return false;
        };
        entries.flatten().any(|entry| {
            if entry.file_name() == "lo" {
                return false;
            }
            let state = std::fs::read_to_string(entry.path().join("operstate")).unwrap_or_default();
            trace!("Network: {:?} is {}", entry.file_name(), state.trim());
            state.trim() == "up"
        })
    }
}

#[derive(Debug, Clone)]
pub struct StaticNetworkProbe {
    up: Rc<Cell<bool>>,
}

impl StaticNetworkProbe {
    pub fn new(up: bool) -> Self {
        Self {
            up: Rc::new(Cell::new(up)),
        }
    }

    pub fn set(&self, up: bool) {
        self.up.set(up);
    }
}

impl NetworkProbe for StaticNetworkProbe {
    fn is_internet_reachable(&mut self) -> bool {
        self.up.get()
    }
}
