//! Fuzz target: `twin::parse_desired`
//!
//! Arbitrary bytes as both complete documents and partial patches.  The
//! parser may reject them but must never panic.
//!
//! cargo fuzz run fuzz_twin_patch

#![no_main]

use glucolink::cloud::twin::{self, TwinUpdateKind};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    for kind in [TwinUpdateKind::Complete, TwinUpdateKind::Partial] {
        if let Ok(desired) = twin::parse_desired(kind, data) {
            if let Some(on) = desired.status_led {
                assert!(twin::status_led_report(on).is_ok());
            }
        }
    }
});
