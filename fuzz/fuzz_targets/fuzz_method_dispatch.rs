//! Fuzz target: `methods::dispatch`
//!
//! The first byte picks the method name, the rest is the payload.  Every
//! input must produce exactly one response whose body is valid JSON, and
//! a started pump run must stay inside the configured bound.
//!
//! cargo fuzz run fuzz_method_dispatch

#![no_main]

use glucolink::cloud::methods::{self, MethodAction};
use libfuzzer_sys::fuzz_target;

const MAX_MS: u32 = 60_000;

fuzz_target!(|data: &[u8]| {
    let Some((&selector, payload)) = data.split_first() else {
        return;
    };
    let name = match selector % 3 {
        0 => methods::TRIGGER_ALARM,
        1 => methods::INJECT_INSULIN,
        _ => "Unknown",
    };

    let (response, action) = methods::dispatch(name, payload, MAX_MS);
    assert!(serde_json::from_slice::<serde_json::Value>(response.body()).is_ok());
    if let MethodAction::StartPump { duration_ms } = action {
        assert!((1..=MAX_MS).contains(&duration_ms));
        assert_eq!(methods::parse_dose(payload, MAX_MS), Some(duration_ms));
    }
});
