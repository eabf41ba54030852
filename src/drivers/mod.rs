//! Digital I/O drivers, written against the `embedded-hal` 1.0 traits.

pub mod button;
pub mod pump;
pub mod status_led;
