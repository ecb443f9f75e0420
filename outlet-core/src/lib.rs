#![no_std]

// Shared logic for the two-outlet relay controller.
//
// Everything that makes a decision lives here so the ESP32 firmware and the
// host emulator drive identical state machines. The crate avoids the standard
// library and allocation; hardware reaches it through small driver traits.

pub mod clock;
pub mod config;
pub mod controller;
pub mod dashboard;
pub mod history;
pub mod http;
pub mod indicator;
pub mod net;
pub mod outlets;
pub mod router;
pub mod schedule;
pub mod sensor;
pub mod status;
pub mod time;
