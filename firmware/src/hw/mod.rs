//! Board adapters implementing the `outlet-core` driver traits.

use core::time::Duration;

use embassy_time::Instant;
use esp_hal::gpio::{Level, Output};
use outlet_core::indicator::{IndicatorDriver, IndicatorLines};
use outlet_core::outlets::{OutletDriver, OutletId, OutletLevel};
use outlet_core::time::MonotonicInstant;

mod adc;

pub use adc::PacedInput;

/// Monotonic timestamp backed by the embassy time driver.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct FirmwareInstant(Instant);

impl FirmwareInstant {
    pub fn now() -> Self {
        Self(Instant::now())
    }

    pub fn as_millis(self) -> u64 {
        self.0.as_millis()
    }
}

impl From<Instant> for FirmwareInstant {
    fn from(instant: Instant) -> Self {
        Self(instant)
    }
}

impl MonotonicInstant for FirmwareInstant {
    fn saturating_duration_since(&self, earlier: Self) -> Duration {
        Duration::from_micros(self.0.saturating_duration_since(earlier.0).as_micros())
    }
}

/// Active-high relay coils for the two outlets.
pub struct RelayOutputs<'d> {
    outlet1: Output<'d>,
    outlet2: Output<'d>,
}

impl<'d> RelayOutputs<'d> {
    pub fn new(outlet1: Output<'d>, outlet2: Output<'d>) -> Self {
        Self { outlet1, outlet2 }
    }
}

impl OutletDriver for RelayOutputs<'_> {
    fn drive(&mut self, outlet: OutletId, level: OutletLevel) {
        let pin = match outlet {
            OutletId::One => &mut self.outlet1,
            OutletId::Two => &mut self.outlet2,
        };
        pin.set_level(Level::from(level.is_on()));
    }
}

/// Green / yellow / red status LEDs, lit when driven high.
pub struct IndicatorLeds<'d> {
    ready: Output<'d>,
    idle: Output<'d>,
    error: Output<'d>,
}

impl<'d> IndicatorLeds<'d> {
    pub fn new(ready: Output<'d>, idle: Output<'d>, error: Output<'d>) -> Self {
        Self { ready, idle, error }
    }
}

impl IndicatorDriver for IndicatorLeds<'_> {
    fn write_lines(&mut self, lines: IndicatorLines) {
        self.ready.set_level(Level::from(lines.ready));
        self.idle.set_level(Level::from(lines.idle));
        self.error.set_level(Level::from(lines.error));
    }
}
