//! Rolling log of current/power samples.
//!
//! Readings are quantised when they are recorded, not when they are rendered:
//! current is floored to four decimals and power to two, and the truncated
//! values are what the log stores. Both are kept as fixed-point integers so the
//! firmware never formats floats.

use core::fmt;

use heapless::{HistoryBuf, Vec};

use crate::clock::{ClockState, ClockText};
use crate::config::{ControllerConfig, HISTORY_CAPACITY};
use crate::outlets::OutletSnapshot;

/// Current in units of 10⁻⁴ A.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Amperes(u32);

impl Amperes {
    pub const ZERO: Self = Self(0);
    pub const SCALE: u32 = 10_000;

    #[must_use]
    pub const fn from_raw(ten_thousandths: u32) -> Self {
        Self(ten_thousandths)
    }

    #[must_use]
    pub const fn raw(self) -> u32 {
        self.0
    }

    /// Floors `amps` to four decimals.
    #[must_use]
    pub fn truncate(amps: f32) -> Self {
        Self(floor_scaled(amps, Self::SCALE))
    }
}

impl fmt::Display for Amperes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:04}", self.0 / Self::SCALE, self.0 % Self::SCALE)
    }
}

/// Power in units of 10⁻² W.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Watts(u32);

impl Watts {
    pub const ZERO: Self = Self(0);
    pub const SCALE: u32 = 100;

    #[must_use]
    pub const fn from_raw(hundredths: u32) -> Self {
        Self(hundredths)
    }

    #[must_use]
    pub const fn raw(self) -> u32 {
        self.0
    }

    /// Floors `watts` to two decimals.
    #[must_use]
    pub fn truncate(watts: f32) -> Self {
        Self(floor_scaled(watts, Self::SCALE))
    }
}

impl fmt::Display for Watts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:02}", self.0 / Self::SCALE, self.0 % Self::SCALE)
    }
}

// Must scale in f32; in f64 the representation error of readings like 0.7
// floors one step low. Float-to-int `as` truncates toward zero, which is floor
// for non-negative input.
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_precision_loss,
    clippy::cast_sign_loss
)]
fn floor_scaled(value: f32, scale: u32) -> u32 {
    if value.is_finite() && value > 0.0 {
        (value * scale as f32) as u32
    } else {
        0
    }
}

/// Quantised current and power derived from one sensor reading.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Measurement {
    pub current: Amperes,
    pub power: Watts,
}

impl Measurement {
    /// Applies the noise floor and supply voltage from `config` to `reading`.
    ///
    /// Readings below the floor (and non-finite readings) become exactly zero.
    /// Power is derived from the unquantised reading before both are floored.
    #[must_use]
    pub fn from_reading(reading: f32, config: &ControllerConfig) -> Self {
        let amps = if reading.is_finite() && reading >= config.noise_floor_amps {
            reading
        } else {
            0.0
        };
        let watts = amps * config.supply_volts;
        Self {
            current: Amperes::truncate(amps),
            power: Watts::truncate(watts),
        }
    }
}

impl fmt::Display for Measurement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "current={}A power={}W", self.current, self.power)
    }
}

/// One stored sample.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HistoryEntry {
    pub date: ClockText,
    pub time: ClockText,
    pub outlets: OutletSnapshot,
    pub measurement: Measurement,
}

impl HistoryEntry {
    /// Stamps a measurement with the clock snapshot and outlet levels.
    #[must_use]
    pub fn capture(clock: &ClockState, outlets: OutletSnapshot, measurement: Measurement) -> Self {
        Self {
            date: clock.date().clone(),
            time: clock.time().clone(),
            outlets,
            measurement,
        }
    }
}

/// Fixed-capacity ring of samples; the oldest entry is overwritten once full.
///
/// Only slots that have been written are ever reported.
pub struct HistoryLog<const CAPACITY: usize = HISTORY_CAPACITY> {
    ring: HistoryBuf<HistoryEntry, CAPACITY>,
}

impl<const CAPACITY: usize> HistoryLog<CAPACITY> {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            ring: HistoryBuf::new(),
        }
    }

    pub fn record(&mut self, entry: HistoryEntry) {
        self.ring.write(entry);
    }

    /// Returns the written entries, most recent first.
    #[must_use]
    pub fn newest_first(&self) -> Vec<&HistoryEntry, CAPACITY> {
        let mut entries: Vec<&HistoryEntry, CAPACITY> = self.ring.oldest_ordered().collect();
        entries.reverse();
        entries
    }

    /// Returns the most recent entry, if any.
    #[must_use]
    pub fn latest(&self) -> Option<&HistoryEntry> {
        self.ring.recent()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.ring.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ring.is_empty()
    }

    #[must_use]
    pub const fn capacity(&self) -> usize {
        CAPACITY
    }
}

impl<const CAPACITY: usize> Default for HistoryLog<CAPACITY> {
    fn default() -> Self {
        Self::new()
    }
}
