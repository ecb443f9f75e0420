//! Tunables shared by the firmware and the emulator.

use core::time::Duration;

/// Number of samples retained by the history log.
pub const HISTORY_CAPACITY: usize = 10;

/// Date reported in history entries until a client initialises the clock.
pub const DEFAULT_DATE: &str = "2024-11-1";

/// Time reported in history entries until a client initialises the clock.
pub const DEFAULT_TIME: &str = "00:00:00";

/// Runtime parameters for [`crate::controller::Controller`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ControllerConfig {
    /// Period between history samples.
    pub sample_interval: Duration,
    /// Readings below this many amperes are stored as zero.
    pub noise_floor_amps: f32,
    /// Mains voltage used to derive power from current.
    pub supply_volts: f32,
}

impl ControllerConfig {
    pub const DEFAULT: Self = Self {
        sample_interval: Duration::from_secs(5),
        noise_floor_amps: 0.09,
        supply_volts: 220.0,
    };

    /// Overrides the sampling period.
    #[must_use]
    pub const fn with_sample_interval(mut self, interval: Duration) -> Self {
        self.sample_interval = interval;
        self
    }

    /// Overrides the supply voltage.
    #[must_use]
    pub const fn with_supply_volts(mut self, volts: f32) -> Self {
        self.supply_volts = volts;
        self
    }
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}
