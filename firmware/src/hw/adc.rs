//! Paced ADC reads for the current sensor.

use esp_hal::delay::Delay;
use outlet_core::sensor::AnalogInput;

/// Wraps a one-shot conversion so consecutive reads are `spacing_us` apart.
///
/// The conversion itself is a closure so the caller keeps the concrete ADC
/// and pin types.
pub struct PacedInput<F> {
    convert: F,
    delay: Delay,
    spacing_us: u32,
}

impl<F> PacedInput<F>
where
    F: FnMut() -> u16,
{
    pub fn new(convert: F, spacing_us: u32) -> Self {
        Self {
            convert,
            delay: Delay::new(),
            spacing_us,
        }
    }
}

impl<F> AnalogInput for PacedInput<F>
where
    F: FnMut() -> u16,
{
    fn read_raw(&mut self) -> u16 {
        self.delay.delay_micros(self.spacing_us);
        (self.convert)()
    }
}
