//! Current measurement.
//!
//! The controller only sees [`CurrentSensor`]. [`Acs712`] turns raw counts from
//! an [`AnalogInput`] into an RMS current for the Hall-effect ACS712 family.
//! The RMS maths is done in integers because `core` has no float `sqrt`.

/// Source of RMS current readings, in amperes.
pub trait CurrentSensor {
    fn read_amps(&mut self) -> f32;
}

impl<S: CurrentSensor + ?Sized> CurrentSensor for &mut S {
    fn read_amps(&mut self) -> f32 {
        (**self).read_amps()
    }
}

/// One analog channel returning raw converter counts.
///
/// Implementations are expected to pace consecutive reads so that a window of
/// [`Acs712::window`] samples covers whole mains periods.
pub trait AnalogInput {
    fn read_raw(&mut self) -> u16;
}

/// ACS712 current range variants.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Acs712Range {
    Amps5,
    Amps20,
    Amps30,
}

impl Acs712Range {
    /// Output slope in millivolts per ampere.
    #[must_use]
    pub const fn millivolts_per_amp(self) -> u32 {
        match self {
            Acs712Range::Amps5 => 185,
            Acs712Range::Amps20 => 100,
            Acs712Range::Amps30 => 66,
        }
    }
}

/// Samples averaged to find the zero-current offset.
pub const CALIBRATION_SAMPLES: u32 = 32;

/// Default RMS window: one 50 Hz period at 100 µs spacing.
pub const DEFAULT_WINDOW: u32 = 200;

// RMS is computed on counts scaled by this factor to keep sub-count resolution.
const RMS_SCALE: u64 = 16;

/// ACS712 Hall-effect current sensor on a single-ended ADC channel.
pub struct Acs712<A> {
    input: A,
    range: Acs712Range,
    zero: u16,
    full_scale: u16,
    vref_mv: u32,
    window: u32,
}

impl<A> Acs712<A> {
    /// Creates a sensor for a 12-bit converter with a 3.3 V reference.
    ///
    /// The zero point starts at mid-scale until [`Acs712::calibrate`] runs.
    #[must_use]
    pub const fn new(input: A, range: Acs712Range) -> Self {
        Self {
            input,
            range,
            zero: 2048,
            full_scale: 4095,
            vref_mv: 3300,
            window: DEFAULT_WINDOW,
        }
    }

    /// Overrides the converter resolution and reference voltage.
    #[must_use]
    pub const fn with_converter(mut self, full_scale: u16, vref_mv: u32) -> Self {
        self.full_scale = full_scale;
        self.vref_mv = vref_mv;
        self
    }

    /// Overrides the number of samples per RMS window (at least one).
    #[must_use]
    pub const fn with_window(mut self, samples: u32) -> Self {
        self.window = if samples == 0 { 1 } else { samples };
        self
    }

    #[must_use]
    pub const fn zero_point(&self) -> u16 {
        self.zero
    }

    #[must_use]
    pub const fn window(&self) -> u32 {
        self.window
    }

    pub fn input_mut(&mut self) -> &mut A {
        &mut self.input
    }

    /// Converts an RMS value in scaled counts to amperes.
    #[allow(clippy::cast_precision_loss)]
    fn scaled_counts_to_amps(&self, scaled: u64) -> f32 {
        let millivolts =
            scaled as f32 * self.vref_mv as f32 / (f32::from(self.full_scale) * RMS_SCALE as f32);
        millivolts / self.range.millivolts_per_amp() as f32
    }
}

impl<A> Acs712<A>
where
    A: AnalogInput,
{
    /// Averages a burst of reads with no load attached and stores the result
    /// as the zero-current offset.
    pub fn calibrate(&mut self) -> u16 {
        let total: u32 = (0..CALIBRATION_SAMPLES)
            .map(|_| u32::from(self.input.read_raw()))
            .sum();
        self.zero = u16::try_from(total / CALIBRATION_SAMPLES).unwrap_or(u16::MAX);
        self.zero
    }

    /// RMS deviation from the zero point over one window, scaled by 16.
    fn rms_scaled_counts(&mut self) -> u64 {
        let zero = i32::from(self.zero);
        let mut sum_squares: u64 = 0;
        for _ in 0..self.window {
            let deviation = i32::from(self.input.read_raw()) - zero;
            let deviation = u64::from(deviation.unsigned_abs());
            sum_squares = sum_squares.saturating_add(deviation * deviation);
        }
        let mean = sum_squares / u64::from(self.window);
        (mean * RMS_SCALE * RMS_SCALE).isqrt()
    }
}

impl<A> CurrentSensor for Acs712<A>
where
    A: AnalogInput,
{
    fn read_amps(&mut self) -> f32 {
        let scaled = self.rms_scaled_counts();
        self.scaled_counts_to_amps(scaled)
    }
}
