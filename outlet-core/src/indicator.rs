//! Ready / idle / error indicator lines.

use core::fmt;

use crate::outlets::OutletSnapshot;

/// Levels of the three indicator lamps.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct IndicatorLines {
    pub ready: bool,
    pub idle: bool,
    pub error: bool,
}

impl IndicatorLines {
    /// Lamp state shown while no outlet is energised.
    pub const IDLE: Self = Self::new(false, true, false);

    #[must_use]
    pub const fn new(ready: bool, idle: bool, error: bool) -> Self {
        Self { ready, idle, error }
    }

    /// Derives the lamps from the outlet levels. The error lamp stays dark.
    #[must_use]
    pub const fn from_outlets(outlets: OutletSnapshot) -> Self {
        let any_on = outlets.any_on();
        Self::new(any_on, !any_on, false)
    }
}

impl fmt::Display for IndicatorLines {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ready={} idle={} error={}",
            on_off(self.ready),
            on_off(self.idle),
            on_off(self.error)
        )
    }
}

const fn on_off(lit: bool) -> &'static str {
    if lit { "on" } else { "off" }
}

/// Hardware hook for the three lamps.
pub trait IndicatorDriver {
    /// Writes every line. Implementations must not skip unchanged lines.
    fn write_lines(&mut self, lines: IndicatorLines);
}

impl<D: IndicatorDriver + ?Sized> IndicatorDriver for &mut D {
    fn write_lines(&mut self, lines: IndicatorLines) {
        (**self).write_lines(lines);
    }
}

/// Pushes indicator levels to a driver and remembers the last write.
pub struct StatusIndicator<D> {
    driver: D,
    lines: IndicatorLines,
}

impl<D> StatusIndicator<D>
where
    D: IndicatorDriver,
{
    /// Wraps `driver` and shows the idle pattern.
    pub fn new(driver: D) -> Self {
        let mut indicator = Self {
            driver,
            lines: IndicatorLines::IDLE,
        };
        indicator.show(IndicatorLines::IDLE);
        indicator
    }

    /// Drives all three lines, including ones whose level did not change.
    pub fn set(&mut self, ready: bool, idle: bool, error: bool) {
        self.show(IndicatorLines::new(ready, idle, error));
    }

    pub fn show(&mut self, lines: IndicatorLines) {
        self.lines = lines;
        self.driver.write_lines(lines);
    }

    /// Recomputes the lamps from the outlet levels and drives them.
    pub fn refresh(&mut self, outlets: OutletSnapshot) {
        self.show(IndicatorLines::from_outlets(outlets));
    }
}

impl<D> StatusIndicator<D> {
    /// Returns the most recently written lamp levels.
    #[must_use]
    pub fn lines(&self) -> IndicatorLines {
        self.lines
    }

    pub fn driver(&self) -> &D {
        &self.driver
    }

    pub fn driver_mut(&mut self) -> &mut D {
        &mut self.driver
    }
}
