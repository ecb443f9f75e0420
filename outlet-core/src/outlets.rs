//! Relay-backed outlet state.
//!
//! [`OutletBank`] owns the on/off level of both outlets and pushes every change
//! to an [`OutletDriver`] before returning, so the physical relays never lag
//! the recorded state.

use core::fmt;

/// One of the two switched outlets.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OutletId {
    One,
    Two,
}

impl OutletId {
    pub const ALL: [OutletId; 2] = [OutletId::One, OutletId::Two];

    /// Returns the 1-based number used on the wire.
    #[must_use]
    pub const fn number(self) -> u8 {
        match self {
            OutletId::One => 1,
            OutletId::Two => 2,
        }
    }

    /// Maps a 1-based outlet number back to an identifier.
    #[must_use]
    pub const fn from_number(number: u8) -> Option<Self> {
        match number {
            1 => Some(OutletId::One),
            2 => Some(OutletId::Two),
            _ => None,
        }
    }

    const fn index(self) -> usize {
        match self {
            OutletId::One => 0,
            OutletId::Two => 1,
        }
    }
}

impl fmt::Display for OutletId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "outlet{}", self.number())
    }
}

/// Switched level of a single outlet.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum OutletLevel {
    On,
    #[default]
    Off,
}

impl OutletLevel {
    /// Returns `true` when the relay is energised.
    #[must_use]
    pub const fn is_on(self) -> bool {
        matches!(self, OutletLevel::On)
    }

    /// Helper converting a boolean on flag into an [`OutletLevel`].
    #[must_use]
    pub const fn from_on(on: bool) -> Self {
        if on { OutletLevel::On } else { OutletLevel::Off }
    }

    /// Returns the opposite level.
    #[must_use]
    pub const fn toggled(self) -> Self {
        match self {
            OutletLevel::On => OutletLevel::Off,
            OutletLevel::Off => OutletLevel::On,
        }
    }

    /// Label used in history records (`On` / `Off`).
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            OutletLevel::On => "On",
            OutletLevel::Off => "Off",
        }
    }
}

impl fmt::Display for OutletLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Level of both outlets captured at one instant.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct OutletSnapshot {
    pub one: OutletLevel,
    pub two: OutletLevel,
}

impl OutletSnapshot {
    pub const ALL_OFF: Self = Self::new(OutletLevel::Off, OutletLevel::Off);

    #[must_use]
    pub const fn new(one: OutletLevel, two: OutletLevel) -> Self {
        Self { one, two }
    }

    /// Returns the level recorded for `outlet`.
    #[must_use]
    pub const fn level(self, outlet: OutletId) -> OutletLevel {
        match outlet {
            OutletId::One => self.one,
            OutletId::Two => self.two,
        }
    }

    /// Returns `true` when at least one outlet is on.
    #[must_use]
    pub const fn any_on(self) -> bool {
        self.one.is_on() || self.two.is_on()
    }
}

/// Hardware hook that energises or releases one relay.
pub trait OutletDriver {
    fn drive(&mut self, outlet: OutletId, level: OutletLevel);
}

impl<D: OutletDriver + ?Sized> OutletDriver for &mut D {
    fn drive(&mut self, outlet: OutletId, level: OutletLevel) {
        (**self).drive(outlet, level);
    }
}

/// Owns the level of both outlets and the driver behind them.
pub struct OutletBank<D> {
    driver: D,
    levels: [OutletLevel; 2],
}

impl<D> OutletBank<D>
where
    D: OutletDriver,
{
    /// Wraps `driver` and releases both relays.
    pub fn new(driver: D) -> Self {
        let mut bank = Self {
            driver,
            levels: [OutletLevel::Off; 2],
        };
        bank.turn_off_all();
        bank
    }

    pub fn turn_on_all(&mut self) {
        for outlet in OutletId::ALL {
            self.set(outlet, OutletLevel::On);
        }
    }

    pub fn turn_off_all(&mut self) {
        for outlet in OutletId::ALL {
            self.set(outlet, OutletLevel::Off);
        }
    }

    /// Flips one outlet and returns its new level. The other relay is untouched.
    pub fn toggle(&mut self, outlet: OutletId) -> OutletLevel {
        let level = self.level(outlet).toggled();
        self.set(outlet, level);
        level
    }

    fn set(&mut self, outlet: OutletId, level: OutletLevel) {
        self.levels[outlet.index()] = level;
        self.driver.drive(outlet, level);
    }
}

impl<D> OutletBank<D> {
    #[must_use]
    pub fn level(&self, outlet: OutletId) -> OutletLevel {
        self.levels[outlet.index()]
    }

    #[must_use]
    pub fn snapshot(&self) -> OutletSnapshot {
        OutletSnapshot::new(self.levels[0], self.levels[1])
    }

    /// Returns an immutable reference to the underlying driver.
    pub fn driver(&self) -> &D {
        &self.driver
    }

    /// Returns a mutable reference to the underlying driver.
    pub fn driver_mut(&mut self) -> &mut D {
        &mut self.driver
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use heapless::Vec;

    #[derive(Default)]
    struct RecordingDriver {
        writes: Vec<(OutletId, OutletLevel), 16>,
    }

    impl OutletDriver for RecordingDriver {
        fn drive(&mut self, outlet: OutletId, level: OutletLevel) {
            self.writes.push((outlet, level)).unwrap();
        }
    }

    #[test]
    fn new_bank_releases_both_relays() {
        let bank = OutletBank::new(RecordingDriver::default());
        assert_eq!(bank.snapshot(), OutletSnapshot::ALL_OFF);
        assert_eq!(
            bank.driver().writes.as_slice(),
            &[
                (OutletId::One, OutletLevel::Off),
                (OutletId::Two, OutletLevel::Off)
            ]
        );
    }

    #[test]
    fn toggle_drives_only_the_selected_relay() {
        let mut bank = OutletBank::new(RecordingDriver::default());
        bank.driver_mut().writes.clear();

        assert_eq!(bank.toggle(OutletId::Two), OutletLevel::On);
        assert_eq!(
            bank.driver().writes.as_slice(),
            &[(OutletId::Two, OutletLevel::On)]
        );
        assert_eq!(
            bank.snapshot(),
            OutletSnapshot::new(OutletLevel::Off, OutletLevel::On)
        );

        assert_eq!(bank.toggle(OutletId::Two), OutletLevel::Off);
        assert!(!bank.snapshot().any_on());
    }

    #[test]
    fn outlet_numbers_round_trip() {
        for outlet in OutletId::ALL {
            assert_eq!(OutletId::from_number(outlet.number()), Some(outlet));
        }
        assert_eq!(OutletId::from_number(0), None);
        assert_eq!(OutletId::from_number(3), None);
    }
}
