//! Client-supplied date and time used to stamp history entries.
//!
//! The device has no real-time clock. The first client to call time-init
//! supplies a date/time snapshot which is then copied verbatim into every
//! later sample; it is never advanced.

use core::fmt;

use heapless::String;

use crate::config::{DEFAULT_DATE, DEFAULT_TIME};

/// Maximum byte length of a stored date or time string.
pub const CLOCK_TEXT_CAPACITY: usize = 32;

/// Bounded storage for clock text.
pub type ClockText = String<CLOCK_TEXT_CAPACITY>;

/// Result of a clock initialisation attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ClockInit {
    Applied,
    AlreadyInitialized,
}

/// Rejected clock text.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ClockError {
    DateTooLong,
    TimeTooLong,
    ControlCharacter,
}

impl fmt::Display for ClockError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClockError::DateTooLong => write!(f, "date exceeds {CLOCK_TEXT_CAPACITY} bytes"),
            ClockError::TimeTooLong => write!(f, "time exceeds {CLOCK_TEXT_CAPACITY} bytes"),
            ClockError::ControlCharacter => f.write_str("control character in clock text"),
        }
    }
}

/// Date/time snapshot with one-shot initialisation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClockState {
    date: ClockText,
    time: ClockText,
    initialized: bool,
}

impl ClockState {
    /// Creates a clock showing the default date and time.
    #[must_use]
    pub fn new() -> Self {
        Self {
            date: bounded(DEFAULT_DATE).unwrap_or_default(),
            time: bounded(DEFAULT_TIME).unwrap_or_default(),
            initialized: false,
        }
    }

    /// Stores `date` and `time` unless the clock was already initialised.
    ///
    /// Later calls leave the first snapshot in place and report
    /// [`ClockInit::AlreadyInitialized`]. Rejected text does not use up the
    /// one-shot initialisation.
    pub fn initialize(&mut self, date: &str, time: &str) -> Result<ClockInit, ClockError> {
        if self.initialized {
            return Ok(ClockInit::AlreadyInitialized);
        }

        if date.chars().chain(time.chars()).any(char::is_control) {
            return Err(ClockError::ControlCharacter);
        }
        let date = bounded(date).ok_or(ClockError::DateTooLong)?;
        let time = bounded(time).ok_or(ClockError::TimeTooLong)?;

        self.date = date;
        self.time = time;
        self.initialized = true;
        Ok(ClockInit::Applied)
    }

    #[must_use]
    pub fn date(&self) -> &ClockText {
        &self.date
    }

    #[must_use]
    pub fn time(&self) -> &ClockText {
        &self.time
    }

    #[must_use]
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }
}

impl Default for ClockState {
    fn default() -> Self {
        Self::new()
    }
}

fn bounded(value: &str) -> Option<ClockText> {
    let mut text = ClockText::new();
    text.push_str(value).ok()?;
    Some(text)
}
