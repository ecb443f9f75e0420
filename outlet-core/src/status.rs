//! Human-readable status lines.
//!
//! The emulator prints these for its `status` command and the firmware logs
//! them after every state change. [`StatusFormatter`] keeps the rendering
//! identical on both.

use core::fmt;
use core::time::Duration;

use crate::history::Measurement;
use crate::indicator::IndicatorLines;
use crate::outlets::{OutletId, OutletSnapshot};

/// Point-in-time view of the controller.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StatusSnapshot<'a> {
    pub outlets: OutletSnapshot,
    pub indicator: IndicatorLines,
    pub timer_remaining: Option<Duration>,
    pub samples: usize,
    pub capacity: usize,
    pub latest: Option<Measurement>,
    pub date: &'a str,
    pub time: &'a str,
    pub clock_initialized: bool,
}

/// Helper that renders a [`StatusSnapshot`] into human-readable lines.
#[derive(Clone, Copy, Debug)]
pub struct StatusFormatter<'a> {
    snapshot: &'a StatusSnapshot<'a>,
}

impl<'a> StatusFormatter<'a> {
    #[must_use]
    pub const fn new(snapshot: &'a StatusSnapshot<'a>) -> Self {
        Self { snapshot }
    }

    /// Writes the outlet line (e.g. `outlets outlet1=On outlet2=Off`).
    pub fn write_outlets_line<W: fmt::Write>(&self, writer: &mut W) -> fmt::Result {
        writer.write_str("outlets")?;
        for outlet in OutletId::ALL {
            write!(writer, " {}={}", outlet, self.snapshot.outlets.level(outlet))?;
        }
        Ok(())
    }

    /// Writes the lamp line (e.g. `indicator ready=on idle=off error=off`).
    pub fn write_indicator_line<W: fmt::Write>(&self, writer: &mut W) -> fmt::Result {
        write!(writer, "indicator {}", self.snapshot.indicator)
    }

    /// Writes the timer line (e.g. `timer armed remaining=+4.2s`).
    pub fn write_timer_line<W: fmt::Write>(&self, writer: &mut W) -> fmt::Result {
        match self.snapshot.timer_remaining {
            None => writer.write_str("timer disarmed"),
            Some(remaining) => {
                writer.write_str("timer armed remaining=")?;
                write_duration(writer, remaining)
            }
        }
    }

    /// Writes the history line (e.g. `history 3/10 latest current=0.1500A power=33.00W`).
    pub fn write_history_line<W: fmt::Write>(&self, writer: &mut W) -> fmt::Result {
        write!(
            writer,
            "history {}/{}",
            self.snapshot.samples, self.snapshot.capacity
        )?;
        match self.snapshot.latest {
            Some(latest) => write!(writer, " latest {latest}"),
            None => writer.write_str(" latest n/a"),
        }
    }

    /// Writes the clock line (e.g. `clock 2024-11-1 00:00:00 (default)`).
    pub fn write_clock_line<W: fmt::Write>(&self, writer: &mut W) -> fmt::Result {
        write!(writer, "clock {} {}", self.snapshot.date, self.snapshot.time)?;
        if !self.snapshot.clock_initialized {
            writer.write_str(" (default)")?;
        }
        Ok(())
    }
}

fn write_duration<W: fmt::Write>(writer: &mut W, duration: Duration) -> fmt::Result {
    if duration >= Duration::from_secs(1) {
        let millis = duration.as_millis();
        write!(writer, "+{}.{}s", millis / 1_000, (millis % 1_000) / 100)
    } else {
        write!(writer, "+{}ms", duration.as_millis())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::{Amperes, Watts};
    use crate::outlets::OutletLevel;
    use heapless::String;

    fn snapshot() -> StatusSnapshot<'static> {
        StatusSnapshot {
            outlets: OutletSnapshot::new(OutletLevel::On, OutletLevel::Off),
            indicator: IndicatorLines::new(true, false, false),
            timer_remaining: Some(Duration::from_millis(4_250)),
            samples: 3,
            capacity: 10,
            latest: Some(Measurement {
                current: Amperes::from_raw(1_500),
                power: Watts::from_raw(3_300),
            }),
            date: "2024-11-1",
            time: "00:00:00",
            clock_initialized: false,
        }
    }

    #[test]
    fn renders_every_line() {
        let snapshot = snapshot();
        let formatter = StatusFormatter::new(&snapshot);
        let mut line: String<96> = String::new();

        formatter.write_outlets_line(&mut line).unwrap();
        assert_eq!(line.as_str(), "outlets outlet1=On outlet2=Off");

        line.clear();
        formatter.write_indicator_line(&mut line).unwrap();
        assert_eq!(line.as_str(), "indicator ready=on idle=off error=off");

        line.clear();
        formatter.write_timer_line(&mut line).unwrap();
        assert_eq!(line.as_str(), "timer armed remaining=+4.2s");

        line.clear();
        formatter.write_history_line(&mut line).unwrap();
        assert_eq!(
            line.as_str(),
            "history 3/10 latest current=0.1500A power=33.00W"
        );

        line.clear();
        formatter.write_clock_line(&mut line).unwrap();
        assert_eq!(line.as_str(), "clock 2024-11-1 00:00:00 (default)");
    }

    #[test]
    fn disarmed_timer_and_empty_history() {
        let mut snapshot = snapshot();
        snapshot.timer_remaining = None;
        snapshot.samples = 0;
        snapshot.latest = None;
        let formatter = StatusFormatter::new(&snapshot);
        let mut line: String<64> = String::new();

        formatter.write_timer_line(&mut line).unwrap();
        assert_eq!(line.as_str(), "timer disarmed");

        line.clear();
        formatter.write_history_line(&mut line).unwrap();
        assert_eq!(line.as_str(), "history 0/10 latest n/a");
    }
}
