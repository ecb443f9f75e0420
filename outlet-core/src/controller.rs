//! The single owned context that every request handler and tick runs against.
//!
//! [`Controller`] owns the outlets, lamps, sensor, auto-off timer, history and
//! clock. Hosts call one method at a time and each call applies all of its
//! output changes before returning, so a response is never produced ahead of
//! the state it describes.

use core::fmt;
use core::time::Duration;

use crate::clock::{ClockError, ClockInit, ClockState};
use crate::config::ControllerConfig;
use crate::history::{HistoryEntry, HistoryLog, Measurement};
use crate::indicator::{IndicatorDriver, IndicatorLines, StatusIndicator};
use crate::outlets::{OutletBank, OutletDriver, OutletId, OutletLevel, OutletSnapshot};
use crate::schedule::AutoOffTimer;
use crate::sensor::CurrentSensor;
use crate::status::StatusSnapshot;
use crate::time::MonotonicInstant;

/// State changes reported back to hosts for logging.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ControlEvent {
    AllOn,
    AllOff { disarmed: bool },
    Toggled { outlet: OutletId, level: OutletLevel },
    Scheduled { duration: Duration, replaced: bool },
    ClockSet,
    ClockKept,
    Expired,
    Sampled(Measurement),
}

impl fmt::Display for ControlEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ControlEvent::AllOn => f.write_str("all-on"),
            ControlEvent::AllOff { disarmed: true } => f.write_str("all-off schedule-cancelled"),
            ControlEvent::AllOff { disarmed: false } => f.write_str("all-off"),
            ControlEvent::Toggled { outlet, level } => write!(f, "toggle {outlet}={level}"),
            ControlEvent::Scheduled { duration, replaced } => {
                write!(f, "schedule {}s", duration.as_secs())?;
                if *replaced {
                    f.write_str(" (replaced)")?;
                }
                Ok(())
            }
            ControlEvent::ClockSet => f.write_str("clock-set"),
            ControlEvent::ClockKept => f.write_str("clock-already-set"),
            ControlEvent::Expired => f.write_str("schedule-expired all-off"),
            ControlEvent::Sampled(measurement) => write!(f, "sample {measurement}"),
        }
    }
}

/// Bookkeeping performed by one [`Controller::tick`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TickReport {
    /// The auto-off timer fired and switched everything off.
    pub expired: bool,
    /// A history sample was taken.
    pub sample: Option<Measurement>,
}

impl TickReport {
    /// Returns `true` when the tick changed nothing.
    #[must_use]
    pub fn is_quiet(&self) -> bool {
        !self.expired && self.sample.is_none()
    }
}

/// Owned controller state, generic over the hardware it drives.
pub struct Controller<O, L, S, I> {
    outlets: OutletBank<O>,
    indicator: StatusIndicator<L>,
    sensor: S,
    timer: AutoOffTimer<I>,
    history: HistoryLog,
    clock: ClockState,
    config: ControllerConfig,
    last_sample_at: Option<I>,
}

impl<O, L, S, I> Controller<O, L, S, I>
where
    O: OutletDriver,
    L: IndicatorDriver,
    S: CurrentSensor,
    I: MonotonicInstant,
{
    /// Builds the controller with both outlets off and the idle lamp lit.
    pub fn new(outlets: O, indicator: L, sensor: S, config: ControllerConfig) -> Self {
        Self {
            outlets: OutletBank::new(outlets),
            indicator: StatusIndicator::new(indicator),
            sensor,
            timer: AutoOffTimer::new(),
            history: HistoryLog::new(),
            clock: ClockState::new(),
            config,
            last_sample_at: None,
        }
    }

    pub fn turn_on_all(&mut self) -> ControlEvent {
        self.outlets.turn_on_all();
        self.indicator.set(true, false, false);
        ControlEvent::AllOn
    }

    /// Switches everything off and cancels any pending auto-off.
    pub fn turn_off_all(&mut self) -> ControlEvent {
        self.outlets.turn_off_all();
        self.indicator.set(false, true, false);
        let disarmed = self.timer.disarm();
        ControlEvent::AllOff { disarmed }
    }

    pub fn toggle(&mut self, outlet: OutletId) -> ControlEvent {
        let level = self.outlets.toggle(outlet);
        self.indicator.refresh(self.outlets.snapshot());
        ControlEvent::Toggled { outlet, level }
    }

    /// Turns both outlets on, then (re)starts the auto-off countdown.
    pub fn schedule(&mut self, duration: Duration, now: I) -> ControlEvent {
        self.turn_on_all();
        let replaced = self.timer.arm(duration, now);
        ControlEvent::Scheduled { duration, replaced }
    }

    /// Applies the first valid date/time snapshot; later calls are no-ops.
    pub fn init_time(&mut self, date: &str, time: &str) -> Result<ControlEvent, ClockError> {
        match self.clock.initialize(date, time)? {
            ClockInit::Applied => Ok(ControlEvent::ClockSet),
            ClockInit::AlreadyInitialized => Ok(ControlEvent::ClockKept),
        }
    }

    /// Reads the sensor and appends one history entry.
    pub fn sample(&mut self) -> Measurement {
        let reading = self.sensor.read_amps();
        let measurement = Measurement::from_reading(reading, &self.config);
        self.history.record(HistoryEntry::capture(
            &self.clock,
            self.outlets.snapshot(),
            measurement,
        ));
        measurement
    }

    /// Periodic bookkeeping: auto-off expiry first, then sampling.
    ///
    /// The first call only starts the sampling cadence, so the first sample
    /// lands one full interval after the loop starts.
    pub fn tick(&mut self, now: I) -> TickReport {
        let mut report = TickReport::default();

        if self.timer.poll(now) {
            self.turn_off_all();
            report.expired = true;
        }

        match self.last_sample_at {
            None => self.last_sample_at = Some(now),
            Some(previous)
                if now.saturating_duration_since(previous) >= self.config.sample_interval =>
            {
                report.sample = Some(self.sample());
                self.last_sample_at = Some(now);
            }
            Some(_) => {}
        }

        report
    }
}

impl<O, L, S, I> Controller<O, L, S, I>
where
    I: MonotonicInstant,
{
    #[must_use]
    pub fn outlets(&self) -> OutletSnapshot {
        self.outlets.snapshot()
    }

    #[must_use]
    pub fn indicator(&self) -> IndicatorLines {
        self.indicator.lines()
    }

    #[must_use]
    pub fn timer(&self) -> &AutoOffTimer<I> {
        &self.timer
    }

    #[must_use]
    pub fn history(&self) -> &HistoryLog {
        &self.history
    }

    #[must_use]
    pub fn clock(&self) -> &ClockState {
        &self.clock
    }

    #[must_use]
    pub fn config(&self) -> &ControllerConfig {
        &self.config
    }

    pub fn outlet_driver(&self) -> &O {
        self.outlets.driver()
    }

    pub fn indicator_driver(&self) -> &L {
        self.indicator.driver()
    }

    pub fn sensor_mut(&mut self) -> &mut S {
        &mut self.sensor
    }

    /// Captures everything the status lines need.
    #[must_use]
    pub fn status(&self, now: I) -> StatusSnapshot<'_> {
        StatusSnapshot {
            outlets: self.outlets(),
            indicator: self.indicator(),
            timer_remaining: self.timer.remaining(now),
            samples: self.history.len(),
            capacity: self.history.capacity(),
            latest: self.history.latest().map(|entry| entry.measurement),
            date: self.clock.date().as_str(),
            time: self.clock.time().as_str(),
            clock_initialized: self.clock.is_initialized(),
        }
    }
}
