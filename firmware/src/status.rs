#![cfg_attr(not(target_os = "none"), allow(dead_code))]

//! Status lines logged by the control task.
//!
//! The lines are rendered into fixed buffers here so the runtime can hand
//! plain strings to `defmt` after each state change.

use core::fmt;

use heapless::String;
use outlet_core::status::{StatusFormatter, StatusSnapshot};

pub const STATUS_LINE_CAPACITY: usize = 96;
pub type StatusLine = String<STATUS_LINE_CAPACITY>;

/// Renders outlets, lamps, timer, history and clock lines, in that order.
pub fn render(snapshot: &StatusSnapshot<'_>) -> [StatusLine; 5] {
    let formatter = StatusFormatter::new(snapshot);
    [
        line(|out| formatter.write_outlets_line(out)),
        line(|out| formatter.write_indicator_line(out)),
        line(|out| formatter.write_timer_line(out)),
        line(|out| formatter.write_history_line(out)),
        line(|out| formatter.write_clock_line(out)),
    ]
}

fn line(write: impl FnOnce(&mut StatusLine) -> fmt::Result) -> StatusLine {
    let mut line = StatusLine::new();
    // An overlong line keeps whatever fitted.
    let _ = write(&mut line);
    line
}
