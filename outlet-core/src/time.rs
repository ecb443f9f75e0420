//! Monotonic time abstraction shared by the timer and the sampler.

use core::time::Duration;

/// Trait implemented by monotonic instant wrappers used for scheduling.
pub trait MonotonicInstant: Copy {
    /// Returns the saturating duration from `earlier` to `self`.
    fn saturating_duration_since(&self, earlier: Self) -> Duration;
}

/// Offsets from boot double as instants on the host.
impl MonotonicInstant for Duration {
    fn saturating_duration_since(&self, earlier: Self) -> Duration {
        self.saturating_sub(earlier)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duration_instants_saturate() {
        let early = Duration::from_secs(3);
        let late = Duration::from_secs(5);

        assert_eq!(late.saturating_duration_since(early), Duration::from_secs(2));
        assert_eq!(early.saturating_duration_since(late), Duration::ZERO);
    }
}
