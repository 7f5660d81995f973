//! Simulation Clock
//!
//! Simulated date-time that advances in fixed 100 ms ticks while running.
//! Every tick moves time forward by `rate / 10` minutes, so one real second
//! of ticks advances `rate` simulated minutes.

use chrono::{DateTime, Duration};
use chrono_tz::Tz;

// ===================== CONSTANTS =====================

/// Real-time cadence of simulation ticks
pub const TICK_INTERVAL: std::time::Duration = std::time::Duration::from_millis(100);

/// Slider bounds for the simulation rate (simulated minutes per real second)
pub const MIN_RATE: u32 = 1;
pub const MAX_RATE: u32 = 1440;
pub const DEFAULT_RATE: u32 = 60;

// ===================== CLOCK =====================

#[derive(Debug, Clone, PartialEq)]
pub struct SimulationClock {
    time: DateTime<Tz>,
    running: bool,
    rate: u32,
    ticks: u64,
}

impl SimulationClock {
    pub fn new(start: DateTime<Tz>) -> Self {
        Self { time: start, running: false, rate: DEFAULT_RATE, ticks: 0 }
    }

    pub fn time(&self) -> DateTime<Tz> {
        self.time
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn rate(&self) -> u32 {
        self.rate
    }

    /// Number of ticks applied since construction.
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Set the rate, clamped to the slider range.
    pub fn set_rate(&mut self, rate: u32) {
        self.rate = rate.clamp(MIN_RATE, MAX_RATE);
    }

    /// Direct edit of the simulated time. Takes effect immediately in either
    /// state; a paused clock keeps it until resumed.
    pub fn set_time(&mut self, t: DateTime<Tz>) {
        self.time = t;
    }

    pub fn start(&mut self) {
        self.running = true;
    }

    pub fn pause(&mut self) {
        self.running = false;
    }

    /// Simulated time added by one tick: `rate / 10` minutes.
    pub fn step(&self) -> Duration {
        Duration::milliseconds(i64::from(self.rate) * 6_000)
    }

    /// Apply one tick. Returns the new time, or `None` when paused.
    ///
    /// A tick that would pass the last representable date pauses the clock
    /// and leaves the time unchanged.
    pub fn tick(&mut self) -> Option<DateTime<Tz>> {
        if !self.running {
            return None;
        }
        let Some(next) = self.time.checked_add_signed(self.step()) else {
            log::warn!("simulated time {} cannot advance further, pausing", self.time);
            self.running = false;
            return None;
        };
        self.time = next;
        self.ticks += 1;
        Some(self.time)
    }
}

// ===================== TESTS =====================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use chrono_tz::UTC;

    fn start() -> DateTime<Tz> {
        UTC.with_ymd_and_hms(2024, 3, 20, 6, 0, 0).unwrap()
    }

    #[test]
    fn test_ten_ticks_advance_rate_minutes() {
        let mut clock = SimulationClock::new(start());
        clock.set_rate(60);
        clock.start();
        for _ in 0..10 {
            clock.tick();
        }
        assert_eq!(clock.time(), start() + Duration::minutes(60));
        assert_eq!(clock.ticks(), 10);
    }

    #[test]
    fn test_fractional_minute_steps_are_exact() {
        let mut clock = SimulationClock::new(start());
        clock.set_rate(1);
        clock.start();
        assert_eq!(clock.tick(), Some(start() + Duration::seconds(6)));

        clock.set_rate(7);
        for _ in 0..10 {
            clock.tick();
        }
        assert_eq!(clock.time(), start() + Duration::seconds(6) + Duration::minutes(7));
    }

    #[test]
    fn test_paused_clock_does_not_advance() {
        let mut clock = SimulationClock::new(start());
        assert!(!clock.is_running());
        assert_eq!(clock.tick(), None);
        assert_eq!(clock.time(), start());
        assert_eq!(clock.ticks(), 0);
    }

    #[test]
    fn test_edit_while_paused_sticks() {
        let mut clock = SimulationClock::new(start());
        clock.start();
        clock.tick();
        clock.pause();

        let edited = UTC.with_ymd_and_hms(2024, 12, 1, 18, 30, 0).unwrap();
        clock.set_time(edited);
        clock.tick();
        clock.tick();
        assert_eq!(clock.time(), edited);

        clock.start();
        clock.tick();
        assert_eq!(clock.time(), edited + Duration::minutes(6));
    }

    #[test]
    fn test_rate_clamped_to_slider_range() {
        let mut clock = SimulationClock::new(start());
        clock.set_rate(0);
        assert_eq!(clock.rate(), MIN_RATE);
        clock.set_rate(5000);
        assert_eq!(clock.rate(), MAX_RATE);
        clock.set_rate(720);
        assert_eq!(clock.rate(), 720);
        assert_eq!(clock.step(), Duration::minutes(72));
    }

    #[test]
    fn test_tick_past_last_date_pauses() {
        let last = UTC.from_utc_datetime(&(chrono::NaiveDateTime::MAX - Duration::minutes(10)));
        let mut clock = SimulationClock::new(last);
        clock.set_rate(MAX_RATE);
        clock.start();

        assert_eq!(clock.tick(), None);
        assert!(!clock.is_running());
        assert_eq!(clock.time(), last);
        assert_eq!(clock.ticks(), 0);
    }
}
