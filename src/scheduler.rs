//! Repeating task scheduler
//!
//! Replaces interval timers with explicit per-concern repeating tasks. Each
//! concern has at most one armed task; disarming removes it together with
//! its pending deadline. Time is a `Duration` since session start supplied by
//! the caller, so the schedule is deterministic.

use std::collections::BTreeMap;
use std::time::Duration;

/// Smallest accepted period; keeps `due` from spinning on a zero period.
const MIN_PERIOD: Duration = Duration::from_millis(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Concern {
    /// Advances the simulation clock
    SimulationTick,
    /// Refreshes the fault highlight brightness
    FaultPulse,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct RepeatingTask {
    period: Duration,
    next_due: Duration,
}

#[derive(Debug, Clone, Default)]
pub struct Scheduler {
    tasks: BTreeMap<Concern, RepeatingTask>,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Arm a repeating task whose first firing is one period after `now`.
    ///
    /// Returns false, leaving the existing schedule untouched, if the concern
    /// is already armed.
    pub fn arm(&mut self, concern: Concern, period: Duration, now: Duration) -> bool {
        if self.tasks.contains_key(&concern) {
            return false;
        }
        let period = period.max(MIN_PERIOD);
        self.tasks.insert(concern, RepeatingTask { period, next_due: now + period });
        log::debug!("armed {:?} every {:?}", concern, period);
        true
    }

    /// Remove a task and its pending deadline. Returns false if it was not armed.
    pub fn disarm(&mut self, concern: Concern) -> bool {
        let removed = self.tasks.remove(&concern).is_some();
        if removed {
            log::debug!("disarmed {:?}", concern);
        }
        removed
    }

    pub fn is_armed(&self, concern: Concern) -> bool {
        self.tasks.contains_key(&concern)
    }

    pub fn armed_count(&self) -> usize {
        self.tasks.len()
    }

    pub fn next_deadline(&self) -> Option<Duration> {
        self.tasks.values().map(|t| t.next_due).min()
    }

    /// Pop every firing whose deadline is at or before `now`, in deadline
    /// order (ties broken by concern), rescheduling each task by its period.
    pub fn due(&mut self, now: Duration) -> Vec<Concern> {
        let mut fired = Vec::new();
        loop {
            let next = self
                .tasks
                .iter()
                .filter(|(_, t)| t.next_due <= now)
                .min_by_key(|(c, t)| (t.next_due, **c))
                .map(|(c, _)| *c);

            let Some(concern) = next else { break };
            if let Some(task) = self.tasks.get_mut(&concern) {
                task.next_due += task.period;
            }
            fired.push(concern);
        }
        fired
    }
}

// ===================== TESTS =====================

#[cfg(test)]
mod tests {
    use super::*;

    const TICK: Duration = Duration::from_millis(100);

    #[test]
    fn test_fires_once_per_period() {
        let mut s = Scheduler::new();
        assert!(s.arm(Concern::SimulationTick, TICK, Duration::ZERO));

        assert!(s.due(Duration::from_millis(99)).is_empty());
        assert_eq!(s.due(Duration::from_millis(100)), vec![Concern::SimulationTick]);
        assert!(s.due(Duration::from_millis(150)).is_empty());
        assert_eq!(s.due(Duration::from_millis(1000)).len(), 9);
        assert_eq!(s.next_deadline(), Some(Duration::from_millis(1100)));
    }

    #[test]
    fn test_rearm_does_not_duplicate() {
        let mut s = Scheduler::new();
        assert!(s.arm(Concern::SimulationTick, TICK, Duration::ZERO));
        assert!(!s.arm(Concern::SimulationTick, TICK, Duration::from_millis(50)));
        assert_eq!(s.armed_count(), 1);
        assert_eq!(s.due(Duration::from_millis(1000)).len(), 10);
    }

    #[test]
    fn test_disarm_retires_pending_tick() {
        let mut s = Scheduler::new();
        s.arm(Concern::SimulationTick, TICK, Duration::ZERO);
        assert!(s.disarm(Concern::SimulationTick));
        assert!(!s.disarm(Concern::SimulationTick));
        assert!(!s.is_armed(Concern::SimulationTick));
        assert!(s.due(Duration::from_secs(10)).is_empty());
        assert_eq!(s.next_deadline(), None);
    }

    #[test]
    fn test_toggle_cycles_keep_single_task() {
        let mut s = Scheduler::new();
        for i in 0..5u64 {
            let now = Duration::from_millis(i * 30);
            s.arm(Concern::SimulationTick, TICK, now);
            s.disarm(Concern::SimulationTick);
        }
        s.arm(Concern::SimulationTick, TICK, Duration::from_millis(200));
        assert_eq!(s.armed_count(), 1);
        assert_eq!(s.due(Duration::from_millis(300)), vec![Concern::SimulationTick]);
    }

    #[test]
    fn test_interleaved_concerns_in_deadline_order() {
        let mut s = Scheduler::new();
        s.arm(Concern::FaultPulse, TICK, Duration::ZERO);
        s.arm(Concern::SimulationTick, TICK, Duration::from_millis(50));
        let fired = s.due(Duration::from_millis(260));
        assert_eq!(
            fired,
            vec![
                Concern::FaultPulse,
                Concern::SimulationTick,
                Concern::FaultPulse,
                Concern::SimulationTick,
            ]
        );
    }

    #[test]
    fn test_zero_period_is_bounded() {
        let mut s = Scheduler::new();
        s.arm(Concern::FaultPulse, Duration::ZERO, Duration::ZERO);
        assert_eq!(s.due(Duration::from_millis(5)).len(), 5);
    }
}
