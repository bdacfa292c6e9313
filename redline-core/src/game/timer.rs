//! Race Timer
//!
//! Elapsed time, lap boundaries and best lap for one attempt.
//!
//! The timer never reads a clock. Every operation takes the current
//! instant `now` (milliseconds on any monotonic clock) from the caller,
//! which keeps it deterministic and lets tests drive it directly.
//!
//! ```text
//! Idle ──start──▶ Running ──pause──▶ Paused
//!                   ▲  │                │
//!                   └──┼────start───────┘
//!                      └─last lap / stop──▶ Finished
//! ```

use serde::Serialize;

use crate::core::time::RaceTime;

/// Timer status.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub enum TimerStatus {
    /// Not started
    #[default]
    Idle,
    /// Clock advancing
    Running,
    /// Clock halted
    Paused,
    /// Terminal
    Finished,
}

/// A completed lap.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct LapRecord {
    /// 1-based lap number
    pub lap: u32,
    /// Lap duration (ms)
    pub duration_ms: u64,
    /// This was the final lap
    pub finished: bool,
}

/// Timer for one race attempt.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RaceTimer {
    current_time: u64,
    best_time: Option<u64>,
    lap_times: Vec<u64>,
    current_lap: u32,
    total_laps: u32,
    status: TimerStatus,

    #[serde(skip)]
    started_at: u64,
    #[serde(skip)]
    last_lap_at: u64,
    #[serde(skip)]
    paused_at: u64,
}

impl RaceTimer {
    /// New idle timer.
    pub fn new(total_laps: u32) -> Self {
        Self {
            current_lap: 1,
            total_laps,
            ..Default::default()
        }
    }

    // =========================================================================
    // Transitions
    // =========================================================================

    /// Start from idle, or resume from paused.
    ///
    /// Resuming shifts the start and last-lap instants forward by the
    /// pause duration so paused time never counts. Returns whether the
    /// status changed.
    pub fn start(&mut self, now: u64) -> bool {
        match self.status {
            TimerStatus::Idle => {
                self.started_at = now;
                self.last_lap_at = now;
                self.current_time = 0;
            }
            TimerStatus::Paused => {
                let paused_for = now.saturating_sub(self.paused_at);
                self.started_at += paused_for;
                self.last_lap_at += paused_for;
            }
            TimerStatus::Running | TimerStatus::Finished => return false,
        }
        self.status = TimerStatus::Running;
        true
    }

    /// Resume a paused timer. No-op in any other state.
    pub fn resume(&mut self, now: u64) -> bool {
        self.can_resume() && self.start(now)
    }

    /// Halt the clock at `now`.
    pub fn pause(&mut self, now: u64) -> bool {
        if self.status != TimerStatus::Running {
            return false;
        }
        self.sample(now);
        self.paused_at = now;
        self.status = TimerStatus::Paused;
        true
    }

    /// Close the running lap at `now`.
    ///
    /// Finishes the timer when the last lap closes. `None` unless running.
    pub fn complete_lap(&mut self, now: u64) -> Option<LapRecord> {
        if self.status != TimerStatus::Running {
            return None;
        }

        let duration_ms = now.saturating_sub(self.last_lap_at);
        self.last_lap_at = now;
        self.lap_times.push(duration_ms);
        self.best_time = Some(self.best_time.map_or(duration_ms, |b| b.min(duration_ms)));
        self.sample(now);

        let lap = self.current_lap;
        self.current_lap += 1;

        let finished = self.current_lap > self.total_laps;
        if finished {
            self.status = TimerStatus::Finished;
        }

        Some(LapRecord { lap, duration_ms, finished })
    }

    /// Refresh `current_time` while running.
    pub fn sample(&mut self, now: u64) {
        if self.status == TimerStatus::Running {
            self.current_time = now.saturating_sub(self.started_at);
        }
    }

    /// Force-finish. The clock freezes at `now` (or at the pause instant).
    pub fn stop(&mut self, now: u64) -> bool {
        if self.status == TimerStatus::Finished {
            return false;
        }
        self.sample(now);
        self.status = TimerStatus::Finished;
        true
    }

    /// Back to idle with counters cleared. `total_laps` is kept.
    pub fn reset(&mut self) {
        *self = Self::new(self.total_laps);
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// Elapsed running time (ms) at the last sample.
    pub fn current_time(&self) -> u64 {
        self.current_time
    }

    /// Elapsed running time as a race time.
    pub fn race_time(&self) -> RaceTime {
        RaceTime::from_millis(self.current_time)
    }

    /// Fastest lap (ms).
    pub fn best_time(&self) -> Option<u64> {
        self.best_time
    }

    /// Fastest lap as a race time.
    pub fn best_lap_time(&self) -> Option<RaceTime> {
        self.best_time.map(RaceTime::from_millis)
    }

    /// Mean lap duration (ms).
    pub fn average_lap_time(&self) -> Option<u64> {
        let count = self.lap_times.len() as u64;
        if count == 0 {
            return None;
        }
        Some(self.lap_times.iter().sum::<u64>() / count)
    }

    /// Completed lap durations in order.
    pub fn lap_times(&self) -> &[u64] {
        &self.lap_times
    }

    /// The lap being driven (starts at 1, `total_laps + 1` once finished).
    pub fn current_lap(&self) -> u32 {
        self.current_lap
    }

    /// Laps in this attempt.
    pub fn total_laps(&self) -> u32 {
        self.total_laps
    }

    /// Current status.
    pub fn status(&self) -> TimerStatus {
        self.status
    }

    /// Duration of the lap in progress.
    pub fn current_lap_time(&self, now: u64) -> u64 {
        match self.status {
            TimerStatus::Running => now.saturating_sub(self.last_lap_at),
            TimerStatus::Paused => self.paused_at.saturating_sub(self.last_lap_at),
            TimerStatus::Idle | TimerStatus::Finished => 0,
        }
    }

    /// Completed laps as a percentage, 0-100.
    pub fn progress(&self) -> f64 {
        if self.total_laps == 0 {
            return 0.0;
        }
        let done = self.current_lap.saturating_sub(1) as f64;
        (done / self.total_laps as f64 * 100.0).clamp(0.0, 100.0)
    }

    /// Is the clock advancing?
    pub fn is_running(&self) -> bool {
        self.status == TimerStatus::Running
    }

    /// Has the final lap closed?
    pub fn is_finished(&self) -> bool {
        self.status == TimerStatus::Finished
    }

    /// Can `start` begin the clock from here?
    pub fn can_start(&self) -> bool {
        !matches!(self.status, TimerStatus::Running | TimerStatus::Finished)
    }

    /// Can the clock be paused?
    pub fn can_pause(&self) -> bool {
        self.status == TimerStatus::Running
    }

    /// Can a paused clock resume?
    pub fn can_resume(&self) -> bool {
        self.status == TimerStatus::Paused
    }

    /// Is there anything to reset?
    pub fn can_reset(&self) -> bool {
        self.current_time > 0 || !self.lap_times.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_three_laps() {
        let mut timer = RaceTimer::new(3);
        assert!(timer.start(1000));

        timer.complete_lap(31_000).unwrap();
        timer.complete_lap(58_500).unwrap();
        let last = timer.complete_lap(90_000).unwrap();

        assert!(last.finished);
        assert_eq!(last.lap, 3);
        assert!(timer.is_finished());
        assert_eq!(timer.current_lap(), 4);
        assert_eq!(timer.lap_times(), &[30_000, 27_500, 31_500]);
        assert_eq!(timer.best_time(), Some(27_500));
        assert_eq!(timer.current_time(), 89_000);
        assert_eq!(timer.progress(), 100.0);
        assert_eq!(timer.average_lap_time(), Some(29_666));

        // Finished is terminal
        assert!(!timer.start(95_000));
        assert!(timer.complete_lap(95_000).is_none());
        assert_eq!(timer.lap_times().len(), 3);
    }

    #[test]
    fn test_single_lap() {
        let mut timer = RaceTimer::new(1);
        assert_eq!(timer.progress(), 0.0);

        timer.start(500);
        let lap = timer.complete_lap(62_870).unwrap();

        assert!(lap.finished);
        assert!(timer.is_finished());
        assert_eq!(timer.current_lap(), 2);
        assert_eq!(timer.lap_times(), &[62_370]);
        assert_eq!(timer.best_time(), Some(62_370));
        assert_eq!(timer.progress(), 100.0);
        assert_eq!(timer.best_lap_time().unwrap().to_string(), "1:02.37");
    }

    #[test]
    fn test_pause_excludes_paused_time() {
        let mut timer = RaceTimer::new(2);
        timer.start(0);
        timer.sample(4000);
        assert!(timer.pause(4000));
        assert_eq!(timer.current_lap_time(9000), 4000);

        // Sampling while paused is frozen
        timer.sample(10_000);
        assert_eq!(timer.current_time(), 4000);

        assert!(timer.resume(14_000));
        timer.complete_lap(16_000).unwrap();
        assert_eq!(timer.lap_times(), &[6000]);
        assert_eq!(timer.current_time(), 6000);
    }

    #[test]
    fn test_operations_outside_running_are_noops() {
        let mut timer = RaceTimer::new(3);
        assert!(!timer.pause(100));
        assert!(!timer.resume(100));
        assert!(timer.complete_lap(100).is_none());
        assert_eq!(timer.status(), TimerStatus::Idle);

        timer.start(0);
        assert!(!timer.start(50));
        assert!(!timer.resume(50));
    }

    #[test]
    fn test_stop_and_reset() {
        let mut timer = RaceTimer::new(3);
        assert!(!timer.can_reset());

        timer.start(0);
        timer.complete_lap(10_000);
        assert!(timer.stop(12_000));
        assert!(timer.is_finished());
        assert_eq!(timer.current_time(), 12_000);
        assert_eq!(timer.current_lap_time(20_000), 0);
        assert!(timer.can_reset());

        timer.reset();
        assert_eq!(timer, RaceTimer::new(3));
        assert!(timer.can_start());
    }

    #[test]
    fn test_predicates() {
        let mut timer = RaceTimer::new(2);
        assert!(timer.can_start() && !timer.can_pause() && !timer.can_resume());

        timer.start(0);
        assert!(!timer.can_start() && timer.can_pause());

        timer.pause(10);
        assert!(timer.can_start() && timer.can_resume() && !timer.can_pause());
    }

    #[test]
    fn test_zero_laps_progress() {
        let timer = RaceTimer::new(0);
        assert_eq!(timer.progress(), 0.0);
    }

    proptest! {
        #[test]
        fn prop_pause_splits_add_up(
            before in 0u64..600_000,
            paused in 0u64..600_000,
            after in 0u64..600_000,
        ) {
            let mut timer = RaceTimer::new(1);
            timer.start(0);
            timer.pause(before);
            let elapsed_before = timer.current_time();

            timer.resume(before + paused);
            timer.complete_lap(before + paused + after);

            prop_assert!(timer.is_finished());
            prop_assert_eq!(timer.current_time(), elapsed_before + after);
            prop_assert_eq!(timer.lap_times(), &[before + after]);
        }

        #[test]
        fn prop_best_is_min(durations in prop::collection::vec(0u64..120_000, 1..10)) {
            let mut timer = RaceTimer::new(durations.len() as u32);
            let mut now = 0;
            timer.start(now);
            for d in &durations {
                now += d;
                timer.complete_lap(now);
            }
            prop_assert!(timer.is_finished());
            prop_assert_eq!(timer.best_time(), durations.iter().copied().min());
            prop_assert_eq!(timer.current_lap() as usize, durations.len() + 1);
        }
    }
}
