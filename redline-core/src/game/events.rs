//! Race Events
//!
//! Events emitted by a race attempt, in the order they happened.
//! The session forwards them to the host unchanged.

use serde::{Serialize, Deserialize};

use crate::game::race::RaceOutcome;

/// Race event data.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum RaceEventData {
    /// Countdown advanced; `remaining` seconds left before the start
    CountdownTick {
        remaining: u32,
    },

    /// Countdown reached zero and the clock is running
    Started,

    /// Simulated speed changed
    SpeedUpdated {
        /// km/h
        speed: f64,
        /// Distance covered so far (km)
        distance_km: f64,
        /// Live standing, 1 = leading
        position: u32,
    },

    /// A lap closed
    LapCompleted {
        /// Lap number, starting at 1
        lap: u32,
        /// Lap duration (ms)
        duration_ms: u64,
        /// Fastest lap so far (ms)
        best_ms: u64,
    },

    /// Clock halted
    Paused,

    /// Clock running again
    Resumed,

    /// Attempt returned to its pre-countdown state
    Reset,

    /// Final lap closed
    Finished(RaceOutcome),
}

/// A race event stamped with the attempt clock.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RaceEvent {
    /// Timer reading when the event occurred (ms)
    pub race_time_ms: u64,

    /// Event data
    pub data: RaceEventData,
}

impl RaceEvent {
    /// Create a new event.
    pub fn new(race_time_ms: u64, data: RaceEventData) -> Self {
        Self { race_time_ms, data }
    }

    /// Create countdown event.
    pub fn countdown(remaining: u32) -> Self {
        Self::new(0, RaceEventData::CountdownTick { remaining })
    }

    /// Create lap completed event.
    pub fn lap_completed(race_time_ms: u64, lap: u32, duration_ms: u64, best_ms: u64) -> Self {
        Self::new(race_time_ms, RaceEventData::LapCompleted { lap, duration_ms, best_ms })
    }

    /// The outcome, if this is the finish event.
    pub fn outcome(&self) -> Option<&RaceOutcome> {
        match &self.data {
            RaceEventData::Finished(outcome) => Some(outcome),
            _ => None,
        }
    }

    /// Is this the finish event?
    pub fn is_finish(&self) -> bool {
        matches!(self.data, RaceEventData::Finished(_))
    }
}
