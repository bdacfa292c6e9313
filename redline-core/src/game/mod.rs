//! Game Logic Module
//!
//! Profile state, the race timer and race orchestration. Nothing in here
//! reads a clock or spawns a task; see `runtime` for the async driver.
//!
//! ## Module Structure
//!
//! - `state`: Player, stats, settings and the result reducer
//! - `store`: Profile aggregate bound to a storage backend
//! - `timer`: Lap timer state machine
//! - `race`: Race attempt (countdown, speed, laps, result)
//! - `achievements`: Achievement definitions and criteria
//! - `events`: Race events for the host

pub mod state;
pub mod store;
pub mod timer;
pub mod race;
pub mod achievements;
pub mod events;

// Re-export key types
pub use state::{
    GameState, Player, Stats, Settings, Difficulty, Units, RaceResult, ProgressUpdate,
    PlayerUpdate, StatsUpdate, SettingsUpdate, level_for_xp,
};
pub use store::{GameStore, SharedStore, StoreError};
pub use timer::{RaceTimer, TimerStatus, LapRecord};
pub use race::{
    RaceAttempt, RaceConfig, RaceRequest, RaceSetupError, RacePhase, RaceOutcome,
    RaceCompletion, Standing, Opponent, OpponentProfile, TickResult, simulate_attempt,
};
pub use achievements::{AchievementDef, Rarity, ACHIEVEMENTS};
pub use events::{RaceEvent, RaceEventData};
