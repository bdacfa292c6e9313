//! Core primitives.
//!
//! Deterministic randomness and race-time arithmetic shared by the
//! timer, the store and the race orchestration.

pub mod rng;
pub mod time;

// Re-export core types
pub use rng::{DeterministicRng, derive_attempt_seed};
pub use time::{RaceTime, ParseRaceTimeError, format_time, format_play_time};
