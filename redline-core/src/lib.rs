//! # Redline Core
//!
//! State core for the Redline racing dashboard: the vehicle and race
//! catalog, the race timer, race orchestration and the persisted player
//! profile.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                       REDLINE CORE                           │
//! ├─────────────────────────────────────────────────────────────┤
//! │  core/           - Primitives                                │
//! │  ├── rng.rs      - Seeded Xorshift128+ PRNG                  │
//! │  └── time.rs     - Centisecond race time, formatting         │
//! │                                                              │
//! │  catalog/        - Static reference data (read-only)         │
//! │  ├── vehicles.rs - Vehicle table                             │
//! │  └── race_modes.rs - Race modes and tracks                   │
//! │                                                              │
//! │  game/           - Game logic (no clocks, no tasks)          │
//! │  ├── state.rs    - Profile aggregate, result reducer         │
//! │  ├── store.rs    - Aggregate bound to storage                │
//! │  ├── timer.rs    - Lap timer state machine                   │
//! │  ├── race.rs     - Race attempt orchestration                │
//! │  ├── achievements.rs - Achievement criteria                  │
//! │  └── events.rs   - Race events                               │
//! │                                                              │
//! │  storage/        - Key-value port (memory, file)             │
//! │                                                              │
//! │  runtime/        - Async drivers (tokio)                     │
//! │  ├── scheduler.rs- RAII periodic tickers                     │
//! │  └── session.rs  - Race session driver and host handle       │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Determinism
//!
//! `game/` never reads a clock: every timer and race operation takes
//! the current instant from the caller, and all randomness comes from a
//! per-attempt seeded RNG. `runtime/` supplies real time; tests and
//! [`game::race::simulate_attempt`] supply virtual time.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod core;
pub mod catalog;
pub mod game;
pub mod storage;
pub mod runtime;

// Re-export commonly used types
pub use crate::core::rng::DeterministicRng;
pub use crate::core::time::{RaceTime, format_time};
pub use crate::catalog::Catalog;
pub use crate::game::state::{GameState, RaceResult};
pub use crate::game::store::{GameStore, SharedStore, StoreError};
pub use crate::game::timer::RaceTimer;
pub use crate::game::race::{RaceAttempt, RaceConfig, RaceOutcome, RaceRequest, RaceSetupError};
pub use crate::storage::{Storage, StorageError, MemoryStorage, FileStorage};
pub use crate::runtime::{RaceSession, RaceSessionHandle, SessionConfig, SessionError};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Storage key of the profile snapshot
pub const STORAGE_KEY: &str = "redline-game-state";

/// XP per level
pub const XP_PER_LEVEL: u64 = 1000;

/// Countdown tick period (ms)
pub const COUNTDOWN_TICK_MS: u64 = 1000;

/// Elapsed-time tick period (ms)
pub const TIMER_TICK_MS: u64 = 10;

/// Speed tick period (ms)
pub const SPEED_TICK_MS: u64 = 200;
