//! Runtime Layer
//!
//! Async drivers for race attempts. This layer owns the clocks and the
//! tasks; all race logic runs through `game/`.

pub mod scheduler;
pub mod session;

pub use scheduler::PeriodicTask;
pub use session::{RaceSession, RaceSessionHandle, SessionCommand, SessionConfig, SessionError};
