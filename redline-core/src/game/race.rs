//! Race Orchestration
//!
//! One race attempt: countdown, simulated speed, lap progression and the
//! terminal result. Like the timer, the attempt never reads a clock or
//! spawns anything; the session feeds it ticks with the current instant
//! and acts on the returned [`TickResult`].
//!
//! # Determinism
//!
//! All randomness (speed jitter, opponent pace) comes from the attempt's
//! own [`DeterministicRng`], seeded from the race mode, track, vehicle
//! and attempt number. The same request driven by the same tick
//! sequence produces the same events.

use serde::{Serialize, Deserialize};
use tracing::{debug, info};
#[cfg(feature = "debug-tracing")]
use tracing::trace;

use crate::catalog::{meets_requirements, Catalog, RaceMode, RequirementFailure, Track, Vehicle};
use crate::core::rng::DeterministicRng;
use crate::core::time::RaceTime;
use crate::game::events::{RaceEvent, RaceEventData};
use crate::game::state::{Difficulty, GameState, RaceResult};
use crate::game::timer::RaceTimer;
use crate::{COUNTDOWN_TICK_MS, SPEED_TICK_MS, TIMER_TICK_MS};

const MS_PER_HOUR: f64 = 3_600_000.0;

/// Virtual time after which [`simulate_attempt`] gives up.
const MAX_SIMULATED_MS: u64 = 6 * 3_600_000;

// =============================================================================
// CONFIGURATION
// =============================================================================

/// An AI driver.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OpponentProfile {
    /// Display name
    pub name: String,
    /// Cruising speed before difficulty scaling (km/h)
    pub nominal_speed: f64,
}

impl OpponentProfile {
    /// Create a profile.
    pub fn new(name: &str, nominal_speed: f64) -> Self {
        Self { name: name.to_string(), nominal_speed }
    }
}

/// The standard three-car field.
pub fn default_field() -> Vec<OpponentProfile> {
    vec![
        OpponentProfile::new("Lightning McQueen", 285.0),
        OpponentProfile::new("Max Verstappen", 290.0),
        OpponentProfile::new("Ayrton Senna", 280.0),
    ]
}

/// Configuration for a race attempt.
#[derive(Debug, Clone)]
pub struct RaceConfig {
    /// Countdown length (one tick per second)
    pub countdown_seconds: u32,
    /// Cruising speed as a fraction of the vehicle's top speed
    pub target_speed_ratio: f64,
    /// Max random speed change per speed tick (km/h)
    pub speed_jitter: i32,
    /// Max speed gained per speed tick when below target (km/h)
    pub acceleration_step: f64,
    /// Distance multiplier; above 1.0 the track is covered faster.
    /// Result times are reported in simulated time, and a scaled attempt
    /// never submits a lap record to the profile.
    pub time_scale: f64,
    /// Relative spread of opponent pace, drawn once per attempt
    pub opponent_pace_jitter: f64,
    /// AI field
    pub opponents: Vec<OpponentProfile>,
}

impl Default for RaceConfig {
    fn default() -> Self {
        Self {
            countdown_seconds: 3,
            target_speed_ratio: 0.8,
            speed_jitter: 10,
            acceleration_step: 12.0,
            time_scale: 1.0,
            opponent_pace_jitter: 0.03,
            opponents: default_field(),
        }
    }
}

// =============================================================================
// SETUP
// =============================================================================

/// What to race.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RaceRequest {
    /// Race mode ID
    pub race_mode_id: String,
    /// Track ID within the race mode
    pub track_id: String,
    /// Vehicle ID
    pub vehicle_id: String,
    /// Attempt number; part of the RNG seed
    pub attempt: u32,
}

impl RaceRequest {
    /// First attempt at a mode/track/vehicle combination.
    pub fn new(race_mode_id: &str, track_id: &str, vehicle_id: &str) -> Self {
        Self {
            race_mode_id: race_mode_id.to_string(),
            track_id: track_id.to_string(),
            vehicle_id: vehicle_id.to_string(),
            attempt: 1,
        }
    }

    /// Same combination, different attempt number.
    pub fn with_attempt(mut self, attempt: u32) -> Self {
        self.attempt = attempt;
        self
    }
}

/// Race setup errors. Fatal to the attempt.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RaceSetupError {
    /// No such race mode.
    #[error("Unknown race mode: {0}")]
    UnknownRaceMode(String),

    /// The race mode has no such track.
    #[error("Unknown track {track} in race mode {race_mode}")]
    UnknownTrack {
        /// Race mode id
        race_mode: String,
        /// Track id
        track: String,
    },

    /// No such vehicle.
    #[error("Unknown vehicle: {0}")]
    UnknownVehicle(String),

    /// Player or vehicle not eligible for the mode.
    #[error("Requirements not met: {0}")]
    RequirementsNotMet(#[from] RequirementFailure),
}

// =============================================================================
// RESULTS
// =============================================================================

/// Attempt phase.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum RacePhase {
    /// Set up, countdown not started
    Ready,
    /// Counting down to the start
    Countdown {
        /// Seconds left
        remaining: u32,
    },
    /// Clock started (it may be paused)
    Racing,
    /// Final lap closed
    Finished,
}

/// An opponent with its pace for this attempt.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Opponent {
    /// Display name
    pub name: String,
    /// Effective average speed (km/h)
    pub pace: f64,
}

/// One row of the final classification.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Standing {
    /// Driver name
    pub name: String,
    /// Final position, 1 = winner
    pub position: u32,
    /// Actual time for the player, projected time for opponents
    pub finish_time: RaceTime,
    /// True for the player's row
    pub is_player: bool,
}

/// The terminal result reported to the host.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RaceOutcome {
    /// Finished first
    pub won: bool,
    /// Total race time
    pub final_time: RaceTime,
    /// Fastest lap, if any lap closed
    pub best_lap_time: Option<RaceTime>,
    /// 1 = win
    pub position: u32,
    /// Cash awarded
    pub cash_earned: i64,
    /// XP awarded
    pub xp_earned: u64,
    /// Peak speed during the attempt (km/h)
    pub top_speed: u32,
    /// Final classification, fastest first
    pub standings: Vec<Standing>,
}

/// A finished attempt: the outcome plus the record for the profile.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RaceCompletion {
    /// What to feed into `record_race_result`
    pub record: RaceResult,
    /// What to show the host
    pub outcome: RaceOutcome,
}

/// Result of a tick.
#[derive(Debug, Default)]
pub struct TickResult {
    /// Events generated this tick
    pub events: Vec<RaceEvent>,
    /// Set on the tick that closed the final lap
    pub completion: Option<RaceCompletion>,
}

/// Cash multiplier in tenths: 1.5 for a win, 1.2 for the podium.
pub fn position_multiplier_tenths(position: u32) -> u64 {
    match position {
        1 => 15,
        2 | 3 => 12,
        _ => 10,
    }
}

/// Base cash scaled by finishing position, rounded half up.
pub fn reward_cash(base: u64, position: u32) -> u64 {
    base.saturating_mul(position_multiplier_tenths(position)).saturating_add(5) / 10
}

// =============================================================================
// RACE ATTEMPT
// =============================================================================

/// One attempt at a race mode, track and vehicle.
#[derive(Debug, Clone)]
pub struct RaceAttempt {
    race_mode: &'static RaceMode,
    track: &'static Track,
    vehicle: &'static Vehicle,
    player_name: String,
    difficulty: Difficulty,
    config: RaceConfig,
    rng: DeterministicRng,

    phase: RacePhase,
    timer: RaceTimer,

    /// km/h
    speed: f64,
    peak_speed: f64,
    distance_km: f64,
    /// Running time covered by `distance_km` (ms)
    integrated_ms: u64,

    opponents: Vec<Opponent>,
    outcome: Option<RaceOutcome>,
}

impl RaceAttempt {
    /// Resolve a request against the catalog and the player's profile.
    pub fn setup(
        catalog: &Catalog,
        request: &RaceRequest,
        state: &GameState,
        config: RaceConfig,
    ) -> Result<Self, RaceSetupError> {
        let race_mode = catalog
            .find_race_mode(&request.race_mode_id)
            .ok_or_else(|| RaceSetupError::UnknownRaceMode(request.race_mode_id.clone()))?;

        let track = catalog
            .find_track(&request.race_mode_id, &request.track_id)
            .ok_or_else(|| RaceSetupError::UnknownTrack {
                race_mode: request.race_mode_id.clone(),
                track: request.track_id.clone(),
            })?;

        let vehicle = catalog
            .find_vehicle(&request.vehicle_id)
            .ok_or_else(|| RaceSetupError::UnknownVehicle(request.vehicle_id.clone()))?;

        meets_requirements(race_mode, state.player.level, vehicle)?;

        let rng = DeterministicRng::for_attempt(
            &request.race_mode_id,
            &request.track_id,
            &request.vehicle_id,
            request.attempt,
        );

        debug!(
            "Race set up: {} / {} in {} (attempt {})",
            race_mode.id, track.id, vehicle.id, request.attempt
        );

        Ok(Self {
            race_mode,
            track,
            vehicle,
            player_name: state.player.name.clone(),
            difficulty: state.settings.difficulty,
            config,
            rng,
            phase: RacePhase::Ready,
            timer: RaceTimer::new(race_mode.laps),
            speed: 0.0,
            peak_speed: 0.0,
            distance_km: 0.0,
            integrated_ms: 0,
            opponents: Vec::new(),
            outcome: None,
        })
    }

    // =========================================================================
    // Host commands
    // =========================================================================

    /// Start the countdown. No-op unless ready.
    pub fn begin(&mut self, now: u64) -> TickResult {
        let mut result = TickResult::default();
        if self.phase != RacePhase::Ready {
            return result;
        }

        self.draw_opponents();

        match self.config.countdown_seconds {
            0 => self.start_racing(now, &mut result),
            remaining => {
                self.phase = RacePhase::Countdown { remaining };
                result.events.push(RaceEvent::countdown(remaining));
            }
        }
        result
    }

    /// Halt the clock. Only while racing.
    pub fn pause(&mut self, now: u64) -> TickResult {
        let mut result = TickResult::default();
        if self.phase == RacePhase::Racing && self.timer.pause(now) {
            result.events.push(RaceEvent::new(self.timer.current_time(), RaceEventData::Paused));
        }
        result
    }

    /// Restart a paused clock.
    pub fn resume(&mut self, now: u64) -> TickResult {
        let mut result = TickResult::default();
        if self.phase == RacePhase::Racing && self.timer.resume(now) {
            result.events.push(RaceEvent::new(self.timer.current_time(), RaceEventData::Resumed));
        }
        result
    }

    /// Return to the pre-countdown state. The RNG is not rewound.
    pub fn reset(&mut self) -> TickResult {
        let mut result = TickResult::default();
        if self.phase == RacePhase::Ready {
            return result;
        }

        self.phase = RacePhase::Ready;
        self.timer.reset();
        self.speed = 0.0;
        self.peak_speed = 0.0;
        self.distance_km = 0.0;
        self.integrated_ms = 0;
        self.opponents.clear();
        self.outcome = None;

        debug!("Race reset: {} / {}", self.race_mode.id, self.track.id);
        result.events.push(RaceEvent::new(0, RaceEventData::Reset));
        result
    }

    // =========================================================================
    // Ticks
    // =========================================================================

    /// Once-per-second countdown tick. The last one starts the clock.
    pub fn countdown_tick(&mut self, now: u64) -> TickResult {
        let mut result = TickResult::default();
        let RacePhase::Countdown { remaining } = self.phase else {
            return result;
        };

        if remaining <= 1 {
            self.start_racing(now, &mut result);
        } else {
            self.phase = RacePhase::Countdown { remaining: remaining - 1 };
            result.events.push(RaceEvent::countdown(remaining - 1));
        }
        result
    }

    /// Fine-grained clock tick.
    pub fn timer_tick(&mut self, now: u64) {
        if self.phase == RacePhase::Racing {
            self.timer.sample(now);
        }
    }

    /// Speed tick: integrate distance, update speed, close crossed laps.
    pub fn speed_tick(&mut self, now: u64) -> TickResult {
        let mut result = TickResult::default();
        if self.phase != RacePhase::Racing || !self.timer.is_running() {
            return result;
        }

        self.timer.sample(now);
        let elapsed = self.timer.current_time();
        let delta_ms = elapsed.saturating_sub(self.integrated_ms);
        self.integrated_ms = elapsed;

        self.distance_km += self.speed * delta_ms as f64 * self.config.time_scale / MS_PER_HOUR;
        self.update_speed();

        #[cfg(feature = "debug-tracing")]
        trace!(
            "t={}ms speed={:.1} distance={:.3}km lap={}",
            elapsed, self.speed, self.distance_km, self.timer.current_lap()
        );

        result.events.push(RaceEvent::new(
            elapsed,
            RaceEventData::SpeedUpdated {
                speed: self.speed,
                distance_km: self.distance_km,
                position: self.position(),
            },
        ));

        self.close_crossed_laps(now, &mut result);
        result
    }

    fn start_racing(&mut self, now: u64, result: &mut TickResult) {
        self.phase = RacePhase::Racing;
        self.timer.start(now);
        self.integrated_ms = 0;
        info!(
            "Race started: {} / {} in {}",
            self.race_mode.id, self.track.id, self.vehicle.id
        );
        result.events.push(RaceEvent::new(0, RaceEventData::Started));
    }

    fn draw_opponents(&mut self) {
        let factor = self.difficulty.opponent_pace();
        let spread = self.config.opponent_pace_jitter.abs();

        let mut opponents = Vec::with_capacity(self.config.opponents.len());
        for profile in &self.config.opponents {
            let jitter = self.rng.next_f64_range(1.0 - spread, 1.0 + spread);
            opponents.push(Opponent {
                name: profile.name.clone(),
                pace: profile.nominal_speed * factor * jitter,
            });
        }
        self.opponents = opponents;
    }

    fn update_speed(&mut self) {
        let target = self.vehicle.target_speed(self.config.target_speed_ratio).max(0.0);
        let jitter = self.config.speed_jitter.max(0);
        let noise = self.rng.next_int_range(-jitter, jitter) as f64;
        let accel = self.config.acceleration_step.min(target - self.speed);

        self.speed = (self.speed + noise + accel).clamp(0.0, target);
        self.peak_speed = self.peak_speed.max(self.speed);
    }

    /// Every full track length covered closes one lap, in order.
    fn close_crossed_laps(&mut self, now: u64, result: &mut TickResult) {
        while self.timer.is_running() {
            let laps_done = self.timer.lap_times().len() as f64;
            if self.distance_km < self.track.length * (laps_done + 1.0) {
                break;
            }
            let Some(lap) = self.timer.complete_lap(now) else {
                break;
            };
            let best = self.timer.best_time().unwrap_or(lap.duration_ms);
            debug!("Lap {} closed in {}ms", lap.lap, lap.duration_ms);
            result.events.push(RaceEvent::lap_completed(
                self.timer.current_time(),
                lap.lap,
                lap.duration_ms,
                best,
            ));

            if lap.finished {
                self.finish(result);
            }
        }
    }

    fn finish(&mut self, result: &mut TickResult) {
        self.phase = RacePhase::Finished;

        let final_ms = self.simulated_ms(self.timer.current_time());
        let position = self.position();
        let rewards = &self.race_mode.rewards;
        let cash_earned = i64::try_from(reward_cash(rewards.cash, position)).unwrap_or(i64::MAX);

        let outcome = RaceOutcome {
            won: position == 1,
            final_time: RaceTime::from_millis(final_ms),
            best_lap_time: self
                .timer
                .best_time()
                .map(|ms| RaceTime::from_millis(self.simulated_ms(ms))),
            position,
            cash_earned,
            xp_earned: rewards.xp,
            top_speed: self.peak_speed.round() as u32,
            standings: self.standings(final_ms),
        };

        // Compressed laps are not comparable with real ones
        let lap_time = if self.is_time_scaled() { None } else { outcome.best_lap_time };

        let record = RaceResult {
            won: outcome.won,
            lap_time,
            top_speed: Some(outcome.top_speed),
            drift_score: None,
            cash_earned,
            xp_earned: outcome.xp_earned,
        };

        info!(
            "Race finished: P{} in {} (best lap {:?}), +{} cash",
            position, outcome.final_time, outcome.best_lap_time.map(|t| t.to_string()), cash_earned
        );

        self.outcome = Some(outcome.clone());
        result.events.push(RaceEvent::new(
            self.timer.current_time(),
            RaceEventData::Finished(outcome.clone()),
        ));
        result.completion = Some(RaceCompletion { record, outcome });
    }

    fn standings(&self, final_ms: u64) -> Vec<Standing> {
        let pace = self.average_speed();
        let total_km = self.total_distance_km();

        let mut rows: Vec<(f64, Standing)> = Vec::with_capacity(self.opponents.len() + 1);
        rows.push((
            pace,
            Standing {
                name: self.player_name.clone(),
                position: 0,
                finish_time: RaceTime::from_millis(final_ms),
                is_player: true,
            },
        ));

        for opponent in &self.opponents {
            let opponent_pace = opponent.pace.max(f64::EPSILON);
            // Same distance at a different pace
            let projected_ms = if pace > 0.0 {
                final_ms as f64 * pace / opponent_pace
            } else {
                total_km * MS_PER_HOUR / opponent_pace
            };
            rows.push((
                opponent.pace,
                Standing {
                    name: opponent.name.clone(),
                    position: 0,
                    finish_time: RaceTime::from_millis(projected_ms.round() as u64),
                    is_player: false,
                },
            ));
        }

        // Faster first; the player wins ties
        rows.sort_by(|a, b| b.0.total_cmp(&a.0).then(b.1.is_player.cmp(&a.1.is_player)));

        rows.into_iter()
            .enumerate()
            .map(|(i, (_, mut standing))| {
                standing.position = i as u32 + 1;
                standing
            })
            .collect()
    }

    fn is_time_scaled(&self) -> bool {
        self.config.time_scale != 1.0
    }

    /// Running time (ms) converted to the time the same distance takes
    /// unscaled.
    fn simulated_ms(&self, running_ms: u64) -> u64 {
        (running_ms as f64 * self.config.time_scale.max(0.0)).round() as u64
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// Race mode being run.
    pub fn race_mode(&self) -> &'static RaceMode {
        self.race_mode
    }

    /// Track being run.
    pub fn track(&self) -> &'static Track {
        self.track
    }

    /// Vehicle being driven.
    pub fn vehicle(&self) -> &'static Vehicle {
        self.vehicle
    }

    /// Attempt configuration.
    pub fn config(&self) -> &RaceConfig {
        &self.config
    }

    /// Current phase.
    pub fn phase(&self) -> RacePhase {
        self.phase
    }

    /// The attempt's timer.
    pub fn timer(&self) -> &RaceTimer {
        &self.timer
    }

    /// Is the clock halted mid-race?
    pub fn is_paused(&self) -> bool {
        self.phase == RacePhase::Racing && self.timer.can_resume()
    }

    /// Current simulated speed (km/h).
    pub fn speed(&self) -> f64 {
        self.speed
    }

    /// Highest speed so far (km/h).
    pub fn peak_speed(&self) -> f64 {
        self.peak_speed
    }

    /// Distance covered (km).
    pub fn distance_km(&self) -> f64 {
        self.distance_km
    }

    /// Full race distance (km).
    pub fn total_distance_km(&self) -> f64 {
        self.track.length * self.race_mode.laps as f64
    }

    /// Opponents drawn for this attempt (empty before the countdown).
    pub fn opponents(&self) -> &[Opponent] {
        &self.opponents
    }

    /// Player's average speed so far (km/h), in unscaled terms.
    pub fn average_speed(&self) -> f64 {
        let scaled_ms = self.integrated_ms as f64 * self.config.time_scale;
        if scaled_ms <= 0.0 {
            return self.speed;
        }
        self.distance_km * MS_PER_HOUR / scaled_ms
    }

    /// Live standing: 1 + opponents with a faster pace.
    pub fn position(&self) -> u32 {
        let pace = self.average_speed();
        1 + self.opponents.iter().filter(|o| o.pace > pace).count() as u32
    }

    /// Terminal result, once finished.
    pub fn outcome(&self) -> Option<&RaceOutcome> {
        self.outcome.as_ref()
    }
}

// =============================================================================
// SIMULATION
// =============================================================================

/// Events and result of a simulated attempt.
#[derive(Debug, Default)]
pub struct SimulatedRace {
    /// All events in order
    pub events: Vec<RaceEvent>,
    /// `None` if the attempt did not finish
    pub completion: Option<RaceCompletion>,
    /// Virtual clock at the end (ms)
    pub ended_at: u64,
}

/// Drive an attempt to completion on a virtual clock.
///
/// Uses the same tick periods as a live session, without any waiting.
/// Used for replays and tests.
pub fn simulate_attempt(attempt: &mut RaceAttempt, start_ms: u64) -> SimulatedRace {
    let mut run = SimulatedRace::default();
    let mut now = start_ms;

    run.events.extend(attempt.begin(now).events);

    while let RacePhase::Countdown { .. } = attempt.phase() {
        now += COUNTDOWN_TICK_MS;
        run.events.extend(attempt.countdown_tick(now).events);
    }

    let deadline = now + MAX_SIMULATED_MS;
    let mut since_speed_tick = 0;

    while attempt.phase() == RacePhase::Racing && now < deadline {
        now += TIMER_TICK_MS;
        attempt.timer_tick(now);

        since_speed_tick += TIMER_TICK_MS;
        if since_speed_tick >= SPEED_TICK_MS {
            since_speed_tick = 0;
            let tick = attempt.speed_tick(now);
            run.events.extend(tick.events);
            if tick.completion.is_some() {
                run.completion = tick.completion;
                break;
            }
        }
    }

    run.ended_at = now;
    run
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::state::Difficulty;
    use proptest::prelude::*;

    fn attempt(mode: &str, track: &str, vehicle: &str) -> RaceAttempt {
        RaceAttempt::setup(
            &Catalog::builtin(),
            &RaceRequest::new(mode, track, vehicle),
            &GameState::default(),
            RaceConfig::default(),
        )
        .unwrap()
    }

    fn with_difficulty(difficulty: Difficulty) -> GameState {
        let mut state = GameState::default();
        state.settings.difficulty = difficulty;
        state
    }

    fn lap_events(events: &[RaceEvent]) -> Vec<u32> {
        events
            .iter()
            .filter_map(|e| match e.data {
                RaceEventData::LapCompleted { lap, .. } => Some(lap),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_setup_errors() {
        let catalog = Catalog::builtin();
        let state = GameState::default();
        let setup = |mode, track, vehicle| {
            RaceAttempt::setup(
                &catalog,
                &RaceRequest::new(mode, track, vehicle),
                &state,
                RaceConfig::default(),
            )
            .unwrap_err()
        };

        assert_eq!(
            setup("drag", "downtown-dash", "ford-gt"),
            RaceSetupError::UnknownRaceMode("drag".to_string())
        );
        assert!(matches!(
            setup("street", "monaco-street-circuit", "ford-gt"),
            RaceSetupError::UnknownTrack { .. }
        ));
        assert_eq!(
            setup("street", "downtown-dash", "delorean"),
            RaceSetupError::UnknownVehicle("delorean".to_string())
        );
        assert!(matches!(
            setup("circuit", "silverstone-grand", "porsche-gt3rs"),
            RaceSetupError::RequirementsNotMet(RequirementFailure::CategoryNotAllowed(_))
        ));
    }

    #[test]
    fn test_setup_checks_level() {
        let mut state = GameState::default();
        state.player.level = 3;
        let err = RaceAttempt::setup(
            &Catalog::builtin(),
            &RaceRequest::new("police-chase", "highway-getaway", "bugatti-chiron"),
            &state,
            RaceConfig::default(),
        )
        .unwrap_err();
        assert_eq!(
            err,
            RaceSetupError::RequirementsNotMet(RequirementFailure::LevelTooLow { required: 12, actual: 3 })
        );
    }

    #[test]
    fn test_countdown_then_start() {
        let mut race = attempt("street", "downtown-dash", "ford-gt");
        assert_eq!(race.phase(), RacePhase::Ready);

        let events = race.begin(0).events;
        assert_eq!(events, vec![RaceEvent::countdown(3)]);
        assert_eq!(race.opponents().len(), 3);

        // Ticks outside their phase do nothing
        assert!(race.speed_tick(500).events.is_empty());

        assert_eq!(race.countdown_tick(1000).events, vec![RaceEvent::countdown(2)]);
        assert_eq!(race.countdown_tick(2000).events, vec![RaceEvent::countdown(1)]);

        let events = race.countdown_tick(3000).events;
        assert_eq!(events, vec![RaceEvent::new(0, RaceEventData::Started)]);
        assert_eq!(race.phase(), RacePhase::Racing);
        assert!(race.timer().is_running());

        // A second begin is ignored
        assert!(race.begin(3500).events.is_empty());
    }

    #[test]
    fn test_full_race() {
        let mut race = attempt("street", "downtown-dash", "lamborghini-aventador");
        let run = simulate_attempt(&mut race, 10_000);
        let completion = run.completion.expect("race should finish");

        assert_eq!(race.phase(), RacePhase::Finished);
        assert_eq!(lap_events(&run.events), vec![1, 2, 3]);
        assert!(run.events.last().unwrap().is_finish());
        assert_eq!(run.events.iter().filter(|e| e.is_finish()).count(), 1);

        let timer = race.timer();
        assert!(timer.is_finished());
        assert_eq!(timer.lap_times().len(), 3);
        assert_eq!(timer.lap_times().iter().sum::<u64>(), timer.current_time());
        assert!(race.distance_km() >= race.total_distance_km());

        let outcome = &completion.outcome;
        assert_eq!(outcome.won, outcome.position == 1);
        assert_eq!(outcome.final_time, RaceTime::from_millis(timer.current_time()));
        assert_eq!(outcome.best_lap_time, timer.best_lap_time());
        assert_eq!(outcome.cash_earned as u64, reward_cash(50_000, outcome.position));
        assert_eq!(outcome.xp_earned, 1500);
        assert!(outcome.top_speed <= 280);
        assert_eq!(outcome.standings.len(), 4);
        assert_eq!(outcome.standings.iter().find(|s| s.is_player).unwrap().position, outcome.position);

        assert_eq!(completion.record.won, outcome.won);
        assert_eq!(completion.record.lap_time, outcome.best_lap_time);
        assert_eq!(completion.record.top_speed, Some(outcome.top_speed));
        assert_eq!(race.outcome(), Some(outcome));

        // Finished is terminal
        assert!(race.speed_tick(run.ended_at + 200).events.is_empty());
    }

    #[test]
    fn test_replay_is_deterministic() {
        let mut a = attempt("time-trial", "mountain-pass", "nissan-gtr");
        let mut b = attempt("time-trial", "mountain-pass", "nissan-gtr");
        let run_a = simulate_attempt(&mut a, 0);
        let run_b = simulate_attempt(&mut b, 0);
        assert_eq!(run_a.events, run_b.events);
        assert_eq!(run_a.completion, run_b.completion);
    }

    #[test]
    fn test_difficulty_sets_position() {
        let catalog = Catalog::builtin();
        let request = RaceRequest::new("street", "underground-tunnel", "bugatti-chiron");

        // Bugatti cruises at 304 km/h; the easy field tops out near 254
        let mut easy = RaceAttempt::setup(&catalog, &request, &with_difficulty(Difficulty::Easy), RaceConfig::default()).unwrap();
        let outcome = simulate_attempt(&mut easy, 0).completion.unwrap().outcome;
        assert_eq!(outcome.position, 1);
        assert!(outcome.won);
        assert_eq!(outcome.cash_earned, 75_000);

        // Porsche cruises at 237 km/h; the hard field starts at 285
        let request = RaceRequest::new("street", "underground-tunnel", "porsche-gt3rs");
        let mut hard = RaceAttempt::setup(&catalog, &request, &with_difficulty(Difficulty::Hard), RaceConfig::default()).unwrap();
        let outcome = simulate_attempt(&mut hard, 0).completion.unwrap().outcome;
        assert_eq!(outcome.position, 4);
        assert!(!outcome.won);
        assert_eq!(outcome.cash_earned, 50_000);
        assert!(!outcome.standings[3].name.is_empty());
        assert!(outcome.standings[3].is_player);
    }

    #[test]
    fn test_pause_freezes_progress() {
        let mut race = attempt("time-trial", "desert-highway", "ford-gt");
        race.begin(0);
        for t in 1..=3 {
            race.countdown_tick(t * 1000);
        }
        for t in 1..=20 {
            race.speed_tick(3000 + t * 200);
        }

        let paused = race.pause(7000).events;
        assert_eq!(paused, vec![RaceEvent::new(4000, RaceEventData::Paused)]);
        assert!(race.is_paused());

        let distance = race.distance_km();
        assert!(race.speed_tick(60_000).events.is_empty());
        race.timer_tick(60_000);
        assert_eq!(race.distance_km(), distance);
        assert_eq!(race.timer().current_time(), 4000);

        assert_eq!(race.resume(67_000).events, vec![RaceEvent::new(4000, RaceEventData::Resumed)]);
        race.speed_tick(67_200);
        assert_eq!(race.timer().current_time(), 4200);
        assert!(race.distance_km() > distance);
    }

    #[test]
    fn test_reset_returns_to_ready() {
        let mut race = attempt("street", "highway-heat", "mclaren-720s");
        simulate_attempt(&mut race, 0);
        assert_eq!(race.phase(), RacePhase::Finished);

        assert_eq!(race.reset().events, vec![RaceEvent::new(0, RaceEventData::Reset)]);
        assert_eq!(race.phase(), RacePhase::Ready);
        assert_eq!(race.timer(), &RaceTimer::new(3));
        assert_eq!(race.distance_km(), 0.0);
        assert!(race.opponents().is_empty());
        assert!(race.outcome().is_none());

        // Ready again; a second reset is a no-op
        assert!(race.reset().events.is_empty());
        assert!(simulate_attempt(&mut race, 0).completion.is_some());
    }

    #[test]
    fn test_many_laps_in_one_tick() {
        let config = RaceConfig { time_scale: 1e6, countdown_seconds: 0, ..Default::default() };
        let mut race = RaceAttempt::setup(
            &Catalog::builtin(),
            &RaceRequest::new("street", "downtown-dash", "ford-gt"),
            &GameState::default(),
            config,
        )
        .unwrap();

        assert_eq!(race.begin(0).events, vec![RaceEvent::new(0, RaceEventData::Started)]);
        // First tick integrates zero speed
        race.speed_tick(200);
        let tick = race.speed_tick(400);

        assert_eq!(lap_events(&tick.events), vec![1, 2, 3]);
        assert!(tick.completion.is_some());
        assert_eq!(race.timer().lap_times(), &[400, 0, 0]);

        // Zero-length laps never reach the profile
        let record = tick.completion.unwrap().record;
        assert_eq!(record.lap_time, None);
        let mut state = GameState::default();
        state.record_race_result(&record);
        assert_eq!(state.stats.best_lap_time, Some(RaceTime::from_centis(8345)));
    }

    #[test]
    fn test_scaled_race_reports_simulated_time() {
        let config = RaceConfig { time_scale: 40.0, ..Default::default() };
        let mut race = RaceAttempt::setup(
            &Catalog::builtin(),
            &RaceRequest::new("street", "downtown-dash", "lamborghini-aventador"),
            &GameState::default(),
            config,
        )
        .unwrap();
        let completion = simulate_attempt(&mut race, 0).completion.expect("race should finish");

        let timer = race.timer();
        let outcome = &completion.outcome;
        assert_eq!(outcome.final_time, RaceTime::from_millis(timer.current_time() * 40));
        assert_eq!(
            outcome.best_lap_time,
            timer.best_time().map(|ms| RaceTime::from_millis(ms * 40))
        );
        let player = outcome.standings.iter().find(|s| s.is_player).unwrap();
        assert_eq!(player.finish_time, outcome.final_time);

        // The profile keeps its real best lap
        assert_eq!(completion.record.lap_time, None);
        let mut state = GameState::default();
        let update = state.record_race_result(&completion.record);
        assert!(!update.new_best_lap);
        assert_eq!(state.stats.best_lap_time.unwrap().to_string(), "1:23.45");
        assert_eq!(state.stats.total_races, 162);
    }

    #[test]
    fn test_extreme_jitter_stays_in_band() {
        let config = RaceConfig { speed_jitter: i32::MAX, countdown_seconds: 0, ..Default::default() };
        let mut race = RaceAttempt::setup(
            &Catalog::builtin(),
            &RaceRequest::new("street", "downtown-dash", "ford-gt"),
            &GameState::default(),
            config,
        )
        .unwrap();
        let target = race.vehicle().target_speed(0.8);

        race.begin(0);
        for t in 1..=50 {
            race.speed_tick(t * SPEED_TICK_MS);
            assert!(race.speed() >= 0.0 && race.speed() <= target);
        }
    }

    #[test]
    fn test_reward_cash() {
        assert_eq!(reward_cash(50_000, 1), 75_000);
        assert_eq!(reward_cash(50_000, 2), 60_000);
        assert_eq!(reward_cash(50_000, 3), 60_000);
        assert_eq!(reward_cash(50_000, 4), 50_000);
        // 1.5 rounds up
        assert_eq!(reward_cash(1, 1), 2);
    }

    proptest! {
        #[test]
        fn prop_speed_stays_in_band(attempt_no in 1u32..500, ticks in 1usize..200) {
            let catalog = Catalog::builtin();
            let request = RaceRequest::new("street", "highway-heat", "nissan-gtr").with_attempt(attempt_no);
            let config = RaceConfig { countdown_seconds: 0, ..Default::default() };
            let mut race = RaceAttempt::setup(&catalog, &request, &GameState::default(), config).unwrap();
            let target = race.vehicle().target_speed(0.8);

            race.begin(0);
            for t in 1..=ticks as u64 {
                race.speed_tick(t * SPEED_TICK_MS);
                prop_assert!(race.speed() >= 0.0 && race.speed() <= target);
                prop_assert!(race.peak_speed() >= race.speed());
            }
        }
    }
}
