//! Profile State Definitions
//!
//! The persisted aggregate: player, stats, achievements and settings.
//! Sets use BTreeSet so the serialized snapshot is stable.

use std::collections::BTreeSet;
use serde::{Serialize, Deserialize};

use crate::core::time::RaceTime;
use crate::game::store::StoreError;
use crate::XP_PER_LEVEL;

/// Level implied by an XP total.
#[inline]
pub fn level_for_xp(xp: u64) -> u32 {
    u32::try_from(xp / XP_PER_LEVEL).unwrap_or(u32::MAX - 1) + 1
}

// =============================================================================
// PLAYER
// =============================================================================

/// The player's identity, progression and collection.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Player {
    /// Player ID
    pub id: String,
    /// Display name
    pub name: String,

    /// Never decreases through XP gain
    pub level: u32,
    /// Total XP earned
    pub xp: u64,

    /// Spending can never take this below zero
    pub cash: i64,
    /// Reputation points
    pub reputation: u64,

    /// Selected vehicle (not validated against `unlocked_cars`)
    pub current_car: Option<String>,
    /// Owned vehicle IDs
    pub unlocked_cars: BTreeSet<String>,
    /// Favourite vehicle IDs
    pub favorite_cars: BTreeSet<String>,
    /// Earned titles
    pub titles: BTreeSet<String>,
    /// Displayed title
    pub current_title: Option<String>,
}

/// Shallow merge for [`Player`]; `None` leaves a field untouched.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PlayerUpdate {
    /// New display name
    pub name: Option<String>,
    /// New level
    pub level: Option<u32>,
    /// New XP total
    pub xp: Option<u64>,
    /// New cash balance
    pub cash: Option<i64>,
    /// New reputation
    pub reputation: Option<u64>,
    /// New selected vehicle; `Some(None)` clears it
    pub current_car: Option<Option<String>>,
    /// Replacement owned set
    pub unlocked_cars: Option<BTreeSet<String>>,
    /// Replacement favourite set
    pub favorite_cars: Option<BTreeSet<String>>,
    /// Replacement title set
    pub titles: Option<BTreeSet<String>>,
    /// New displayed title; `Some(None)` clears it
    pub current_title: Option<Option<String>>,
}

impl PlayerUpdate {
    /// Apply to a player.
    pub fn apply(self, player: &mut Player) {
        if let Some(v) = self.name { player.name = v; }
        if let Some(v) = self.level { player.level = v; }
        if let Some(v) = self.xp { player.xp = v; }
        if let Some(v) = self.cash { player.cash = v; }
        if let Some(v) = self.reputation { player.reputation = v; }
        if let Some(v) = self.current_car { player.current_car = v; }
        if let Some(v) = self.unlocked_cars { player.unlocked_cars = v; }
        if let Some(v) = self.favorite_cars { player.favorite_cars = v; }
        if let Some(v) = self.titles { player.titles = v; }
        if let Some(v) = self.current_title { player.current_title = v; }
    }
}

// =============================================================================
// STATS
// =============================================================================

/// Career statistics.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Stats {
    /// Races finished first
    pub races_won: u32,
    /// Races finished lower
    pub races_lost: u32,
    /// Always `races_won + races_lost`
    pub total_races: u32,
    /// Fastest lap on record
    pub best_lap_time: Option<RaceTime>,
    /// km/h
    pub top_speed: u32,
    /// Best drift score
    pub drift_score: u64,
    /// Police chases escaped
    pub police_escapes: u32,
    /// Seconds
    pub total_play_time: u64,
}

/// Shallow merge for [`Stats`].
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StatsUpdate {
    /// New win count
    pub races_won: Option<u32>,
    /// New loss count
    pub races_lost: Option<u32>,
    /// New race count
    pub total_races: Option<u32>,
    /// New best lap; `Some(None)` clears it
    pub best_lap_time: Option<Option<RaceTime>>,
    /// New top speed (km/h)
    pub top_speed: Option<u32>,
    /// New drift score
    pub drift_score: Option<u64>,
    /// New escape count
    pub police_escapes: Option<u32>,
    /// New play time (seconds)
    pub total_play_time: Option<u64>,
}

impl StatsUpdate {
    /// Apply to stats.
    pub fn apply(self, stats: &mut Stats) {
        if let Some(v) = self.races_won { stats.races_won = v; }
        if let Some(v) = self.races_lost { stats.races_lost = v; }
        if let Some(v) = self.total_races { stats.total_races = v; }
        if let Some(v) = self.best_lap_time { stats.best_lap_time = v; }
        if let Some(v) = self.top_speed { stats.top_speed = v; }
        if let Some(v) = self.drift_score { stats.drift_score = v; }
        if let Some(v) = self.police_escapes { stats.police_escapes = v; }
        if let Some(v) = self.total_play_time { stats.total_play_time = v; }
    }
}

// =============================================================================
// SETTINGS
// =============================================================================

/// AI difficulty.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Difficulty {
    /// Slower opponents
    Easy,
    /// Standard opponents
    #[default]
    Normal,
    /// Faster opponents
    Hard,
}

impl Difficulty {
    /// Opponent pace multiplier.
    pub fn opponent_pace(self) -> f64 {
        match self {
            Difficulty::Easy => 0.85,
            Difficulty::Normal => 0.95,
            Difficulty::Hard => 1.05,
        }
    }
}

/// Display units.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Units {
    /// km/h, km
    #[default]
    Metric,
    /// mph, miles
    Imperial,
}

/// Audio and gameplay settings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    /// Master sound switch
    pub sound_enabled: bool,
    /// 0.0 - 1.0
    pub music_volume: f32,
    /// 0.0 - 1.0
    pub sfx_volume: f32,
    /// AI difficulty
    pub difficulty: Difficulty,
    /// Display units
    pub units: Units,
}

/// Shallow merge for [`Settings`]. Volumes are clamped to [0, 1].
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SettingsUpdate {
    /// New sound switch
    pub sound_enabled: Option<bool>,
    /// New music volume
    pub music_volume: Option<f32>,
    /// New effects volume
    pub sfx_volume: Option<f32>,
    /// New AI difficulty
    pub difficulty: Option<Difficulty>,
    /// New display units
    pub units: Option<Units>,
}

impl SettingsUpdate {
    /// Apply to settings.
    pub fn apply(self, settings: &mut Settings) {
        if let Some(v) = self.sound_enabled { settings.sound_enabled = v; }
        if let Some(v) = self.music_volume { settings.music_volume = v.clamp(0.0, 1.0); }
        if let Some(v) = self.sfx_volume { settings.sfx_volume = v.clamp(0.0, 1.0); }
        if let Some(v) = self.difficulty { settings.difficulty = v; }
        if let Some(v) = self.units { settings.units = v; }
    }
}

// =============================================================================
// RACE RESULT
// =============================================================================

/// A finished race, as fed into [`GameState::record_race_result`].
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RaceResult {
    /// Finished first
    pub won: bool,
    /// Best lap of the race, if it counts as a record
    pub lap_time: Option<RaceTime>,
    /// Peak speed (km/h)
    pub top_speed: Option<u32>,
    /// Drift score, if scored
    pub drift_score: Option<u64>,
    /// Cash awarded
    pub cash_earned: i64,
    /// XP awarded
    pub xp_earned: u64,
}

/// What changed when a result was recorded.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ProgressUpdate {
    /// Level before the result
    pub previous_level: u32,
    /// Level after the result
    pub level: u32,
    /// Best lap improved
    pub new_best_lap: bool,
    /// Top speed improved
    pub new_top_speed: bool,
    /// Drift score improved
    pub new_drift_score: bool,
}

impl ProgressUpdate {
    /// Did the player gain a level?
    pub fn leveled_up(&self) -> bool {
        self.level > self.previous_level
    }
}

// =============================================================================
// GAME STATE
// =============================================================================

/// The complete persisted profile.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GameState {
    /// Profile
    pub player: Player,
    /// Career statistics
    pub stats: Stats,
    /// Unlocked achievement IDs
    pub achievements: BTreeSet<String>,
    /// Audio and gameplay settings
    pub settings: Settings,
}

fn id_set(ids: &[&str]) -> BTreeSet<String> {
    ids.iter().map(|s| s.to_string()).collect()
}

impl Default for GameState {
    /// The starting profile.
    fn default() -> Self {
        Self {
            player: Player {
                id: "player_001".to_string(),
                name: "Speed Demon".to_string(),
                level: 15,
                xp: 12_750,
                cash: 485_000,
                reputation: 8420,
                current_car: Some("lamborghini-aventador".to_string()),
                unlocked_cars: id_set(&[
                    "lamborghini-aventador",
                    "mclaren-720s",
                    "porsche-gt3rs",
                    "nissan-gtr",
                    "ford-gt",
                ]),
                favorite_cars: id_set(&["lamborghini-aventador", "porsche-gt3rs"]),
                titles: id_set(&["Rookie Racer", "Street King", "Pro Racer", "Precision Driver"]),
                current_title: Some("Pro Racer".to_string()),
            },
            stats: Stats {
                races_won: 127,
                races_lost: 34,
                total_races: 161,
                best_lap_time: Some(RaceTime::from_centis(8345)), // 1:23.45
                top_speed: 347,
                drift_score: 95_420,
                police_escapes: 23,
                total_play_time: 89_640,
            },
            achievements: id_set(&[
                "first-win",
                "speed-demon",
                "drift-master",
                "car-collector",
                "street-legend",
            ]),
            settings: Settings {
                sound_enabled: true,
                music_volume: 0.7,
                sfx_volume: 0.8,
                difficulty: Difficulty::Normal,
                units: Units::Metric,
            },
        }
    }
}

impl GameState {
    /// Add (or, with a negative amount, remove) cash.
    pub fn add_cash(&mut self, amount: i64) {
        self.player.cash = self.player.cash.saturating_add(amount);
    }

    /// Spend cash. Leaves the balance untouched when it would go negative.
    pub fn spend_cash(&mut self, amount: i64) -> Result<(), StoreError> {
        let balance = self.player.cash;
        match balance.checked_sub(amount) {
            Some(remaining) if remaining >= 0 => {
                self.player.cash = remaining;
                Ok(())
            }
            _ => Err(StoreError::InsufficientFunds { balance, requested: amount }),
        }
    }

    /// Add XP, raising the level if the curve says so.
    pub fn add_xp(&mut self, amount: u64) {
        self.player.xp = self.player.xp.saturating_add(amount);
        self.player.level = self.player.level.max(level_for_xp(self.player.xp));
    }

    /// Add a vehicle to the collection. Returns false if already owned.
    pub fn unlock_car(&mut self, car_id: &str) -> bool {
        self.player.unlocked_cars.insert(car_id.to_string())
    }

    /// Flip a vehicle's favourite flag. Returns the new flag.
    pub fn toggle_favorite_car(&mut self, car_id: &str) -> bool {
        if self.player.favorite_cars.remove(car_id) {
            false
        } else {
            self.player.favorite_cars.insert(car_id.to_string());
            true
        }
    }

    /// Select the active vehicle.
    pub fn select_car(&mut self, car_id: &str) {
        self.player.current_car = Some(car_id.to_string());
    }

    /// Unlock an achievement. Returns false if already unlocked.
    pub fn unlock_achievement(&mut self, achievement_id: &str) -> bool {
        self.achievements.insert(achievement_id.to_string())
    }

    /// Integrate a finished race into stats and progression.
    pub fn record_race_result(&mut self, result: &RaceResult) -> ProgressUpdate {
        let mut update = ProgressUpdate {
            previous_level: self.player.level,
            ..Default::default()
        };

        let stats = &mut self.stats;
        stats.total_races += 1;
        if result.won {
            stats.races_won += 1;
        } else {
            stats.races_lost += 1;
        }

        if let Some(lap) = result.lap_time {
            if stats.best_lap_time.is_none_or(|best| lap < best) {
                stats.best_lap_time = Some(lap);
                update.new_best_lap = true;
            }
        }

        if let Some(speed) = result.top_speed {
            if speed > stats.top_speed {
                stats.top_speed = speed;
                update.new_top_speed = true;
            }
        }

        if let Some(drift) = result.drift_score {
            if drift > stats.drift_score {
                stats.drift_score = drift;
                update.new_drift_score = true;
            }
        }

        self.add_cash(result.cash_earned);
        self.add_xp(result.xp_earned);

        update.level = self.player.level;
        update
    }

    /// Percentage of races won, rounded. 0 before the first race.
    pub fn win_rate(&self) -> u32 {
        let total = self.stats.total_races as u64;
        if total == 0 {
            return 0;
        }
        let won = self.stats.races_won as u64;
        // round(won / total * 100), half away from zero
        ((won * 200 + total) / (2 * total)) as u32
    }

    /// XP still needed to reach the next level.
    pub fn next_level_xp(&self) -> i64 {
        self.player.level as i64 * XP_PER_LEVEL as i64 - self.player.xp as i64
    }

    /// Progress through the current level, 0-100.
    pub fn xp_progress(&self) -> f64 {
        (self.player.xp % XP_PER_LEVEL) as f64 / XP_PER_LEVEL as f64 * 100.0
    }

    /// Can the player pay `amount`?
    pub fn can_afford(&self, amount: i64) -> bool {
        self.player.cash >= amount
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn rookie() -> GameState {
        let mut state = GameState::default();
        state.player.level = 1;
        state.player.xp = 0;
        state.stats = Stats {
            races_won: 0,
            races_lost: 0,
            total_races: 0,
            best_lap_time: None,
            top_speed: 0,
            drift_score: 0,
            police_escapes: 0,
            total_play_time: 0,
        };
        state
    }

    #[test]
    fn test_spend_cash_insufficient() {
        let mut state = GameState::default();
        state.player.cash = 500_000;

        let err = state.spend_cash(600_000).unwrap_err();
        assert_eq!(err, StoreError::InsufficientFunds { balance: 500_000, requested: 600_000 });
        assert_eq!(state.player.cash, 500_000);

        state.spend_cash(500_000).unwrap();
        assert_eq!(state.player.cash, 0);
    }

    #[test]
    fn test_add_xp_levels() {
        let mut state = rookie();
        state.add_xp(999);
        assert_eq!(state.player.level, 1);
        state.add_xp(1);
        assert_eq!(state.player.level, 2);
        state.add_xp(2500);
        assert_eq!(state.player.level, 4);
        assert_eq!(state.next_level_xp(), 500);
    }

    #[test]
    fn test_level_never_drops_below_current() {
        // Default profile is level 15 with 12,750 XP (curve says 13)
        let mut state = GameState::default();
        state.add_xp(100);
        assert_eq!(state.player.level, 15);
    }

    #[test]
    fn test_toggle_favorite() {
        let mut state = GameState::default();
        assert!(!state.toggle_favorite_car("porsche-gt3rs"));
        assert!(!state.player.favorite_cars.contains("porsche-gt3rs"));
        assert!(state.toggle_favorite_car("porsche-gt3rs"));
        assert!(state.player.favorite_cars.contains("porsche-gt3rs"));
    }

    #[test]
    fn test_record_race_result() {
        let mut state = rookie();
        state.player.cash = 0;

        let update = state.record_race_result(&RaceResult {
            won: true,
            lap_time: Some("1:30.00".parse().unwrap()),
            top_speed: Some(280),
            drift_score: None,
            cash_earned: 75_000,
            xp_earned: 1500,
        });

        assert_eq!(state.stats.total_races, 1);
        assert_eq!(state.stats.races_won, 1);
        assert_eq!(state.stats.top_speed, 280);
        assert_eq!(state.player.cash, 75_000);
        assert_eq!(state.player.xp, 1500);
        assert_eq!(state.player.level, 2);
        assert!(update.leveled_up() && update.new_best_lap && update.new_top_speed);
        assert!(!update.new_drift_score);

        // Slower lap and lower speed change nothing
        let update = state.record_race_result(&RaceResult {
            won: false,
            lap_time: Some("1:31.00".parse().unwrap()),
            top_speed: Some(200),
            ..Default::default()
        });
        assert!(!update.new_best_lap && !update.new_top_speed);
        assert_eq!(state.stats.best_lap_time.unwrap().to_string(), "1:30.00");
        assert_eq!(state.stats.races_lost, 1);
        assert_eq!(state.stats.total_races, 2);
    }

    #[test]
    fn test_best_lap_compares_numerically() {
        let mut state = rookie();
        state.stats.best_lap_time = Some("10:00.00".parse().unwrap());

        state.record_race_result(&RaceResult {
            lap_time: Some("9:59.99".parse().unwrap()),
            ..Default::default()
        });
        assert_eq!(state.stats.best_lap_time.unwrap().to_string(), "9:59.99");
    }

    #[test]
    fn test_win_rate() {
        let mut state = rookie();
        assert_eq!(state.win_rate(), 0);

        state.stats.total_races = 3;
        state.stats.races_won = 1;
        assert_eq!(state.win_rate(), 33);

        state.stats.races_won = 2;
        assert_eq!(state.win_rate(), 67);

        state.stats.total_races = 8;
        state.stats.races_won = 1;
        // 12.5 rounds up
        assert_eq!(state.win_rate(), 13);
    }

    #[test]
    fn test_settings_update_clamps_volume() {
        let mut state = GameState::default();
        SettingsUpdate {
            music_volume: Some(1.5),
            sfx_volume: Some(-0.2),
            difficulty: Some(Difficulty::Hard),
            ..Default::default()
        }
        .apply(&mut state.settings);

        assert_eq!(state.settings.music_volume, 1.0);
        assert_eq!(state.settings.sfx_volume, 0.0);
        assert_eq!(state.settings.difficulty, Difficulty::Hard);
        assert!(state.settings.sound_enabled);
    }

    #[test]
    fn test_player_update_merges() {
        let mut state = GameState::default();
        PlayerUpdate {
            name: Some("Drift King".to_string()),
            current_title: Some(None),
            ..Default::default()
        }
        .apply(&mut state.player);

        assert_eq!(state.player.name, "Drift King");
        assert_eq!(state.player.current_title, None);
        assert_eq!(state.player.level, 15);
    }

    #[test]
    fn test_snapshot_shape() {
        let json = serde_json::to_value(GameState::default()).unwrap();
        assert_eq!(json["player"]["currentCar"], "lamborghini-aventador");
        assert_eq!(json["stats"]["bestLapTime"], "1:23.45");
        assert_eq!(json["settings"]["difficulty"], "Normal");
        assert!(json["achievements"].is_array());
    }

    proptest! {
        #[test]
        fn prop_level_monotonic(steps in prop::collection::vec((any::<bool>(), 0u64..5000), 1..50)) {
            let mut state = rookie();
            let mut last_level = state.player.level;

            for (as_race, xp) in steps {
                if as_race {
                    state.record_race_result(&RaceResult { xp_earned: xp, ..Default::default() });
                } else {
                    state.add_xp(xp);
                }
                prop_assert!(state.player.level >= last_level);
                prop_assert_eq!(state.player.level, state.player.level.max(level_for_xp(state.player.xp)));
                last_level = state.player.level;
            }
        }

        #[test]
        fn prop_spend_cash_safety(cash in 0i64..10_000_000, amount in 0i64..10_000_000) {
            let mut state = GameState::default();
            state.player.cash = cash;

            let result = state.spend_cash(amount);
            if amount > cash {
                prop_assert!(result.is_err());
                prop_assert_eq!(state.player.cash, cash);
            } else {
                prop_assert!(result.is_ok());
                prop_assert_eq!(state.player.cash, cash - amount);
            }
        }

        #[test]
        fn prop_unlocks_idempotent(id in "[a-z-]{1,20}") {
            let mut once = GameState::default();
            once.unlock_car(&id);
            once.unlock_achievement(&id);

            let mut twice = once.clone();
            prop_assert!(!twice.unlock_car(&id));
            prop_assert!(!twice.unlock_achievement(&id));
            prop_assert_eq!(once, twice);
        }

        #[test]
        fn prop_best_values_ratchet(
            results in prop::collection::vec(
                (prop::option::of(0u64..100_000), prop::option::of(0u32..500), prop::option::of(0u64..200_000)),
                1..30,
            )
        ) {
            let mut state = rookie();

            for (lap_centis, speed, drift) in results {
                let before = state.stats.clone();
                let lap = lap_centis.map(RaceTime::from_centis);
                state.record_race_result(&RaceResult {
                    lap_time: lap,
                    top_speed: speed,
                    drift_score: drift,
                    ..Default::default()
                });

                prop_assert!(state.stats.top_speed >= before.top_speed);
                prop_assert!(state.stats.drift_score >= before.drift_score);
                prop_assert_eq!(state.stats.total_races, state.stats.races_won + state.stats.races_lost);

                match (before.best_lap_time, state.stats.best_lap_time) {
                    (Some(old), Some(new)) if old != new => {
                        prop_assert!(new < old);
                        prop_assert_eq!(Some(new), lap);
                    }
                    (Some(_), None) => prop_assert!(false, "best lap was cleared"),
                    _ => {}
                }
            }
        }
    }
}
