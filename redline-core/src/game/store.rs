//! Game State Store
//!
//! Owns the profile aggregate and keeps it in sync with durable storage.
//! The snapshot is loaded once at construction; after that every
//! successful mutation is written back. Storage failures never reach
//! the caller: a bad load falls back to the default profile and a
//! failed save is logged and dropped.

use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::catalog::Catalog;
use crate::game::achievements;
use crate::game::state::{
    GameState, PlayerUpdate, ProgressUpdate, RaceResult, SettingsUpdate, StatsUpdate,
};
use crate::storage::{Storage, StorageError};
use crate::STORAGE_KEY;

/// A store shared between the host and running race sessions.
pub type SharedStore<S> = Arc<RwLock<GameStore<S>>>;

/// Store errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// Spending more cash than the player has.
    #[error("Insufficient funds: balance {balance}, requested {requested}")]
    InsufficientFunds {
        /// Cash on hand
        balance: i64,
        /// Amount asked for
        requested: i64,
    },
}

/// The profile aggregate bound to a storage backend.
pub struct GameStore<S: Storage> {
    state: GameState,
    storage: S,
    key: String,
}

impl<S: Storage> GameStore<S> {
    /// Open the store under the default key.
    pub fn open(storage: S) -> Self {
        Self::open_with_key(storage, STORAGE_KEY)
    }

    /// Open the store under a custom key.
    pub fn open_with_key(storage: S, key: &str) -> Self {
        let state = load_snapshot(&storage, key);
        Self {
            state,
            storage,
            key: key.to_string(),
        }
    }

    /// Wrap for sharing with race sessions.
    pub fn into_shared(self) -> SharedStore<S> {
        Arc::new(RwLock::new(self))
    }

    /// Current profile.
    pub fn state(&self) -> &GameState {
        &self.state
    }

    /// Storage backend.
    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Storage key.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Write the current snapshot.
    pub fn save(&self) -> Result<(), StorageError> {
        let json = serde_json::to_string(&self.state)?;
        self.storage.save(&self.key, &json)
    }

    /// Save after a mutation. Failures are logged, never returned.
    fn persist(&self) {
        if let Err(e) = self.save() {
            warn!("Failed to save game state under {:?}: {}", self.key, e);
        }
    }

    /// Apply a mutation and persist it.
    fn commit<T>(&mut self, f: impl FnOnce(&mut GameState) -> T) -> T {
        let out = f(&mut self.state);
        self.persist();
        out
    }

    // =========================================================================
    // Player actions
    // =========================================================================

    /// Merge fields into the player.
    pub fn update_player(&mut self, update: PlayerUpdate) {
        self.commit(|s| update.apply(&mut s.player));
    }

    /// Add cash.
    pub fn add_cash(&mut self, amount: i64) {
        self.commit(|s| s.add_cash(amount));
    }

    /// Spend cash. On failure nothing changes and nothing is written.
    pub fn spend_cash(&mut self, amount: i64) -> Result<(), StoreError> {
        self.state.spend_cash(amount)?;
        self.persist();
        Ok(())
    }

    /// Add XP.
    pub fn add_xp(&mut self, amount: u64) {
        self.commit(|s| s.add_xp(amount));
    }

    /// Add a vehicle to the collection.
    pub fn unlock_car(&mut self, car_id: &str) {
        if self.commit(|s| s.unlock_car(car_id)) {
            debug!("Unlocked car {}", car_id);
        }
    }

    /// Flip a vehicle's favourite flag.
    pub fn toggle_favorite_car(&mut self, car_id: &str) -> bool {
        self.commit(|s| s.toggle_favorite_car(car_id))
    }

    /// Select the active vehicle.
    pub fn select_car(&mut self, car_id: &str) {
        self.commit(|s| s.select_car(car_id));
    }

    // =========================================================================
    // Stats actions
    // =========================================================================

    /// Merge fields into the stats.
    pub fn update_stats(&mut self, update: StatsUpdate) {
        self.commit(|s| update.apply(&mut s.stats));
    }

    /// Integrate a finished race.
    pub fn record_race_result(&mut self, result: &RaceResult) -> ProgressUpdate {
        let update = self.commit(|s| s.record_race_result(result));
        if update.leveled_up() {
            info!("Level up: {} -> {}", update.previous_level, update.level);
        }
        update
    }

    /// Record a race result and unlock every achievement it earns, as one
    /// write.
    pub fn record_race_completion(
        &mut self,
        result: &RaceResult,
        catalog: &Catalog,
    ) -> (ProgressUpdate, Vec<&'static str>) {
        let (update, earned) = self.commit(|s| {
            let update = s.record_race_result(result);
            let earned = achievements::newly_earned(s, catalog);
            for id in &earned {
                s.unlock_achievement(id);
            }
            (update, earned)
        });
        if update.leveled_up() {
            info!("Level up: {} -> {}", update.previous_level, update.level);
        }
        for id in &earned {
            info!("Achievement unlocked: {}", id);
        }
        (update, earned)
    }

    // =========================================================================
    // Achievements & settings
    // =========================================================================

    /// Unlock an achievement.
    pub fn unlock_achievement(&mut self, achievement_id: &str) {
        if self.commit(|s| s.unlock_achievement(achievement_id)) {
            info!("Achievement unlocked: {}", achievement_id);
        }
    }

    /// Unlock every achievement the profile now qualifies for.
    ///
    /// Writes at most once. Returns the ids that were newly unlocked.
    pub fn unlock_earned_achievements(&mut self, catalog: &Catalog) -> Vec<&'static str> {
        let earned = achievements::newly_earned(&self.state, catalog);
        if earned.is_empty() {
            return earned;
        }
        self.commit(|s| {
            for id in &earned {
                s.unlock_achievement(id);
            }
        });
        for id in &earned {
            info!("Achievement unlocked: {}", id);
        }
        earned
    }

    /// Merge fields into the settings.
    pub fn update_settings(&mut self, update: SettingsUpdate) {
        self.commit(|s| update.apply(&mut s.settings));
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// Rounded win percentage.
    pub fn win_rate(&self) -> u32 {
        self.state.win_rate()
    }

    /// XP to the next level.
    pub fn next_level_xp(&self) -> i64 {
        self.state.next_level_xp()
    }

    /// Can the player pay `amount`?
    pub fn can_afford(&self, amount: i64) -> bool {
        self.state.can_afford(amount)
    }

    /// Restore the starting profile and clear the stored snapshot.
    pub fn reset(&mut self) {
        self.state = GameState::default();
        if let Err(e) = self.storage.remove(&self.key) {
            warn!("Failed to clear game state under {:?}: {}", self.key, e);
        }
        info!("Game state reset to defaults");
    }
}

/// Read the snapshot, falling back to defaults on any failure.
fn load_snapshot<S: Storage>(storage: &S, key: &str) -> GameState {
    match storage.load(key) {
        Ok(Some(text)) => match serde_json::from_str(&text) {
            Ok(state) => {
                debug!("Loaded game state from {:?}", key);
                state
            }
            Err(e) => {
                warn!("Failed to parse game state under {:?}: {}", key, e);
                GameState::default()
            }
        },
        Ok(None) => {
            debug!("No saved game state under {:?}, using defaults", key);
            GameState::default()
        }
        Err(e) => {
            warn!("Failed to load game state under {:?}: {}", key, e);
            GameState::default()
        }
    }
}
