//! Achievement definitions and unlock criteria.

use serde::Serialize;

use crate::catalog::{Catalog, VehicleCategory};
use crate::game::state::GameState;

/// Achievement rarity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum Rarity {
    /// Most players get it
    Common,
    /// Takes some effort
    Rare,
    /// Takes dedication
    Epic,
    /// Hardest to earn
    Legendary,
}

/// An achievement and the condition that unlocks it.
#[derive(Clone, Debug, Serialize)]
pub struct AchievementDef {
    /// Achievement ID
    pub id: &'static str,
    /// Display name
    pub name: &'static str,
    /// How to earn it
    pub description: &'static str,
    /// Rarity tier
    pub rarity: Rarity,
    #[serde(skip)]
    criterion: fn(&GameState, &Catalog) -> bool,
}

impl AchievementDef {
    /// Does the profile satisfy the unlock condition?
    pub fn is_met(&self, state: &GameState, catalog: &Catalog) -> bool {
        (self.criterion)(state, catalog)
    }
}

fn owned_exotics(state: &GameState, catalog: &Catalog) -> usize {
    catalog
        .unlocked_vehicles(&state.player)
        .iter()
        .filter(|v| matches!(v.category, VehicleCategory::Supercar | VehicleCategory::Hypercar))
        .count()
}

/// Every achievement, in profile display order.
pub static ACHIEVEMENTS: &[AchievementDef] = &[
    AchievementDef {
        id: "first-win",
        name: "First Victory",
        description: "Win your first race",
        rarity: Rarity::Common,
        criterion: |s, _| s.stats.races_won >= 1,
    },
    AchievementDef {
        id: "speed-demon",
        name: "Speed Demon",
        description: "Reach 300+ km/h",
        rarity: Rarity::Rare,
        criterion: |s, _| s.stats.top_speed >= 300,
    },
    AchievementDef {
        id: "drift-master",
        name: "Drift Master",
        description: "Score 50,000+ drift points",
        rarity: Rarity::Epic,
        criterion: |s, _| s.stats.drift_score >= 50_000,
    },
    AchievementDef {
        id: "car-collector",
        name: "Car Collector",
        description: "Own 10+ supercars",
        rarity: Rarity::Rare,
        criterion: |s, c| owned_exotics(s, c) >= 10,
    },
    AchievementDef {
        id: "street-legend",
        name: "Street Legend",
        description: "Win 100+ races",
        rarity: Rarity::Legendary,
        criterion: |s, _| s.stats.races_won >= 100,
    },
];

/// Look up an achievement.
pub fn find_achievement(id: &str) -> Option<&'static AchievementDef> {
    ACHIEVEMENTS.iter().find(|a| a.id == id)
}

/// Achievements whose condition holds but which are not yet unlocked.
pub fn newly_earned(state: &GameState, catalog: &Catalog) -> Vec<&'static str> {
    ACHIEVEMENTS
        .iter()
        .filter(|a| !state.achievements.contains(a.id) && a.is_met(state, catalog))
        .map(|a| a.id)
        .collect()
}
