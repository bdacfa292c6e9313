//! Catalog Module
//!
//! Static, read-only reference data: vehicles and race modes with their
//! tracks. Every accessor is pure; a missing id is `None` or an empty
//! list, never an error.
//!
//! ## Module Structure
//!
//! - `vehicles`: vehicle types and the built-in vehicle table
//! - `race_modes`: race modes, tracks and the built-in mode table

pub mod vehicles;
pub mod race_modes;

pub use vehicles::{Vehicle, VehicleCategory, VehicleSpecs, PerformanceRating, Drivetrain, VEHICLES};
pub use race_modes::{
    RaceMode, Track, Rewards, Requirements, ModeDifficulty, Weather, Surface, RACE_MODES,
};

use serde::Serialize;

use crate::game::state::Player;

// =============================================================================
// REQUIREMENTS
// =============================================================================

/// Why a player/vehicle pair may not enter a race mode.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum RequirementFailure {
    /// Player level too low.
    #[error("requires level {required}, player is level {actual}")]
    LevelTooLow {
        /// Minimum level
        required: u32,
        /// Player's level
        actual: u32,
    },

    /// Vehicle class not allowed.
    #[error("vehicle category {0:?} is not allowed")]
    CategoryNotAllowed(VehicleCategory),

    /// Mode is restricted to specific vehicles.
    #[error("vehicle {0} is not eligible")]
    VehicleNotEligible(String),
}

/// Check a race mode's entry requirements.
pub fn meets_requirements(
    mode: &RaceMode,
    player_level: u32,
    vehicle: &Vehicle,
) -> Result<(), RequirementFailure> {
    let req = &mode.requirements;

    if let Some(required) = req.min_level {
        if player_level < required {
            return Err(RequirementFailure::LevelTooLow { required, actual: player_level });
        }
    }

    if !req.category.is_empty() && !req.category.contains(&vehicle.category) {
        return Err(RequirementFailure::CategoryNotAllowed(vehicle.category));
    }

    if !req.specific_car.is_empty() && !req.specific_car.contains(&vehicle.id) {
        return Err(RequirementFailure::VehicleNotEligible(vehicle.id.to_string()));
    }

    Ok(())
}

// =============================================================================
// GARAGE VIEW
// =============================================================================

/// Garage sort order.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SortKey {
    /// Brand, A-Z
    #[default]
    Name,
    /// Most expensive first
    Price,
    /// Fastest first
    Speed,
    /// Most powerful first
    Power,
}

/// Garage filter.
#[derive(Clone, Debug, Default)]
pub struct GarageQuery {
    /// Restrict to one category (`None` = all cars)
    pub category: Option<VehicleCategory>,
    /// Case-insensitive brand/model substring
    pub search: String,
    /// Sort order
    pub sort: SortKey,
}

/// A catalog vehicle with the player's own unlock/favourite state applied.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct VehicleView<'a> {
    /// Catalog entry
    pub vehicle: &'a Vehicle,
    /// Player owns this vehicle
    pub unlocked: bool,
    /// Player marked it favourite
    pub favorite: bool,
}

// =============================================================================
// CATALOG
// =============================================================================

/// Read-only access to vehicles and race modes.
#[derive(Clone, Copy, Debug)]
pub struct Catalog {
    vehicles: &'static [Vehicle],
    race_modes: &'static [RaceMode],
}

impl Default for Catalog {
    fn default() -> Self {
        Self::builtin()
    }
}

impl Catalog {
    /// Catalog over custom tables.
    pub const fn new(vehicles: &'static [Vehicle], race_modes: &'static [RaceMode]) -> Self {
        Self { vehicles, race_modes }
    }

    /// The data shipped with the game.
    pub const fn builtin() -> Self {
        Self::new(VEHICLES, RACE_MODES)
    }

    /// All vehicles in catalog order.
    pub fn vehicles(&self) -> &'static [Vehicle] {
        self.vehicles
    }

    /// All race modes in catalog order.
    pub fn race_modes(&self) -> &'static [RaceMode] {
        self.race_modes
    }

    /// Look up a vehicle.
    pub fn find_vehicle(&self, id: &str) -> Option<&'static Vehicle> {
        self.vehicles.iter().find(|v| v.id == id)
    }

    /// Vehicles of one category.
    pub fn vehicles_by_category(&self, category: VehicleCategory) -> Vec<&'static Vehicle> {
        self.vehicles.iter().filter(|v| v.category == category).collect()
    }

    /// Vehicles the player owns. Catalog default flags are ignored.
    pub fn unlocked_vehicles(&self, player: &Player) -> Vec<&'static Vehicle> {
        self.vehicles
            .iter()
            .filter(|v| player.unlocked_cars.contains(v.id))
            .collect()
    }

    /// Owned vehicles the player marked favourite.
    pub fn favorite_vehicles(&self, player: &Player) -> Vec<&'static Vehicle> {
        self.vehicles
            .iter()
            .filter(|v| player.unlocked_cars.contains(v.id) && player.favorite_cars.contains(v.id))
            .collect()
    }

    /// Look up a race mode.
    pub fn find_race_mode(&self, id: &str) -> Option<&'static RaceMode> {
        self.race_modes.iter().find(|m| m.id == id)
    }

    /// Look up a track within a race mode.
    pub fn find_track(&self, race_mode_id: &str, track_id: &str) -> Option<&'static Track> {
        self.find_race_mode(race_mode_id)?
            .tracks
            .iter()
            .find(|t| t.id == track_id)
    }

    /// Race modes open to a player of the given level.
    pub fn available_race_modes(&self, player_level: u32) -> Vec<&'static RaceMode> {
        self.race_modes
            .iter()
            .filter(|m| m.requirements.min_level.is_none_or(|min| player_level >= min))
            .collect()
    }

    /// Garage listing with the player's overlay applied.
    pub fn garage(&self, player: &Player, query: &GarageQuery) -> Vec<VehicleView<'static>> {
        let needle = query.search.to_lowercase();

        let mut views: Vec<VehicleView<'static>> = self
            .vehicles
            .iter()
            .filter(|v| query.category.is_none_or(|c| v.category == c))
            .filter(|v| {
                needle.is_empty()
                    || v.brand.to_lowercase().contains(&needle)
                    || v.model.to_lowercase().contains(&needle)
            })
            .map(|v| VehicleView {
                vehicle: v,
                unlocked: player.unlocked_cars.contains(v.id),
                favorite: player.favorite_cars.contains(v.id),
            })
            .collect();

        // Stable sort keeps catalog order for ties
        match query.sort {
            SortKey::Name => views.sort_by_key(|view| view.vehicle.brand),
            SortKey::Price => views.sort_by(|a, b| b.vehicle.price.cmp(&a.vehicle.price)),
            SortKey::Speed => {
                views.sort_by(|a, b| b.vehicle.specs.top_speed.cmp(&a.vehicle.specs.top_speed))
            }
            SortKey::Power => views.sort_by(|a, b| b.vehicle.specs.power.cmp(&a.vehicle.specs.power)),
        }

        views
    }
}
