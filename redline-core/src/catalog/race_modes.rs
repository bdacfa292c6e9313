//! Race mode and track catalog data.

use serde::Serialize;

use super::vehicles::VehicleCategory;

// =============================================================================
// TRACK
// =============================================================================

/// Track weather.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum Weather {
    /// Dry, full grip
    Clear,
    /// Wet surface
    Rain,
    /// Dark, lit circuit
    Night,
    /// Reduced visibility
    Fog,
}

/// Track surface.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum Surface {
    /// Paved road
    Asphalt,
    /// Loose surface
    Dirt,
    /// Paved and loose sections
    Mixed,
}

/// A track within a race mode.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Track {
    /// Track ID
    pub id: &'static str,
    /// Display name
    pub name: &'static str,
    /// City or region
    pub location: &'static str,
    /// Lap length (km)
    pub length: f64,
    /// Number of corners
    pub turns: u32,
    /// Difficulty rating 1-10
    pub difficulty: u8,
    /// Race-day conditions
    pub weather: Weather,
    /// Road surface
    pub surface: Surface,
    /// Course record, `M:SS.CC`
    pub best_time: &'static str,
    /// Flavour text
    pub description: &'static str,
}

// =============================================================================
// RACE MODE
// =============================================================================

/// Race mode difficulty tier.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum ModeDifficulty {
    /// Entry level
    Easy,
    /// Intermediate
    Medium,
    /// Advanced
    Hard,
    /// Top tier
    Extreme,
}

/// Base rewards for finishing a race in this mode.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Rewards {
    /// Base cash before the position multiplier
    pub cash: u64,
    /// XP awarded regardless of position
    pub xp: u64,
    /// Item and title ids granted by the mode
    pub unlocks: &'static [&'static str],
}

/// Entry requirements. Empty lists mean "no restriction".
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Requirements {
    /// Minimum player level, if any
    pub min_level: Option<u32>,
    /// Allowed categories; empty allows all
    pub category: &'static [VehicleCategory],
    /// Allowed vehicle IDs; empty allows all
    pub specific_car: &'static [&'static str],
}

/// A race mode with its tracks.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RaceMode {
    /// Race mode ID
    pub id: &'static str,
    /// Display name
    pub name: &'static str,
    /// Flavour text
    pub description: &'static str,
    /// Difficulty label
    pub difficulty: ModeDifficulty,
    /// Nominal duration (seconds)
    pub duration: u32,
    /// Laps per attempt
    pub laps: u32,
    /// Base rewards
    pub rewards: Rewards,
    /// Entry requirements
    pub requirements: Requirements,
    /// Tracks in this mode
    pub tracks: &'static [Track],
}

impl RaceMode {
    /// Look up one of this mode's tracks.
    pub fn track(&self, track_id: &str) -> Option<&Track> {
        self.tracks.iter().find(|t| t.id == track_id)
    }
}

// =============================================================================
// BUILT-IN RACE MODES
// =============================================================================

const NO_REQUIREMENTS: Requirements = Requirements {
    min_level: Some(1),
    category: &[],
    specific_car: &[],
};

/// The built-in race mode table.
pub static RACE_MODES: &[RaceMode] = &[
    RaceMode {
        id: "street",
        name: "Street Racing",
        description: "Illegal underground races through city streets. High risk, high reward.",
        difficulty: ModeDifficulty::Medium,
        duration: 180,
        laps: 3,
        rewards: Rewards { cash: 50_000, xp: 1500, unlocks: &["street-king-title"] },
        requirements: NO_REQUIREMENTS,
        tracks: &[
            Track {
                id: "downtown-dash",
                name: "Downtown Dash",
                location: "Neo Tokyo",
                length: 5.2,
                turns: 18,
                difficulty: 7,
                weather: Weather::Night,
                surface: Surface::Asphalt,
                best_time: "2:15.33",
                description: "Navigate through neon-lit streets with heavy traffic and tight corners.",
            },
            Track {
                id: "highway-heat",
                name: "Highway Heat",
                location: "Miami Coast",
                length: 8.1,
                turns: 12,
                difficulty: 8,
                weather: Weather::Clear,
                surface: Surface::Asphalt,
                best_time: "3:42.89",
                description: "High-speed highway racing with police pursuit and ocean views.",
            },
            Track {
                id: "underground-tunnel",
                name: "Underground Tunnel",
                location: "New York Subway",
                length: 3.8,
                turns: 8,
                difficulty: 9,
                weather: Weather::Night,
                surface: Surface::Asphalt,
                best_time: "1:58.67",
                description: "Claustrophobic tunnel racing with echoing engine sounds and concrete walls.",
            },
        ],
    },
    RaceMode {
        id: "circuit",
        name: "Circuit Racing",
        description: "Professional racing on world-famous circuits. Pure skill and speed.",
        difficulty: ModeDifficulty::Hard,
        duration: 300,
        laps: 3,
        rewards: Rewards { cash: 75_000, xp: 2500, unlocks: &["pro-racer-title", "racing-suit"] },
        requirements: Requirements {
            min_level: Some(5),
            category: &[VehicleCategory::Supercar, VehicleCategory::Hypercar],
            specific_car: &[],
        },
        tracks: &[
            Track {
                id: "silverstone-grand",
                name: "Silverstone Grand",
                location: "United Kingdom",
                length: 5.9,
                turns: 18,
                difficulty: 8,
                weather: Weather::Rain,
                surface: Surface::Asphalt,
                best_time: "1:24.56",
                description: "Historic British circuit with challenging weather conditions.",
            },
            Track {
                id: "monaco-street-circuit",
                name: "Monaco Street Circuit",
                location: "Monte Carlo",
                length: 3.3,
                turns: 19,
                difficulty: 10,
                weather: Weather::Clear,
                surface: Surface::Asphalt,
                best_time: "1:12.34",
                description: "The most prestigious street circuit with unforgiving barriers.",
            },
            Track {
                id: "spa-francorchamps",
                name: "Spa-Francorchamps",
                location: "Belgium",
                length: 7.0,
                turns: 19,
                difficulty: 9,
                weather: Weather::Fog,
                surface: Surface::Asphalt,
                best_time: "2:03.89",
                description: "Legendary circuit through the Belgian Ardennes with elevation changes.",
            },
        ],
    },
    RaceMode {
        id: "time-trial",
        name: "Time Trial",
        description: "Race against the clock. Perfect your racing line and set new records.",
        difficulty: ModeDifficulty::Easy,
        duration: 120,
        laps: 1,
        rewards: Rewards { cash: 25_000, xp: 1000, unlocks: &["precision-driver-title"] },
        requirements: NO_REQUIREMENTS,
        tracks: &[
            Track {
                id: "mountain-pass",
                name: "Mountain Pass",
                location: "Swiss Alps",
                length: 6.4,
                turns: 32,
                difficulty: 7,
                weather: Weather::Clear,
                surface: Surface::Asphalt,
                best_time: "3:45.12",
                description: "Challenging mountain road with breathtaking Alpine views.",
            },
            Track {
                id: "desert-highway",
                name: "Desert Highway",
                location: "Nevada, USA",
                length: 12.5,
                turns: 6,
                difficulty: 5,
                weather: Weather::Clear,
                surface: Surface::Asphalt,
                best_time: "4:23.78",
                description: "Long straight stretches perfect for testing top speed.",
            },
            Track {
                id: "coastal-road",
                name: "Coastal Road",
                location: "California Coast",
                length: 9.2,
                turns: 24,
                difficulty: 6,
                weather: Weather::Clear,
                surface: Surface::Asphalt,
                best_time: "4:56.34",
                description: "Scenic coastal route with ocean views and flowing corners.",
            },
        ],
    },
    RaceMode {
        id: "drift",
        name: "Drift Challenge",
        description: "Style over speed. Chain together perfect drifts for maximum points.",
        difficulty: ModeDifficulty::Hard,
        duration: 240,
        laps: 3,
        rewards: Rewards { cash: 60_000, xp: 2000, unlocks: &["drift-king-title", "smoke-tires"] },
        requirements: Requirements {
            min_level: Some(8),
            category: &[VehicleCategory::Sports, VehicleCategory::Supercar],
            specific_car: &[],
        },
        tracks: &[
            Track {
                id: "tokyo-drift-garage",
                name: "Tokyo Drift Garage",
                location: "Shibuya, Tokyo",
                length: 2.1,
                turns: 15,
                difficulty: 9,
                weather: Weather::Night,
                surface: Surface::Asphalt,
                best_time: "1:35.67",
                description: "Underground garage with tight corners perfect for drifting.",
            },
            Track {
                id: "mountain-touge",
                name: "Mountain Touge",
                location: "Mount Fuji, Japan",
                length: 5.8,
                turns: 28,
                difficulty: 10,
                weather: Weather::Night,
                surface: Surface::Asphalt,
                best_time: "3:12.45",
                description: "Classic Japanese mountain pass with hairpin turns.",
            },
        ],
    },
    RaceMode {
        id: "police-chase",
        name: "Police Chase",
        description: "Outrun the law in high-speed pursuits. Don't get caught!",
        difficulty: ModeDifficulty::Extreme,
        duration: 360,
        laps: 3,
        rewards: Rewards { cash: 100_000, xp: 3000, unlocks: &["outlaw-title", "stealth-mode"] },
        requirements: Requirements {
            min_level: Some(12),
            category: &[VehicleCategory::Supercar, VehicleCategory::Hypercar],
            specific_car: &[],
        },
        tracks: &[
            Track {
                id: "downtown-pursuit",
                name: "Downtown Pursuit",
                location: "Los Angeles",
                length: 15.3,
                turns: 45,
                difficulty: 10,
                weather: Weather::Night,
                surface: Surface::Asphalt,
                best_time: "8:45.23",
                description: "Navigate through downtown while evading police helicopters.",
            },
            Track {
                id: "highway-getaway",
                name: "Highway Getaway",
                location: "Interstate 95",
                length: 22.7,
                turns: 12,
                difficulty: 8,
                weather: Weather::Rain,
                surface: Surface::Asphalt,
                best_time: "12:34.56",
                description: "High-speed highway chase with roadblocks and spike strips.",
            },
        ],
    },
];
