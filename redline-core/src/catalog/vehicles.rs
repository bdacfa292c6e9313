//! Vehicle catalog data.

use serde::Serialize;

// =============================================================================
// VEHICLE TYPES
// =============================================================================

/// Vehicle class.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum VehicleCategory {
    /// Top tier road cars
    Hypercar,
    /// Exotic performance cars
    Supercar,
    /// Track-focused sports cars
    Sports,
    /// Historic cars
    Classic,
    /// Battery electric
    Electric,
}

impl VehicleCategory {
    /// All categories in garage filter order.
    pub const ALL: [VehicleCategory; 5] = [
        VehicleCategory::Hypercar,
        VehicleCategory::Supercar,
        VehicleCategory::Sports,
        VehicleCategory::Electric,
        VehicleCategory::Classic,
    ];

    /// Identifier used by race requirements.
    pub fn id(self) -> &'static str {
        match self {
            VehicleCategory::Hypercar => "hypercar",
            VehicleCategory::Supercar => "supercar",
            VehicleCategory::Sports => "sports",
            VehicleCategory::Classic => "classic",
            VehicleCategory::Electric => "electric",
        }
    }

    /// Plural display name.
    pub fn display_name(self) -> &'static str {
        match self {
            VehicleCategory::Hypercar => "Hypercars",
            VehicleCategory::Supercar => "Supercars",
            VehicleCategory::Sports => "Sports Cars",
            VehicleCategory::Classic => "Classic",
            VehicleCategory::Electric => "Electric",
        }
    }
}

/// Which wheels are driven.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum Drivetrain {
    /// All-wheel drive
    AWD,
    /// Rear-wheel drive
    RWD,
    /// Front-wheel drive
    FWD,
}

/// Manufacturer figures.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VehicleSpecs {
    /// Top speed (km/h)
    pub top_speed: u32,
    /// 0-100 km/h (seconds)
    pub acceleration: f32,
    /// Power (hp)
    pub power: u32,
    /// Weight (kg)
    pub weight: u32,
    /// Driven wheels
    pub drivetrain: Drivetrain,
}

/// Normalised 1-10 ratings used for the garage bars.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct PerformanceRating {
    /// Straight-line speed
    pub speed: u8,
    /// Cornering
    pub handling: u8,
    /// Launch
    pub acceleration: u8,
    /// Stopping power
    pub braking: u8,
}

/// A catalog vehicle.
///
/// `unlocked` and `favorite` are the catalog defaults only; the player's
/// own unlock and favourite sets take precedence (see
/// [`Catalog::garage`](super::Catalog::garage)).
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Vehicle {
    /// Vehicle ID
    pub id: &'static str,
    /// Display name
    pub name: &'static str,
    /// Manufacturer
    pub brand: &'static str,
    /// Model name
    pub model: &'static str,
    /// Model year
    pub year: u16,
    /// Garage category
    pub category: VehicleCategory,
    /// Price in credits
    pub price: u64,
    /// Manufacturer figures
    pub specs: VehicleSpecs,
    /// Garage ratings
    pub performance: PerformanceRating,
    /// Paint colour (hex)
    pub color: &'static str,
    /// Owned by default
    pub unlocked: bool,
    /// Favourite by default
    pub favorite: bool,
    /// Flavour text
    pub description: &'static str,
}

impl Vehicle {
    /// Target cruising speed for the race simulation.
    pub fn target_speed(&self, ratio: f64) -> f64 {
        self.specs.top_speed as f64 * ratio
    }
}

// =============================================================================
// BUILT-IN VEHICLES
// =============================================================================

/// The built-in vehicle table.
pub static VEHICLES: &[Vehicle] = &[
    Vehicle {
        id: "lamborghini-aventador",
        name: "Aventador SVJ",
        brand: "Lamborghini",
        model: "Aventador SVJ",
        year: 2023,
        category: VehicleCategory::Hypercar,
        price: 517_000,
        specs: VehicleSpecs { top_speed: 350, acceleration: 2.8, power: 770, weight: 1525, drivetrain: Drivetrain::AWD },
        performance: PerformanceRating { speed: 10, handling: 8, acceleration: 9, braking: 8 },
        color: "Orange",
        unlocked: true,
        favorite: true,
        description: "The ultimate expression of Lamborghini's V12 legacy. Pure adrenaline in automotive form.",
    },
    Vehicle {
        id: "mclaren-720s",
        name: "720S",
        brand: "McLaren",
        model: "720S",
        year: 2023,
        category: VehicleCategory::Supercar,
        price: 299_000,
        specs: VehicleSpecs { top_speed: 341, acceleration: 2.9, power: 720, weight: 1419, drivetrain: Drivetrain::RWD },
        performance: PerformanceRating { speed: 9, handling: 10, acceleration: 9, braking: 9 },
        color: "Papaya Orange",
        unlocked: true,
        favorite: false,
        description: "McLaren's masterpiece of aerodynamic efficiency and raw performance.",
    },
    Vehicle {
        id: "ferrari-sf90",
        name: "SF90 Stradale",
        brand: "Ferrari",
        model: "SF90 Stradale",
        year: 2023,
        category: VehicleCategory::Hypercar,
        price: 625_000,
        specs: VehicleSpecs { top_speed: 340, acceleration: 2.5, power: 1000, weight: 1570, drivetrain: Drivetrain::AWD },
        performance: PerformanceRating { speed: 10, handling: 9, acceleration: 10, braking: 9 },
        color: "Rosso Corsa",
        unlocked: false,
        favorite: false,
        description: "Ferrari's first plug-in hybrid supercar. The future of prancing horse performance.",
    },
    Vehicle {
        id: "porsche-gt3rs",
        name: "911 GT3 RS",
        brand: "Porsche",
        model: "911 GT3 RS",
        year: 2023,
        category: VehicleCategory::Sports,
        price: 223_000,
        specs: VehicleSpecs { top_speed: 296, acceleration: 3.0, power: 525, weight: 1450, drivetrain: Drivetrain::RWD },
        performance: PerformanceRating { speed: 8, handling: 10, acceleration: 8, braking: 10 },
        color: "Guards Red",
        unlocked: true,
        favorite: true,
        description: "The track-focused evolution of the iconic 911. Precision engineering at its finest.",
    },
    Vehicle {
        id: "bugatti-chiron",
        name: "Chiron Pur Sport",
        brand: "Bugatti",
        model: "Chiron Pur Sport",
        year: 2023,
        category: VehicleCategory::Hypercar,
        price: 3_500_000,
        specs: VehicleSpecs { top_speed: 380, acceleration: 2.3, power: 1500, weight: 1940, drivetrain: Drivetrain::AWD },
        performance: PerformanceRating { speed: 10, handling: 7, acceleration: 10, braking: 8 },
        color: "Dark Blue Carbon",
        unlocked: false,
        favorite: false,
        description: "The pinnacle of automotive engineering. 1,500 horsepower of pure luxury and speed.",
    },
    Vehicle {
        id: "koenigsegg-regera",
        name: "Regera",
        brand: "Koenigsegg",
        model: "Regera",
        year: 2023,
        category: VehicleCategory::Hypercar,
        price: 1_900_000,
        specs: VehicleSpecs { top_speed: 400, acceleration: 2.8, power: 1360, weight: 1628, drivetrain: Drivetrain::RWD },
        performance: PerformanceRating { speed: 10, handling: 8, acceleration: 10, braking: 8 },
        color: "Ghost White",
        unlocked: false,
        favorite: false,
        description: "Swedish engineering marvel combining hybrid technology with extreme performance.",
    },
    Vehicle {
        id: "nissan-gtr",
        name: "GT-R NISMO",
        brand: "Nissan",
        model: "GT-R NISMO",
        year: 2023,
        category: VehicleCategory::Sports,
        price: 215_000,
        specs: VehicleSpecs { top_speed: 315, acceleration: 2.7, power: 600, weight: 1720, drivetrain: Drivetrain::AWD },
        performance: PerformanceRating { speed: 9, handling: 8, acceleration: 9, braking: 8 },
        color: "Midnight Black",
        unlocked: true,
        favorite: false,
        description: "Godzilla evolved. Japanese precision meets track-bred performance.",
    },
    Vehicle {
        id: "tesla-roadster",
        name: "Roadster",
        brand: "Tesla",
        model: "Roadster",
        year: 2024,
        category: VehicleCategory::Electric,
        price: 250_000,
        specs: VehicleSpecs { top_speed: 400, acceleration: 1.9, power: 1020, weight: 1800, drivetrain: Drivetrain::AWD },
        performance: PerformanceRating { speed: 10, handling: 8, acceleration: 10, braking: 9 },
        color: "Pearl White",
        unlocked: false,
        favorite: false,
        description: "The future of supercars. Electric performance that defies physics.",
    },
    Vehicle {
        id: "aston-martin-valkyrie",
        name: "Valkyrie",
        brand: "Aston Martin",
        model: "Valkyrie",
        year: 2023,
        category: VehicleCategory::Hypercar,
        price: 3_200_000,
        specs: VehicleSpecs { top_speed: 402, acceleration: 2.5, power: 1176, weight: 1030, drivetrain: Drivetrain::RWD },
        performance: PerformanceRating { speed: 10, handling: 10, acceleration: 10, braking: 10 },
        color: "Racing Green",
        unlocked: false,
        favorite: false,
        description: "Formula 1 technology for the road. Adrian Newey's aerodynamic masterpiece.",
    },
    Vehicle {
        id: "ford-gt",
        name: "GT",
        brand: "Ford",
        model: "GT",
        year: 2023,
        category: VehicleCategory::Supercar,
        price: 450_000,
        specs: VehicleSpecs { top_speed: 347, acceleration: 3.0, power: 647, weight: 1386, drivetrain: Drivetrain::RWD },
        performance: PerformanceRating { speed: 9, handling: 9, acceleration: 9, braking: 9 },
        color: "Gulf Blue",
        unlocked: true,
        favorite: false,
        description: "American racing heritage reborn. Le Mans-winning DNA in street form.",
    },
];

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    #[test]
    fn test_vehicle_ids_unique() {
        let ids: BTreeSet<_> = VEHICLES.iter().map(|v| v.id).collect();
        assert_eq!(ids.len(), VEHICLES.len());
    }

    #[test]
    fn test_ratings_in_range() {
        for v in VEHICLES {
            let p = v.performance;
            for score in [p.speed, p.handling, p.acceleration, p.braking] {
                assert!((1..=10).contains(&score), "{} rating out of range", v.id);
            }
        }
    }

    #[test]
    fn test_target_speed() {
        let gt = VEHICLES.iter().find(|v| v.id == "ford-gt").unwrap();
        assert!((gt.target_speed(0.8) - 277.6).abs() < 1e-9);
    }
}
