#![allow(missing_docs)]

use std::fmt;

use serde::{Deserialize, Serialize};

/// Global balance constants.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GameBalance {
    pub starting_credits: i64,
    pub fuel_cost_per_unit: i64,
    pub fuel_mass_per_unit: i64,
    pub distance_payout_mult: i64,
}

/// Ship stat touched by a module.
///
/// Tags that are not recognised are kept verbatim in [`StatModifier::Other`]
/// so they survive a save round-trip; applying one changes nothing.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum StatModifier {
    CargoCapacity,
    PassengerSlots,
    MaxFuel,
    BaseBurnRate,
    Other(String),
}

impl StatModifier {
    pub fn as_str(&self) -> &str {
        match self {
            Self::CargoCapacity => "cargo_capacity",
            Self::PassengerSlots => "passenger_slots",
            Self::MaxFuel => "max_fuel",
            Self::BaseBurnRate => "base_burn_rate",
            Self::Other(tag) => tag,
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, Self::Other(_))
    }
}

impl From<String> for StatModifier {
    fn from(value: String) -> Self {
        match value.as_str() {
            "cargo_capacity" => Self::CargoCapacity,
            "passenger_slots" => Self::PassengerSlots,
            "max_fuel" => Self::MaxFuel,
            "base_burn_rate" => Self::BaseBurnRate,
            _ => Self::Other(value),
        }
    }
}

impl From<StatModifier> for String {
    fn from(value: StatModifier) -> Self {
        match value {
            StatModifier::Other(tag) => tag,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for StatModifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Purchasable ship upgrade.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShipModule {
    pub key: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub cost: i64,
    pub stat_modifier: StatModifier,
    pub stat_value: i64,
    /// Mass added to the hull once installed.
    #[serde(default)]
    pub mass: i64,
}

/// Base stats for a model of ship.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShipTemplate {
    pub key: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub max_fuel: i64,
    pub base_burn_rate: i64,
    pub burn_damping: i64,
    pub base_mass: i64,
    pub cargo_capacity: u32,
    pub passenger_slots: u32,
    pub max_module_slots: u32,
}

/// Tradeable good.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Commodity {
    pub key: String,
    pub name: String,
    pub base_value: i64,
    pub mass: i64,
}

/// Ticket pricing and passenger mass.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PassengerConfig {
    pub base_ticket_price: i64,
    pub mass_per_passenger: i64,
}

/// A dockable world.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Planet {
    pub key: String,
    pub name: String,
    pub coordinates: [i64; 3],
    /// Commodity keys exported from here.
    #[serde(default)]
    pub production: Vec<String>,
    /// Commodity keys wanted here.
    #[serde(default)]
    pub demand: Vec<String>,
    #[serde(default)]
    pub min_cargo: u32,
    #[serde(default)]
    pub max_cargo: u32,
    #[serde(default)]
    pub min_passengers: u32,
    #[serde(default)]
    pub max_passengers: u32,
}

const DEFAULT_QUANTITY_RANGE: (u32, u32) = (1, 10);

impl Planet {
    /// Quantity bounds for cargo contracts posted here.
    pub fn cargo_range(&self) -> (u32, u32) {
        quantity_range(self.min_cargo, self.max_cargo)
    }

    /// Head-count bounds for passenger contracts posted here.
    pub fn passenger_range(&self) -> (u32, u32) {
        quantity_range(self.min_passengers, self.max_passengers)
    }
}

fn quantity_range(min: u32, max: u32) -> (u32, u32) {
    if max == 0 {
        return DEFAULT_QUANTITY_RANGE;
    }
    let min = min.max(1);
    (min.min(max), max)
}

/// Immutable galaxy definition loaded once per session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Universe {
    #[serde(rename = "game_balance", default)]
    pub balance: GameBalance,
    #[serde(default)]
    pub ship_templates: Vec<ShipTemplate>,
    #[serde(default)]
    pub commodities: Vec<Commodity>,
    #[serde(default)]
    pub planets: Vec<Planet>,
    #[serde(default)]
    pub ship_modules: Vec<ShipModule>,
    #[serde(default)]
    pub passenger_config: PassengerConfig,
}

impl Universe {
    pub fn planet(&self, key: &str) -> Option<&Planet> {
        self.planets.iter().find(|planet| planet.key == key)
    }

    pub fn template(&self, key: &str) -> Option<&ShipTemplate> {
        self.ship_templates.iter().find(|template| template.key == key)
    }

    pub fn commodity(&self, key: &str) -> Option<&Commodity> {
        self.commodities.iter().find(|commodity| commodity.key == key)
    }

    pub fn module(&self, key: &str) -> Option<&ShipModule> {
        self.ship_modules.iter().find(|module| module.key == key)
    }

    /// Resolve the template for a new ship, falling back to the first one
    /// declared when `preferred` is unknown.
    pub fn starter_template(&self, preferred: &str) -> Option<&ShipTemplate> {
        self.template(preferred).or_else(|| self.ship_templates.first())
    }

    /// Built-in galaxy used when no definition file can be loaded.
    pub fn fallback() -> Self {
        let planet = |key: &str,
                      name: &str,
                      coordinates: [i64; 3],
                      production: &[&str],
                      demand: &[&str]| Planet {
            key: key.to_string(),
            name: name.to_string(),
            coordinates,
            production: production.iter().map(|s| s.to_string()).collect(),
            demand: demand.iter().map(|s| s.to_string()).collect(),
            min_cargo: 5,
            max_cargo: 30,
            min_passengers: 1,
            max_passengers: 4,
        };
        let commodity = |key: &str, name: &str, base_value: i64, mass: i64| Commodity {
            key: key.to_string(),
            name: name.to_string(),
            base_value,
            mass,
        };
        let module = |key: &str, name: &str, cost: i64, stat: StatModifier, value: i64| {
            ShipModule {
                key: key.to_string(),
                name: name.to_string(),
                description: String::new(),
                cost,
                stat_modifier: stat,
                stat_value: value,
                mass: 0,
            }
        };

        Self {
            balance: GameBalance {
                starting_credits: 1000,
                fuel_cost_per_unit: 2,
                fuel_mass_per_unit: 1,
                distance_payout_mult: 3,
            },
            ship_templates: vec![
                ShipTemplate {
                    key: "ship_hauler".to_string(),
                    name: "Standard Hauler".to_string(),
                    description: "Slow, roomy and forgiving.".to_string(),
                    max_fuel: 100,
                    base_burn_rate: 2,
                    burn_damping: 1000,
                    base_mass: 500,
                    cargo_capacity: 40,
                    passenger_slots: 6,
                    max_module_slots: 2,
                },
                ShipTemplate {
                    key: "ship_courier".to_string(),
                    name: "Courier".to_string(),
                    description: "Light and quick, little room aboard.".to_string(),
                    max_fuel: 80,
                    base_burn_rate: 1,
                    burn_damping: 400,
                    base_mass: 200,
                    cargo_capacity: 15,
                    passenger_slots: 4,
                    max_module_slots: 3,
                },
            ],
            commodities: vec![
                commodity("ore", "Iron Ore", 12, 10),
                commodity("grain", "Hydroponic Grain", 8, 5),
                commodity("medicine", "Medical Supplies", 40, 1),
            ],
            planets: vec![
                planet("planet_prime", "Prime", [0, 0, 0], &["grain"], &["ore"]),
                planet(
                    "planet_ferrum",
                    "Ferrum",
                    [30, 0, 0],
                    &["ore"],
                    &["grain", "medicine"],
                ),
                planet(
                    "planet_halcyon",
                    "Halcyon",
                    [0, 40, 0],
                    &["medicine"],
                    &["ore"],
                ),
            ],
            ship_modules: vec![
                module("cargo_pod", "Cargo Pod", 1500, StatModifier::CargoCapacity, 20),
                module("aux_tank", "Auxiliary Tank", 1200, StatModifier::MaxFuel, 50),
                module("berth", "Passenger Berth", 900, StatModifier::PassengerSlots, 2),
                module("injector", "Fuel Injector", 4000, StatModifier::BaseBurnRate, -1),
            ],
            passenger_config: PassengerConfig {
                base_ticket_price: 25,
                mass_per_passenger: 2,
            },
        }
    }
}
