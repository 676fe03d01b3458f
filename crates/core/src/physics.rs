#![allow(missing_docs)]

//! Travel physics: distances, ship mass and fuel burn.
//!
//! All quantities are integers. One unit of distance takes one second to
//! cross and costs `current_burn` units of fuel.

use serde::{Deserialize, Serialize};

use crate::{
    models::Ship,
    universe::{GameBalance, Planet},
};

/// Euclidean distance between two grid positions, rounded to the nearest unit.
pub fn distance(a: &[i64; 3], b: &[i64; 3]) -> i64 {
    let squared: f64 = a
        .iter()
        .zip(b.iter())
        .map(|(lhs, rhs)| {
            let delta = (lhs - rhs) as f64;
            delta * delta
        })
        .sum();
    squared.sqrt().round() as i64
}

/// Hull, module, cargo, passenger and fuel mass.
pub fn total_mass(ship: &Ship, balance: &GameBalance) -> i64 {
    let modules: i64 = ship.installed_modules.iter().map(|module| module.mass).sum();
    let contracts: i64 = ship
        .active_contracts
        .iter()
        .map(|contract| contract.total_mass())
        .sum();
    ship.base_mass + modules + contracts + ship.fuel * balance.fuel_mass_per_unit
}

/// Fuel burned per unit of distance for a given loaded mass.
///
/// Every `burn_damping` units of mass add one unit of burn on top of the
/// base rate. Never below one.
pub fn burn_rate(base_burn_rate: i64, burn_damping: i64, total_mass: i64) -> i64 {
    let damping = burn_damping.max(1);
    (base_burn_rate + total_mass.max(0) / damping).max(1)
}

/// Burn rate for the ship as it is currently loaded.
pub fn current_burn(ship: &Ship, balance: &GameBalance) -> i64 {
    burn_rate(
        ship.base_burn_rate,
        ship.burn_damping,
        total_mass(ship, balance),
    )
}

pub fn fuel_cost(distance: i64, burn: i64) -> i64 {
    distance * burn
}

/// A ship snapshot with its derived fields computed, as shown to clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShipView {
    #[serde(flatten)]
    pub ship: Ship,
    pub total_mass: i64,
    pub current_burn: i64,
}

/// Compute the derived fields for a copy of `ship`.
pub fn enrich(ship: &Ship, balance: &GameBalance) -> ShipView {
    ShipView {
        ship: ship.clone(),
        total_mass: total_mass(ship, balance),
        current_burn: current_burn(ship, balance),
    }
}

/// Cost of a single jump.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TripCost {
    pub distance: i64,
    pub burn: i64,
    pub fuel_cost: i64,
}

impl TripCost {
    /// Cost of flying `ship` from `origin` to `destination`.
    pub fn between(
        origin: &Planet,
        destination: &Planet,
        ship: &Ship,
        balance: &GameBalance,
    ) -> Self {
        let distance = distance(&origin.coordinates, &destination.coordinates);
        let burn = current_burn(ship, balance);
        Self {
            distance,
            burn,
            fuel_cost: fuel_cost(distance, burn),
        }
    }

    /// Travel time in seconds.
    pub fn duration_secs(&self) -> i64 {
        self.distance
    }
}
