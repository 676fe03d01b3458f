#![allow(missing_docs)]

//! Market pressure bookkeeping and job-board replenishment.
//!
//! Heat is the only hidden driver of the economy. Accepting a contract heats
//! the origin's *source* entry for the item, delivering one heats the
//! destination's *demand* entry. Every tick heat decays, and planets whose
//! pressure is high enough get a larger job board. Hot source entries make a
//! commodity more likely to be offered and cheaper; hot demand entries pull
//! destinations towards the planet and raise payouts.

use std::collections::BTreeMap;

use rand::{distributions::WeightedIndex, prelude::Distribution, Rng};
use serde::{Deserialize, Serialize};
use uuid::Builder;

use crate::{
    models::{Contract, ContractKind},
    physics,
    universe::{Planet, Universe},
};

/// Item key used for passenger contracts and their heat entries.
pub const PASSENGER_ITEM_KEY: &str = "passengers";
const PASSENGER_ITEM_NAME: &str = "Passengers";

/// Planet key -> item key -> heat.
pub type HeatMap = BTreeMap<String, BTreeMap<String, f64>>;

/// Planet key -> offered contracts in display order.
pub type JobBoards = BTreeMap<String, Vec<Contract>>;

/// Balance knobs for the market simulation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MarketTuning {
    /// Heat added per unit of an accepted or delivered contract.
    pub heat_per_unit: f64,
    /// Multiplier applied to every heat entry each tick.
    pub heat_decay: f64,
    /// Entries that decay below this are forgotten.
    pub heat_floor: f64,
    /// Pressure needed to grow a board past its minimum.
    pub regen_threshold: f64,
    pub min_board_size: usize,
    pub max_board_size: usize,
    /// Chance that a generated contract is cargo rather than passengers.
    pub cargo_share: f64,
    /// Extra destination weight for planets that demand the commodity.
    pub demand_bonus: f64,
    /// How strongly heat moves payouts.
    pub price_sensitivity: f64,
}

impl Default for MarketTuning {
    fn default() -> Self {
        Self {
            heat_per_unit: 0.1,
            heat_decay: 0.8,
            heat_floor: 0.05,
            regen_threshold: 3.0,
            min_board_size: 4,
            max_board_size: 10,
            cargo_share: 0.7,
            demand_bonus: 2.0,
            price_sensitivity: 0.05,
        }
    }
}

impl MarketTuning {
    /// Board size a planet should be topped up to under `pressure`.
    pub fn board_target(&self, pressure: f64) -> usize {
        let bonus = if self.regen_threshold > 0.0 && pressure >= self.regen_threshold {
            (pressure / self.regen_threshold).floor() as usize
        } else {
            0
        };
        self.min_board_size
            .saturating_add(bonus)
            .min(self.max_board_size.max(self.min_board_size))
    }

    /// Probability of rolling cargo, with unusable values treated as zero.
    pub fn cargo_probability(&self) -> f64 {
        if self.cargo_share.is_finite() {
            self.cargo_share.clamp(0.0, 1.0)
        } else {
            0.0
        }
    }
}

/// Recent supply and demand pressure per planet and item.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MarketState {
    #[serde(default)]
    pub source_heat: HeatMap,
    #[serde(default)]
    pub dest_heat: HeatMap,
}

impl MarketState {
    pub fn source_heat(&self, planet: &str, item: &str) -> f64 {
        lookup(&self.source_heat, planet, item)
    }

    pub fn dest_heat(&self, planet: &str, item: &str) -> f64 {
        lookup(&self.dest_heat, planet, item)
    }

    /// A contract was taken off the origin's board.
    pub fn record_acceptance(&mut self, contract: &Contract, tuning: &MarketTuning) {
        add_heat(
            &mut self.source_heat,
            &contract.origin_key,
            &contract.item_key,
            f64::from(contract.quantity) * tuning.heat_per_unit,
        );
    }

    /// A contract was delivered at its destination.
    pub fn record_delivery(&mut self, contract: &Contract, tuning: &MarketTuning) {
        add_heat(
            &mut self.dest_heat,
            &contract.destination_key,
            &contract.item_key,
            f64::from(contract.quantity) * tuning.heat_per_unit,
        );
    }

    /// Cool every entry and forget the ones that fell below the floor.
    pub fn decay(&mut self, tuning: &MarketTuning) {
        for map in [&mut self.source_heat, &mut self.dest_heat] {
            for items in map.values_mut() {
                for heat in items.values_mut() {
                    *heat *= tuning.heat_decay;
                }
                items.retain(|_, heat| *heat >= tuning.heat_floor);
            }
            map.retain(|_, items| !items.is_empty());
        }
    }

    /// Combined heat on what a planet exports and imports.
    pub fn pressure(&self, planet: &Planet) -> f64 {
        let supply: f64 = planet
            .production
            .iter()
            .map(|item| self.source_heat(&planet.key, item))
            .sum();
        let demand: f64 = planet
            .demand
            .iter()
            .map(|item| self.dest_heat(&planet.key, item))
            .sum();
        supply
            + demand
            + self.source_heat(&planet.key, PASSENGER_ITEM_KEY)
            + self.dest_heat(&planet.key, PASSENGER_ITEM_KEY)
    }
}

fn lookup(map: &HeatMap, planet: &str, item: &str) -> f64 {
    map.get(planet)
        .and_then(|items| items.get(item))
        .copied()
        .unwrap_or(0.0)
}

fn add_heat(map: &mut HeatMap, planet: &str, item: &str, amount: f64) {
    if amount <= 0.0 {
        return;
    }
    *map.entry(planet.to_string())
        .or_default()
        .entry(item.to_string())
        .or_insert(0.0) += amount;
}

/// Create and fill a board for every planet that has none yet.
///
/// Existing boards are left untouched even when empty, so restoring a save
/// and seeding afterwards keeps the saved boards exactly as they were.
pub fn seed_boards<R: Rng>(
    universe: &Universe,
    tuning: &MarketTuning,
    market: &MarketState,
    boards: &mut JobBoards,
    rng: &mut R,
) -> Vec<String> {
    let mut changed = Vec::new();
    for planet in &universe.planets {
        if boards.contains_key(&planet.key) {
            continue;
        }
        let board = boards.entry(planet.key.clone()).or_default();
        if top_up(universe, tuning, market, planet, board, tuning.min_board_size, rng) {
            changed.push(planet.key.clone());
        }
    }
    changed
}

/// One market cycle: decay heat, then grow boards to their pressure target.
///
/// Returns the keys of planets whose board changed, in universe order.
pub fn replenish<R: Rng>(
    universe: &Universe,
    tuning: &MarketTuning,
    market: &mut MarketState,
    boards: &mut JobBoards,
    rng: &mut R,
) -> Vec<String> {
    market.decay(tuning);

    let mut changed = Vec::new();
    for planet in &universe.planets {
        let target = tuning.board_target(market.pressure(planet));
        let board = boards.entry(planet.key.clone()).or_default();
        if top_up(universe, tuning, market, planet, board, target, rng) {
            changed.push(planet.key.clone());
        }
    }
    changed
}

fn top_up<R: Rng>(
    universe: &Universe,
    tuning: &MarketTuning,
    market: &MarketState,
    planet: &Planet,
    board: &mut Vec<Contract>,
    target: usize,
    rng: &mut R,
) -> bool {
    let before = board.len();
    while board.len() < target {
        match generate_contract(universe, tuning, market, planet, rng) {
            Some(contract) => board.push(contract),
            None => break,
        }
    }
    board.len() != before
}

/// Roll a new contract posted at `origin`, or `None` when there is nowhere
/// to deliver to.
pub fn generate_contract<R: Rng>(
    universe: &Universe,
    tuning: &MarketTuning,
    market: &MarketState,
    origin: &Planet,
    rng: &mut R,
) -> Option<Contract> {
    let has_exports = origin
        .production
        .iter()
        .any(|key| universe.commodity(key).is_some());
    if has_exports && rng.gen_bool(tuning.cargo_probability()) {
        cargo_contract(universe, tuning, market, origin, rng)
    } else {
        passenger_contract(universe, market, origin, rng)
    }
}

fn cargo_contract<R: Rng>(
    universe: &Universe,
    tuning: &MarketTuning,
    market: &MarketState,
    origin: &Planet,
    rng: &mut R,
) -> Option<Contract> {
    let commodities: Vec<_> = origin
        .production
        .iter()
        .filter_map(|key| universe.commodity(key))
        .collect();
    let supply = WeightedIndex::new(
        commodities
            .iter()
            .map(|commodity| 1.0 + market.source_heat(&origin.key, &commodity.key)),
    )
    .ok()?;
    let commodity = commodities[supply.sample(rng)];

    let destination = pick_destination(universe, origin, rng, |planet| {
        let mut weight = 1.0 + market.dest_heat(&planet.key, &commodity.key);
        if planet.demand.contains(&commodity.key) {
            weight += tuning.demand_bonus;
        }
        weight
    })?;

    let (low, high) = origin.cargo_range();
    let quantity = rng.gen_range(low..=high);
    let distance = physics::distance(&origin.coordinates, &destination.coordinates);
    let base = commodity.base_value * i64::from(quantity)
        + distance * universe.balance.distance_payout_mult;
    let payout = heated_payout(
        base,
        market.source_heat(&origin.key, &commodity.key),
        market.dest_heat(&destination.key, &commodity.key),
        tuning,
    );

    Some(Contract {
        id: contract_id(rng),
        kind: ContractKind::Cargo,
        item_key: commodity.key.clone(),
        item_name: commodity.name.clone(),
        quantity,
        mass_per_unit: commodity.mass,
        origin_key: origin.key.clone(),
        destination_key: destination.key.clone(),
        payout,
    })
}

fn passenger_contract<R: Rng>(
    universe: &Universe,
    market: &MarketState,
    origin: &Planet,
    rng: &mut R,
) -> Option<Contract> {
    let destination = pick_destination(universe, origin, rng, |planet| {
        1.0 + market.dest_heat(&planet.key, PASSENGER_ITEM_KEY)
    })?;

    let (low, high) = origin.passenger_range();
    let heads = rng.gen_range(low..=high);
    let distance = physics::distance(&origin.coordinates, &destination.coordinates);
    let payout = (universe.passenger_config.base_ticket_price * i64::from(heads)
        + distance * universe.balance.distance_payout_mult)
        .max(1);

    Some(Contract {
        id: contract_id(rng),
        kind: ContractKind::Passenger,
        item_key: PASSENGER_ITEM_KEY.to_string(),
        item_name: PASSENGER_ITEM_NAME.to_string(),
        quantity: heads,
        mass_per_unit: universe.passenger_config.mass_per_passenger,
        origin_key: origin.key.clone(),
        destination_key: destination.key.clone(),
        payout,
    })
}

fn pick_destination<'u, R, F>(
    universe: &'u Universe,
    origin: &Planet,
    rng: &mut R,
    weight: F,
) -> Option<&'u Planet>
where
    R: Rng,
    F: Fn(&Planet) -> f64,
{
    let candidates: Vec<_> = universe
        .planets
        .iter()
        .filter(|planet| planet.key != origin.key)
        .collect();
    let index = WeightedIndex::new(candidates.iter().map(|planet| weight(planet))).ok()?;
    Some(candidates[index.sample(rng)])
}

/// Payout after heat adjustment: demand heat raises it, supply heat lowers it.
pub fn heated_payout(base: i64, source_heat: f64, dest_heat: f64, tuning: &MarketTuning) -> i64 {
    let demand = 1.0 + dest_heat.max(0.0) * tuning.price_sensitivity;
    let supply = 1.0 + source_heat.max(0.0) * tuning.price_sensitivity;
    ((base as f64) * demand / supply).round().max(1.0) as i64
}

fn contract_id<R: Rng>(rng: &mut R) -> String {
    let bytes: [u8; 16] = rng.gen();
    Builder::from_random_bytes(bytes).into_uuid().to_string()
}
