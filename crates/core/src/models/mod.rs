//! Shared domain models.

use std::{collections::BTreeMap, fmt};

use serde::{Deserialize, Serialize};

use crate::{
    error::{GameError, GameResult},
    universe::{ShipModule, ShipTemplate},
};

/// Whether a contract moves goods or people.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContractKind {
    /// Freight counted against the cargo hold.
    Cargo,
    /// Travellers counted against passenger slots.
    Passenger,
}

impl fmt::Display for ContractKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cargo => f.write_str("cargo"),
            Self::Passenger => f.write_str("passenger"),
        }
    }
}

/// A delivery job, either offered on a job board or carried by a ship.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Contract {
    /// Unique identifier.
    pub id: String,
    /// Freight or passengers.
    #[serde(rename = "type")]
    pub kind: ContractKind,
    /// Commodity key (`passengers` for passenger jobs).
    pub item_key: String,
    /// Display name of the item.
    pub item_name: String,
    /// Units of cargo or number of passengers.
    pub quantity: u32,
    /// Mass contributed by a single unit.
    pub mass_per_unit: i64,
    /// Planet the job was posted at.
    pub origin_key: String,
    /// Planet the job pays out at.
    pub destination_key: String,
    /// Credits paid on delivery.
    pub payout: i64,
}

impl Contract {
    /// Mass the contract adds to a ship while active.
    pub fn total_mass(&self) -> i64 {
        i64::from(self.quantity) * self.mass_per_unit
    }
}

/// A vessel owned by the player.
///
/// Mass and burn rate are derived and never stored here; see
/// [`crate::physics::enrich`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ship {
    /// Unique id within the player's fleet.
    pub instance_id: String,
    /// Template the hull was built from.
    pub template_key: String,
    /// Display name chosen by the player.
    pub name: String,
    /// Planet the ship is docked at.
    pub location_key: String,
    /// Fuel in the tank, never above `max_fuel`.
    pub fuel: i64,
    /// Tank capacity.
    pub max_fuel: i64,
    /// Burn rate of the empty hull, before mass penalties.
    pub base_burn_rate: i64,
    /// Mass per extra point of burn; higher values soften the penalty.
    pub burn_damping: i64,
    /// Hull mass without cargo, passengers or modules.
    pub base_mass: i64,
    /// Cargo units the hold accepts.
    pub cargo_capacity: u32,
    /// Passengers the cabins accept.
    pub passenger_slots: u32,
    /// Number of modules that fit.
    pub max_module_slots: u32,
    /// Installed upgrades in purchase order.
    #[serde(default)]
    pub installed_modules: Vec<ShipModule>,
    /// Contracts currently on board.
    #[serde(default)]
    pub active_contracts: Vec<Contract>,
}

impl Ship {
    /// Build a fresh ship with a full tank from a template.
    pub fn from_template(
        instance_id: impl Into<String>,
        template: &ShipTemplate,
        name: impl Into<String>,
        location_key: impl Into<String>,
    ) -> Self {
        Self {
            instance_id: instance_id.into(),
            template_key: template.key.clone(),
            name: name.into(),
            location_key: location_key.into(),
            fuel: template.max_fuel,
            max_fuel: template.max_fuel,
            base_burn_rate: template.base_burn_rate,
            burn_damping: template.burn_damping,
            base_mass: template.base_mass,
            cargo_capacity: template.cargo_capacity,
            passenger_slots: template.passenger_slots,
            max_module_slots: template.max_module_slots,
            installed_modules: Vec::new(),
            active_contracts: Vec::new(),
        }
    }

    /// Sum of quantities currently committed for the given contract kind.
    pub fn committed(&self, kind: ContractKind) -> u32 {
        self.active_contracts
            .iter()
            .filter(|contract| contract.kind == kind)
            .map(|contract| contract.quantity)
            .sum()
    }

    /// Capacity limit for the given contract kind.
    pub fn capacity(&self, kind: ContractKind) -> u32 {
        match kind {
            ContractKind::Cargo => self.cargo_capacity,
            ContractKind::Passenger => self.passenger_slots,
        }
    }

    /// Remaining room for the given contract kind.
    pub fn free_capacity(&self, kind: ContractKind) -> u32 {
        self.capacity(kind).saturating_sub(self.committed(kind))
    }

    /// Whether another module can be installed.
    pub fn has_free_module_slot(&self) -> bool {
        self.installed_modules.len() < self.max_module_slots as usize
    }
}

/// The human player and their fleet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Player {
    /// Commander name, also the default save slot.
    pub name: String,
    /// Spendable balance.
    pub credits: i64,
    /// Registry of owned ships keyed by instance id.
    pub ships: BTreeMap<String, Ship>,
    /// Instance id of the ship currently being flown.
    pub active_ship_key: String,
}

impl Player {
    /// Create a player flying a single ship.
    pub fn new(name: impl Into<String>, credits: i64, ship: Ship) -> Self {
        let active_ship_key = ship.instance_id.clone();
        let mut ships = BTreeMap::new();
        ships.insert(active_ship_key.clone(), ship);
        Self {
            name: name.into(),
            credits,
            ships,
            active_ship_key,
        }
    }

    /// The ship currently being flown.
    pub fn active_ship(&self) -> GameResult<&Ship> {
        self.ships
            .get(&self.active_ship_key)
            .ok_or_else(|| GameError::not_found("ship", &self.active_ship_key))
    }

    /// Mutable access to the ship currently being flown.
    pub fn active_ship_mut(&mut self) -> GameResult<&mut Ship> {
        self.ships
            .get_mut(&self.active_ship_key)
            .ok_or_else(|| GameError::not_found("ship", &self.active_ship_key))
    }

    /// Fail with `InsufficientCredits` unless `amount` can be paid.
    pub fn ensure_funds(&self, amount: i64) -> GameResult<()> {
        if self.credits < amount {
            return Err(GameError::InsufficientCredits {
                required: amount,
                available: self.credits,
            });
        }
        Ok(())
    }
}

/// Category of an arrival incident.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TravelEventKind {
    /// Part of the tank vented.
    FuelLeak,
    /// A cargo contract was lost with its goods.
    CargoLoss,
    /// A passenger contract was cancelled.
    PassengerLoss,
}

/// Record of something that happened on arrival.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TravelEvent {
    /// What went wrong.
    #[serde(rename = "type")]
    pub kind: TravelEventKind,
    /// Narrative shown to the player.
    pub description: String,
    /// Short summary of the mechanical consequence.
    pub effect: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn contract(id: &str, kind: ContractKind, quantity: u32) -> Contract {
        Contract {
            id: id.to_string(),
            kind,
            item_key: "ore".to_string(),
            item_name: "Ore".to_string(),
            quantity,
            mass_per_unit: 10,
            origin_key: "planet_prime".to_string(),
            destination_key: "planet_ferrum".to_string(),
            payout: 100,
        }
    }

    #[test]
    fn committed_sums_by_kind() {
        let template = crate::universe::Universe::fallback().ship_templates[0].clone();
        let mut ship = Ship::from_template("ship_1", &template, "SS Test", "planet_prime");
        ship.active_contracts.push(contract("a", ContractKind::Cargo, 10));
        ship.active_contracts.push(contract("b", ContractKind::Passenger, 2));
        ship.active_contracts.push(contract("c", ContractKind::Cargo, 5));

        assert_eq!(ship.committed(ContractKind::Cargo), 15);
        assert_eq!(ship.committed(ContractKind::Passenger), 2);
        assert_eq!(
            ship.free_capacity(ContractKind::Cargo),
            template.cargo_capacity - 15
        );
    }

    #[test]
    fn contract_kind_serializes_as_type_field() {
        let json = serde_json::to_value(contract("a", ContractKind::Passenger, 1)).unwrap();
        assert_eq!(json["type"], "passenger");
    }
}
