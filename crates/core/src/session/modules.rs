use tracing::{info, warn};

use super::GameState;
use crate::{
    error::{GameError, GameResult},
    models::Ship,
    universe::{ShipModule, StatModifier, Universe},
};

impl GameState {
    /// Modules for sale where the active ship is docked; only the upgrade
    /// planet has a shipyard.
    pub fn module_catalog(
        &self,
        universe: &Universe,
        upgrade_planet: &str,
    ) -> GameResult<Vec<ShipModule>> {
        let ship = self.player.active_ship()?;
        if ship.location_key != upgrade_planet {
            return Ok(Vec::new());
        }
        Ok(universe.ship_modules.clone())
    }

    /// Buy and install `key` on the active ship.
    pub fn buy_module(
        &mut self,
        universe: &Universe,
        upgrade_planet: &str,
        key: &str,
    ) -> GameResult<ShipModule> {
        let ship = self.player.active_ship()?;
        if ship.location_key != upgrade_planet {
            return Err(GameError::WrongLocation {
                required: upgrade_planet.to_string(),
                current: ship.location_key.clone(),
            });
        }
        if !ship.has_free_module_slot() {
            return Err(GameError::SlotsFull {
                slots: ship.max_module_slots,
            });
        }
        let module = universe
            .module(key)
            .ok_or_else(|| GameError::not_found("module", key))?;
        self.player.ensure_funds(module.cost)?;

        self.player.credits -= module.cost;
        let ship = self.player.active_ship_mut()?;
        apply_modifier(ship, module);
        ship.installed_modules.push(module.clone());
        info!(
            module = %module.key,
            cost = module.cost,
            modifier = %module.stat_modifier,
            value = module.stat_value,
            "Installed module"
        );
        Ok(module.clone())
    }
}

/// Add a module's stat change to `ship`. Returns false for tags that do not
/// name a ship stat, which leave the ship unchanged.
pub fn apply_modifier(ship: &mut Ship, module: &ShipModule) -> bool {
    let value = module.stat_value;
    match &module.stat_modifier {
        StatModifier::CargoCapacity => {
            ship.cargo_capacity = saturating_add(ship.cargo_capacity, value);
        }
        StatModifier::PassengerSlots => {
            ship.passenger_slots = saturating_add(ship.passenger_slots, value);
        }
        StatModifier::MaxFuel => {
            ship.max_fuel = (ship.max_fuel + value).max(0);
            ship.fuel = ship.fuel.min(ship.max_fuel);
        }
        StatModifier::BaseBurnRate => {
            ship.base_burn_rate = (ship.base_burn_rate + value).max(0);
        }
        StatModifier::Other(tag) => {
            warn!(module = %module.key, tag = %tag, "Unknown stat modifier, module has no effect");
            return false;
        }
    }
    true
}

fn saturating_add(current: u32, delta: i64) -> u32 {
    (i64::from(current) + delta).clamp(0, i64::from(u32::MAX)) as u32
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::state::NewGame;

    const SHIPYARD: &str = "planet_prime";

    fn docked_at(universe: &Universe, planet: &str) -> GameState {
        GameState::new_game(
            universe,
            10_000,
            &NewGame {
                player_name: "Cmdr. Test",
                ship_name: None,
                template_key: "ship_hauler",
                start_planet: planet,
            },
        )
        .unwrap()
    }

    fn module(modifier: &str, value: i64) -> ShipModule {
        ShipModule {
            key: format!("test_{modifier}"),
            name: "Test".to_string(),
            description: String::new(),
            cost: 10,
            stat_modifier: StatModifier::from(modifier.to_string()),
            stat_value: value,
            mass: 0,
        }
    }

    #[test]
    fn catalog_only_at_the_shipyard() -> GameResult<()> {
        let universe = Universe::fallback();
        assert_eq!(
            docked_at(&universe, SHIPYARD).module_catalog(&universe, SHIPYARD)?.len(),
            universe.ship_modules.len()
        );
        assert!(docked_at(&universe, "planet_ferrum")
            .module_catalog(&universe, SHIPYARD)?
            .is_empty());
        Ok(())
    }

    #[test]
    fn buying_debits_installs_and_applies() -> GameResult<()> {
        let universe = Universe::fallback();
        let mut state = docked_at(&universe, SHIPYARD);
        let bought = state.buy_module(&universe, SHIPYARD, "cargo_pod")?;

        assert_eq!(state.player.credits, 10_000 - bought.cost);
        let ship = state.player.active_ship()?;
        assert_eq!(ship.cargo_capacity, 40 + 20);
        assert_eq!(ship.installed_modules.len(), 1);
        Ok(())
    }

    #[test]
    fn shipyard_is_required_regardless_of_funds() {
        let universe = Universe::fallback();
        let mut state = docked_at(&universe, "planet_ferrum");
        state.player.credits = i64::MAX / 2;
        let before = state.clone();
        let err = state.buy_module(&universe, SHIPYARD, "cargo_pod").unwrap_err();
        assert!(matches!(err, GameError::WrongLocation { .. }));
        assert_eq!(state, before);
    }

    #[test]
    fn purchase_checks_run_in_order() -> GameResult<()> {
        let universe = Universe::fallback();
        let mut state = docked_at(&universe, SHIPYARD);

        state.player.credits = 0;
        assert!(matches!(
            state.buy_module(&universe, SHIPYARD, "nope"),
            Err(GameError::NotFound { what: "module", .. })
        ));
        assert!(matches!(
            state.buy_module(&universe, SHIPYARD, "cargo_pod"),
            Err(GameError::InsufficientCredits { .. })
        ));

        state.player.credits = 100_000;
        state.buy_module(&universe, SHIPYARD, "cargo_pod")?;
        state.buy_module(&universe, SHIPYARD, "berth")?;
        let before = state.clone();
        assert!(matches!(
            state.buy_module(&universe, SHIPYARD, "nope"),
            Err(GameError::SlotsFull { slots: 2 })
        ));
        assert_eq!(state, before);
        Ok(())
    }

    #[test]
    fn negative_modifiers_saturate() {
        let universe = Universe::fallback();
        let mut ship = docked_at(&universe, SHIPYARD).player.active_ship().unwrap().clone();

        assert!(apply_modifier(&mut ship, &module("cargo_capacity", -100)));
        assert_eq!(ship.cargo_capacity, 0);
        assert!(apply_modifier(&mut ship, &module("base_burn_rate", -10)));
        assert_eq!(ship.base_burn_rate, 0);
        assert!(apply_modifier(&mut ship, &module("max_fuel", -30)));
        assert_eq!(ship.max_fuel, 70);
        assert_eq!(ship.fuel, 70);
    }

    #[test]
    fn unknown_modifier_is_a_no_op() {
        let universe = Universe::fallback();
        let mut ship = docked_at(&universe, SHIPYARD).player.active_ship().unwrap().clone();
        let before = ship.clone();

        let applied = apply_modifier(&mut ship, &module("warp_coils", 5));
        assert!(!applied, "unknown modifier tags must be flagged as not applied");
        assert_eq!(ship, before);
    }
}
