use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::{events::roll_arrival_events, state::PlayerView, GameState};
use crate::{
    error::{GameError, GameResult},
    market::MarketTuning,
    models::{Contract, TravelEvent},
    physics::TripCost,
    universe::Universe,
};

/// Preview of a jump. All zero when the destination is unknown.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TravelQuote {
    pub destination_key: String,
    pub distance: i64,
    pub fuel_cost: i64,
    pub burn_rate: i64,
    pub can_afford: bool,
    pub duration_secs: i64,
}

/// Outcome of a completed jump.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TravelReport {
    /// Player snapshot after arrival, events and settlement.
    pub state: PlayerView,
    pub events: Vec<TravelEvent>,
    /// Contracts paid out at the destination.
    pub delivered: Vec<Contract>,
    pub credits_earned: i64,
    pub duration_secs: i64,
}

/// What a refuel bought.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefuelReceipt {
    pub units: i64,
    pub cost: i64,
}

impl GameState {
    pub fn quote(&self, universe: &Universe, destination_key: &str) -> GameResult<TravelQuote> {
        let Some(destination) = universe.planet(destination_key) else {
            return Ok(TravelQuote::default());
        };
        let ship = self.player.active_ship()?;
        let origin = universe.planet(&ship.location_key).unwrap_or(destination);
        let cost = TripCost::between(origin, destination, ship, &universe.balance);
        debug!(
            from = %ship.location_key,
            to = %destination.key,
            distance = cost.distance,
            fuel_cost = cost.fuel_cost,
            "Quoted jump"
        );
        Ok(TravelQuote {
            destination_key: destination.key.clone(),
            distance: cost.distance,
            fuel_cost: cost.fuel_cost,
            burn_rate: cost.burn,
            can_afford: ship.fuel >= cost.fuel_cost,
            duration_secs: cost.duration_secs(),
        })
    }

    /// Fly the active ship to `destination_key`.
    ///
    /// Fuel is debited and the ship moved before arrival events roll; contracts
    /// for the destination that survive the events are then paid out.
    pub fn travel<R: Rng>(
        &mut self,
        universe: &Universe,
        tuning: &MarketTuning,
        destination_key: &str,
        rng: &mut R,
    ) -> GameResult<TravelReport> {
        let destination = universe
            .planet(destination_key)
            .ok_or_else(|| GameError::InvalidDestination {
                key: destination_key.to_string(),
            })?;

        let ship = self.player.active_ship_mut()?;
        let origin = match universe.planet(&ship.location_key) {
            Some(origin) => origin,
            None => {
                warn!(location = %ship.location_key, "Ship is at an unknown planet, relocating");
                destination
            }
        };
        let cost = TripCost::between(origin, destination, ship, &universe.balance);
        if ship.fuel < cost.fuel_cost {
            return Err(GameError::InsufficientFuel {
                required: cost.fuel_cost,
                available: ship.fuel,
            });
        }

        ship.fuel -= cost.fuel_cost;
        ship.location_key = destination.key.clone();
        let events = roll_arrival_events(ship, rng);

        let (delivered, carried): (Vec<_>, Vec<_>) = ship
            .active_contracts
            .drain(..)
            .partition(|contract| contract.destination_key == destination.key);
        ship.active_contracts = carried;

        let credits_earned: i64 = delivered.iter().map(|contract| contract.payout).sum();
        self.player.credits += credits_earned;
        for contract in &delivered {
            self.market.record_delivery(contract, tuning);
        }

        info!(
            from = %origin.key,
            to = %destination.key,
            fuel_cost = cost.fuel_cost,
            events = events.len(),
            delivered = delivered.len(),
            credits_earned,
            "Jump completed"
        );

        Ok(TravelReport {
            state: self.view(universe)?,
            events,
            delivered,
            credits_earned,
            duration_secs: cost.duration_secs(),
        })
    }

    /// Fill the tank as far as the wallet allows.
    pub fn refuel(&mut self, universe: &Universe) -> GameResult<RefuelReceipt> {
        let price = universe.balance.fuel_cost_per_unit.max(0);
        let credits = self.player.credits;
        let ship = self.player.active_ship_mut()?;

        let missing = ship.max_fuel - ship.fuel;
        if missing <= 0 {
            return Err(GameError::TankFull);
        }
        let units = if price == 0 {
            missing
        } else {
            missing.min(credits.max(0) / price)
        };
        if units == 0 {
            return Err(GameError::InsufficientCredits {
                required: price,
                available: credits,
            });
        }

        let cost = units * price;
        ship.fuel += units;
        let fuel = ship.fuel;
        self.player.credits -= cost;
        info!(units, cost, fuel, "Refuelled");
        Ok(RefuelReceipt { units, cost })
    }
}
