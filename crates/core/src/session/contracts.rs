use tracing::info;

use super::GameState;
use crate::{
    error::{GameError, GameResult},
    market::MarketTuning,
    models::Contract,
};

impl GameState {
    /// Offers at the planet where the active ship is docked.
    pub fn board_here(&self) -> GameResult<&[Contract]> {
        let ship = self.player.active_ship()?;
        Ok(self.board(&ship.location_key))
    }

    /// Move an offer from the local board onto the active ship.
    pub fn accept_contract(&mut self, tuning: &MarketTuning, id: &str) -> GameResult<Contract> {
        let ship = self.player.active_ship_mut()?;
        let board = self
            .boards
            .get_mut(&ship.location_key)
            .ok_or_else(|| GameError::not_found("contract", id))?;
        let index = board
            .iter()
            .position(|contract| contract.id == id)
            .ok_or_else(|| GameError::not_found("contract", id))?;

        let offer = &board[index];
        let free = ship.free_capacity(offer.kind);
        if offer.quantity > free {
            return Err(GameError::CapacityExceeded {
                kind: offer.kind,
                requested: offer.quantity,
                free,
            });
        }

        let contract = board.remove(index);
        ship.active_contracts.push(contract.clone());
        self.market.record_acceptance(&contract, tuning);
        info!(
            contract = %contract.id,
            item = %contract.item_key,
            quantity = contract.quantity,
            destination = %contract.destination_key,
            "Accepted contract"
        );
        Ok(contract)
    }

    /// Abandon an active contract. Nothing is refunded or reposted.
    pub fn drop_contract(&mut self, id: &str) -> GameResult<Contract> {
        let ship = self.player.active_ship_mut()?;
        let index = ship
            .active_contracts
            .iter()
            .position(|contract| contract.id == id)
            .ok_or_else(|| GameError::not_found("contract", id))?;
        let contract = ship.active_contracts.remove(index);
        info!(contract = %contract.id, "Dropped contract");
        Ok(contract)
    }
}
