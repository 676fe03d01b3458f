use serde::{Deserialize, Serialize};

use crate::{
    error::{GameError, GameResult},
    market::{JobBoards, MarketState},
    models::{Contract, Player, Ship},
    physics::{self, ShipView},
    save::SaveData,
    universe::Universe,
};

/// Default commander name for sessions started without one.
pub const DEFAULT_PLAYER_NAME: &str = "Cmdr. Haddock";
const STARTER_SHIP_ID: &str = "ship_1";

/// Every mutable piece of a running game.
#[derive(Debug, Clone, PartialEq)]
pub struct GameState {
    pub player: Player,
    pub market: MarketState,
    pub boards: JobBoards,
}

/// Options for starting a fresh game.
#[derive(Debug, Clone)]
pub struct NewGame<'a> {
    pub player_name: &'a str,
    /// Defaults to `SS <template name>`.
    pub ship_name: Option<&'a str>,
    pub template_key: &'a str,
    pub start_planet: &'a str,
}

/// What a client sees of the player: name, wallet and the active ship with
/// its derived fields filled in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerView {
    pub name: String,
    pub credits: i64,
    pub ship: ShipView,
}

impl GameState {
    /// Fresh state with one starter ship, no offers and a cold market.
    ///
    /// Unknown template keys fall back to the first template; an unknown start
    /// planet falls back to the first planet.
    pub fn new_game(
        universe: &Universe,
        starting_credits: i64,
        options: &NewGame<'_>,
    ) -> GameResult<Self> {
        let template = universe
            .starter_template(options.template_key)
            .ok_or_else(|| GameError::not_found("ship template", options.template_key))?;
        let location = universe
            .planet(options.start_planet)
            .or_else(|| universe.planets.first())
            .ok_or_else(|| GameError::not_found("planet", options.start_planet))?;

        let ship_name = options
            .ship_name
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| format!("SS {}", template.name));
        let ship = Ship::from_template(STARTER_SHIP_ID, template, ship_name, &location.key);

        let player_name = match options.player_name.trim() {
            "" => DEFAULT_PLAYER_NAME,
            name => name,
        };

        Ok(Self {
            player: Player::new(player_name, starting_credits, ship),
            market: MarketState::default(),
            boards: JobBoards::new(),
        })
    }

    pub fn to_save(&self) -> SaveData {
        SaveData {
            player: self.player.clone(),
            market: self.market.clone(),
            contracts: self.boards.clone(),
        }
    }

    pub fn from_save(data: SaveData) -> Self {
        Self {
            player: data.player,
            market: data.market,
            boards: data.contracts,
        }
    }

    /// Snapshot of the player with the active ship's derived fields computed.
    pub fn view(&self, universe: &Universe) -> GameResult<PlayerView> {
        let ship = physics::enrich(self.player.active_ship()?, &universe.balance);
        Ok(PlayerView {
            name: self.player.name.clone(),
            credits: self.player.credits,
            ship,
        })
    }

    /// Offers posted at `planet`, in display order.
    pub fn board(&self, planet: &str) -> &[Contract] {
        self.boards
            .get(planet)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }
}
