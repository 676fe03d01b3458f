#![allow(missing_docs)]

//! The running game: shared state, the player-facing operations and
//! save-slot bridging.

mod contracts;
pub mod events;
mod modules;
mod state;
mod travel;

use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::{debug, info, warn};

pub use modules::apply_modifier;
pub use state::{GameState, NewGame, PlayerView, DEFAULT_PLAYER_NAME};
pub use travel::{RefuelReceipt, TravelQuote, TravelReport};

use crate::{
    config::AppConfig,
    error::{GameError, GameResult},
    market,
    models::Contract,
    save::{sanitize_component, SaveEntry, SaveManager},
    universe::{Planet, ShipModule, Universe},
};

/// Cloneable handle to one game. Clones share the same state.
///
/// Reads take the state lock shared, everything that mutates takes it
/// exclusively for the whole operation. The RNG mutex is only ever locked
/// while the write lock is held.
#[derive(Clone)]
pub struct GameSession {
    universe: Arc<Universe>,
    config: Arc<AppConfig>,
    saves: SaveManager,
    state: Arc<RwLock<GameState>>,
    rng: Arc<Mutex<ChaCha8Rng>>,
}

impl GameSession {
    /// Start a session with a default commander and empty boards. The RNG is
    /// seeded from `config.rng_seed` when set.
    pub fn new(universe: Universe, config: AppConfig) -> GameResult<Self> {
        let rng = match config.rng_seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_entropy(),
        };
        Self::with_rng(universe, config, rng)
    }

    /// Start a session drawing from the given RNG.
    pub fn with_rng(universe: Universe, config: AppConfig, rng: ChaCha8Rng) -> GameResult<Self> {
        let state = GameState::new_game(
            &universe,
            universe.balance.starting_credits,
            &NewGame {
                player_name: DEFAULT_PLAYER_NAME,
                ship_name: None,
                template_key: &config.starter_template,
                start_planet: &config.start_planet,
            },
        )?;
        Ok(Self {
            saves: SaveManager::new(&config.save_root),
            universe: Arc::new(universe),
            config: Arc::new(config),
            state: Arc::new(RwLock::new(state)),
            rng: Arc::new(Mutex::new(rng)),
        })
    }

    pub fn universe(&self) -> &Universe {
        &self.universe
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn saves(&self) -> &SaveManager {
        &self.saves
    }

    /// Copy of the full mutable state.
    pub fn snapshot(&self) -> GameState {
        self.state.read().clone()
    }

    pub fn get_state(&self) -> GameResult<PlayerView> {
        self.state.read().view(&self.universe)
    }

    pub fn planets(&self) -> &[Planet] {
        &self.universe.planets
    }

    pub fn quote(&self, destination: &str) -> GameResult<TravelQuote> {
        self.state.read().quote(&self.universe, destination)
    }

    pub fn travel(&self, destination: &str) -> GameResult<TravelReport> {
        let mut state = self.state.write();
        let mut rng = self.rng.lock();
        state.travel(&self.universe, &self.config.market, destination, &mut *rng)
    }

    pub fn refuel(&self) -> GameResult<RefuelReceipt> {
        self.state.write().refuel(&self.universe)
    }

    /// Offers at the active ship's planet.
    pub fn list_contracts(&self) -> GameResult<Vec<Contract>> {
        Ok(self.state.read().board_here()?.to_vec())
    }

    pub fn accept_job(&self, id: &str) -> GameResult<Contract> {
        self.state.write().accept_contract(&self.config.market, id)
    }

    pub fn drop_job(&self, id: &str) -> GameResult<Contract> {
        self.state.write().drop_contract(id)
    }

    pub fn list_modules(&self) -> GameResult<Vec<ShipModule>> {
        self.state
            .read()
            .module_catalog(&self.universe, &self.config.upgrade_planet)
    }

    pub fn buy_module(&self, key: &str) -> GameResult<ShipModule> {
        self.state
            .write()
            .buy_module(&self.universe, &self.config.upgrade_planet, key)
    }

    /// Replace the running game with a fresh one and save it straight away
    /// to a slot named after the commander.
    ///
    /// The new game stays active even if that first save fails.
    pub fn new_game(
        &self,
        player_name: &str,
        ship_name: Option<&str>,
        template_key: Option<&str>,
    ) -> GameResult<SaveEntry> {
        let mut fresh = GameState::new_game(
            &self.universe,
            self.universe.balance.starting_credits,
            &NewGame {
                player_name,
                ship_name,
                template_key: template_key.unwrap_or(&self.config.starter_template),
                start_planet: &self.config.start_planet,
            },
        )?;

        let mut state = self.state.write();
        {
            let mut rng = self.rng.lock();
            market::seed_boards(
                &self.universe,
                &self.config.market,
                &fresh.market,
                &mut fresh.boards,
                &mut *rng,
            );
        }
        *state = fresh;

        let slot = sanitize_component(&state.player.name);
        info!(player = %state.player.name, %slot, "Started new game");
        self.saves
            .write(&slot, &state.to_save())
            .map_err(|err| GameError::persistence(&slot, err))
    }

    /// Write the current state to `slot`.
    pub fn save_game(&self, slot: &str) -> GameResult<SaveEntry> {
        // Held for the duration of the write so the file is a consistent snapshot.
        let state = self.state.write();
        let entry = self
            .saves
            .write(slot, &state.to_save())
            .map_err(|err| GameError::persistence(slot, err))?;
        info!(%slot, path = %entry.path.display(), "Saved game");
        Ok(entry)
    }

    /// Replace the current state with the contents of `slot`. On failure the
    /// running game is left as it was.
    pub fn load_game(&self, slot: &str) -> GameResult<PlayerView> {
        let mut state = self.state.write();
        let data = self
            .saves
            .read(slot)
            .map_err(|err| GameError::persistence(slot, err))?;

        let mut loaded = GameState::from_save(data);
        let Ok(ship) = loaded.player.active_ship() else {
            return Err(GameError::PersistenceFailure {
                slot: slot.to_string(),
                reason: format!("active ship '{}' is missing", loaded.player.active_ship_key),
            });
        };
        if self.universe.planet(&ship.location_key).is_none() {
            warn!(%slot, location = %ship.location_key, "Saved ship is at an unknown planet");
        }

        {
            let mut rng = self.rng.lock();
            market::seed_boards(
                &self.universe,
                &self.config.market,
                &loaded.market,
                &mut loaded.boards,
                &mut *rng,
            );
        }
        *state = loaded;
        info!(%slot, player = %state.player.name, "Loaded game");
        state.view(&self.universe)
    }

    /// Run one market cycle. Returns the planets whose board changed.
    pub fn replenish_markets(&self) -> Vec<String> {
        let mut state = self.state.write();
        let mut rng = self.rng.lock();
        let GameState { market, boards, .. } = &mut *state;
        let changed = market::replenish(
            &self.universe,
            &self.config.market,
            market,
            boards,
            &mut *rng,
        );
        debug!(changed = changed.len(), "Market cycle");
        changed
    }

    /// Fill any empty boards to their minimum size.
    pub fn seed_markets(&self) -> Vec<String> {
        let mut state = self.state.write();
        let mut rng = self.rng.lock();
        let GameState { market, boards, .. } = &mut *state;
        market::seed_boards(&self.universe, &self.config.market, market, boards, &mut *rng)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use tempfile::{tempdir, TempDir};

    fn session(seed: u64) -> Result<(GameSession, TempDir)> {
        let dir = tempdir()?;
        let config = AppConfig {
            save_root: dir.path().to_path_buf(),
            rng_seed: Some(seed),
            ..AppConfig::default()
        };
        Ok((GameSession::new(Universe::fallback(), config)?, dir))
    }

    #[test]
    fn fresh_session_has_default_commander() -> Result<()> {
        let (session, _dir) = session(1)?;
        let view = session.get_state()?;
        assert_eq!(view.name, DEFAULT_PLAYER_NAME);
        assert_eq!(view.credits, 1000);
        assert_eq!(view.ship.ship.location_key, "planet_prime");
        assert!(session.list_contracts()?.is_empty());
        assert_eq!(session.planets().len(), 3);
        Ok(())
    }

    #[test]
    fn new_game_seeds_boards_and_saves() -> Result<()> {
        let (session, _dir) = session(2)?;
        let entry = session.new_game("Cmdr. Test", Some("Rocinante"), None)?;

        assert_eq!(entry.slot, "CmdrTest");
        assert!(entry.path.exists());
        let view = session.get_state()?;
        assert_eq!(view.name, "Cmdr. Test");
        assert_eq!(view.ship.ship.name, "Rocinante");
        let state = session.snapshot();
        for planet in session.planets() {
            assert_eq!(state.board(&planet.key).len(), 4, "{}", planet.key);
        }
        Ok(())
    }

    #[test]
    fn sessions_with_equal_seeds_agree() -> Result<()> {
        let (first, _a) = session(99)?;
        let (second, _b) = session(99)?;
        first.new_game("A", None, None)?;
        second.new_game("A", None, None)?;
        assert_eq!(first.snapshot().boards, second.snapshot().boards);
        Ok(())
    }

    #[test]
    fn load_restores_saved_state() -> Result<()> {
        let (session, _dir) = session(3)?;
        session.new_game("Cmdr. Test", None, None)?;
        let offer = session.list_contracts()?[0].clone();
        session.accept_job(&offer.id)?;
        session.replenish_markets();
        session.save_game("alpha")?;
        let saved = session.snapshot();

        session.travel("planet_halcyon")?;
        session.replenish_markets();
        assert_ne!(session.snapshot(), saved);

        session.load_game("alpha")?;
        assert_eq!(session.snapshot(), saved);
        Ok(())
    }

    #[test]
    fn emptied_board_survives_reload() -> Result<()> {
        let (session, _dir) = session(8)?;
        session.new_game("Cmdr. Test", None, None)?;
        session
            .state
            .write()
            .boards
            .get_mut("planet_prime")
            .expect("seeded board")
            .clear();
        session.save_game("bare")?;
        let saved = session.snapshot();

        session.load_game("bare")?;
        assert_eq!(session.snapshot(), saved);
        assert!(session.list_contracts()?.is_empty());
        Ok(())
    }

    #[test]
    fn failed_load_leaves_state_alone() -> Result<()> {
        let (session, _dir) = session(4)?;
        session.new_game("Cmdr. Test", None, None)?;
        let before = session.snapshot();

        for slot in ["missing", "../escape"] {
            let err = session.load_game(slot).unwrap_err();
            assert!(matches!(err, GameError::PersistenceFailure { .. }), "{err}");
        }
        assert!(matches!(
            session.save_game("no/slashes"),
            Err(GameError::PersistenceFailure { .. })
        ));
        assert_eq!(session.snapshot(), before);
        Ok(())
    }

    #[test]
    fn accepted_jobs_leave_the_board() -> Result<()> {
        let (session, _dir) = session(5)?;
        session.new_game("Cmdr. Test", None, None)?;
        let board = session.list_contracts()?;
        let offer = &board[0];

        match session.accept_job(&offer.id) {
            Ok(accepted) => {
                assert_eq!(&accepted, offer);
                assert!(session.list_contracts()?.iter().all(|c| c.id != offer.id));
                assert!(matches!(
                    session.accept_job(&offer.id),
                    Err(GameError::NotFound { .. })
                ));
                session.drop_job(&offer.id)?;
            }
            Err(GameError::CapacityExceeded { .. }) => {
                assert_eq!(session.list_contracts()?, board);
            }
            Err(err) => return Err(err.into()),
        }
        Ok(())
    }

    #[test]
    fn shared_handles_serialize_mutations() -> Result<()> {
        let (session, _dir) = session(6)?;
        session.new_game("Cmdr. Test", None, None)?;

        let workers: Vec<_> = (0..4)
            .map(|worker| {
                let session = session.clone();
                std::thread::spawn(move || {
                    for _ in 0..50 {
                        if worker % 2 == 0 {
                            session.replenish_markets();
                        } else {
                            let _ = session.get_state();
                            let _ = session.list_contracts();
                        }
                    }
                })
            })
            .collect();
        for worker in workers {
            worker.join().expect("worker panicked");
        }

        let state = session.snapshot();
        let max = session.config().market.max_board_size;
        assert!(state.boards.values().all(|board| board.len() <= max));
        Ok(())
    }
}
