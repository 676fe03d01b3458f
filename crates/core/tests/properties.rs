//! Property tests: random play sequences against a seeded game must keep
//! fuel, capacity and contract bookkeeping consistent.

use std::collections::HashSet;

use burnrate_core::{
    market::{self, MarketTuning},
    models::ContractKind,
    session::{GameState, NewGame},
    universe::Universe,
    GameError, SaveManager,
};
use proptest::prelude::*;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

// ===========================================================================
// Generators
// ===========================================================================

#[derive(Debug, Clone)]
enum Action {
    Accept(usize),
    Drop(usize),
    Travel(usize),
    Refuel,
    Tick,
}

fn arb_actions(max_ops: usize) -> impl Strategy<Value = Vec<Action>> {
    proptest::collection::vec(
        prop_oneof![
            3 => (0..12usize).prop_map(Action::Accept),
            1 => (0..6usize).prop_map(Action::Drop),
            2 => (0..4usize).prop_map(Action::Travel),
            1 => Just(Action::Refuel),
            1 => Just(Action::Tick),
        ],
        1..=max_ops,
    )
}

fn seeded_game(universe: &Universe, tuning: &MarketTuning, rng: &mut ChaCha8Rng) -> GameState {
    let mut state = GameState::new_game(
        universe,
        universe.balance.starting_credits,
        &NewGame {
            player_name: "Cmdr. Property",
            ship_name: None,
            template_key: "ship_hauler",
            start_planet: "planet_prime",
        },
    )
    .expect("fallback universe has a starter ship");
    let GameState { market, boards, .. } = &mut state;
    market::seed_boards(universe, tuning, market, boards, rng);
    state
}

fn apply(
    state: &mut GameState,
    universe: &Universe,
    tuning: &MarketTuning,
    action: &Action,
    rng: &mut ChaCha8Rng,
) {
    match action {
        Action::Accept(index) => {
            let id = state
                .board_here()
                .ok()
                .and_then(|board| board.get(*index).map(|contract| contract.id.clone()));
            if let Some(id) = id {
                let _ = state.accept_contract(tuning, &id);
            }
        }
        Action::Drop(index) => {
            let id = state
                .player
                .active_ship()
                .ok()
                .and_then(|ship| ship.active_contracts.get(*index).map(|c| c.id.clone()));
            if let Some(id) = id {
                let _ = state.drop_contract(&id);
            }
        }
        Action::Travel(index) => {
            let destination = universe
                .planets
                .get(*index)
                .map_or("planet_nowhere", |planet| planet.key.as_str());
            let _ = state.travel(universe, tuning, destination, rng);
        }
        Action::Refuel => {
            let _ = state.refuel(universe);
        }
        Action::Tick => {
            let GameState { market, boards, .. } = state;
            market::replenish(universe, tuning, market, boards, rng);
        }
    }
}

fn all_contract_ids(state: &GameState) -> Vec<String> {
    let on_boards = state.boards.values().flatten();
    let on_ships = state
        .player
        .ships
        .values()
        .flat_map(|ship| ship.active_contracts.iter());
    on_boards.chain(on_ships).map(|c| c.id.clone()).collect()
}

// ===========================================================================
// Properties
// ===========================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Fuel stays in the tank and the hold never overfills.
    #[test]
    fn ship_limits_hold(seed in any::<u64>(), actions in arb_actions(40)) {
        let universe = Universe::fallback();
        let tuning = MarketTuning::default();
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let mut state = seeded_game(&universe, &tuning, &mut rng);

        for action in &actions {
            apply(&mut state, &universe, &tuning, action, &mut rng);
            let ship = state.player.active_ship().unwrap();
            prop_assert!(ship.fuel >= 0, "fuel went negative after {:?}", action);
            prop_assert!(ship.fuel <= ship.max_fuel, "tank overfilled after {:?}", action);
            prop_assert!(ship.committed(ContractKind::Cargo) <= ship.cargo_capacity);
            prop_assert!(ship.committed(ContractKind::Passenger) <= ship.passenger_slots);
            prop_assert!(state.player.credits >= 0);
        }
    }

    /// A contract lives in exactly one place, and accepting one never loses it.
    #[test]
    fn contracts_are_never_duplicated(seed in any::<u64>(), actions in arb_actions(40)) {
        let universe = Universe::fallback();
        let tuning = MarketTuning::default();
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let mut state = seeded_game(&universe, &tuning, &mut rng);

        for action in &actions {
            let before = all_contract_ids(&state);
            apply(&mut state, &universe, &tuning, action, &mut rng);
            let after = all_contract_ids(&state);

            let unique: HashSet<_> = after.iter().collect();
            prop_assert_eq!(unique.len(), after.len(), "duplicate contract after {:?}", action);
            if let Action::Accept(_) = action {
                prop_assert_eq!(before.len(), after.len());
            }
        }
    }

    /// The affordability check matches the fuel rule exactly.
    #[test]
    fn travel_needs_exactly_the_quoted_fuel(fuel in 0i64..=100, target in 0..3usize) {
        let universe = Universe::fallback();
        let tuning = MarketTuning::default();
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let mut state = seeded_game(&universe, &tuning, &mut rng);
        state.player.active_ship_mut().unwrap().fuel = fuel;

        let destination = &universe.planets[target].key;
        let quote = state.quote(&universe, destination).unwrap();
        let result = state.travel(&universe, &tuning, destination, &mut rng);

        prop_assert_eq!(quote.can_afford, fuel >= quote.fuel_cost);
        match result {
            Ok(report) => {
                prop_assert!(quote.can_afford);
                prop_assert_eq!(&report.state.ship.ship.location_key, destination);
            }
            Err(GameError::InsufficientFuel { required, available }) => {
                prop_assert!(!quote.can_afford);
                prop_assert_eq!(required, quote.fuel_cost);
                prop_assert_eq!(available, fuel);
            }
            Err(other) => prop_assert!(false, "unexpected error {}", other),
        }
    }
}

#[test]
fn played_game_survives_a_save_round_trip() -> anyhow::Result<()> {
    let universe = Universe::fallback();
    let tuning = MarketTuning::default();
    let mut rng = ChaCha8Rng::seed_from_u64(2024);
    let mut state = seeded_game(&universe, &tuning, &mut rng);

    let actions = [
        Action::Accept(0),
        Action::Accept(1),
        Action::Tick,
        Action::Travel(1),
        Action::Refuel,
        Action::Accept(0),
        Action::Tick,
        Action::Travel(2),
    ];
    for action in &actions {
        apply(&mut state, &universe, &tuning, action, &mut rng);
    }

    let dir = tempfile::tempdir()?;
    let saves = SaveManager::new(dir.path());
    saves.write("round_trip", &state.to_save())?;
    let restored = GameState::from_save(saves.read("round_trip")?);
    assert_eq!(restored, state);
    Ok(())
}
