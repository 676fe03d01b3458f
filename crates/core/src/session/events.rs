//! Random incidents rolled when a ship arrives somewhere.

use rand::Rng;
use tracing::info;

use crate::models::{Contract, ContractKind, Ship, TravelEvent, TravelEventKind};

pub const FUEL_LEAK_CHANCE: f64 = 0.10;
pub const CARGO_LOSS_CHANCE: f64 = 0.05;
pub const PASSENGER_INCIDENT_CHANCE: f64 = 0.05;

/// Fraction of the remaining fuel a leak can take.
const LEAK_SHARE_MIN: f64 = 0.05;
const LEAK_SHARE_MAX: f64 = 0.15;

/// Roll every arrival incident against `ship`, in a fixed order, and apply the
/// ones that fire.
///
/// Each incident gets its own draw even when it cannot apply, so the sequence
/// of draws does not depend on what the ship carries.
pub fn roll_arrival_events<R: Rng>(ship: &mut Ship, rng: &mut R) -> Vec<TravelEvent> {
    let mut events = Vec::new();

    if rng.gen_bool(FUEL_LEAK_CHANCE) {
        let share = rng.gen_range(LEAK_SHARE_MIN..=LEAK_SHARE_MAX);
        let lost = (ship.fuel.max(0) as f64 * share).floor() as i64;
        if lost > 0 {
            ship.fuel -= lost;
            info!(ship = %ship.instance_id, lost, "Fuel leak on arrival");
            events.push(TravelEvent {
                kind: TravelEventKind::FuelLeak,
                description: "A micro-fracture in the tank vented fuel on docking.".to_string(),
                effect: format!("-{lost} fuel"),
            });
        }
    }

    if rng.gen_bool(CARGO_LOSS_CHANCE) {
        if let Some(lost) = remove_random(ship, ContractKind::Cargo, rng) {
            info!(ship = %ship.instance_id, contract = %lost.id, "Cargo lost on arrival");
            events.push(TravelEvent {
                kind: TravelEventKind::CargoLoss,
                description: format!(
                    "A container of {} broke loose and drifted off.",
                    lost.item_name
                ),
                effect: format!("lost {} x{}", lost.item_name, lost.quantity),
            });
        }
    }

    if rng.gen_bool(PASSENGER_INCIDENT_CHANCE) {
        if let Some(lost) = remove_random(ship, ContractKind::Passenger, rng) {
            info!(ship = %ship.instance_id, contract = %lost.id, "Passengers left on arrival");
            events.push(TravelEvent {
                kind: TravelEventKind::PassengerLoss,
                description: "A passenger group filed a complaint and left the ship.".to_string(),
                effect: format!("lost {} passengers", lost.quantity),
            });
        }
    }

    events
}

/// Remove a uniformly chosen active contract of `kind`, if there is one.
fn remove_random<R: Rng>(ship: &mut Ship, kind: ContractKind, rng: &mut R) -> Option<Contract> {
    let candidates: Vec<usize> = ship
        .active_contracts
        .iter()
        .enumerate()
        .filter(|(_, contract)| contract.kind == kind)
        .map(|(index, _)| index)
        .collect();
    if candidates.is_empty() {
        return None;
    }
    let index = candidates[rng.gen_range(0..candidates.len())];
    Some(ship.active_contracts.remove(index))
}
