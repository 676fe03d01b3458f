#![allow(missing_docs)]

//! Error taxonomy for game operations.

use std::path::PathBuf;

use thiserror::Error;

use crate::models::ContractKind;

/// Convenient result alias for game operations.
pub type GameResult<T> = std::result::Result<T, GameError>;

/// Failures surfaced by the simulation core.
///
/// Validation failures never leave a partial state change behind; the
/// operation that produced them did not mutate anything.
#[derive(Debug, Error)]
pub enum GameError {
    /// Travel target does not name a known planet.
    #[error("unknown destination: {key}")]
    InvalidDestination { key: String },

    /// The ship cannot cover the fuel cost of a jump.
    #[error("insufficient fuel: need {required}, have {available}")]
    InsufficientFuel { required: i64, available: i64 },

    /// The player cannot pay for a purchase.
    #[error("insufficient credits: need {required}, have {available}")]
    InsufficientCredits { required: i64, available: i64 },

    /// Accepting a contract would overfill the hold or the cabins.
    #[error("{kind} capacity exceeded: {requested} requested, {free} free")]
    CapacityExceeded {
        kind: ContractKind,
        requested: u32,
        free: u32,
    },

    /// A contract, module, ship or template key did not resolve.
    #[error("{what} not found: {key}")]
    NotFound { what: &'static str, key: String },

    /// The action is only available at another planet.
    #[error("only available at {required} (currently at {current})")]
    WrongLocation { required: String, current: String },

    /// Every module slot on the ship is occupied.
    #[error("all {slots} module slots are occupied")]
    SlotsFull { slots: u32 },

    /// Refuelling a ship whose tank is already full.
    #[error("fuel tank already full")]
    TankFull,

    /// The universe definition could not be read or parsed.
    #[error("failed to load universe from {}: {reason}", .path.display())]
    ConfigLoadFailure { path: PathBuf, reason: String },

    /// A save slot could not be written or restored.
    #[error("save slot '{slot}' failed: {reason}")]
    PersistenceFailure { slot: String, reason: String },
}

impl GameError {
    pub(crate) fn not_found(what: &'static str, key: impl Into<String>) -> Self {
        Self::NotFound {
            what,
            key: key.into(),
        }
    }

    pub(crate) fn persistence(slot: &str, err: anyhow::Error) -> Self {
        Self::PersistenceFailure {
            slot: slot.to_string(),
            reason: format!("{err:#}"),
        }
    }

    /// True for failures caused by player input rather than the environment.
    pub fn is_validation(&self) -> bool {
        !matches!(
            self,
            Self::ConfigLoadFailure { .. } | Self::PersistenceFailure { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_are_readable() {
        let err = GameError::CapacityExceeded {
            kind: ContractKind::Cargo,
            requested: 50,
            free: 40,
        };
        assert_eq!(
            err.to_string(),
            "cargo capacity exceeded: 50 requested, 40 free"
        );
        assert!(err.is_validation());

        let err = GameError::persistence("slot_a", anyhow::anyhow!("disk gone"));
        assert_eq!(err.to_string(), "save slot 'slot_a' failed: disk gone");
        assert!(!err.is_validation());
    }
}
