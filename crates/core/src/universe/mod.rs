//! Static galaxy definition.

/// Reading and validating universe files.
pub mod loader;
mod models;

pub use loader::UniverseLoader;
pub use models::{
    Commodity, GameBalance, PassengerConfig, Planet, ShipModule, ShipTemplate, StatModifier,
    Universe,
};
