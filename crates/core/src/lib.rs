#![warn(clippy::all, missing_docs)]

//! Core simulation for the Burnrate space-trucking game.
//!
//! A [`GameSession`] owns the player, the market heat and the job boards of
//! one game, guarded for concurrent access. Galaxy data comes from a
//! [`Universe`] file, settings from [`AppConfig`], and a [`MarketTicker`]
//! keeps the job boards stocked in the background.

pub mod api;
pub mod config;
pub mod error;
pub mod market;
pub mod models;
pub mod physics;
pub mod save;
pub mod session;
pub mod ticker;
pub mod universe;

pub use config::AppConfig;
pub use error::{GameError, GameResult};
pub use market::{MarketState, MarketTuning};
pub use models::{Contract, ContractKind, Player, Ship, TravelEvent, TravelEventKind};
pub use save::{SaveData, SaveEntry, SaveManager};
pub use session::{GameSession, GameState, PlayerView, RefuelReceipt, TravelQuote, TravelReport};
pub use ticker::{MarketEvent, MarketTicker, TickerHandle};
pub use universe::{Universe, UniverseLoader};
