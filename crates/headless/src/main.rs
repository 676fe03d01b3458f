use anyhow::Result;
use std::fs::{self, OpenOptions};

use burnrate_core::{
    config::{self, AppConfig},
    save::sanitize_component,
    session::DEFAULT_PLAYER_NAME,
    GameSession, MarketEvent, MarketTicker, UniverseLoader,
};
use tokio::sync::mpsc;
use tracing::{error, info, warn};
use tracing_subscriber::{prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    init_logging()?;

    config::ensure_default_config()?;
    let config = AppConfig::load()?;
    let universe = UniverseLoader::load_or_fallback(&config.universe_path);
    let session = GameSession::new(universe, config)?;

    let slot = resume_or_start(&session);
    let view = session.get_state()?;
    info!(
        %slot,
        player = %view.name,
        credits = view.credits,
        location = %view.ship.ship.location_key,
        "Session ready"
    );

    let (market_tx, mut market_rx) = mpsc::channel(16);
    let ticker = MarketTicker::new(session.clone()).spawn(market_tx);

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);
    loop {
        tokio::select! {
            event = market_rx.recv() => match event {
                Some(MarketEvent::BoardsChanged { planets }) => {
                    info!(?planets, "Job boards updated");
                }
                None => {
                    warn!("Market ticker exited");
                    break;
                }
            },
            signal = &mut shutdown => {
                if let Err(err) = signal {
                    error!("Failed to listen for shutdown signal: {err}");
                }
                break;
            }
        }
    }

    ticker.shutdown().await;
    match session.save_game(&slot) {
        Ok(entry) => info!(path = %entry.path.display(), "Saved on exit"),
        Err(err) => error!("Failed to save on exit: {err}"),
    }
    Ok(())
}

/// Load the most recent save, or start and save a fresh game. Returns the
/// slot the session should be saved to.
fn resume_or_start(session: &GameSession) -> String {
    match session.saves().latest() {
        Ok(Some(entry)) => match session.load_game(&entry.slot) {
            Ok(_) => return entry.slot,
            Err(err) => warn!("Could not resume {}: {err}", entry.slot),
        },
        Ok(None) => {}
        Err(err) => warn!("Failed to list saves: {err:#}"),
    }

    match session.new_game(DEFAULT_PLAYER_NAME, None, None) {
        Ok(entry) => entry.slot,
        Err(err) => {
            warn!("New game was not saved: {err}");
            sanitize_component(DEFAULT_PLAYER_NAME)
        }
    }
}

fn init_logging() -> Result<()> {
    let log_dir = std::env::current_dir()?.join("logs");
    fs::create_dir_all(&log_dir)?;
    let log_path = log_dir.join("burnrate.log");

    let env_filter = EnvFilter::from_default_env();

    let stdout_layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .compact()
        .with_writer(std::io::stdout);

    let file_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .compact()
        .with_ansi(false)
        .with_writer(move || {
            OpenOptions::new()
                .create(true)
                .append(true)
                .open(&log_path)
                .expect("failed to open log file")
        });

    tracing_subscriber::registry()
        .with(env_filter)
        .with(stdout_layer)
        .with(file_layer)
        .init();

    Ok(())
}
