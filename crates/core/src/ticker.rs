//! Background market replenishment.

use std::time::Duration;

use tokio::{
    sync::{mpsc, oneshot},
    task::JoinHandle,
    time::{self, Instant, MissedTickBehavior},
};
use tracing::{debug, info, warn};

use crate::session::GameSession;

/// Notifications emitted by the market task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MarketEvent {
    /// A replenishment cycle changed the boards of these planets.
    BoardsChanged {
        /// Planet keys in universe order.
        planets: Vec<String>,
    },
}

/// Periodically runs a market cycle against a session.
pub struct MarketTicker {
    session: GameSession,
    period: Duration,
}

impl MarketTicker {
    /// Ticker using the session's configured interval.
    pub fn new(session: GameSession) -> Self {
        let period = session.config().market_interval();
        Self { session, period }
    }

    /// Ticker with an explicit interval.
    pub fn with_period(session: GameSession, period: Duration) -> Self {
        Self { session, period }
    }

    /// Start the task. The first cycle runs one period from now; cycles that
    /// change nothing are not reported.
    pub fn spawn(self, sender: mpsc::Sender<MarketEvent>) -> TickerHandle {
        let (stop_tx, stop_rx) = oneshot::channel();
        let task = tokio::spawn(self.run(sender, stop_rx));
        TickerHandle {
            stop: Some(stop_tx),
            task: Some(task),
        }
    }

    async fn run(self, sender: mpsc::Sender<MarketEvent>, mut stop: oneshot::Receiver<()>) {
        let mut interval = time::interval_at(Instant::now() + self.period, self.period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        info!(period_secs = self.period.as_secs_f64(), "Market ticker started");

        loop {
            tokio::select! {
                biased;
                _ = &mut stop => break,
                _ = interval.tick() => {}
            }

            let session = self.session.clone();
            let cycle = tokio::task::spawn_blocking(move || session.replenish_markets());
            let planets = match cycle.await {
                Ok(planets) => planets,
                Err(err) => {
                    warn!("Market cycle failed: {err}");
                    continue;
                }
            };
            if planets.is_empty() {
                continue;
            }

            debug!(?planets, "Boards replenished");
            match sender.try_send(MarketEvent::BoardsChanged { planets }) {
                Ok(()) => {}
                Err(mpsc::error::TrySendError::Full(_)) => {
                    warn!("Market event channel full, dropping notification");
                }
                Err(mpsc::error::TrySendError::Closed(_)) => {
                    debug!("Market event receiver closed");
                }
            }
        }

        info!("Market ticker stopped");
    }
}

/// Owner of a running ticker task. Dropping it aborts the task.
pub struct TickerHandle {
    stop: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<()>>,
}

impl TickerHandle {
    /// Ask the task to stop and wait until it has. No cycle runs afterwards.
    pub async fn shutdown(mut self) {
        if let Some(stop) = self.stop.take() {
            let _ = stop.send(());
        }
        if let Some(task) = self.task.take() {
            if let Err(err) = task.await {
                if !err.is_cancelled() {
                    warn!("Market ticker task error: {err}");
                }
            }
        }
    }

    pub fn is_finished(&self) -> bool {
        self.task.as_ref().map_or(true, JoinHandle::is_finished)
    }
}

impl Drop for TickerHandle {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}
