//! # Upkeep Ticker
//!
//! Real-time upkeep runs outside the command loop: a background task polls
//! once a second and applies at most one owed 10-second tick per poll,
//! based on monotonic time since the last processed boundary. Catch-up
//! after a long idle stretch is capped so a woken process never grinds
//! through an unbounded backlog.
//!
//! Both the ticker and the foreground dispatcher mutate the same
//! [`GameState`]; the shared `Mutex` serializes the boundary
//! check-and-advance with the mutation it triggers, so ticks are neither
//! lost nor double-processed. Stopping the ticker signals the task and
//! awaits its termination before the process moves on.

use crate::config;
use crate::game::GameState;
use log::debug;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Tracks the last processed upkeep tick boundary. Never persisted; a
/// loaded game starts a fresh clock.
#[derive(Debug, Clone, Default)]
pub struct UpkeepClock {
    last_boundary: Option<Instant>,
}

impl UpkeepClock {
    /// Whether one tick is owed at `now`, advancing the boundary if so.
    ///
    /// The first call arms the clock without owing anything. A backlog
    /// longer than the catch-up cap is forgiven down to the cap, so at most
    /// [`config::MAX_CATCHUP_TICKS`] consecutive calls return true after an
    /// idle stretch.
    pub fn next_owed(&mut self, now: Instant) -> bool {
        let tick = Duration::from_secs(config::UPKEEP_TICK_SECS);
        let max_backlog = tick * config::MAX_CATCHUP_TICKS;
        let mut last = *self.last_boundary.get_or_insert(now);
        if now.duration_since(last) > max_backlog {
            last = now - max_backlog;
        }
        if now.duration_since(last) >= tick {
            self.last_boundary = Some(last + tick);
            true
        } else {
            self.last_boundary = Some(last);
            false
        }
    }
}

/// Handle to the background upkeep task.
pub struct UpkeepTicker {
    shutdown: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

impl UpkeepTicker {
    /// Spawns the ticker against shared game state.
    pub fn start(state: Arc<Mutex<GameState>>) -> Self {
        let (shutdown, mut rx) = watch::channel(false);
        let handle = tokio::spawn(async move {
            let mut poll =
                tokio::time::interval(Duration::from_millis(config::UPKEEP_POLL_MS));
            loop {
                tokio::select! {
                    _ = rx.changed() => break,
                    _ = poll.tick() => {
                        let now = Instant::now();
                        let mut guard = match state.lock() {
                            Ok(guard) => guard,
                            Err(poisoned) => poisoned.into_inner(),
                        };
                        if guard.process_owed_upkeep(now) {
                            debug!("upkeep tick processed at turn {}", guard.world.turn);
                        }
                    }
                }
            }
            debug!("upkeep ticker stopped");
        });
        Self { shutdown, handle }
    }

    /// Signals the task to stop and awaits its termination.
    pub async fn stop(self) {
        let _ = self.shutdown.send(true);
        let _ = self.handle.await;
    }
}
