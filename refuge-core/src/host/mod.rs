//! A tokio host that drives a [`SpawnSelector`] on a fixed tick.
//!
//! The host owns the selector behind a lock, advances replenishment by one
//! batch per tick on the blocking pool and serves requests from any task.

use std::sync::Arc;
use std::time::{Duration, Instant};

use refuge_utils::locks::{SyncMutex, SyncRwLock};
use tokio::task::spawn_blocking;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;

use crate::position::Position;
use crate::replenish::StepOutcome;
use crate::selection::SpawnSelector;
use crate::world::{OccupancyOracle, TerrainOracle};

/// Ticks slower than this are logged.
const SLOW_TICK: Duration = Duration::from_millis(30);

/// Interval in ticks between status lines.
const STATUS_INTERVAL: u64 = 200;

/// What the most recent tick did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickReport {
    /// Ticks run so far.
    pub tick_count: u64,
    /// Outcome of the replenishment step.
    pub outcome: StepOutcome,
    /// Candidates cached after the tick.
    pub cached: usize,
    /// Time spent in the tick.
    pub elapsed: Duration,
}

impl Default for TickReport {
    fn default() -> Self {
        Self {
            tick_count: 0,
            outcome: StepOutcome::Idle,
            cached: 0,
            elapsed: Duration::ZERO,
        }
    }
}

/// Drives a selector from a tokio runtime.
pub struct SpawnHost<W> {
    /// Cancelling this stops [`run`](Self::run) and shuts the selector down.
    pub cancel_token: CancellationToken,
    selector: SyncMutex<SpawnSelector<W>>,
    tick_interval: Duration,
    last_tick: SyncRwLock<TickReport>,
}

impl<W> SpawnHost<W>
where
    W: TerrainOracle + OccupancyOracle + Send + 'static,
{
    /// Wraps `selector`. Nothing runs until [`run`](Self::run) is spawned.
    #[must_use]
    pub fn new(
        selector: SpawnSelector<W>,
        tick_interval: Duration,
        cancel_token: CancellationToken,
    ) -> Self {
        Self {
            cancel_token,
            selector: SyncMutex::new(selector),
            tick_interval,
            last_tick: SyncRwLock::new(TickReport::default()),
        }
    }

    /// Serves one spawn request.
    pub fn request_position(&self) -> Option<Position> {
        self.selector.lock().request_position()
    }

    /// Runs `f` with exclusive access to the selector.
    pub fn with_selector<T>(&self, f: impl FnOnce(&mut SpawnSelector<W>) -> T) -> T {
        f(&mut self.selector.lock())
    }

    /// The report of the most recent tick.
    pub fn last_tick(&self) -> TickReport {
        *self.last_tick.read()
    }

    /// Ticks until the cancel token fires, then shuts the selector down.
    pub async fn run(self: Arc<Self>) {
        self.selector.lock().start();
        let mut next_tick_time = Instant::now();
        let mut tick_count = 0;

        loop {
            let now = Instant::now();
            if now < next_tick_time {
                tokio::select! {
                    () = self.cancel_token.cancelled() => break,
                    () = sleep(next_tick_time - now) => {}
                }
            }
            next_tick_time += self.tick_interval;

            if self.cancel_token.is_cancelled() {
                break;
            }

            tick_count += 1;
            self.tick(tick_count).await;
        }

        self.selector.lock().shutdown();
        log::info!("Spawn host stopped after {tick_count} ticks");
    }

    #[tracing::instrument(level = "trace", skip(self), name = "spawn_tick")]
    async fn tick(self: &Arc<Self>, tick_count: u64) {
        let host = self.clone();
        let start = Instant::now();
        let Ok((outcome, cached)) = spawn_blocking(move || {
            let mut selector = host.selector.lock();
            let outcome = selector.tick();
            (outcome, selector.cache().len())
        })
        .await
        else {
            log::error!("Spawn tick {tick_count} panicked");
            return;
        };
        let elapsed = start.elapsed();

        if elapsed >= SLOW_TICK {
            tracing::warn!(?elapsed, tick_count, cached, ?outcome, "Spawn tick slow");
        }
        if tick_count % STATUS_INTERVAL == 0 {
            let stats = *self.selector.lock().stats();
            log::info!(
                "Spawn cache holds {cached} candidates ({} served, {} evicted, {} empty)",
                stats.served,
                stats.evictions,
                stats.empty_cache + stats.attempts_exhausted
            );
        }

        *self.last_tick.write() = TickReport {
            tick_count,
            outcome,
            cached,
            elapsed,
        };
    }
}
