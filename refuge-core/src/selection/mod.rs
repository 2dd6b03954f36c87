//! The consumer-facing selection service.
//!
//! [`SpawnSelector`] is the explicitly constructed context that owns the
//! candidate cache, both validators, the replenisher, the world oracles and
//! the random source. Hosts construct one per world and pass it to whoever
//! needs spawn positions.

mod stats;

pub use stats::SelectionStats;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tokio_util::sync::CancellationToken;

use crate::cache::CandidateCache;
use crate::config::SpawnConfig;
use crate::error::ConfigError;
use crate::position::Position;
use crate::replenish::{Replenisher, StepOutcome};
use crate::validation::{DynamicValidator, DynamicVerdict, RecordedKey, StaticValidator};
use crate::world::{OccupancyOracle, TerrainOracle};

/// Why a request ended without a position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExhaustionReason {
    /// The cache was (or became) empty.
    CacheEmpty,
    /// Every allowed attempt failed dynamic validation.
    AttemptsExhausted,
}

/// Passed to the exhaustion hook when a request ends without a position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Exhaustion {
    /// Why the request gave up.
    pub reason: ExhaustionReason,
    /// Dynamic checks performed.
    pub attempts: u32,
    /// Candidates evicted during the request.
    pub evicted: u32,
    /// Candidates left in the cache.
    pub remaining: usize,
}

/// Observer called whenever a request comes back empty.
pub type ExhaustionHook = Box<dyn Fn(&Exhaustion) + Send + Sync>;

/// Serves spawn positions from a background-filled cache.
pub struct SpawnSelector<W, R = StdRng> {
    world: W,
    config: SpawnConfig,
    cache: CandidateCache,
    static_validator: StaticValidator,
    dynamic_validator: DynamicValidator,
    replenisher: Replenisher,
    rng: R,
    stats: SelectionStats,
    exhaustion_hook: Option<ExhaustionHook>,
    shutdown: CancellationToken,
}

impl<W> SpawnSelector<W, StdRng>
where
    W: TerrainOracle + OccupancyOracle,
{
    /// Creates a selector seeded from the operating system.
    pub fn new(world: W, config: SpawnConfig) -> Result<Self, ConfigError> {
        Self::with_rng(world, config, StdRng::from_os_rng())
    }

    /// Creates a selector with a deterministic seed.
    pub fn seeded(world: W, config: SpawnConfig, seed: u64) -> Result<Self, ConfigError> {
        Self::with_rng(world, config, StdRng::seed_from_u64(seed))
    }
}

impl<W, R> SpawnSelector<W, R>
where
    W: TerrainOracle + OccupancyOracle,
    R: Rng,
{
    /// Creates a selector with an empty cache and no pass in flight.
    pub fn with_rng(world: W, config: SpawnConfig, rng: R) -> Result<Self, ConfigError> {
        config.validate()?;
        let shutdown = CancellationToken::new();

        Ok(Self {
            static_validator: StaticValidator::from_config(&config),
            dynamic_validator: DynamicValidator::from_config(&config),
            replenisher: Replenisher::new(&config.replenish, shutdown.clone()),
            cache: CandidateCache::new(),
            stats: SelectionStats::default(),
            exhaustion_hook: None,
            world,
            config,
            rng,
            shutdown,
        })
    }

    /// Installs an observer for requests that come back empty.
    pub fn set_exhaustion_hook(&mut self, hook: impl Fn(&Exhaustion) + Send + Sync + 'static) {
        self.exhaustion_hook = Some(Box::new(hook));
    }

    /// Starts the initial fill. Returns whether a pass was started.
    pub fn start(&mut self) -> bool {
        let started = self.trigger_replenishment();
        if started {
            log::info!(
                "Spawn candidate warm-up started ({} attempts, {} per tick)",
                self.config.replenish.attempts_per_pass,
                self.config.replenish.batch_size
            );
        }
        started
    }

    /// Returns a position that is valid right now, or `None`.
    ///
    /// Draws random candidates and re-checks each against current world state.
    /// A candidate that fails is evicted from the cache for good. At most
    /// `max_attempts` candidates are checked. Never waits on replenishment;
    /// afterwards a pass is started if the cache fell below the low-water mark.
    pub fn request_position(&mut self) -> Option<Position> {
        self.stats.requests += 1;
        let result = self.select();
        self.refill_if_low();
        result
    }

    fn select(&mut self) -> Option<Position> {
        let max_attempts = self.config.max_attempts;
        let mut attempts = 0;
        let mut evicted = 0;

        while attempts < max_attempts {
            let Some((handle, candidate)) = self.cache.draw(&mut self.rng) else {
                return self.exhausted(ExhaustionReason::CacheEmpty, attempts, evicted);
            };
            attempts += 1;

            let rejection = match self.dynamic_validator.check(&self.world, candidate) {
                Ok(DynamicVerdict::Valid) => {
                    self.stats.served += 1;
                    return Some(candidate);
                }
                Ok(DynamicVerdict::Rejected(reason)) => {
                    log::trace!("Evicting spawn candidate {candidate}: {reason}");
                    Some(reason)
                }
                Err(err) => {
                    log::warn!("Evicting spawn candidate {candidate}, world query failed: {err}");
                    None
                }
            };

            self.cache.remove_at(handle);
            evicted += 1;
            self.stats.record_rejection(rejection);
        }

        self.exhausted(ExhaustionReason::AttemptsExhausted, attempts, evicted)
    }

    fn exhausted(
        &mut self,
        reason: ExhaustionReason,
        attempts: u32,
        evicted: u32,
    ) -> Option<Position> {
        match reason {
            ExhaustionReason::CacheEmpty => self.stats.empty_cache += 1,
            ExhaustionReason::AttemptsExhausted => self.stats.attempts_exhausted += 1,
        }

        let exhaustion = Exhaustion {
            reason,
            attempts,
            evicted,
            remaining: self.cache.len(),
        };
        log::debug!(
            "Spawn request found no position ({reason:?}, {attempts} checked, {evicted} evicted)"
        );
        if let Some(hook) = &self.exhaustion_hook {
            hook(&exhaustion);
        }
        None
    }

    fn refill_if_low(&mut self) {
        if self.cache.len() >= self.config.replenish.low_water_mark
            || self.replenisher.is_running()
        {
            return;
        }
        if self.cache.is_empty() {
            log::warn!("Spawn candidate cache is depleted and no refill is running");
        }
        if self.trigger_replenishment() {
            log::debug!(
                "Spawn candidate cache below low-water mark ({} < {}), refilling",
                self.cache.len(),
                self.config.replenish.low_water_mark
            );
        }
    }

    /// Starts a pass unless one is in flight. Returns whether one was started.
    pub fn trigger_replenishment(&mut self) -> bool {
        let started = self.replenisher.trigger();
        if started {
            self.stats.passes_started += 1;
        }
        started
    }

    /// Advances the pass in flight by one batch. Call once per host tick.
    pub fn tick(&mut self) -> StepOutcome {
        let outcome = self.replenisher.step(
            &mut self.cache,
            &mut self.static_validator,
            &self.world,
            &mut self.rng,
        );

        match &outcome {
            StepOutcome::Completed(summary) => {
                self.stats.record_pass(summary, true);
                log::info!(
                    "Spawn replenishment finished: {} of {} attempts accepted, cache holds {} (rejected: {})",
                    summary.inserted,
                    summary.attempts,
                    self.cache.len(),
                    summary.rejections
                );
            }
            StepOutcome::Cancelled(summary) => {
                self.stats.record_pass(summary, false);
                log::info!(
                    "Spawn replenishment cancelled after {} of {} attempts ({} inserted)",
                    summary.attempts,
                    summary.target,
                    summary.inserted
                );
            }
            StepOutcome::Idle | StepOutcome::Yielded { .. } => {}
        }

        outcome
    }

    /// Asks the pass in flight to stop at its next tick.
    pub fn cancel_replenishment(&self) {
        self.replenisher.cancel();
    }

    /// Cancels any pass in flight and refuses to start new ones.
    ///
    /// Cached candidates stay available to requests.
    pub fn shutdown(&mut self) {
        self.shutdown.cancel();
        // Settle the cancelled pass now instead of waiting for a tick that may never come.
        self.tick();
    }

    /// Whether [`shutdown`](Self::shutdown) has been called.
    #[must_use]
    pub fn is_shut_down(&self) -> bool {
        self.shutdown.is_cancelled()
    }

    /// Whether a pass is in flight.
    #[must_use]
    pub const fn is_replenishing(&self) -> bool {
        self.replenisher.is_running()
    }

    /// The candidate cache.
    #[must_use]
    pub const fn cache(&self) -> &CandidateCache {
        &self.cache
    }

    /// Mutable access to the candidate cache, e.g. to seed known-good positions.
    pub const fn cache_mut(&mut self) -> &mut CandidateCache {
        &mut self.cache
    }

    /// The world oracles.
    #[must_use]
    pub const fn world(&self) -> &W {
        &self.world
    }

    /// Mutable access to the world oracles.
    pub const fn world_mut(&mut self) -> &mut W {
        &mut self.world
    }

    /// The generation-time validator.
    pub const fn static_validator_mut(&mut self) -> &mut StaticValidator {
        &mut self.static_validator
    }

    /// The hand-out-time validator.
    #[must_use]
    pub const fn dynamic_validator(&self) -> &DynamicValidator {
        &self.dynamic_validator
    }

    /// Running counters.
    #[must_use]
    pub const fn stats(&self) -> &SelectionStats {
        &self.stats
    }

    /// Drains allow-map keys recorded since the last call.
    pub fn take_recorded_keys(&mut self) -> Vec<RecordedKey> {
        self.static_validator.take_recorded_keys()
    }

    /// The configuration in effect, including every recorded allow-map key.
    #[must_use]
    pub fn config_snapshot(&self) -> SpawnConfig {
        let mut config = self.config.clone();
        self.static_validator.export_allow_maps(&mut config);
        config
    }
}

impl<W, R> Drop for SpawnSelector<W, R> {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}
