//! Cooperative background fill of the candidate cache.
//!
//! A pass is a resumable state machine: the host calls [`Replenisher::step`]
//! once per tick and each call performs at most one batch of sampling
//! attempts before handing control back. Only one pass exists at a time.

use rand::Rng;
use tokio_util::sync::CancellationToken;

use crate::cache::CandidateCache;
use crate::config::ReplenishConfig;
use crate::error::OracleError;
use crate::validation::{RejectionCounts, StaticValidator, StaticVerdict};
use crate::world::TerrainOracle;

/// Progress of the pass currently in flight.
#[derive(Debug, Clone)]
pub struct RunProgress {
    /// Sampling attempts made so far.
    pub attempts_done: u32,
    /// Sampling attempts this pass will make in total.
    pub target: u32,
    /// Candidates inserted so far.
    pub inserted: u32,
    /// Rejections so far, by reason.
    pub rejections: RejectionCounts,
    cancel: CancellationToken,
}

impl RunProgress {
    const fn summary(&self) -> PassSummary {
        PassSummary {
            attempts: self.attempts_done,
            target: self.target,
            inserted: self.inserted,
            rejections: self.rejections,
        }
    }
}

/// Whether a pass is in flight.
#[derive(Debug, Clone, Default)]
pub enum RunState {
    /// No pass in flight.
    #[default]
    Idle,
    /// A pass is in flight.
    Running(RunProgress),
}

/// Totals of a finished or cancelled pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PassSummary {
    /// Sampling attempts made.
    pub attempts: u32,
    /// Sampling attempts the pass was meant to make.
    pub target: u32,
    /// Candidates inserted.
    pub inserted: u32,
    /// Rejections by reason.
    pub rejections: RejectionCounts,
}

/// What a call to [`Replenisher::step`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    /// No pass was in flight.
    Idle,
    /// A batch ran and the pass yielded with work remaining.
    Yielded {
        /// Attempts made so far.
        attempts_done: u32,
        /// Attempts the pass will make in total.
        target: u32,
    },
    /// The pass made its final batch and is now idle.
    Completed(PassSummary),
    /// The pass was cancelled at this yield point and is now idle.
    Cancelled(PassSummary),
}

/// Drives replenishment passes.
#[derive(Debug)]
pub struct Replenisher {
    state: RunState,
    batch_size: u32,
    attempts_per_pass: u32,
    shutdown: CancellationToken,
}

impl Replenisher {
    /// Creates an idle replenisher. Cancelling `shutdown` cancels any pass in
    /// flight and turns later triggers into no-ops.
    #[must_use]
    pub fn new(config: &ReplenishConfig, shutdown: CancellationToken) -> Self {
        Self {
            state: RunState::Idle,
            batch_size: config.batch_size.max(1),
            attempts_per_pass: config.attempts_per_pass,
            shutdown,
        }
    }

    /// Starts a pass. Returns `false` without doing anything if a pass is
    /// already in flight or the subsystem has shut down.
    pub fn trigger(&mut self) -> bool {
        if self.is_running() || self.shutdown.is_cancelled() {
            return false;
        }
        self.state = RunState::Running(RunProgress {
            attempts_done: 0,
            target: self.attempts_per_pass,
            inserted: 0,
            rejections: RejectionCounts::default(),
            cancel: self.shutdown.child_token(),
        });
        true
    }

    /// Requests the pass in flight to stop at its next yield point.
    pub fn cancel(&self) {
        if let RunState::Running(progress) = &self.state {
            progress.cancel.cancel();
        }
    }

    /// Whether a pass is in flight.
    #[must_use]
    pub const fn is_running(&self) -> bool {
        matches!(self.state, RunState::Running(_))
    }

    /// The current state.
    #[must_use]
    pub const fn state(&self) -> &RunState {
        &self.state
    }

    /// Runs one batch of the pass in flight.
    ///
    /// Each attempt samples a uniform point inside the world extent, runs the
    /// static validator and inserts survivors into `cache`. A failed world
    /// query abandons only that attempt.
    #[tracing::instrument(level = "trace", skip_all, name = "replenish_step")]
    pub fn step<T, R>(
        &mut self,
        cache: &mut CandidateCache,
        validator: &mut StaticValidator,
        terrain: &T,
        rng: &mut R,
    ) -> StepOutcome
    where
        T: TerrainOracle + ?Sized,
        R: Rng,
    {
        let RunState::Running(progress) = &mut self.state else {
            return StepOutcome::Idle;
        };

        if progress.cancel.is_cancelled() {
            let summary = progress.summary();
            self.state = RunState::Idle;
            return StepOutcome::Cancelled(summary);
        }

        let batch = self
            .batch_size
            .min(progress.target.saturating_sub(progress.attempts_done));
        let mut last_error = None;

        for _ in 0..batch {
            progress.attempts_done += 1;
            match Self::attempt(validator, terrain, rng) {
                Ok(StaticVerdict::Accepted(position)) => {
                    cache.insert(position);
                    progress.inserted += 1;
                }
                Ok(StaticVerdict::Rejected(reason)) => progress.rejections.record(reason),
                Err(err) => {
                    progress.rejections.oracle_failures += 1;
                    last_error = Some(err);
                }
            }
        }

        if let Some(err) = last_error {
            log::debug!(
                "Replenishment batch hit world query failures ({} so far): {err}",
                progress.rejections.oracle_failures
            );
        }

        if progress.attempts_done >= progress.target {
            let summary = progress.summary();
            self.state = RunState::Idle;
            StepOutcome::Completed(summary)
        } else {
            StepOutcome::Yielded {
                attempts_done: progress.attempts_done,
                target: progress.target,
            }
        }
    }

    fn attempt<T, R>(
        validator: &mut StaticValidator,
        terrain: &T,
        rng: &mut R,
    ) -> Result<StaticVerdict, OracleError>
    where
        T: TerrainOracle + ?Sized,
        R: Rng,
    {
        let extent = terrain.extent()?;
        if !extent.is_finite() {
            return Err(OracleError::Backend(format!(
                "world extent {:?}..{:?} is not finite",
                extent.min, extent.max
            )));
        }
        validator.check(terrain, extent.sample(rng))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SpawnConfig;
    use crate::validation::StaticRejection;
    use crate::world::FlatWorld;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    struct Fixture {
        replenisher: Replenisher,
        cache: CandidateCache,
        validator: StaticValidator,
        world: FlatWorld,
        rng: StdRng,
    }

    impl Fixture {
        fn new(batch_size: u32, attempts_per_pass: u32) -> Self {
            let config = ReplenishConfig {
                batch_size,
                low_water_mark: 10,
                attempts_per_pass,
            };
            Self {
                replenisher: Replenisher::new(&config, CancellationToken::new()),
                cache: CandidateCache::new(),
                validator: StaticValidator::from_config(&SpawnConfig::default()),
                world: FlatWorld::new(500.0),
                rng: StdRng::seed_from_u64(11),
            }
        }

        fn step(&mut self) -> StepOutcome {
            self.replenisher.step(
                &mut self.cache,
                &mut self.validator,
                &self.world,
                &mut self.rng,
            )
        }
    }

    #[test]
    fn idle_step_does_nothing() {
        let mut fixture = Fixture::new(20, 100);
        assert_eq!(fixture.step(), StepOutcome::Idle);
        assert!(fixture.cache.is_empty());
    }

    #[test]
    fn pass_yields_after_each_batch() {
        let mut fixture = Fixture::new(20, 50);
        assert!(fixture.replenisher.trigger());

        assert_eq!(
            fixture.step(),
            StepOutcome::Yielded {
                attempts_done: 20,
                target: 50
            }
        );
        assert_eq!(fixture.cache.len(), 20);
        assert_eq!(
            fixture.step(),
            StepOutcome::Yielded {
                attempts_done: 40,
                target: 50
            }
        );

        let StepOutcome::Completed(summary) = fixture.step() else {
            panic!("third batch should finish the pass");
        };
        assert_eq!(summary.attempts, 50);
        assert_eq!(summary.inserted, 50);
        assert_eq!(fixture.cache.len(), 50);
        assert!(!fixture.replenisher.is_running());
    }

    #[test]
    fn second_trigger_while_running_is_ignored() {
        let mut fixture = Fixture::new(10, 30);
        assert!(fixture.replenisher.trigger());
        fixture.step();
        assert!(!fixture.replenisher.trigger());

        while fixture.replenisher.is_running() {
            fixture.step();
        }
        assert_eq!(fixture.cache.len(), 30);
    }

    #[test]
    fn cancel_stops_at_next_yield_and_keeps_inserted() {
        let mut fixture = Fixture::new(10, 100);
        fixture.replenisher.trigger();
        fixture.step();
        fixture.replenisher.cancel();

        let StepOutcome::Cancelled(summary) = fixture.step() else {
            panic!("pass should be cancelled");
        };
        assert_eq!(summary.attempts, 10);
        assert_eq!(fixture.cache.len(), 10);
        assert!(!fixture.replenisher.is_running());
        assert!(fixture.replenisher.trigger());
    }

    #[test]
    fn shutdown_blocks_new_passes() {
        let shutdown = CancellationToken::new();
        let mut replenisher = Replenisher::new(&ReplenishConfig::default(), shutdown.clone());
        assert!(replenisher.trigger());
        shutdown.cancel();

        let mut cache = CandidateCache::new();
        let mut validator = StaticValidator::from_config(&SpawnConfig::default());
        let outcome = replenisher.step(
            &mut cache,
            &mut validator,
            &FlatWorld::new(10.0),
            &mut StdRng::seed_from_u64(0),
        );
        assert!(matches!(outcome, StepOutcome::Cancelled(_)));
        assert!(!replenisher.trigger());
    }

    #[test]
    fn oracle_failures_abandon_attempts() {
        let mut fixture = Fixture::new(25, 25);
        fixture.world.unloaded = true;
        fixture.replenisher.trigger();

        let StepOutcome::Completed(summary) = fixture.step() else {
            panic!("single batch should finish the pass");
        };
        assert_eq!(summary.inserted, 0);
        assert_eq!(summary.rejections.oracle_failures, 25);
        assert!(fixture.cache.is_empty());
    }

    #[test]
    fn unbounded_extent_fails_attempts_instead_of_panicking() {
        for half_extent in [f64::MAX, f64::INFINITY] {
            let mut fixture = Fixture::new(10, 10);
            fixture.world = FlatWorld::new(half_extent);
            fixture.replenisher.trigger();

            let StepOutcome::Completed(summary) = fixture.step() else {
                panic!("single batch should finish the pass");
            };
            assert_eq!(summary.rejections.oracle_failures, 10);
            assert!(fixture.cache.is_empty());
        }
    }

    #[test]
    fn rejections_are_counted_by_reason() {
        let mut fixture = Fixture::new(40, 40);
        fixture.world.slope = 80.0;
        fixture.replenisher.trigger();

        let StepOutcome::Completed(summary) = fixture.step() else {
            panic!("single batch should finish the pass");
        };
        assert_eq!(summary.rejections.get(StaticRejection::Slope), 40);
        assert_eq!(summary.rejections.total(), 40);
    }
}
