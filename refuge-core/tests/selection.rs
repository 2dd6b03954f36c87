//! End-to-end selection behaviour against scripted world oracles.

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

use glam::DVec2;
use refuge_core::error::OracleError;
use refuge_core::position::{HorizontalBounds, Position};
use refuge_core::replenish::StepOutcome;
use refuge_core::selection::{ExhaustionReason, SpawnSelector};
use refuge_core::validation::{ClassificationAxis, StaticValidator};
use refuge_core::world::{Actor, Collider, Nearby, Structure};
use refuge_core::{FlatWorld, OccupancyOracle, SpawnConfig, TerrainOracle};
use refuge_utils::CategoryKey;
use refuge_utils::locks::SyncMutex;

/// A flat world whose slope grows with `|x|` and whose dynamic stage answers
/// with a fixed verdict while counting how often it was consulted.
struct ScriptedWorld {
    terrain: FlatWorld,
    slope_per_unit: f64,
    occupied: bool,
    dynamic_checks: AtomicU32,
}

impl ScriptedWorld {
    fn new(half_extent: f64) -> Self {
        Self {
            terrain: FlatWorld::new(half_extent),
            slope_per_unit: 0.0,
            occupied: false,
            dynamic_checks: AtomicU32::new(0),
        }
    }

    fn dynamic_checks(&self) -> u32 {
        self.dynamic_checks.load(Ordering::Relaxed)
    }
}

impl TerrainOracle for ScriptedWorld {
    fn extent(&self) -> Result<HorizontalBounds, OracleError> {
        self.terrain.extent()
    }

    fn ground_height(&self, point: DVec2) -> Result<Option<f64>, OracleError> {
        self.terrain.ground_height(point)
    }

    fn is_obstructed_above(&self, position: Position) -> Result<bool, OracleError> {
        self.terrain.is_obstructed_above(position)
    }

    fn slope(&self, point: DVec2) -> Result<f64, OracleError> {
        Ok(point.x.abs() * self.slope_per_unit)
    }

    fn surface(&self, point: DVec2) -> Result<CategoryKey, OracleError> {
        self.terrain.surface(point)
    }

    fn biome(&self, point: DVec2) -> Result<CategoryKey, OracleError> {
        self.terrain.biome(point)
    }

    fn topology(&self, point: DVec2) -> Result<CategoryKey, OracleError> {
        self.terrain.topology(point)
    }

    fn is_inside_solid(&self, position: Position) -> Result<bool, OracleError> {
        self.terrain.is_inside_solid(position)
    }

    fn in_bounds(&self, position: Position) -> Result<bool, OracleError> {
        self.terrain.in_bounds(position)
    }
}

impl OccupancyOracle for ScriptedWorld {
    fn is_submerged(&self, _position: Position) -> Result<bool, OracleError> {
        self.dynamic_checks.fetch_add(1, Ordering::Relaxed);
        Ok(self.occupied)
    }

    fn colliders_near(
        &self,
        position: Position,
        radius: f64,
    ) -> Result<Nearby<Collider>, OracleError> {
        self.terrain.colliders_near(position, radius)
    }

    fn actors_near(&self, position: Position, radius: f64) -> Result<Nearby<Actor>, OracleError> {
        self.terrain.actors_near(position, radius)
    }

    fn structures_near(
        &self,
        position: Position,
        radius: f64,
    ) -> Result<Nearby<Structure>, OracleError> {
        self.terrain.structures_near(position, radius)
    }
}

fn config(max_attempts: u32, attempts_per_pass: u32, low_water_mark: usize) -> SpawnConfig {
    let mut config = SpawnConfig {
        max_attempts,
        ..SpawnConfig::default()
    };
    config.replenish.attempts_per_pass = attempts_per_pass;
    config.replenish.low_water_mark = low_water_mark;
    config
}

fn run_pass<W: TerrainOracle + OccupancyOracle>(selector: &mut SpawnSelector<W>) -> StepOutcome {
    selector.trigger_replenishment();
    loop {
        let outcome = selector.tick();
        if !matches!(outcome, StepOutcome::Yielded { .. }) {
            return outcome;
        }
    }
}

#[test]
fn cached_positions_revalidate_statically() {
    let mut world = ScriptedWorld::new(100.0);
    world.slope_per_unit = 1.0;
    let config = config(10, 400, 0);
    let mut selector = SpawnSelector::seeded(world, config.clone(), 21).unwrap();

    run_pass(&mut selector);
    assert!(!selector.cache().is_empty());

    let mut validator = StaticValidator::from_config(&config);
    for candidate in selector.cache().iter() {
        assert!(candidate.x().abs() <= 40.0);
        assert!(
            validator
                .is_statically_valid(selector.world(), candidate.horizontal())
                .unwrap()
        );
    }
}

#[test]
fn overlapping_triggers_start_one_pass() {
    let mut selector =
        SpawnSelector::seeded(ScriptedWorld::new(100.0), config(10, 100, 0), 1).unwrap();

    assert!(selector.trigger_replenishment());
    selector.tick();
    assert!(!selector.trigger_replenishment());
    assert!(!selector.start());

    while selector.is_replenishing() {
        selector.tick();
    }
    assert_eq!(selector.cache().len(), 100);
    assert_eq!(selector.stats().passes_started, 1);
}

#[test]
fn request_checks_at_most_max_attempts() {
    let mut world = ScriptedWorld::new(100.0);
    world.occupied = true;
    let mut selector = SpawnSelector::seeded(world, config(5, 50, 0), 2).unwrap();
    run_pass(&mut selector);
    assert_eq!(selector.cache().len(), 50);

    assert_eq!(selector.request_position(), None);
    assert_eq!(selector.world().dynamic_checks(), 5);
    assert_eq!(selector.cache().len(), 45);
}

#[test]
fn failing_requests_drain_cache() {
    let mut world = ScriptedWorld::new(100.0);
    world.occupied = true;
    let mut selector = SpawnSelector::seeded(world, config(5, 12, 0), 3).unwrap();
    run_pass(&mut selector);

    let mut removed = 0;
    while !selector.cache().is_empty() {
        let before = selector.cache().len();
        assert_eq!(selector.request_position(), None);
        removed += before - selector.cache().len();
    }
    assert_eq!(removed, 12);
    assert_eq!(selector.world().dynamic_checks(), 12);
    assert_eq!(selector.request_position(), None);
    assert_eq!(selector.stats().empty_cache, 2);
}

#[test]
fn request_below_low_water_mark_triggers_pass() {
    let mut selector =
        SpawnSelector::seeded(ScriptedWorld::new(100.0), config(5, 10, 50), 4).unwrap();
    run_pass(&mut selector);
    assert!(!selector.is_replenishing());

    assert!(selector.request_position().is_some());
    assert!(selector.is_replenishing());
}

#[test]
fn unseen_keys_are_recorded_and_accepted() {
    let mut config = config(5, 20, 0);
    config.surfaces.set(CategoryKey::from_static("grass"), false);

    let mut world = ScriptedWorld::new(100.0);
    world.terrain = world.terrain.with_categories("swamp", "wetland", "basin");
    let mut selector = SpawnSelector::seeded(world, config, 5).unwrap();
    run_pass(&mut selector);

    assert_eq!(selector.cache().len(), 20);
    let snapshot = selector.config_snapshot();
    assert_eq!(snapshot.surfaces.get("swamp"), Some(true));
    assert_eq!(snapshot.surfaces.get("grass"), Some(false));

    let recorded = selector.take_recorded_keys();
    assert_eq!(recorded.len(), 3);
    assert_eq!(recorded[0].axis, ClassificationAxis::Surface);
    assert!(selector.take_recorded_keys().is_empty());
}

#[test]
fn flat_world_pass_accepts_every_attempt() {
    let mut selector =
        SpawnSelector::seeded(ScriptedWorld::new(100.0), config(5, 100, 0), 6).unwrap();
    let StepOutcome::Completed(summary) = run_pass(&mut selector) else {
        panic!("pass should complete");
    };
    assert_eq!(summary.inserted, 100);
    assert_eq!(selector.cache().len(), 100);
}

#[test]
fn steep_world_pass_accepts_nothing() {
    let mut config = config(5, 100, 0);
    config.max_slope = 10.0;
    let world = FlatWorld::new(100.0).with_slope(45.0);
    let mut selector = SpawnSelector::seeded(world, config, 7).unwrap();

    let StepOutcome::Completed(summary) = run_pass(&mut selector) else {
        panic!("pass should complete");
    };
    assert_eq!(summary.inserted, 0);
    assert_eq!(summary.rejections.total(), 100);
    assert!(selector.cache().is_empty());
}

#[test]
fn valid_candidate_is_served_and_kept() {
    let mut selector =
        SpawnSelector::seeded(ScriptedWorld::new(100.0), config(5, 10, 0), 8).unwrap();
    let seeded = Position::new(1.0, 4.0, 2.0);
    selector.cache_mut().insert(seeded);

    assert_eq!(selector.request_position(), Some(seeded));
    assert_eq!(selector.cache().len(), 1);
}

#[test]
fn invalid_candidates_are_all_removed() {
    let mut world = ScriptedWorld::new(100.0);
    world.occupied = true;
    let mut selector = SpawnSelector::seeded(world, config(5, 10, 0), 9).unwrap();
    selector.cache_mut().insert(Position::new(1.0, 4.0, 2.0));
    selector.cache_mut().insert(Position::new(3.0, 4.0, 4.0));

    let reasons = Arc::new(SyncMutex::new(Vec::new()));
    let seen = reasons.clone();
    selector.set_exhaustion_hook(move |exhaustion| seen.lock().push(*exhaustion));

    assert_eq!(selector.request_position(), None);
    assert!(selector.cache().is_empty());
    assert_eq!(selector.stats().evictions, 2);
    assert_eq!(selector.world().dynamic_checks(), 2);

    let reasons = reasons.lock();
    assert_eq!(reasons.len(), 1);
    assert_eq!(reasons[0].reason, ExhaustionReason::CacheEmpty);
    assert_eq!(reasons[0].evicted, 2);
}
