//! Demo worlds for the binary.

use glam::DVec2;
use rand::Rng;
use refuge_core::error::OracleError;
use refuge_core::world::{
    Actor, Collider, ColliderCategory, FlatWorld, Nearby, OccupancyOracle, Structure,
    TerrainOracle,
};
use refuge_core::{HorizontalBounds, Position};
use refuge_utils::CategoryKey;
use refuge_utils::noise::OctaveNoise;
use smallvec::SmallVec;

use crate::config::{WorldGeneratorType, WorldSettings};

/// Horizontal step used for slope estimation.
const SLOPE_STEP: f64 = 1.0;

const COLLIDER_CATEGORIES: [ColliderCategory; 9] = [
    ColliderCategory::SpawnBlockingStructure,
    ColliderCategory::SpawnBlockingZone,
    ColliderCategory::LargeVehicle,
    ColliderCategory::MediumVehicle,
    ColliderCategory::DetailedVehicle,
    ColliderCategory::ManagedZone,
    ColliderCategory::RadiationZone,
    ColliderCategory::FireHazard,
    ColliderCategory::Other,
];

/// Either demo world, chosen by config.
pub enum DemoWorld {
    /// Noise terrain.
    Noise(Box<NoiseWorld>),
    /// Flat plain.
    Flat(FlatWorld),
}

impl DemoWorld {
    /// Generates the world described by `settings`.
    pub fn generate<R: Rng>(settings: &WorldSettings, rng: &mut R) -> Self {
        match settings.generator {
            WorldGeneratorType::Noise => Self::Noise(Box::new(NoiseWorld::generate(settings, rng))),
            WorldGeneratorType::Flat => Self::Flat(FlatWorld::new(settings.half_extent)),
        }
    }

    /// Lets actors move around a little.
    pub fn wander<R: Rng>(&mut self, rng: &mut R) {
        if let Self::Noise(world) = self {
            world.wander(rng);
        }
    }

    fn terrain(&self) -> &dyn TerrainOracle {
        match self {
            Self::Noise(world) => &**world,
            Self::Flat(world) => world,
        }
    }

    fn occupancy(&self) -> &dyn OccupancyOracle {
        match self {
            Self::Noise(world) => &**world,
            Self::Flat(world) => world,
        }
    }
}

impl TerrainOracle for DemoWorld {
    fn extent(&self) -> Result<HorizontalBounds, OracleError> {
        self.terrain().extent()
    }

    fn ground_height(&self, point: DVec2) -> Result<Option<f64>, OracleError> {
        self.terrain().ground_height(point)
    }

    fn is_obstructed_above(&self, position: Position) -> Result<bool, OracleError> {
        self.terrain().is_obstructed_above(position)
    }

    fn slope(&self, point: DVec2) -> Result<f64, OracleError> {
        self.terrain().slope(point)
    }

    fn surface(&self, point: DVec2) -> Result<CategoryKey, OracleError> {
        self.terrain().surface(point)
    }

    fn biome(&self, point: DVec2) -> Result<CategoryKey, OracleError> {
        self.terrain().biome(point)
    }

    fn topology(&self, point: DVec2) -> Result<CategoryKey, OracleError> {
        self.terrain().topology(point)
    }

    fn is_inside_solid(&self, position: Position) -> Result<bool, OracleError> {
        self.terrain().is_inside_solid(position)
    }

    fn in_bounds(&self, position: Position) -> Result<bool, OracleError> {
        self.terrain().in_bounds(position)
    }
}

impl OccupancyOracle for DemoWorld {
    fn is_submerged(&self, position: Position) -> Result<bool, OracleError> {
        self.occupancy().is_submerged(position)
    }

    fn colliders_near(
        &self,
        position: Position,
        radius: f64,
    ) -> Result<Nearby<Collider>, OracleError> {
        self.occupancy().colliders_near(position, radius)
    }

    fn actors_near(&self, position: Position, radius: f64) -> Result<Nearby<Actor>, OracleError> {
        self.occupancy().actors_near(position, radius)
    }

    fn structures_near(
        &self,
        position: Position,
        radius: f64,
    ) -> Result<Nearby<Structure>, OracleError> {
        self.occupancy().structures_near(position, radius)
    }
}

/// Rolling terrain from layered simplex noise.
///
/// Elevation comes from one octave field, temperature and moisture from two
/// more, and tree cover from a fourth. Actors, structures and colliders are
/// scattered uniformly on the ground.
pub struct NoiseWorld {
    extent: HorizontalBounds,
    height_scale: f64,
    water_level: f64,
    elevation: OctaveNoise,
    temperature: OctaveNoise,
    moisture: OctaveNoise,
    trees: OctaveNoise,
    colliders: Vec<Collider>,
    actors: Vec<Actor>,
    structures: Vec<Structure>,
}

impl NoiseWorld {
    /// Generates terrain and scatters objects on it.
    pub fn generate<R: Rng>(settings: &WorldSettings, rng: &mut R) -> Self {
        let mut world = Self {
            extent: HorizontalBounds::centered(settings.half_extent),
            height_scale: settings.height_scale,
            water_level: settings.water_level,
            elevation: OctaveNoise::new(rng, 5, 1.0 / 600.0, 0.5),
            temperature: OctaveNoise::new(rng, 2, 1.0 / 2500.0, 0.5),
            moisture: OctaveNoise::new(rng, 3, 1.0 / 900.0, 0.5),
            trees: OctaveNoise::new(rng, 2, 1.0 / 40.0, 0.6),
            colliders: Vec::with_capacity(settings.colliders),
            actors: Vec::with_capacity(settings.actors),
            structures: Vec::with_capacity(settings.structures),
        };

        for _ in 0..settings.colliders {
            let category = COLLIDER_CATEGORIES[rng.random_range(0..COLLIDER_CATEGORIES.len())];
            let position = world.on_ground(rng);
            world.colliders.push(Collider { position, category });
        }
        for _ in 0..settings.actors {
            let position = world.on_ground(rng);
            let sleeping = rng.random_bool(0.3);
            world.actors.push(Actor { position, sleeping });
        }
        for _ in 0..settings.structures {
            let position = world.on_ground(rng);
            world.structures.push(Structure { position });
        }

        log::info!(
            "Generated noise world ({} colliders, {} actors, {} structures)",
            world.colliders.len(),
            world.actors.len(),
            world.structures.len()
        );
        world
    }

    fn height_at(&self, point: DVec2) -> f64 {
        self.elevation.sample(point.x, point.y) * self.height_scale
    }

    fn on_ground<R: Rng>(&self, rng: &mut R) -> Position {
        let point = self.extent.sample(rng);
        Position::at_elevation(point, self.height_at(point))
    }

    /// Moves every awake actor a few units in a random direction and
    /// occasionally toggles sleep.
    pub fn wander<R: Rng>(&mut self, rng: &mut R) {
        for i in 0..self.actors.len() {
            let actor = self.actors[i];
            if rng.random_bool(0.02) {
                self.actors[i].sleeping = !actor.sleeping;
            }
            if actor.sleeping {
                continue;
            }
            let step = DVec2::new(rng.random_range(-4.0..4.0), rng.random_range(-4.0..4.0));
            let point = actor.position.horizontal() + step;
            if self.extent.contains(point) {
                self.actors[i].position = Position::at_elevation(point, self.height_at(point));
            }
        }
    }

    fn loaded(&self, point: DVec2) -> Result<(), OracleError> {
        if self.extent.contains(point) {
            Ok(())
        } else {
            Err(OracleError::RegionNotLoaded {
                x: point.x,
                z: point.y,
            })
        }
    }

    fn within<T: Copy>(
        items: &[T],
        position: Position,
        radius: f64,
        at: impl Fn(&T) -> Position,
    ) -> Nearby<T> {
        let radius_sq = radius * radius;
        items
            .iter()
            .filter(|item| at(item).horizontal_distance_squared(&position) <= radius_sq)
            .copied()
            .collect::<SmallVec<_>>()
    }

    fn relative_height(&self, point: DVec2) -> f64 {
        (self.height_at(point) - self.water_level) / self.height_scale
    }
}

impl TerrainOracle for NoiseWorld {
    fn extent(&self) -> Result<HorizontalBounds, OracleError> {
        Ok(self.extent)
    }

    fn ground_height(&self, point: DVec2) -> Result<Option<f64>, OracleError> {
        self.loaded(point)?;
        Ok(Some(self.height_at(point)))
    }

    fn is_obstructed_above(&self, position: Position) -> Result<bool, OracleError> {
        let point = position.horizontal();
        self.loaded(point)?;
        let wooded = self.moisture.sample(point.x, point.y) > 0.2;
        Ok(wooded && self.trees.sample(point.x, point.y) > 0.55)
    }

    fn slope(&self, point: DVec2) -> Result<f64, OracleError> {
        self.loaded(point)?;
        let dx = self.height_at(point + DVec2::X * SLOPE_STEP)
            - self.height_at(point - DVec2::X * SLOPE_STEP);
        let dz = self.height_at(point + DVec2::Y * SLOPE_STEP)
            - self.height_at(point - DVec2::Y * SLOPE_STEP);
        let gradient = DVec2::new(dx, dz) / (2.0 * SLOPE_STEP);
        Ok(gradient.length().atan().to_degrees())
    }

    fn surface(&self, point: DVec2) -> Result<CategoryKey, OracleError> {
        self.loaded(point)?;
        let relative = self.relative_height(point);
        let key = if relative < 0.0 {
            "seabed"
        } else if relative < 0.03 {
            "sand"
        } else if relative > 0.6 {
            "rock"
        } else if self.moisture.sample(point.x, point.y) > 0.0 {
            "grass"
        } else {
            "dirt"
        };
        Ok(CategoryKey::from_static(key))
    }

    fn biome(&self, point: DVec2) -> Result<CategoryKey, OracleError> {
        self.loaded(point)?;
        let temperature = self.temperature.sample(point.x, point.y);
        let key = if temperature < -0.35 {
            "tundra"
        } else if temperature > 0.35 {
            "desert"
        } else {
            "temperate"
        };
        Ok(CategoryKey::from_static(key))
    }

    fn topology(&self, point: DVec2) -> Result<CategoryKey, OracleError> {
        self.loaded(point)?;
        let relative = self.relative_height(point);
        let key = if relative < 0.05 {
            "coast"
        } else if relative < 0.3 {
            "plain"
        } else if relative < 0.6 {
            "hill"
        } else {
            "mountain"
        };
        Ok(CategoryKey::from_static(key))
    }

    fn is_inside_solid(&self, position: Position) -> Result<bool, OracleError> {
        let point = position.horizontal();
        self.loaded(point)?;
        Ok(position.y() < self.height_at(point) - 0.5)
    }

    fn in_bounds(&self, position: Position) -> Result<bool, OracleError> {
        Ok(self.extent.contains(position.horizontal()))
    }
}

impl OccupancyOracle for NoiseWorld {
    fn is_submerged(&self, position: Position) -> Result<bool, OracleError> {
        self.loaded(position.horizontal())?;
        Ok(position.y() < self.water_level)
    }

    fn colliders_near(
        &self,
        position: Position,
        radius: f64,
    ) -> Result<Nearby<Collider>, OracleError> {
        self.loaded(position.horizontal())?;
        Ok(Self::within(&self.colliders, position, radius, |c| {
            c.position
        }))
    }

    fn actors_near(&self, position: Position, radius: f64) -> Result<Nearby<Actor>, OracleError> {
        self.loaded(position.horizontal())?;
        Ok(Self::within(&self.actors, position, radius, |a| a.position))
    }

    fn structures_near(
        &self,
        position: Position,
        radius: f64,
    ) -> Result<Nearby<Structure>, OracleError> {
        self.loaded(position.horizontal())?;
        Ok(Self::within(&self.structures, position, radius, |s| {
            s.position
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn world() -> NoiseWorld {
        let settings = WorldSettings {
            half_extent: 500.0,
            ..WorldSettings::default()
        };
        NoiseWorld::generate(&settings, &mut StdRng::seed_from_u64(9))
    }

    #[test]
    fn queries_outside_extent_fail() {
        let world = world();
        let outside = DVec2::new(600.0, 0.0);
        assert_eq!(
            world.ground_height(outside),
            Err(OracleError::RegionNotLoaded { x: 600.0, z: 0.0 })
        );
        assert!(!world.in_bounds(Position::at_elevation(outside, 0.0)).unwrap());
    }

    #[test]
    fn objects_rest_on_ground() {
        let world = world();
        for actor in &world.actors {
            let ground = world.ground_height(actor.position.horizontal()).unwrap();
            assert_eq!(ground, Some(actor.position.y()));
            assert!(!world.is_inside_solid(actor.position).unwrap());
        }
    }

    #[test]
    fn slope_is_in_degrees() {
        let world = world();
        let mut rng = StdRng::seed_from_u64(1);
        for _ in 0..100 {
            let slope = world.slope(world.extent.sample(&mut rng)).unwrap();
            assert!((0.0..90.0).contains(&slope));
        }
    }

    #[test]
    fn submerged_below_water_level() {
        let world = world();
        assert!(world.is_submerged(Position::new(0.0, -1.0, 0.0)).unwrap());
        assert!(!world.is_submerged(Position::new(0.0, 1.0, 0.0)).unwrap());
    }
}
