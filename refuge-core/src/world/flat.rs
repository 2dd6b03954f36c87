use glam::DVec2;
use refuge_utils::CategoryKey;

use super::{Actor, Collider, Nearby, OccupancyOracle, Structure, TerrainOracle};
use crate::error::OracleError;
use crate::position::{HorizontalBounds, Position};

/// A world with one uniform ground plane.
///
/// Every column has the same height, slope and classification, and the
/// occupancy queries answer from plain lists. Used for tests, benchmarks and
/// the `flat` world generator of the binary.
#[derive(Debug, Clone)]
pub struct FlatWorld {
    /// Horizontal sampling extent.
    pub extent: HorizontalBounds,
    /// Ground elevation everywhere. `None` means no ground at all.
    pub height: Option<f64>,
    /// Slope reported everywhere, in degrees.
    pub slope: f64,
    /// Surface category reported everywhere.
    pub surface: CategoryKey,
    /// Biome category reported everywhere.
    pub biome: CategoryKey,
    /// Topology category reported everywhere.
    pub topology: CategoryKey,
    /// Whether every position has an obstruction above it.
    pub obstructed: bool,
    /// Whether every position is inside solid geometry.
    pub inside_solid: bool,
    /// Whether every position is submerged.
    pub submerged: bool,
    /// Colliders placed in the world.
    pub colliders: Vec<Collider>,
    /// Actors placed in the world.
    pub actors: Vec<Actor>,
    /// Structures placed in the world.
    pub structures: Vec<Structure>,
    /// When set, every query fails with [`OracleError::WorldNotLoaded`].
    pub unloaded: bool,
}

impl FlatWorld {
    /// Creates a flat grass plain at height 4 spanning `half_extent` in every direction.
    #[must_use]
    pub fn new(half_extent: f64) -> Self {
        Self {
            extent: HorizontalBounds::centered(half_extent),
            height: Some(4.0),
            slope: 0.0,
            surface: CategoryKey::from_static("grass"),
            biome: CategoryKey::from_static("temperate"),
            topology: CategoryKey::from_static("field"),
            obstructed: false,
            inside_solid: false,
            submerged: false,
            colliders: Vec::new(),
            actors: Vec::new(),
            structures: Vec::new(),
            unloaded: false,
        }
    }

    /// Sets the slope reported everywhere.
    #[must_use]
    pub const fn with_slope(mut self, slope: f64) -> Self {
        self.slope = slope;
        self
    }

    /// Sets the surface, biome and topology categories.
    #[must_use]
    pub fn with_categories(
        mut self,
        surface: impl Into<CategoryKey>,
        biome: impl Into<CategoryKey>,
        topology: impl Into<CategoryKey>,
    ) -> Self {
        self.surface = surface.into();
        self.biome = biome.into();
        self.topology = topology.into();
        self
    }

    const fn loaded(&self) -> Result<(), OracleError> {
        if self.unloaded {
            Err(OracleError::WorldNotLoaded)
        } else {
            Ok(())
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
            .collect()
    }
}

impl TerrainOracle for FlatWorld {
    fn extent(&self) -> Result<HorizontalBounds, OracleError> {
        self.loaded()?;
        Ok(self.extent)
    }

    fn ground_height(&self, _point: DVec2) -> Result<Option<f64>, OracleError> {
        self.loaded()?;
        Ok(self.height)
    }

    fn is_obstructed_above(&self, _position: Position) -> Result<bool, OracleError> {
        self.loaded()?;
        Ok(self.obstructed)
    }

    fn slope(&self, _point: DVec2) -> Result<f64, OracleError> {
        self.loaded()?;
        Ok(self.slope)
    }

    fn surface(&self, _point: DVec2) -> Result<CategoryKey, OracleError> {
        self.loaded()?;
        Ok(self.surface.clone())
    }

    fn biome(&self, _point: DVec2) -> Result<CategoryKey, OracleError> {
        self.loaded()?;
        Ok(self.biome.clone())
    }

    fn topology(&self, _point: DVec2) -> Result<CategoryKey, OracleError> {
        self.loaded()?;
        Ok(self.topology.clone())
    }

    fn is_inside_solid(&self, _position: Position) -> Result<bool, OracleError> {
        self.loaded()?;
        Ok(self.inside_solid)
    }

    fn in_bounds(&self, position: Position) -> Result<bool, OracleError> {
        self.loaded()?;
        Ok(self.extent.contains(position.horizontal()))
    }
}

impl OccupancyOracle for FlatWorld {
    fn is_submerged(&self, _position: Position) -> Result<bool, OracleError> {
        self.loaded()?;
        Ok(self.submerged)
    }

    fn colliders_near(
        &self,
        position: Position,
        radius: f64,
    ) -> Result<Nearby<Collider>, OracleError> {
        self.loaded()?;
        Ok(Self::within(&self.colliders, position, radius, |c| {
            c.position
        }))
    }

    fn actors_near(&self, position: Position, radius: f64) -> Result<Nearby<Actor>, OracleError> {
        self.loaded()?;
        Ok(Self::within(&self.actors, position, radius, |a| a.position))
    }

    fn structures_near(
        &self,
        position: Position,
        radius: f64,
    ) -> Result<Nearby<Structure>, OracleError> {
        self.loaded()?;
        Ok(Self::within(&self.structures, position, radius, |s| {
            s.position
        }))
    }
}
