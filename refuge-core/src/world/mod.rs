//! World oracle interfaces.
//!
//! The selection core never inspects terrain or entities directly. It asks
//! two oracles:
//!
//! - [`TerrainOracle`] - properties assumed stable for a cached candidate's
//!   lifetime (ground, slope, classification, solidity, bounds)
//! - [`OccupancyOracle`] - volatile properties re-checked at hand-out time
//!   (water, colliders, actors, structures)
//!
//! Every query may fail with an [`OracleError`].

mod flat;

use bitflags::bitflags;
use glam::DVec2;
use refuge_utils::CategoryKey;
use smallvec::SmallVec;

use crate::error::OracleError;
use crate::position::{HorizontalBounds, Position};

pub use flat::FlatWorld;

/// Result list of a proximity query. Most queries return a handful of hits.
pub type Nearby<T> = SmallVec<[T; 4]>;

/// Static world queries used while generating candidates.
pub trait TerrainOracle {
    /// The horizontal rectangle random samples are drawn from.
    fn extent(&self) -> Result<HorizontalBounds, OracleError>;

    /// Ground elevation at a horizontal point, or `None` if there is no ground.
    fn ground_height(&self, point: DVec2) -> Result<Option<f64>, OracleError>;

    /// Whether a colliding obstruction sits directly above the position.
    fn is_obstructed_above(&self, position: Position) -> Result<bool, OracleError>;

    /// Local terrain slope in degrees.
    fn slope(&self, point: DVec2) -> Result<f64, OracleError>;

    /// Dominant ground-cover category.
    fn surface(&self, point: DVec2) -> Result<CategoryKey, OracleError>;

    /// Dominant biome category.
    fn biome(&self, point: DVec2) -> Result<CategoryKey, OracleError>;

    /// Discrete terrain-feature category.
    fn topology(&self, point: DVec2) -> Result<CategoryKey, OracleError>;

    /// Whether the position is embedded in impassable geometry.
    fn is_inside_solid(&self, position: Position) -> Result<bool, OracleError>;

    /// Whether the position is inside the valid play area.
    fn in_bounds(&self, position: Position) -> Result<bool, OracleError>;
}

/// Volatile world queries used when a candidate is about to be handed out.
pub trait OccupancyOracle {
    /// Whether the position is under water.
    fn is_submerged(&self, position: Position) -> Result<bool, OracleError>;

    /// Colliders within `radius` of the position.
    fn colliders_near(&self, position: Position, radius: f64)
    -> Result<Nearby<Collider>, OracleError>;

    /// Actors within `radius` of the position.
    fn actors_near(&self, position: Position, radius: f64) -> Result<Nearby<Actor>, OracleError>;

    /// Player-built structures within `radius` of the position.
    fn structures_near(
        &self,
        position: Position,
        radius: f64,
    ) -> Result<Nearby<Structure>, OracleError>;
}

/// Category tag carried by a collider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColliderCategory {
    /// A structure that forbids spawning around it.
    SpawnBlockingStructure,
    /// A trigger volume that forbids spawning inside it.
    SpawnBlockingZone,
    /// Large vehicle.
    LargeVehicle,
    /// Medium vehicle.
    MediumVehicle,
    /// Small vehicle with detailed collision.
    DetailedVehicle,
    /// Marker volume of a managed zone.
    ManagedZone,
    /// Radiation volume.
    RadiationZone,
    /// Fire hazard marker.
    FireHazard,
    /// Ice hazard marker.
    IceHazard,
    /// Anything else; never blocks.
    Other,
}

bitflags! {
    /// A set of collider categories.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ColliderCategories: u16 {
        /// [`ColliderCategory::SpawnBlockingStructure`]
        const SPAWN_BLOCKING_STRUCTURE = 1 << 0;
        /// [`ColliderCategory::SpawnBlockingZone`]
        const SPAWN_BLOCKING_ZONE = 1 << 1;
        /// [`ColliderCategory::LargeVehicle`]
        const LARGE_VEHICLE = 1 << 2;
        /// [`ColliderCategory::MediumVehicle`]
        const MEDIUM_VEHICLE = 1 << 3;
        /// [`ColliderCategory::DetailedVehicle`]
        const DETAILED_VEHICLE = 1 << 4;
        /// [`ColliderCategory::ManagedZone`]
        const MANAGED_ZONE = 1 << 5;
        /// [`ColliderCategory::RadiationZone`]
        const RADIATION_ZONE = 1 << 6;
        /// [`ColliderCategory::FireHazard`]
        const FIRE_HAZARD = 1 << 7;
        /// [`ColliderCategory::IceHazard`]
        const ICE_HAZARD = 1 << 8;

        /// Categories that block regardless of configuration.
        const ALWAYS_BLOCKING = Self::SPAWN_BLOCKING_STRUCTURE.bits()
            | Self::LARGE_VEHICLE.bits()
            | Self::MEDIUM_VEHICLE.bits()
            | Self::DETAILED_VEHICLE.bits()
            | Self::FIRE_HAZARD.bits()
            | Self::ICE_HAZARD.bits();
    }
}

impl From<ColliderCategory> for ColliderCategories {
    fn from(category: ColliderCategory) -> Self {
        match category {
            ColliderCategory::SpawnBlockingStructure => Self::SPAWN_BLOCKING_STRUCTURE,
            ColliderCategory::SpawnBlockingZone => Self::SPAWN_BLOCKING_ZONE,
            ColliderCategory::LargeVehicle => Self::LARGE_VEHICLE,
            ColliderCategory::MediumVehicle => Self::MEDIUM_VEHICLE,
            ColliderCategory::DetailedVehicle => Self::DETAILED_VEHICLE,
            ColliderCategory::ManagedZone => Self::MANAGED_ZONE,
            ColliderCategory::RadiationZone => Self::RADIATION_ZONE,
            ColliderCategory::FireHazard => Self::FIRE_HAZARD,
            ColliderCategory::IceHazard => Self::ICE_HAZARD,
            ColliderCategory::Other => Self::empty(),
        }
    }
}

/// A collider reported by [`OccupancyOracle::colliders_near`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Collider {
    /// Where the collider is.
    pub position: Position,
    /// What kind of object it belongs to.
    pub category: ColliderCategory,
}

/// An actor reported by [`OccupancyOracle::actors_near`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Actor {
    /// Where the actor is.
    pub position: Position,
    /// Sleeping actors do not block spawning.
    pub sleeping: bool,
}

/// A player-built structure reported by [`OccupancyOracle::structures_near`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Structure {
    /// Where the structure is.
    pub position: Position,
}
