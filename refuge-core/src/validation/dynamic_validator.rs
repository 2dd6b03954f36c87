//! Hand-out-time checks.

use std::fmt;

use crate::config::SpawnConfig;
use crate::error::OracleError;
use crate::position::Position;
use crate::world::{ColliderCategories, ColliderCategory, OccupancyOracle};

/// Why a cached candidate was refused at hand-out time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DynamicRejection {
    /// Under water.
    Submerged,
    /// A blocking collider overlaps the candidate.
    BlockedBy(ColliderCategory),
    /// An awake actor is too close.
    ActorNearby,
    /// A structure is too close.
    StructureNearby,
}

impl fmt::Display for DynamicRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Submerged => f.write_str("submerged"),
            Self::BlockedBy(category) => write!(f, "blocked by {category:?}"),
            Self::ActorNearby => f.write_str("actor nearby"),
            Self::StructureNearby => f.write_str("structure nearby"),
        }
    }
}

/// Outcome of [`DynamicValidator::check`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DynamicVerdict {
    /// The candidate may be used right now.
    Valid,
    /// The candidate is unusable.
    Rejected(DynamicRejection),
}

/// Checks volatile world state around a cached candidate.
#[derive(Debug, Clone, PartialEq)]
pub struct DynamicValidator {
    exclude_water: bool,
    collider_radius: f64,
    blocking: ColliderCategories,
    radius_from_actors: f64,
    radius_from_structures: f64,
}

impl DynamicValidator {
    /// Builds a validator from the toggles and radii of `config`.
    #[must_use]
    pub fn from_config(config: &SpawnConfig) -> Self {
        Self {
            exclude_water: config.exclude_water,
            collider_radius: config.collider_radius,
            blocking: config.blocking_colliders(),
            radius_from_actors: config.radius_from_actors,
            radius_from_structures: config.radius_from_structures,
        }
    }

    /// Collider categories that reject a candidate.
    #[must_use]
    pub const fn blocking_categories(&self) -> ColliderCategories {
        self.blocking
    }

    /// Runs the checks in order: water, colliders, actors, structures.
    pub fn check<O: OccupancyOracle + ?Sized>(
        &self,
        occupancy: &O,
        position: Position,
    ) -> Result<DynamicVerdict, OracleError> {
        if self.exclude_water && occupancy.is_submerged(position)? {
            return Ok(DynamicVerdict::Rejected(DynamicRejection::Submerged));
        }

        let colliders = occupancy.colliders_near(position, self.collider_radius)?;
        if let Some(collider) = colliders
            .iter()
            .find(|c| self.blocking.intersects(ColliderCategories::from(c.category)))
        {
            return Ok(DynamicVerdict::Rejected(DynamicRejection::BlockedBy(
                collider.category,
            )));
        }

        if self.radius_from_actors > 0.0
            && occupancy
                .actors_near(position, self.radius_from_actors)?
                .iter()
                .any(|actor| !actor.sleeping)
        {
            return Ok(DynamicVerdict::Rejected(DynamicRejection::ActorNearby));
        }

        if self.radius_from_structures > 0.0
            && !occupancy
                .structures_near(position, self.radius_from_structures)?
                .is_empty()
        {
            return Ok(DynamicVerdict::Rejected(DynamicRejection::StructureNearby));
        }

        Ok(DynamicVerdict::Valid)
    }

    /// Whether the candidate may be used right now.
    pub fn is_dynamically_valid<O: OccupancyOracle + ?Sized>(
        &self,
        occupancy: &O,
        position: Position,
    ) -> Result<bool, OracleError> {
        Ok(self.check(occupancy, position)? == DynamicVerdict::Valid)
    }
}
