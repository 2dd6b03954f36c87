//! Generation-time checks.

use std::borrow::Cow;
use std::fmt;

use glam::DVec2;
use refuge_utils::CategoryKey;

use super::allow_map::{AllowMap, classify};
use crate::config::SpawnConfig;
use crate::error::OracleError;
use crate::position::Position;
use crate::world::TerrainOracle;

/// Why a sampled point was discarded.
///
/// Variants are listed in evaluation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StaticRejection {
    /// No ground under the point.
    NoGround,
    /// Something collides directly above the point.
    Obstructed,
    /// Slope outside the configured range.
    Slope,
    /// Surface category disallowed.
    Surface,
    /// Biome category disallowed.
    Biome,
    /// Topology category disallowed.
    Topology,
    /// Point is embedded in solid geometry.
    InsideSolid,
    /// Point is outside the play area.
    OutOfBounds,
}

impl StaticRejection {
    /// Every reason, in evaluation order.
    pub const ALL: [Self; 8] = [
        Self::NoGround,
        Self::Obstructed,
        Self::Slope,
        Self::Surface,
        Self::Biome,
        Self::Topology,
        Self::InsideSolid,
        Self::OutOfBounds,
    ];

    const fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for StaticRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::NoGround => "no_ground",
            Self::Obstructed => "obstructed",
            Self::Slope => "slope",
            Self::Surface => "surface",
            Self::Biome => "biome",
            Self::Topology => "topology",
            Self::InsideSolid => "inside_solid",
            Self::OutOfBounds => "out_of_bounds",
        })
    }
}

/// Outcome of [`StaticValidator::check`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StaticVerdict {
    /// The point passed every check; carries the resolved position.
    Accepted(Position),
    /// The point failed a check.
    Rejected(StaticRejection),
}

/// Per-reason rejection tally for a replenishment pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RejectionCounts {
    counts: [u32; StaticRejection::ALL.len()],
    /// Attempts abandoned because a world query failed.
    pub oracle_failures: u32,
}

impl RejectionCounts {
    /// Counts one rejection.
    pub const fn record(&mut self, reason: StaticRejection) {
        self.counts[reason.index()] += 1;
    }

    /// Rejections for one reason.
    #[must_use]
    pub const fn get(&self, reason: StaticRejection) -> u32 {
        self.counts[reason.index()]
    }

    /// All rejections, including oracle failures.
    #[must_use]
    pub fn total(&self) -> u32 {
        self.counts.iter().sum::<u32>() + self.oracle_failures
    }

    /// Non-zero reasons with their counts.
    pub fn iter(&self) -> impl Iterator<Item = (StaticRejection, u32)> + '_ {
        StaticRejection::ALL
            .into_iter()
            .map(|reason| (reason, self.get(reason)))
            .filter(|(_, count)| *count > 0)
    }
}

impl fmt::Display for RejectionCounts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (reason, count) in self.iter() {
            if !first {
                f.write_str(", ")?;
            }
            write!(f, "{reason}={count}")?;
            first = false;
        }
        if self.oracle_failures > 0 {
            if !first {
                f.write_str(", ")?;
            }
            write!(f, "oracle_failure={}", self.oracle_failures)?;
            first = false;
        }
        if first {
            f.write_str("none")?;
        }
        Ok(())
    }
}

/// Which allow-map a key belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClassificationAxis {
    /// Ground cover.
    Surface,
    /// Biome.
    Biome,
    /// Terrain feature.
    Topology,
}

impl fmt::Display for ClassificationAxis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Surface => "surface",
            Self::Biome => "biome",
            Self::Topology => "topology",
        })
    }
}

/// A key that was added to an allow-map because it had not been seen before.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedKey {
    /// The allow-map the key was added to.
    pub axis: ClassificationAxis,
    /// The key, recorded as allowed.
    pub key: CategoryKey,
}

/// Checks terrain properties assumed stable while a candidate sits in the cache.
///
/// Checks short-circuit in this order: ground and overhead obstruction, slope,
/// surface/biome/topology allow-maps, solid geometry, play bounds.
#[derive(Debug, Clone)]
pub struct StaticValidator {
    min_slope: f64,
    max_slope: f64,
    surfaces: AllowMap,
    biomes: AllowMap,
    topologies: AllowMap,
    recorded: Vec<RecordedKey>,
}

impl StaticValidator {
    /// Builds a validator from the slope range and allow-maps of `config`.
    #[must_use]
    pub fn from_config(config: &SpawnConfig) -> Self {
        Self {
            min_slope: config.min_slope,
            max_slope: config.max_slope,
            surfaces: config.surfaces.clone(),
            biomes: config.biomes.clone(),
            topologies: config.topologies.clone(),
            recorded: Vec::new(),
        }
    }

    /// Assigns ground elevation to a horizontal point.
    ///
    /// Returns `None` when there is no ground under the point.
    pub fn resolve<T: TerrainOracle + ?Sized>(
        terrain: &T,
        point: DVec2,
    ) -> Result<Option<Position>, OracleError> {
        Ok(terrain
            .ground_height(point)?
            .map(|height| Position::at_elevation(point, height)))
    }

    /// Runs every static check against a raw horizontal point.
    pub fn check<T: TerrainOracle + ?Sized>(
        &mut self,
        terrain: &T,
        point: DVec2,
    ) -> Result<StaticVerdict, OracleError> {
        let Some(position) = Self::resolve(terrain, point)? else {
            return Ok(StaticVerdict::Rejected(StaticRejection::NoGround));
        };
        if terrain.is_obstructed_above(position)? {
            return Ok(StaticVerdict::Rejected(StaticRejection::Obstructed));
        }

        let slope = terrain.slope(point)?;
        if !(self.min_slope..=self.max_slope).contains(&slope) {
            return Ok(StaticVerdict::Rejected(StaticRejection::Slope));
        }

        if !self.allows(ClassificationAxis::Surface, &terrain.surface(point)?) {
            return Ok(StaticVerdict::Rejected(StaticRejection::Surface));
        }
        if !self.allows(ClassificationAxis::Biome, &terrain.biome(point)?) {
            return Ok(StaticVerdict::Rejected(StaticRejection::Biome));
        }
        if !self.allows(ClassificationAxis::Topology, &terrain.topology(point)?) {
            return Ok(StaticVerdict::Rejected(StaticRejection::Topology));
        }

        if terrain.is_inside_solid(position)? {
            return Ok(StaticVerdict::Rejected(StaticRejection::InsideSolid));
        }
        if !terrain.in_bounds(position)? {
            return Ok(StaticVerdict::Rejected(StaticRejection::OutOfBounds));
        }

        Ok(StaticVerdict::Accepted(position))
    }

    /// Whether a raw horizontal point passes every static check.
    pub fn is_statically_valid<T: TerrainOracle + ?Sized>(
        &mut self,
        terrain: &T,
        point: DVec2,
    ) -> Result<bool, OracleError> {
        Ok(matches!(
            self.check(terrain, point)?,
            StaticVerdict::Accepted(_)
        ))
    }

    /// The allow-map currently in effect for an axis.
    #[must_use]
    pub const fn allow_map(&self, axis: ClassificationAxis) -> &AllowMap {
        match axis {
            ClassificationAxis::Surface => &self.surfaces,
            ClassificationAxis::Biome => &self.biomes,
            ClassificationAxis::Topology => &self.topologies,
        }
    }

    /// Drains the keys recorded since the last call, oldest first.
    pub fn take_recorded_keys(&mut self) -> Vec<RecordedKey> {
        std::mem::take(&mut self.recorded)
    }

    /// Copies the current allow-maps into `config`.
    pub fn export_allow_maps(&self, config: &mut SpawnConfig) {
        config.surfaces.clone_from(&self.surfaces);
        config.biomes.clone_from(&self.biomes);
        config.topologies.clone_from(&self.topologies);
    }

    fn allows(&mut self, axis: ClassificationAxis, key: &CategoryKey) -> bool {
        let map = match axis {
            ClassificationAxis::Surface => &mut self.surfaces,
            ClassificationAxis::Biome => &mut self.biomes,
            ClassificationAxis::Topology => &mut self.topologies,
        };

        let (allowed, updated) = classify(key, map);
        let extended = match updated {
            Cow::Owned(extended) => Some(extended),
            Cow::Borrowed(_) => None,
        };
        if let Some(extended) = extended {
            *map = extended;
            log::info!("Recorded new {axis} category `{key}` as allowed");
            self.recorded.push(RecordedKey {
                axis,
                key: key.clone(),
            });
        }
        allowed
    }
}
