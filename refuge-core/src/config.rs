//! Spawn selection configuration.
//!
//! Loaded by the host at startup and injected into [`SpawnSelector`]. Every
//! field has a default so partial config files work.
//!
//! [`SpawnSelector`]: crate::selection::SpawnSelector

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::validation::AllowMap;
use crate::world::ColliderCategories;

/// Thresholds, toggles and allow-maps for candidate validation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpawnConfig {
    /// Dynamic checks a single request may spend before giving up.
    pub max_attempts: u32,
    /// Awake actors within this radius reject a candidate. `0` disables.
    pub radius_from_actors: f64,
    /// Structures within this radius reject a candidate. `0` disables.
    pub radius_from_structures: f64,
    /// Radius of the collider overlap check.
    pub collider_radius: f64,
    /// Minimum accepted slope in degrees.
    pub min_slope: f64,
    /// Maximum accepted slope in degrees.
    pub max_slope: f64,
    /// Reject submerged candidates.
    pub exclude_water: bool,
    /// Reject candidates inside spawn-blocking trigger zones.
    pub exclude_spawn_blocking_zones: bool,
    /// Reject candidates near managed-zone markers.
    pub exclude_managed_zones: bool,
    /// Reject candidates inside radiation zones.
    pub exclude_radiation_zones: bool,
    /// Allowed ground-cover categories.
    pub surfaces: AllowMap,
    /// Allowed biome categories.
    pub biomes: AllowMap,
    /// Allowed terrain-feature categories.
    pub topologies: AllowMap,
    /// Background replenishment settings.
    pub replenish: ReplenishConfig,
}

impl Default for SpawnConfig {
    fn default() -> Self {
        Self {
            max_attempts: 10,
            radius_from_actors: 30.0,
            radius_from_structures: 15.0,
            collider_radius: 3.0,
            min_slope: 0.0,
            max_slope: 40.0,
            exclude_water: true,
            exclude_spawn_blocking_zones: true,
            exclude_managed_zones: true,
            exclude_radiation_zones: true,
            surfaces: AllowMap::new(),
            biomes: AllowMap::new(),
            topologies: AllowMap::new(),
            replenish: ReplenishConfig::default(),
        }
    }
}

impl SpawnConfig {
    /// Checks every value is within its valid range.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.min_slope.is_finite()
            || !self.max_slope.is_finite()
            || self.min_slope > self.max_slope
        {
            return Err(ConfigError::InvalidSlopeRange {
                min: self.min_slope,
                max: self.max_slope,
            });
        }

        for (name, value) in [
            ("radius_from_actors", self.radius_from_actors),
            ("radius_from_structures", self.radius_from_structures),
            ("collider_radius", self.collider_radius),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::InvalidRadius { name, value });
            }
        }

        if self.max_attempts == 0 {
            return Err(ConfigError::ZeroMaxAttempts);
        }

        self.replenish.validate()
    }

    /// Collider categories that reject a candidate under this configuration.
    #[must_use]
    pub fn blocking_colliders(&self) -> ColliderCategories {
        let mut blocking = ColliderCategories::ALWAYS_BLOCKING;
        blocking.set(
            ColliderCategories::SPAWN_BLOCKING_ZONE,
            self.exclude_spawn_blocking_zones,
        );
        blocking.set(ColliderCategories::MANAGED_ZONE, self.exclude_managed_zones);
        blocking.set(
            ColliderCategories::RADIATION_ZONE,
            self.exclude_radiation_zones,
        );
        blocking
    }
}

/// How the background fill paces itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReplenishConfig {
    /// Sampling attempts per host tick.
    pub batch_size: u32,
    /// A pass starts once the cache holds fewer candidates than this.
    pub low_water_mark: usize,
    /// Sampling attempts made by one pass.
    pub attempts_per_pass: u32,
}

impl Default for ReplenishConfig {
    fn default() -> Self {
        Self {
            batch_size: 20,
            low_water_mark: 100,
            attempts_per_pass: 2000,
        }
    }
}

impl ReplenishConfig {
    /// Checks the pacing values are usable.
    pub const fn validate(&self) -> Result<(), ConfigError> {
        if self.batch_size == 0 {
            return Err(ConfigError::ZeroBatchSize);
        }
        if self.attempts_per_pass == 0 {
            return Err(ConfigError::ZeroAttemptsPerPass);
        }
        Ok(())
    }
}
