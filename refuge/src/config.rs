//! The `config/refuge.json5` file.

use std::path::Path;
use std::{fs, io};

use refuge_core::{ConfigError, SpawnConfig};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Where the config file lives, relative to the working directory.
pub const CONFIG_PATH: &str = "config/refuge.json5";

/// Failed to load the config file.
#[derive(Error, Debug)]
pub enum LoadError {
    /// Reading or writing the file failed.
    #[error("Could not access {CONFIG_PATH}: {0}")]
    Io(#[from] io::Error),
    /// The file is not valid JSON5 or does not match the schema.
    #[error("Could not parse {CONFIG_PATH}: {0}")]
    Parse(#[from] serde_json5::Error),
    /// The default config could not be serialized.
    #[error("Could not write default config: {0}")]
    Serialize(#[from] serde_json::Error),
    /// A value is out of range.
    #[error("Invalid spawn settings: {0}")]
    Invalid(#[from] ConfigError),
    /// A demo world parameter is out of range.
    #[error("world.{field} must be a finite value > 0, got {value}")]
    InvalidWorld {
        /// Name of the offending field.
        field: &'static str,
        /// Configured value.
        value: f64,
    },
}

/// Which demo world to generate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorldGeneratorType {
    /// Noise-generated terrain with water, biomes and scattered objects.
    Noise,
    /// One flat grass plain.
    Flat,
}

/// Parameters of the demo world.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldSettings {
    /// Which generator to use.
    pub generator: WorldGeneratorType,
    /// Half the side length of the square world.
    pub half_extent: f64,
    /// Peak terrain elevation above and below zero.
    pub height_scale: f64,
    /// Elevation of the water surface.
    pub water_level: f64,
    /// Number of wandering actors.
    pub actors: usize,
    /// Number of player structures.
    pub structures: usize,
    /// Number of colliders of random categories.
    pub colliders: usize,
}

impl WorldSettings {
    /// Checks that the world can be generated and sampled.
    pub fn validate(&self) -> Result<(), LoadError> {
        // The full side length has to stay finite for uniform sampling.
        let side = self.half_extent * 2.0;
        if !(side.is_finite() && self.half_extent > 0.0) {
            return Err(LoadError::InvalidWorld {
                field: "half_extent",
                value: self.half_extent,
            });
        }
        if !(self.height_scale.is_finite() && self.height_scale > 0.0) {
            return Err(LoadError::InvalidWorld {
                field: "height_scale",
                value: self.height_scale,
            });
        }
        Ok(())
    }
}

impl Default for WorldSettings {
    fn default() -> Self {
        Self {
            generator: WorldGeneratorType::Noise,
            half_extent: 2000.0,
            height_scale: 80.0,
            water_level: 0.0,
            actors: 60,
            structures: 120,
            colliders: 400,
        }
    }
}

/// Top-level binary configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RefugeConfig {
    /// World seed. Empty picks a random one; non-numeric text is hashed.
    pub seed: String,
    /// Host ticks per second.
    pub tick_rate: f64,
    /// Milliseconds between simulated respawn requests. Zero disables them.
    pub request_interval_ms: u64,
    /// Demo world parameters.
    pub world: WorldSettings,
    /// Spawn selection settings.
    pub spawn: SpawnConfig,
}

impl Default for RefugeConfig {
    fn default() -> Self {
        Self {
            seed: String::new(),
            tick_rate: 20.0,
            request_interval_ms: 250,
            world: WorldSettings::default(),
            spawn: SpawnConfig::default(),
        }
    }
}

impl RefugeConfig {
    /// Loads the config file, writing the defaults first if it does not exist.
    pub fn load_or_create(path: &Path) -> Result<Self, LoadError> {
        let config = if path.exists() {
            serde_json5::from_str(&fs::read_to_string(path)?)?
        } else {
            let config = Self::default();
            config.save(path)?;
            log::info!("Wrote default config to {}", path.display());
            config
        };
        config.spawn.validate()?;
        config.world.validate()?;
        Ok(config)
    }

    /// Writes the config as JSON, which is valid JSON5.
    pub fn save(&self, path: &Path) -> Result<(), LoadError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    /// Resolves the seed string to a number.
    #[must_use]
    pub fn seed(&self) -> u64 {
        if self.seed.is_empty() {
            return rand::random();
        }
        self.seed.parse().unwrap_or_else(|_| {
            let mut hash: u64 = 0;
            for byte in self.seed.bytes() {
                hash = hash.wrapping_mul(31).wrapping_add(u64::from(byte));
            }
            hash
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_file_keeps_defaults() {
        let config: RefugeConfig = serde_json5::from_str(
            r#"{
                // comments are allowed
                seed: "refuge",
                world: { generator: "flat" },
                spawn: { max_attempts: 4, surfaces: { sand: false } },
            }"#,
        )
        .unwrap();

        assert_eq!(config.world.generator, WorldGeneratorType::Flat);
        assert_eq!(config.world.half_extent, 2000.0);
        assert_eq!(config.spawn.max_attempts, 4);
        assert_eq!(config.spawn.surfaces.get("sand"), Some(false));
        assert_eq!(config.tick_rate, 20.0);
    }

    #[test]
    fn unbounded_world_extent_is_rejected() {
        for half_extent in [f64::INFINITY, 1.0e308, 0.0, -5.0] {
            let settings = WorldSettings {
                half_extent,
                ..WorldSettings::default()
            };
            assert!(matches!(
                settings.validate(),
                Err(LoadError::InvalidWorld {
                    field: "half_extent",
                    ..
                })
            ));
        }
        assert!(WorldSettings::default().validate().is_ok());
    }

    #[test]
    fn text_seeds_are_stable() {
        let config = RefugeConfig {
            seed: "refuge".to_owned(),
            ..RefugeConfig::default()
        };
        assert_eq!(config.seed(), config.seed());

        let numeric = RefugeConfig {
            seed: "42".to_owned(),
            ..RefugeConfig::default()
        };
        assert_eq!(numeric.seed(), 42);
    }

    #[test]
    fn default_config_round_trips_through_file() {
        let dir = std::env::temp_dir().join(format!("refuge-config-{}", std::process::id()));
        let path = dir.join("refuge.json5");

        let written = RefugeConfig::load_or_create(&path).unwrap();
        let read = RefugeConfig::load_or_create(&path).unwrap();
        assert_eq!(written, read);

        fs::remove_dir_all(dir).unwrap();
    }
}
