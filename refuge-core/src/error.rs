//! Error types for the spawn selection core.

use thiserror::Error;

/// A world query could not be answered.
///
/// Acting on unknown world state risks placing an actor inside geometry, so
/// callers never substitute a default for a failed query.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum OracleError {
    /// The world has not finished loading.
    #[error("World is not loaded")]
    WorldNotLoaded,
    /// The region containing the queried point is not loaded.
    #[error("Region at ({x:.1}, {z:.1}) is not loaded")]
    RegionNotLoaded {
        /// World `x` of the query.
        x: f64,
        /// World `z` of the query.
        z: f64,
    },
    /// The backing implementation failed for another reason.
    #[error("World query failed: {0}")]
    Backend(String),
}

/// A configuration value is outside its valid range.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// `min_slope` is greater than `max_slope`, or either is not finite.
    #[error("Invalid slope range [{min}, {max}]")]
    InvalidSlopeRange {
        /// Configured minimum slope.
        min: f64,
        /// Configured maximum slope.
        max: f64,
    },
    /// A radius is negative or not finite.
    #[error("Radius `{name}` must be a finite value >= 0, got {value}")]
    InvalidRadius {
        /// Name of the offending field.
        name: &'static str,
        /// Configured value.
        value: f64,
    },
    /// `max_attempts` is zero.
    #[error("max_attempts must be at least 1")]
    ZeroMaxAttempts,
    /// `replenish.batch_size` is zero.
    #[error("replenish.batch_size must be at least 1")]
    ZeroBatchSize,
    /// `replenish.attempts_per_pass` is zero.
    #[error("replenish.attempts_per_pass must be at least 1")]
    ZeroAttemptsPerPass,
}
