//! # Refuge Core
//!
//! Spawn position selection for large outdoor worlds. A background fill keeps
//! a cache of statically valid candidates, and requests re-check candidates
//! against the live world before handing them out.

pub mod cache;
pub mod config;
pub mod error;
pub mod host;
pub mod position;
pub mod replenish;
pub mod selection;
pub mod validation;
pub mod world;

pub use cache::{CandidateCache, CandidateHandle};
pub use config::{ReplenishConfig, SpawnConfig};
pub use error::{ConfigError, OracleError};
pub use host::{SpawnHost, TickReport};
pub use position::{HorizontalBounds, Position};
pub use replenish::{PassSummary, Replenisher, RunState, StepOutcome};
pub use selection::{Exhaustion, ExhaustionReason, SelectionStats, SpawnSelector};
pub use world::{FlatWorld, OccupancyOracle, TerrainOracle};
