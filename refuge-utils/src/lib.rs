//! Shared utilities for the refuge workspace.
//!
//! - [`key`] - classification keys used by the allow-maps
//! - [`locks`] - lock aliases over `parking_lot`
//! - [`noise`] - simplex noise used by the demo world

pub mod key;
pub mod locks;
pub mod noise;

pub use key::CategoryKey;
