//! Two-stage candidate validation.
//!
//! [`StaticValidator`] runs once per sampled point while the cache is being
//! filled and checks properties that stay valid for a candidate's lifetime in
//! the cache. [`DynamicValidator`] runs every time a cached candidate is about
//! to be handed out and checks volatile world state.

mod allow_map;
mod dynamic_validator;
mod static_validator;

pub use allow_map::{AllowMap, classify};
pub use dynamic_validator::{DynamicRejection, DynamicValidator, DynamicVerdict};
pub use static_validator::{
    ClassificationAxis, RecordedKey, RejectionCounts, StaticRejection, StaticValidator,
    StaticVerdict,
};
