//! Self-extending allow-maps.
//!
//! An allow-map answers "may a candidate stand on this category?". Keys that
//! have never been seen are allowed and get recorded with `true`, so the map
//! converges to an explicit list of every category the world produces.

use std::borrow::Cow;

use refuge_utils::CategoryKey;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

/// Category key → allowed flag.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AllowMap(FxHashMap<CategoryKey, bool>);

impl AllowMap {
    /// An empty map; every key is allowed until recorded otherwise.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the recorded flag for a key, if any.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<bool> {
        self.0.get(key).copied()
    }

    /// Records a flag for a key, replacing any previous value.
    pub fn set(&mut self, key: impl Into<CategoryKey>, allowed: bool) {
        self.0.insert(key.into(), allowed);
    }

    /// Builder form of [`set`](Self::set).
    #[must_use]
    pub fn with(mut self, key: impl Into<CategoryKey>, allowed: bool) -> Self {
        self.set(key, allowed);
        self
    }

    /// Number of recorded keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether no key has been recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates over the recorded keys in unspecified order.
    pub fn iter(&self) -> impl Iterator<Item = (&CategoryKey, bool)> {
        self.0.iter().map(|(key, allowed)| (key, *allowed))
    }
}

impl FromIterator<(CategoryKey, bool)> for AllowMap {
    fn from_iter<I: IntoIterator<Item = (CategoryKey, bool)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Looks a key up without mutating the map.
///
/// Returns whether the key is allowed and the map that should be in effect
/// afterwards: the same map when the key was known, or an extended copy with
/// the key recorded as `true` when it was not.
#[must_use]
pub fn classify<'a>(key: &CategoryKey, map: &'a AllowMap) -> (bool, Cow<'a, AllowMap>) {
    match map.get(key.as_str()) {
        Some(allowed) => (allowed, Cow::Borrowed(map)),
        None => {
            let mut updated = map.clone();
            updated.set(key.clone(), true);
            (true, Cow::Owned(updated))
        }
    }
}
