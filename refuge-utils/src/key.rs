//! Classification keys.
//!
//! Surface, biome and topology oracles answer with a [`CategoryKey`]. Keys are
//! compared case-sensitively and serialize as plain strings so allow-maps read
//! naturally in config files.

use std::borrow::{Borrow, Cow};
use std::fmt;

use serde::{Deserialize, Serialize};

/// A named classification category such as `grass`, `forest` or `beach`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CategoryKey(Cow<'static, str>);

impl CategoryKey {
    /// Creates a key from a static string without allocating.
    #[must_use]
    pub const fn from_static(name: &'static str) -> Self {
        Self(Cow::Borrowed(name))
    }

    /// Creates a key from an owned or borrowed string.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self(Cow::Owned(name.into()))
    }

    /// The key as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CategoryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&'static str> for CategoryKey {
    fn from(name: &'static str) -> Self {
        Self::from_static(name)
    }
}

impl From<String> for CategoryKey {
    fn from(name: String) -> Self {
        Self(Cow::Owned(name))
    }
}

impl Borrow<str> for CategoryKey {
    fn borrow(&self) -> &str {
        &self.0
    }
}
