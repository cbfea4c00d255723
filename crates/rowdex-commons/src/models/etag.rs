use serde::{Deserialize, Serialize};
use std::fmt;

const WILDCARD: &str = "*";

/// Opaque concurrency token assigned by the table store on every write.
///
/// A replace must present the token it last read; the wildcard token `*` bypasses
/// the check and is what deletes use.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ETag(String);

impl ETag {
    #[inline]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// The wildcard token that matches any stored version.
    #[inline]
    pub fn any() -> Self {
        Self(WILDCARD.to_string())
    }

    #[inline]
    pub fn is_any(&self) -> bool {
        self.0 == WILDCARD
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ETag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for ETag {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for ETag {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}
