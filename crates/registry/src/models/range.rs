use crate::error::{ErrorKind, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// The span of game versions a pack supports.
///
/// Bounds are opaque strings: nothing parses them as numbers, and ordering is
/// plain string ordering on [`minimum`](Self::minimum). That means `"1.8"`
/// sorts *after* `"1.21"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VersionRange {
    pub minimum: String,
    pub maximum: String,
}
impl VersionRange {
    pub fn new(minimum: impl Into<String>, maximum: impl Into<String>) -> Self {
        Self {
            minimum: minimum.into(),
            maximum: maximum.into(),
        }
    }

    pub(crate) fn validate(&self) -> Result<()> {
        if self.minimum.trim().is_empty() {
            exn::bail!(ErrorKind::invalid("minecraft.minimum", "must not be empty"));
        }
        if self.maximum.trim().is_empty() {
            exn::bail!(ErrorKind::invalid("minecraft.maximum", "must not be empty"));
        }
        Ok(())
    }
}
impl fmt::Display for VersionRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.minimum, self.maximum)
    }
}
