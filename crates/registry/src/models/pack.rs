use super::{VersionRange, is_lower_hex, timestamp};
use crate::error::{ErrorKind, Result};
use crate::{PLACEHOLDER_MAXIMUM, PLACEHOLDER_MINIMUM, PLACEHOLDER_NAME, PLACEHOLDER_SLUG, slug};
use exn::ResultExt;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

const SHA1_HEX_LEN: usize = 40;

/// Metadata for one downloadable pack archive.
///
/// Records are snapshots: the registry hands them out behind an `Arc` and
/// never changes one in place. Every change is a new value built with one of
/// the `with_*`/`promoted`/`drafted` constructors and handed back to
/// [`Registry::upsert`](crate::Registry::upsert).
///
/// The JSON form of a pack is its sidecar file. `is_temporary` is never
/// serialized and always reads back as `false`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pack {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Primary key, and file stem of both the sidecar and the artifact.
    pub slug: String,
    #[serde(with = "timestamp")]
    pub uploaded: OffsetDateTime,
    pub minecraft: VersionRange,
    /// Lowercase hex SHA-1 of the artifact; empty while there is no artifact.
    pub sha1: String,
    /// Whether this pack is a recommended release for its version range.
    pub main: bool,
    /// Draft that only exists in memory and has no artifact.
    #[serde(skip)]
    pub is_temporary: bool,
}

impl Pack {
    /// The stand-in main pack used while the registry has no real ones.
    pub fn placeholder(now: OffsetDateTime) -> Self {
        Self {
            name: PLACEHOLDER_NAME.to_string(),
            description: None,
            slug: PLACEHOLDER_SLUG.to_string(),
            uploaded: now,
            minecraft: VersionRange::new(PLACEHOLDER_MINIMUM, PLACEHOLDER_MAXIMUM),
            sha1: String::new(),
            main: true,
            is_temporary: true,
        }
    }

    pub fn with_main(self, main: bool) -> Self {
        Self { main, ..self }
    }

    pub fn with_name(self, name: impl Into<String>) -> Self {
        Self { name: name.into(), ..self }
    }

    pub fn with_description(self, description: Option<String>) -> Self {
        Self { description, ..self }
    }

    pub fn with_minecraft(self, minecraft: VersionRange) -> Self {
        Self { minecraft, ..self }
    }

    /// Successor of this pack pointing at a freshly written artifact.
    pub fn promoted(&self, slug: String, sha1: String, uploaded: OffsetDateTime) -> Self {
        Self {
            slug,
            uploaded,
            sha1,
            main: true,
            is_temporary: false,
            ..self.clone()
        }
    }

    /// Unpersisted draft sharing this pack's metadata, waiting for an upload.
    pub fn drafted(&self, slug: String, uploaded: OffsetDateTime) -> Self {
        Self {
            slug,
            uploaded,
            sha1: String::new(),
            main: true,
            is_temporary: true,
            ..self.clone()
        }
    }

    /// Whether an artifact file is expected to exist for this pack.
    pub fn has_artifact(&self) -> bool {
        !self.is_temporary && !self.sha1.is_empty()
    }

    /// Checks every field constraint.
    ///
    /// Raises [`ErrorKind::Validation`] naming the first offending field.
    pub fn validate(&self) -> Result<()> {
        if !slug::is_valid(&self.slug) {
            exn::bail!(ErrorKind::invalid("slug", format!("expected {} lowercase hex characters, found `{}`", slug::SLUG_LEN, self.slug)));
        }
        if self.name.trim().is_empty() {
            exn::bail!(ErrorKind::invalid("name", "must not be empty"));
        }
        self.minecraft.validate()?;
        if !self.sha1.is_empty() && (self.sha1.len() != SHA1_HEX_LEN || !is_lower_hex(&self.sha1)) {
            exn::bail!(ErrorKind::invalid("sha1", format!("expected {SHA1_HEX_LEN} lowercase hex characters, found `{}`", self.sha1)));
        }
        if self.is_temporary && !self.sha1.is_empty() {
            exn::bail!(ErrorKind::invalid("sha1", "temporary packs have no artifact to hash"));
        }
        Ok(())
    }

    /// Parses a sidecar file and validates the result.
    pub fn from_sidecar(bytes: &[u8]) -> Result<Self> {
        let pack: Pack = serde_json::from_slice(bytes).or_raise(|| ErrorKind::Serialization)?;
        pack.validate()?;
        Ok(pack)
    }

    /// Pretty-printed JSON, so sidecars stay diffable.
    pub fn to_sidecar(&self) -> Result<Vec<u8>> {
        let mut bytes = serde_json::to_vec_pretty(self).or_raise(|| ErrorKind::Serialization)?;
        bytes.push(b'\n');
        Ok(bytes)
    }
}
