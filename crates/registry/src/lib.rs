//! The pack registry.
//!
//! Packs are downloadable archives, each identified by a random eight
//! character slug and described by a JSON sidecar stored next to its zip
//! artifact. The registry keeps every pack in memory, tracks which ones are
//! "main" (recommended for their version range) and implements the upload
//! protocol that swaps in a new archive under a new slug.
//!
//! # Architecture
//! - **Index**: slug -> [`Pack`], plus the main packs ordered by
//!   [`VersionRange::minimum`]. The ordered list is re-derived on every
//!   change, never edited independently.
//! - **Storage**: any [`StorageBackend`](packdrop_storage::StorageBackend);
//!   `<slug>.json` sidecars are rewritten whole, `<slug>.zip` artifacts are
//!   written once and never deleted.
//! - **Temporary packs**: drafts created by [`Registry::duplicate`] (and the
//!   placeholder shown while no packs exist) live only in memory until an
//!   upload promotes them.

pub mod error;
mod hash;
mod index;
mod models;
mod registry;
pub mod slug;

pub use crate::hash::sha1_hex;
pub use crate::models::{Pack, PackChanges, VersionRange};
pub use crate::registry::{Registry, UploadOutcome};

/// Display name of the placeholder pack.
pub const PLACEHOLDER_NAME: &str = "No Packs Set";
/// Reserved slug of the placeholder pack.
pub const PLACEHOLDER_SLUG: &str = "00000000";
/// Oldest game version the placeholder pack claims to support.
pub const PLACEHOLDER_MINIMUM: &str = "1.8";
/// Newest game version the placeholder pack claims to support.
pub const PLACEHOLDER_MAXIMUM: &str = "1.21.10";
