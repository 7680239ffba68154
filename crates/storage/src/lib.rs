//! Flat-file storage for the pack registry.
//!
//! Everything the registry persists (JSON sidecars and zip artifacts) goes
//! through a [`StorageBackend`], addressed by a path relative to the backend
//! root. The local filesystem is the only production backend; an in-memory
//! one is available behind the `mock` feature for tests.

pub mod backend;
pub mod error;
mod file;
mod path;

pub use crate::backend::StorageBackend;
pub use crate::file::FileInfo;
pub use crate::path::validate as validate_path;
use std::sync::Arc;

pub type BackendHandle = Arc<dyn StorageBackend + Send + Sync>;
