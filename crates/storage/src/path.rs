//! Path validation.
//!
//! Slugs end up in file names, so every path handed to a backend is checked
//! here before it gets anywhere near the filesystem.

use std::path::{Component, Path, PathBuf};

use crate::error::{ErrorKind, Result};

/// Validates a storage path and returns it normalised.
///
/// Paths must stay inside the storage root: `..` may not climb above it, null
/// bytes and platform prefixes are rejected, and a path that normalises to
/// nothing is invalid. `.` components, repeated and trailing separators are
/// dropped.
///
/// # Examples
///
/// ```
/// use std::path::Path;
/// use packdrop_storage::validate_path;
/// assert!(validate_path("0a1b2c3d.zip").is_ok());
/// assert!(validate_path("archive/0a1b2c3d.json").is_ok());
/// assert!(validate_path("../0a1b2c3d.zip").is_err());
/// assert!(validate_path("a\0b").is_err());
/// assert_eq!(
///     validate_path("./archive/../0a1b2c3d.json").unwrap(),
///     Path::new("0a1b2c3d.json")
/// );
/// ```
pub fn validate(path: impl AsRef<Path>) -> Result<PathBuf> {
    let original = path.as_ref();
    let invalid = || ErrorKind::InvalidPath(original.to_path_buf());
    let mut components = Vec::new();
    for component in original.components() {
        match component {
            Component::Normal(segment) => {
                // Null bytes survive Path::components() on Unix but truncate in syscalls.
                if segment.as_encoded_bytes().contains(&0) {
                    exn::bail!(invalid());
                }
                components.push(segment);
            },
            Component::CurDir | Component::RootDir => {},
            Component::Prefix(_) => exn::bail!(invalid()),
            Component::ParentDir => {
                if components.pop().is_none() {
                    exn::bail!(invalid());
                }
            },
        }
    }
    if components.is_empty() {
        exn::bail!(invalid());
    }
    Ok(components.into_iter().collect())
}
