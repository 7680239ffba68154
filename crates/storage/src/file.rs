use std::path::{Path, PathBuf};
use time::OffsetDateTime;

/// File metadata returned by storage backends.
///
/// Listing the registry directory yields one of these per sidecar and per
/// artifact; the registry only ever looks at `path` and `size`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileInfo {
    /// Relative path from storage root
    pub path: PathBuf,
    /// File size in bytes
    pub size: u64,
    /// Last modified timestamp
    pub modified: OffsetDateTime,
}
impl FileInfo {
    pub fn new(path: impl Into<PathBuf>, size: u64, modified: impl Into<OffsetDateTime>) -> Self {
        Self {
            path: path.into(),
            size,
            modified: modified.into(),
        }
    }

    /// Whether the file sits directly in the storage root (not in a subdirectory).
    pub fn is_top_level(&self) -> bool {
        self.path.parent().is_none_or(|parent| parent == Path::new(""))
    }

    /// Whether the file name ends with the given extension (without the dot).
    pub fn has_extension(&self, extension: &str) -> bool {
        self.path.extension().is_some_and(|ext| ext == extension)
    }

    /// File name without its extension, if it is valid UTF-8.
    pub fn stem(&self) -> Option<&str> {
        self.path.file_stem().and_then(|stem| stem.to_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("0a1b2c3d.json", true)]
    #[case("nested/0a1b2c3d.json", false)]
    #[case("a/b/c.zip", false)]
    fn test_is_top_level(#[case] path: &str, #[case] expected: bool) {
        let info = FileInfo::new(path, 0, OffsetDateTime::UNIX_EPOCH);
        assert_eq!(info.is_top_level(), expected);
    }

    #[test]
    fn test_extension_and_stem() {
        let info = FileInfo::new("0a1b2c3d.json", 12, OffsetDateTime::UNIX_EPOCH);
        assert!(info.has_extension("json"));
        assert!(!info.has_extension("zip"));
        assert_eq!(info.stem(), Some("0a1b2c3d"));
        let bare = FileInfo::new("README", 1, OffsetDateTime::UNIX_EPOCH);
        assert!(!bare.has_extension("json"));
    }
}
