//! Local filesystem storage backend.
//!
//! Files are stored in a configured directory and accessed through
//! `tokio::fs` for async I/O.

use crate::backend::FileInfoStream;
use crate::error::ErrorKind;
use crate::{FileInfo, StorageBackend, error::Result, path::validate as validate_path};
use async_stream::stream;
use async_trait::async_trait;
use exn::ResultExt;
use std::fs::create_dir_all as sync_create_dir;
use std::path::{Path, PathBuf};
use tokio::fs::{self, DirEntry};
use tokio::io::AsyncWriteExt;

enum WalkEntry {
    File(FileInfo),
    Directory(PathBuf),
    Other,
}

/// Local filesystem storage backend.
///
/// Sidecars and artifacts live as plain files under one root directory; every
/// storage path is resolved against it.
///
/// ```no_run
/// use packdrop_storage::backend::LocalBackend;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let backend = LocalBackend::new("packs", "/var/lib/packdrop/packs")?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct LocalBackend {
    name: String,
    root: PathBuf,
}
impl LocalBackend {
    /// Opens the backend, creating `root` if it doesn't exist yet.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidPath`](ErrorKind::InvalidPath) if `root` is relative
    /// or exists as something other than a directory.
    pub fn new(name: impl Into<String>, root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        if !root.is_absolute() || (root.exists() && !root.is_dir()) {
            exn::bail!(ErrorKind::InvalidPath(root));
        }
        if !root.exists() {
            // Once per process; not worth an async constructor.
            sync_create_dir(&root).map_err(|e| ErrorKind::from_io(e, &root))?;
        }
        Ok(Self { name: name.into(), root })
    }

    fn absolute_path(&self, path: impl AsRef<Path>) -> Result<PathBuf> {
        let validated = validate_path(path.as_ref())?;
        Ok(self.root.join(validated))
    }

    fn relative_path(&self, absolute: impl AsRef<Path>) -> Result<PathBuf> {
        let absolute = absolute.as_ref();
        let relative = absolute.strip_prefix(&self.root).or_raise(|| {
            ErrorKind::BackendError(format!("`{}` is outside `{}`", absolute.display(), self.root.display()))
        })?;
        validate_path(relative)
    }

    /// Classifies one directory entry. Lives outside the stream so it can use `?`.
    async fn classify(&self, entry: DirEntry) -> Result<WalkEntry> {
        let path = entry.path();
        let metadata = entry.metadata().await.map_err(|e| ErrorKind::from_io(e, &path))?;
        if metadata.is_dir() {
            return Ok(WalkEntry::Directory(path));
        }
        if !metadata.is_file() {
            // Broken symlinks, sockets and the like.
            return Ok(WalkEntry::Other);
        }
        let modified = metadata.modified().map_err(|e| ErrorKind::from_io(e, &path))?;
        Ok(WalkEntry::File(FileInfo::new(self.relative_path(&path)?, metadata.len(), modified)))
    }
}

#[async_trait]
impl StorageBackend for LocalBackend {
    fn name(&self) -> &str {
        &self.name
    }

    fn list_stream(&self) -> FileInfoStream<'_> {
        let mut pending = vec![self.root.clone()];

        Box::pin(stream! {
            while let Some(dir) = pending.pop() {
                let mut entries = match fs::read_dir(&dir).await {
                    Ok(entries) => entries,
                    // A subdirectory removed mid-walk has nothing left to list.
                    Err(err) if err.kind() == std::io::ErrorKind::NotFound && dir != self.root => continue,
                    Err(err) => {
                        yield Err(exn::Exn::from(ErrorKind::from_io(err, &dir)));
                        continue;
                    }
                };
                loop {
                    let entry = match entries.next_entry().await {
                        Ok(Some(entry)) => entry,
                        Ok(None) => break,
                        Err(err) => {
                            yield Err(exn::Exn::from(ErrorKind::from_io(err, &dir)));
                            break;
                        }
                    };
                    match self.classify(entry).await {
                        Ok(WalkEntry::File(info)) => yield Ok(info),
                        Ok(WalkEntry::Directory(sub)) => pending.push(sub),
                        Ok(WalkEntry::Other) => {},
                        Err(err) => yield Err(err),
                    }
                }
            }
        })
    }

    async fn read(&self, path: &Path) -> Result<Vec<u8>> {
        let abs_path = self.absolute_path(path)?;
        Ok(fs::read(&abs_path).await.map_err(|e| ErrorKind::from_io(e, path))?)
    }

    async fn write(&self, path: &Path, data: &[u8]) -> Result<()> {
        let abs_path = self.absolute_path(path)?;
        if let Some(parent) = abs_path.parent() {
            fs::create_dir_all(parent).await.map_err(|e| ErrorKind::from_io(e, path))?;
        }
        let mut file = fs::File::create(&abs_path).await.map_err(|e| ErrorKind::from_io(e, path))?;
        file.write_all(data).await.map_err(|e| ErrorKind::from_io(e, path))?;
        // Artifacts must be on disk before any sidecar may reference them.
        file.sync_all().await.map_err(|e| ErrorKind::from_io(e, path))?;
        tracing::debug!(backend = %self.name, path = %path.display(), bytes = data.len(), "Wrote file");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::TryStreamExt;

    fn backend() -> (tempfile::TempDir, LocalBackend) {
        let temp_dir = tempfile::tempdir().unwrap();
        let backend = LocalBackend::new("test", temp_dir.path()).unwrap();
        (temp_dir, backend)
    }

    async fn listed(backend: &LocalBackend) -> Vec<PathBuf> {
        let files: Vec<FileInfo> = backend.list_stream().try_collect().await.unwrap();
        let mut paths: Vec<_> = files.into_iter().map(|f| f.path).collect();
        paths.sort();
        paths
    }

    #[test]
    fn test_new_requires_absolute_path() {
        assert!(LocalBackend::new("test", "relative/packs").is_err());
        assert!(LocalBackend::new("test", "./packs").is_err());
    }

    #[test]
    fn test_new_creates_missing_root() {
        let temp_dir = tempfile::tempdir().unwrap();
        let root = temp_dir.path().join("nested/packs");
        LocalBackend::new("test", &root).unwrap();
        assert!(root.is_dir());
    }

    #[test]
    fn test_new_rejects_file_root() {
        let temp_dir = tempfile::tempdir().unwrap();
        let file = temp_dir.path().join("not-a-dir");
        std::fs::write(&file, b"x").unwrap();
        let err = LocalBackend::new("test", &file).err().unwrap();
        assert!(matches!(&*err, ErrorKind::InvalidPath(_)));
    }

    #[test]
    fn test_absolute_and_relative_paths() {
        let (temp_dir, backend) = backend();
        let expected = temp_dir.path().join("0a1b2c3d.zip");
        assert_eq!(backend.absolute_path("0a1b2c3d.zip").unwrap(), expected);
        assert!(backend.absolute_path("../0a1b2c3d.zip").is_err());
        assert_eq!(backend.relative_path(&expected).unwrap(), Path::new("0a1b2c3d.zip"));
        assert!(backend.relative_path("/elsewhere/0a1b2c3d.zip").is_err());
    }

    #[tokio::test]
    async fn test_write_overwrites() {
        let (temp_dir, backend) = backend();
        backend.write(Path::new("0a1b2c3d.json"), b"a much longer first version").await.unwrap();
        backend.write(Path::new("0a1b2c3d.json"), b"short").await.unwrap();
        assert_eq!(backend.read(Path::new("0a1b2c3d.json")).await.unwrap(), b"short");
        assert_eq!(std::fs::read(temp_dir.path().join("0a1b2c3d.json")).unwrap(), b"short");
    }

    #[tokio::test]
    async fn test_write_creates_directories() {
        let (temp_dir, backend) = backend();
        backend.write(Path::new("a/b/c/file.zip"), b"data").await.unwrap();
        assert!(temp_dir.path().join("a/b/c/file.zip").is_file());
    }

    #[tokio::test]
    async fn test_read_not_found() {
        let (_temp_dir, backend) = backend();
        let err = backend.read(Path::new("missing.zip")).await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::NotFound(p) if p == Path::new("missing.zip")));
    }

    #[tokio::test]
    async fn test_list_walks_subdirectories() {
        let (_temp_dir, backend) = backend();
        assert!(listed(&backend).await.is_empty());
        backend.write(Path::new("0a1b2c3d.json"), b"{}").await.unwrap();
        backend.write(Path::new("0a1b2c3d.zip"), b"zip").await.unwrap();
        backend.write(Path::new("archive/old.zip"), b"zip").await.unwrap();
        assert_eq!(
            listed(&backend).await,
            vec![PathBuf::from("0a1b2c3d.json"), PathBuf::from("0a1b2c3d.zip"), PathBuf::from("archive/old.zip")]
        );
        let files: Vec<FileInfo> = backend.list_stream().try_collect().await.unwrap();
        let zip = files.iter().find(|f| f.path == Path::new("0a1b2c3d.zip")).unwrap();
        assert_eq!(zip.size, 3);
    }

    #[tokio::test]
    async fn test_list_missing_root_is_an_error() {
        let (temp_dir, backend) = backend();
        std::fs::remove_dir(temp_dir.path()).unwrap();
        let listed: Result<Vec<FileInfo>> = backend.list_stream().try_collect().await;
        assert!(matches!(&*listed.unwrap_err(), ErrorKind::NotFound(_)));
    }

    #[tokio::test]
    async fn test_path_security() {
        let (_temp_dir, backend) = backend();
        assert!(backend.read(Path::new("../etc/passwd")).await.is_err());
        assert!(backend.write(Path::new("../escape.zip"), b"data").await.is_err());
        assert!(backend.read(Path::new("a/../../b")).await.is_err());
    }
}
