use crate::error::{ErrorKind, Result};
use crate::index::Index;
use crate::{Pack, PackChanges, sha1_hex};
use exn::{OptionExt, ResultExt};
use futures::StreamExt;
use packdrop_storage::BackendHandle;
use std::path::PathBuf;
use std::sync::Arc;
use time::OffsetDateTime;
use tokio::sync::RwLock;
use tracing::instrument;

const SIDECAR_EXTENSION: &str = "json";
const ARTIFACT_EXTENSION: &str = "zip";

/// What [`Registry::upload`] ended up doing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadOutcome {
    /// The pack already serves byte-identical content; nothing was written.
    AlreadyConfigured(Arc<Pack>),
    /// The upload was promoted to this new pack.
    Promoted(Arc<Pack>),
}

/// The pack registry.
///
/// Keeps an index of every pack by slug plus the derived list of main packs,
/// backed by a flat directory of `<slug>.json` sidecars and `<slug>.zip`
/// artifacts. One lock guards both views: readers never observe the main
/// list halfway through a change, and mutations are serialized.
///
/// Construct one with [`Registry::load`] and share it (e.g. in an `Arc`)
/// with whatever serves requests.
pub struct Registry {
    backend: BackendHandle,
    index: RwLock<Index>,
}

impl Registry {
    /// Builds a registry from the sidecars found in `backend`.
    ///
    /// Sidecars that can't be read or don't validate are logged and skipped,
    /// but a directory that can't be listed fails the load with
    /// [`ErrorKind::Storage`].
    /// If no main pack turns up, a temporary placeholder is injected so that
    /// [`current_main()`](Self::current_main) always has an answer.
    pub async fn load(backend: BackendHandle) -> Result<Self> {
        let index = scan(&backend).await?;
        Ok(Self {
            backend,
            index: RwLock::new(index),
        })
    }

    /// Discards the in-memory state and rebuilds it from storage. Temporary
    /// drafts are lost.
    pub async fn reload(&self) -> Result<()> {
        let fresh = scan(&self.backend).await?;
        *self.index.write().await = fresh;
        Ok(())
    }

    /// Storage path of the sidecar for `slug`.
    pub fn sidecar_path(slug: &str) -> PathBuf {
        PathBuf::from(format!("{slug}.{SIDECAR_EXTENSION}"))
    }

    /// Storage path of the artifact for `slug`.
    pub fn artifact_path(slug: &str) -> PathBuf {
        PathBuf::from(format!("{slug}.{ARTIFACT_EXTENSION}"))
    }

    pub async fn lookup(&self, slug: &str) -> Option<Arc<Pack>> {
        self.index.read().await.get(slug)
    }

    /// The main pack with the highest minimum version.
    ///
    /// Only `None` if the main list is empty, which a loaded registry never is
    /// unless every main pack was explicitly demoted through [`update`](Self::update).
    pub async fn current_main(&self) -> Option<Arc<Pack>> {
        self.index.read().await.current_main()
    }

    /// Every main pack, ascending by minimum version.
    pub async fn main_list(&self) -> Vec<Arc<Pack>> {
        self.index.read().await.main().to_vec()
    }

    /// Every pack, main or not, ordered by slug.
    pub async fn all(&self) -> Vec<Arc<Pack>> {
        self.index.read().await.all()
    }

    /// A slug not currently in use. Not reserved: two calls may return the
    /// same value if nothing is inserted in between.
    pub async fn allocate_slug(&self) -> String {
        self.index.read().await.allocate_slug()
    }

    /// Inserts or replaces `pack`, re-deriving the main list, and writes its
    /// sidecar if `persist` is set.
    ///
    /// Temporary packs are never written, whatever `persist` says. The pack
    /// is validated first; on a validation or storage error the index is left
    /// untouched.
    pub async fn upsert(&self, pack: Pack, persist: bool) -> Result<Arc<Pack>> {
        let mut index = self.index.write().await;
        self.upsert_locked(&mut index, pack, persist).await
    }

    async fn upsert_locked(&self, index: &mut Index, pack: Pack, persist: bool) -> Result<Arc<Pack>> {
        pack.validate()?;
        if persist && !pack.is_temporary {
            let sidecar = pack.to_sidecar()?;
            self.backend
                .write(&Self::sidecar_path(&pack.slug), &sidecar)
                .await
                .or_raise(|| ErrorKind::Storage)?;
        }
        let pack = Arc::new(pack);
        index.insert(Arc::clone(&pack));
        Ok(pack)
    }

    /// Replaces `old` with a new pack serving `data`.
    ///
    /// The new pack gets a fresh slug, the current time, `sha1` and the main
    /// flag. Its artifact is written (without holding the lock) before any
    /// metadata changes; if that fails nothing else happens. Then the pack at
    /// `old.slug` is either dropped (temporary drafts) or demoted to non-main
    /// and persisted, and the new pack is persisted. Old artifacts are kept.
    ///
    /// `old` only names the pack to replace. Metadata is taken from whatever
    /// is indexed under that slug once the artifact is written, so edits made
    /// in the meantime carry over. Raises [`ErrorKind::NotFound`] if that pack
    /// is gone by then, e.g. a draft some other upload already promoted.
    #[instrument(skip(self, old, data, sha1), fields(old = %old.slug, bytes = data.len()))]
    pub async fn promote(&self, old: &Pack, data: &[u8], sha1: impl Into<String>) -> Result<Arc<Pack>> {
        let sha1 = sha1.into();
        let (slug, uploaded) = {
            let mut index = self.index.write().await;
            let current = index.get(&old.slug).ok_or_raise(|| ErrorKind::NotFound(old.slug.clone()))?;
            let slug = index.allocate_slug();
            let uploaded = OffsetDateTime::now_utc();
            current.promoted(slug.clone(), sha1.clone(), uploaded).validate()?;
            index.reserve(slug.clone());
            (slug, uploaded)
        };

        let written = self
            .backend
            .write(&Self::artifact_path(&slug), data)
            .await
            .or_raise(|| ErrorKind::Storage);

        let mut index = self.index.write().await;
        index.release(&slug);
        if let Err(err) = written {
            tracing::warn!(%slug, "Artifact write failed; promotion abandoned");
            return Err(err);
        }
        let Some(current) = index.get(&old.slug) else {
            tracing::warn!(%slug, "Pack disappeared while its artifact was written; leaving artifact orphaned");
            exn::bail!(ErrorKind::NotFound(old.slug.clone()));
        };
        let promoted = current.promoted(slug, sha1, uploaded);

        let promoted = if current.is_temporary {
            // Drop the draft only once its successor is safely persisted.
            let promoted = self.upsert_locked(&mut index, promoted, true).await?;
            index.remove(&current.slug);
            promoted
        } else {
            self.upsert_locked(&mut index, (*current).clone().with_main(false), true).await?;
            self.upsert_locked(&mut index, promoted, true).await?
        };
        tracing::info!(old = %current.slug, new = %promoted.slug, sha1 = %promoted.sha1, "Promoted pack");
        Ok(promoted)
    }

    /// Stages an unpersisted draft sharing `source`'s metadata, to be
    /// replaced by a later upload.
    pub async fn duplicate(&self, source: &Pack) -> Result<Arc<Pack>> {
        let mut index = self.index.write().await;
        let draft = source.drafted(index.allocate_slug(), OffsetDateTime::now_utc());
        let draft = self.upsert_locked(&mut index, draft, false).await?;
        tracing::info!(source = %source.slug, draft = %draft.slug, "Duplicated pack");
        Ok(draft)
    }

    /// Edits a pack's display metadata and persists the result.
    ///
    /// Raises [`ErrorKind::NotFound`] for an unknown slug and
    /// [`ErrorKind::Validation`] if the edited pack is invalid.
    pub async fn update(&self, slug: &str, changes: PackChanges) -> Result<Arc<Pack>> {
        let mut index = self.index.write().await;
        let current = index.get(slug).ok_or_raise(|| ErrorKind::NotFound(slug.to_string()))?;
        let updated = self.upsert_locked(&mut index, changes.apply(&current), true).await?;
        tracing::info!(slug, main = updated.main, "Updated pack");
        Ok(updated)
    }

    /// Handles a new archive for the pack at `slug`.
    ///
    /// If the pack already has an artifact with the same hash and identical
    /// bytes, nothing changes. Otherwise the archive is
    /// [promoted](Self::promote).
    pub async fn upload(&self, slug: &str, data: &[u8]) -> Result<UploadOutcome> {
        let pack = self.lookup(slug).await.ok_or_raise(|| ErrorKind::NotFound(slug.to_string()))?;
        let sha1 = sha1_hex(data);
        if pack.has_artifact() && pack.sha1 == sha1 && self.content_matches(slug, data).await {
            tracing::info!(slug, "Upload identical to current artifact; skipping");
            return Ok(UploadOutcome::AlreadyConfigured(pack));
        }
        let promoted = self.promote(&pack, data, sha1).await?;
        Ok(UploadOutcome::Promoted(promoted))
    }

    /// Whether the artifact stored for `slug` is byte-identical to `candidate`.
    ///
    /// Best effort: temporary packs never match, and any read failure is
    /// logged and reported as a mismatch.
    pub async fn content_matches(&self, slug: &str, candidate: &[u8]) -> bool {
        if self.lookup(slug).await.is_some_and(|pack| pack.is_temporary) {
            return false;
        }
        let path = Self::artifact_path(slug);
        match self.backend.read(&path).await {
            Ok(existing) => existing == candidate,
            Err(err) => {
                tracing::warn!(slug, path = %path.display(), error = ?err, "Could not read artifact for comparison");
                false
            },
        }
    }

    /// The artifact bytes for `slug`, for download.
    pub async fn artifact(&self, slug: &str) -> Result<Vec<u8>> {
        let pack = self.lookup(slug).await.ok_or_raise(|| ErrorKind::NotFound(slug.to_string()))?;
        if pack.is_temporary {
            exn::bail!(ErrorKind::NotFound(slug.to_string()));
        }
        self.backend.read(&Self::artifact_path(slug)).await.or_raise(|| ErrorKind::Storage)
    }
}

/// Reads every top-level sidecar in `backend` into a fresh index.
#[instrument(skip(backend), fields(backend = backend.name()))]
async fn scan(backend: &BackendHandle) -> Result<Index> {
    let mut index = Index::default();
    let mut skipped = 0usize;
    let mut files = backend.list_stream();
    while let Some(file) = files.next().await {
        // A partial listing would hide persisted packs behind the placeholder.
        let file = file.or_raise(|| ErrorKind::Storage)?;
        if !file.is_top_level() || !file.has_extension(SIDECAR_EXTENSION) {
            continue;
        }
        match read_sidecar(backend, &file.path).await {
            Ok(pack) if file.stem() == Some(pack.slug.as_str()) => index.insert(Arc::new(pack)),
            Ok(pack) => {
                tracing::warn!(path = %file.path.display(), slug = %pack.slug, "Sidecar name does not match its slug; skipping");
                skipped += 1;
            },
            Err(err) => {
                tracing::warn!(path = %file.path.display(), error = ?err, "Could not load sidecar; skipping");
                skipped += 1;
            },
        }
    }

    if index.main().is_empty() {
        tracing::info!("No main packs found; using placeholder");
        index.insert(Arc::new(Pack::placeholder(OffsetDateTime::now_utc())));
    }
    tracing::info!(packs = index.len(), main = index.main().len(), skipped, "Loaded pack registry");
    Ok(index)
}

async fn read_sidecar(backend: &BackendHandle, path: &std::path::Path) -> Result<Pack> {
    let bytes = backend.read(path).await.or_raise(|| ErrorKind::Storage)?;
    Pack::from_sidecar(&bytes)
}
