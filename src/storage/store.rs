//! The upload directory store.
//!
//! # Responsibilities
//! - Create or purge the upload directory at startup
//! - Add, list, read and remove individual files
//! - Purge every entry, best-effort, at shutdown
//!
//! # Concurrency
//! Per-file operations share a read gate and run concurrently; the filesystem
//! namespace orders them. `purge_all` takes the gate exclusively so no upload
//! can land in the middle of a purge. Uploads hold the gate only around file
//! creation and commit, so a stalled client never blocks a purge. Same-name
//! add/remove races are accepted (last write wins, or not-found).

use std::future::Future;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use futures_util::future::join_all;
use futures_util::{Stream, StreamExt};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio::sync::RwLock;

use crate::observability::metrics;
use crate::storage::error::{BoxError, InitError, StoreError, StoreResult};

/// One file written into the upload directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredFile {
    /// Name on disk, unique within the directory.
    pub stored_name: String,
    /// `root` joined with `stored_name`.
    pub location: PathBuf,
    /// Bytes written.
    pub size_bytes: u64,
}

/// A purge entry that could not be removed.
#[derive(Debug)]
pub struct PurgeFailure {
    pub name: String,
    pub error: std::io::Error,
}

/// Outcome of a best-effort purge.
#[derive(Debug, Default)]
pub struct PurgeReport {
    pub removed: Vec<String>,
    pub failed: Vec<PurgeFailure>,
}

impl PurgeReport {
    /// True when every entry was removed.
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Sole owner of all mutations to the upload directory.
#[derive(Debug)]
pub struct DirectoryStore {
    root: PathBuf,
    gate: RwLock<()>,
    sealed: AtomicBool,
    purges: AtomicUsize,
}

impl DirectoryStore {
    /// Create a store rooted at `root`. No I/O happens until [`initialize`](Self::initialize).
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            gate: RwLock::new(()),
            sealed: AtomicBool::new(false),
            purges: AtomicUsize::new(0),
        }
    }

    /// The upload directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Bring the directory to a known-empty state.
    ///
    /// Creates the directory if it is missing, otherwise purges whatever a
    /// previous run left behind. Individual entries that cannot be deleted are
    /// logged and skipped; anything that prevents reading the directory is fatal.
    pub async fn initialize(&self) -> Result<PurgeReport, InitError> {
        match fs::metadata(&self.root).await {
            Ok(meta) if meta.is_dir() => {
                let _guard = self.gate.write().await;
                let report = self
                    .purge_entries()
                    .await
                    .map_err(|source| InitError::Access {
                        path: self.root.clone(),
                        source,
                    })?;
                tracing::info!(
                    path = %self.root.display(),
                    removed = report.removed.len(),
                    failed = report.failed.len(),
                    "Upload directory initialized"
                );
                Ok(report)
            }
            Ok(_) => Err(InitError::NotADirectory {
                path: self.root.clone(),
            }),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                fs::create_dir_all(&self.root)
                    .await
                    .map_err(|source| InitError::Create {
                        path: self.root.clone(),
                        source,
                    })?;
                tracing::info!(path = %self.root.display(), "Upload directory created");
                Ok(PurgeReport::default())
            }
            Err(source) => Err(InitError::Access {
                path: self.root.clone(),
                source,
            }),
        }
    }

    /// Delete every entry in the directory, keeping the directory itself.
    ///
    /// Deletions run concurrently and independently. Failures are collected
    /// in the report and never abort the batch; only an unreadable directory
    /// is an error.
    pub async fn purge_all(&self) -> StoreResult<PurgeReport> {
        let _guard = self.gate.write().await;
        let report = self
            .purge_entries()
            .await
            .map_err(|source| StoreError::Listing {
                path: self.root.clone(),
                source,
            })?;
        tracing::info!(
            removed = report.removed.len(),
            failed = report.failed.len(),
            "Upload directory purged"
        );
        Ok(report)
    }

    /// Refuse all further uploads. Used once the shutdown purge begins.
    pub fn seal(&self) {
        if !self.sealed.swap(true, Ordering::SeqCst) {
            tracing::debug!(path = %self.root.display(), "Upload directory sealed");
        }
    }

    /// Whether [`seal`](Self::seal) has been called.
    pub fn is_sealed(&self) -> bool {
        self.sealed.load(Ordering::SeqCst)
    }

    /// Number of purge passes run so far, including the one at startup.
    pub fn purge_count(&self) -> usize {
        self.purges.load(Ordering::SeqCst)
    }

    /// Current file names, sorted.
    pub async fn list(&self) -> StoreResult<Vec<String>> {
        let _guard = self.gate.read().await;
        let mut names = self
            .entry_names()
            .await
            .map_err(|source| StoreError::Listing {
                path: self.root.clone(),
                source,
            })?;
        names.sort();
        Ok(names)
    }

    /// Write `bytes` to a new file named exactly `stored_name`.
    pub async fn add(&self, stored_name: &str, bytes: &[u8]) -> StoreResult<StoredFile> {
        let chunk: Result<&[u8], std::convert::Infallible> = Ok(bytes);
        self.add_stream(stored_name, futures_util::stream::iter([chunk]))
            .await
    }

    /// Stream chunks into a new file named exactly `stored_name`.
    ///
    /// The caller guarantees the name is unique enough; an existing file with
    /// the same name is overwritten. A failed write leaves no partial file.
    ///
    /// The gate is held only to create the file and to commit it, never while
    /// waiting on the stream. An upload that outlives a seal is discarded and
    /// reported as [`StoreError::Sealed`].
    pub async fn add_stream<S, B, E>(&self, stored_name: &str, stream: S) -> StoreResult<StoredFile>
    where
        S: Stream<Item = Result<B, E>>,
        B: AsRef<[u8]>,
        E: Into<BoxError>,
    {
        let location = self.resolve(stored_name)?;
        let mut file = {
            let _guard = self.gate.read().await;
            if self.is_sealed() {
                return Err(StoreError::Sealed);
            }
            fs::File::create(&location)
                .await
                .map_err(|source| StoreError::Io {
                    op: "create",
                    path: location.clone(),
                    source,
                })?
        };

        let mut stream = std::pin::pin!(stream);
        let mut size_bytes = 0u64;
        let written: StoreResult<()> = async {
            while let Some(chunk) = stream.next().await {
                let chunk = chunk.map_err(|e| StoreError::Stream {
                    name: stored_name.to_string(),
                    source: e.into(),
                })?;
                let chunk = chunk.as_ref();
                file.write_all(chunk)
                    .await
                    .map_err(|source| StoreError::Io {
                        op: "write",
                        path: location.clone(),
                        source,
                    })?;
                size_bytes += chunk.len() as u64;
            }
            file.flush().await.map_err(|source| StoreError::Io {
                op: "flush",
                path: location.clone(),
                source,
            })
        }
        .await;
        drop(file);

        let _guard = self.gate.read().await;
        let committed = match written {
            Ok(()) if self.is_sealed() => Err(StoreError::Sealed),
            other => other,
        };
        if let Err(e) = committed {
            discard_partial(&location).await;
            return Err(e);
        }

        metrics::record_upload(size_bytes);
        tracing::debug!(name = %stored_name, size_bytes, "File stored");
        Ok(StoredFile {
            stored_name: stored_name.to_string(),
            location,
            size_bytes,
        })
    }

    /// Read a stored file back in full.
    pub async fn read(&self, name: &str) -> StoreResult<Vec<u8>> {
        let path = self.resolve(name)?;
        let _guard = self.gate.read().await;
        fs::read(&path).await.map_err(|source| match source.kind() {
            ErrorKind::NotFound => StoreError::NotFound(name.to_string()),
            _ => StoreError::Io {
                op: "read",
                path: path.clone(),
                source,
            },
        })
    }

    /// Delete exactly one named file.
    pub async fn remove(&self, name: &str) -> StoreResult<()> {
        let path = self.resolve(name)?;
        let _guard = self.gate.read().await;
        match fs::remove_file(&path).await {
            Ok(()) => {
                metrics::record_deletion();
                tracing::debug!(name = %name, "File removed");
                Ok(())
            }
            Err(source) if source.kind() == ErrorKind::NotFound => {
                Err(StoreError::NotFound(name.to_string()))
            }
            Err(source) => Err(StoreError::Io {
                op: "delete",
                path,
                source,
            }),
        }
    }

    /// Map a name to its on-disk location, rejecting anything but a plain segment.
    pub fn resolve(&self, name: &str) -> StoreResult<PathBuf> {
        if is_safe_segment(name) {
            Ok(self.root.join(name))
        } else {
            Err(StoreError::InvalidName(name.to_string()))
        }
    }

    async fn entry_names(&self) -> std::io::Result<Vec<String>> {
        Ok(self.entries().await?.into_iter().map(|(name, _)| name).collect())
    }

    /// Display name and real path of every entry. Names that are not UTF-8
    /// are shown lossily; the path is the one read from the directory.
    async fn entries(&self) -> std::io::Result<Vec<(String, PathBuf)>> {
        let mut entries = fs::read_dir(&self.root).await?;
        let mut found = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let name = entry.file_name().to_string_lossy().into_owned();
            found.push((name, entry.path()));
        }
        Ok(found)
    }

    /// Fan out one delete per entry and collect the outcomes. Caller holds the gate.
    async fn purge_entries(&self) -> std::io::Result<PurgeReport> {
        self.purge_entries_with(|path| async move { remove_entry(&path).await })
            .await
    }

    async fn purge_entries_with<F, Fut>(&self, remove: F) -> std::io::Result<PurgeReport>
    where
        F: Fn(PathBuf) -> Fut,
        Fut: Future<Output = std::io::Result<()>>,
    {
        let entries = self.entries().await?;

        let outcomes = join_all(
            entries
                .into_iter()
                .map(|(name, path)| {
                    let removal = remove(path);
                    async move { (name, removal.await) }
                }),
        )
        .await;

        let mut report = PurgeReport::default();
        for (name, result) in outcomes {
            match result {
                Ok(()) => {
                    tracing::debug!(name = %name, "Deleted");
                    report.removed.push(name);
                }
                Err(error) => {
                    tracing::warn!(name = %name, error = %error, "Failed to delete during purge");
                    report.failed.push(PurgeFailure { name, error });
                }
            }
        }
        self.purges.fetch_add(1, Ordering::SeqCst);
        metrics::record_purge(report.removed.len(), report.failed.len());
        Ok(report)
    }
}

async fn discard_partial(location: &Path) {
    match fs::remove_file(location).await {
        Ok(()) => {}
        Err(e) if e.kind() == ErrorKind::NotFound => {}
        Err(e) => tracing::warn!(
            path = %location.display(),
            error = %e,
            "Failed to remove partial upload"
        ),
    }
}

async fn remove_entry(path: &Path) -> std::io::Result<()> {
    let file_type = fs::symlink_metadata(path).await?.file_type();
    if file_type.is_dir() {
        fs::remove_dir_all(path).await
    } else {
        fs::remove_file(path).await
    }
}

/// True for a non-empty name that cannot escape the directory.
pub fn is_safe_segment(name: &str) -> bool {
    !name.is_empty() && name != "." && name != ".." && !name.contains(['/', '\\', '\0'])
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    async fn ready_store() -> (tempfile::TempDir, DirectoryStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = DirectoryStore::new(dir.path().join("uploads"));
        store.initialize().await.unwrap();
        (dir, store)
    }

    #[tokio::test]
    async fn initialize_creates_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("nested").join("uploads");
        let store = DirectoryStore::new(&root);

        let report = store.initialize().await.unwrap();
        assert!(report.removed.is_empty());
        assert!(root.is_dir());
    }

    #[tokio::test]
    async fn initialize_purges_leftovers() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["one.txt", "two.png", "three"] {
            std::fs::write(dir.path().join(name), b"stale").unwrap();
        }
        let store = DirectoryStore::new(dir.path());

        let report = store.initialize().await.unwrap();
        assert_eq!(report.removed.len(), 3);
        assert!(store.list().await.unwrap().is_empty());
        assert!(dir.path().is_dir());
    }

    #[tokio::test]
    async fn initialize_rejects_a_regular_file() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let store = DirectoryStore::new(file.path());
        let err = store.initialize().await.unwrap_err();
        assert!(matches!(err, InitError::NotADirectory { .. }));
    }

    #[tokio::test]
    async fn added_file_is_listed_and_readable() {
        let (_dir, store) = ready_store().await;
        let stored = store.add("a.png", b"\x89PNG data").await.unwrap();

        assert_eq!(stored.stored_name, "a.png");
        assert_eq!(stored.size_bytes, 9);
        assert_eq!(store.list().await.unwrap(), vec!["a.png".to_string()]);
        assert_eq!(store.read("a.png").await.unwrap(), b"\x89PNG data");
    }

    #[tokio::test]
    async fn add_stream_concatenates_chunks() {
        let (_dir, store) = ready_store().await;
        let chunks: Vec<Result<Vec<u8>, std::io::Error>> =
            vec![Ok(b"hello ".to_vec()), Ok(b"world".to_vec())];

        let stored = store
            .add_stream("greeting.txt", futures_util::stream::iter(chunks))
            .await
            .unwrap();
        assert_eq!(stored.size_bytes, 11);
        assert_eq!(store.read("greeting.txt").await.unwrap(), b"hello world");
    }

    #[tokio::test]
    async fn failed_stream_leaves_no_partial_file() {
        let (_dir, store) = ready_store().await;
        let chunks: Vec<Result<Vec<u8>, String>> =
            vec![Ok(b"partial".to_vec()), Err("client went away".to_string())];

        let err = store
            .add_stream("broken.bin", futures_util::stream::iter(chunks))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Stream { .. }));
        assert!(store.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn same_name_overwrites() {
        let (_dir, store) = ready_store().await;
        store.add("dup.txt", b"first").await.unwrap();
        store.add("dup.txt", b"second").await.unwrap();
        assert_eq!(store.list().await.unwrap().len(), 1);
        assert_eq!(store.read("dup.txt").await.unwrap(), b"second");
    }

    #[tokio::test]
    async fn remove_missing_is_not_found_and_changes_nothing() {
        let (_dir, store) = ready_store().await;
        store.add("keep.txt", b"x").await.unwrap();

        let err = store.remove("ghost.txt").await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound(ref n) if n == "ghost.txt"));
        assert_eq!(store.list().await.unwrap(), vec!["keep.txt".to_string()]);
    }

    #[tokio::test]
    async fn remove_only_touches_named_file() {
        let (_dir, store) = ready_store().await;
        store.add("a.txt", b"a").await.unwrap();
        store.add("b.txt", b"b").await.unwrap();

        store.remove("a.txt").await.unwrap();
        assert_eq!(store.list().await.unwrap(), vec!["b.txt".to_string()]);
    }

    #[tokio::test]
    async fn unsafe_names_are_rejected() {
        let (dir, store) = ready_store().await;
        for name in ["", ".", "..", "../escape.txt", "a/b", "a\\b", "nul\0byte"] {
            assert!(
                matches!(store.add(name, b"x").await, Err(StoreError::InvalidName(_))),
                "accepted {name:?}"
            );
            assert!(matches!(store.remove(name).await, Err(StoreError::InvalidName(_))));
        }
        assert!(!dir.path().join("escape.txt").exists());
    }

    #[tokio::test]
    async fn purge_empties_directory_and_keeps_it() {
        let (_dir, store) = ready_store().await;
        for i in 0..10 {
            store.add(&format!("f{i}.dat"), b"payload").await.unwrap();
        }
        std::fs::create_dir(store.root().join("subdir")).unwrap();

        let report = store.purge_all().await.unwrap();
        assert!(report.is_clean());
        assert_eq!(report.removed.len(), 11);
        assert!(store.list().await.unwrap().is_empty());
        assert!(store.root().is_dir());
    }

    #[tokio::test]
    async fn purge_of_empty_directory_succeeds() {
        let (_dir, store) = ready_store().await;
        let report = store.purge_all().await.unwrap();
        assert!(report.removed.is_empty() && report.failed.is_empty());
    }

    #[tokio::test]
    async fn purge_of_missing_directory_is_listing_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = DirectoryStore::new(dir.path().join("never-created"));
        let err = store.purge_all().await.unwrap_err();
        assert!(matches!(err, StoreError::Listing { .. }));
    }

    #[cfg(target_os = "linux")]
    #[tokio::test]
    async fn non_utf8_leftovers_are_purged() {
        use std::os::unix::ffi::OsStrExt;

        let dir = tempfile::tempdir().unwrap();
        let stale = dir.path().join(std::ffi::OsStr::from_bytes(b"stale\xff.bin"));
        std::fs::write(&stale, b"old").unwrap();
        let store = DirectoryStore::new(dir.path());

        let report = store.initialize().await.unwrap();
        assert!(report.is_clean());
        assert_eq!(report.removed, vec!["stale\u{FFFD}.bin".to_string()]);
        assert!(!stale.exists());
        assert!(store.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn purge_continues_past_failed_entries() {
        let (_dir, store) = ready_store().await;
        for name in ["a.txt", "locked.bin", "b.txt"] {
            store.add(name, b"x").await.unwrap();
        }

        let report = store
            .purge_entries_with(|path| async move {
                if path.ends_with("locked.bin") {
                    Err(std::io::Error::new(ErrorKind::PermissionDenied, "locked"))
                } else {
                    remove_entry(&path).await
                }
            })
            .await
            .unwrap();

        assert!(!report.is_clean());
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].name, "locked.bin");
        assert_eq!(report.failed[0].error.kind(), ErrorKind::PermissionDenied);
        let mut removed = report.removed.clone();
        removed.sort();
        assert_eq!(removed, vec!["a.txt".to_string(), "b.txt".to_string()]);
        assert_eq!(store.list().await.unwrap(), vec!["locked.bin".to_string()]);
    }

    #[tokio::test]
    async fn purge_count_tracks_passes() {
        let (_dir, store) = ready_store().await;
        assert_eq!(store.purge_count(), 0);
        store.purge_all().await.unwrap();
        store.purge_all().await.unwrap();
        assert_eq!(store.purge_count(), 2);
    }

    async fn wait_until_exists(path: &Path) {
        for _ in 0..200 {
            if path.exists() {
                return;
            }
            tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        }
        panic!("{} never appeared", path.display());
    }

    #[tokio::test]
    async fn stalled_upload_does_not_block_other_operations() {
        let (_dir, store) = ready_store().await;
        let store = Arc::new(store);
        store.add("other.txt", b"x").await.unwrap();

        let body = futures_util::stream::iter([Ok::<_, String>(b"part".to_vec())])
            .chain(futures_util::stream::pending());
        let uploader = Arc::clone(&store);
        let upload = tokio::spawn(async move { uploader.add_stream("slow.bin", body).await });
        wait_until_exists(&store.root().join("slow.bin")).await;

        let within = std::time::Duration::from_secs(1);
        tokio::time::timeout(within, store.list())
            .await
            .expect("list blocked by a stalled upload")
            .unwrap();
        tokio::time::timeout(within, store.remove("other.txt"))
            .await
            .expect("remove blocked by a stalled upload")
            .unwrap();
        tokio::time::timeout(within, store.purge_all())
            .await
            .expect("purge blocked by a stalled upload")
            .unwrap();

        assert!(store.list().await.unwrap().is_empty());
        upload.abort();
    }

    #[tokio::test]
    async fn upload_finishing_after_seal_is_discarded() {
        let (_dir, store) = ready_store().await;
        let store = Arc::new(store);

        let (release, held) = tokio::sync::oneshot::channel::<()>();
        let body = futures_util::stream::iter([Ok::<_, String>(b"head".to_vec())]).chain(
            futures_util::stream::once(async move {
                let _ = held.await;
                Ok(b"tail".to_vec())
            }),
        );
        let uploader = Arc::clone(&store);
        let upload = tokio::spawn(async move { uploader.add_stream("late.bin", body).await });
        wait_until_exists(&store.root().join("late.bin")).await;

        store.seal();
        store.purge_all().await.unwrap();
        release.send(()).unwrap();

        let outcome = upload.await.unwrap();
        assert!(matches!(outcome, Err(StoreError::Sealed)));
        assert!(store.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn sealed_store_refuses_uploads_but_allows_removal() {
        let (_dir, store) = ready_store().await;
        store.add("last.txt", b"x").await.unwrap();
        store.seal();

        assert!(matches!(store.add("late.txt", b"y").await, Err(StoreError::Sealed)));
        store.remove("last.txt").await.unwrap();
    }

    #[tokio::test]
    async fn concurrent_adds_of_distinct_names_all_land() {
        let (_dir, store) = ready_store().await;
        let store = Arc::new(store);

        let tasks: Vec<_> = (0..32)
            .map(|i| {
                let store = Arc::clone(&store);
                tokio::spawn(async move { store.add(&format!("n{i}.bin"), &[i as u8; 64]).await })
            })
            .collect();
        for task in tasks {
            task.await.unwrap().unwrap();
        }
        assert_eq!(store.list().await.unwrap().len(), 32);
    }
}
