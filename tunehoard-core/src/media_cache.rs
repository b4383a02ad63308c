//! Size-bounded cache for transiently streamed content.
//!
//! Files live in a single directory owned by the cache. A [`CacheIndex`]
//! maps content ids to file names; the file system's access/modification
//! times are the LRU signal, so eviction order survives restarts without
//! extra bookkeeping.

use crate::cache_index::CacheIndex;
use crate::config::StreamCacheConfig;
use crate::engine::{AcquisitionEngine, Quality};
use crate::error::{CoreError, Result};
use crate::time::system_time_millis;
use std::collections::HashMap;
use std::ffi::OsStr;
use std::fs::{self, FileTimes};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex as StdMutex, PoisonError};
use std::time::SystemTime;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// Files deleted by an eviction sweep
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EvictionReport {
    pub removed: Vec<String>,
    pub bytes_freed: u64,
    pub remaining_bytes: u64,
}

/// What a [`BoundedMediaCache::clear`] freed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheClearReport {
    pub files_removed: usize,
    pub bytes_freed: u64,
    pub index_entries_removed: usize,
}

/// LRU-evicting, size-capped stream cache in front of the acquisition engine.
pub struct BoundedMediaCache {
    cache_dir: PathBuf,
    max_size_bytes: u64,
    quality: Quality,
    index: CacheIndex,
    engine: Arc<dyn AcquisitionEngine>,
    inflight: Arc<StdMutex<InflightMap>>,
}

type InflightMap = HashMap<String, Arc<Mutex<()>>>;

impl BoundedMediaCache {
    /// Create a cache from configuration, opening the on-disk index
    ///
    /// # Errors
    ///
    /// Returns an error if the cache directory or the index cannot be created.
    pub async fn open(
        config: &StreamCacheConfig,
        engine: Arc<dyn AcquisitionEngine>,
    ) -> Result<Self> {
        let index = CacheIndex::open(&config.index_path).await?;
        Self::with_index(
            config.cache_dir.clone(),
            config.max_size_bytes,
            config.quality,
            index,
            engine,
        )
    }

    /// Create a cache over an already opened index
    ///
    /// # Errors
    ///
    /// Returns an error if the cache directory cannot be created.
    pub fn with_index(
        cache_dir: PathBuf,
        max_size_bytes: u64,
        quality: Quality,
        index: CacheIndex,
        engine: Arc<dyn AcquisitionEngine>,
    ) -> Result<Self> {
        fs::create_dir_all(&cache_dir)?;
        info!(
            "Stream cache at {:?} (ceiling: {} bytes, quality: {})",
            cache_dir, max_size_bytes, quality
        );

        Ok(Self {
            cache_dir,
            max_size_bytes,
            quality,
            index,
            engine,
            inflight: Arc::default(),
        })
    }

    #[must_use]
    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    #[must_use]
    pub const fn max_size_bytes(&self) -> u64 {
        self.max_size_bytes
    }

    /// Get a local path for `content_id`, fetching it through the engine on a miss.
    ///
    /// Concurrent calls for the same id share one fill: later callers wait
    /// and then observe the hit.
    ///
    /// # Errors
    ///
    /// Propagates engine failures (nothing is recorded in that case) and
    /// index or file system errors.
    pub async fn resolve(&self, content_id: &str) -> Result<PathBuf> {
        let slot = InflightSlot::claim(&self.inflight, content_id);
        let _fill_guard = slot.lock().await;

        match self.cached_path(content_id).await? {
            Some(path) => Ok(path),
            None => self.fill(content_id).await,
        }
    }

    /// Hit half of [`resolve`](Self::resolve): return the cached path if
    /// its file still exists, refreshing its access time.
    ///
    /// An entry whose file vanished is removed and reported as a miss.
    ///
    /// # Errors
    ///
    /// Returns an error if the index cannot be queried or updated.
    pub async fn cached_path(&self, content_id: &str) -> Result<Option<PathBuf>> {
        let Some(entry) = self.index.get(content_id).await? else {
            return Ok(None);
        };

        let path = self.cache_dir.join(&entry.file_name);
        if !path.is_file() {
            warn!(
                "Cached file {:?} for {} is gone, dropping stale index entry",
                path, content_id
            );
            self.index.remove(content_id).await?;
            return Ok(None);
        }

        if let Err(e) = touch_file(&path, SystemTime::now()) {
            warn!("Failed to refresh access time of {:?}: {}", path, e);
        }
        self.index.touch(content_id).await?;

        debug!("Stream cache hit for {}: {:?}", content_id, path);
        Ok(Some(path))
    }

    async fn fill(&self, content_id: &str) -> Result<PathBuf> {
        info!("Stream cache miss for {}, fetching", content_id);
        fs::create_dir_all(&self.cache_dir)?;

        let downloaded = self
            .engine
            .download_track(content_id, &self.cache_dir, self.quality)
            .await?;

        let file_name = downloaded
            .path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .ok_or_else(|| CoreError::CacheOutputInvalid {
                path: downloaded.path.clone(),
            })?;
        let path = self.cache_dir.join(&file_name);
        if !path.is_file() {
            return Err(CoreError::CacheOutputInvalid {
                path: downloaded.path,
            });
        }

        self.index.put(content_id, &file_name).await?;

        let report = self.evict(Some(file_name.clone())).await?;
        for removed in &report.removed {
            let dropped = self.index.remove_by_file_name(removed).await?;
            debug!("Evicted {} ({} index entries)", removed, dropped);
        }
        if !report.removed.is_empty() {
            info!(
                "Evicted {} file(s), freed {} bytes, {} bytes remain",
                report.removed.len(),
                report.bytes_freed,
                report.remaining_bytes
            );
        }

        Ok(path)
    }

    async fn evict(&self, keep: Option<String>) -> Result<EvictionReport> {
        let dir = self.cache_dir.clone();
        let max_size = self.max_size_bytes;
        let report = tokio::task::spawn_blocking(move || {
            evict_lru(
                &dir,
                max_size,
                keep.as_deref().map(OsStr::new),
                |path| fs::remove_file(path),
            )
        })
        .await??;
        Ok(report)
    }

    /// Delete every file under the cache directory and empty the index
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be listed or the index
    /// cannot be cleared. Individual delete failures are skipped.
    pub async fn clear(&self) -> Result<CacheClearReport> {
        let dir = self.cache_dir.clone();
        let (files_removed, bytes_freed) =
            tokio::task::spawn_blocking(move || clear_dir(&dir)).await??;
        let index_entries_removed = self.index.clear().await?;

        info!(
            "Stream cache cleared: {} files, {} bytes, {} index entries",
            files_removed, bytes_freed, index_entries_removed
        );

        Ok(CacheClearReport {
            files_removed,
            bytes_freed,
            index_entries_removed,
        })
    }

    /// Bytes currently on disk, computed from the directory alone
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be listed.
    pub async fn current_size(&self) -> Result<u64> {
        let dir = self.cache_dir.clone();
        let files = tokio::task::spawn_blocking(move || list_files(&dir)).await??;
        Ok(files.iter().map(|f| f.size).sum())
    }

    /// Flush the index before shutdown
    ///
    /// # Errors
    ///
    /// Returns an error if the WAL checkpoint fails.
    pub async fn checkpoint(&self) -> Result<()> {
        self.index.checkpoint().await
    }

}

/// A caller's share of the per-id fill lock. Dropping it, including when the
/// `resolve` future is cancelled, removes the map entry once nobody else
/// holds it.
struct InflightSlot {
    map: Arc<StdMutex<InflightMap>>,
    content_id: String,
    slot: Option<Arc<Mutex<()>>>,
}

impl InflightSlot {
    fn claim(map: &Arc<StdMutex<InflightMap>>, content_id: &str) -> Self {
        let slot = {
            let mut inflight = map.lock().unwrap_or_else(PoisonError::into_inner);
            Arc::clone(inflight.entry(content_id.to_string()).or_default())
        };
        Self {
            map: Arc::clone(map),
            content_id: content_id.to_string(),
            slot: Some(slot),
        }
    }

    async fn lock(&self) -> Option<tokio::sync::MutexGuard<'_, ()>> {
        match &self.slot {
            Some(slot) => Some(slot.lock().await),
            None => None,
        }
    }
}

impl Drop for InflightSlot {
    fn drop(&mut self) {
        let mut inflight = self.map.lock().unwrap_or_else(PoisonError::into_inner);
        drop(self.slot.take());
        // Only the map still holds it: nobody else is waiting on this id
        if inflight
            .get(&self.content_id)
            .is_some_and(|slot| Arc::strong_count(slot) == 1)
        {
            inflight.remove(&self.content_id);
        }
    }
}

struct CachedFile {
    name: String,
    size: u64,
    last_access: i64,
}

/// Most recent of access and modification time, in epoch millis
fn last_access(metadata: &fs::Metadata) -> i64 {
    let accessed = metadata.accessed().ok().map(system_time_millis);
    let modified = metadata.modified().ok().map(system_time_millis);
    accessed.max(modified).unwrap_or(0)
}

/// Regular files directly inside `dir`
fn list_files(dir: &Path) -> io::Result<Vec<CachedFile>> {
    if !dir.exists() {
        return Ok(Vec::new());
    }

    let mut files = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let metadata = match entry.metadata() {
            Ok(metadata) => metadata,
            Err(e) => {
                warn!("Skipping unreadable cache entry {:?}: {}", entry.path(), e);
                continue;
            }
        };
        if !metadata.is_file() {
            continue;
        }
        files.push(CachedFile {
            name: entry.file_name().to_string_lossy().into_owned(),
            size: metadata.len(),
            last_access: last_access(&metadata),
        });
    }
    Ok(files)
}

/// Set both access and modification time of `path`
fn touch_file(path: &Path, at: SystemTime) -> io::Result<()> {
    let file = fs::OpenOptions::new().write(true).open(path)?;
    file.set_times(FileTimes::new().set_accessed(at).set_modified(at))
}

/// Delete least-recently-accessed files in `dir` until the total is at or
/// below `max_size`. `keep` is never deleted.
///
/// A failed delete leaves the file counted against the ceiling and moves on
/// to the next candidate. When `keep` alone exceeds `max_size` the sweep
/// ends above the ceiling.
pub(crate) fn evict_lru(
    dir: &Path,
    max_size: u64,
    keep: Option<&OsStr>,
    mut remove: impl FnMut(&Path) -> io::Result<()>,
) -> io::Result<EvictionReport> {
    let mut files = list_files(dir)?;
    let mut total: u64 = files.iter().map(|f| f.size).sum();

    let mut report = EvictionReport::default();
    if total <= max_size {
        report.remaining_bytes = total;
        return Ok(report);
    }

    debug!(
        "Stream cache at {} bytes exceeds ceiling of {} bytes, evicting",
        total, max_size
    );

    files.sort_by(|a, b| {
        a.last_access
            .cmp(&b.last_access)
            .then_with(|| a.name.cmp(&b.name))
    });

    for file in files {
        if total <= max_size {
            break;
        }
        if keep.is_some_and(|keep| OsStr::new(&file.name) == keep) {
            continue;
        }
        match remove(&dir.join(&file.name)) {
            Ok(()) => {
                total = total.saturating_sub(file.size);
                report.bytes_freed += file.size;
                report.removed.push(file.name);
            }
            Err(e) => {
                warn!("Failed to evict {}: {}", file.name, e);
            }
        }
    }

    report.remaining_bytes = total;
    Ok(report)
}

/// Remove everything under `dir`, returning (files, bytes) actually freed
fn clear_dir(dir: &Path) -> io::Result<(usize, u64)> {
    if !dir.exists() {
        return Ok((0, 0));
    }

    let mut files_removed = 0;
    let mut bytes_freed = 0;
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        let Ok(file_type) = entry.file_type() else {
            continue;
        };

        if file_type.is_dir() {
            let (files, bytes) = clear_dir(&path)?;
            files_removed += files;
            bytes_freed += bytes;
            if let Err(e) = fs::remove_dir(&path) {
                warn!("Failed to remove cache subdirectory {:?}: {}", path, e);
            }
            continue;
        }

        let size = entry.metadata().map(|m| m.len()).unwrap_or(0);
        match fs::remove_file(&path) {
            Ok(()) => {
                files_removed += 1;
                bytes_freed += size;
            }
            Err(e) => warn!("Failed to remove cached file {:?}: {}", path, e),
        }
    }
    Ok((files_removed, bytes_freed))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::engine::{BatchReport, DownloadedFile, TrackMatch};
    use crate::error::EngineError;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::{Duration, UNIX_EPOCH};
    use tempfile::TempDir;

    /// Writes `<id>.flac` with `size` bytes into the requested directory
    struct FakeEngine {
        size: usize,
        calls: AtomicUsize,
        fail: bool,
        delay: Duration,
    }

    impl FakeEngine {
        fn new(size: usize) -> Self {
            Self {
                size,
                calls: AtomicUsize::new(0),
                fail: false,
                delay: Duration::ZERO,
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl AcquisitionEngine for FakeEngine {
        async fn download_track(
            &self,
            id: &str,
            output_dir: &Path,
            _quality: Quality,
        ) -> std::result::Result<DownloadedFile, EngineError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            if self.fail {
                return Err(EngineError::new("stream unavailable"));
            }
            let path = output_dir.join(format!("{id}.flac"));
            fs::write(&path, vec![0u8; self.size]).map_err(|e| EngineError::new(e.to_string()))?;
            Ok(DownloadedFile::new(path))
        }

        async fn download_album(
            &self,
            _id: &str,
            _output_dir: &Path,
            _quality: Quality,
        ) -> std::result::Result<BatchReport, EngineError> {
            Err(EngineError::new("unsupported"))
        }

        async fn download_playlist(
            &self,
            _id: &str,
            _output_dir: &Path,
            _quality: Quality,
        ) -> std::result::Result<BatchReport, EngineError> {
            Err(EngineError::new("unsupported"))
        }

        async fn search_tracks(
            &self,
            _query: &str,
        ) -> std::result::Result<Vec<TrackMatch>, EngineError> {
            Ok(Vec::new())
        }
    }

    async fn create_test_cache(
        temp_dir: &TempDir,
        engine: Arc<FakeEngine>,
        max_size: u64,
    ) -> BoundedMediaCache {
        let index = CacheIndex::open_in_memory().await.unwrap();
        BoundedMediaCache::with_index(
            temp_dir.path().join("stream"),
            max_size,
            Quality::High,
            index,
            engine,
        )
        .unwrap()
    }

    fn remove_file(path: &Path) -> io::Result<()> {
        fs::remove_file(path)
    }

    fn write_file(dir: &Path, name: &str, size: usize, accessed_secs: u64) {
        let path = dir.join(name);
        fs::write(&path, vec![0u8; size]).unwrap();
        touch_file(&path, UNIX_EPOCH + Duration::from_secs(accessed_secs)).unwrap();
    }

    #[tokio::test]
    async fn test_second_resolve_is_a_hit() {
        let temp_dir = TempDir::new().unwrap();
        let engine = Arc::new(FakeEngine::new(10));
        let cache = create_test_cache(&temp_dir, engine.clone(), 1_000).await;

        let first = cache.resolve("song").await.unwrap();
        let second = cache.resolve("song").await.unwrap();

        assert_eq!(first, second);
        assert!(first.is_file());
        assert_eq!(engine.calls(), 1);
    }

    #[tokio::test]
    async fn test_missing_file_self_heals() {
        let temp_dir = TempDir::new().unwrap();
        let engine = Arc::new(FakeEngine::new(10));
        let cache = create_test_cache(&temp_dir, engine.clone(), 1_000).await;

        let path = cache.resolve("song").await.unwrap();
        fs::remove_file(&path).unwrap();

        assert!(cache.cached_path("song").await.unwrap().is_none());
        assert!(cache.index.get("song").await.unwrap().is_none());

        let refetched = cache.resolve("song").await.unwrap();
        assert!(refetched.is_file());
        assert_eq!(engine.calls(), 2);
        let entry = cache.index.get("song").await.unwrap().expect("re-indexed");
        assert!(cache.cache_dir().join(entry.file_name).is_file());
    }

    #[tokio::test]
    async fn test_engine_failure_propagates_without_entry() {
        let temp_dir = TempDir::new().unwrap();
        let engine = Arc::new(FakeEngine {
            fail: true,
            ..FakeEngine::new(10)
        });
        let cache = create_test_cache(&temp_dir, engine, 1_000).await;

        let result = cache.resolve("song").await;
        assert!(matches!(result, Err(CoreError::Engine(_))));
        assert!(cache.index.is_empty().await.unwrap());
    }

    #[tokio::test]
    async fn test_concurrent_misses_fetch_once() {
        let temp_dir = TempDir::new().unwrap();
        let engine = Arc::new(FakeEngine {
            delay: Duration::from_millis(50),
            ..FakeEngine::new(10)
        });
        let cache = Arc::new(create_test_cache(&temp_dir, engine.clone(), 1_000).await);

        let mut tasks = tokio::task::JoinSet::new();
        for _ in 0..4 {
            let cache = Arc::clone(&cache);
            tasks.spawn(async move { cache.resolve("song").await });
        }
        while let Some(result) = tasks.join_next().await {
            assert!(result.unwrap().unwrap().is_file());
        }

        assert_eq!(engine.calls(), 1);
        assert!(cache.inflight.lock().unwrap().is_empty());
    }

    #[test]
    fn test_evict_lru_removes_oldest_first() {
        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path();
        write_file(dir, "a.flac", 100, 1_000);
        write_file(dir, "b.flac", 100, 2_000);
        write_file(dir, "c.flac", 100, 3_000);
        write_file(dir, "d.flac", 100, 4_000);

        let report = evict_lru(dir, 250, None, remove_file).unwrap();

        assert_eq!(report.removed, vec!["a.flac".to_string(), "b.flac".to_string()]);
        assert_eq!(report.bytes_freed, 200);
        assert_eq!(report.remaining_bytes, 200);
        assert!(!dir.join("a.flac").exists());
        assert!(!dir.join("b.flac").exists());
        assert!(dir.join("c.flac").exists());
        assert!(dir.join("d.flac").exists());
    }

    #[test]
    fn test_evict_lru_under_ceiling_is_noop() {
        let temp_dir = TempDir::new().unwrap();
        write_file(temp_dir.path(), "a.flac", 100, 1_000);

        let report = evict_lru(temp_dir.path(), 100, None, remove_file).unwrap();
        assert!(report.removed.is_empty());
        assert_eq!(report.remaining_bytes, 100);
    }

    #[test]
    fn test_evict_lru_never_removes_kept_file() {
        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path();
        write_file(dir, "old.flac", 100, 1_000);
        write_file(dir, "new.flac", 300, 500);

        let report =
            evict_lru(dir, 200, Some(OsStr::new("new.flac")), remove_file).unwrap();

        assert_eq!(report.removed, vec!["old.flac".to_string()]);
        assert!(dir.join("new.flac").exists());
        // The kept file alone is over the ceiling
        assert_eq!(report.remaining_bytes, 300);
    }

    #[test]
    fn test_evict_lru_skips_failed_delete() {
        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path();
        write_file(dir, "a.flac", 100, 1_000);
        write_file(dir, "b.flac", 100, 2_000);
        write_file(dir, "c.flac", 100, 3_000);
        write_file(dir, "d.flac", 100, 4_000);

        let mut attempts = Vec::new();
        let report = evict_lru(dir, 150, None, |path| {
            attempts.push(path.file_name().unwrap().to_string_lossy().into_owned());
            if path.ends_with("a.flac") {
                return Err(io::Error::new(io::ErrorKind::PermissionDenied, "locked"));
            }
            fs::remove_file(path)
        })
        .unwrap();

        assert_eq!(attempts, vec!["a.flac", "b.flac", "c.flac", "d.flac"]);
        assert_eq!(
            report.removed,
            vec!["b.flac".to_string(), "c.flac".to_string(), "d.flac".to_string()]
        );
        assert_eq!(report.bytes_freed, 300);
        // The locked file still counts
        assert_eq!(report.remaining_bytes, 100);
        assert!(dir.join("a.flac").exists());
    }

    #[tokio::test]
    async fn test_oversized_fill_is_kept_and_evicts_the_rest() {
        let temp_dir = TempDir::new().unwrap();
        let engine = Arc::new(FakeEngine::new(400));
        let cache = create_test_cache(&temp_dir, engine, 150).await;
        write_file(cache.cache_dir(), "old.flac", 100, 1_000);
        cache.index.put("old", "old.flac").await.unwrap();

        let path = cache.resolve("huge").await.unwrap();

        assert!(path.is_file());
        assert_eq!(cache.current_size().await.unwrap(), 400);
        assert!(cache.index.get("old").await.unwrap().is_none());
        assert!(cache.cached_path("huge").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_cancelled_resolve_releases_slot() {
        let temp_dir = TempDir::new().unwrap();
        let engine = Arc::new(FakeEngine {
            delay: Duration::from_millis(500),
            ..FakeEngine::new(10)
        });
        let cache = create_test_cache(&temp_dir, engine, 1_000).await;

        let outcome =
            tokio::time::timeout(Duration::from_millis(20), cache.resolve("song")).await;

        assert!(outcome.is_err());
        assert!(cache.inflight.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_fill_evicts_and_drops_index_entries() {
        let temp_dir = TempDir::new().unwrap();
        let engine = Arc::new(FakeEngine::new(100));
        let cache = create_test_cache(&temp_dir, engine, 250).await;

        cache.resolve("one").await.unwrap();
        touch_file(
            &cache.cache_dir().join("one.flac"),
            UNIX_EPOCH + Duration::from_secs(1_000),
        )
        .unwrap();
        cache.resolve("two").await.unwrap();
        touch_file(
            &cache.cache_dir().join("two.flac"),
            UNIX_EPOCH + Duration::from_secs(2_000),
        )
        .unwrap();
        cache.resolve("three").await.unwrap();

        assert!(cache.current_size().await.unwrap() <= 250);
        assert!(cache.index.get("one").await.unwrap().is_none());
        assert!(cache.index.get("two").await.unwrap().is_some());
        assert!(cache.index.get("three").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_hit_refreshes_access_time() {
        let temp_dir = TempDir::new().unwrap();
        let engine = Arc::new(FakeEngine::new(10));
        let cache = create_test_cache(&temp_dir, engine, 1_000).await;

        let path = cache.resolve("song").await.unwrap();
        touch_file(&path, UNIX_EPOCH + Duration::from_secs(1_000)).unwrap();

        cache.resolve("song").await.unwrap();

        let metadata = fs::metadata(&path).unwrap();
        assert!(last_access(&metadata) > 1_000_000);
    }

    #[tokio::test]
    async fn test_clear_removes_files_and_index() {
        let temp_dir = TempDir::new().unwrap();
        let engine = Arc::new(FakeEngine::new(10));
        let cache = create_test_cache(&temp_dir, engine, 1_000).await;

        cache.resolve("a").await.unwrap();
        cache.resolve("b").await.unwrap();
        fs::write(cache.cache_dir().join("stray.tmp"), b"xyz").unwrap();

        let report = cache.clear().await.unwrap();

        assert_eq!(report.files_removed, 3);
        assert_eq!(report.bytes_freed, 23);
        assert_eq!(report.index_entries_removed, 2);
        assert_eq!(cache.current_size().await.unwrap(), 0);
        assert!(cache.index.is_empty().await.unwrap());
    }

    #[tokio::test]
    async fn test_current_size_ignores_index() {
        let temp_dir = TempDir::new().unwrap();
        let engine = Arc::new(FakeEngine::new(10));
        let cache = create_test_cache(&temp_dir, engine, 1_000).await;

        cache.resolve("a").await.unwrap();
        fs::write(cache.cache_dir().join("unindexed.bin"), vec![0u8; 5]).unwrap();
        cache.index.clear().await.unwrap();

        assert_eq!(cache.current_size().await.unwrap(), 15);
    }
}
