use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info};

use super::{Corpus, CorpusError, CorpusScanner, CorpusSource};
use crate::config::CorpusConfig;

/// Memoized corpus shared between the chat path and the invalidation listener.
///
/// The state lock is only held for pointer swaps. Scans run on a blocking
/// thread under `scan_lock`, so concurrent loads on an empty cache converge on
/// a single scan and `invalidate()` never waits for disk I/O.
pub struct CorpusCache {
    root: PathBuf,
    scanner: Arc<dyn CorpusSource>,
    state: RwLock<CacheState>,
    scan_lock: Mutex<()>,
    scans: AtomicU64,
    invalidations: AtomicU64,
}

#[derive(Default)]
struct CacheState {
    /// Bumped on every invalidation; a scan only publishes if it is unchanged.
    generation: u64,
    populated: Option<Populated>,
}

struct Populated {
    root: PathBuf,
    corpus: Arc<Corpus>,
    loaded_at: DateTime<Utc>,
}

/// Cache statistics
#[derive(Debug, Clone, Serialize)]
pub struct CacheStats {
    pub populated: bool,
    pub root: Option<PathBuf>,
    pub documents: usize,
    pub scans: u64,
    pub invalidations: u64,
    pub loaded_at: Option<DateTime<Utc>>,
}

impl CorpusCache {
    pub fn new(config: &CorpusConfig) -> Self {
        Self::with_source(config.root_dir.clone(), Arc::new(CorpusScanner::new(config)))
    }

    /// Cache over `root` backed by a custom scan implementation
    pub fn with_source(root: PathBuf, scanner: Arc<dyn CorpusSource>) -> Self {
        info!("Initializing corpus cache for {:?}", root);
        Self {
            root,
            scanner,
            state: RwLock::new(CacheState::default()),
            scan_lock: Mutex::new(()),
            scans: AtomicU64::new(0),
            invalidations: AtomicU64::new(0),
        }
    }

    /// Configured corpus root
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Load the corpus from the configured root
    pub async fn load(&self) -> Result<Arc<Corpus>, CorpusError> {
        let root = self.root.clone();
        self.load_from(&root).await
    }

    /// Return the memoized corpus for `root`, scanning the directory if the
    /// cache is empty or was populated from a different directory.
    pub async fn load_from(&self, root: &Path) -> Result<Arc<Corpus>, CorpusError> {
        if let Some(corpus) = self.cached(root) {
            return Ok(corpus);
        }

        let _scan_guard = self.scan_lock.lock().await;

        // Another load may have published while we waited for the scan lock
        if let Some(corpus) = self.cached(root) {
            debug!("Corpus populated by concurrent load, reusing it");
            return Ok(corpus);
        }

        let generation = self.state.read().generation;

        let scanner = Arc::clone(&self.scanner);
        let dir = root.to_path_buf();
        let outcome = tokio::task::spawn_blocking(move || scanner.scan(&dir)).await?;
        self.scans.fetch_add(1, Ordering::Relaxed);

        let corpus = Arc::new(outcome.corpus);

        let mut state = self.state.write();
        if state.generation == generation {
            state.populated = Some(Populated {
                root: root.to_path_buf(),
                corpus: Arc::clone(&corpus),
                loaded_at: Utc::now(),
            });
            info!(
                "Corpus loaded from {:?}: {} conversations ({} skipped)",
                root,
                corpus.len(),
                outcome.skipped
            );
        } else {
            debug!("Cache invalidated during scan of {:?}, result not memoized", root);
        }

        Ok(corpus)
    }

    /// Discard the memoized corpus. The next `load()` rescans the directory.
    pub fn invalidate(&self) {
        let discarded = {
            let mut state = self.state.write();
            state.generation = state.generation.wrapping_add(1);
            state.populated.take()
        };
        self.invalidations.fetch_add(1, Ordering::Relaxed);

        match discarded {
            Some(p) => debug!("Corpus cache cleared ({} conversations discarded)", p.corpus.len()),
            None => debug!("Corpus cache already empty"),
        }
    }

    pub fn is_populated(&self) -> bool {
        self.state.read().populated.is_some()
    }

    /// Total number of directory scans performed
    pub fn scan_count(&self) -> u64 {
        self.scans.load(Ordering::Relaxed)
    }

    pub fn stats(&self) -> CacheStats {
        let state = self.state.read();
        let populated = state.populated.as_ref();

        CacheStats {
            populated: populated.is_some(),
            root: populated.map(|p| p.root.clone()),
            documents: populated.map_or(0, |p| p.corpus.len()),
            scans: self.scans.load(Ordering::Relaxed),
            invalidations: self.invalidations.load(Ordering::Relaxed),
            loaded_at: populated.map(|p| p.loaded_at),
        }
    }

    fn cached(&self, root: &Path) -> Option<Arc<Corpus>> {
        let state = self.state.read();
        state
            .populated
            .as_ref()
            .filter(|p| p.root == root)
            .map(|p| Arc::clone(&p.corpus))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::corpus::ScanOutcome;
    use std::fs;
    use tempfile::TempDir;

    fn cache_for(dir: &TempDir) -> CorpusCache {
        CorpusCache::new(&CorpusConfig {
            root_dir: dir.path().to_path_buf(),
            ..CorpusConfig::default()
        })
    }

    fn expected(pairs: &[(&str, &str)]) -> Corpus {
        pairs.iter().copied().collect()
    }

    #[tokio::test]
    async fn test_load_is_memoized() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a.txt"), "hello").unwrap();
        let cache = cache_for(&dir);

        let first = cache.load().await.unwrap();
        let second = cache.load().await.unwrap();

        assert_eq!(cache.scan_count(), 1);
        assert_eq!(first, second);
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[tokio::test]
    async fn test_invalidate_then_load_rescans() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a.txt"), "hello").unwrap();
        fs::write(dir.path().join("b.txt"), "world").unwrap();
        let cache = cache_for(&dir);

        let corpus = cache.load().await.unwrap();
        assert_eq!(*corpus, expected(&[("a", "hello"), ("b", "world")]));

        fs::write(dir.path().join("c.txt"), "new").unwrap();

        let cached = cache.load().await.unwrap();
        assert_eq!(cached.len(), 2);
        assert!(!cached.contains("c"));

        cache.invalidate();
        let fresh = cache.load().await.unwrap();
        assert_eq!(
            *fresh,
            expected(&[("a", "hello"), ("b", "world"), ("c", "new")])
        );
        assert_eq!(cache.scan_count(), 2);
    }

    #[tokio::test]
    async fn test_invalidate_is_idempotent() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a.txt"), "hello").unwrap();
        let cache = cache_for(&dir);

        cache.load().await.unwrap();
        cache.invalidate();
        cache.invalidate();
        assert!(!cache.is_populated());

        cache.load().await.unwrap();
        assert_eq!(cache.scan_count(), 2);
        assert!(cache.is_populated());
    }

    #[tokio::test]
    async fn test_invalidate_on_empty_cache() {
        let dir = TempDir::new().unwrap();
        let cache = cache_for(&dir);

        cache.invalidate();

        assert!(!cache.is_populated());
        assert_eq!(cache.scan_count(), 0);
        assert_eq!(cache.stats().invalidations, 1);
    }

    #[tokio::test]
    async fn test_empty_and_missing_directories() {
        let dir = TempDir::new().unwrap();
        let cache = cache_for(&dir);
        assert!(cache.load().await.unwrap().is_empty());

        let missing = dir.path().join("nothing-here");
        let corpus = cache.load_from(&missing).await.unwrap();
        assert!(corpus.is_empty());
        assert_eq!(cache.stats().root, Some(missing));
    }

    #[tokio::test]
    async fn test_different_root_triggers_scan() {
        let first = TempDir::new().unwrap();
        let second = TempDir::new().unwrap();
        fs::write(first.path().join("a.txt"), "first").unwrap();
        fs::write(second.path().join("b.txt"), "second").unwrap();
        let cache = cache_for(&first);

        cache.load().await.unwrap();
        let other = cache.load_from(second.path()).await.unwrap();

        assert_eq!(*other, expected(&[("b", "second")]));
        assert_eq!(cache.scan_count(), 2);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_loads_share_one_scan() {
        let dir = TempDir::new().unwrap();
        for i in 0..50 {
            fs::write(dir.path().join(format!("conv-{i}.txt")), format!("text {i}")).unwrap();
        }
        let cache = Arc::new(cache_for(&dir));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let cache = Arc::clone(&cache);
                tokio::spawn(async move { cache.load().await.unwrap() })
            })
            .collect();

        let mut results = Vec::new();
        for handle in handles {
            results.push(handle.await.unwrap());
        }

        assert_eq!(cache.scan_count(), 1);
        assert!(results.iter().all(|c| c.len() == 50));
        assert!(results.windows(2).all(|w| Arc::ptr_eq(&w[0], &w[1])));
    }

    #[tokio::test]
    async fn test_stats_reflect_state() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a.txt"), "hello").unwrap();
        let cache = cache_for(&dir);

        let before = cache.stats();
        assert!(!before.populated);
        assert_eq!(before.documents, 0);
        assert!(before.loaded_at.is_none());

        cache.load().await.unwrap();
        let after = cache.stats();
        assert!(after.populated);
        assert_eq!(after.documents, 1);
        assert_eq!(after.scans, 1);
        assert_eq!(after.root.as_deref(), Some(dir.path()));
    }

    type Gate = (tokio::sync::mpsc::UnboundedSender<()>, std::sync::mpsc::Receiver<()>);

    /// Holds the first scan until the test releases it
    struct GatedSource {
        inner: CorpusScanner,
        gate: parking_lot::Mutex<Option<Gate>>,
    }

    impl CorpusSource for GatedSource {
        fn scan(&self, root: &Path) -> ScanOutcome {
            if let Some((started, release)) = self.gate.lock().take() {
                started.send(()).unwrap();
                release.recv().unwrap();
            }
            self.inner.scan(root)
        }
    }

    #[tokio::test]
    async fn test_invalidate_during_scan_is_not_memoized() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a.txt"), "hello").unwrap();

        let (started_tx, mut started_rx) = tokio::sync::mpsc::unbounded_channel();
        let (release_tx, release_rx) = std::sync::mpsc::channel();
        let source = GatedSource {
            inner: CorpusScanner::new(&CorpusConfig::default()),
            gate: parking_lot::Mutex::new(Some((started_tx, release_rx))),
        };
        let cache = Arc::new(CorpusCache::with_source(dir.path().to_path_buf(), Arc::new(source)));

        let loader = tokio::spawn({
            let cache = Arc::clone(&cache);
            async move { cache.load().await.unwrap() }
        });

        started_rx.recv().await.unwrap();
        cache.invalidate();
        release_tx.send(()).unwrap();

        // The in-flight caller still gets its result
        let corpus = loader.await.unwrap();
        assert_eq!(*corpus, expected(&[("a", "hello")]));
        assert!(!cache.is_populated());
        assert_eq!(cache.scan_count(), 1);

        cache.load().await.unwrap();
        assert_eq!(cache.scan_count(), 2);
        assert!(cache.is_populated());
    }
}
