//! Persisted catalog snapshot.
//!
//! The snapshot lives in one JSON file (`{"updated_at": ..., "products": [...]}`)
//! that is replaced atomically, so concurrent readers only ever see a whole
//! snapshot. No operation here returns an error: a missing or corrupt file
//! reads as empty, and failed writes or fetches are logged and leave the
//! previous snapshot in place.

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use mostrador_adapters::{bounded, CatalogAdapter};
use mostrador_core::{CacheConfig, CatalogEntry};
use serde::{Deserialize, Serialize};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, error, info, instrument, warn};

use crate::ingest::normalize_records;

#[derive(Error, Debug)]
pub enum CacheError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// One persisted copy of the catalog.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CacheSnapshot {
    /// Set only after a successful full fetch
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(rename = "products", default)]
    pub entries: Vec<CatalogEntry>,
}

impl CacheSnapshot {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Stale when never fetched or older than `ttl`.
    pub fn is_stale_at(&self, now: DateTime<Utc>, ttl: ChronoDuration) -> bool {
        match self.updated_at {
            None => true,
            Some(updated_at) => now - updated_at > ttl,
        }
    }
}

/// Where the entries handed out by [`CatalogCache::ensure_view`] came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapshotSource {
    /// Persisted snapshot within its TTL
    Fresh,
    /// Fetched just now
    Refreshed,
    /// Refresh failed; the expired snapshot is all there is
    Stale,
}

#[derive(Debug, Clone)]
pub struct CatalogView {
    pub entries: Vec<CatalogEntry>,
    pub source: SnapshotSource,
}

impl CatalogView {
    pub fn is_stale(&self) -> bool {
        self.source == SnapshotSource::Stale
    }
}

/// Catalog snapshot backed by a JSON file and refreshed from a catalog source.
pub struct CatalogCache {
    path: PathBuf,
    ttl: ChronoDuration,
    source: Arc<dyn CatalogAdapter>,
    fetch_timeout: Duration,
    refresh_lock: Mutex<()>,
}

const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(15);

impl CatalogCache {
    pub fn new(config: &CacheConfig, source: Arc<dyn CatalogAdapter>) -> Self {
        Self::with_path(&config.path, source)
            .with_ttl(config.ttl())
            .with_fetch_timeout(config.fetch_timeout())
    }

    pub fn with_path(path: impl AsRef<Path>, source: Arc<dyn CatalogAdapter>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            ttl: ChronoDuration::minutes(60),
            source,
            fetch_timeout: DEFAULT_FETCH_TIMEOUT,
            refresh_lock: Mutex::new(()),
        }
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ChronoDuration::from_std(ttl).unwrap_or_else(|_| ChronoDuration::days(36_500));
        self
    }

    /// Deadline for one full listing fetch.
    pub fn with_fetch_timeout(mut self, timeout: Duration) -> Self {
        self.fetch_timeout = timeout;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the persisted snapshot. Missing or corrupt state reads as empty.
    pub async fn read(&self) -> CacheSnapshot {
        match self.try_read().await {
            Ok(snapshot) => snapshot,
            Err(CacheError::Io(e)) if e.kind() == ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "No catalog snapshot yet");
                CacheSnapshot::empty()
            }
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Unreadable catalog snapshot, treating as empty");
                CacheSnapshot::empty()
            }
        }
    }

    async fn try_read(&self) -> Result<CacheSnapshot, CacheError> {
        let bytes = tokio::fs::read(&self.path).await?;
        let mut snapshot: CacheSnapshot = serde_json::from_slice(&bytes)?;
        snapshot.entries.retain(CatalogEntry::is_valid);
        Ok(snapshot)
    }

    /// Persists `entries` stamped with the current time. Failures are logged.
    pub async fn write(&self, entries: &[CatalogEntry]) {
        self.write_at(entries, Utc::now()).await
    }

    pub async fn write_at(&self, entries: &[CatalogEntry], now: DateTime<Utc>) {
        let snapshot = CacheSnapshot {
            updated_at: Some(now),
            entries: entries.iter().filter(|entry| entry.is_valid()).cloned().collect(),
        };
        if let Err(e) = self.try_write(&snapshot).await {
            error!(path = %self.path.display(), error = %e, "Failed to persist catalog snapshot");
        }
    }

    async fn try_write(&self, snapshot: &CacheSnapshot) -> Result<(), CacheError> {
        let bytes = serde_json::to_vec(snapshot)?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }

        let mut temp_name = self.path.file_name().unwrap_or_default().to_os_string();
        temp_name.push(format!(".tmp-{}", uuid::Uuid::new_v4()));
        let temp_path = self.path.with_file_name(temp_name);

        tokio::fs::write(&temp_path, &bytes).await?;
        if let Err(e) = tokio::fs::rename(&temp_path, &self.path).await {
            let _ = tokio::fs::remove_file(&temp_path).await;
            return Err(e.into());
        }
        Ok(())
    }

    pub fn is_stale(&self, snapshot: &CacheSnapshot) -> bool {
        snapshot.is_stale_at(Utc::now(), self.ttl)
    }

    /// Fetches the full listing, normalizes it and persists it if non-empty.
    ///
    /// Returns an empty list when the fetch fails or outlives the fetch
    /// timeout; the previous snapshot is left untouched.
    #[instrument(skip(self), fields(source = self.source.name()))]
    pub async fn refresh(&self) -> Vec<CatalogEntry> {
        let _guard = self.refresh_lock.lock().await;
        self.refresh_locked().await
    }

    async fn refresh_locked(&self) -> Vec<CatalogEntry> {
        let listing = bounded(self.fetch_timeout, "list_products", self.source.list_products());
        let records = match listing.await {
            Ok(records) => records,
            Err(e) => {
                warn!(error = %e, "Catalog refresh failed, keeping previous snapshot");
                return Vec::new();
            }
        };

        let entries = normalize_records(&records);
        if entries.is_empty() {
            warn!("Catalog refresh returned no usable products, keeping previous snapshot");
        } else {
            self.write(&entries).await;
            info!(count = entries.len(), "Catalog snapshot refreshed");
        }
        entries
    }

    /// Current entries: the snapshot when fresh and non-empty, otherwise a
    /// refresh.
    pub async fn ensure(&self) -> Vec<CatalogEntry> {
        self.ensure_view().await.entries
    }

    /// Like [`ensure`](Self::ensure), also saying where the entries came
    /// from. When the refresh fails the expired snapshot is still served.
    pub async fn ensure_view(&self) -> CatalogView {
        let snapshot = self.read().await;
        if !self.is_stale(&snapshot) && !snapshot.entries.is_empty() {
            return CatalogView {
                entries: snapshot.entries,
                source: SnapshotSource::Fresh,
            };
        }

        let _guard = self.refresh_lock.lock().await;

        // Another task may have refreshed while we waited.
        let snapshot = self.read().await;
        if !self.is_stale(&snapshot) && !snapshot.entries.is_empty() {
            return CatalogView {
                entries: snapshot.entries,
                source: SnapshotSource::Fresh,
            };
        }

        let refreshed = self.refresh_locked().await;
        if refreshed.is_empty() {
            CatalogView {
                entries: snapshot.entries,
                source: SnapshotSource::Stale,
            }
        } else {
            CatalogView {
                entries: refreshed,
                source: SnapshotSource::Refreshed,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use mostrador_adapters::{AdapterError, AdapterResult};
    use mostrador_core::{Localized, ProductRecord};
    use pretty_assertions::assert_eq;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Listing {
        names: Option<Vec<&'static str>>,
        hang: bool,
        calls: AtomicUsize,
    }

    impl Listing {
        fn of(names: &[&'static str]) -> Arc<Self> {
            Arc::new(Self {
                names: Some(names.to_vec()),
                hang: false,
                calls: AtomicUsize::new(0),
            })
        }

        fn down() -> Arc<Self> {
            Arc::new(Self {
                names: None,
                hang: false,
                calls: AtomicUsize::new(0),
            })
        }

        fn hanging() -> Arc<Self> {
            Arc::new(Self {
                names: Some(vec!["Nuevo"]),
                hang: true,
                calls: AtomicUsize::new(0),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl CatalogAdapter for Listing {
        async fn list_products(&self) -> AdapterResult<Vec<ProductRecord>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.hang {
                tokio::time::sleep(Duration::from_secs(3600)).await;
            }
            let names = self
                .names
                .clone()
                .ok_or_else(|| AdapterError::Connection("down".into()))?;
            Ok(names
                .into_iter()
                .map(|name| ProductRecord {
                    name: Some(Localized::Scalar(name.to_string())),
                    ..Default::default()
                })
                .collect())
        }

        async fn get_product(&self, _query: &str) -> AdapterResult<Option<ProductRecord>> {
            Ok(None)
        }

        fn name(&self) -> &'static str {
            "listing"
        }
    }

    fn cache_in(dir: &tempfile::TempDir, source: Arc<dyn CatalogAdapter>) -> CatalogCache {
        CatalogCache::with_path(dir.path().join("products.json"), source)
            .with_ttl(Duration::from_secs(3600))
    }

    #[test]
    fn test_staleness_edges() {
        let ttl = ChronoDuration::minutes(60);
        let now = Utc::now();

        assert!(CacheSnapshot::empty().is_stale_at(now, ttl));

        let snapshot = CacheSnapshot {
            updated_at: Some(now),
            entries: Vec::new(),
        };
        assert!(!snapshot.is_stale_at(now + ChronoDuration::minutes(60), ttl));
        assert!(snapshot.is_stale_at(now + ChronoDuration::minutes(60) + ChronoDuration::seconds(1), ttl));
    }

    #[tokio::test]
    async fn test_missing_and_corrupt_files_read_empty() {
        let dir = tempfile::tempdir().unwrap();
        let cache = cache_in(&dir, Listing::of(&[]));
        assert_eq!(cache.read().await, CacheSnapshot::empty());

        tokio::fs::write(cache.path(), b"{not json").await.unwrap();
        assert_eq!(cache.read().await, CacheSnapshot::empty());
    }

    #[tokio::test]
    async fn test_write_then_read_drops_nameless_entries() {
        let dir = tempfile::tempdir().unwrap();
        let cache = cache_in(&dir, Listing::of(&[]));
        let now = Utc::now();

        cache
            .write_at(&[CatalogEntry::new("Sérum Iuven 30ml"), CatalogEntry::new(" ")], now)
            .await;

        let snapshot = cache.read().await;
        assert_eq!(snapshot.updated_at, Some(now));
        assert_eq!(snapshot.entries.len(), 1);

        let raw: serde_json::Value =
            serde_json::from_slice(&tokio::fs::read(cache.path()).await.unwrap()).unwrap();
        assert!(raw.get("updated_at").is_some());
        let products = raw["products"].as_array().unwrap();
        assert_eq!(products.len(), 1);
        assert_eq!(products[0]["name"], "Sérum Iuven 30ml");
    }

    #[tokio::test]
    async fn test_write_failure_is_swallowed() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("file");
        tokio::fs::write(&blocker, b"x").await.unwrap();

        let cache = CatalogCache::with_path(blocker.join("products.json"), Listing::of(&[]));
        cache.write(&[CatalogEntry::new("A")]).await;
        assert_eq!(cache.read().await, CacheSnapshot::empty());
    }

    #[tokio::test]
    async fn test_write_leaves_no_temp_files() {
        let dir = tempfile::tempdir().unwrap();
        let cache = cache_in(&dir, Listing::of(&[]));
        cache.write(&[CatalogEntry::new("A")]).await;

        let mut names = Vec::new();
        let mut entries = tokio::fs::read_dir(dir.path()).await.unwrap();
        while let Some(entry) = entries.next_entry().await.unwrap() {
            names.push(entry.file_name().to_string_lossy().into_owned());
        }
        assert_eq!(names, vec!["products.json"]);
    }

    #[tokio::test]
    async fn test_refresh_persists_on_success() {
        let dir = tempfile::tempdir().unwrap();
        let cache = cache_in(&dir, Listing::of(&["A", "B"]));

        assert_eq!(cache.refresh().await.len(), 2);
        let snapshot = cache.read().await;
        assert_eq!(snapshot.entries.len(), 2);
        assert!(!cache.is_stale(&snapshot));
    }

    #[tokio::test]
    async fn test_failed_refresh_keeps_previous_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let cache = cache_in(&dir, Listing::down());
        let old = Utc::now() - ChronoDuration::hours(5);
        cache.write_at(&[CatalogEntry::new("Viejo")], old).await;

        assert!(cache.refresh().await.is_empty());
        let snapshot = cache.read().await;
        assert_eq!(snapshot.updated_at, Some(old));
        assert_eq!(snapshot.entries[0].name, "Viejo");
    }

    #[tokio::test]
    async fn test_empty_listing_does_not_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let cache = cache_in(&dir, Listing::of(&[]));
        let old = Utc::now() - ChronoDuration::hours(5);
        cache.write_at(&[CatalogEntry::new("Viejo")], old).await;

        assert!(cache.refresh().await.is_empty());
        assert_eq!(cache.read().await.updated_at, Some(old));
    }

    #[tokio::test]
    async fn test_ensure_uses_fresh_snapshot_without_fetching() {
        let dir = tempfile::tempdir().unwrap();
        let source = Listing::of(&["Nuevo"]);
        let cache = cache_in(&dir, source.clone());
        cache.write(&[CatalogEntry::new("Guardado")]).await;

        let view = cache.ensure_view().await;
        assert_eq!(view.source, SnapshotSource::Fresh);
        assert_eq!(view.entries[0].name, "Guardado");
        assert_eq!(source.calls(), 0);
    }

    #[tokio::test]
    async fn test_ensure_refreshes_stale_or_empty() {
        let dir = tempfile::tempdir().unwrap();
        let source = Listing::of(&["Nuevo"]);
        let cache = cache_in(&dir, source.clone());

        let view = cache.ensure_view().await;
        assert_eq!(view.source, SnapshotSource::Refreshed);
        assert_eq!(cache.ensure().await[0].name, "Nuevo");
        assert_eq!(source.calls(), 1);
    }

    #[tokio::test]
    async fn test_ensure_serves_stale_when_refresh_fails() {
        let dir = tempfile::tempdir().unwrap();
        let cache = cache_in(&dir, Listing::down());
        cache
            .write_at(&[CatalogEntry::new("Viejo")], Utc::now() - ChronoDuration::hours(5))
            .await;

        let view = cache.ensure_view().await;
        assert!(view.is_stale());
        assert_eq!(view.entries[0].name, "Viejo");
    }

    #[tokio::test]
    async fn test_hanging_listing_serves_stale_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let source = Listing::hanging();
        let cache = cache_in(&dir, source.clone()).with_fetch_timeout(Duration::from_millis(100));
        let old = Utc::now() - ChronoDuration::hours(5);
        cache.write_at(&[CatalogEntry::new("Viejo")], old).await;

        let view = tokio::time::timeout(Duration::from_secs(3), cache.ensure_view())
            .await
            .expect("refresh must give up at the fetch timeout");
        assert!(view.is_stale());
        assert_eq!(view.entries[0].name, "Viejo");
        assert_eq!(source.calls(), 1);

        // The lock is released, so a second refresher is not stuck behind the first.
        let refreshed = tokio::time::timeout(Duration::from_secs(3), cache.refresh()).await.unwrap();
        assert!(refreshed.is_empty());
        assert_eq!(cache.read().await.updated_at, Some(old));
    }
}
