//! Raw record snapshot loading.
//!
//! The snapshot is the one I/O boundary of the catalog: a JSON array of raw
//! records produced by the upstream export, read from a local file or fetched
//! over HTTP. [`SnapshotSource`] abstracts where it comes from and
//! [`SnapshotCache`] makes sure it is loaded at most once per process.
//!
//! An unavailable or malformed snapshot is not an error: it is logged and
//! treated as an empty record set, so the catalog still starts and answers
//! every query with an empty result.

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};
use std::time::Duration;
use tracing::{info, warn};

use catalog_core::{Catalog, MakerDirectory, Normalizer, RawRecord};

use crate::config::Config;

/// A place the raw record array can be read from.
#[async_trait]
pub trait SnapshotSource: Send + Sync {
    /// Human-readable location, used in log messages.
    fn describe(&self) -> String;

    /// Fetch the snapshot as parsed JSON.
    async fn fetch(&self) -> Result<Value>;
}

/// Snapshot stored as a JSON file on disk.
pub struct FileSnapshot {
    path: PathBuf,
}

impl FileSnapshot {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl SnapshotSource for FileSnapshot {
    fn describe(&self) -> String {
        self.path.display().to_string()
    }

    async fn fetch(&self) -> Result<Value> {
        if !tokio::fs::try_exists(&self.path).await.unwrap_or(false) {
            bail!("snapshot file not found: {}", self.path.display());
        }
        let content = tokio::fs::read_to_string(&self.path)
            .await
            .with_context(|| format!("Failed to read snapshot: {}", self.path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse snapshot: {}", self.path.display()))
    }
}

/// Snapshot served over HTTP(S).
pub struct HttpSnapshot {
    url: String,
    client: reqwest::Client,
}

impl HttpSnapshot {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self {
            url: url.into(),
            client,
        })
    }
}

#[async_trait]
impl SnapshotSource for HttpSnapshot {
    fn describe(&self) -> String {
        self.url.clone()
    }

    async fn fetch(&self) -> Result<Value> {
        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .with_context(|| format!("Failed to fetch {}", self.url))?
            .error_for_status()
            .with_context(|| format!("Failed to fetch {}", self.url))?;
        response
            .json::<Value>()
            .await
            .with_context(|| format!("Failed to parse snapshot from {}", self.url))
    }
}

/// Snapshot already held in memory.
pub struct StaticSnapshot {
    value: Value,
}

impl StaticSnapshot {
    pub fn new(value: Value) -> Self {
        Self { value }
    }
}

#[async_trait]
impl SnapshotSource for StaticSnapshot {
    fn describe(&self) -> String {
        "in-memory snapshot".to_string()
    }

    async fn fetch(&self) -> Result<Value> {
        Ok(self.value.clone())
    }
}

/// Build the configured snapshot source.
pub fn source_from_config(config: &Config) -> Result<Box<dyn SnapshotSource>> {
    match (&config.snapshot.path, &config.snapshot.url) {
        (Some(path), _) => Ok(Box::new(FileSnapshot::new(path))),
        (None, Some(url)) => Ok(Box::new(HttpSnapshot::new(
            url,
            Duration::from_secs(config.snapshot.timeout_secs),
        )?)),
        (None, None) => bail!("snapshot: one of path or url is required"),
    }
}

/// Read raw records from `source`, degrading to an empty set on failure.
pub async fn load_records(source: &dyn SnapshotSource) -> Vec<RawRecord> {
    let value = match source.fetch().await {
        Ok(v) => v,
        Err(e) => {
            warn!(source = %source.describe(), error = %format!("{:#}", e), "snapshot unavailable, using empty catalog");
            return Vec::new();
        }
    };
    if !value.is_array() {
        warn!(source = %source.describe(), "snapshot is not a JSON array, using empty catalog");
        return Vec::new();
    }
    let records = RawRecord::many_from_value(value);
    info!(source = %source.describe(), records = records.len(), "loaded snapshot");
    records
}

/// Read the maker directory, degrading to an empty directory on failure.
pub async fn load_makers(path: Option<&Path>) -> MakerDirectory {
    let Some(path) = path else {
        return MakerDirectory::new();
    };
    match FileSnapshot::new(path).fetch().await {
        Ok(value) => MakerDirectory::from_value(&value),
        Err(e) => {
            warn!(path = %path.display(), error = %format!("{:#}", e), "maker directory unavailable");
            MakerDirectory::new()
        }
    }
}

/// Process-lifetime cache of the raw record array.
///
/// The first [`get_or_load`](Self::get_or_load) populates it. Concurrent
/// first callers may each load the snapshot; the first result to be stored
/// wins and later ones are discarded, which is harmless because every load
/// reads the same immutable snapshot.
#[derive(Default)]
pub struct SnapshotCache {
    records: RwLock<Option<Arc<Vec<RawRecord>>>>,
}

impl SnapshotCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cached(&self) -> Option<Arc<Vec<RawRecord>>> {
        self.records
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    pub fn is_loaded(&self) -> bool {
        self.cached().is_some()
    }

    pub async fn get_or_load(&self, source: &dyn SnapshotSource) -> Arc<Vec<RawRecord>> {
        if let Some(records) = self.cached() {
            return records;
        }
        let loaded = Arc::new(load_records(source).await);
        let mut slot = self
            .records
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        slot.get_or_insert(loaded).clone()
    }

    /// Drop the cached records. Intended for test isolation.
    pub fn clear(&self) {
        *self
            .records
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = None;
    }
}

/// Load (or reuse) the snapshot and build the catalog from it.
pub async fn build_catalog(config: &Config, cache: &SnapshotCache) -> Result<Catalog> {
    let source = source_from_config(config)?;
    let records = cache.get_or_load(source.as_ref()).await;
    let makers = load_makers(config.snapshot.makers_path.as_deref()).await;
    let catalog = Catalog::from_records(&records, &Normalizer::with_makers(makers));
    info!(
        items = catalog.len(),
        skipped = records.len() - catalog.len(),
        "catalog ready"
    );
    Ok(catalog)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingSource {
        inner: StaticSnapshot,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl SnapshotSource for CountingSource {
        fn describe(&self) -> String {
            "counting".to_string()
        }

        async fn fetch(&self) -> Result<Value> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.inner.fetch().await
        }
    }

    struct FailingSource;

    #[async_trait]
    impl SnapshotSource for FailingSource {
        fn describe(&self) -> String {
            "failing".to_string()
        }

        async fn fetch(&self) -> Result<Value> {
            bail!("upstream unavailable")
        }
    }

    #[tokio::test]
    async fn test_cache_loads_once() {
        let source = CountingSource {
            inner: StaticSnapshot::new(json!([{ "fanza_product_id": "a" }])),
            calls: AtomicUsize::new(0),
        };
        let cache = SnapshotCache::new();
        assert!(!cache.is_loaded());

        let first = cache.get_or_load(&source).await;
        let second = cache.get_or_load(&source).await;
        assert_eq!(first.len(), 1);
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(source.calls.load(Ordering::SeqCst), 1);

        cache.clear();
        assert!(!cache.is_loaded());
        cache.get_or_load(&source).await;
        assert_eq!(source.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_unavailable_snapshot_is_empty() {
        assert!(load_records(&FailingSource).await.is_empty());
        assert!(load_records(&FileSnapshot::new("/nonexistent/works.json"))
            .await
            .is_empty());
        assert!(load_records(&StaticSnapshot::new(json!({ "rows": [] })))
            .await
            .is_empty());
    }

    #[tokio::test]
    async fn test_malformed_snapshot_file_is_empty() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("works.json");
        std::fs::write(&path, "[{\"fanza_product_id\": ").unwrap();
        assert!(load_records(&FileSnapshot::new(&path)).await.is_empty());
    }

    #[tokio::test]
    async fn test_build_catalog_with_makers() {
        let tmp = tempfile::TempDir::new().unwrap();
        let works = tmp.path().join("works.json");
        let makers = tmp.path().join("makers.json");
        std::fs::write(
            &works,
            r#"[{"fanza_product_id":"a","maker_id":3},{"fanza_product_id":"b"}]"#,
        )
        .unwrap();
        std::fs::write(&makers, r#"[{"id":3,"name":"Studio Three"}]"#).unwrap();

        let mut config = Config::minimal();
        config.snapshot.path = Some(works);
        config.snapshot.makers_path = Some(makers);

        let catalog = build_catalog(&config, &SnapshotCache::new()).await.unwrap();
        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.item_by_id("a").unwrap().maker, "Studio Three");
        assert_eq!(catalog.item_by_id("b").unwrap().maker, "");
    }

    #[tokio::test]
    async fn test_missing_makers_file_is_empty_directory() {
        let makers = load_makers(Some(Path::new("/nonexistent/makers.json"))).await;
        assert!(makers.is_empty());
        assert!(load_makers(None).await.is_empty());
    }
}
