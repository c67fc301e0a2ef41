//! File-system backend: loads `{{lng}}/{{ns}}.json` bundles and merges
//! missing keys into `{{lng}}/missing.json`.

use crate::i18n::error::{I18nError, Result};
use crate::i18n::metrics::TranslationMetrics;
use crate::i18n::options::BackendOptions;
use crate::i18n::store::set_nested;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Missing-key reports buffered before new ones are dropped.
pub const MISSING_QUEUE_CAPACITY: usize = 1024;

pub struct FsBackend {
    paths: BackendOptions,
    key_separator: String,
    read_permits: Semaphore,
    reads_in_flight: AtomicUsize,
    peak_reads: AtomicUsize,
}

/// Counts a read as in flight until dropped.
struct InFlight<'a>(&'a AtomicUsize);

impl<'a> InFlight<'a> {
    fn enter(counter: &'a AtomicUsize, peak: &AtomicUsize) -> Self {
        let now = counter.fetch_add(1, Ordering::SeqCst) + 1;
        peak.fetch_max(now, Ordering::SeqCst);
        Self(counter)
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

impl FsBackend {
    /// Create a backend allowing at most `max_parallel_reads` reads in flight.
    pub fn new(paths: BackendOptions, key_separator: &str, max_parallel_reads: usize) -> Self {
        Self {
            paths,
            key_separator: key_separator.to_string(),
            read_permits: Semaphore::new(max_parallel_reads.max(1)),
            reads_in_flight: AtomicUsize::new(0),
            peak_reads: AtomicUsize::new(0),
        }
    }

    pub fn paths(&self) -> &BackendOptions {
        &self.paths
    }

    /// Highest number of reads that were in flight at the same time.
    pub fn peak_parallel_reads(&self) -> usize {
        self.peak_reads.load(Ordering::SeqCst)
    }

    /// Read one bundle.
    ///
    /// Returns `Ok(None)` when the file does not exist. Any other read error,
    /// invalid JSON, or a top-level value that is not an object is an error.
    pub async fn read(&self, lng: &str, ns: &str) -> Result<Option<Value>> {
        let path = self.paths.load_path_for(lng, ns);
        let _permit = self.read_permits.acquire().await.map_err(|_| I18nError::BackendIo {
            path: path.clone(),
            source: std::io::Error::new(std::io::ErrorKind::Other, "backend closed"),
        })?;
        let _in_flight = InFlight::enter(&self.reads_in_flight, &self.peak_reads);

        debug!("Reading {}", path.display());
        let content = match tokio::fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(source) => return Err(I18nError::BackendIo { path, source }),
        };

        parse_bundle(&path, &content).map(Some)
    }

    /// Merge missing keys into the report file for `lng`.
    ///
    /// Existing values are kept unless `overwrite` is set. The file is
    /// rewritten once, through a temporary file renamed over it, and only
    /// when something changed. Returns the number of keys added or replaced.
    pub async fn save_missing(
        &self,
        lng: &str,
        ns: &str,
        entries: &[(String, Value)],
        overwrite: bool,
    ) -> Result<usize> {
        let path = self.paths.add_path_for(lng, ns);

        let mut report = match tokio::fs::read_to_string(&path).await {
            Ok(content) if content.trim().is_empty() => Map::new(),
            Ok(content) => match parse_bundle(&path, &content)? {
                Value::Object(map) => map,
                _ => Map::new(),
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Map::new(),
            Err(source) => return Err(I18nError::BackendIo { path, source }),
        };

        let mut changed = 0;
        for (key, value) in entries {
            if set_nested(&mut report, key, &self.key_separator, value.clone(), overwrite) {
                changed += 1;
            }
        }
        if changed == 0 {
            return Ok(0);
        }

        let serialized = serde_json::to_string_pretty(&Value::Object(report)).map_err(|e| {
            I18nError::MalformedResource {
                path: path.clone(),
                message: e.to_string(),
            }
        })?;

        let staging = staging_path(&path);
        tokio::fs::write(&staging, serialized + "\n")
            .await
            .map_err(|source| I18nError::BackendIo {
                path: staging.clone(),
                source,
            })?;
        if let Err(source) = tokio::fs::rename(&staging, &path).await {
            let _ = tokio::fs::remove_file(&staging).await;
            return Err(I18nError::BackendIo { path, source });
        }

        Ok(changed)
    }
}

/// `dir/.missing.json.tmp` for `dir/missing.json`.
fn staging_path(path: &Path) -> PathBuf {
    let mut name = OsString::from(".");
    name.push(path.file_name().unwrap_or_default());
    name.push(".tmp");
    path.with_file_name(name)
}

fn parse_bundle(path: &Path, content: &str) -> Result<Value> {
    let value: Value =
        serde_json::from_str(content).map_err(|e| I18nError::MalformedResource {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

    if !value.is_object() {
        return Err(I18nError::MalformedResource {
            path: path.to_path_buf(),
            message: "top-level value must be a JSON object".to_string(),
        });
    }
    Ok(value)
}

/// A key that was looked up but not found.
#[derive(Debug, Clone, PartialEq)]
pub struct MissingKey {
    /// Languages whose report receives the key (directory names)
    pub languages: Vec<String>,
    pub namespace: String,
    pub key: String,
    pub fallback_value: Value,
}

/// Sending side of the missing-key writer.
#[derive(Clone)]
pub struct MissingKeyQueue {
    tx: mpsc::Sender<MissingKey>,
    metrics: Arc<TranslationMetrics>,
}

impl MissingKeyQueue {
    /// Queue a report without waiting. Returns false when it was dropped
    /// because the queue is full or the writer has stopped.
    pub fn report(&self, missing: MissingKey) -> bool {
        match self.tx.try_send(missing) {
            Ok(()) => true,
            Err(TrySendError::Full(missing)) => {
                self.metrics.record_missing_dropped();
                warn!(
                    "Missing-key queue full; dropping report for {}:{}",
                    missing.namespace, missing.key
                );
                false
            }
            Err(TrySendError::Closed(missing)) => {
                warn!(
                    "Missing-key writer is gone; dropping report for {}:{}",
                    missing.namespace, missing.key
                );
                false
            }
        }
    }
}

/// Start the task that writes missing keys through `backend`.
///
/// Whatever is queued when the task wakes up is written as one batch, with
/// a single rewrite per report file. Report files are never written
/// concurrently. The task ends once every queue handle is dropped and the
/// queue is drained.
pub fn spawn_missing_writer(
    backend: Arc<FsBackend>,
    metrics: Arc<TranslationMetrics>,
    overwrite: bool,
    capacity: usize,
) -> (MissingKeyQueue, JoinHandle<()>) {
    let capacity = capacity.max(1);
    let (tx, mut rx) = mpsc::channel::<MissingKey>(capacity);
    let queue = MissingKeyQueue {
        tx,
        metrics: Arc::clone(&metrics),
    };

    let handle = tokio::spawn(async move {
        while let Some(first) = rx.recv().await {
            let mut batch = vec![first];
            while batch.len() < capacity {
                match rx.try_recv() {
                    Ok(next) => batch.push(next),
                    Err(_) => break,
                }
            }
            write_batch(&backend, &metrics, batch, overwrite).await;
        }
        debug!("Missing-key writer stopped");
    });

    (queue, handle)
}

struct PendingReport {
    lng: String,
    ns: String,
    entries: Vec<(String, Value)>,
}

async fn write_batch(
    backend: &FsBackend,
    metrics: &TranslationMetrics,
    batch: Vec<MissingKey>,
    overwrite: bool,
) {
    let mut files: BTreeMap<PathBuf, PendingReport> = BTreeMap::new();
    for missing in batch {
        for lng in &missing.languages {
            let path = backend.paths().add_path_for(lng, &missing.namespace);
            files
                .entry(path)
                .or_insert_with(|| PendingReport {
                    lng: lng.clone(),
                    ns: missing.namespace.clone(),
                    entries: Vec::new(),
                })
                .entries
                .push((missing.key.clone(), missing.fallback_value.clone()));
        }
    }

    for report in files.into_values() {
        match backend
            .save_missing(&report.lng, &report.ns, &report.entries, overwrite)
            .await
        {
            Ok(changed) => {
                metrics.record_missing_saved(changed);
                debug!("Saved {} missing key(s) for {}", changed, report.lng);
            }
            Err(e) => {
                metrics.record_backend_failure();
                warn!(
                    "Failed to save {} missing key(s) for {}: {}",
                    report.entries.len(),
                    report.lng,
                    e
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn backend_for(root: &TempDir) -> FsBackend {
        FsBackend::new(BackendOptions::for_root(root.path()), ".", 10)
    }

    fn entry(key: &str) -> (String, Value) {
        (key.to_string(), json!(key))
    }

    fn missing(key: &str, languages: &[&str]) -> MissingKey {
        MissingKey {
            languages: languages.iter().map(|l| l.to_string()).collect(),
            namespace: "app".to_string(),
            key: key.to_string(),
            fallback_value: json!(key),
        }
    }

    fn read_report(root: &TempDir, lng: &str) -> Value {
        let content = std::fs::read_to_string(root.path().join(lng).join("missing.json")).unwrap();
        serde_json::from_str(&content).unwrap()
    }

    #[tokio::test]
    async fn test_read_bundle() {
        let root = TempDir::new().unwrap();
        std::fs::create_dir(root.path().join("en")).unwrap();
        std::fs::write(root.path().join("en/app.json"), r#"{"title":"Hello"}"#).unwrap();

        let bundle = backend_for(&root).read("en", "app").await.unwrap();
        assert_eq!(bundle, Some(json!({ "title": "Hello" })));
    }

    #[tokio::test]
    async fn test_read_missing_file_is_none() {
        let root = TempDir::new().unwrap();
        std::fs::create_dir(root.path().join("en")).unwrap();

        let bundle = backend_for(&root).read("en", "info").await.unwrap();
        assert!(bundle.is_none());
    }

    #[tokio::test]
    async fn test_read_malformed_json() {
        let root = TempDir::new().unwrap();
        std::fs::create_dir(root.path().join("en")).unwrap();
        std::fs::write(root.path().join("en/app.json"), "{ not json").unwrap();

        let err = backend_for(&root).read("en", "app").await.unwrap_err();
        assert!(matches!(err, I18nError::MalformedResource { .. }));
    }

    #[tokio::test]
    async fn test_read_rejects_non_object() {
        let root = TempDir::new().unwrap();
        std::fs::create_dir(root.path().join("en")).unwrap();
        std::fs::write(root.path().join("en/app.json"), r#"["a","b"]"#).unwrap();

        let err = backend_for(&root).read("en", "app").await.unwrap_err();
        assert!(err.to_string().contains("JSON object"));
    }

    #[tokio::test]
    async fn test_parallel_reads_stay_within_bound() {
        let root = TempDir::new().unwrap();
        let languages: Vec<String> = (0..12).map(|i| format!("l{}", i)).collect();
        for lng in &languages {
            std::fs::create_dir(root.path().join(lng)).unwrap();
            for ns in ["app", "info"] {
                std::fs::write(root.path().join(lng).join(format!("{}.json", ns)), r#"{"k":"v"}"#)
                    .unwrap();
            }
        }
        let backend = FsBackend::new(BackendOptions::for_root(root.path()), ".", 3);

        let pairs: Vec<(&str, &str)> = languages
            .iter()
            .flat_map(|lng| ["app", "info"].map(move |ns| (lng.as_str(), ns)))
            .collect();
        let reads = pairs.iter().map(|(lng, ns)| backend.read(lng, ns));
        let results = futures::future::join_all(reads).await;

        assert_eq!(results.len(), 24);
        assert!(results.iter().all(|r| matches!(r, Ok(Some(_)))));
        let peak = backend.peak_parallel_reads();
        assert!((1..=3).contains(&peak), "peak was {}", peak);
        assert_eq!(backend.reads_in_flight.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_save_missing_writes_nested_keys() {
        let root = TempDir::new().unwrap();
        std::fs::create_dir(root.path().join("en")).unwrap();
        let backend = backend_for(&root);

        let changed = backend
            .save_missing("en", "app", &[entry("menu.settings"), entry("menu.logout")], false)
            .await
            .unwrap();
        assert_eq!(changed, 2);

        assert_eq!(
            read_report(&root, "en"),
            json!({ "menu": { "settings": "menu.settings", "logout": "menu.logout" } })
        );
        assert!(!root.path().join("en/.missing.json.tmp").exists());
    }

    #[tokio::test]
    async fn test_save_missing_keeps_existing_value() {
        let root = TempDir::new().unwrap();
        std::fs::create_dir(root.path().join("en")).unwrap();
        std::fs::write(root.path().join("en/missing.json"), r#"{"greeting":"Hi"}"#).unwrap();
        let backend = backend_for(&root);

        let changed = backend
            .save_missing("en", "app", &[entry("greeting"), entry("title")], false)
            .await
            .unwrap();
        assert_eq!(changed, 1);

        let report = read_report(&root, "en");
        assert_eq!(report["greeting"], json!("Hi"));
        assert_eq!(report["title"], json!("title"));
    }

    #[tokio::test]
    async fn test_save_missing_replaces_stale_staging_file() {
        let root = TempDir::new().unwrap();
        std::fs::create_dir(root.path().join("en")).unwrap();
        std::fs::write(root.path().join("en/.missing.json.tmp"), "{ half writ").unwrap();

        backend_for(&root)
            .save_missing("en", "app", &[entry("title")], false)
            .await
            .unwrap();

        assert_eq!(read_report(&root, "en"), json!({ "title": "title" }));
        assert!(!root.path().join("en/.missing.json.tmp").exists());
    }

    #[tokio::test]
    async fn test_save_missing_fails_without_language_directory() {
        let root = TempDir::new().unwrap();
        let err = backend_for(&root)
            .save_missing("xx", "app", &[entry("key")], false)
            .await
            .unwrap_err();
        assert_eq!(err.io_kind(), Some(std::io::ErrorKind::NotFound));
    }

    #[tokio::test]
    async fn test_writer_drains_queue_before_stopping() {
        let root = TempDir::new().unwrap();
        std::fs::create_dir(root.path().join("en")).unwrap();
        std::fs::create_dir(root.path().join("fr")).unwrap();
        let backend = Arc::new(backend_for(&root));
        let metrics = Arc::new(TranslationMetrics::new());

        let (queue, handle) = spawn_missing_writer(backend, Arc::clone(&metrics), false, 16);
        for key in ["one", "two", "three", "two"] {
            assert!(queue.report(missing(key, &["en", "fr"])));
        }
        drop(queue);
        handle.await.unwrap();

        assert_eq!(metrics.missing_saved(), 6);
        assert_eq!(
            read_report(&root, "fr"),
            json!({ "one": "one", "two": "two", "three": "three" })
        );
    }

    #[tokio::test]
    async fn test_full_queue_drops_reports() {
        let root = TempDir::new().unwrap();
        std::fs::create_dir(root.path().join("en")).unwrap();
        let backend = Arc::new(backend_for(&root));
        let metrics = Arc::new(TranslationMetrics::new());

        // The writer task cannot run before the first await on this runtime.
        let (queue, handle) = spawn_missing_writer(backend, Arc::clone(&metrics), false, 2);
        assert!(queue.report(missing("a", &["en"])));
        assert!(queue.report(missing("b", &["en"])));
        assert!(!queue.report(missing("c", &["en"])));
        drop(queue);
        handle.await.unwrap();

        assert_eq!(metrics.missing_dropped(), 1);
        assert_eq!(metrics.missing_saved(), 2);
        assert_eq!(read_report(&root, "en"), json!({ "a": "a", "b": "b" }));
    }
}
