use crate::cache::CollectionCache;
use crate::record::Record;
use crate::store::fs::FsGateway;
use crate::store::mem::MemGateway;
use std::path::PathBuf;
use tempfile::TempDir;

/// A cache over a filesystem gateway rooted in a fresh temp directory.
pub struct TestEnv {
    // We keep _temp_dir to ensure the directory is not dropped until the test is done
    pub _temp_dir: TempDir,
    pub cache: CollectionCache<FsGateway>,
    pub root: PathBuf,
}

impl Default for TestEnv {
    fn default() -> Self {
        Self::new()
    }
}

impl TestEnv {
    pub fn new() -> Self {
        let temp_dir = tempfile::tempdir().expect("failed to create temp dir");
        let root = temp_dir.path().join("data");
        let cache = CollectionCache::new(FsGateway::new(root.clone()));
        Self {
            _temp_dir: temp_dir,
            cache,
            root,
        }
    }

    /// Path of the document backing `name`.
    pub fn document(&self, name: &str) -> PathBuf {
        self.root.join(format!("{}.json", name))
    }
}

/// Build a record from `(field, value)` pairs.
pub fn record<const N: usize>(fields: [(&str, serde_json::Value); N]) -> Record {
    fields
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect()
}

/// Records named `{prefix} 1` .. `{prefix} count`.
pub fn named_records(prefix: &str, count: usize) -> Vec<Record> {
    (1..=count)
        .map(|i| record([("name", serde_json::json!(format!("{} {}", prefix, i)))]))
        .collect()
}

/// An in-memory gateway seeded with `count` records under `name`.
pub fn seeded_gateway(name: &str, count: usize) -> MemGateway {
    MemGateway::new().with_collection(name, named_records("Item", count))
}
