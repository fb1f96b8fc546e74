use super::gateway::StorageGateway;
use crate::error::{ModelDataError, Result};
use crate::record::{records_from_value, validate_collection_name, Record};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs;
use uuid::Uuid;

/// Filesystem gateway: one JSON document per collection.
///
/// `<data_dir>/<name>.json` holds a JSON array of objects. Writes go to a
/// uniquely named temp file in the same directory, which is then renamed over
/// the document, so readers see either the old or the new array.
pub struct FsGateway {
    data_dir: PathBuf,
    missing_as_empty: bool,
    pretty: bool,
}

impl FsGateway {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            missing_as_empty: false,
            pretty: true,
        }
    }

    /// Treat a collection with no document yet as an empty collection
    /// instead of a read failure.
    pub fn with_missing_as_empty(mut self, missing_as_empty: bool) -> Self {
        self.missing_as_empty = missing_as_empty;
        self
    }

    pub fn with_pretty(mut self, pretty: bool) -> Self {
        self.pretty = pretty;
        self
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Path of the document backing `name`.
    pub fn collection_path(&self, name: &str) -> Result<PathBuf> {
        validate_collection_name(name)?;
        Ok(self.data_dir.join(format!("{}.json", name)))
    }

    async fn ensure_dir(&self) -> Result<()> {
        fs::create_dir_all(&self.data_dir)
            .await
            .map_err(ModelDataError::Io)
    }

    async fn read_document(&self, name: &str) -> Result<Vec<Record>> {
        let path = self.collection_path(name)?;
        let content = match fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound && self.missing_as_empty => {
                return Ok(Vec::new());
            }
            Err(e) => return Err(ModelDataError::Io(e)),
        };
        let doc = serde_json::from_str(&content).map_err(ModelDataError::Serialization)?;
        records_from_value(doc)
    }

    async fn write_document(&self, name: &str, records: &[Record]) -> Result<()> {
        let path = self.collection_path(name)?;
        self.ensure_dir().await?;

        let content = if self.pretty {
            serde_json::to_string_pretty(records)
        } else {
            serde_json::to_string(records)
        }
        .map_err(ModelDataError::Serialization)?;

        let tmp_file = self
            .data_dir
            .join(format!(".{}-{}.tmp", name, Uuid::new_v4()));
        if let Err(e) = fs::write(&tmp_file, content).await {
            let _ = fs::remove_file(&tmp_file).await;
            return Err(ModelDataError::Io(e));
        }
        if let Err(e) = fs::rename(&tmp_file, &path).await {
            let _ = fs::remove_file(&tmp_file).await;
            return Err(ModelDataError::Io(e));
        }
        Ok(())
    }
}

#[async_trait]
impl StorageGateway for FsGateway {
    async fn read_collection(&self, name: &str) -> Result<Vec<Record>> {
        self.read_document(name)
            .await
            .map_err(|e| ModelDataError::read(name, e.to_string()))
    }

    async fn write_collection(&self, name: &str, records: &[Record]) -> Result<()> {
        self.write_document(name, records)
            .await
            .map_err(|e| ModelDataError::write(name, e.to_string()))
    }
}
