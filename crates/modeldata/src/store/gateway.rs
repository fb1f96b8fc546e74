use crate::error::Result;
use crate::record::Record;
use async_trait::async_trait;

/// Abstract interface for whole-collection storage I/O.
/// This trait handles the "how" of storage (filesystem vs memory),
/// while `CollectionCache` handles the "what" (replica, bounds, status).
#[async_trait]
pub trait StorageGateway: Send + Sync {
    /// Read the full ordered record sequence stored under `name`.
    /// Missing, corrupt and unreadable collections are all errors; callers
    /// do not distinguish them.
    async fn read_collection(&self, name: &str) -> Result<Vec<Record>>;

    /// Replace the whole record sequence stored under `name`.
    /// MUST be atomic: afterwards either the new sequence is visible or the
    /// previous one still is, never a mixture.
    async fn write_collection(&self, name: &str, records: &[Record]) -> Result<()>;
}

#[async_trait]
impl<G: StorageGateway + ?Sized> StorageGateway for std::sync::Arc<G> {
    async fn read_collection(&self, name: &str) -> Result<Vec<Record>> {
        (**self).read_collection(name).await
    }

    async fn write_collection(&self, name: &str, records: &[Record]) -> Result<()> {
        (**self).write_collection(name, records).await
    }
}
