use async_trait::async_trait;
use bytes::Bytes;

use crate::checkpoint::Checkpoint;
use crate::error::CollaboratorError;
use crate::model::Document;

/// `(source_id, external_id)`, the Persistence actor's idempotency key
/// (§4.3).
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct StorageKey {
    pub source_id: String,
    pub external_id: String,
}

impl StorageKey {
    pub fn new(source_id: impl Into<String>, external_id: impl Into<String>) -> Self {
        StorageKey {
            source_id: source_id.into(),
            external_id: external_id.into(),
        }
    }
}

/// §6 Storage collaborator. The filesystem/object-store/SQL backends
/// themselves are out of scope (§1); only this interface belongs to the
/// core.
#[async_trait]
pub trait Storage: Send + Sync {
    async fn save(&self, key: &StorageKey, record: &Document) -> Result<(), CollaboratorError>;
    async fn exists(&self, key: &StorageKey) -> Result<bool, CollaboratorError>;
    async fn load_checkpoint(
        &self,
        session_id: &str,
    ) -> Result<Option<Checkpoint>, CollaboratorError>;
    async fn save_checkpoint(&self, checkpoint: &Checkpoint) -> Result<(), CollaboratorError>;
}

/// §6 Object-store collaborator, used only when `download_payloads` raw
/// blobs (PDF/HTML) are written alongside the structured record.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    async fn put(&self, path: &str, bytes: Bytes) -> Result<String, CollaboratorError>;
}
