use crate::{ChunkDocument, StoreError};
use async_trait::async_trait;

/// Document store addressed by index name and document id.
#[async_trait]
pub trait DocumentStore {
    /// Creates the index. An index that already exists is not an error.
    async fn ensure_index(&self) -> Result<(), StoreError>;

    async fn exists(&self, id: &str) -> Result<bool, StoreError>;

    /// Writes `document` under `id`, replacing any previous version.
    /// Rate limiting must surface as [`StoreError::Overloaded`].
    async fn upsert(&self, id: &str, document: &ChunkDocument) -> Result<(), StoreError>;
}
