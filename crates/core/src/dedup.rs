use crate::models::DocumentId;
use crate::traits::DocumentStore;
use std::sync::Arc;
use tracing::warn;

/// Decides whether a file was already indexed by probing one chunk id.
///
/// The probe is path based: a file whose content changes under the same path
/// keeps its id and is not indexed again.
pub struct DedupChecker<S> {
    store: Arc<S>,
    probe_ordinal: u32,
}

impl<S> DedupChecker<S>
where
    S: DocumentStore + Send + Sync,
{
    pub fn new(store: Arc<S>, probe_ordinal: u32) -> Self {
        Self {
            store,
            probe_ordinal,
        }
    }

    pub fn probe_id(&self, id: &DocumentId) -> String {
        id.chunk_id(self.probe_ordinal)
    }

    /// A failed probe counts as "not indexed" so the file is processed.
    pub async fn already_indexed(&self, id: &DocumentId) -> bool {
        let probe = self.probe_id(id);
        match self.store.exists(&probe).await {
            Ok(found) => found,
            Err(error) => {
                warn!(chunk_id = %probe, %error, "existence check failed");
                false
            }
        }
    }
}
