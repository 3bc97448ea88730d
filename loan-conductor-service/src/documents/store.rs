use async_trait::async_trait;
use tracing::debug;

/// Where uploaded documents end up. Returns the stored path.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn store(&self, path: &str, media_type: &str, data: &[u8]) -> anyhow::Result<String>;
}

/// Accepts every upload and keeps nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct DisabledDocumentStore;

#[async_trait]
impl DocumentStore for DisabledDocumentStore {
    async fn store(&self, path: &str, media_type: &str, data: &[u8]) -> anyhow::Result<String> {
        debug!(%path, %media_type, bytes = data.len(), "Document storage disabled, upload skipped");
        Ok(path.to_string())
    }
}
