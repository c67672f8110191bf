use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::error::Result;
use super::{StoredEmbedding, VectorStore, check_generation};

/// Vector store kept in process memory.
#[derive(Default)]
pub struct MemoryStore {
    records: RwLock<Vec<StoredEmbedding>>,
    model: Option<String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_records(records: Vec<StoredEmbedding>) -> Self {
        Self {
            records: RwLock::new(records),
            model: None,
        }
    }

    /// Label the content as produced by `model`.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }
}

#[async_trait]
impl VectorStore for MemoryStore {
    async fn load_all(&self) -> Result<Vec<StoredEmbedding>> {
        Ok(self.records.read().await.clone())
    }

    async fn replace_all(&self, records: Vec<StoredEmbedding>) -> Result<()> {
        check_generation(&records)?;
        *self.records.write().await = records;
        Ok(())
    }

    async fn stored_model(&self) -> Result<Option<String>> {
        if self.records.read().await.is_empty() {
            return Ok(None);
        }
        Ok(self.model.clone())
    }

    async fn len(&self) -> Result<usize> {
        Ok(self.records.read().await.len())
    }
}
