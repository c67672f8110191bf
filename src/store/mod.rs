// Vector store
//
// - File: JSON document on disk, replaced by write-then-rename
// - Memory: process-local store used by tests and dry runs

pub mod file;
pub mod memory;

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub use file::JsonFileStore;
pub use memory::MemoryStore;

use crate::error::{AssistError, Result};

/// One persisted row: a catalogue string and its vector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredEmbedding {
    pub key: String,
    pub source: String,
    pub translation: String,
    pub embedding: Vec<f32>,
}

/// Durable keyed storage of embedded catalogue strings.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Every stored row, in insertion order.
    async fn load_all(&self) -> Result<Vec<StoredEmbedding>>;

    /// Atomically swap the whole content for `records`.
    async fn replace_all(&self, records: Vec<StoredEmbedding>) -> Result<()>;

    /// Embedding model that produced the stored vectors, when known.
    async fn stored_model(&self) -> Result<Option<String>>;

    async fn len(&self) -> Result<usize>;
}

/// Reject duplicate keys and mixed dimensionality before anything is written.
pub fn check_generation(records: &[StoredEmbedding]) -> Result<()> {
    let mut keys = std::collections::HashSet::with_capacity(records.len());
    let dimensions = records.first().map(|r| r.embedding.len());

    for record in records {
        if !keys.insert(record.key.as_str()) {
            return Err(AssistError::Store(format!("duplicate key '{}'", record.key)));
        }
        if Some(record.embedding.len()) != dimensions {
            return Err(AssistError::Store(format!(
                "key '{}' has {} dimensions, expected {}",
                record.key,
                record.embedding.len(),
                dimensions.unwrap_or_default()
            )));
        }
    }
    Ok(())
}

/// Factory for creating vector store instances
pub struct VectorStoreFactory;

impl VectorStoreFactory {
    pub fn create_store(path: PathBuf, model: &str) -> Arc<dyn VectorStore> {
        Arc::new(JsonFileStore::new(path, model))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(key: &str, dims: usize) -> StoredEmbedding {
        StoredEmbedding {
            key: key.to_string(),
            source: key.to_string(),
            translation: String::new(),
            embedding: vec![0.5; dims],
        }
    }

    #[test]
    fn test_check_generation() {
        assert!(check_generation(&[]).is_ok());
        assert!(check_generation(&[row("a", 3), row("b", 3)]).is_ok());
        assert!(matches!(check_generation(&[row("a", 3), row("a", 3)]), Err(AssistError::Store(_))));
        assert!(matches!(check_generation(&[row("a", 3), row("b", 4)]), Err(AssistError::Store(_))));
    }
}
