use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::error::{AssistError, Result};
use super::{StoredEmbedding, VectorStore, check_generation};

/// On-disk layout of one store generation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreDocument {
    pub model: String,
    pub dimensions: usize,
    pub built_at: DateTime<Utc>,
    pub records: Vec<StoredEmbedding>,
}

/// Vector store persisted as a single JSON document.
///
/// Writes go to a sibling temporary file that is renamed over the target,
/// so readers only ever see a complete generation.
pub struct JsonFileStore {
    path: PathBuf,
    model: String,
    write_lock: Mutex<()>,
}

impl JsonFileStore {
    pub fn new<P: AsRef<Path>>(path: P, model: &str) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            model: model.to_string(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn staging_path(&self) -> PathBuf {
        let mut name = self.path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    async fn read_document(&self) -> Result<Option<StoreDocument>> {
        if !tokio::fs::try_exists(&self.path).await? {
            return Ok(None);
        }

        let content = tokio::fs::read_to_string(&self.path).await?;
        let document: StoreDocument = serde_json::from_str(&content)
            .map_err(|e| AssistError::Store(format!("Failed to parse {}: {}", self.path.display(), e)))?;

        if document.model != self.model {
            warn!(
                "Vector store at {} was built with model '{}' but '{}' is configured",
                self.path.display(),
                document.model,
                self.model
            );
        }
        Ok(Some(document))
    }

    async fn write_document(&self, document: &StoreDocument) -> Result<()> {
        let _guard = self.write_lock.lock().await;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }

        let staging = self.staging_path();
        let content = serde_json::to_string(document)?;
        tokio::fs::write(&staging, content).await?;
        if let Err(e) = tokio::fs::rename(&staging, &self.path).await {
            let _ = tokio::fs::remove_file(&staging).await;
            return Err(e.into());
        }

        debug!("Wrote {} records to {}", document.records.len(), self.path.display());
        Ok(())
    }
}

#[async_trait]
impl VectorStore for JsonFileStore {
    async fn load_all(&self) -> Result<Vec<StoredEmbedding>> {
        Ok(self.read_document().await?.map(|d| d.records).unwrap_or_default())
    }

    async fn replace_all(&self, records: Vec<StoredEmbedding>) -> Result<()> {
        check_generation(&records)?;

        let document = StoreDocument {
            model: self.model.clone(),
            dimensions: records.first().map(|r| r.embedding.len()).unwrap_or(0),
            built_at: Utc::now(),
            records,
        };
        self.write_document(&document).await?;

        info!(
            "Vector store replaced: {} records, {} dimensions",
            document.records.len(),
            document.dimensions
        );
        Ok(())
    }

    async fn stored_model(&self) -> Result<Option<String>> {
        Ok(self.read_document().await?.map(|d| d.model))
    }

    async fn len(&self) -> Result<usize> {
        Ok(self.read_document().await?.map(|d| d.records.len()).unwrap_or(0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(key: &str, embedding: Vec<f32>) -> StoredEmbedding {
        StoredEmbedding {
            key: key.to_string(),
            source: format!("source {}", key),
            translation: format!("traduction {}", key),
            embedding,
        }
    }

    #[tokio::test]
    async fn test_missing_file_is_empty_store() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("embeddings.json"), "m");
        assert!(store.load_all().await.unwrap().is_empty());
        assert_eq!(store.len().await.unwrap(), 0);
        assert_eq!(store.stored_model().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_replace_then_load_preserves_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("embeddings.json");
        let store = JsonFileStore::new(&path, "text-embedding-ada-002");

        let records = vec![row("b", vec![0.0, 1.0]), row("a", vec![1.0, 0.0])];
        store.replace_all(records.clone()).await.unwrap();

        assert!(path.exists());
        assert!(!store.staging_path().exists());
        assert_eq!(store.load_all().await.unwrap(), records);
        assert_eq!(store.len().await.unwrap(), 2);

        let raw = std::fs::read_to_string(&path).unwrap();
        let document: StoreDocument = serde_json::from_str(&raw).unwrap();
        assert_eq!(document.dimensions, 2);
        assert_eq!(document.model, "text-embedding-ada-002");
    }

    #[tokio::test]
    async fn test_invalid_generation_keeps_previous_content() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("embeddings.json"), "m");
        let original = vec![row("a", vec![1.0, 0.0])];
        store.replace_all(original.clone()).await.unwrap();

        let mixed = vec![row("x", vec![1.0]), row("y", vec![1.0, 2.0])];
        assert!(store.replace_all(mixed).await.is_err());
        assert_eq!(store.load_all().await.unwrap(), original);
    }

    #[tokio::test]
    async fn test_stored_model_is_the_writer_model() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("embeddings.json");
        JsonFileStore::new(&path, "text-embedding-ada-002")
            .replace_all(vec![row("a", vec![1.0])])
            .await
            .unwrap();

        let reopened = JsonFileStore::new(&path, "text-embedding-3-small");
        assert_eq!(
            reopened.stored_model().await.unwrap().as_deref(),
            Some("text-embedding-ada-002")
        );
    }

    #[tokio::test]
    async fn test_corrupt_file_is_store_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("embeddings.json");
        std::fs::write(&path, "{not json").unwrap();
        let store = JsonFileStore::new(&path, "m");
        assert!(matches!(store.load_all().await, Err(AssistError::Store(_))));
    }
}
