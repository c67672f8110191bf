// Embedding providers
//
// - OpenAI: OpenAI-compatible `/embeddings` client with retry on 429/5xx

pub mod openai;

use std::sync::Arc;

use async_trait::async_trait;

pub use openai::OpenAiEmbedder;

use crate::config::EmbeddingConfig;
use crate::error::Result;

/// Converts strings into fixed-length vectors, one per input, order-preserving.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    async fn embed(&self, inputs: &[String]) -> Result<Vec<Vec<f32>>>;
}

/// Factory for creating embedding provider instances
pub struct EmbeddingProviderFactory;

impl EmbeddingProviderFactory {
    pub fn create_provider(config: &EmbeddingConfig) -> Result<Arc<dyn EmbeddingProvider>> {
        Ok(Arc::new(OpenAiEmbedder::new(config)?))
    }
}
