//! OpenAI-compatible embedding client.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::EmbeddingConfig;
use crate::error::{AssistError, Result};
use super::EmbeddingProvider;

/// Embeddings client that talks to OpenAI-compatible `/embeddings` endpoints.
pub struct OpenAiEmbedder {
    client: Client,
    endpoint: String,
    model: String,
    max_retries: u32,
}

impl OpenAiEmbedder {
    pub fn new(config: &EmbeddingConfig) -> Result<Self> {
        if config.api_key.trim().is_empty() {
            return Err(AssistError::ConfigMissing("embedding api_key is not set".to_string()));
        }
        if config.model.trim().is_empty() {
            return Err(AssistError::ConfigMissing("embedding model is not set".to_string()));
        }

        let mut headers = HeaderMap::new();
        let auth = format!("Bearer {}", config.api_key.trim());
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&auth)
                .map_err(|e| AssistError::Config(format!("Invalid embedding API key: {}", e)))?,
        );
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .default_headers(headers)
            .build()?;

        Ok(Self {
            client,
            endpoint: format!("{}/embeddings", config.endpoint.trim_end_matches('/')),
            model: config.model.clone(),
            max_retries: config.max_retries.max(1),
        })
    }

    fn should_retry(status: StatusCode) -> bool {
        status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
    }

    fn retry_backoff(attempt: u32) -> Duration {
        let capped = attempt.min(5);
        Duration::from_millis(500 * (1 << capped))
    }
}

#[async_trait]
impl EmbeddingProvider for OpenAiEmbedder {
    async fn embed(&self, inputs: &[String]) -> Result<Vec<Vec<f32>>> {
        if inputs.is_empty() {
            return Ok(Vec::new());
        }

        let request = EmbeddingRequest {
            model: &self.model,
            input: inputs,
        };

        let mut attempt = 0u32;
        loop {
            debug!("Embedding {} inputs via {} (attempt {})", inputs.len(), self.endpoint, attempt + 1);
            let response = self.client
                .post(&self.endpoint)
                .json(&request)
                .send()
                .await
                .map_err(|e| AssistError::Provider(format!("Embedding request failed: {}", e)))?;

            let status = response.status();
            if status.is_success() {
                let parsed: EmbeddingResponse = response.json().await
                    .map_err(|e| AssistError::Provider(format!("Failed to parse embedding response: {}", e)))?;
                return parsed.into_vectors(inputs.len());
            }

            let body = response.text().await.unwrap_or_default();
            if Self::should_retry(status) && attempt + 1 < self.max_retries {
                attempt += 1;
                let wait = Self::retry_backoff(attempt);
                warn!("Embedding request returned {}, retrying in {:?}", status, wait);
                tokio::time::sleep(wait).await;
                continue;
            }

            return Err(AssistError::Provider(format!(
                "Embeddings request failed ({}): {}", status, body
            )));
        }
    }
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
    index: usize,
}

impl EmbeddingResponse {
    /// Order vectors by `index` and check there is exactly one per input.
    fn into_vectors(mut self, expected: usize) -> Result<Vec<Vec<f32>>> {
        self.data.sort_by_key(|entry| entry.index);
        if self.data.len() != expected {
            return Err(AssistError::Provider(format!(
                "Embedding API returned {} vectors for {} inputs",
                self.data.len(),
                expected
            )));
        }
        Ok(self.data.into_iter().map(|entry| entry.embedding).collect())
    }
}
