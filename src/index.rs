//! Context index engine.
//!
//! Builds an embedding catalogue of every string in the project and answers
//! nearest-neighbour queries over it. A build computes all vectors first and
//! swaps the vector store only once every batch has succeeded.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::config::{EmbeddingConfig, Selection};
use crate::embedding::EmbeddingProvider;
use crate::error::{AssistError, Result};
use crate::similarity::rank_top_k;
use crate::store::{StoredEmbedding, VectorStore};
use crate::weblate::{QUERY_NOT_TRANSLATED, QUERY_TRANSLATED, TranslationStore};

pub const DEFAULT_TOP_K: usize = 5;

/// One indexed project string.
#[derive(Debug, Clone, PartialEq)]
pub struct EmbeddingRecord {
    pub key: String,
    pub source: String,
    pub translation: String,
    pub embedding: Option<Vec<f32>>,
}

impl From<StoredEmbedding> for EmbeddingRecord {
    fn from(stored: StoredEmbedding) -> Self {
        Self {
            key: stored.key,
            source: stored.source,
            translation: stored.translation,
            embedding: Some(stored.embedding),
        }
    }
}

/// Search result: a copy of the stored record plus its score.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchHit {
    pub record: EmbeddingRecord,
    pub similarity: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CatalogueStats {
    pub total: usize,
    pub translated: usize,
    pub to_translate: usize,
    pub percent_translated: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexState {
    Empty,
    Indexing,
    Ready,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexProgress {
    pub completed: usize,
    pub total: usize,
}

impl IndexProgress {
    /// Completion in percent, 100 when there was nothing to embed.
    pub fn percent(&self) -> f64 {
        if self.total == 0 {
            100.0
        } else {
            (self.completed * 100) as f64 / self.total as f64
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CostEstimate {
    pub characters: usize,
    pub million_tokens: f64,
    pub cost: f64,
}

impl CostEstimate {
    /// Dollar amount with 2 decimals above one cent, otherwise enough decimals to show it (max 5).
    pub fn format_cost(&self) -> String {
        if self.cost <= 0.0 {
            return "0.00".to_string();
        }
        if self.cost > 0.01 {
            return format!("{:.2}", self.cost);
        }
        let decimals = (-self.cost.log10().floor()).min(5.0) as usize;
        format!("{:.*}", decimals, self.cost)
    }
}

/// Size and price of embedding every source string once.
pub fn estimate_cost<'a, I>(sources: I, chars_per_token: f64, price_per_million_tokens: f64) -> CostEstimate
where
    I: IntoIterator<Item = &'a str>,
{
    let characters: usize = sources.into_iter().map(|s| s.chars().count()).sum();
    let million_tokens = characters as f64 / chars_per_token / 1e6;
    CostEstimate {
        characters,
        million_tokens,
        cost: million_tokens * price_per_million_tokens,
    }
}

#[derive(Debug, Clone)]
pub struct IndexSettings {
    pub source_language: String,
    /// Embedding model the vectors are built with.
    pub model: String,
    pub batch_size: usize,
    pub batch_delay: Duration,
    pub chars_per_token: f64,
    pub price_per_million_tokens: f64,
}

impl IndexSettings {
    pub fn from_config(config: &EmbeddingConfig, source_language: &str) -> Self {
        Self {
            source_language: source_language.to_string(),
            model: config.model.clone(),
            batch_size: config.batch_size.max(1),
            batch_delay: Duration::from_millis(config.batch_delay_ms),
            chars_per_token: config.chars_per_token,
            price_per_million_tokens: config.price_per_million_tokens,
        }
    }
}

pub struct ContextIndex {
    store: Arc<dyn TranslationStore>,
    embedder: Arc<dyn EmbeddingProvider>,
    vectors: Arc<dyn VectorStore>,
    settings: IndexSettings,
    catalogue: BTreeMap<String, EmbeddingRecord>,
    state: IndexState,
}

impl ContextIndex {
    /// Attach to a vector store; a non-empty store starts out `Ready`.
    pub async fn open(
        store: Arc<dyn TranslationStore>,
        embedder: Arc<dyn EmbeddingProvider>,
        vectors: Arc<dyn VectorStore>,
        settings: IndexSettings,
    ) -> Result<Self> {
        let stored = vectors.len().await?;
        let state = if stored > 0 { IndexState::Ready } else { IndexState::Empty };
        info!("Vector store holds {} records ({:?})", stored, state);

        Ok(Self {
            store,
            embedder,
            vectors,
            settings,
            catalogue: BTreeMap::new(),
            state,
        })
    }

    pub fn state(&self) -> IndexState {
        self.state
    }

    pub fn catalogue(&self) -> &BTreeMap<String, EmbeddingRecord> {
        &self.catalogue
    }

    /// Rebuild the catalogue from full source and target dumps of the selection.
    pub async fn refresh_catalogue(&mut self, selection: &Selection) -> Result<CatalogueStats> {
        selection.ensure_complete()?;

        let sources = self
            .store
            .fetch_catalogue(selection, &self.settings.source_language, None)
            .await?;
        let untranslated = self
            .store
            .fetch_catalogue(selection, &selection.language, Some(QUERY_NOT_TRANSLATED))
            .await?;
        let translated = self
            .store
            .fetch_catalogue(selection, &selection.language, Some(QUERY_TRANSLATED))
            .await?;

        self.catalogue = sources
            .into_iter()
            .map(|(key, source)| {
                let record = EmbeddingRecord {
                    translation: translated.get(&key).cloned().unwrap_or_default(),
                    key: key.clone(),
                    source,
                    embedding: None,
                };
                (key, record)
            })
            .collect();

        let total = self.catalogue.len();
        let stats = CatalogueStats {
            total,
            translated: translated.len(),
            to_translate: untranslated.len(),
            percent_translated: if total > 0 {
                translated.len() as f64 / total as f64 * 100.0
            } else {
                0.0
            },
        };

        info!(
            "Catalogue refreshed: {} strings, {} translated, {} to translate ({:.2}%)",
            stats.total, stats.translated, stats.to_translate, stats.percent_translated
        );
        Ok(stats)
    }

    pub fn estimate(&self) -> CostEstimate {
        estimate_cost(
            self.catalogue.values().map(|r| r.source.as_str()),
            self.settings.chars_per_token,
            self.settings.price_per_million_tokens,
        )
    }

    /// Embed the catalogue and replace the vector store with the result.
    ///
    /// Without `force`, vectors already stored for an unchanged source string are reused,
    /// as long as the store was built with the configured model.
    /// Any failure leaves the vector store and the index state as they were.
    pub async fn build_index(
        &mut self,
        force: bool,
        on_progress: &mut (dyn FnMut(IndexProgress) + Send),
    ) -> Result<usize> {
        if self.catalogue.is_empty() {
            return Err(AssistError::Catalogue("catalogue is empty, refresh it first".to_string()));
        }

        let previous = self.state;
        self.state = IndexState::Indexing;

        match self.run_build(force, on_progress).await {
            Ok(count) => {
                self.state = IndexState::Ready;
                Ok(count)
            }
            Err(e) => {
                warn!("Index build aborted: {}", e);
                self.state = previous;
                Err(e)
            }
        }
    }

    async fn run_build(
        &mut self,
        force: bool,
        on_progress: &mut (dyn FnMut(IndexProgress) + Send),
    ) -> Result<usize> {
        let mut vectors: HashMap<String, Vec<f32>> = HashMap::new();

        if !force {
            match self.vectors.stored_model().await? {
                // Vectors from another model live in a different space.
                Some(stored_model) if stored_model != self.settings.model => {
                    info!(
                        "Stored vectors were built with '{}', re-embedding everything with '{}'",
                        stored_model, self.settings.model
                    );
                }
                _ => {
                    for stored in self.vectors.load_all().await? {
                        let unchanged = self
                            .catalogue
                            .get(&stored.key)
                            .is_some_and(|record| record.source == stored.source);
                        if unchanged {
                            vectors.insert(stored.key, stored.embedding);
                        }
                    }
                    debug!("Reusing {} stored vectors", vectors.len());
                }
            }
        }

        let pending: Vec<(&String, &EmbeddingRecord)> = self
            .catalogue
            .iter()
            .filter(|(key, _)| !vectors.contains_key(*key))
            .collect();
        let total = pending.len();
        let batches = total.div_ceil(self.settings.batch_size);
        info!(
            "Embedding {} of {} strings in {} batch(es)",
            total,
            self.catalogue.len(),
            batches
        );

        let mut fresh: Vec<(String, Vec<f32>)> = Vec::with_capacity(total);
        for (batch, chunk) in pending.chunks(self.settings.batch_size).enumerate() {
            let inputs: Vec<String> = chunk.iter().map(|(_, record)| record.source.clone()).collect();

            let embedded = self
                .embedder
                .embed(&inputs)
                .await
                .map_err(|e| AssistError::PartialBatchFailure { batch, source: Box::new(e) })?;
            if embedded.len() != inputs.len() {
                return Err(AssistError::PartialBatchFailure {
                    batch,
                    source: Box::new(AssistError::Provider(format!(
                        "{} vectors for {} inputs",
                        embedded.len(),
                        inputs.len()
                    ))),
                });
            }

            fresh.extend(chunk.iter().map(|(key, _)| (*key).clone()).zip(embedded));
            on_progress(IndexProgress { completed: fresh.len(), total });

            if batch + 1 < batches && !self.settings.batch_delay.is_zero() {
                tokio::time::sleep(self.settings.batch_delay).await;
            }
        }
        if total == 0 {
            on_progress(IndexProgress { completed: 0, total: 0 });
        }

        vectors.extend(fresh);
        let rows: Vec<StoredEmbedding> = self
            .catalogue
            .values()
            .filter_map(|record| {
                vectors.get(&record.key).map(|embedding| StoredEmbedding {
                    key: record.key.clone(),
                    source: record.source.clone(),
                    translation: record.translation.clone(),
                    embedding: embedding.clone(),
                })
            })
            .collect();

        self.vectors.replace_all(rows).await?;

        let count = vectors.len();
        for (key, embedding) in vectors {
            if let Some(record) = self.catalogue.get_mut(&key) {
                record.embedding = Some(embedding);
            }
        }

        info!("Index build complete: {} records stored", count);
        Ok(count)
    }

    /// The `top_k` stored strings closest to `query`, best first.
    pub async fn search(&self, query: &str, top_k: usize) -> Result<Vec<SearchHit>> {
        if query.trim().is_empty() || top_k == 0 {
            return Ok(Vec::new());
        }

        let stored = self.vectors.load_all().await?;
        if stored.is_empty() {
            debug!("Search skipped: vector store is empty");
            return Ok(Vec::new());
        }

        let query_vector = self
            .embedder
            .embed(&[query.to_string()])
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| AssistError::Provider("no embedding returned for query".to_string()))?;

        let hits = rank_top_k(&query_vector, stored, top_k, |row| Some(row.embedding.as_slice()))
            .into_iter()
            .map(|(row, similarity)| SearchHit {
                record: row.into(),
                similarity,
            })
            .collect();
        Ok(hits)
    }
}
