// Remote translation store
//
// - Types: validated wire records and catalogue flattening
// - Client: reqwest implementation against the Weblate REST API

pub mod client;
pub mod types;

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;

pub use client::WeblateClient;
pub use types::*;

use crate::config::{Selection, WeblateConfig};
use crate::error::Result;

/// Read/write access to the units of one Weblate project.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TranslationStore: Send + Sync {
    /// All units of the selection matching a Weblate search query, in remote order.
    async fn fetch_units(&self, selection: &Selection, query: &str) -> Result<Vec<UnitRecord>>;

    /// Set a unit's target strings and mark it translated.
    async fn submit_translation(&self, unit_id: u64, translation: &[String]) -> Result<()>;

    /// Full `key -> text` dump of one language, optionally filtered by a query.
    async fn fetch_catalogue(
        &self,
        selection: &Selection,
        language: &str,
        query: Option<&'static str>,
    ) -> Result<BTreeMap<String, String>>;
}

/// Factory for creating translation store instances
pub struct TranslationStoreFactory;

impl TranslationStoreFactory {
    pub fn create_store(config: WeblateConfig) -> Result<Arc<dyn TranslationStore>> {
        Ok(Arc::new(WeblateClient::new(config)?))
    }
}
