use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Client, Response};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::config::{Selection, WeblateConfig};
use crate::error::{AssistError, Result};
use super::{TranslationStore, UnitListPage, UnitPatch, UnitRecord, flatten_catalogue};

/// Weblate REST API client
pub struct WeblateClient {
    client: Client,
    endpoint: String,
}

impl WeblateClient {
    pub fn new(config: WeblateConfig) -> Result<Self> {
        if config.api_key.trim().is_empty() {
            return Err(AssistError::ConfigMissing("weblate api_key is not set".to_string()));
        }

        let mut headers = HeaderMap::new();
        let auth = format!("Token {}", config.api_key.trim());
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&auth)
                .map_err(|e| AssistError::Config(format!("Invalid Weblate API key: {}", e)))?,
        );
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let client = Client::builder()
            .timeout(Duration::from_secs(60))
            .default_headers(headers)
            .build()?;

        Ok(Self {
            client,
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
        })
    }

    fn translation_url(&self, selection: &Selection, language: &str, tail: &str) -> String {
        format!(
            "{}/translations/{}/{}/{}/{}/",
            self.endpoint, selection.project, selection.component, language, tail
        )
    }

    /// Turn a non-success response into `AssistError::Remote`.
    async fn check(response: Response) -> Result<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(AssistError::Remote {
            status: status.as_u16(),
            body,
        })
    }
}

#[async_trait]
impl TranslationStore for WeblateClient {
    async fn fetch_units(&self, selection: &Selection, query: &str) -> Result<Vec<UnitRecord>> {
        selection.ensure_complete()?;

        let first = self.translation_url(selection, &selection.language, "units");
        let mut request = self.client.get(&first).query(&[("q", query)]);
        let mut units = Vec::new();
        let mut pages = 0usize;

        loop {
            debug!("Fetching unit page {} for {}/{}", pages + 1, selection.project, selection.component);
            let response = Self::check(request.send().await?).await?;
            let page: UnitListPage = response.json().await?;
            pages += 1;

            for raw in page.results {
                let id = raw.id;
                match UnitRecord::try_from(raw) {
                    Ok(unit) => units.push(unit),
                    Err(e) => warn!("Skipping malformed unit {}: {}", id, e),
                }
            }

            match page.next {
                Some(next) if !next.is_empty() => {
                    // `next` already carries the query string
                    request = self.client.get(next);
                }
                _ => break,
            }
        }

        info!("Fetched {} units matching '{}' across {} page(s)", units.len(), query, pages);
        Ok(units)
    }

    async fn submit_translation(&self, unit_id: u64, translation: &[String]) -> Result<()> {
        let url = format!("{}/units/{}/", self.endpoint, unit_id);
        debug!("Submitting translation for unit {} to {}", unit_id, url);

        let response = self.client
            .patch(&url)
            .json(&UnitPatch::translated(translation))
            .send()
            .await?;
        Self::check(response).await?;

        info!("Unit {} submitted as translated", unit_id);
        Ok(())
    }

    async fn fetch_catalogue(
        &self,
        selection: &Selection,
        language: &str,
        query: Option<&'static str>,
    ) -> Result<BTreeMap<String, String>> {
        selection.ensure_complete()?;

        let url = self.translation_url(selection, language, "file");
        let mut request = self.client.get(&url).query(&[("format", "json")]);
        if let Some(q) = query {
            request = request.query(&[("q", q)]);
        }

        debug!("Downloading {} catalogue from {} (filter: {:?})", language, url, query);
        let response = Self::check(request.send().await?).await?;
        let body: Value = response.json().await?;
        let catalogue = flatten_catalogue(&body)?;

        info!("Downloaded {} strings for language {}", catalogue.len(), language);
        Ok(catalogue)
    }
}
