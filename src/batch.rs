//! Batch translation engine.
//!
//! Holds the untranslated units of one (project, component, language)
//! selection, pages through them, and drives the per-string
//! suggest / edit / validate cycle. Human corrections of machine
//! suggestions are turned into insights that feed the next suggestion.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::config::Selection;
use crate::error::{AssistError, Result};
use crate::llm::{InsightRequest, InsightSynthesizer, SuggestionProvider, SuggestionRequest};
use crate::weblate::{QUERY_UNTRANSLATED, TranslationStore, UnitRecord};

/// One translatable entry, possibly holding several plural forms.
#[derive(Debug, Clone, PartialEq)]
pub struct TranslationUnit {
    pub id: u64,
    pub source: Vec<String>,
    pub translation: Vec<String>,
    pub context: String,
    /// Whole translation array as of the last accepted suggestion.
    pub prefill: Option<Vec<String>>,
}

impl From<UnitRecord> for TranslationUnit {
    fn from(record: UnitRecord) -> Self {
        Self {
            id: record.id,
            source: record.source,
            translation: record.target,
            context: record.context,
            prefill: None,
        }
    }
}

impl TranslationUnit {
    /// True when the current translation differs from the last machine suggestion.
    /// A unit that never received a suggestion always counts as diverged.
    pub fn diverges_from_prefill(&self) -> bool {
        self.prefill.as_ref() != Some(&self.translation)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnitStatus {
    Pending,
    Suggested,
    Validated,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    Loaded(usize),
    /// Selection incomplete; nothing was fetched.
    Skipped,
}

/// Everything needed to finish a suggestion once the provider answers.
#[derive(Debug, Clone)]
pub struct SuggestionTicket {
    epoch: u64,
    unit_id: u64,
    sub_index: usize,
    pub request: SuggestionRequest,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PageSuggestReport {
    pub suggested: usize,
    pub failed: usize,
}

pub struct BatchEngine {
    store: Arc<dyn TranslationStore>,
    suggester: Arc<dyn SuggestionProvider>,
    synthesizer: Arc<dyn InsightSynthesizer>,
    model: String,
    selection: Option<Selection>,
    units: Vec<TranslationUnit>,
    status: HashMap<u64, UnitStatus>,
    page_index: usize,
    page_size: usize,
    insight_log: String,
    epoch: u64,
}

impl BatchEngine {
    pub fn new(
        store: Arc<dyn TranslationStore>,
        suggester: Arc<dyn SuggestionProvider>,
        synthesizer: Arc<dyn InsightSynthesizer>,
        model: impl Into<String>,
        page_size: usize,
    ) -> Result<Self> {
        if page_size == 0 {
            return Err(AssistError::Config("page size must be greater than 0".to_string()));
        }

        Ok(Self {
            store,
            suggester,
            synthesizer,
            model: model.into(),
            selection: None,
            units: Vec::new(),
            status: HashMap::new(),
            page_index: 0,
            page_size,
            insight_log: String::new(),
            epoch: 0,
        })
    }

    pub fn with_insights(mut self, insight_log: impl Into<String>) -> Self {
        self.insight_log = insight_log.into();
        self
    }

    /// Replace the unit list with every untranslated unit of `selection`.
    ///
    /// On a remote failure the current units are kept and the error is returned.
    pub async fn load_units(&mut self, selection: &Selection) -> Result<LoadOutcome> {
        if let Err(e) = selection.ensure_complete() {
            debug!("Not loading units: {}", e);
            return Ok(LoadOutcome::Skipped);
        }

        let records = self.store.fetch_units(selection, QUERY_UNTRANSLATED).await?;
        let count = records.len();

        if self.selection.as_ref().is_some_and(|previous| previous != selection) {
            info!("Selection changed, starting a fresh insight log");
            self.insight_log.clear();
        }

        self.units = records.into_iter().map(TranslationUnit::from).collect();
        self.status.clear();
        self.page_index = 0;
        self.epoch += 1;
        self.selection = Some(selection.clone());

        info!(
            "Loaded {} untranslated units for {}/{} ({})",
            count, selection.project, selection.component, selection.language
        );
        Ok(LoadOutcome::Loaded(count))
    }

    pub fn units(&self) -> &[TranslationUnit] {
        &self.units
    }

    pub fn insight_log(&self) -> &str {
        &self.insight_log
    }

    pub fn page_index(&self) -> usize {
        self.page_index
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn page_count(&self) -> usize {
        self.units.len().div_ceil(self.page_size)
    }

    pub fn status(&self, unit_id: u64) -> UnitStatus {
        self.status.get(&unit_id).copied().unwrap_or(UnitStatus::Pending)
    }

    fn page_start(&self) -> usize {
        self.page_index * self.page_size
    }

    pub fn current_page(&self) -> &[TranslationUnit] {
        let start = self.page_start().min(self.units.len());
        let end = (start + self.page_size).min(self.units.len());
        &self.units[start..end]
    }

    pub fn next_page(&mut self) -> bool {
        if self.page_index + 1 < self.page_count() {
            self.page_index += 1;
            true
        } else {
            false
        }
    }

    pub fn previous_page(&mut self) -> bool {
        if self.page_index > 0 {
            self.page_index -= 1;
            true
        } else {
            false
        }
    }

    /// Change the page size; units stay loaded, paging restarts at page 0.
    pub fn set_page_size(&mut self, page_size: usize) -> Result<()> {
        if page_size == 0 {
            return Err(AssistError::Config("page size must be greater than 0".to_string()));
        }
        self.page_size = page_size;
        self.page_index = 0;
        self.epoch += 1;
        Ok(())
    }

    /// Absolute index of a unit on the current page.
    fn unit_index(&self, local: usize) -> Result<usize> {
        let len = self.current_page().len();
        if local >= len {
            return Err(AssistError::OutOfRange { index: local, len });
        }
        Ok(self.page_start() + local)
    }

    fn field_index(&self, local: usize, sub_index: usize) -> Result<usize> {
        let index = self.unit_index(local)?;
        let len = self.units[index].translation.len();
        if sub_index >= len {
            return Err(AssistError::OutOfRange { index: sub_index, len });
        }
        Ok(index)
    }

    pub fn edit_field(&mut self, local: usize, sub_index: usize, value: impl Into<String>) -> Result<()> {
        let index = self.field_index(local, sub_index)?;
        self.units[index].translation[sub_index] = value.into();
        Ok(())
    }

    /// Capture what the provider needs for one field, tagged with the current epoch.
    pub fn prepare_suggestion(&self, local: usize, sub_index: usize) -> Result<SuggestionTicket> {
        let index = self.field_index(local, sub_index)?;
        let unit = &self.units[index];

        Ok(SuggestionTicket {
            epoch: self.epoch,
            unit_id: unit.id,
            sub_index,
            request: SuggestionRequest {
                sources: vec![unit.source[sub_index].clone()],
                model: self.model.clone(),
                insights: self.insight_log.clone(),
                unit_context: Some(unit.context.clone()).filter(|c| !c.is_empty()),
            },
        })
    }

    /// Write a provider answer into its unit and snapshot the whole translation as prefill.
    ///
    /// Returns false, changing nothing, when the ticket belongs to an older load or page size.
    pub fn apply_suggestion(&mut self, ticket: &SuggestionTicket, text: impl Into<String>) -> bool {
        if ticket.epoch != self.epoch {
            debug!("Dropping stale suggestion for unit {}", ticket.unit_id);
            return false;
        }
        let Some(unit) = self.units.iter_mut().find(|u| u.id == ticket.unit_id) else {
            return false;
        };
        let Some(slot) = unit.translation.get_mut(ticket.sub_index) else {
            return false;
        };

        *slot = text.into();
        unit.prefill = Some(unit.translation.clone());
        self.status.insert(unit.id, UnitStatus::Suggested);
        true
    }

    /// Ask the provider for one field. On failure nothing is modified.
    pub async fn suggest(&mut self, local: usize, sub_index: usize) -> Result<String> {
        let ticket = self.prepare_suggestion(local, sub_index)?;
        let text = self.suggester.suggest(&ticket.request).await?;

        if !self.apply_suggestion(&ticket, text.clone()) {
            return Err(AssistError::Provider("suggestion arrived for a stale selection".to_string()));
        }
        Ok(text)
    }

    /// Suggest every empty field on the current page, one request at a time.
    pub async fn suggest_page(&mut self) -> PageSuggestReport {
        let mut report = PageSuggestReport::default();
        let targets: Vec<(usize, usize)> = self
            .current_page()
            .iter()
            .enumerate()
            .flat_map(|(local, unit)| {
                unit.translation
                    .iter()
                    .enumerate()
                    .filter(|(_, text)| text.trim().is_empty())
                    .map(move |(sub, _)| (local, sub))
            })
            .collect();

        for (local, sub) in targets {
            match self.suggest(local, sub).await {
                Ok(_) => report.suggested += 1,
                Err(e) => {
                    warn!("Suggestion failed for page item {} field {}: {}", local, sub, e);
                    report.failed += 1;
                }
            }
        }

        info!("Page suggestions: {} filled, {} failed", report.suggested, report.failed);
        report
    }

    /// Submit a unit and, if the human changed the machine suggestion, learn an insight.
    ///
    /// Returns whether the submission succeeded. Insight failures are logged only.
    pub async fn validate(&mut self, local: usize) -> bool {
        let index = match self.unit_index(local) {
            Ok(index) => index,
            Err(e) => {
                warn!("Cannot validate: {}", e);
                return false;
            }
        };
        let unit = self.units[index].clone();

        if let Err(e) = self.store.submit_translation(unit.id, &unit.translation).await {
            warn!("Submitting unit {} failed: {}", unit.id, e);
            self.status.insert(unit.id, UnitStatus::Failed);
            return false;
        }
        self.status.insert(unit.id, UnitStatus::Validated);

        if unit.diverges_from_prefill() {
            let request = InsightRequest {
                prefill: unit
                    .prefill
                    .clone()
                    .unwrap_or_else(|| vec![String::new(); unit.source.len()]),
                source: unit.source,
                validated: unit.translation,
                model: self.model.clone(),
            };

            match self.synthesizer.synthesize(&request).await {
                Ok(insight) => {
                    self.insight_log.push('\n');
                    self.insight_log.push_str(&insight);
                }
                Err(e) => warn!("Insight synthesis for unit {} failed: {}", unit.id, e),
            }
        }

        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::{MockInsightSynthesizer, MockSuggestionProvider};
    use crate::weblate::MockTranslationStore;
    use std::sync::Mutex;

    fn record(id: u64, sources: &[&str]) -> UnitRecord {
        UnitRecord {
            id,
            source: sources.iter().map(|s| s.to_string()).collect(),
            target: vec![String::new(); sources.len()],
            context: String::new(),
        }
    }

    fn records(n: u64) -> Vec<UnitRecord> {
        (0..n).map(|i| record(i, &["text"])).collect()
    }

    fn selection() -> Selection {
        Selection::new("invokeai", "web-ui", "fr")
    }

    fn store_with(units: Vec<UnitRecord>) -> MockTranslationStore {
        let mut store = MockTranslationStore::new();
        store
            .expect_fetch_units()
            .withf(|_, query| query == QUERY_UNTRANSLATED)
            .returning(move |_, _| Ok(units.clone()));
        store
    }

    fn engine(
        store: MockTranslationStore,
        suggester: MockSuggestionProvider,
        synthesizer: MockInsightSynthesizer,
        page_size: usize,
    ) -> BatchEngine {
        BatchEngine::new(
            Arc::new(store),
            Arc::new(suggester),
            Arc::new(synthesizer),
            "openai/gpt-4o-mini",
            page_size,
        )
        .unwrap()
    }

    fn ids(units: &[TranslationUnit]) -> Vec<u64> {
        units.iter().map(|u| u.id).collect()
    }

    #[tokio::test]
    async fn test_seven_units_in_pages_of_three() {
        let mut engine = engine(
            store_with(records(7)),
            MockSuggestionProvider::new(),
            MockInsightSynthesizer::new(),
            3,
        );
        let outcome = engine.load_units(&selection()).await.unwrap();
        assert_eq!(outcome, LoadOutcome::Loaded(7));
        assert_eq!(engine.page_count(), 3);

        assert_eq!(ids(engine.current_page()), vec![0, 1, 2]);
        assert!(engine.next_page());
        assert_eq!(ids(engine.current_page()), vec![3, 4, 5]);
        assert!(engine.next_page());
        assert_eq!(ids(engine.current_page()), vec![6]);
        assert!(!engine.next_page());
        assert_eq!(engine.page_index(), 2);

        assert!(engine.previous_page());
        assert_eq!(engine.page_index(), 1);
    }

    #[tokio::test]
    async fn test_next_next_previous_lands_on_page_one() {
        let mut engine = engine(
            store_with(records(7)),
            MockSuggestionProvider::new(),
            MockInsightSynthesizer::new(),
            3,
        );
        engine.load_units(&selection()).await.unwrap();
        engine.next_page();
        engine.next_page();
        engine.previous_page();
        assert_eq!(engine.page_index(), 1);
    }

    #[tokio::test]
    async fn test_page_bounds_for_many_sizes() {
        for n in [0u64, 1, 2, 5, 9, 10, 11] {
            for page_size in [1usize, 3, 4, 10] {
                let mut engine = engine(
                    store_with(records(n)),
                    MockSuggestionProvider::new(),
                    MockInsightSynthesizer::new(),
                    page_size,
                );
                engine.load_units(&selection()).await.unwrap();
                let pages = (n as usize).div_ceil(page_size);
                assert_eq!(engine.page_count(), pages);

                assert!(!engine.previous_page());
                let mut seen = engine.current_page().len();
                while engine.next_page() {
                    seen += engine.current_page().len();
                }
                assert_eq!(seen, n as usize);
                assert_eq!(engine.page_index(), pages.saturating_sub(1));
                assert!(!engine.next_page());
            }
        }
    }

    #[tokio::test]
    async fn test_incomplete_selection_is_skipped() {
        let mut store = MockTranslationStore::new();
        store.expect_fetch_units().never();
        let mut engine = engine(store, MockSuggestionProvider::new(), MockInsightSynthesizer::new(), 3);

        let outcome = engine.load_units(&Selection::new("invokeai", "", "fr")).await.unwrap();
        assert_eq!(outcome, LoadOutcome::Skipped);
        assert!(engine.units().is_empty());
    }

    #[tokio::test]
    async fn test_remote_failure_keeps_previous_units() {
        let mut store = MockTranslationStore::new();
        let mut seq = mockall::Sequence::new();
        store
            .expect_fetch_units()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Ok(records(4)));
        store
            .expect_fetch_units()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Err(AssistError::Remote { status: 503, body: "down".to_string() }));

        let mut engine = engine(store, MockSuggestionProvider::new(), MockInsightSynthesizer::new(), 3);
        engine.load_units(&selection()).await.unwrap();
        engine.next_page();

        let err = engine.load_units(&selection()).await.unwrap_err();
        assert!(matches!(err, AssistError::Remote { status: 503, .. }));
        assert_eq!(engine.units().len(), 4);
        assert_eq!(engine.page_index(), 1);
    }

    #[tokio::test]
    async fn test_edit_field_keeps_shape() {
        let mut engine = engine(
            store_with(vec![record(1, &["One file", "{count} files"])]),
            MockSuggestionProvider::new(),
            MockInsightSynthesizer::new(),
            3,
        );
        engine.load_units(&selection()).await.unwrap();

        engine.edit_field(0, 1, "{count} fichiers").unwrap();
        engine.edit_field(0, 0, "").unwrap();
        let unit = &engine.current_page()[0];
        assert_eq!(unit.translation, vec!["".to_string(), "{count} fichiers".to_string()]);
        assert_eq!(unit.translation.len(), unit.source.len());

        assert!(matches!(engine.edit_field(0, 2, "x"), Err(AssistError::OutOfRange { .. })));
        assert!(matches!(engine.edit_field(1, 0, "x"), Err(AssistError::OutOfRange { .. })));
        assert_eq!(engine.current_page()[0].translation.len(), 2);
    }

    #[tokio::test]
    async fn test_suggest_writes_field_and_snapshots_whole_unit() {
        let mut suggester = MockSuggestionProvider::new();
        suggester
            .expect_suggest()
            .withf(|req| req.sources == vec!["{count} files".to_string()] && req.insights == "Use tu")
            .times(1)
            .returning(|_| Ok("{count} fichiers".to_string()));

        let mut engine = engine(
            store_with(vec![record(1, &["One file", "{count} files"])]),
            suggester,
            MockInsightSynthesizer::new(),
            3,
        )
        .with_insights("Use tu");
        engine.load_units(&selection()).await.unwrap();
        engine.edit_field(0, 0, "Un fichier").unwrap();

        let text = engine.suggest(0, 1).await.unwrap();
        assert_eq!(text, "{count} fichiers");

        let unit = &engine.current_page()[0];
        let expected = vec!["Un fichier".to_string(), "{count} fichiers".to_string()];
        assert_eq!(unit.translation, expected);
        assert_eq!(unit.prefill.as_ref(), Some(&expected));
        assert_eq!(engine.status(1), UnitStatus::Suggested);
    }

    #[tokio::test]
    async fn test_suggest_failure_changes_nothing() {
        let mut suggester = MockSuggestionProvider::new();
        suggester
            .expect_suggest()
            .returning(|_| Err(AssistError::Provider("No translation returned".to_string())));

        let mut engine = engine(
            store_with(vec![record(1, &["Save"])]),
            suggester,
            MockInsightSynthesizer::new(),
            3,
        );
        engine.load_units(&selection()).await.unwrap();
        engine.edit_field(0, 0, "Sauver").unwrap();

        assert!(engine.suggest(0, 0).await.is_err());
        let unit = &engine.current_page()[0];
        assert_eq!(unit.translation, vec!["Sauver".to_string()]);
        assert_eq!(unit.prefill, None);
        assert_eq!(engine.status(1), UnitStatus::Pending);
    }

    #[tokio::test]
    async fn test_stale_ticket_is_dropped() {
        let mut engine = engine(
            store_with(records(4)),
            MockSuggestionProvider::new(),
            MockInsightSynthesizer::new(),
            2,
        );
        engine.load_units(&selection()).await.unwrap();

        let ticket = engine.prepare_suggestion(0, 0).unwrap();
        engine.set_page_size(3).unwrap();
        assert!(!engine.apply_suggestion(&ticket, "late"));
        assert_eq!(engine.units()[0].translation, vec![String::new()]);

        let fresh = engine.prepare_suggestion(0, 0).unwrap();
        engine.edit_field(0, 0, "typed meanwhile").unwrap();
        assert!(engine.apply_suggestion(&fresh, "texte"));
        assert_eq!(engine.units()[0].translation, vec!["texte".to_string()]);
    }

    #[tokio::test]
    async fn test_validate_with_correction_synthesizes_once() {
        let mut suggester = MockSuggestionProvider::new();
        suggester.expect_suggest().returning(|_| Ok("Bonjour".to_string()));

        let mut store = store_with(vec![record(42, &["Hello"])]);
        store
            .expect_submit_translation()
            .withf(|id, translation| *id == 42 && translation == ["Salut".to_string()])
            .times(1)
            .returning(|_, _| Ok(()));

        let mut synthesizer = MockInsightSynthesizer::new();
        synthesizer
            .expect_synthesize()
            .withf(|req| {
                req.source == vec!["Hello".to_string()]
                    && req.prefill == vec!["Bonjour".to_string()]
                    && req.validated == vec!["Salut".to_string()]
            })
            .times(1)
            .returning(|_| Ok("Prefer informal greetings".to_string()));

        let mut engine = engine(store, suggester, synthesizer, 3).with_insights("Keep it short");
        engine.load_units(&selection()).await.unwrap();
        engine.suggest(0, 0).await.unwrap();
        engine.edit_field(0, 0, "Salut").unwrap();

        assert!(engine.validate(0).await);
        assert_eq!(engine.insight_log(), "Keep it short\nPrefer informal greetings");
        assert_eq!(engine.status(42), UnitStatus::Validated);
    }

    #[tokio::test]
    async fn test_validate_accepted_suggestion_skips_insight() {
        let mut suggester = MockSuggestionProvider::new();
        suggester.expect_suggest().returning(|_| Ok("Bonjour".to_string()));

        let mut store = store_with(vec![record(42, &["Hello"])]);
        store.expect_submit_translation().times(1).returning(|_, _| Ok(()));

        let mut synthesizer = MockInsightSynthesizer::new();
        synthesizer.expect_synthesize().never();

        let mut engine = engine(store, suggester, synthesizer, 3);
        engine.load_units(&selection()).await.unwrap();
        engine.suggest(0, 0).await.unwrap();

        assert!(engine.validate(0).await);
        assert_eq!(engine.insight_log(), "");
    }

    #[tokio::test]
    async fn test_validate_without_prefill_uses_empty_fallback() {
        let mut store = store_with(vec![record(5, &["a", "b"])]);
        store.expect_submit_translation().returning(|_, _| Ok(()));

        let captured = Arc::new(Mutex::new(None));
        let sink = Arc::clone(&captured);
        let mut synthesizer = MockInsightSynthesizer::new();
        synthesizer.expect_synthesize().times(1).returning(move |req| {
            *sink.lock().unwrap() = Some(req.prefill.clone());
            Ok("rule".to_string())
        });

        let mut engine = engine(store, MockSuggestionProvider::new(), synthesizer, 3);
        engine.load_units(&selection()).await.unwrap();
        engine.edit_field(0, 0, "x").unwrap();

        assert!(engine.validate(0).await);
        assert_eq!(
            captured.lock().unwrap().clone(),
            Some(vec![String::new(), String::new()])
        );
        assert_eq!(engine.insight_log(), "\nrule");
    }

    #[tokio::test]
    async fn test_failed_submission_reports_false_without_insight() {
        let mut store = store_with(vec![record(9, &["Hello"])]);
        store
            .expect_submit_translation()
            .returning(|_, _| Err(AssistError::Remote { status: 403, body: "forbidden".to_string() }));

        let mut synthesizer = MockInsightSynthesizer::new();
        synthesizer.expect_synthesize().never();

        let mut engine = engine(store, MockSuggestionProvider::new(), synthesizer, 3);
        engine.load_units(&selection()).await.unwrap();
        engine.edit_field(0, 0, "Salut").unwrap();

        assert!(!engine.validate(0).await);
        assert_eq!(engine.status(9), UnitStatus::Failed);
        assert_eq!(engine.insight_log(), "");
    }

    #[tokio::test]
    async fn test_insight_failure_still_validates() {
        let mut store = store_with(vec![record(3, &["Hello"])]);
        store.expect_submit_translation().returning(|_, _| Ok(()));
        let mut synthesizer = MockInsightSynthesizer::new();
        synthesizer
            .expect_synthesize()
            .returning(|_| Err(AssistError::Provider("No insight returned".to_string())));

        let mut engine = engine(store, MockSuggestionProvider::new(), synthesizer, 3);
        engine.load_units(&selection()).await.unwrap();
        engine.edit_field(0, 0, "Salut").unwrap();

        assert!(engine.validate(0).await);
        assert_eq!(engine.insight_log(), "");
    }

    #[tokio::test]
    async fn test_suggest_page_fills_only_empty_fields() {
        let mut suggester = MockSuggestionProvider::new();
        suggester
            .expect_suggest()
            .times(3)
            .returning(|req| Ok(format!("fr:{}", req.sources[0])));

        let mut engine = engine(
            store_with(vec![
                record(1, &["a", "b"]),
                record(2, &["c"]),
                record(3, &["d"]),
            ]),
            suggester,
            MockInsightSynthesizer::new(),
            2,
        );
        engine.load_units(&selection()).await.unwrap();
        engine.edit_field(0, 0, "déjà").unwrap();

        let report = engine.suggest_page().await;
        assert_eq!(report, PageSuggestReport { suggested: 2, failed: 0 });
        assert_eq!(engine.units()[0].translation, vec!["déjà".to_string(), "fr:b".to_string()]);
        assert_eq!(engine.units()[1].translation, vec!["fr:c".to_string()]);
        assert_eq!(engine.units()[2].translation, vec![String::new()]);

        engine.next_page();
        assert_eq!(engine.suggest_page().await.suggested, 1);
    }

    #[tokio::test]
    async fn test_reload_clears_status_and_selection_change_resets_insights() {
        let mut store = MockTranslationStore::new();
        store.expect_fetch_units().returning(|_, _| Ok(records(2)));
        store
            .expect_submit_translation()
            .returning(|_, _| Err(AssistError::Remote { status: 500, body: String::new() }));

        let mut engine = engine(store, MockSuggestionProvider::new(), MockInsightSynthesizer::new(), 3)
            .with_insights("learned");
        engine.load_units(&selection()).await.unwrap();
        assert!(!engine.validate(0).await);
        assert_eq!(engine.status(0), UnitStatus::Failed);

        engine.load_units(&selection()).await.unwrap();
        assert_eq!(engine.status(0), UnitStatus::Pending);
        assert_eq!(engine.insight_log(), "learned");

        engine.load_units(&Selection::new("invokeai", "web-ui", "de")).await.unwrap();
        assert_eq!(engine.insight_log(), "");
    }

    #[test]
    fn test_zero_page_size_rejected() {
        let result = BatchEngine::new(
            Arc::new(MockTranslationStore::new()),
            Arc::new(MockSuggestionProvider::new()),
            Arc::new(MockInsightSynthesizer::new()),
            "m",
            0,
        );
        assert!(result.is_err());
    }
}
