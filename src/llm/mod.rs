// LLM-backed providers
//
// - Client: OpenAI-compatible chat-completion transport
// - Prompt: prompt builders and reply cleanup
// - OpenRouterSuggester / OpenRouterInsightSynthesizer: the two providers used by the batch engine

pub mod client;
pub mod prompt;

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info};

pub use client::{ChatClient, ChatMessage, ChatRequest};

use crate::config::{LlmConfig, WeblateConfig};
use crate::error::{AssistError, Result};

/// Input for one translation suggestion.
#[derive(Debug, Clone, PartialEq)]
pub struct SuggestionRequest {
    pub sources: Vec<String>,
    pub model: String,
    pub insights: String,
    pub unit_context: Option<String>,
}

/// Input for one correction insight.
#[derive(Debug, Clone, PartialEq)]
pub struct InsightRequest {
    pub source: Vec<String>,
    pub prefill: Vec<String>,
    pub validated: Vec<String>,
    pub model: String,
}

/// Produces a translation for one or more source strings.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SuggestionProvider: Send + Sync {
    /// Returns non-empty text, or `AssistError::Provider`.
    async fn suggest(&self, request: &SuggestionRequest) -> Result<String>;
}

/// Derives a one-line corrective rule from a machine suggestion and its human fix.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait InsightSynthesizer: Send + Sync {
    async fn synthesize(&self, request: &InsightRequest) -> Result<String>;
}

pub struct OpenRouterSuggester {
    chat: Arc<ChatClient>,
    source_language: String,
    target_language: String,
    domain_context: String,
    temperature: f32,
}

impl OpenRouterSuggester {
    pub fn new(chat: Arc<ChatClient>, llm: &LlmConfig, weblate: &WeblateConfig) -> Self {
        Self {
            chat,
            source_language: weblate.source_language.clone(),
            target_language: weblate.language.clone(),
            domain_context: llm.domain_context.clone(),
            temperature: llm.temperature,
        }
    }

    fn build_request(&self, request: &SuggestionRequest) -> ChatRequest {
        ChatRequest {
            model: request.model.clone(),
            temperature: Some(self.temperature),
            messages: vec![
                ChatMessage::system(prompt::suggestion_system_prompt(
                    &self.source_language,
                    &self.target_language,
                    &self.domain_context,
                    &request.insights,
                )),
                ChatMessage::user(prompt::suggestion_user_content(
                    &request.sources,
                    request.unit_context.as_deref(),
                )),
            ],
        }
    }
}

#[async_trait]
impl SuggestionProvider for OpenRouterSuggester {
    async fn suggest(&self, request: &SuggestionRequest) -> Result<String> {
        let chat_request = self.build_request(request);
        let reply = self.chat.complete(&chat_request).await?;
        let text = prompt::clean_suggestion(&reply, &request.sources.join("\n"));

        if text.is_empty() {
            return Err(AssistError::Provider("No translation returned".to_string()));
        }

        debug!("Suggestion for {:?}: {}", request.sources, text);
        Ok(text)
    }
}

pub struct OpenRouterInsightSynthesizer {
    chat: Arc<ChatClient>,
}

impl OpenRouterInsightSynthesizer {
    pub fn new(chat: Arc<ChatClient>) -> Self {
        Self { chat }
    }
}

#[async_trait]
impl InsightSynthesizer for OpenRouterInsightSynthesizer {
    async fn synthesize(&self, request: &InsightRequest) -> Result<String> {
        let chat_request = ChatRequest {
            model: request.model.clone(),
            temperature: None,
            messages: vec![
                ChatMessage::system(prompt::INSIGHT_SYSTEM_PROMPT),
                ChatMessage::user(prompt::insight_user_content(
                    &request.source,
                    &request.prefill,
                    &request.validated,
                )),
            ],
        };

        let reply = self.chat.complete(&chat_request).await?;
        let insight = prompt::one_line(&reply);
        if insight.is_empty() {
            return Err(AssistError::Provider("No insight returned".to_string()));
        }

        info!("New insight: {}", insight);
        Ok(insight)
    }
}
