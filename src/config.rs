use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use crate::error::{Result, AssistError};

pub const WEBLATE_API_KEY_ENV: &str = "WEBLATE_API_KEY";
pub const OPENROUTER_API_KEY_ENV: &str = "OPENROUTER_API_KEY";
pub const OPENAI_API_KEY_ENV: &str = "OPENAI_API_KEY";

// Default values for optional fields
fn default_source_language() -> String {
    "en".to_string()
}

fn default_domain_context() -> String {
    "UI/UX software elements".to_string()
}

fn default_max_retries() -> u32 {
    3
}

fn default_chars_per_token() -> f64 {
    4.3
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    pub weblate: WeblateConfig,
    pub llm: LlmConfig,
    pub embedding: EmbeddingConfig,
    pub batch: BatchConfig,
    pub storage: StorageConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeblateConfig {
    /// Base URL of the Weblate REST API (e.g., https://hosted.weblate.org/api)
    pub endpoint: String,
    /// Weblate API token, sent as `Authorization: Token <key>`
    pub api_key: String,
    /// Project slug
    pub project: String,
    /// Component slug
    pub component: String,
    /// Target language code
    pub language: String,
    /// Language code of the source strings
    #[serde(default = "default_source_language")]
    pub source_language: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Base URL of an OpenAI-compatible chat-completion API (OpenRouter by default)
    pub endpoint: String,
    /// Bearer key for the chat-completion API
    pub api_key: String,
    /// Model identifier used for suggestions and insights
    pub model: String,
    /// Sampling temperature for suggestions
    pub temperature: f32,
    /// Domain hint placed in the suggestion system prompt
    #[serde(default = "default_domain_context")]
    pub domain_context: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    /// Base URL of an OpenAI-compatible embeddings API
    pub endpoint: String,
    /// Bearer key for the embeddings API
    pub api_key: String,
    /// Embedding model identifier
    pub model: String,
    /// Number of strings sent per embedding request
    pub batch_size: usize,
    /// Pause between consecutive embedding requests (milliseconds)
    pub batch_delay_ms: u64,
    /// Maximum attempts for retryable embedding failures
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    /// Price in USD per million tokens, used for the cost estimate
    pub price_per_million_tokens: f64,
    /// Empirical characters per token, used for the cost estimate
    #[serde(default = "default_chars_per_token")]
    pub chars_per_token: f64,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchConfig {
    /// Number of units shown per page
    pub page_size: usize,
    /// Suggest every empty field when a page is displayed
    pub auto_suggest: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// JSON file holding the embedding catalogue
    pub vector_store_path: PathBuf,
    /// Text file holding the insight log between sessions
    pub insights_path: PathBuf,
}

/// Immutable (project, component, language) triple that scopes both engines.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Selection {
    pub project: String,
    pub component: String,
    pub language: String,
}

impl Selection {
    pub fn new(
        project: impl Into<String>,
        component: impl Into<String>,
        language: impl Into<String>,
    ) -> Self {
        Self {
            project: project.into(),
            component: component.into(),
            language: language.into(),
        }
    }

    /// Fails with `ConfigMissing` naming the first empty identifier.
    pub fn ensure_complete(&self) -> Result<()> {
        for (name, value) in [
            ("project", &self.project),
            ("component", &self.component),
            ("language", &self.language),
        ] {
            if value.trim().is_empty() {
                return Err(AssistError::ConfigMissing(format!("weblate {} is not set", name)));
            }
        }
        Ok(())
    }
}

impl Default for WeblateConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://hosted.weblate.org/api".to_string(),
            api_key: String::new(),
            project: String::new(),
            component: String::new(),
            language: "fr".to_string(),
            source_language: default_source_language(),
        }
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://openrouter.ai/api/v1".to_string(),
            api_key: String::new(),
            model: "openai/gpt-4o-mini".to_string(),
            temperature: 0.0,
            domain_context: default_domain_context(),
            timeout_secs: 120,
        }
    }
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://api.openai.com/v1".to_string(),
            api_key: String::new(),
            model: "text-embedding-ada-002".to_string(),
            batch_size: 1000,
            batch_delay_ms: 50,
            max_retries: default_max_retries(),
            price_per_million_tokens: 0.02,
            chars_per_token: default_chars_per_token(),
            timeout_secs: 120,
        }
    }
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            page_size: 3,
            auto_suggest: false,
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        let base = PathBuf::from(".weblate-assist");
        Self {
            vector_store_path: base.join("embeddings.json"),
            insights_path: base.join("insights.txt"),
        }
    }
}

impl Config {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| AssistError::Config(format!("Failed to read config file: {}", e)))?;

        let config: Config = toml::from_str(&content)
            .map_err(|e| AssistError::Config(format!("Failed to parse config file: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| AssistError::Config(format!("Failed to serialize config: {}", e)))?;

        std::fs::write(path, content)
            .map_err(|e| AssistError::Config(format!("Failed to write config file: {}", e)))?;

        Ok(())
    }

    /// Fill empty API keys from the environment.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|name| std::env::var(name).ok());
    }

    fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let slots = [
            (&mut self.weblate.api_key, WEBLATE_API_KEY_ENV),
            (&mut self.llm.api_key, OPENROUTER_API_KEY_ENV),
            (&mut self.embedding.api_key, OPENAI_API_KEY_ENV),
        ];
        for (slot, name) in slots {
            if slot.trim().is_empty() {
                if let Some(value) = lookup(name).filter(|v| !v.trim().is_empty()) {
                    *slot = value;
                }
            }
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.batch.page_size == 0 {
            return Err(AssistError::Config("batch.page_size must be greater than 0".to_string()));
        }
        if self.embedding.batch_size == 0 {
            return Err(AssistError::Config("embedding.batch_size must be greater than 0".to_string()));
        }
        if self.embedding.chars_per_token <= 0.0 {
            return Err(AssistError::Config("embedding.chars_per_token must be positive".to_string()));
        }
        Ok(())
    }

    pub fn selection(&self) -> Selection {
        Selection::new(
            self.weblate.project.clone(),
            self.weblate.component.clone(),
            self.weblate.language.clone(),
        )
    }
}
