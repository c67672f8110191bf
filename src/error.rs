use thiserror::Error;

#[derive(Error, Debug)]
pub enum AssistError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    /// A required identifier or key is empty. Callers treat this as a silent no-op.
    #[error("Missing configuration: {0}")]
    ConfigMissing(String),

    #[error("Remote error {status}: {body}")]
    Remote { status: u16, body: String },

    #[error("Provider error: {0}")]
    Provider(String),

    #[error("Embedding batch {batch} failed: {source}")]
    PartialBatchFailure {
        batch: usize,
        #[source]
        source: Box<AssistError>,
    },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Vector store error: {0}")]
    Store(String),

    #[error("Index {index} out of range (len {len})")]
    OutOfRange { index: usize, len: usize },

    #[error("Catalogue error: {0}")]
    Catalogue(String),
}

impl AssistError {
    /// True for the silent "nothing selected yet" case.
    pub fn is_config_missing(&self) -> bool {
        matches!(self, Self::ConfigMissing(_))
    }
}

pub type Result<T> = std::result::Result<T, AssistError>;
