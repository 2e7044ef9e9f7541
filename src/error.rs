use thiserror::Error;

// Pipeline Error Type

#[derive(Error, Debug, Clone, PartialEq)]
pub enum PipelineError {
    #[error("Invalid image: {0}")]
    InvalidImage(String),
    #[error("Model unavailable: {0}")]
    ModelUnavailable(String),
    #[error("Inference failed: {0}")]
    Inference(String),
    #[error("The catalog has no entries.")]
    EmptyCatalog,
}

impl PipelineError {
    pub fn invalid_image(msg: impl Into<String>) -> Self {
        PipelineError::InvalidImage(msg.into())
    }

    pub fn model_unavailable(msg: impl Into<String>) -> Self {
        PipelineError::ModelUnavailable(msg.into())
    }

    pub fn inference(msg: impl Into<String>) -> Self {
        PipelineError::Inference(msg.into())
    }
}

// Catalog Construction Error Type
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CatalogError {
    #[error("Card id {0} is already in the catalog")]
    DuplicateCardId(String),
    #[error("Embedding for {card_id} has dimension {actual}, catalog expects {expected}")]
    DimensionMismatch {
        card_id: String,
        expected: usize,
        actual: usize,
    },
    #[error("Embedding for {0} is empty")]
    EmptyEmbedding(String),
}

impl From<CatalogError> for PipelineError {
    fn from(err: CatalogError) -> Self {
        PipelineError::ModelUnavailable(format!("catalog rejected: {}", err))
    }
}

#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("Failed to load settings: {0}")]
    Load(#[from] config::ConfigError),
    #[error("Invalid settings: {0}")]
    Invalid(String),
}

// Main Application Error Type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Pipeline Error: {0}")]
    Pipeline(#[from] PipelineError),
    #[error("Settings Error: {0}")]
    Settings(#[from] SettingsError),
    #[error("Failed to read {1}: {0}")]
    Io(std::io::Error, String),
    #[error("Request timed out after {0}ms")]
    Timeout(u64),
    #[error("Failed to encode report: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("Usage: {0}")]
    Usage(String),
}
