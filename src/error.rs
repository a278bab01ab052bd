//! Error types for email triage.

use std::path::PathBuf;
use std::time::Duration;

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

/// Local router training errors.
///
/// These only occur at startup; a router that trained successfully never
/// fails on a prediction.
#[derive(Debug, thiserror::Error)]
pub enum RouterError {
    #[error("Training dataset not found at {}", path.display())]
    DatasetMissing { path: PathBuf },

    #[error("Failed to read training dataset {}: {source}", path.display())]
    DatasetRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse training dataset: {0}")]
    DatasetParse(#[from] serde_json::Error),

    #[error("Example {index} has label {label}, expected 0 or 1")]
    InvalidLabel { index: usize, label: i64 },

    #[error("Example {index} has empty text")]
    EmptyText { index: usize },

    #[error("Training dataset is empty")]
    EmptyDataset,

    #[error("Training dataset has no {category} examples")]
    MissingCategory { category: String },

    #[error("Training dataset produced an empty vocabulary")]
    EmptyVocabulary,
}

/// LLM provider errors.
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("Provider {provider} request failed: {reason}")]
    RequestFailed { provider: String, reason: String },

    #[error("Provider {provider} timed out after {timeout:?}")]
    Timeout { provider: String, timeout: Duration },

    #[error("Provider {provider} rate limited")]
    RateLimited { provider: String },

    #[error("Authentication failed for provider {provider}")]
    AuthFailed { provider: String },

    #[error("Invalid response from {provider}: {reason}")]
    InvalidResponse { provider: String, reason: String },
}

/// Failures of the enrichment step, as seen by the pipeline.
///
/// Provider errors are flattened into `RemoteCallFailed` at the client
/// boundary so transport details never leak past it.
#[derive(Debug, thiserror::Error)]
pub enum EnrichmentError {
    #[error("Generative model is not configured")]
    Unavailable,

    #[error("Generative model declined to answer: {reason}")]
    ModelRefused { reason: String },

    #[error("Generative model returned output that is not a JSON object")]
    MalformedModelOutput { raw: String },

    #[error("Call to generative model failed: {reason}")]
    RemoteCallFailed { reason: String },
}

impl EnrichmentError {
    /// Stable machine-readable code for API responses.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Unavailable => "ENRICHMENT_UNAVAILABLE",
            Self::ModelRefused { .. } => "MODEL_REFUSED",
            Self::MalformedModelOutput { .. } => "MALFORMED_MODEL_OUTPUT",
            Self::RemoteCallFailed { .. } => "REMOTE_CALL_FAILED",
        }
    }
}

impl From<LlmError> for EnrichmentError {
    fn from(err: LlmError) -> Self {
        Self::RemoteCallFailed {
            reason: err.to_string(),
        }
    }
}

/// Per-request pipeline errors.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Enrichment service is not available")]
    ServiceUnavailable,

    #[error(transparent)]
    Enrichment(#[from] EnrichmentError),
}

impl PipelineError {
    /// Stable machine-readable code for API responses.
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidInput(_) => "INVALID_INPUT",
            Self::ServiceUnavailable => "SERVICE_UNAVAILABLE",
            Self::Enrichment(e) => e.code(),
        }
    }

    /// HTTP status for this error: client errors for bad input, server
    /// errors for everything on the enrichment side.
    pub fn status_code(&self) -> u16 {
        match self {
            Self::InvalidInput(_) => 400,
            Self::ServiceUnavailable | Self::Enrichment(EnrichmentError::Unavailable) => 503,
            Self::Enrichment(_) => 502,
        }
    }
}
