//! LLM integration for email triage.
//!
//! The pipeline only talks to the `LlmProvider` trait; `GeminiProvider`
//! is the production backend and tests substitute their own.

pub mod gemini;
pub mod provider;

pub use gemini::GeminiProvider;
pub use provider::*;

use std::sync::Arc;

use crate::config::LlmSettings;
use crate::error::LlmError;

/// Create the enrichment LLM provider from configuration.
pub fn create_provider(settings: &LlmSettings) -> Result<Arc<dyn LlmProvider>, LlmError> {
    let provider = GeminiProvider::new(
        settings.api_key.clone(),
        settings.model.clone(),
        settings.base_url.clone(),
        settings.timeout,
    )?;
    tracing::info!("Using Gemini (model: {})", settings.model);
    Ok(Arc::new(provider))
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[test]
    fn create_provider_constructs_without_network() {
        // The key is only checked by the remote service on the first request.
        let settings = LlmSettings {
            api_key: secrecy::SecretString::from("test-key"),
            model: "gemini-2.5-flash".to_string(),
            base_url: None,
            temperature: 0.2,
            timeout: Duration::from_secs(10),
        };
        let provider = create_provider(&settings).unwrap();
        assert_eq!(provider.model_name(), "gemini-2.5-flash");
    }
}
