//! Enrichment client: asks the generative model for a sub-category and a
//! suggested reply.
//!
//! This is the only component that talks to a remote service. Everything
//! that can go wrong there is converted into an `EnrichmentError`.

use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, info, warn};

use crate::error::EnrichmentError;
use crate::llm::provider::{ChatMessage, CompletionRequest, FinishReason, LlmProvider};
use crate::pipeline::types::EnrichmentResult;

/// Substituted when the model omits `subCategory`.
pub const SUB_CATEGORY_PLACEHOLDER: &str = "N/A";

/// Substituted when the model omits `suggestedReply`.
pub const REPLY_PLACEHOLDER: &str = "no reply provided";

/// Default sampling temperature (low variance, well-formed JSON).
pub const DEFAULT_TEMPERATURE: f32 = 0.2;

const INSTRUCTIONS: &str = "You are an assistant for a financial services company that \
triages incoming customer emails.\n\n\
Your tasks are:\n\
1. \"subCategory\": classify the type of the email in a short label \
(for example: \"Support request\", \"Status update\", \"Question\", \"Greeting\", \"Spam\").\n\
2. \"suggestedReply\": write a short, polite reply appropriate to the email, \
in the same language as the email.\n\n\
Respond with ONLY a JSON object, for example:\n\
{\"subCategory\": \"...\", \"suggestedReply\": \"...\"}";

/// Client for the enrichment step.
///
/// Built without a provider when no credential was configured; in that
/// state every call fails with `EnrichmentError::Unavailable`.
#[derive(Clone)]
pub struct EnrichmentClient {
    llm: Option<Arc<dyn LlmProvider>>,
    temperature: f32,
}

impl EnrichmentClient {
    pub fn new(llm: Arc<dyn LlmProvider>) -> Self {
        Self {
            llm: Some(llm),
            temperature: DEFAULT_TEMPERATURE,
        }
    }

    /// A client with no model session.
    pub fn disabled() -> Self {
        Self {
            llm: None,
            temperature: DEFAULT_TEMPERATURE,
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn is_available(&self) -> bool {
        self.llm.is_some()
    }

    /// Ask the model for a sub-category and suggested reply. Single attempt.
    pub async fn enrich(&self, email_text: &str) -> Result<EnrichmentResult, EnrichmentError> {
        let llm = self.llm.as_ref().ok_or(EnrichmentError::Unavailable)?;

        let request =
            CompletionRequest::new(build_messages(email_text)).with_temperature(self.temperature);

        let response = llm.complete(request).await.map_err(|e| {
            warn!(model = llm.model_name(), error = %e, "Enrichment call failed");
            EnrichmentError::from(e)
        })?;

        if response.content.trim().is_empty() {
            let reason = refusal_reason(&response.finish_reason);
            warn!(model = llm.model_name(), reason = %reason, "Model returned no output");
            return Err(EnrichmentError::ModelRefused { reason });
        }

        debug!(raw = %response.content, "Enrichment raw output");
        let result = parse_enrichment(&response.content)?;
        info!(
            model = llm.model_name(),
            sub_category = %result.sub_category,
            "Enrichment complete"
        );
        Ok(result)
    }
}

fn refusal_reason(finish_reason: &FinishReason) -> String {
    match finish_reason {
        FinishReason::ContentFilter => "blocked by safety filters".to_string(),
        FinishReason::Length => "output truncated before any text".to_string(),
        FinishReason::Stop => "empty response".to_string(),
        FinishReason::Other(reason) => reason.clone(),
    }
}

// ── Prompt construction ─────────────────────────────────────────────

/// Fixed instructions as the system message, the quoted email as the user turn.
pub fn build_messages(email_text: &str) -> Vec<ChatMessage> {
    vec![
        ChatMessage::system(INSTRUCTIONS),
        ChatMessage::user(format!("Email to analyze: \"{email_text}\"")),
    ]
}

// ── Response parsing ────────────────────────────────────────────────

/// Parse model output into an `EnrichmentResult`.
///
/// Missing fields get placeholders; output that is not a JSON object is
/// `MalformedModelOutput`.
pub fn parse_enrichment(raw: &str) -> Result<EnrichmentResult, EnrichmentError> {
    let json_str = extract_json_object(raw);
    let value: Value = serde_json::from_str(&json_str).map_err(|e| {
        warn!(error = %e, raw = %raw, "Failed to parse enrichment output");
        EnrichmentError::MalformedModelOutput {
            raw: raw.to_string(),
        }
    })?;

    let Some(object) = value.as_object() else {
        return Err(EnrichmentError::MalformedModelOutput {
            raw: raw.to_string(),
        });
    };

    let field = |keys: &[&str]| {
        keys.iter()
            .find_map(|k| object.get(*k).and_then(Value::as_str))
            .map(str::to_string)
    };

    Ok(EnrichmentResult {
        sub_category: field(&["subCategory", "sub_categoria"])
            .unwrap_or_else(|| SUB_CATEGORY_PLACEHOLDER.to_string()),
        suggested_reply: field(&["suggestedReply", "resposta_sugerida"])
            .unwrap_or_else(|| REPLY_PLACEHOLDER.to_string()),
    })
}

/// Extract a JSON object from model output (handles markdown fences).
fn extract_json_object(text: &str) -> String {
    let trimmed = text.trim();

    if trimmed.starts_with('{') {
        return trimmed.to_string();
    }

    if let Some(start) = trimmed.find("```") {
        let after = &trimmed[start + 3..];
        // Skip the info string (```json).
        let body = after.find('\n').map_or(after, |nl| &after[nl + 1..]);
        if let Some(end) = body.find("```") {
            let inner = body[..end].trim();
            if inner.starts_with('{') {
                return inner.to_string();
            }
        }
    }

    if let (Some(start), Some(end)) = (trimmed.find('{'), trimmed.rfind('}'))
        && end > start
    {
        return trimmed[start..=end].to_string();
    }

    trimmed.to_string()
}
