//! Email processor: routes a submission locally, then enriches it.
//!
//! Flow:
//! 1. Decode the submission into text
//! 2. Trivial-input guard (no router, no LLM)
//! 3. Local router → main category
//! 4. Enrichment → sub-category + suggested reply
//!
//! Enrichment is mandatory: a response always carries all three fields or
//! is an error.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::error::PipelineError;
use crate::pipeline::enrichment::EnrichmentClient;
use crate::pipeline::router::TrainedRouter;
use crate::pipeline::submission::decode;
use crate::pipeline::types::{Category, RawSubmission, ResponsePayload};

/// Inputs shorter than this (after trimming) skip classification.
pub const MIN_TEXT_CHARS: usize = 5;

/// Sub-category returned for trivial input.
pub const TRIVIAL_SUB_CATEGORY: &str = "Invalid";

/// Reply returned for trivial input.
pub const TRIVIAL_REPLY: &str = "The submitted email is too short to be processed.";

/// The classification pipeline. Cheap to clone; shared by all requests.
#[derive(Clone)]
pub struct EmailProcessor {
    router: Arc<TrainedRouter>,
    enrichment: EnrichmentClient,
}

impl EmailProcessor {
    pub fn new(router: Arc<TrainedRouter>, enrichment: EnrichmentClient) -> Self {
        Self { router, enrichment }
    }

    pub fn router(&self) -> &TrainedRouter {
        &self.router
    }

    pub fn enrichment_available(&self) -> bool {
        self.enrichment.is_available()
    }

    /// Process one submission through the full pipeline.
    pub async fn process(
        &self,
        submission: RawSubmission,
    ) -> Result<ResponsePayload, PipelineError> {
        let text = decode(submission).await?;
        self.process_text(&text).await
    }

    /// Process already-decoded email text.
    pub async fn process_text(&self, text: &str) -> Result<ResponsePayload, PipelineError> {
        if is_trivial(text) {
            debug!(chars = text.trim().chars().count(), "Input too short, skipping pipeline");
            return Ok(trivial_response());
        }

        let main_category = self.router.predict(text);
        info!(category = %main_category, "Local router classified email");

        if !self.enrichment.is_available() {
            warn!("Enrichment requested but no model is configured");
            return Err(PipelineError::ServiceUnavailable);
        }

        let enrichment = self.enrichment.enrich(text).await?;
        Ok(ResponsePayload::merge(main_category, enrichment))
    }
}

fn is_trivial(text: &str) -> bool {
    text.trim().chars().count() < MIN_TEXT_CHARS
}

fn trivial_response() -> ResponsePayload {
    ResponsePayload {
        main_category: Category::Unproductive,
        sub_category: TRIVIAL_SUB_CATEGORY.to_string(),
        suggested_reply: TRIVIAL_REPLY.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::error::{EnrichmentError, LlmError};
    use crate::llm::provider::{CompletionRequest, CompletionResponse, FinishReason, LlmProvider};
    use crate::pipeline::types::LabeledExample;

    /// Mock LLM that returns a fixed response and counts calls.
    struct CountingLlm {
        response: String,
        calls: AtomicUsize,
    }

    impl CountingLlm {
        fn new(response: &str) -> Self {
            Self {
                response: response.to_string(),
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait::async_trait]
    impl LlmProvider for CountingLlm {
        fn model_name(&self) -> &str {
            "mock-counting"
        }

        async fn complete(
            &self,
            _request: CompletionRequest,
        ) -> Result<CompletionResponse, LlmError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(CompletionResponse {
                content: self.response.clone(),
                input_tokens: 0,
                output_tokens: 0,
                finish_reason: FinishReason::Stop,
            })
        }
    }

    fn router() -> Arc<TrainedRouter> {
        let examples = vec![
            LabeledExample::new("Solicito o relatório financeiro do projeto", Category::Productive),
            LabeledExample::new("Fatura e contrato pendentes para aprovação", Category::Productive),
            LabeledExample::new("Feliz aniversário, parabéns!", Category::Unproductive),
            LabeledExample::new("Boas festas e feliz natal", Category::Unproductive),
        ];
        Arc::new(TrainedRouter::train(&examples).unwrap())
    }

    const GOOD_OUTPUT: &str =
        "```json\n{\"subCategory\": \"Solicitação\", \"suggestedReply\": \"Enviaremos em breve.\"}\n```";

    #[tokio::test]
    async fn trivial_input_short_circuits() {
        let llm = Arc::new(CountingLlm::new(GOOD_OUTPUT));
        let processor = EmailProcessor::new(router(), EnrichmentClient::new(llm.clone()));

        let payload = processor
            .process(RawSubmission::Text("  ".into()))
            .await
            .unwrap();
        assert_eq!(payload.main_category, Category::Unproductive);
        assert_eq!(payload.sub_category, "Invalid");
        assert_eq!(payload.suggested_reply, TRIVIAL_REPLY);
        assert_eq!(llm.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn four_characters_is_trivial_five_is_not() {
        let llm = Arc::new(CountingLlm::new(GOOD_OUTPUT));
        let processor = EmailProcessor::new(router(), EnrichmentClient::new(llm.clone()));

        let payload = processor.process_text("  oláá  ").await.unwrap();
        assert_eq!(payload.sub_category, TRIVIAL_SUB_CATEGORY);
        assert_eq!(llm.calls.load(Ordering::SeqCst), 0);

        let payload = processor.process_text(" olááá ").await.unwrap();
        assert_eq!(payload.sub_category, "Solicitação");
        assert_eq!(llm.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn trivial_input_succeeds_even_without_enrichment() {
        let processor = EmailProcessor::new(router(), EnrichmentClient::disabled());
        let payload = processor.process_text("oi").await.unwrap();
        assert_eq!(payload.sub_category, TRIVIAL_SUB_CATEGORY);
    }

    #[tokio::test]
    async fn full_pipeline_merges_router_and_enrichment() {
        let llm = Arc::new(CountingLlm::new(GOOD_OUTPUT));
        let processor = EmailProcessor::new(router(), EnrichmentClient::new(llm.clone()));

        let payload = processor
            .process(RawSubmission::Text(
                "Bom dia, solicito o relatório financeiro e o contrato do projeto.".into(),
            ))
            .await
            .unwrap();
        assert_eq!(payload.main_category, Category::Productive);
        assert_eq!(payload.sub_category, "Solicitação");
        assert_eq!(payload.suggested_reply, "Enviaremos em breve.");
        assert_eq!(llm.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn missing_enrichment_is_service_unavailable() {
        let processor = EmailProcessor::new(router(), EnrichmentClient::disabled());
        assert!(!processor.enrichment_available());
        let result = processor
            .process_text("Solicito o relatório financeiro do projeto.")
            .await;
        assert!(matches!(result, Err(PipelineError::ServiceUnavailable)));
    }

    #[tokio::test]
    async fn enrichment_failure_is_surfaced() {
        let llm = Arc::new(CountingLlm::new("sorry, no JSON today"));
        let processor = EmailProcessor::new(router(), EnrichmentClient::new(llm));
        let result = processor.process_text("Feliz natal a todos!").await;
        assert!(matches!(
            result,
            Err(PipelineError::Enrichment(
                EnrichmentError::MalformedModelOutput { .. }
            ))
        ));
    }

    #[tokio::test]
    async fn unsupported_upload_is_invalid_input() {
        let llm = Arc::new(CountingLlm::new(GOOD_OUTPUT));
        let processor = EmailProcessor::new(router(), EnrichmentClient::new(llm.clone()));
        let result = processor
            .process(RawSubmission::File {
                filename: "email.html".into(),
                bytes: b"<p>Reuniao amanha</p>".to_vec(),
            })
            .await;
        assert!(matches!(result, Err(PipelineError::InvalidInput(_))));
        assert_eq!(llm.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn text_upload_runs_full_pipeline() {
        let llm = Arc::new(CountingLlm::new(GOOD_OUTPUT));
        let processor = EmailProcessor::new(router(), EnrichmentClient::new(llm));
        let payload = processor
            .process(RawSubmission::File {
                filename: "pedido.TXT".into(),
                bytes: "Segue a fatura do contrato para aprovação.".as_bytes().to_vec(),
            })
            .await
            .unwrap();
        assert_eq!(payload.main_category, Category::Productive);
    }

    #[tokio::test]
    async fn unreadable_pdf_upload_is_invalid_input() {
        let llm = Arc::new(CountingLlm::new(GOOD_OUTPUT));
        let processor = EmailProcessor::new(router(), EnrichmentClient::new(llm.clone()));
        let result = processor
            .process(RawSubmission::File {
                filename: "extrato.pdf".into(),
                bytes: b"not really a pdf".to_vec(),
            })
            .await;
        assert!(matches!(result, Err(PipelineError::InvalidInput(_))));
        assert_eq!(llm.calls.load(Ordering::SeqCst), 0);
    }
}
