//! REST endpoints for email classification.

use std::collections::HashMap;

use axum::{
    Form, Json, Router,
    extract::{DefaultBodyLimit, FromRequest, Multipart, Request, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{Instrument, info, info_span, warn};
use uuid::Uuid;

use crate::error::PipelineError;
use crate::pipeline::{EmailProcessor, RawSubmission};

/// Form field carrying typed email text.
pub const TEXT_FIELD: &str = "email_texto";

/// Form field carrying an uploaded file.
pub const FILE_FIELD: &str = "file";

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub processor: EmailProcessor,
}

/// Build the Axum router with the classification and health routes.
pub fn app_routes(processor: EmailProcessor, max_upload_bytes: usize) -> Router {
    let state = AppState { processor };

    Router::new()
        .route("/health", get(health))
        .route("/processar", post(process_email))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

// ── Health ──────────────────────────────────────────────────────────────

async fn health(State(state): State<AppState>) -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "service": "email-triage",
        "enrichment": state.processor.enrichment_available(),
        "vocabulary": state.processor.router().vocabulary_len(),
    }))
}

// ── Classification ──────────────────────────────────────────────────────

/// POST /processar
///
/// Accepts `multipart/form-data` or `application/x-www-form-urlencoded`:
/// - `file`: a `.txt` or `.pdf` upload (multipart only; takes precedence)
/// - `email_texto`: the email body as text
async fn process_email(State(state): State<AppState>, request: Request) -> Response {
    let request_id = Uuid::new_v4();
    let span = info_span!("process_email", %request_id);

    async move {
        let submission = match read_submission(request, &state).await {
            Ok(submission) => submission,
            Err(e) => return error_response(&e),
        };

        match state.processor.process(submission).await {
            Ok(payload) => {
                info!(category = %payload.main_category, "Email processed");
                Json(payload).into_response()
            }
            Err(e) => {
                warn!(error = %e, code = e.code(), "Email processing failed");
                error_response(&e)
            }
        }
    }
    .instrument(span)
    .await
}

/// Pull the submission out of the request body. Body rejections become
/// `InvalidInput` so they get the same JSON error shape as everything else.
async fn read_submission(
    request: Request,
    state: &AppState,
) -> Result<RawSubmission, PipelineError> {
    let urlencoded = request
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.starts_with("application/x-www-form-urlencoded"));

    if urlencoded {
        let Form(mut fields) = Form::<HashMap<String, String>>::from_request(request, state)
            .await
            .map_err(|e| {
                PipelineError::InvalidInput(format!("Invalid form body: {}", e.body_text()))
            })?;
        return fields.remove(TEXT_FIELD).map(RawSubmission::Text).ok_or_else(|| {
            PipelineError::InvalidInput("No text or valid file was submitted".to_string())
        });
    }

    let multipart = Multipart::from_request(request, state).await.map_err(|e| {
        PipelineError::InvalidInput(format!("Invalid multipart body: {}", e.body_text()))
    })?;
    read_multipart(multipart).await
}

/// Collect the text and file fields of a multipart form.
async fn read_multipart(mut multipart: Multipart) -> Result<RawSubmission, PipelineError> {
    let mut text: Option<String> = None;
    let mut file: Option<RawSubmission> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| PipelineError::InvalidInput(format!("Failed to read form field: {e}")))?
    {
        let name = field.name().unwrap_or_default().to_string();

        match name.as_str() {
            FILE_FIELD => {
                let filename = field.file_name().unwrap_or_default().to_string();
                let bytes = field.bytes().await.map_err(|e| {
                    PipelineError::InvalidInput(format!("Failed to read upload: {e}"))
                })?;
                // Browsers send an empty part when no file was chosen.
                if !filename.is_empty() {
                    file = Some(RawSubmission::File {
                        filename,
                        bytes: bytes.to_vec(),
                    });
                }
            }
            TEXT_FIELD => {
                text = Some(field.text().await.map_err(|e| {
                    PipelineError::InvalidInput(format!("Failed to read '{TEXT_FIELD}' field: {e}"))
                })?);
            }
            _ => {}
        }
    }

    file.or(text.map(RawSubmission::Text)).ok_or_else(|| {
        PipelineError::InvalidInput("No text or valid file was submitted".to_string())
    })
}

fn error_response(err: &PipelineError) -> Response {
    let status =
        StatusCode::from_u16(err.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (
        status,
        Json(serde_json::json!({
            "error": err.to_string(),
            "code": err.code(),
        })),
    )
        .into_response()
}
